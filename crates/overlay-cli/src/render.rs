//! Terminal rendering for the listing, detail and report commands.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};
use std::collections::BTreeMap;

use serde::Serialize;

use overlay_catalog::SortReport;
use overlay_core::compare::OverlayComparison;
use overlay_core::{
    FamilyStats, FilterState, MergedCatalog, MergedControl, ResolvedAnnotation, ViewSummary,
    visible_badges, visible_resolved,
};
use overlay_model::{AssessmentProcedure, Control, OverlayAnnotation, OverlayKind};

/// One row of `controls --json`.
#[derive(Debug, Serialize)]
pub struct ControlRow<'a> {
    pub id: String,
    pub name: &'a str,
    pub family: &'a str,
    pub enhancement: bool,
    pub overlays: Vec<OverlayKind>,
}

pub fn control_rows<'a>(visible: &[&'a MergedControl], state: &FilterState) -> Vec<ControlRow<'a>> {
    visible
        .iter()
        .map(|control| ControlRow {
            id: control.id().to_string(),
            name: &control.control.name,
            family: control.control.family_code(),
            enhancement: control.control.is_enhancement,
            overlays: visible_badges(control, state),
        })
        .collect()
}

pub fn controls_table(visible: &[&MergedControl], state: &FilterState) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Control"),
        header_cell("Name"),
        header_cell("Overlays"),
    ]);
    apply_table_style(&mut table);
    for control in visible {
        table.add_row(vec![
            id_cell(control),
            Cell::new(&control.control.name),
            badges_cell(&visible_badges(control, state)),
        ]);
    }
    table
}

/// `Showing 5 of 8 controls (FRH 1, CNSSI 3)`.
pub fn view_footer(summary: &ViewSummary) -> String {
    let mut line = format!(
        "Showing {} of {} controls",
        summary.visible, summary.total
    );
    if !summary.by_overlay.is_empty() {
        let counts: Vec<String> = summary
            .by_overlay
            .iter()
            .map(|(kind, count)| format!("{} {count}", kind.badge()))
            .collect();
        line.push_str(&format!(" ({})", counts.join(", ")));
    }
    line
}

pub fn families_table(stats: &[FamilyStats]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Family"),
        header_cell("Controls"),
        header_cell("Enhancements"),
        header_cell("Selected"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    let mut totals = (0usize, 0usize, 0usize);
    for family in stats {
        totals.0 += family.controls;
        totals.1 += family.enhancements;
        totals.2 += family.selected;
        table.add_row(vec![
            Cell::new(&family.family)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(family.controls),
            Cell::new(family.enhancements),
            count_cell(family.selected, Color::Green),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(totals.0).add_attribute(Attribute::Bold),
        Cell::new(totals.1).add_attribute(Attribute::Bold),
        count_cell(totals.2, Color::Green).add_attribute(Attribute::Bold),
    ]);
    table
}

/// `show --json`: the control with only its enabled overlays.
#[derive(Debug, Serialize)]
pub struct ControlDetail<'a> {
    pub control: &'a Control,
    pub annotations: BTreeMap<OverlayKind, &'a OverlayAnnotation>,
    pub resolved: ResolvedAnnotation,
}

pub fn control_detail_json<'a>(control: &'a MergedControl, state: &FilterState) -> ControlDetail<'a> {
    ControlDetail {
        control: &control.control,
        annotations: control
            .annotations
            .iter()
            .filter(|(kind, _)| state.is_enabled(**kind))
            .map(|(kind, annotation)| (*kind, annotation))
            .collect(),
        resolved: visible_resolved(control, state),
    }
}

/// Full text for `show`: statement, discussion, related controls,
/// enhancements, resolved fields and each overlay's annotation.
pub fn control_detail(merged: &MergedCatalog, control: &MergedControl, state: &FilterState) -> String {
    let mut lines = Vec::new();
    let record = &control.control;
    lines.push(format!("{}  {}", control.id(), record.name));
    let mut header = format!("Family: {}", record.family_code());
    if let Some(parent) = &record.parent_control {
        header.push_str(&format!("  Enhancement of: {parent}"));
    }
    lines.push(header);
    let badges = visible_badges(control, state);
    lines.push(format!("Overlays: {}", badge_text(&badges)));

    push_section(&mut lines, "Control", &record.control_text);
    push_section(&mut lines, "Discussion", &record.discussion);
    if !record.related_controls.is_empty() {
        lines.push(String::new());
        lines.push(format!("Related controls: {}", record.related_controls.join(", ")));
    }

    let enhancements = merged.enhancements_of(control.id());
    if !enhancements.is_empty() {
        lines.push(String::new());
        lines.push("Enhancements:".to_string());
        for enhancement in enhancements {
            let badges = visible_badges(enhancement, state);
            let mut line = format!("  {}  {}", enhancement.id(), enhancement.control.name);
            if !badges.is_empty() {
                line.push_str(&format!("  [{}]", badge_text(&badges)));
            }
            lines.push(line);
        }
    }

    let resolved = visible_resolved(control, state);
    if !resolved.is_empty() {
        lines.push(String::new());
        lines.push("Resolved fields:".to_string());
        lines.push(resolved_table(&resolved).to_string());
    }

    for (kind, annotation) in &control.annotations {
        if !state.is_enabled(*kind) {
            continue;
        }
        lines.push(String::new());
        let title = annotation
            .title()
            .map(|t| format!(" ({t})"))
            .unwrap_or_default();
        lines.push(format!("{}{title}:", kind.display_name()));
        lines.extend(annotation_lines(annotation).into_iter().map(|l| format!("  {l}")));
    }
    lines.join("\n")
}

fn push_section(lines: &mut Vec<String>, label: &str, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(format!("{label}:"));
    lines.extend(text.lines().map(|l| format!("  {}", l.trim_end())));
}

fn resolved_table(fields: &ResolvedAnnotation) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Value"),
        header_cell("Source"),
        header_cell("Also specified by"),
    ]);
    apply_table_style(&mut table);
    for (field, resolved) in fields.iter() {
        let secondary: Vec<String> = resolved
            .secondary
            .iter()
            .map(|other| format!("{}: {}", other.overlay.badge(), other.value))
            .collect();
        let secondary_cell = if secondary.is_empty() {
            dim_cell("-")
        } else if resolved.has_conflict() {
            Cell::new(secondary.join("\n")).fg(Color::Yellow)
        } else {
            Cell::new(secondary.join("\n"))
        };
        table.add_row(vec![
            Cell::new(field.label()).add_attribute(Attribute::Bold),
            Cell::new(&resolved.effective.value),
            badge_cell(resolved.effective.overlay),
            secondary_cell,
        ]);
    }
    table
}

fn push_field(lines: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        lines.push(format!("{label}: {value}"));
    }
}

fn annotation_lines(annotation: &OverlayAnnotation) -> Vec<String> {
    let mut lines = Vec::new();
    match annotation {
        OverlayAnnotation::FedrampHigh(a) => {
            push_field(&mut lines, "Parameter value", a.parameter_value.as_deref());
            if !a.assessment_procedures.is_empty() {
                lines.push("Assessment procedures:".to_string());
                lines.extend(a.assessment_procedures.iter().map(procedure_line));
            }
        }
        OverlayAnnotation::Cnssi1253(a) => {
            push_field(&mut lines, "Parameter value", a.parameter_value.as_deref());
            push_field(&mut lines, "Justification", a.justification.as_deref());
            let selections = &a.selections;
            lines.push(format!(
                "Selections: C {}  I {}  A {}",
                selections.confidentiality.marks(),
                selections.integrity.marks(),
                selections.availability.marks()
            ));
            push_field(&mut lines, "Note", selections.special_text.as_deref());
            if a.withdrawn {
                lines.push("Withdrawn".to_string());
            }
        }
        OverlayAnnotation::ClassifiedInformation(a) | OverlayAnnotation::FedrampPlus(a) => {
            push_field(&mut lines, "Parameter value", a.parameter_value.as_deref());
            push_field(&mut lines, "Justification", a.justification.as_deref());
            push_field(&mut lines, "Guidance", a.guidance.as_deref());
            push_field(&mut lines, "References", a.references.as_deref());
        }
    }
    if lines.is_empty() {
        lines.push("Selected".to_string());
    }
    lines
}

fn procedure_line(procedure: &AssessmentProcedure) -> String {
    let mut line = format!("  - {}", procedure.summary());
    if let AssessmentProcedure::Detailed(step) = procedure
        && !step.methods.is_empty()
    {
        line.push_str(&format!(" [{}]", step.methods.join(", ")));
    }
    line
}

pub fn sort_report_table(report: &SortReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Family"),
        header_cell("Base"),
        header_cell("Enhancements"),
        header_cell("Total"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for (family, counts) in &report.families {
        table.add_row(vec![
            Cell::new(family)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(counts.base),
            Cell::new(counts.enhancements),
            Cell::new(counts.total()),
        ]);
    }
    table
}

/// Human-readable comparison: a summary table plus id lists.
pub fn comparison_report(comparison: &OverlayComparison) -> String {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Measure"), header_cell("Count")]);
    apply_report_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let net = comparison.net_change();
    let rows: [(&str, Cell); 8] = [
        ("Entries (old)", Cell::new(comparison.old_entries)),
        ("Entries (new)", Cell::new(comparison.new_entries)),
        ("In both", Cell::new(comparison.in_both)),
        ("Only in old", count_cell(comparison.only_old.len(), Color::Yellow)),
        ("Only in new", count_cell(comparison.only_new.len(), Color::Yellow)),
        ("Selected (old)", Cell::new(comparison.old_selected)),
        ("Selected (new)", Cell::new(comparison.new_selected)),
        (
            "Net change",
            Cell::new(format!("{net:+}")).fg(if net < 0 { Color::Red } else { Color::Green }),
        ),
    ];
    for (label, cell) in rows {
        table.add_row(vec![Cell::new(label), cell]);
    }

    let mut lines = vec![
        format!("{} revision comparison", comparison.overlay.display_name()),
        table.to_string(),
    ];

    if !comparison.deselected.is_empty() {
        lines.push(String::new());
        lines.push("Deselected:".to_string());
        for entry in &comparison.deselected {
            let suffix = if entry.withdrawn { " (withdrawn)" } else { "" };
            lines.push(format!("  {}{suffix}", entry.control_id));
        }
    }
    if !comparison.newly_selected.is_empty() {
        lines.push(String::new());
        lines.push(format!("Newly selected: {}", comparison.newly_selected.join(", ")));
    }
    for (label, entries) in [
        ("Only in old", &comparison.only_old),
        ("Only in new", &comparison.only_new),
    ] {
        if entries.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("{label}:"));
        for entry in entries {
            let mut line = format!("  {}", entry.control_id);
            if let Some(name) = &entry.name {
                line.push_str(&format!("  {name}"));
            }
            if !entry.possible_matches.is_empty() {
                line.push_str(&format!(
                    "  (possible matches: {})",
                    entry.possible_matches.join(", ")
                ));
            }
            lines.push(line);
        }
    }

    let fields = &comparison.new_field_counts;
    lines.push(String::new());
    lines.push(format!(
        "Populated fields (new): justification {}, parameter_value {}, guidance {}, references {}",
        fields.justification, fields.parameter_value, fields.guidance, fields.references
    ));

    if let Some(levels) = &comparison.cia_levels {
        let mut cia = Table::new();
        cia.set_header(vec![
            header_cell("Objective"),
            header_cell("Low"),
            header_cell("Moderate"),
            header_cell("High"),
        ]);
        apply_report_table_style(&mut cia);
        for column in 1..=3 {
            align_column(&mut cia, column, CellAlignment::Right);
        }
        for (objective, counts) in levels {
            cia.add_row(vec![
                Cell::new(objective),
                Cell::new(counts.low),
                Cell::new(counts.moderate),
                Cell::new(counts.high),
            ]);
        }
        lines.push(String::new());
        lines.push("Selected controls by CIA level (new):".to_string());
        lines.push(cia.to_string());
    }
    lines.join("\n")
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
    if table.column_count() == 3 {
        table.set_constraints(vec![
            ColumnConstraint::LowerBoundary(Width::Fixed(9)),
            ColumnConstraint::UpperBoundary(Width::Percentage(70)),
            ColumnConstraint::LowerBoundary(Width::Fixed(8)),
        ]);
    }
}

fn apply_report_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(80);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn overlay_color(kind: OverlayKind) -> Color {
    match kind {
        OverlayKind::FedrampHigh => Color::Blue,
        OverlayKind::Cnssi1253 => Color::Magenta,
        OverlayKind::ClassifiedInformation => Color::Red,
        OverlayKind::FedrampPlus => Color::Green,
    }
}

fn badge_text(kinds: &[OverlayKind]) -> String {
    if kinds.is_empty() {
        return "-".to_string();
    }
    kinds
        .iter()
        .map(|kind| kind.badge())
        .collect::<Vec<_>>()
        .join(" ")
}

fn badge_cell(kind: OverlayKind) -> Cell {
    Cell::new(kind.badge())
        .fg(overlay_color(kind))
        .add_attribute(Attribute::Bold)
}

fn badges_cell(kinds: &[OverlayKind]) -> Cell {
    match kinds {
        [] => dim_cell("-"),
        [single] => badge_cell(*single),
        _ => Cell::new(badge_text(kinds)).add_attribute(Attribute::Bold),
    }
}

fn id_cell(control: &MergedControl) -> Cell {
    if control.control.is_enhancement {
        Cell::new(format!("  {}", control.id())).fg(Color::DarkGrey)
    } else {
        Cell::new(control.id())
            .fg(Color::Blue)
            .add_attribute(Attribute::Bold)
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
