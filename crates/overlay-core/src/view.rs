//! Control filter/search view.
//!
//! The view is a pure function of the merged catalog and a [`FilterState`].
//! Every call recomputes the visible list from scratch.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use overlay_model::OverlayKind;

use crate::merge::{MergedCatalog, MergedControl, ResolvedAnnotation};

/// User-controlled filter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    query: String,
    family: Option<String>,
    enabled: BTreeSet<OverlayKind>,
    show_unselected: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query: String::new(),
            family: None,
            enabled: OverlayKind::ALL.into_iter().collect(),
            show_unselected: false,
        }
    }
}

impl FilterState {
    /// Initial state: no query, all families, every overlay enabled,
    /// selected-only mode.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.set_query(query);
        self
    }

    #[must_use]
    pub fn with_family(mut self, family: Option<String>) -> Self {
        self.set_family(family);
        self
    }

    #[must_use]
    pub fn with_show_unselected(mut self, show: bool) -> Self {
        self.show_unselected = show;
        self
    }

    /// Enable exactly the given overlays.
    #[must_use]
    pub fn with_only_overlays(mut self, kinds: impl IntoIterator<Item = OverlayKind>) -> Self {
        self.enabled = kinds.into_iter().collect();
        self
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// `None` or a blank string selects all families.
    pub fn set_family(&mut self, family: Option<String>) {
        self.family = family
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
    }

    pub fn set_show_unselected(&mut self, show: bool) {
        self.show_unselected = show;
    }

    pub fn set_overlay_enabled(&mut self, kind: OverlayKind, enabled: bool) {
        if enabled {
            self.enabled.insert(kind);
        } else {
            self.enabled.remove(&kind);
        }
    }

    /// Flip one overlay toggle and return its new state.
    pub fn toggle_overlay(&mut self, kind: OverlayKind) -> bool {
        let enabled = !self.enabled.contains(&kind);
        self.set_overlay_enabled(kind, enabled);
        enabled
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Query as used for matching: trimmed and lowercased.
    pub fn normalized_query(&self) -> String {
        self.query.trim().to_lowercase()
    }

    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn is_enabled(&self, kind: OverlayKind) -> bool {
        self.enabled.contains(&kind)
    }

    pub fn enabled_overlays(&self) -> impl Iterator<Item = OverlayKind> + '_ {
        self.enabled.iter().copied()
    }

    pub fn show_unselected(&self) -> bool {
        self.show_unselected
    }
}

/// Enabled overlays selecting the control, in precedence order.
pub fn visible_badges(control: &MergedControl, state: &FilterState) -> Vec<OverlayKind> {
    control
        .selected_by()
        .filter(|kind| state.is_enabled(*kind))
        .collect()
}

/// Scalar fields resolved across the enabled overlays only. A disabled
/// overlay never supplies the effective value or a secondary one.
pub fn visible_resolved(control: &MergedControl, state: &FilterState) -> ResolvedAnnotation {
    ResolvedAnnotation::resolve_where(&control.annotations, |kind| state.is_enabled(kind))
}

fn passes_text_and_family(control: &MergedControl, state: &FilterState) -> bool {
    if let Some(family) = state.family()
        && control.control.family_code() != family
    {
        return false;
    }
    control.control.matches_text(&state.normalized_query())
}

fn passes_overlay_rule(control: &MergedControl, state: &FilterState) -> bool {
    state.show_unselected() || control.selected_by().any(|kind| state.is_enabled(kind))
}

/// Whether one control passes the query, family and overlay rules.
pub fn is_visible(control: &MergedControl, state: &FilterState) -> bool {
    passes_overlay_rule(control, state) && passes_text_and_family(control, state)
}

/// Controls to display, in natural control order.
pub fn filter_controls<'a>(merged: &'a MergedCatalog, state: &FilterState) -> Vec<&'a MergedControl> {
    let mut visible: Vec<&MergedControl> = merged
        .controls()
        .iter()
        .filter(|control| is_visible(control, state))
        .collect();
    visible.sort_by(|a, b| a.id().cmp(b.id()));
    visible
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewSummary {
    pub visible: usize,
    pub total: usize,
    pub by_family: BTreeMap<String, usize>,
    pub by_overlay: BTreeMap<OverlayKind, usize>,
}

/// Counts describing a filtered list; badge counts only cover enabled overlays.
pub fn summarize(
    merged: &MergedCatalog,
    visible: &[&MergedControl],
    state: &FilterState,
) -> ViewSummary {
    let mut by_family: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_overlay: BTreeMap<OverlayKind, usize> = BTreeMap::new();
    for control in visible {
        *by_family
            .entry(control.control.family_code().to_string())
            .or_default() += 1;
        for kind in visible_badges(control, state) {
            *by_overlay.entry(kind).or_default() += 1;
        }
    }
    ViewSummary {
        visible: visible.len(),
        total: merged.len(),
        by_family,
        by_overlay,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyStats {
    pub family: String,
    pub controls: usize,
    pub enhancements: usize,
    /// Controls selected by at least one enabled overlay.
    pub selected: usize,
}

/// Per-family totals across the whole catalog, alphabetically by family.
pub fn family_stats(merged: &MergedCatalog, state: &FilterState) -> Vec<FamilyStats> {
    let mut stats: BTreeMap<&str, FamilyStats> = BTreeMap::new();
    for control in merged.controls() {
        let family = control.control.family_code();
        let entry = stats.entry(family).or_insert_with(|| FamilyStats {
            family: family.to_string(),
            controls: 0,
            enhancements: 0,
            selected: 0,
        });
        entry.controls += 1;
        if control.control.is_enhancement {
            entry.enhancements += 1;
        }
        if control.selected_by().any(|kind| state.is_enabled(kind)) {
            entry.selected += 1;
        }
    }
    stats.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_flips_and_reports_state() {
        let mut state = FilterState::new();
        assert!(state.is_enabled(OverlayKind::Cnssi1253));
        assert!(!state.toggle_overlay(OverlayKind::Cnssi1253));
        assert!(!state.is_enabled(OverlayKind::Cnssi1253));
        assert!(state.toggle_overlay(OverlayKind::Cnssi1253));
        assert_eq!(state.enabled_overlays().count(), 4);
    }

    #[test]
    fn blank_family_means_all_and_query_is_normalized() {
        let state = FilterState::new()
            .with_family(Some("  ".to_string()))
            .with_query("  Access ");
        assert_eq!(state.family(), None);
        assert_eq!(state.normalized_query(), "access");
        assert_eq!(state.query(), "  Access ");
    }

    #[test]
    fn visibility_of_a_single_control() {
        use overlay_model::{Control, OverlaySet};
        use serde_json::json;

        let catalog = vec![Control::new("AC-2".parse().unwrap(), "Account Management")];
        let mut overlays = OverlaySet::new();
        overlays.insert(
            OverlayKind::FedrampPlus,
            json!({"AC-2": {"justification": "x"}}).as_object().cloned().unwrap(),
        );
        let merged = crate::merge::merge(&catalog, &overlays);
        let control = &merged.controls()[0];

        assert!(is_visible(control, &FilterState::new()));
        assert!(!is_visible(control, &FilterState::new().with_query("boundary")));
        let disabled = FilterState::new().with_only_overlays([OverlayKind::Cnssi1253]);
        assert!(!is_visible(control, &disabled));
        assert!(is_visible(control, &disabled.with_show_unselected(true)));
    }
}
