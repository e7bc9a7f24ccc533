use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use overlay_catalog::loader::load_overlay;
use overlay_catalog::{Dataset, DoctorReport, data_root, sort_catalog_file};
use overlay_cli::cli::{CompareArgs, ControlsArgs, FamiliesArgs, ShowArgs, SortCatalogArgs};
use overlay_cli::filter::{apply_toggles, filter_state};
use overlay_cli::render::{
    comparison_report, control_detail, control_detail_json, control_rows, controls_table,
    families_table, sort_report_table, view_footer,
};
use overlay_cli::session::Session;
use overlay_core::{FilterState, compare_overlays, family_stats, filter_controls, summarize};
use overlay_model::ControlId;

fn open_session(data_dir: Option<&Path>) -> Result<Session> {
    let session = Session::open(data_dir)?;
    for line in session.notice_lines() {
        eprintln!("{line}");
    }
    Ok(session)
}

pub fn run_controls(args: &ControlsArgs, data_dir: Option<&Path>) -> Result<()> {
    let session = open_session(data_dir)?;
    let state = filter_state(args);
    if let Some(family) = state.family()
        && !session.merged.families().iter().any(|f| f == family)
    {
        warn!(family, "no controls in this family");
    }
    let visible = filter_controls(&session.merged, &state);
    if args.json {
        let rows = control_rows(&visible, &state);
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if visible.is_empty() {
        println!("No controls match the current filters.");
    } else {
        println!("{}", controls_table(&visible, &state));
    }
    println!("{}", view_footer(&summarize(&session.merged, &visible, &state)));
    Ok(())
}

pub fn run_show(args: &ShowArgs, data_dir: Option<&Path>) -> Result<()> {
    let id: ControlId = args
        .id
        .trim()
        .to_uppercase()
        .parse()
        .with_context(|| format!("invalid control id {:?}", args.id))?;
    let session = open_session(data_dir)?;
    let Some(control) = session.merged.get(&id) else {
        bail!("control {id} is not in the catalog");
    };
    let state = apply_toggles(FilterState::new(), &args.overlays);
    if args.json {
        let detail = control_detail_json(control, &state);
        println!("{}", serde_json::to_string_pretty(&detail)?);
    } else {
        println!("{}", control_detail(&session.merged, control, &state));
    }
    Ok(())
}

pub fn run_families(args: &FamiliesArgs, data_dir: Option<&Path>) -> Result<()> {
    let session = open_session(data_dir)?;
    let state = apply_toggles(FilterState::new(), &args.overlays);
    let stats = family_stats(&session.merged, &state);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", families_table(&stats));
    }
    Ok(())
}

pub fn run_doctor(data_dir: Option<&Path>) -> Result<()> {
    let root = data_root(data_dir);
    let (dataset, summary) = Dataset::load(&root)
        .with_context(|| format!("load data directory {}", root.display()))?;
    let report = DoctorReport::from_load_summary(&summary, dataset.manifest, dataset.notices);
    if !report.is_healthy() {
        warn!(notices = report.notices.len(), "data directory has notices");
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn run_sort_catalog(args: &SortCatalogArgs) -> Result<()> {
    let output = args.output.as_deref().unwrap_or(&args.input);
    let report = sort_catalog_file(&args.input, output)
        .with_context(|| format!("sort catalog {}", args.input.display()))?;
    println!("{}", sort_report_table(&report));
    println!(
        "Sorted {} controls ({} moved) into {}",
        report.control_count,
        report.moved,
        output.display()
    );
    for id in &report.malformed_ids {
        eprintln!("warning: unrecognised control id {id:?} kept at the end");
    }
    info!(output = %output.display(), "catalog written");
    Ok(())
}

pub fn run_compare(args: &CompareArgs) -> Result<()> {
    let old = load_overlay(&args.old, None)
        .with_context(|| format!("load {}", args.old.display()))?;
    let new = load_overlay(&args.new, None)
        .with_context(|| format!("load {}", args.new.display()))?;
    let comparison = compare_overlays(args.overlay, &old, &new);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        println!("{}", comparison_report(&comparison));
    }
    Ok(())
}
