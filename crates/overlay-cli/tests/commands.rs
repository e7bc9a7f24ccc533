//! End-to-end checks from parsed arguments to rendered output.

use std::fs;
use std::path::Path;

use clap::Parser;

use overlay_cli::cli::{Cli, Command};
use overlay_cli::filter::filter_state;
use overlay_cli::render::{
    control_detail, control_detail_json, control_rows, controls_table, view_footer,
};
use overlay_cli::session::Session;
use overlay_core::{FilterState, filter_controls, summarize};
use overlay_model::OverlayKind;

const CATALOG: &str = r#"[
  {"id": "AC-1", "name": "Policy and Procedures", "controlText": "Develop an access control policy."},
  {"id": "AC-2", "name": "Account Management", "controlText": "Define and document account types.", "relatedControls": ["AC-3"]},
  {"id": "AC-2(1)", "name": "Automated System Account Management"},
  {"id": "AC-3", "name": "Access Enforcement", "controlText": "Enforce approved authorizations."},
  {"id": "AC-10", "name": "Concurrent Session Control"},
  {"id": "SC-7", "name": "Boundary Protection"}
]"#;

const CNSSI: &str = r#"{
  "AC-2": {
    "title": "Account Management",
    "selected": true,
    "selections": {
      "confidentiality": {"low": true, "moderate": true, "high": true},
      "integrity": {"low": true, "moderate": true, "high": true},
      "availability": {"low": false, "moderate": false, "high": false}
    },
    "parameter_value": "at least annually",
    "justification": null
  },
  "AC-3": {
    "selections": {
      "confidentiality": {"low": false, "moderate": true, "high": true},
      "integrity": {},
      "availability": {}
    },
    "parameter_value": "at least annually"
  }
}"#;

const FEDRAMP_PLUS: &str = r#"{
  "AC-2(1)": {"name": "Automated System Account Management", "justification": "DoD requirement.", "parameter_value": null, "guidance": null},
  "AC-3": {"justification": null, "parameter_value": "daily", "guidance": "Enforce at the application layer."},
  "AC-99": {"justification": "not in catalog"}
}"#;

fn write_data_dir(root: &Path) {
    fs::write(root.join("nist_800_53_catalog.json"), CATALOG).unwrap();
    fs::write(root.join("cnssi_1253.json"), CNSSI).unwrap();
    fs::write(root.join("fedramp_plus.json"), FEDRAMP_PLUS).unwrap();
}

fn open(root: &Path) -> Session {
    Session::open(Some(root)).expect("open session")
}

#[test]
fn controls_flags_become_filter_state() {
    let cli = Cli::try_parse_from([
        "overlay-viewer",
        "controls",
        "--query",
        "Access",
        "--family",
        "ac",
        "--overlay",
        "cnssi_1253,fedramp-plus",
        "--disable",
        "FR+",
        "--show-unselected",
    ])
    .unwrap();
    let Command::Controls(args) = &cli.command else {
        panic!("expected controls command");
    };
    let state = filter_state(args);
    assert_eq!(state.query(), "Access");
    assert_eq!(state.family(), Some("AC"));
    assert!(state.show_unselected());
    let enabled: Vec<OverlayKind> = state.enabled_overlays().collect();
    assert_eq!(enabled, [OverlayKind::Cnssi1253]);
}

#[test]
fn unknown_overlay_name_is_rejected() {
    let result = Cli::try_parse_from(["overlay-viewer", "controls", "--overlay", "nist-high"]);
    assert!(result.is_err());
}

#[test]
fn global_data_dir_is_accepted_after_subcommand() {
    let cli = Cli::try_parse_from(["overlay-viewer", "families", "--data-dir", "/srv/overlays"])
        .unwrap();
    assert_eq!(
        cli.data_dir.as_deref(),
        Some(Path::new("/srv/overlays"))
    );
}

#[test]
fn session_reports_missing_overlays_as_notices() {
    let dir = tempfile::tempdir().unwrap();
    write_data_dir(dir.path());
    let session = open(dir.path());

    assert_eq!(session.merged.len(), 6);
    let lines = session.notice_lines();
    assert_eq!(lines.len(), 2, "{lines:?}");
    assert!(lines.iter().all(|line| line.starts_with("notice: ")));
    assert!(lines[0].contains("FedRAMP High"));
    assert!(lines[1].contains("Classified Information Overlay"));
}

#[test]
fn selected_only_listing_shows_badges_and_footer() {
    let dir = tempfile::tempdir().unwrap();
    write_data_dir(dir.path());
    let session = open(dir.path());
    let state = FilterState::new();
    let visible = filter_controls(&session.merged, &state);

    let rows = control_rows(&visible, &state);
    insta::assert_json_snapshot!(rows, @r#"
    [
      {
        "id": "AC-2",
        "name": "Account Management",
        "family": "AC",
        "enhancement": false,
        "overlays": [
          "cnssi_1253"
        ]
      },
      {
        "id": "AC-2(1)",
        "name": "Automated System Account Management",
        "family": "AC",
        "enhancement": true,
        "overlays": [
          "fedramp_plus"
        ]
      },
      {
        "id": "AC-3",
        "name": "Access Enforcement",
        "family": "AC",
        "enhancement": false,
        "overlays": [
          "cnssi_1253",
          "fedramp_plus"
        ]
      }
    ]
    "#);

    let table = controls_table(&visible, &state).to_string();
    assert!(table.contains("Access Enforcement"));
    assert!(table.contains("CNSSI FR+"));
    assert!(!table.contains("SC-7"));

    let footer = view_footer(&summarize(&session.merged, &visible, &state));
    assert_eq!(footer, "Showing 3 of 6 controls (CNSSI 2, FR+ 2)");
}

#[test]
fn detail_shows_resolved_value_with_secondary_source() {
    let dir = tempfile::tempdir().unwrap();
    write_data_dir(dir.path());
    let session = open(dir.path());
    let state = FilterState::new();
    let ac3 = session.merged.get(&"AC-3".parse().unwrap()).unwrap();

    let detail = control_detail(&session.merged, ac3, &state);
    assert!(detail.starts_with("AC-3  Access Enforcement"), "{detail}");
    assert!(detail.contains("Overlays: CNSSI FR+"));
    assert!(detail.contains("Resolved fields:"));
    assert!(detail.contains("daily"));
    assert!(detail.contains("CNSSI: at least annually"));
    assert!(detail.contains("Selections: C -MH  I ---  A ---"));
    assert!(detail.contains("Guidance: Enforce at the application layer."));

    let ac2 = session.merged.get(&"AC-2".parse().unwrap()).unwrap();
    let detail = control_detail(&session.merged, ac2, &state);
    assert!(detail.contains("Related controls: AC-3"));
    assert!(detail.contains("AC-2(1)  Automated System Account Management  [FR+]"));
}

#[test]
fn disabled_overlay_annotations_are_hidden_in_detail() {
    let dir = tempfile::tempdir().unwrap();
    write_data_dir(dir.path());
    let session = open(dir.path());
    let state = FilterState::new().with_only_overlays([OverlayKind::Cnssi1253]);
    let ac3 = session.merged.get(&"AC-3".parse().unwrap()).unwrap();

    let detail = control_detail(&session.merged, ac3, &state);
    assert!(detail.contains("Overlays: CNSSI"));
    assert!(!detail.contains("FedRAMP+:"));
    assert!(detail.contains("CNSSI 1253:"));
}

#[test]
fn disabled_overlay_never_supplies_resolved_values() {
    let dir = tempfile::tempdir().unwrap();
    write_data_dir(dir.path());
    let session = open(dir.path());
    let state = FilterState::new().with_only_overlays([OverlayKind::Cnssi1253]);
    let ac3 = session.merged.get(&"AC-3".parse().unwrap()).unwrap();

    let detail = control_detail(&session.merged, ac3, &state);
    assert!(detail.contains("Resolved fields:"), "{detail}");
    assert!(detail.contains("at least annually"));
    assert!(!detail.contains("daily"), "{detail}");
    assert!(!detail.contains("FR+"), "{detail}");
    assert!(!detail.contains("Enforce at the application layer."));

    let json = serde_json::to_value(control_detail_json(ac3, &state)).unwrap();
    assert_eq!(
        json["resolved"]["fields"]["parameter_value"]["effective"],
        serde_json::json!({"overlay": "cnssi_1253", "value": "at least annually"})
    );
    assert!(json["annotations"].get("fedramp_plus").is_none());
    assert!(json["annotations"].get("cnssi_1253").is_some());
}
