use std::fs;
use std::path::Path;

use overlay_catalog::hash::sha256_hex;
use overlay_catalog::{
    CatalogError, Dataset, DoctorReport, LoadNotice, ManifestSource, sort_catalog_file,
};
use overlay_model::OverlayKind;

const CATALOG: &str = r#"{
  "controls": [
    {"id": "AC-1", "name": "Policy and Procedures", "family": "AC"},
    {"id": "AC-2", "name": "Account Management", "family": "AC"},
    {"id": "AC-2(1)", "name": "Automated System Account Management", "family": "AC", "isEnhancement": true, "parentControl": "AC-2"},
    {"id": "SC-7", "name": "Boundary Protection", "family": "SC"}
  ]
}"#;

const CNSSI: &str = r#"{
  "AC-2": {
    "control_id": "AC-2",
    "title": "Account Management",
    "selected": true,
    "selections": {
      "confidentiality": {"low": true, "moderate": true, "high": true},
      "integrity": {"low": true, "moderate": true, "high": true},
      "availability": {"low": false, "moderate": false, "high": false}
    },
    "parameter_value": "annually",
    "justification": null
  }
}"#;

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn default_layout_degrades_missing_and_broken_overlays() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("nist_800_53_catalog.json"), CATALOG);
    write(&dir.path().join("cnssi_1253.json"), CNSSI);
    write(&dir.path().join("fedramp_plus.json"), "{ not json");

    let (dataset, summary) = Dataset::load(dir.path()).expect("load dataset");

    assert_eq!(summary.manifest_source, ManifestSource::DefaultLayout);
    assert_eq!(summary.control_count, 4);
    assert_eq!(summary.enhancement_count, 1);
    assert_eq!(summary.family_count, 2);
    assert_eq!(dataset.overlays.len(), 1);
    assert!(dataset.overlays.contains_key(&OverlayKind::Cnssi1253));

    let notice_kinds: Vec<OverlayKind> = dataset.notices.iter().map(LoadNotice::kind).collect();
    assert_eq!(
        notice_kinds,
        [
            OverlayKind::FedrampHigh,
            OverlayKind::ClassifiedInformation,
            OverlayKind::FedrampPlus
        ]
    );
    assert!(matches!(
        dataset.notices[2],
        LoadNotice::UnreadableOverlay { .. }
    ));
}

#[test]
fn manifest_pins_are_enforced() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("catalog/nist.json"), CATALOG);
    write(&dir.path().join("overlays/cnssi.json"), CNSSI);
    let manifest = format!(
        r#"[manifest]
schema = "overlay-viewer.data-manifest"
schema_version = 1

[catalog]
path = "catalog/nist.json"
sha256 = "{}"

[[overlays]]
kind = "cnssi_1253"
path = "overlays/cnssi.json"
sha256 = "{}"
notes = "2022 revision, Appendix F"
"#,
        sha256_hex(CATALOG.as_bytes()),
        "0".repeat(64),
    );
    write(&dir.path().join("overlays.toml"), &manifest);

    let (dataset, summary) = Dataset::load(dir.path()).expect("load dataset");
    assert_eq!(summary.manifest_source, ManifestSource::File);
    assert!(dataset.overlays.is_empty());
    assert_eq!(summary.overlays.len(), 1);
    assert!(!summary.overlays[0].loaded);
    let LoadNotice::UnreadableOverlay { message, .. } = &dataset.notices[0] else {
        panic!("expected unreadable overlay notice");
    };
    assert!(message.contains("sha256 mismatch"), "{message}");

    let report = DoctorReport::from_load_summary(&summary, dataset.manifest, dataset.notices);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(
        json["manifest"]["overlays"][0]["notes"],
        "2022 revision, Appendix F"
    );
}

#[test]
fn catalog_problems_are_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = Dataset::load(dir.path()).unwrap_err();
    assert!(matches!(err, CatalogError::Io { .. }));

    write(&dir.path().join("nist_800_53_catalog.json"), "[{\"id\": 7}]");
    let err = Dataset::load(dir.path()).unwrap_err();
    assert!(matches!(err, CatalogError::InvalidControl { .. }));
}

#[test]
fn doctor_report_counts_are_stable() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("nist_800_53_catalog.json"), CATALOG);
    write(&dir.path().join("cnssi_1253.json"), CNSSI);

    let (dataset, summary) = Dataset::load(dir.path()).expect("load dataset");
    let report =
        DoctorReport::from_load_summary(&summary, dataset.manifest.clone(), dataset.notices);

    assert!(!report.is_healthy());
    insta::assert_json_snapshot!(report.counts, @r#"
    {
      "controls": 4,
      "base_controls": 3,
      "enhancements": 1,
      "families": 2,
      "overlays_loaded": 1
    }
    "#);
}

#[test]
fn sort_preserves_unknown_fields_and_root_shape() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("catalog.json");
    write(
        &input,
        r#"{"version": "5.1.1", "controls": [
            {"id": "AC-10", "custom": {"keep": true}},
            {"id": "AC-2(1)"},
            {"id": "AC-2"}
        ]}"#,
    );
    let output = dir.path().join("sorted.json");

    let report = sort_catalog_file(&input, &output).expect("sort catalog");
    assert_eq!(report.control_count, 3);

    let sorted: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(sorted["version"], "5.1.1");
    let ids: Vec<&str> = sorted["controls"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["AC-2", "AC-2(1)", "AC-10"]);
    assert_eq!(sorted["controls"][2]["custom"]["keep"], true);
}

#[test]
fn sort_rewrites_bare_array_catalog_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    write(
        &path,
        r#"[
            {"id": "SC-7", "name": "Boundary Protection"},
            {"id": "AC-10", "name": "Concurrent Session Control"},
            {"id": "AC-2", "name": "Account Management", "extra": [1, 2]}
        ]"#,
    );

    let report = sort_catalog_file(&path, &path).expect("sort catalog");
    assert_eq!(report.control_count, 3);

    let sorted: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let records = sorted.as_array().expect("bare array root is kept");
    let ids: Vec<&str> = records.iter().map(|c| c["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["AC-2", "AC-10", "SC-7"]);
    assert_eq!(records[0]["extra"], serde_json::json!([1, 2]));
}
