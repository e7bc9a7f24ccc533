//! Rewrite a catalog file into natural control order.
//!
//! Records are reordered as raw JSON so fields this crate does not model
//! survive the rewrite untouched.

#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use overlay_model::ControlId;

use crate::error::CatalogError;
use crate::loader::{CatalogRoot, catalog_records, read_json};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FamilyCount {
    pub base: usize,
    pub enhancements: usize,
}

impl FamilyCount {
    pub fn total(&self) -> usize {
        self.base + self.enhancements
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SortReport {
    pub control_count: usize,
    pub families: BTreeMap<String, FamilyCount>,
    /// Positions whose control changed.
    pub moved: usize,
    /// Ids that did not parse; kept at the end in their original order.
    pub malformed_ids: Vec<String>,
}

fn record_id(record: &Value) -> &str {
    record.get("id").and_then(Value::as_str).unwrap_or("")
}

/// Sort raw catalog records and describe what changed.
pub fn sort_records(records: Vec<Value>) -> (Vec<Value>, SortReport) {
    let original_ids: Vec<String> = records.iter().map(|r| record_id(r).to_string()).collect();

    let mut report = SortReport {
        control_count: records.len(),
        ..SortReport::default()
    };
    let mut keyed: Vec<(Option<ControlId>, Value)> = Vec::with_capacity(records.len());
    for record in records {
        let raw = record_id(&record);
        match raw.parse::<ControlId>() {
            Ok(id) => {
                let count = report.families.entry(id.family().to_string()).or_default();
                if id.is_enhancement() {
                    count.enhancements += 1;
                } else {
                    count.base += 1;
                }
                keyed.push((Some(id), record));
            }
            Err(error) => {
                warn!(id = raw, %error, "control id does not parse; moving it to the end");
                report.malformed_ids.push(raw.to_string());
                keyed.push((None, record));
            }
        }
    }

    // Stable: malformed ids and duplicates keep their relative order.
    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let sorted: Vec<Value> = keyed.into_iter().map(|(_, record)| record).collect();
    report.moved = original_ids
        .iter()
        .zip(sorted.iter())
        .filter(|(before, after)| before.as_str() != record_id(after))
        .count();
    (sorted, report)
}

/// Sort the catalog at `input` and write it to `output` (which may be the
/// same file). The root shape and any non-control fields are preserved.
pub fn sort_catalog_file(input: &Path, output: &Path) -> Result<SortReport, CatalogError> {
    let mut document = read_json(input, None)?;
    let (root, records) = catalog_records(input, &document)?;
    let (sorted, report) = sort_records(records);

    let sorted = Value::Array(sorted);
    match root {
        CatalogRoot::Array => document = sorted,
        CatalogRoot::Wrapped => {
            if let Value::Object(object) = &mut document {
                object.insert("controls".to_string(), sorted);
            }
        }
    }

    let mut text =
        serde_json::to_string_pretty(&document).map_err(|e| CatalogError::json(output, e))?;
    text.push('\n');
    std::fs::write(output, text).map_err(|e| CatalogError::io(output, e))?;

    info!(
        input = %input.display(),
        output = %output.display(),
        control_count = report.control_count,
        moved = report.moved,
        "catalog sorted"
    );
    Ok(report)
}
