//! Reading the control catalog and overlay files.

#![deny(unsafe_code)]

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use overlay_model::{Control, ControlId, RawOverlay};

use crate::error::CatalogError;
use crate::hash::verify_pin;

/// Shape of the catalog file root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogRoot {
    /// `[ {control}, ... ]`
    Array,
    /// `{ "controls": [ {control}, ... ], ... }`
    Wrapped,
}

/// Split a catalog document into its root shape and control records.
pub fn catalog_records(path: &Path, document: &Value) -> Result<(CatalogRoot, Vec<Value>), CatalogError> {
    match document {
        Value::Array(items) => Ok((CatalogRoot::Array, items.clone())),
        Value::Object(object) => match object.get("controls") {
            Some(Value::Array(items)) => Ok((CatalogRoot::Wrapped, items.clone())),
            Some(_) => Err(CatalogError::InvalidCatalog {
                path: path.to_path_buf(),
                message: "'controls' must be an array".to_string(),
            }),
            None => Err(CatalogError::InvalidCatalog {
                path: path.to_path_buf(),
                message: "catalog object must contain a 'controls' key".to_string(),
            }),
        },
        _ => Err(CatalogError::InvalidCatalog {
            path: path.to_path_buf(),
            message: "catalog root must be an array or an object".to_string(),
        }),
    }
}

pub(crate) fn read_json(path: &Path, pin: Option<&str>) -> Result<Value, CatalogError> {
    let bytes = std::fs::read(path).map_err(|e| CatalogError::io(path, e))?;
    verify_pin(path, &bytes, pin)?;
    serde_json::from_slice(&bytes).map_err(|e| CatalogError::json(path, e))
}

/// Load and validate the base catalog. Any problem here is fatal.
pub fn load_catalog(path: &Path, pin: Option<&str>) -> Result<Vec<Control>, CatalogError> {
    let document = read_json(path, pin)?;
    let (_, records) = catalog_records(path, &document)?;
    parse_controls(path, records)
}

/// Decode, normalize and cross-check catalog records.
pub fn parse_controls(path: &Path, records: Vec<Value>) -> Result<Vec<Control>, CatalogError> {
    let mut controls = Vec::with_capacity(records.len());
    let mut seen: BTreeSet<ControlId> = BTreeSet::new();

    for (index, record) in records.into_iter().enumerate() {
        let id_hint = record
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let control: Control =
            serde_json::from_value(record).map_err(|e| CatalogError::InvalidControl {
                path: path.to_path_buf(),
                index,
                message: e.to_string(),
            })?;
        let control = control.normalized().map_err(|source| CatalogError::Model {
            path: path.to_path_buf(),
            id: id_hint,
            source,
        })?;
        if !seen.insert(control.id.clone()) {
            return Err(CatalogError::DuplicateControl {
                path: path.to_path_buf(),
                id: control.id.to_string(),
            });
        }
        controls.push(control);
    }

    for control in &controls {
        if let Some(parent) = control.id.parent()
            && !seen.contains(&parent)
        {
            return Err(CatalogError::OrphanEnhancement {
                path: path.to_path_buf(),
                id: control.id.to_string(),
                parent: parent.to_string(),
            });
        }
    }

    debug!(
        path = %path.display(),
        control_count = controls.len(),
        "catalog parsed"
    );
    Ok(controls)
}

/// Load one overlay file as an id → raw record map.
///
/// Entries are not decoded here; malformed entries are dealt with per
/// control during the merge.
pub fn load_overlay(path: &Path, pin: Option<&str>) -> Result<RawOverlay, CatalogError> {
    match read_json(path, pin)? {
        Value::Object(entries) => Ok(entries),
        _ => Err(CatalogError::InvalidOverlay {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(records: Value) -> Result<Vec<Control>, CatalogError> {
        let path = Path::new("catalog.json");
        let (_, records) = catalog_records(path, &records)?;
        parse_controls(path, records)
    }

    #[test]
    fn accepts_bare_and_wrapped_roots() {
        let bare = parse(json!([{"id": "AC-1"}, {"id": "AC-2"}])).unwrap();
        assert_eq!(bare.len(), 2);

        let wrapped = parse(json!({"version": "5.1", "controls": [{"id": "AC-1"}]})).unwrap();
        assert_eq!(wrapped[0].id.to_string(), "AC-1");
    }

    #[test]
    fn rejects_orphan_enhancements() {
        let err = parse(json!([{"id": "AC-1"}, {"id": "AC-2(1)"}])).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::OrphanEnhancement { ref parent, .. } if parent == "AC-2"
        ));
    }

    #[test]
    fn rejects_duplicates_and_bad_ids() {
        let err = parse(json!([{"id": "AC-1"}, {"id": "AC-1"}])).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateControl { .. }));

        let err = parse(json!([{"id": "AC-1"}, {"id": "not-an-id"}])).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidControl { index: 1, .. }));

        let err = parse(json!({"controls": {"id": "AC-1"}})).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidCatalog { .. }));
    }
}
