//! Catalog control records.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::id::ControlId;

/// A control or control enhancement from the NIST SP 800-53 catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    pub id: ControlId,
    #[serde(default)]
    pub name: String,
    /// Control statement text.
    #[serde(default, alias = "text")]
    pub control_text: String,
    /// Family as written in the catalog; may be the code or the family title.
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub discussion: String,
    #[serde(default)]
    pub related_controls: Vec<String>,
    #[serde(default)]
    pub is_enhancement: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_control: Option<ControlId>,
}

impl Control {
    /// Create a control with empty descriptive fields.
    pub fn new(id: ControlId, name: impl Into<String>) -> Self {
        Self {
            family: id.family().to_string(),
            is_enhancement: id.is_enhancement(),
            parent_control: id.parent(),
            id,
            name: name.into(),
            control_text: String::new(),
            discussion: String::new(),
            related_controls: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.control_text = text.into();
        self
    }

    /// Family code derived from the identifier. Filtering uses this, not `family`.
    pub fn family_code(&self) -> &str {
        self.id.family()
    }

    /// Fill defaults that depend on the identifier and reject contradictions.
    ///
    /// The identifier is authoritative for the enhancement flag; a declared
    /// parent must be the identifier's own base control.
    pub fn normalized(mut self) -> Result<Self, ModelError> {
        if self.family.trim().is_empty() {
            self.family = self.id.family().to_string();
        }
        self.is_enhancement = self.id.is_enhancement();
        let expected = self.id.parent();
        match (&self.parent_control, &expected) {
            (Some(declared), Some(expected)) if declared != expected => {
                return Err(ModelError::ParentMismatch {
                    id: self.id.to_string(),
                    parent: declared.to_string(),
                    expected: expected.to_string(),
                });
            }
            (Some(declared), None) => {
                return Err(ModelError::ParentMismatch {
                    id: self.id.to_string(),
                    parent: declared.to_string(),
                    expected: "none".to_string(),
                });
            }
            _ => {}
        }
        self.parent_control = expected;
        Ok(self)
    }

    /// Case-insensitive substring match over id, name and control text.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_text(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.id.to_string().to_lowercase().contains(needle)
            || self.name.to_lowercase().contains(needle)
            || self.control_text.to_lowercase().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_catalog_record() {
        let json = r#"{
            "id": "AC-2(1)",
            "name": "Automated System Account Management",
            "controlText": "Support the management of system accounts.",
            "family": "Access Control",
            "relatedControls": ["AC-3", "AU-6"],
            "isEnhancement": true,
            "parentControl": "AC-2"
        }"#;
        let control: Control = serde_json::from_str(json).expect("deserialize control");
        let control = control.normalized().expect("normalize");
        assert_eq!(control.family_code(), "AC");
        assert_eq!(control.family, "Access Control");
        assert_eq!(control.parent_control.unwrap().to_string(), "AC-2");
        assert_eq!(control.related_controls, ["AC-3", "AU-6"]);
    }

    #[test]
    fn normalization_derives_flags_from_id() {
        let control: Control =
            serde_json::from_str(r#"{"id": "SC-7(5)", "text": "Deny by default"}"#).unwrap();
        let control = control.normalized().unwrap();
        assert!(control.is_enhancement);
        assert_eq!(control.family, "SC");
        assert_eq!(control.control_text, "Deny by default");
        assert_eq!(control.parent_control.unwrap().to_string(), "SC-7");
    }

    #[test]
    fn normalization_rejects_wrong_parent() {
        let control: Control =
            serde_json::from_str(r#"{"id": "SC-7(5)", "parentControl": "SC-8"}"#).unwrap();
        assert!(matches!(
            control.normalized(),
            Err(ModelError::ParentMismatch { .. })
        ));
    }

    #[test]
    fn text_match_covers_id_name_and_text() {
        let control = Control::new("AC-3".parse().unwrap(), "Access Enforcement")
            .with_text("Enforce approved authorizations.");
        assert!(control.matches_text("ac-3"));
        assert!(control.matches_text("enforcement"));
        assert!(control.matches_text("authorizations"));
        assert!(!control.matches_text("audit"));
        assert!(control.matches_text(""));
    }
}
