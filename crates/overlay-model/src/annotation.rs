//! Overlay-specific annotation records.
//!
//! Each overlay file maps a control id to a record whose shape depends on
//! the overlay. A record is only accepted when it carries the field that
//! identifies its shape (the discriminator).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AnnotationError;
use crate::overlay::OverlayKind;

/// Scalar fields that several overlays may supply for the same control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarField {
    ParameterValue,
    Justification,
    Guidance,
}

impl ScalarField {
    pub const ALL: [ScalarField; 3] = [
        ScalarField::ParameterValue,
        ScalarField::Justification,
        ScalarField::Guidance,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ScalarField::ParameterValue => "Parameter value",
            ScalarField::Justification => "Justification",
            ScalarField::Guidance => "Guidance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FedrampHighAnnotation {
    pub assessment_procedures: Vec<AssessmentProcedure>,
    #[serde(default)]
    pub parameter_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssessmentProcedure {
    Text(String),
    Detailed(AssessmentStep),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentStep {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub objects: Vec<String>,
}

impl AssessmentProcedure {
    /// One-line rendering for detail views.
    pub fn summary(&self) -> String {
        match self {
            AssessmentProcedure::Text(text) => text.clone(),
            AssessmentProcedure::Detailed(step) => {
                let objective = step.objective.as_deref().unwrap_or("");
                match &step.id {
                    Some(id) => format!("{id}: {objective}"),
                    None => objective.to_string(),
                }
            }
        }
    }
}

/// Selection marks for one security objective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactLevels {
    #[serde(default)]
    pub low: bool,
    #[serde(default)]
    pub moderate: bool,
    #[serde(default)]
    pub high: bool,
}

impl ImpactLevels {
    pub fn any(&self) -> bool {
        self.low || self.moderate || self.high
    }

    /// Compact `L M H` rendering with `-` for unmarked levels.
    pub fn marks(&self) -> String {
        let mark = |set: bool, label: char| if set { label } else { '-' };
        [
            mark(self.low, 'L'),
            mark(self.moderate, 'M'),
            mark(self.high, 'H'),
        ]
        .iter()
        .collect()
    }
}

/// Confidentiality / integrity / availability selection triple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiaSelections {
    pub confidentiality: ImpactLevels,
    pub integrity: ImpactLevels,
    pub availability: ImpactLevels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_text: Option<String>,
}

impl CiaSelections {
    pub fn any(&self) -> bool {
        self.confidentiality.any() || self.integrity.any() || self.availability.any()
    }

    pub fn objectives(&self) -> [(&'static str, ImpactLevels); 3] {
        [
            ("confidentiality", self.confidentiality),
            ("integrity", self.integrity),
            ("availability", self.availability),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CnssiAnnotation {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub selected: Option<bool>,
    #[serde(default)]
    pub withdrawn: bool,
    pub selections: CiaSelections,
    #[serde(default)]
    pub parameter_value: Option<String>,
    #[serde(default)]
    pub justification: Option<String>,
}

/// Justification / parameter / guidance record used by the Classified
/// Information Overlay and FedRAMP+.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidanceAnnotation {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub selected: Option<bool>,
    #[serde(default)]
    pub justification: Option<String>,
    #[serde(default)]
    pub parameter_value: Option<String>,
    #[serde(default)]
    pub guidance: Option<String>,
    #[serde(default)]
    pub references: Option<String>,
}

const GUIDANCE_FIELDS: [&str; 3] = ["justification", "parameter_value", "guidance"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "overlay", content = "annotation", rename_all = "snake_case")]
pub enum OverlayAnnotation {
    FedrampHigh(FedrampHighAnnotation),
    #[serde(rename = "cnssi_1253")]
    Cnssi1253(CnssiAnnotation),
    ClassifiedInformation(GuidanceAnnotation),
    FedrampPlus(GuidanceAnnotation),
}

impl OverlayAnnotation {
    /// Decode a raw overlay entry for the given overlay.
    pub fn from_value(kind: OverlayKind, value: &Value) -> Result<Self, AnnotationError> {
        let object = value
            .as_object()
            .ok_or(AnnotationError::NotAnObject { kind })?;
        let decode = |source| AnnotationError::Decode { kind, source };

        match kind {
            OverlayKind::FedrampHigh => {
                if !object.contains_key("assessment_procedures") {
                    return Err(AnnotationError::MissingDiscriminator {
                        kind,
                        field: "assessment_procedures",
                    });
                }
                serde_json::from_value(value.clone())
                    .map(OverlayAnnotation::FedrampHigh)
                    .map_err(decode)
            }
            OverlayKind::Cnssi1253 => {
                if !object.contains_key("selections") {
                    return Err(AnnotationError::MissingDiscriminator {
                        kind,
                        field: "selections",
                    });
                }
                serde_json::from_value(value.clone())
                    .map(OverlayAnnotation::Cnssi1253)
                    .map_err(decode)
            }
            OverlayKind::ClassifiedInformation | OverlayKind::FedrampPlus => {
                if !GUIDANCE_FIELDS.iter().any(|f| object.contains_key(*f)) {
                    return Err(AnnotationError::MissingDiscriminator {
                        kind,
                        field: "justification",
                    });
                }
                let annotation: GuidanceAnnotation =
                    serde_json::from_value(value.clone()).map_err(decode)?;
                Ok(if kind == OverlayKind::FedrampPlus {
                    OverlayAnnotation::FedrampPlus(annotation)
                } else {
                    OverlayAnnotation::ClassifiedInformation(annotation)
                })
            }
        }
    }

    pub fn kind(&self) -> OverlayKind {
        match self {
            OverlayAnnotation::FedrampHigh(_) => OverlayKind::FedrampHigh,
            OverlayAnnotation::Cnssi1253(_) => OverlayKind::Cnssi1253,
            OverlayAnnotation::ClassifiedInformation(_) => OverlayKind::ClassifiedInformation,
            OverlayAnnotation::FedrampPlus(_) => OverlayKind::FedrampPlus,
        }
    }

    /// Non-blank value of a precedence-resolved scalar field.
    pub fn scalar(&self, field: ScalarField) -> Option<&str> {
        let raw = match (self, field) {
            (OverlayAnnotation::FedrampHigh(a), ScalarField::ParameterValue) => {
                a.parameter_value.as_deref()
            }
            (OverlayAnnotation::FedrampHigh(_), _) => None,
            (OverlayAnnotation::Cnssi1253(a), ScalarField::ParameterValue) => {
                a.parameter_value.as_deref()
            }
            (OverlayAnnotation::Cnssi1253(a), ScalarField::Justification) => {
                a.justification.as_deref()
            }
            (OverlayAnnotation::Cnssi1253(_), ScalarField::Guidance) => None,
            (
                OverlayAnnotation::ClassifiedInformation(a) | OverlayAnnotation::FedrampPlus(a),
                field,
            ) => match field {
                ScalarField::ParameterValue => a.parameter_value.as_deref(),
                ScalarField::Justification => a.justification.as_deref(),
                ScalarField::Guidance => a.guidance.as_deref(),
            },
        };
        raw.map(str::trim).filter(|v| !v.is_empty())
    }

    /// Title the overlay document gives the control, if any.
    pub fn title(&self) -> Option<&str> {
        match self {
            OverlayAnnotation::FedrampHigh(_) => None,
            OverlayAnnotation::Cnssi1253(a) => a.title.as_deref(),
            OverlayAnnotation::ClassifiedInformation(a) | OverlayAnnotation::FedrampPlus(a) => {
                a.name.as_deref()
            }
        }
    }
}
