use thiserror::Error;

use crate::overlay::OverlayKind;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid control id '{id}': {reason}")]
    InvalidControlId { id: String, reason: &'static str },
    #[error("control {id} declares parent {parent}, expected {expected}")]
    ParentMismatch {
        id: String,
        parent: String,
        expected: String,
    },
    #[error("unknown overlay '{0}'")]
    UnknownOverlay(String),
}

/// Why a single overlay entry could not be turned into a typed annotation.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("{kind} entry is not a JSON object")]
    NotAnObject { kind: OverlayKind },
    #[error("{kind} entry is missing required field '{field}'")]
    MissingDiscriminator {
        kind: OverlayKind,
        field: &'static str,
    },
    #[error("{kind} entry could not be decoded: {source}")]
    Decode {
        kind: OverlayKind,
        #[source]
        source: serde_json::Error,
    },
}
