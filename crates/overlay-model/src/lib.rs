//! Data model for the NIST SP 800-53 catalog and its security overlays.

pub mod annotation;
pub mod control;
pub mod error;
pub mod id;
pub mod overlay;

pub use annotation::{
    AssessmentProcedure, AssessmentStep, CiaSelections, CnssiAnnotation, FedrampHighAnnotation,
    GuidanceAnnotation, ImpactLevels, OverlayAnnotation, ScalarField,
};
pub use control::Control;
pub use error::{AnnotationError, ModelError};
pub use id::ControlId;
pub use overlay::{OverlayKind, OverlaySet, RawOverlay};
