#![deny(unsafe_code)]

use crate::dataset::{LoadNotice, LoadSummary, OverlayStatus};
use crate::manifest::{DataManifest, ManifestSource};

/// Machine-readable account of what a data directory load produced.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DoctorReport {
    pub schema: String,
    pub schema_version: u32,
    pub manifest_source: ManifestSource,
    pub manifest: DataManifest,
    pub counts: DoctorCounts,
    pub overlays: Vec<OverlayStatus>,
    pub notices: Vec<LoadNotice>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DoctorCounts {
    pub controls: usize,
    pub base_controls: usize,
    pub enhancements: usize,
    pub families: usize,
    pub overlays_loaded: usize,
}

impl DoctorReport {
    pub fn from_load_summary(
        summary: &LoadSummary,
        manifest: DataManifest,
        notices: Vec<LoadNotice>,
    ) -> Self {
        Self {
            schema: "overlay-viewer.doctor".to_string(),
            schema_version: 1,
            manifest_source: summary.manifest_source,
            manifest,
            counts: DoctorCounts {
                controls: summary.control_count,
                base_controls: summary.base_control_count,
                enhancements: summary.enhancement_count,
                families: summary.family_count,
                overlays_loaded: summary.overlays.iter().filter(|o| o.loaded).count(),
            },
            overlays: summary.overlays.clone(),
            notices,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.notices.is_empty()
    }
}
