#![deny(unsafe_code)]

pub mod dataset;
pub mod doctor;
pub mod error;
pub mod hash;
pub mod loader;
pub mod manifest;
pub mod paths;
pub mod sort;

pub use crate::dataset::{Dataset, LoadNotice, LoadSummary, OverlayStatus};
pub use crate::doctor::DoctorReport;
pub use crate::error::CatalogError;
pub use crate::manifest::{DataManifest, ManifestSource};
pub use crate::paths::{DATA_DIR_ENV_VAR, data_root};
pub use crate::sort::{SortReport, sort_catalog_file};
