#![deny(unsafe_code)]

use std::path::PathBuf;

use overlay_model::{ModelError, OverlayKind};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML manifest {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid manifest: {message}")]
    InvalidManifest { message: String },

    #[error("duplicate overlay in manifest: {kind}")]
    DuplicateOverlay { kind: OverlayKind },

    #[error("invalid sha256 for {path}: {message}")]
    InvalidSha256 { path: PathBuf, message: String },

    #[error("invalid manifest path {path}: {message}")]
    InvalidPath { path: PathBuf, message: String },

    #[error("sha256 mismatch for {path} (expected {expected}, got {actual})")]
    Sha256Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("invalid catalog {path}: {message}")]
    InvalidCatalog { path: PathBuf, message: String },

    #[error("invalid control at index {index} in {path}: {message}")]
    InvalidControl {
        path: PathBuf,
        index: usize,
        message: String,
    },

    #[error("control {id} in {path}: {source}")]
    Model {
        path: PathBuf,
        id: String,
        #[source]
        source: ModelError,
    },

    #[error("duplicate control {id} in {path}")]
    DuplicateControl { path: PathBuf, id: String },

    #[error("enhancement {id} has no base control {parent} in {path}")]
    OrphanEnhancement {
        path: PathBuf,
        id: String,
        parent: String,
    },

    #[error("overlay file {path} must be a JSON object keyed by control id")]
    InvalidOverlay { path: PathBuf },
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
