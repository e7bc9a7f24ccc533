#![deny(unsafe_code)]

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use overlay_model::OverlayKind;

use crate::error::CatalogError;

pub const MANIFEST_SCHEMA: &str = "overlay-viewer.data-manifest";
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_CATALOG_FILE: &str = "nist_800_53_catalog.json";

/// `overlays.toml`: which files make up a dataset and their optional pins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataManifest {
    pub manifest: ManifestHeader,
    pub catalog: ManifestFile,
    #[serde(default)]
    pub overlays: Vec<OverlayFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestHeader {
    pub schema: String,
    pub schema_version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayFile {
    pub kind: OverlayKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Where the effective manifest came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestSource {
    File,
    DefaultLayout,
}

impl DataManifest {
    /// Layout used when the data directory has no `overlays.toml`.
    pub fn default_layout() -> Self {
        Self {
            manifest: ManifestHeader {
                schema: MANIFEST_SCHEMA.to_string(),
                schema_version: MANIFEST_SCHEMA_VERSION,
            },
            catalog: ManifestFile {
                path: DEFAULT_CATALOG_FILE.to_string(),
                sha256: None,
            },
            overlays: OverlayKind::ALL
                .iter()
                .map(|kind| OverlayFile {
                    kind: *kind,
                    path: kind.default_file_name(),
                    sha256: None,
                    notes: None,
                })
                .collect(),
        }
    }

    pub fn overlay(&self, kind: OverlayKind) -> Option<&OverlayFile> {
        self.overlays.iter().find(|o| o.kind == kind)
    }
}

/// Read `overlays.toml` if present, otherwise fall back to the default layout.
pub fn resolve_manifest(data_dir: &Path) -> Result<(DataManifest, ManifestSource), CatalogError> {
    let path = crate::paths::manifest_path(data_dir);
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "no data manifest, using default layout");
        return Ok((DataManifest::default_layout(), ManifestSource::DefaultLayout));
    }
    let manifest = load_manifest(&path)?;
    validate_manifest(&manifest)?;
    Ok((manifest, ManifestSource::File))
}

pub fn load_manifest(path: &Path) -> Result<DataManifest, CatalogError> {
    let contents = std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
    toml::from_str(&contents).map_err(|e| CatalogError::Toml {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn validate_manifest(manifest: &DataManifest) -> Result<(), CatalogError> {
    if manifest.manifest.schema != MANIFEST_SCHEMA {
        return Err(CatalogError::InvalidManifest {
            message: format!("unsupported schema: {}", manifest.manifest.schema),
        });
    }
    if manifest.manifest.schema_version != MANIFEST_SCHEMA_VERSION {
        return Err(CatalogError::InvalidManifest {
            message: format!(
                "unsupported schema_version: {}",
                manifest.manifest.schema_version
            ),
        });
    }

    validate_path(&manifest.catalog.path)?;
    if let Some(sha) = &manifest.catalog.sha256 {
        validate_sha(sha, &manifest.catalog.path)?;
    }

    let mut kinds = BTreeSet::new();
    for overlay in &manifest.overlays {
        if !kinds.insert(overlay.kind) {
            return Err(CatalogError::DuplicateOverlay { kind: overlay.kind });
        }
        validate_path(&overlay.path)?;
        if let Some(sha) = &overlay.sha256 {
            validate_sha(sha, &overlay.path)?;
        }
    }
    Ok(())
}

fn validate_sha(sha: &str, path: &str) -> Result<(), CatalogError> {
    if sha.len() != 64 || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CatalogError::InvalidSha256 {
            path: PathBuf::from(path),
            message: "sha256 must be 64 hex characters".to_string(),
        });
    }
    Ok(())
}

fn validate_path(path: &str) -> Result<PathBuf, CatalogError> {
    if path.trim().is_empty() {
        return Err(CatalogError::InvalidPath {
            path: PathBuf::from(path),
            message: "manifest path must not be empty".to_string(),
        });
    }
    if path.contains('\\') {
        return Err(CatalogError::InvalidPath {
            path: PathBuf::from(path),
            message: "manifest path must use '/' separators".to_string(),
        });
    }

    let p = PathBuf::from(path);
    if p.is_absolute() {
        return Err(CatalogError::InvalidPath {
            path: p,
            message: "manifest path must be relative".to_string(),
        });
    }
    if p.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(CatalogError::InvalidPath {
            path: p,
            message: "manifest path must not traverse out of the data directory".to_string(),
        });
    }
    Ok(p)
}
