#![deny(unsafe_code)]

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use overlay_model::{Control, OverlayKind, OverlaySet};

use crate::error::CatalogError;
use crate::loader::{load_catalog, load_overlay};
use crate::manifest::{DataManifest, ManifestSource, resolve_manifest};

/// Non-fatal problem found while loading overlays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum LoadNotice {
    /// Overlay file listed but not present on disk.
    MissingOverlay { kind: OverlayKind, path: PathBuf },
    /// Overlay file present but unreadable, unparsable, or failing its pin.
    UnreadableOverlay {
        kind: OverlayKind,
        path: PathBuf,
        message: String,
    },
}

impl LoadNotice {
    pub fn kind(&self) -> OverlayKind {
        match self {
            LoadNotice::MissingOverlay { kind, .. } | LoadNotice::UnreadableOverlay { kind, .. } => {
                *kind
            }
        }
    }
}

impl fmt::Display for LoadNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadNotice::MissingOverlay { kind, path } => write!(
                f,
                "{kind} overlay not available ({} not found); treating it as empty",
                path.display()
            ),
            LoadNotice::UnreadableOverlay {
                kind,
                path,
                message,
            } => write!(
                f,
                "{kind} overlay could not be loaded from {}: {message}; treating it as empty",
                path.display()
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OverlayStatus {
    pub kind: OverlayKind,
    pub path: PathBuf,
    pub loaded: bool,
    pub entry_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub data_dir: PathBuf,
    pub manifest_source: ManifestSource,
    pub catalog_path: PathBuf,
    pub control_count: usize,
    pub base_control_count: usize,
    pub enhancement_count: usize,
    pub family_count: usize,
    pub overlays: Vec<OverlayStatus>,
    pub notice_count: usize,
}

/// Everything read from a data directory, before merging.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub data_dir: PathBuf,
    pub manifest: DataManifest,
    pub catalog: Vec<Control>,
    pub overlays: OverlaySet,
    pub notices: Vec<LoadNotice>,
}

impl Dataset {
    /// Load the catalog and every configured overlay.
    ///
    /// Catalog failures are returned as errors. Overlay failures only
    /// produce a [`LoadNotice`] and leave that overlay out of the set.
    pub fn load(data_dir: &Path) -> Result<(Self, LoadSummary), CatalogError> {
        let (manifest, manifest_source) = resolve_manifest(data_dir)?;

        let catalog_path = data_dir.join(&manifest.catalog.path);
        let catalog = load_catalog(&catalog_path, manifest.catalog.sha256.as_deref())?;
        info!(
            path = %catalog_path.display(),
            control_count = catalog.len(),
            "catalog loaded"
        );

        let mut overlays = OverlaySet::new();
        let mut notices = Vec::new();
        let mut statuses = Vec::new();
        for kind in OverlayKind::ALL {
            let Some(file) = manifest.overlay(kind) else {
                debug!(overlay = kind.key(), "overlay not configured");
                continue;
            };
            let path = data_dir.join(&file.path);
            let outcome = if path.is_file() {
                load_overlay(&path, file.sha256.as_deref()).map_err(|e| {
                    LoadNotice::UnreadableOverlay {
                        kind,
                        path: path.clone(),
                        message: e.to_string(),
                    }
                })
            } else {
                Err(LoadNotice::MissingOverlay {
                    kind,
                    path: path.clone(),
                })
            };
            match outcome {
                Ok(entries) => {
                    info!(
                        overlay = kind.key(),
                        path = %path.display(),
                        entry_count = entries.len(),
                        "overlay loaded"
                    );
                    statuses.push(OverlayStatus {
                        kind,
                        path,
                        loaded: true,
                        entry_count: entries.len(),
                    });
                    overlays.insert(kind, entries);
                }
                Err(notice) => {
                    warn!(overlay = kind.key(), "{notice}");
                    statuses.push(OverlayStatus {
                        kind,
                        path,
                        loaded: false,
                        entry_count: 0,
                    });
                    notices.push(notice);
                }
            }
        }

        let enhancement_count = catalog.iter().filter(|c| c.is_enhancement).count();
        let families: BTreeSet<&str> = catalog.iter().map(Control::family_code).collect();
        let summary = LoadSummary {
            data_dir: data_dir.to_path_buf(),
            manifest_source,
            catalog_path,
            control_count: catalog.len(),
            base_control_count: catalog.len() - enhancement_count,
            enhancement_count,
            family_count: families.len(),
            overlays: statuses,
            notice_count: notices.len(),
        };

        Ok((
            Self {
                data_dir: data_dir.to_path_buf(),
                manifest,
                catalog,
                overlays,
                notices,
            },
            summary,
        ))
    }
}
