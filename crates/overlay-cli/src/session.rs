//! Loading and merging a data directory for one command invocation.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use overlay_catalog::{Dataset, LoadNotice, LoadSummary, data_root};
use overlay_core::{MergeNotice, MergedCatalog, merge};

/// A merged catalog plus the load notices that must be surfaced to the user.
#[derive(Debug)]
pub struct Session {
    pub merged: MergedCatalog,
    pub summary: LoadSummary,
    pub notices: Vec<LoadNotice>,
}

impl Session {
    /// Resolve the data directory, load it and merge the overlays.
    ///
    /// Only catalog and manifest problems fail; unusable overlays become
    /// notices.
    pub fn open(data_dir: Option<&Path>) -> Result<Self> {
        let root = data_root(data_dir);
        let span = info_span!("session", data_dir = %root.display());
        let _guard = span.enter();

        let (dataset, summary) = Dataset::load(&root)
            .with_context(|| format!("load data directory {}", root.display()))?;
        let merged = merge(&dataset.catalog, &dataset.overlays);
        let malformed = merged
            .notices()
            .iter()
            .filter(|notice| matches!(notice, MergeNotice::MalformedEntry { .. }))
            .count();
        if malformed > 0 {
            warn!(malformed, "malformed overlay entries skipped");
        }
        info!(
            controls = merged.len(),
            overlays = merged.loaded_overlays().len(),
            "catalog merged"
        );
        Ok(Self {
            merged,
            summary,
            notices: dataset.notices,
        })
    }

    /// Notice lines for stderr, one per degraded overlay.
    pub fn notice_lines(&self) -> Vec<String> {
        self.notices
            .iter()
            .map(|notice| format!("notice: {notice}"))
            .collect()
    }
}
