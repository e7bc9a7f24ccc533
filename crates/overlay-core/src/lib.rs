//! Overlay merge resolution and the control filter/search view.

pub mod compare;
pub mod merge;
pub mod view;

pub use compare::{OverlayComparison, compare_overlays};
pub use merge::{
    FieldValue, MergeNotice, MergedCatalog, MergedControl, ResolvedAnnotation, ResolvedField,
    merge,
};
pub use view::{
    FamilyStats, FilterState, ViewSummary, family_stats, filter_controls, is_visible, summarize,
    visible_badges, visible_resolved,
};
