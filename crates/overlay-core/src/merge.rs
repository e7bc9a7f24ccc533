//! Overlay merge resolution.
//!
//! Combines the base catalog with whichever overlays were loaded. A control
//! is selected by an overlay when that overlay has a well-formed entry under
//! the control's own id; enhancements never inherit from their parent.
//! Scalar fields supplied by several overlays resolve to the value from the
//! highest-precedence overlay, with the others kept as secondary values.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use overlay_model::{Control, ControlId, OverlayAnnotation, OverlayKind, OverlaySet, ScalarField};

/// A scalar value and the overlay that supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValue {
    pub overlay: OverlayKind,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedField {
    /// Value from the highest-precedence overlay that specifies the field.
    pub effective: FieldValue,
    /// Values from lower-precedence overlays, highest first.
    pub secondary: Vec<FieldValue>,
}

impl ResolvedField {
    pub fn has_conflict(&self) -> bool {
        self.secondary
            .iter()
            .any(|other| other.value != self.effective.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedAnnotation {
    fields: BTreeMap<ScalarField, ResolvedField>,
}

impl ResolvedAnnotation {
    fn resolve(annotations: &BTreeMap<OverlayKind, OverlayAnnotation>) -> Self {
        Self::resolve_where(annotations, |_| true)
    }

    /// Resolve using only the overlays `include` accepts.
    pub(crate) fn resolve_where(
        annotations: &BTreeMap<OverlayKind, OverlayAnnotation>,
        include: impl Fn(OverlayKind) -> bool,
    ) -> Self {
        let mut fields = BTreeMap::new();
        for field in ScalarField::ALL {
            let mut values = annotations
                .iter()
                .rev()
                .filter(|(kind, _)| include(**kind))
                .filter_map(|(kind, annotation)| {
                    annotation.scalar(field).map(|value| FieldValue {
                        overlay: *kind,
                        value: value.to_string(),
                    })
                });
            if let Some(effective) = values.next() {
                fields.insert(
                    field,
                    ResolvedField {
                        effective,
                        secondary: values.collect(),
                    },
                );
            }
        }
        Self { fields }
    }

    pub fn get(&self, field: ScalarField) -> Option<&ResolvedField> {
        self.fields.get(&field)
    }

    /// Effective value of a field.
    pub fn value(&self, field: ScalarField) -> Option<&str> {
        self.get(field).map(|f| f.effective.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScalarField, &ResolvedField)> {
        self.fields.iter().map(|(field, resolved)| (*field, resolved))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A catalog control with its overlay applicability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedControl {
    pub control: Control,
    /// Overlays selecting this control, in precedence order.
    pub annotations: BTreeMap<OverlayKind, OverlayAnnotation>,
    pub resolved: ResolvedAnnotation,
}

impl MergedControl {
    pub fn id(&self) -> &ControlId {
        &self.control.id
    }

    /// Overlays selecting this control, lowest precedence first.
    pub fn selected_by(&self) -> impl Iterator<Item = OverlayKind> + '_ {
        self.annotations.keys().copied()
    }

    pub fn is_selected_by(&self, kind: OverlayKind) -> bool {
        self.annotations.contains_key(&kind)
    }

    pub fn is_selected(&self) -> bool {
        !self.annotations.is_empty()
    }
}

/// Overlay entry that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum MergeNotice {
    /// Entry lacks the shape its overlay requires; skipped for this control only.
    MalformedEntry {
        overlay: OverlayKind,
        control_id: String,
        message: String,
    },
    /// Entry names a control that is not in the catalog.
    UnknownControl {
        overlay: OverlayKind,
        control_id: String,
    },
}

/// The merged dataset. Built once; views read it without mutating it.
#[derive(Debug, Clone, Default)]
pub struct MergedCatalog {
    controls: Vec<MergedControl>,
    index: BTreeMap<ControlId, usize>,
    loaded: BTreeSet<OverlayKind>,
    notices: Vec<MergeNotice>,
}

impl MergedCatalog {
    /// Controls in catalog order.
    pub fn controls(&self) -> &[MergedControl] {
        &self.controls
    }

    pub fn get(&self, id: &ControlId) -> Option<&MergedControl> {
        self.index.get(id).map(|&i| &self.controls[i])
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Overlays that took part in the merge.
    pub fn loaded_overlays(&self) -> &BTreeSet<OverlayKind> {
        &self.loaded
    }

    pub fn notices(&self) -> &[MergeNotice] {
        &self.notices
    }

    /// Family codes present in the catalog, alphabetically.
    pub fn families(&self) -> Vec<String> {
        let families: BTreeSet<&str> = self
            .controls
            .iter()
            .map(|c| c.control.family_code())
            .collect();
        families.into_iter().map(str::to_string).collect()
    }

    /// Number of controls each loaded overlay selects.
    pub fn selection_counts(&self) -> BTreeMap<OverlayKind, usize> {
        let mut counts: BTreeMap<OverlayKind, usize> =
            self.loaded.iter().map(|kind| (*kind, 0)).collect();
        for control in &self.controls {
            for kind in control.selected_by() {
                *counts.entry(kind).or_default() += 1;
            }
        }
        counts
    }

    /// Enhancements of a base control in enhancement order.
    pub fn enhancements_of(&self, base: &ControlId) -> Vec<&MergedControl> {
        let mut enhancements: Vec<&MergedControl> = self
            .controls
            .iter()
            .filter(|c| c.control.id.parent().as_ref() == Some(base))
            .collect();
        enhancements.sort_by(|a, b| a.id().cmp(b.id()));
        enhancements
    }
}

/// Merge the base catalog with the loaded overlays.
pub fn merge(catalog: &[Control], overlays: &OverlaySet) -> MergedCatalog {
    let mut index = BTreeMap::new();
    for (position, control) in catalog.iter().enumerate() {
        index.entry(control.id.clone()).or_insert(position);
    }

    let mut annotations: Vec<BTreeMap<OverlayKind, OverlayAnnotation>> =
        vec![BTreeMap::new(); catalog.len()];
    let mut notices = Vec::new();

    for (kind, entries) in overlays {
        let mut applied = 0usize;
        for (raw_id, value) in entries {
            let position = raw_id
                .parse::<ControlId>()
                .ok()
                .and_then(|id| index.get(&id).copied());
            let Some(position) = position else {
                debug!(overlay = kind.key(), control_id = %raw_id, "overlay entry for unknown control");
                notices.push(MergeNotice::UnknownControl {
                    overlay: *kind,
                    control_id: raw_id.clone(),
                });
                continue;
            };
            match OverlayAnnotation::from_value(*kind, value) {
                Ok(annotation) => {
                    annotations[position].insert(*kind, annotation);
                    applied += 1;
                }
                Err(error) => {
                    warn!(overlay = kind.key(), control_id = %raw_id, %error, "skipping malformed overlay entry");
                    notices.push(MergeNotice::MalformedEntry {
                        overlay: *kind,
                        control_id: raw_id.clone(),
                        message: error.to_string(),
                    });
                }
            }
        }
        info!(overlay = kind.key(), applied, entry_count = entries.len(), "overlay merged");
    }

    let controls = catalog
        .iter()
        .cloned()
        .zip(annotations)
        .map(|(control, annotations)| MergedControl {
            resolved: ResolvedAnnotation::resolve(&annotations),
            control,
            annotations,
        })
        .collect();

    MergedCatalog {
        controls,
        index,
        loaded: overlays.keys().copied().collect(),
        notices,
    }
}
