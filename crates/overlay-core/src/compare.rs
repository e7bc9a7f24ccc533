//! Comparison of two revisions of the same overlay file.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

use overlay_model::{CiaSelections, ControlId, OverlayKind, RawOverlay};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageEntry {
    pub control_id: String,
    pub name: Option<String>,
    /// Ids in the other revision sharing this entry's base control.
    pub possible_matches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deselection {
    pub control_id: String,
    /// The new revision still lists the control but marks it withdrawn.
    pub withdrawn: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldCounts {
    pub justification: usize,
    pub parameter_value: usize,
    pub guidance: usize,
    pub references: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub low: usize,
    pub moderate: usize,
    pub high: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlayComparison {
    pub overlay: OverlayKind,
    pub old_entries: usize,
    pub new_entries: usize,
    pub in_both: usize,
    pub only_old: Vec<CoverageEntry>,
    pub only_new: Vec<CoverageEntry>,
    pub old_selected: usize,
    pub new_selected: usize,
    pub deselected: Vec<Deselection>,
    pub newly_selected: Vec<String>,
    /// Populated fields in the new revision.
    pub new_field_counts: FieldCounts,
    /// Selected controls per CIA objective and level (CNSSI 1253 only).
    pub cia_levels: Option<BTreeMap<String, LevelCounts>>,
}

impl OverlayComparison {
    pub fn net_change(&self) -> i64 {
        self.new_selected as i64 - self.old_selected as i64
    }
}

/// Natural control order, with unparsable ids after all valid ones.
fn sort_ids(ids: &mut [String]) {
    ids.sort_by_cached_key(|raw| {
        let parsed = raw.parse::<ControlId>().ok();
        (parsed.is_none(), parsed, raw.clone())
    });
}

/// Base control an id belongs to; ids that do not parse fall back to the
/// text before any `(`.
fn base_key(raw: &str) -> String {
    match raw.parse::<ControlId>() {
        Ok(id) => id.base_id().to_string(),
        Err(_) => raw.split_once('(').map_or(raw, |(base, _)| base).trim().to_string(),
    }
}

fn entry_name(value: &Value) -> Option<String> {
    ["name", "title"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn populated(value: &Value, key: &str) -> bool {
    value
        .get(key)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty())
}

/// Whether a raw entry counts as selected for revision comparison.
///
/// An explicit `selected: false` or `withdrawn: true` deselects. When the
/// entry carries CIA selections, at least one level must be marked.
fn entry_selected(value: &Value) -> bool {
    if !value.is_object() {
        return false;
    }
    if value.get("selected").and_then(Value::as_bool) == Some(false) {
        return false;
    }
    if value.get("withdrawn").and_then(Value::as_bool) == Some(true) {
        return false;
    }
    match value.get("selections") {
        Some(selections) => serde_json::from_value::<CiaSelections>(selections.clone())
            .map(|s| s.any())
            .unwrap_or(false),
        None => true,
    }
}

fn coverage(only: &BTreeSet<&String>, entries: &RawOverlay, other: &RawOverlay) -> Vec<CoverageEntry> {
    let mut ids: Vec<String> = only.iter().map(|id| (*id).clone()).collect();
    sort_ids(&mut ids);
    ids.into_iter()
        .map(|control_id| {
            let base = base_key(&control_id);
            let mut possible_matches: Vec<String> = other
                .keys()
                .filter(|candidate| base_key(candidate) == base)
                .cloned()
                .collect();
            sort_ids(&mut possible_matches);
            CoverageEntry {
                name: entries.get(&control_id).and_then(entry_name),
                control_id,
                possible_matches,
            }
        })
        .collect()
}

fn cia_levels(entries: &RawOverlay) -> BTreeMap<String, LevelCounts> {
    let mut levels: BTreeMap<String, LevelCounts> = BTreeMap::new();
    for value in entries.values().filter(|v| entry_selected(v)) {
        let Some(selections) = value
            .get("selections")
            .and_then(|s| serde_json::from_value::<CiaSelections>(s.clone()).ok())
        else {
            continue;
        };
        for (objective, marks) in selections.objectives() {
            let counts = levels.entry(objective.to_string()).or_default();
            counts.low += usize::from(marks.low);
            counts.moderate += usize::from(marks.moderate);
            counts.high += usize::from(marks.high);
        }
    }
    levels
}

/// Compare an old and a new revision of one overlay.
pub fn compare_overlays(kind: OverlayKind, old: &RawOverlay, new: &RawOverlay) -> OverlayComparison {
    let old_ids: BTreeSet<&String> = old.keys().collect();
    let new_ids: BTreeSet<&String> = new.keys().collect();
    let only_old_ids: BTreeSet<&String> = old_ids.difference(&new_ids).copied().collect();
    let only_new_ids: BTreeSet<&String> = new_ids.difference(&old_ids).copied().collect();

    let old_selected: BTreeSet<&String> = old
        .iter()
        .filter(|(_, value)| entry_selected(value))
        .map(|(id, _)| id)
        .collect();
    let new_selected: BTreeSet<&String> = new
        .iter()
        .filter(|(_, value)| entry_selected(value))
        .map(|(id, _)| id)
        .collect();

    let mut deselected_ids: Vec<String> = old_selected
        .difference(&new_selected)
        .map(|id| (*id).clone())
        .collect();
    sort_ids(&mut deselected_ids);
    let deselected = deselected_ids
        .into_iter()
        .map(|control_id| Deselection {
            withdrawn: new
                .get(&control_id)
                .and_then(|v| v.get("withdrawn"))
                .and_then(Value::as_bool)
                .unwrap_or(false),
            control_id,
        })
        .collect();

    let mut newly_selected: Vec<String> = new_selected
        .difference(&old_selected)
        .map(|id| (*id).clone())
        .collect();
    sort_ids(&mut newly_selected);

    let mut new_field_counts = FieldCounts::default();
    for value in new.values() {
        new_field_counts.justification += usize::from(populated(value, "justification"));
        new_field_counts.parameter_value += usize::from(populated(value, "parameter_value"));
        new_field_counts.guidance += usize::from(populated(value, "guidance"));
        new_field_counts.references += usize::from(populated(value, "references"));
    }

    OverlayComparison {
        overlay: kind,
        old_entries: old.len(),
        new_entries: new.len(),
        in_both: old_ids.intersection(&new_ids).count(),
        only_old: coverage(&only_old_ids, old, new),
        only_new: coverage(&only_new_ids, new, old),
        old_selected: old_selected.len(),
        new_selected: new_selected.len(),
        deselected,
        newly_selected,
        new_field_counts,
        cia_levels: (kind == OverlayKind::Cnssi1253).then(|| cia_levels(new)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawOverlay {
        value.as_object().cloned().unwrap()
    }

    fn cia(confidentiality_high: bool) -> Value {
        json!({
            "confidentiality": {"low": false, "moderate": false, "high": confidentiality_high},
            "integrity": {"low": true, "moderate": false, "high": false},
            "availability": {"low": false, "moderate": false, "high": false}
        })
    }

    #[test]
    fn reports_selection_changes_and_withdrawals() {
        let old = raw(json!({
            "AC-2": {"selected": true, "control_text": ""},
            "AC-9": {"selected": true},
            "SC-18(2)": {"selected": true},
            "PT-1": {"selected": true}
        }));
        let new = raw(json!({
            "AC-2": {"selected": true, "selections": cia(true), "parameter_value": "30 days"},
            "AC-9": {"selected": false, "withdrawn": true, "selections": cia(false)},
            "SC-18(3)": {"selected": true, "selections": cia(false)},
            "PT-1": {"selected": false, "selections": cia(false)}
        }));

        let comparison = compare_overlays(OverlayKind::Cnssi1253, &old, &new);
        assert_eq!(comparison.in_both, 3);
        assert_eq!(comparison.old_selected, 4);
        assert_eq!(comparison.new_selected, 2);
        assert_eq!(comparison.net_change(), -2);
        assert_eq!(
            comparison.deselected,
            [
                Deselection {
                    control_id: "AC-9".to_string(),
                    withdrawn: true
                },
                Deselection {
                    control_id: "PT-1".to_string(),
                    withdrawn: false
                },
                Deselection {
                    control_id: "SC-18(2)".to_string(),
                    withdrawn: false
                },
            ]
        );
        assert_eq!(comparison.newly_selected, ["SC-18(3)"]);
        assert_eq!(comparison.only_old[0].possible_matches, ["SC-18(3)"]);
        assert_eq!(comparison.new_field_counts.parameter_value, 1);

        let levels = comparison.cia_levels.unwrap();
        assert_eq!(levels["confidentiality"].high, 1);
        assert_eq!(levels["integrity"].low, 2);
    }

    #[test]
    fn entries_without_selections_follow_their_flag() {
        assert!(entry_selected(&json!({"justification": "x"})));
        assert!(!entry_selected(&json!({"selected": false})));
        assert!(!entry_selected(&json!("AC-1")));
        assert!(!entry_selected(&json!({"selections": cia(false), "withdrawn": true})));
    }

    #[test]
    fn base_key_groups_enhancements_with_their_base() {
        assert_eq!(base_key("AC-2(4)"), "AC-2");
        assert_eq!(base_key("AC-02"), "AC-2");
        assert_eq!(base_key("SC-7"), "SC-7");
        assert_eq!(base_key("xx-1(2)"), "xx-1");
    }

    #[test]
    fn ids_sort_naturally() {
        let mut ids = vec![
            "AC-10".to_string(),
            "junk".to_string(),
            "AC-2(1)".to_string(),
            "AC-2".to_string(),
        ];
        sort_ids(&mut ids);
        assert_eq!(ids, ["AC-2", "AC-2(1)", "AC-10", "junk"]);
    }
}
