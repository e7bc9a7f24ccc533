//! Translation of command-line flags into a [`FilterState`].

use overlay_core::FilterState;

use crate::cli::{ControlsArgs, OverlayToggles};

/// Family codes are upper-case two-letter codes; accept any case on input.
pub fn normalize_family(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Apply `--overlay` then `--disable` to a state.
pub fn apply_toggles(mut state: FilterState, toggles: &OverlayToggles) -> FilterState {
    if !toggles.only.is_empty() {
        state = state.with_only_overlays(toggles.only.iter().copied());
    }
    for kind in &toggles.disable {
        state.set_overlay_enabled(*kind, false);
    }
    state
}

pub fn filter_state(args: &ControlsArgs) -> FilterState {
    let state = FilterState::new()
        .with_query(args.query.clone().unwrap_or_default())
        .with_family(args.family.as_deref().map(normalize_family))
        .with_show_unselected(args.show_unselected);
    apply_toggles(state, &args.overlays)
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_model::OverlayKind;

    #[test]
    fn disable_wins_over_only() {
        let toggles = OverlayToggles {
            only: vec![OverlayKind::Cnssi1253, OverlayKind::FedrampPlus],
            disable: vec![OverlayKind::FedrampPlus],
        };
        let state = apply_toggles(FilterState::new(), &toggles);
        let enabled: Vec<OverlayKind> = state.enabled_overlays().collect();
        assert_eq!(enabled, [OverlayKind::Cnssi1253]);
    }

    #[test]
    fn no_toggles_keep_every_overlay() {
        let state = apply_toggles(FilterState::new(), &OverlayToggles::default());
        assert_eq!(state.enabled_overlays().count(), OverlayKind::ALL.len());
    }

    #[test]
    fn family_is_upper_cased() {
        assert_eq!(normalize_family(" ac "), "AC");
    }
}
