use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Raw overlay file contents: control id to the undecoded annotation record.
pub type RawOverlay = serde_json::Map<String, serde_json::Value>;

/// Overlays that were loaded, keyed by kind. Absent overlays have no entry.
pub type OverlaySet = BTreeMap<OverlayKind, RawOverlay>;

/// The four overlays layered on top of the base catalog.
///
/// Variants are declared in precedence order, so the derived `Ord` is the
/// precedence ranking: FedRAMP High is the lowest, FedRAMP+ the highest.
/// When overlays disagree on a field, the greater variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OverlayKind {
    #[serde(rename = "fedramp_high")]
    FedrampHigh,
    #[serde(rename = "cnssi_1253")]
    Cnssi1253,
    #[serde(rename = "classified_information")]
    ClassifiedInformation,
    #[serde(rename = "fedramp_plus")]
    FedrampPlus,
}

impl OverlayKind {
    /// All overlays, lowest precedence first.
    pub const ALL: [OverlayKind; 4] = [
        OverlayKind::FedrampHigh,
        OverlayKind::Cnssi1253,
        OverlayKind::ClassifiedInformation,
        OverlayKind::FedrampPlus,
    ];

    /// Stable key used in manifests, file names and JSON output.
    pub fn key(self) -> &'static str {
        match self {
            OverlayKind::FedrampHigh => "fedramp_high",
            OverlayKind::Cnssi1253 => "cnssi_1253",
            OverlayKind::ClassifiedInformation => "classified_information",
            OverlayKind::FedrampPlus => "fedramp_plus",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            OverlayKind::FedrampHigh => "FedRAMP High",
            OverlayKind::Cnssi1253 => "CNSSI 1253",
            OverlayKind::ClassifiedInformation => "Classified Information Overlay",
            OverlayKind::FedrampPlus => "FedRAMP+",
        }
    }

    /// Short label for badges in list views.
    pub fn badge(self) -> &'static str {
        match self {
            OverlayKind::FedrampHigh => "FRH",
            OverlayKind::Cnssi1253 => "CNSSI",
            OverlayKind::ClassifiedInformation => "CLASS",
            OverlayKind::FedrampPlus => "FR+",
        }
    }

    /// Default overlay file name in the data directory.
    pub fn default_file_name(self) -> String {
        format!("{}.json", self.key())
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for OverlayKind {
    type Err = ModelError;

    /// Accepts the stable key, the display name, or the badge label,
    /// ignoring case, spaces, dashes and underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "fedramphigh" | "frh" => Ok(OverlayKind::FedrampHigh),
            "cnssi1253" | "cnssi" => Ok(OverlayKind::Cnssi1253),
            "classifiedinformation" | "classifiedinformationoverlay" | "classified" | "class" => {
                Ok(OverlayKind::ClassifiedInformation)
            }
            "fedrampplus" | "fedramp+" | "fr+" => Ok(OverlayKind::FedrampPlus),
            _ => Err(ModelError::UnknownOverlay(s.trim().to_string())),
        }
    }
}
