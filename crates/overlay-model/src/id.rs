//! NIST SP 800-53 control identifiers.
//!
//! Base controls look like `AC-2`, enhancements like `AC-2(1)`. The derived
//! ordering is the natural catalog order: family code, then base number,
//! then the base control ahead of its enhancements in enhancement order.
//! Plain string ordering would put `AC-10` before `AC-2`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ControlId {
    family: String,
    base: u32,
    enhancement: Option<u32>,
}

impl ControlId {
    pub fn base_control(family: &str, base: u32) -> Result<Self, ModelError> {
        format!("{family}-{base}").parse()
    }

    /// Two-letter family code, e.g. `AC`.
    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn base_number(&self) -> u32 {
        self.base
    }

    pub fn enhancement_number(&self) -> Option<u32> {
        self.enhancement
    }

    pub fn is_enhancement(&self) -> bool {
        self.enhancement.is_some()
    }

    /// The base control an enhancement refines; `None` for base controls.
    pub fn parent(&self) -> Option<ControlId> {
        self.enhancement.map(|_| ControlId {
            family: self.family.clone(),
            base: self.base,
            enhancement: None,
        })
    }

    /// Base control id for this id (itself when already a base control).
    pub fn base_id(&self) -> ControlId {
        ControlId {
            family: self.family.clone(),
            base: self.base,
            enhancement: None,
        }
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.enhancement {
            Some(enhancement) => write!(f, "{}-{}({})", self.family, self.base, enhancement),
            None => write!(f, "{}-{}", self.family, self.base),
        }
    }
}

impl FromStr for ControlId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = |reason| ModelError::InvalidControlId {
            id: raw.to_string(),
            reason,
        };

        let (family, rest) = raw.split_once('-').ok_or_else(|| invalid("missing '-'"))?;
        if family.len() != 2 || !family.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(invalid("family must be two uppercase letters"));
        }

        let (base_digits, enhancement) = match rest.split_once('(') {
            Some((base, tail)) => {
                let digits = tail
                    .strip_suffix(')')
                    .ok_or_else(|| invalid("unterminated enhancement"))?;
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid("enhancement must be numeric"));
                }
                let number = digits
                    .parse::<u32>()
                    .map_err(|_| invalid("enhancement out of range"))?;
                (base, Some(number))
            }
            None => (rest, None),
        };

        if base_digits.is_empty()
            || base_digits.len() > 2
            || !base_digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("base number must be one or two digits"));
        }
        let base = base_digits
            .parse::<u32>()
            .map_err(|_| invalid("base number out of range"))?;

        Ok(Self {
            family: family.to_string(),
            base,
            enhancement,
        })
    }
}

impl TryFrom<String> for ControlId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ControlId> for String {
    fn from(value: ControlId) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> ControlId {
        raw.parse().expect("valid control id")
    }

    #[test]
    fn parses_base_and_enhancement() {
        let base = id("AC-2");
        assert_eq!(base.family(), "AC");
        assert_eq!(base.base_number(), 2);
        assert!(!base.is_enhancement());
        assert_eq!(base.parent(), None);

        let enhancement = id("SC-18(12)");
        assert_eq!(enhancement.enhancement_number(), Some(12));
        assert_eq!(enhancement.parent(), Some(id("SC-18")));
        assert_eq!(enhancement.to_string(), "SC-18(12)");
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in ["", "AC2", "ac-2", "ACX-2", "AC-", "AC-100", "AC-2(", "AC-2()", "AC-2(a)"] {
            assert!(raw.parse::<ControlId>().is_err(), "{raw} should not parse");
        }
    }

    #[test]
    fn natural_order_is_not_lexical() {
        let mut ids = vec![id("AC-10"), id("AC-2(2)"), id("AC-3"), id("AC-2(1)"), id("AC-2")];
        ids.sort();
        let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["AC-2", "AC-2(1)", "AC-2(2)", "AC-3", "AC-10"]);
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&id("AU-6(3)")).expect("serialize");
        assert_eq!(json, "\"AU-6(3)\"");
        let back: ControlId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id("AU-6(3)"));
        assert!(serde_json::from_str::<ControlId>("\"bogus\"").is_err());
    }
}
