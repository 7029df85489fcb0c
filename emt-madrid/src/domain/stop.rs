//! Stop identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid stop identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop id: {reason}")]
pub struct InvalidStopId {
    reason: &'static str,
}

/// A numeric EMT stop identifier.
///
/// Stop ids are positive integers printed on the stop's pole (e.g. `72` for
/// Cibeles-Casa de América). This type guarantees the value is non-zero.
///
/// # Examples
///
/// ```
/// use emt_madrid::domain::StopId;
///
/// let cibeles = StopId::parse("72").unwrap();
/// assert_eq!(cibeles.get(), 72);
///
/// assert!(StopId::parse("0").is_err());
/// assert!(StopId::parse("-3").is_err());
/// assert!(StopId::parse("abc").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct StopId(u32);

impl StopId {
    /// Create a stop id from a raw number. Zero is rejected.
    pub fn new(id: u32) -> Result<Self, InvalidStopId> {
        if id == 0 {
            return Err(InvalidStopId {
                reason: "must be a positive integer",
            });
        }
        Ok(StopId(id))
    }

    /// Parse a stop id from its decimal representation.
    pub fn parse(s: &str) -> Result<Self, InvalidStopId> {
        let id = s.trim().parse::<u32>().map_err(|_| InvalidStopId {
            reason: "must be a decimal number",
        })?;
        Self::new(id)
    }

    /// Returns the raw numeric id.
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for StopId {
    type Error = InvalidStopId;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        StopId::new(id)
    }
}

impl From<StopId> for u32 {
    fn from(id: StopId) -> Self {
        id.0
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_valid_ids() {
        assert_eq!(StopId::parse("72").unwrap().get(), 72);
        assert_eq!(StopId::parse("  5710 ").unwrap().get(), 5710);
        assert_eq!(StopId::parse("1").unwrap().get(), 1);
    }

    #[test]
    fn reject_zero_and_garbage() {
        assert!(StopId::parse("0").is_err());
        assert!(StopId::parse("").is_err());
        assert!(StopId::parse("-1").is_err());
        assert!(StopId::parse("7 2").is_err());
        assert!(StopId::parse("N26").is_err());
    }

    #[test]
    fn deserialize_rejects_zero() {
        let ok: StopId = serde_json::from_str("72").unwrap();
        assert_eq!(ok.get(), 72);
        assert!(serde_json::from_str::<StopId>("0").is_err());
        assert!(serde_json::from_str::<StopId>("\"72\"").is_err());
    }

    #[test]
    fn display_and_debug() {
        let id = StopId::new(72).unwrap();
        assert_eq!(id.to_string(), "72");
        assert_eq!(format!("{:?}", id), "StopId(72)");
    }

    proptest! {
        #[test]
        fn positive_ids_roundtrip_through_display(n in 1u32..) {
            let id = StopId::new(n).unwrap();
            prop_assert_eq!(StopId::parse(&id.to_string()).unwrap(), id);
        }
    }
}
