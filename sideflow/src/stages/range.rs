//! Percentage sub-ranges used to fold fine-grained progress into a stage.

use crate::errors::TaskError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An inclusive percentage window `[from, to]` inside a parent task's progress.
///
/// Sub-progress reported by a stage (or the whole progress of a child task)
/// is mapped linearly into this window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawProgressRange")]
pub struct ProgressRange {
    from: u8,
    to: u8,
}

/// Unvalidated wire form of a [`ProgressRange`].
#[derive(Deserialize)]
struct RawProgressRange {
    from: u8,
    to: u8,
}

impl TryFrom<RawProgressRange> for ProgressRange {
    type Error = TaskError;

    fn try_from(raw: RawProgressRange) -> Result<Self, Self::Error> {
        Self::new(raw.from, raw.to)
    }
}

impl ProgressRange {
    /// Creates a range, rejecting windows that are reversed or exceed 100.
    pub fn new(from: u8, to: u8) -> Result<Self, TaskError> {
        if to > 100 || from > to {
            return Err(TaskError::invalid_stages(format!(
                "progress range {from}..{to} must satisfy from <= to <= 100"
            )));
        }
        Ok(Self { from, to })
    }

    /// Builds a range from bounds already known to be ordered.
    pub(crate) const fn unchecked(from: u8, to: u8) -> Self {
        Self { from, to }
    }

    /// Returns the lower bound.
    #[must_use]
    pub const fn from(&self) -> u8 {
        self.from
    }

    /// Returns the upper bound.
    #[must_use]
    pub const fn to(&self) -> u8 {
        self.to
    }

    /// Maps a 0..=100 child value into the window, truncating.
    #[must_use]
    pub fn map(&self, child: u8) -> u8 {
        let child = u32::from(child.min(100));
        let span = u32::from(self.to.saturating_sub(self.from));
        // bounded by `to`, so the narrowing cannot truncate
        (u32::from(self.from) + child * span / 100) as u8
    }
}

impl fmt::Display for ProgressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_rejects_reversed_bounds() {
        assert!(ProgressRange::new(50, 10).is_err());
        assert!(ProgressRange::new(0, 101).is_err());
        assert!(ProgressRange::new(7, 7).is_ok());
    }

    #[test]
    fn test_range_deserialize_validates_bounds() {
        let range: ProgressRange = serde_json::from_str(r#"{"from":3,"to":83}"#).unwrap();
        assert_eq!(range, ProgressRange::new(3, 83).unwrap());

        let reversed = serde_json::from_str::<ProgressRange>(r#"{"from":50,"to":10}"#);
        assert!(reversed.unwrap_err().to_string().contains("50..10"));
        assert!(serde_json::from_str::<ProgressRange>(r#"{"from":0,"to":120}"#).is_err());
    }

    #[test]
    fn test_range_map_endpoints() {
        let range = ProgressRange::new(3, 83).unwrap();
        assert_eq!(range.map(0), 3);
        assert_eq!(range.map(100), 83);
        assert_eq!(range.map(50), 43);
    }

    #[test]
    fn test_range_map_truncates() {
        let range = ProgressRange::new(96, 100).unwrap();
        assert_eq!(range.map(10), 96);
        assert_eq!(range.map(25), 97);
        assert_eq!(range.map(255), 100);
    }
}
