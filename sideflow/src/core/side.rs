//! Side identities and side selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which variant of a task family a side unit executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideId {
    /// The client build.
    Client = 0,
    /// The dedicated server build.
    Server = 1,
    /// Client and server merged into one tree.
    Merged = 2,
}

impl SideId {
    /// Sides launched when a run selects every applicable side, in launch order.
    pub const SCHEDULED: [Self; 2] = [Self::Client, Self::Server];

    /// Returns the numeric identifier of the side.
    #[must_use]
    pub const fn index(self) -> i32 {
        self as i32
    }

    /// Looks a side up by its numeric identifier.
    #[must_use]
    pub const fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::Client),
            1 => Some(Self::Server),
            2 => Some(Self::Merged),
            _ => None,
        }
    }

    /// Returns the display label used in progress views.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Client => "Client",
            Self::Server => "Server",
            Self::Merged => "Merged",
        }
    }
}

impl fmt::Display for SideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Server => write!(f, "server"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

impl FromStr for SideId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(Self::Client),
            "server" => Ok(Self::Server),
            "merged" => Ok(Self::Merged),
            other => Err(format!("unknown side '{other}'")),
        }
    }
}

/// Selects which sides a multi-sided run launches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideFilter {
    /// Every applicable side ([`SideId::SCHEDULED`]).
    #[default]
    All,
    /// Exactly one named side.
    Only(SideId),
}

impl SideFilter {
    /// Builds a filter from a raw side index, where any negative value selects all sides.
    #[must_use]
    pub const fn from_index(index: i32) -> Option<Self> {
        if index < 0 {
            return Some(Self::All);
        }
        match SideId::from_index(index) {
            Some(side) => Some(Self::Only(side)),
            None => None,
        }
    }

    /// Returns true if the filter selects the given side.
    #[must_use]
    pub fn selects(&self, side: SideId) -> bool {
        match self {
            Self::All => SideId::SCHEDULED.contains(&side),
            Self::Only(only) => *only == side,
        }
    }

    /// Returns the selected sides in launch order.
    #[must_use]
    pub fn selected_sides(&self) -> Vec<SideId> {
        match self {
            Self::All => SideId::SCHEDULED.to_vec(),
            Self::Only(side) => vec![*side],
        }
    }
}

impl fmt::Display for SideFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Only(side) => write!(f, "{side}"),
        }
    }
}

impl FromStr for SideFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "both" | "" => Ok(Self::All),
            other => other.parse::<SideId>().map(Self::Only),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_index_roundtrip() {
        for side in [SideId::Client, SideId::Server, SideId::Merged] {
            assert_eq!(SideId::from_index(side.index()), Some(side));
        }
        assert_eq!(SideId::from_index(7), None);
    }

    #[test]
    fn test_side_display_and_label() {
        assert_eq!(SideId::Client.to_string(), "client");
        assert_eq!(SideId::Server.label(), "Server");
    }

    #[test]
    fn test_side_parse() {
        assert_eq!("SERVER".parse::<SideId>(), Ok(SideId::Server));
        assert!("proxy".parse::<SideId>().is_err());
    }

    #[test]
    fn test_filter_all_orders_client_first() {
        assert_eq!(SideFilter::All.selected_sides(), vec![SideId::Client, SideId::Server]);
        assert!(SideFilter::All.selects(SideId::Server));
        assert!(!SideFilter::All.selects(SideId::Merged));
    }

    #[test]
    fn test_filter_only() {
        let filter = SideFilter::Only(SideId::Server);
        assert_eq!(filter.selected_sides(), vec![SideId::Server]);
        assert!(!filter.selects(SideId::Client));
    }

    #[test]
    fn test_filter_from_index_sentinel() {
        assert_eq!(SideFilter::from_index(-1), Some(SideFilter::All));
        assert_eq!(SideFilter::from_index(0), Some(SideFilter::Only(SideId::Client)));
        assert_eq!(SideFilter::from_index(9), None);
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("both".parse::<SideFilter>(), Ok(SideFilter::All));
        assert_eq!("client".parse::<SideFilter>(), Ok(SideFilter::Only(SideId::Client)));
    }

    #[test]
    fn test_filter_serialize() {
        let json = serde_json::to_string(&SideFilter::Only(SideId::Merged)).unwrap();
        assert_eq!(json, r#"{"only":"merged"}"#);
    }
}
