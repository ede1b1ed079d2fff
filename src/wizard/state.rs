//! Wizard steps and UI status flags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three wizard screens.
///
/// ```text
///            add new / located             confirm
///   Search ───────────────────────► Map ───────────► Details
///     │  ◄─────────── back ───────── ▲ ◄── change ───── │
///     │                                                  ▲
///     └──────── candidate / saved preset ────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    #[default]
    Search,
    Map,
    Details,
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Search => "search",
            Self::Map => "map",
            Self::Details => "details",
        })
    }
}

/// Something the user should be told about the last lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardNotice {
    /// Search ran and matched nothing
    NoResults,
    /// Search request failed
    SearchFailed { reason: String },
    /// Device location could not be determined
    LocationFailed { reason: String },
}

impl WizardNotice {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoResults => "No matching addresses found",
            Self::SearchFailed { .. } => "We couldn't find that address, try again",
            Self::LocationFailed { .. } => {
                "We couldn't get your current location, search or pick on the map instead"
            }
        }
    }
}

impl fmt::Display for WizardNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
