//! Shared Address Types for the collection-address wizard
//!
//! This crate is the SINGLE SOURCE OF TRUTH for the address record that crosses
//! from the wizard into the booking flow.
//!
//! ## Boundaries
//!
//! ```text
//! ┌──────────────────┐  AddressDraft  ┌──────────────────┐
//! │  AddressWizard   │ ─────────────► │  Booking flow    │
//! │  (search/map/…)  │                │  (host page)     │
//! └──────────────────┘                └──────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. JSON field names match the booking form (`pincode`, `addressType`)
//! 2. Category enums serialise lowercase
//! 3. Provider-specific wire shapes stay in the wizard crate; only the
//!    normalised candidate lives here

pub mod candidate;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use candidate::*;

// ============================================================================
// COORDINATES
// ============================================================================

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both components zero. The booking form seeds drafts this way before a
    /// location has been chosen.
    pub fn is_unset(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    /// Six-decimal "lat, lng" label shown when no street address is known yet.
    pub fn label(&self) -> String {
        format!("{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// ============================================================================
// ADDRESS DRAFT
// ============================================================================

/// Address category chosen on the details form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressCategory {
    #[default]
    Home,
    Office,
    Other,
}

impl AddressCategory {
    pub const ALL: [AddressCategory; 3] = [Self::Home, Self::Office, Self::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Office => "office",
            Self::Other => "other",
        }
    }

    /// Label shown on the category selector
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Office => "Office",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for AddressCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AddressCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(Self::Home),
            "office" => Ok(Self::Office),
            "other" => Ok(Self::Other),
            other => Err(format!(
                "unknown address type '{}', expected home, office or other",
                other
            )),
        }
    }
}

/// Required fields of a draft, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftField {
    Address,
    City,
    Pincode,
}

impl DraftField {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Address => "Complete Address",
            Self::City => "City",
            Self::Pincode => "Pincode",
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The working address record built up across the wizard.
///
/// Created from the booking form's current values, mutated by every wizard
/// interaction and handed back read-only on confirmation. Only a complete
/// draft (see [`AddressDraft::is_complete`]) is ever emitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AddressDraft {
    /// House/flat, building, street
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub landmark: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default, rename = "addressType")]
    pub address_type: AddressCategory,
}

impl AddressDraft {
    /// The draft's position, or `None` while it still holds the zero seed.
    pub fn coordinate(&self) -> Option<Coordinate> {
        let coordinate = Coordinate::new(self.latitude, self.longitude);
        (!coordinate.is_unset()).then_some(coordinate)
    }

    pub fn set_coordinate(&mut self, coordinate: Coordinate) {
        self.latitude = coordinate.latitude;
        self.longitude = coordinate.longitude;
    }

    /// Required fields that are still blank (whitespace counts as blank).
    pub fn missing_fields(&self) -> Vec<DraftField> {
        let mut missing = Vec::new();
        if self.address.trim().is_empty() {
            missing.push(DraftField::Address);
        }
        if self.city.trim().is_empty() {
            missing.push(DraftField::City);
        }
        if self.pincode.trim().is_empty() {
            missing.push(DraftField::Pincode);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// "City - Pincode" line used by the confirmed-address card.
    pub fn summary_line(&self) -> String {
        format!("{} - {}", self.city, self.pincode)
    }
}

// ============================================================================
// SAVED PRESETS
// ============================================================================

/// A saved address offered on the search step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAddressPreset {
    pub category: AddressCategory,
    pub label: String,
    pub full_label: String,
}
