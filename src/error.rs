//! Error handling for the address wizard
//!
//! One `thiserror` enum per concern. None of these is fatal to the wizard:
//! provider and location failures are logged and folded into notices, and
//! only caller mistakes (wrong step, incomplete draft) surface as
//! [`WizardError`].

use std::time::Duration;

use address_wizard_types::DraftField;
use thiserror::Error;

use crate::wizard::WizardStep;

/// Top-level error for callers that drive the whole crate
#[derive(Error, Debug)]
pub enum AddressWizardError {
    #[error("Geocoding error: {0}")]
    Geocode(#[from] GeocodeError),

    #[error("Geolocation error: {0}")]
    Geolocation(#[from] GeolocationError),

    #[error("Map error: {0}")]
    Map(#[from] MapError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Search / reverse-geocode provider failures
#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to decode provider response: {message}")]
    Decode { message: String },

    #[error("No address found: {message}")]
    NotFound { message: String },

    #[error("Candidate {id} has an invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate { id: u64, lat: String, lon: String },

    #[error("Provider error: {message}")]
    Provider { message: String },
}

/// Device location failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeolocationError {
    #[error("Geolocation is not available on this device")]
    Unavailable,

    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("Timed out after {0:?} waiting for a position fix")]
    Timeout(Duration),
}

/// Map widget failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error("Failed to mount map: {message}")]
    Mount { message: String },
}

/// Caller errors from driving the wizard
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WizardError {
    #[error("Cannot {action} while on the {from} step")]
    InvalidTransition {
        from: WizardStep,
        action: &'static str,
    },

    #[error("No search candidate at position {0}")]
    NoSuchCandidate(usize),

    #[error("No saved address at position {0}")]
    NoSuchPreset(usize),

    #[error("No location selected on the map")]
    NoLocationSelected,

    #[error("Address is incomplete, missing: {}", format_fields(.missing))]
    Incomplete { missing: Vec<DraftField> },
}

fn format_fields(fields: &[DraftField]) -> String {
    fields
        .iter()
        .map(|f| f.display_name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Configuration loading and validation failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_lists_missing_fields() {
        let err = WizardError::Incomplete {
            missing: vec![DraftField::City, DraftField::Pincode],
        };
        assert_eq!(
            err.to_string(),
            "Address is incomplete, missing: City, Pincode"
        );
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = WizardError::InvalidTransition {
            from: WizardStep::Details,
            action: "confirm the map location",
        };
        assert_eq!(
            err.to_string(),
            "Cannot confirm the map location while on the details step"
        );
    }

    #[test]
    fn test_wizard_error_converts_to_top_level() {
        let err: AddressWizardError = WizardError::NoLocationSelected.into();
        assert!(matches!(err, AddressWizardError::Wizard(_)));
    }
}
