//! Collection-address wizard for home sample booking.
//!
//! Resolves a free-text query, a map tap or a device location fix into a
//! structured postal address and hands it to the booking flow that hosts it.
//!
//! # Architecture
//!
//! ```text
//! search text ──► Debouncer ──► GeocodingProvider::search ──┐
//!                                                            │
//! map tap ──────► MapSession ─────────────────────────────┐  ▼
//!                                                          ├► AddressWizard ──► confirm handler
//! device fix ───► LocationSource ──► reverse geocode ─────┘   (search → map → details)
//! ```
//!
//! The map widget and the location sensor are host-provided resources behind
//! [`map::MapHost`] and [`geolocation::LocationSource`]; the geocoder is
//! [`geocode::GeocodingProvider`], with [`geocode::NominatimClient`] as the
//! production implementation.
//!
//! # Example
//!
//! ```ignore
//! use address_wizard::{AddressWizard, WizardDeps, WizardConfig};
//!
//! let mut wizard = AddressWizard::new(initial, deps, &config)
//!     .with_confirm_handler(|draft| booking.set_address(draft.clone()));
//!
//! wizard.set_query("MG Road")?;
//! wizard.settle_search().await;
//! wizard.select_candidate(0)?;
//! wizard.confirm()?;
//! ```

pub mod config;
pub mod debounce;
pub mod error;
pub mod geocode;
pub mod geolocation;
pub mod map;
pub mod presets;
pub mod wizard;

pub use address_wizard_types::*;
pub use config::{ConfigLoader, WizardConfig};
pub use debounce::{Debouncer, RequestSequencer, RequestTicket};
pub use error::{
    AddressWizardError, ConfigError, GeocodeError, GeolocationError, MapError, WizardError,
};
pub use geocode::{GeocodingProvider, NominatimClient, SearchOutcome, SearchParams};
pub use geolocation::{FixedLocation, LocationSource, PositionOptions};
pub use map::{MapHost, MapSession, MapStyle, MapSurface, MapViewport};
pub use wizard::{AddressWizard, WizardDeps, WizardNotice, WizardStep, WizardView};

/// Quiet period after the last keystroke before a search is sent (milliseconds).
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Shortest query that is sent to the provider.
pub const MIN_QUERY_CHARS: usize = 3;

/// Maximum candidates requested per search.
pub const DEFAULT_RESULT_LIMIT: usize = 5;

/// Device location request timeout (milliseconds).
pub const GEOLOCATION_TIMEOUT_MS: u64 = 10_000;

/// Map centre before any location is known (geographic centre of India).
pub const DEFAULT_CENTER: Coordinate = Coordinate {
    latitude: 20.5937,
    longitude: 78.9629,
};

/// Zoom used before any location is known.
pub const DEFAULT_ZOOM: f64 = 4.0;

/// Zoom used once a location has been chosen.
pub const LOCATED_ZOOM: f64 = 17.0;

pub const MAX_ZOOM: f64 = 18.0;
