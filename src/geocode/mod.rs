//! Geocoding provider integration
//!
//! This module provides:
//! - The [`GeocodingProvider`] contract used by the wizard (text search + reverse lookup)
//! - Wire types for the Nominatim API
//! - [`NominatimClient`], the HTTP implementation
//! - [`SearchOutcome`], the reported result of a search

pub mod client;
pub mod types;

use address_wizard_types::{Coordinate, ReverseGeocode, SearchCandidate};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::GeocodeError;
use crate::DEFAULT_RESULT_LIMIT;

pub use client::NominatimClient;
pub use types::*;

/// Filters applied to every text search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Comma-separated country codes the search is constrained to
    pub country_codes: String,
    pub limit: usize,
    /// Ask for structured subfields (city, postcode, road, ...)
    pub address_details: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            country_codes: "in".to_string(),
            limit: DEFAULT_RESULT_LIMIT,
            address_details: true,
        }
    }
}

/// Text search and reverse lookup over some geocoding service.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Ordered candidates for `query`, at most `params.limit` of them.
    async fn search(
        &self,
        query: &str,
        params: &SearchParams,
    ) -> Result<Vec<SearchCandidate>, GeocodeError>;

    /// Best-effort address for a coordinate.
    async fn reverse(&self, coordinate: Coordinate) -> Result<ReverseGeocode, GeocodeError>;
}

/// What a search produced, as reported to the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(Vec<SearchCandidate>),
    Empty,
    /// The provider call failed; carries the logged reason
    Failed(String),
}

impl SearchOutcome {
    pub fn from_result(query: &str, result: Result<Vec<SearchCandidate>, GeocodeError>) -> Self {
        match result {
            Ok(candidates) if candidates.is_empty() => Self::Empty,
            Ok(candidates) => Self::Found(candidates),
            Err(e) => {
                warn!(query, error = %e, "address search failed");
                Self::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use address_wizard_types::StructuredAddress;

    #[test]
    fn test_outcome_classification() {
        let candidate = SearchCandidate {
            id: 7,
            full_label: "Indiranagar, Bengaluru".to_string(),
            coordinate: Coordinate::new(12.97, 77.64),
            structured: StructuredAddress::default(),
        };

        let found = SearchOutcome::from_result("indira", Ok(vec![candidate.clone()]));
        assert_eq!(found, SearchOutcome::Found(vec![candidate]));

        assert_eq!(SearchOutcome::from_result("zzz", Ok(vec![])), SearchOutcome::Empty);

        let failed = SearchOutcome::from_result(
            "indira",
            Err(GeocodeError::Provider {
                message: "503".to_string(),
            }),
        );
        assert!(matches!(failed, SearchOutcome::Failed(ref reason) if reason.contains("503")));
    }
}
