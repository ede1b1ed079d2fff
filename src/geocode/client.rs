//! Nominatim API Client
//!
//! Rate-limited HTTP client for address search and reverse geocoding against a
//! Nominatim instance (the public OpenStreetMap one by default).

use std::time::Duration;

use address_wizard_types::{Coordinate, ReverseGeocode, SearchCandidate};
use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};
use url::Url;

use super::types::{NominatimPlace, NominatimReverse};
use super::{GeocodingProvider, SearchParams};
use crate::config::GeocoderConfig;
use crate::error::GeocodeError;

pub struct NominatimClient {
    client: Client,
    base_url: Url,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimClient {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base(&config.base_url)?,
            min_interval: Duration::from_millis(config.min_interval_ms),
            last_request: Mutex::new(None),
        })
    }

    /// Enforce spacing between requests. Holding the lock across the wait
    /// serialises concurrent callers.
    async fn rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub fn search_url(&self, query: &str, params: &SearchParams) -> Result<Url, GeocodeError> {
        let mut url = self.base_url.join("search")?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("q", query)
            .append_pair("countrycodes", &params.country_codes)
            .append_pair("limit", &params.limit.to_string())
            .append_pair(
                "addressdetails",
                if params.address_details { "1" } else { "0" },
            );
        Ok(url)
    }

    pub fn reverse_url(&self, coordinate: Coordinate) -> Result<Url, GeocodeError> {
        let mut url = self.base_url.join("reverse")?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("lat", &coordinate.latitude.to_string())
            .append_pair("lon", &coordinate.longitude.to_string())
            .append_pair("addressdetails", "1");
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> Result<String, GeocodeError> {
        self.rate_limit().await;
        debug!(%url, "geocoder request");

        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl GeocodingProvider for NominatimClient {
    async fn search(
        &self,
        query: &str,
        params: &SearchParams,
    ) -> Result<Vec<SearchCandidate>, GeocodeError> {
        let text = self.get_text(self.search_url(query, params)?).await?;
        let places: Vec<NominatimPlace> =
            serde_json::from_str(&text).map_err(|e| GeocodeError::Decode {
                message: format!("search response: {}", e),
            })?;

        let candidates: Vec<SearchCandidate> = places
            .into_iter()
            .filter_map(|place| match place.into_candidate() {
                Ok(candidate) => Some(candidate),
                Err(e) => {
                    warn!(error = %e, "dropping search candidate");
                    None
                }
            })
            .take(params.limit)
            .collect();

        debug!(query, count = candidates.len(), "search returned candidates");
        Ok(candidates)
    }

    async fn reverse(&self, coordinate: Coordinate) -> Result<ReverseGeocode, GeocodeError> {
        let text = self.get_text(self.reverse_url(coordinate)?).await?;
        let reverse: NominatimReverse =
            serde_json::from_str(&text).map_err(|e| GeocodeError::Decode {
                message: format!("reverse response: {}", e),
            })?;
        reverse.into_reverse()
    }
}

/// `Url::join` replaces the last path segment unless the base ends in '/'.
fn normalize_base(base: &str) -> Result<Url, GeocodeError> {
    if base.ends_with('/') {
        Ok(Url::parse(base)?)
    } else {
        Ok(Url::parse(&format!("{}/", base))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> NominatimClient {
        NominatimClient::new(&GeocoderConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_search_url_carries_filters() {
        let url = client("https://nominatim.openstreetmap.org")
            .search_url("MG Road & Co", &SearchParams::default())
            .unwrap();

        assert_eq!(url.path(), "/search");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("q".to_string(), "MG Road & Co".to_string())));
        assert!(pairs.contains(&("countrycodes".to_string(), "in".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "5".to_string())));
        assert!(pairs.contains(&("addressdetails".to_string(), "1".to_string())));
        assert!(pairs.contains(&("format".to_string(), "json".to_string())));
    }

    #[test]
    fn test_reverse_url_under_base_path() {
        let url = client("http://localhost:8080/nominatim")
            .reverse_url(Coordinate::new(12.97, 77.59))
            .unwrap();

        assert_eq!(url.path(), "/nominatim/reverse");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("lat".to_string(), "12.97".to_string())));
        assert!(pairs.contains(&("lon".to_string(), "77.59".to_string())));
    }

    #[test]
    fn test_invalid_base_url() {
        let result = NominatimClient::new(&GeocoderConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(GeocodeError::InvalidUrl(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_spaces_requests() {
        let client = client("http://localhost/");
        let start = Instant::now();
        client.rate_limit().await;
        client.rate_limit().await;
        client.rate_limit().await;
        assert!(start.elapsed() >= Duration::from_millis(2_000));
    }
}
