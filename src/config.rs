//! Wizard configuration
//!
//! Loads `wizard.yaml` from the config directory and applies environment
//! overrides. Every section has defaults, so a missing file or a partial file
//! is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::ConfigError;
use crate::geocode::SearchParams;
use crate::geolocation::PositionOptions;
use crate::{
    Coordinate, DEFAULT_CENTER, DEFAULT_DEBOUNCE_MS, DEFAULT_RESULT_LIMIT, DEFAULT_ZOOM,
    GEOLOCATION_TIMEOUT_MS, LOCATED_ZOOM, MAX_ZOOM, MIN_QUERY_CHARS,
};

pub const CONFIG_FILE_NAME: &str = "wizard.yaml";

/// Complete wizard configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    pub geocoder: GeocoderConfig,
    pub search: SearchConfig,
    pub geolocation: GeolocationConfig,
    pub map: MapConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Provider root; `search` and `reverse` are resolved against it
    pub base_url: String,
    /// Sent on every request (the public Nominatim instance rejects anonymous clients)
    pub user_agent: String,
    /// Comma-separated ISO 3166-1 alpha-2 codes
    pub country_codes: String,
    pub result_limit: usize,
    pub timeout_ms: u64,
    /// Minimum spacing between two provider requests
    pub min_interval_ms: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org/".to_string(),
            user_agent: concat!("address-wizard/", env!("CARGO_PKG_VERSION")).to_string(),
            country_codes: "in".to_string(),
            result_limit: DEFAULT_RESULT_LIMIT,
            timeout_ms: 10_000,
            min_interval_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub min_query_chars: usize,
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_chars: MIN_QUERY_CHARS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    pub high_accuracy: bool,
    pub timeout_ms: u64,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: GEOLOCATION_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub default_center: Coordinate,
    pub default_zoom: f64,
    pub located_zoom: f64,
    pub max_zoom: f64,
    pub tile_urls: Vec<String>,
    pub tile_size: u32,
    pub attribution: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_center: DEFAULT_CENTER,
            default_zoom: DEFAULT_ZOOM,
            located_zoom: LOCATED_ZOOM,
            max_zoom: MAX_ZOOM,
            tile_urls: ["a", "b", "c"]
                .iter()
                .map(|s| format!("https://{}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", s))
                .collect(),
            tile_size: 256,
            attribution: "© OpenStreetMap contributors".to_string(),
        }
    }
}

impl WizardConfig {
    /// Parse a YAML document; absent keys take their defaults.
    pub fn from_yaml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=50).contains(&self.geocoder.result_limit) {
            return Err(ConfigError::Invalid {
                field: "geocoder.result_limit",
                reason: format!("{} is outside 1..=50", self.geocoder.result_limit),
            });
        }
        if let Err(e) = Url::parse(&self.geocoder.base_url) {
            return Err(ConfigError::Invalid {
                field: "geocoder.base_url",
                reason: e.to_string(),
            });
        }
        if self.geocoder.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "geocoder.user_agent",
                reason: "must not be empty".to_string(),
            });
        }
        if self.search.min_query_chars == 0 {
            return Err(ConfigError::Invalid {
                field: "search.min_query_chars",
                reason: "must be at least 1".to_string(),
            });
        }
        let map = &self.map;
        if !(map.default_zoom <= map.located_zoom && map.located_zoom <= map.max_zoom) {
            return Err(ConfigError::Invalid {
                field: "map.located_zoom",
                reason: format!(
                    "expected default_zoom ({}) <= located_zoom ({}) <= max_zoom ({})",
                    map.default_zoom, map.located_zoom, map.max_zoom
                ),
            });
        }
        Ok(())
    }

    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            country_codes: self.geocoder.country_codes.clone(),
            limit: self.geocoder.result_limit,
            address_details: true,
        }
    }

    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            high_accuracy: self.geolocation.high_accuracy,
            timeout: Duration::from_millis(self.geolocation.timeout_ms),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search.debounce_ms)
    }
}

pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Create loader from ADDRESS_WIZARD_CONFIG_DIR env var or default to "config"
    pub fn from_env() -> Self {
        let dir =
            std::env::var("ADDRESS_WIZARD_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
        Self::new(dir)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Load `wizard.yaml`, apply environment overrides, validate.
    pub fn load(&self) -> Result<WizardConfig, ConfigError> {
        let mut config = self.load_file()?;
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn load_file(&self) -> Result<WizardConfig, ConfigError> {
        let path = self.config_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            debug!("No {} found, using defaults", path.display());
            return Ok(WizardConfig::default());
        }

        info!("Loading wizard configuration from {}", path.display());
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        WizardConfig::from_yaml_str(&content, &path.display().to_string())
    }
}

/// Environment variables take precedence over the file.
fn apply_env_overrides(config: &mut WizardConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("NOMINATIM_BASE_URL") {
        config.geocoder.base_url = url;
    }
    if let Some(agent) = lookup("NOMINATIM_USER_AGENT") {
        config.geocoder.user_agent = agent;
    }
    if let Some(codes) = lookup("ADDRESS_WIZARD_COUNTRY_CODES") {
        config.geocoder.country_codes = codes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = WizardConfig::default();
        config.validate().unwrap();
        assert_eq!(config.search.debounce_ms, 300);
        assert_eq!(config.search.min_query_chars, 3);
        assert_eq!(config.geocoder.result_limit, 5);
        assert_eq!(config.position_options().timeout, Duration::from_secs(10));
        assert!(config.position_options().high_accuracy);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = WizardConfig::from_yaml_str(
            "geocoder:\n  country_codes: in,np\nsearch:\n  debounce_ms: 500\n",
            "inline",
        )
        .unwrap();
        assert_eq!(config.geocoder.country_codes, "in,np");
        assert_eq!(config.search.debounce_ms, 500);
        assert_eq!(config.search.min_query_chars, 3);
        assert_eq!(config.map.max_zoom, 18.0);
    }

    #[test]
    fn test_bundled_config_matches_defaults() {
        let bundled =
            WizardConfig::from_yaml_str(include_str!("../config/wizard.yaml"), "wizard.yaml")
                .unwrap();
        bundled.validate().unwrap();
        assert_eq!(bundled.search, SearchConfig::default());
        assert_eq!(bundled.map, MapConfig::default());
        assert_eq!(bundled.geolocation, GeolocationConfig::default());
    }

    #[test]
    fn test_invalid_zoom_ordering_rejected() {
        let mut config = WizardConfig::default();
        config.map.located_zoom = 19.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "map.located_zoom",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_result_limit_rejected() {
        let mut config = WizardConfig::default();
        config.geocoder.result_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("NOMINATIM_BASE_URL", "http://localhost:8080/"),
            ("ADDRESS_WIZARD_COUNTRY_CODES", "lk"),
        ]
        .into_iter()
        .collect();

        let mut config = WizardConfig::default();
        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.geocoder.base_url, "http://localhost:8080/");
        assert_eq!(config.geocoder.country_codes, "lk");
        assert_eq!(
            config.geocoder.user_agent,
            GeocoderConfig::default().user_agent
        );
    }

    #[test]
    fn test_loader_reads_file_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "geolocation:\n  timeout_ms: 5000\n",
        )
        .unwrap();

        let config = ConfigLoader::new(dir.path()).load_file().unwrap();
        assert_eq!(config.geolocation.timeout_ms, 5000);
    }

    #[test]
    fn test_loader_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new(dir.path()).load_file().unwrap();
        assert_eq!(config, WizardConfig::default());
    }
}
