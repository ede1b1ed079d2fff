//! Nominatim API types
//!
//! Wire shapes for `/search` and `/reverse` with `format=json`, plus their
//! conversion into the normalised candidate types.

use address_wizard_types::{Coordinate, ReverseGeocode, SearchCandidate, StructuredAddress};
use serde::{Deserialize, Serialize};

use crate::error::GeocodeError;

/// `address` object returned when `addressdetails=1`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NominatimAddress {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub postcode: Option<String>,
    pub road: Option<String>,
    pub suburb: Option<String>,
}

impl From<NominatimAddress> for StructuredAddress {
    fn from(a: NominatimAddress) -> Self {
        StructuredAddress {
            city: a.city,
            town: a.town,
            village: a.village,
            postcode: a.postcode,
            road: a.road,
            suburb: a.suburb,
        }
    }
}

/// One element of a `/search` response. Coordinates arrive as strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NominatimPlace {
    pub place_id: u64,
    pub display_name: String,
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub address: Option<NominatimAddress>,
}

impl NominatimPlace {
    pub fn into_candidate(self) -> Result<SearchCandidate, GeocodeError> {
        let coordinate = match (self.lat.trim().parse::<f64>(), self.lon.trim().parse::<f64>()) {
            (Ok(lat), Ok(lon)) if lat.is_finite() && lon.is_finite() => Coordinate::new(lat, lon),
            _ => {
                return Err(GeocodeError::InvalidCoordinate {
                    id: self.place_id,
                    lat: self.lat,
                    lon: self.lon,
                })
            }
        };

        Ok(SearchCandidate {
            id: self.place_id,
            full_label: self.display_name,
            coordinate,
            structured: self.address.map(Into::into).unwrap_or_default(),
        })
    }
}

/// `/reverse` response. A coordinate with nothing nearby yields only `error`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NominatimReverse {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub address: Option<NominatimAddress>,
    #[serde(default)]
    pub error: Option<String>,
}

impl NominatimReverse {
    pub fn into_reverse(self) -> Result<ReverseGeocode, GeocodeError> {
        if let Some(message) = self.error {
            return Err(GeocodeError::NotFound { message });
        }
        Ok(ReverseGeocode {
            display_label: self.display_name,
            structured: self.address.map(Into::into).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_BODY: &str = r#"[
        {
            "place_id": 123456,
            "licence": "Data © OpenStreetMap contributors, ODbL 1.0.",
            "osm_type": "way",
            "display_name": "MG Road, Shivaji Nagar, Bengaluru, Karnataka, 560001, India",
            "lat": "12.97",
            "lon": "77.59",
            "address": {
                "road": "MG Road",
                "suburb": "Shivaji Nagar",
                "city": "Bengaluru",
                "state": "Karnataka",
                "postcode": "560001",
                "country_code": "in"
            }
        },
        {
            "place_id": 99,
            "display_name": "Somewhere",
            "lat": "12.1",
            "lon": "77.2"
        }
    ]"#;

    #[test]
    fn test_parse_search_response() {
        let places: Vec<NominatimPlace> = serde_json::from_str(SEARCH_BODY).unwrap();
        assert_eq!(places.len(), 2);

        let first = places[0].clone().into_candidate().unwrap();
        assert_eq!(first.id, 123456);
        assert_eq!(first.coordinate, Coordinate::new(12.97, 77.59));
        assert_eq!(first.structured.locality(), Some("Bengaluru"));
        assert_eq!(first.structured.postcode(), Some("560001"));
        assert_eq!(first.structured.road.as_deref(), Some("MG Road"));

        let second = places[1].clone().into_candidate().unwrap();
        assert_eq!(second.structured, StructuredAddress::default());
    }

    #[test]
    fn test_unparseable_coordinate_rejected() {
        let place = NominatimPlace {
            place_id: 5,
            display_name: "Broken".to_string(),
            lat: "north".to_string(),
            lon: "77.0".to_string(),
            address: None,
        };
        assert!(matches!(
            place.into_candidate(),
            Err(GeocodeError::InvalidCoordinate { id: 5, .. })
        ));
    }

    #[test]
    fn test_parse_reverse_response() {
        let body = r#"{
            "place_id": 42,
            "display_name": "12, 4th Cross, Indiranagar, Bengaluru, Karnataka, 560038, India",
            "address": {"suburb": "Indiranagar", "town": "Bengaluru", "postcode": "560038"}
        }"#;
        let reverse: NominatimReverse = serde_json::from_str(body).unwrap();
        let reverse = reverse.into_reverse().unwrap();
        assert_eq!(reverse.address_line(), "12, 4th Cross, Indiranagar");
        assert_eq!(reverse.structured.locality(), Some("Bengaluru"));
    }

    #[test]
    fn test_reverse_error_body_is_not_found() {
        let reverse: NominatimReverse =
            serde_json::from_str(r#"{"error":"Unable to geocode"}"#).unwrap();
        assert!(matches!(
            reverse.into_reverse(),
            Err(GeocodeError::NotFound { .. })
        ));
    }
}
