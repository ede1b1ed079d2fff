//! Normalised geocoding results
//!
//! Candidates and reverse lookups as the wizard sees them, independent of the
//! provider's wire format.

use serde::{Deserialize, Serialize};

use crate::Coordinate;

/// Number of leading label segments kept as the street address line.
pub const ADDRESS_LINE_SEGMENTS: usize = 3;

/// Structured subfields returned alongside a display label.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructuredAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub town: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub village: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suburb: Option<String>,
}

impl StructuredAddress {
    /// First non-empty of city, town, village.
    pub fn locality(&self) -> Option<&str> {
        [&self.city, &self.town, &self.village]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .find(|v| !v.is_empty())
    }

    pub fn postcode(&self) -> Option<&str> {
        self.postcode.as_deref().filter(|v| !v.is_empty())
    }
}

/// Leading segments of a comma-separated display label.
///
/// Segments are kept verbatim (including their leading space) so the result is
/// always a prefix of the label.
pub fn label_prefix(label: &str, segments: usize) -> String {
    label.split(',').take(segments).collect::<Vec<_>>().join(",")
}

/// One possible real-world place returned by a text search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub id: u64,
    pub full_label: String,
    pub coordinate: Coordinate,
    #[serde(default)]
    pub structured: StructuredAddress,
}

impl SearchCandidate {
    /// Street address line: the first three label segments.
    pub fn address_line(&self) -> String {
        label_prefix(&self.full_label, ADDRESS_LINE_SEGMENTS)
    }

    /// Result row heading.
    pub fn title(&self) -> &str {
        self.full_label.split(',').next().unwrap_or_default()
    }

    /// Result row detail: label segments two through four.
    pub fn subtitle(&self) -> String {
        self.full_label
            .split(',')
            .skip(1)
            .take(3)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Best-effort description of a coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReverseGeocode {
    #[serde(default)]
    pub display_label: Option<String>,
    #[serde(default)]
    pub structured: StructuredAddress,
}

impl ReverseGeocode {
    /// Street address line, empty when the provider returned no label.
    pub fn address_line(&self) -> String {
        self.display_label
            .as_deref()
            .map(|label| label_prefix(label, ADDRESS_LINE_SEGMENTS))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn candidate(label: &str) -> SearchCandidate {
        SearchCandidate {
            id: 1,
            full_label: label.to_string(),
            coordinate: Coordinate::new(12.97, 77.59),
            structured: StructuredAddress::default(),
        }
    }

    #[test]
    fn test_label_derivations() {
        let c = candidate("MG Road, Shivaji Nagar, Bengaluru, Karnataka, 560001, India");
        assert_eq!(c.address_line(), "MG Road, Shivaji Nagar, Bengaluru");
        assert_eq!(c.title(), "MG Road");
        assert_eq!(c.subtitle(), " Shivaji Nagar, Bengaluru, Karnataka");
    }

    #[test]
    fn test_short_label() {
        let c = candidate("Bengaluru");
        assert_eq!(c.address_line(), "Bengaluru");
        assert_eq!(c.subtitle(), "");
    }

    #[test]
    fn test_locality_fallback_order() {
        let mut s = StructuredAddress {
            village: Some("Hoskote".to_string()),
            ..Default::default()
        };
        assert_eq!(s.locality(), Some("Hoskote"));

        s.town = Some("Whitefield".to_string());
        assert_eq!(s.locality(), Some("Whitefield"));

        s.city = Some(String::new());
        assert_eq!(s.locality(), Some("Whitefield"));

        s.city = Some("Bengaluru".to_string());
        assert_eq!(s.locality(), Some("Bengaluru"));
    }

    #[test]
    fn test_reverse_without_label_yields_empty_line() {
        assert_eq!(ReverseGeocode::default().address_line(), "");
    }

    proptest! {
        #[test]
        fn label_prefix_is_prefix_with_bounded_segments(label in "[a-zA-Z0-9 ,]{0,80}") {
            let prefix = label_prefix(&label, ADDRESS_LINE_SEGMENTS);
            prop_assert!(label.starts_with(&prefix));
            prop_assert!(prefix.matches(',').count() < ADDRESS_LINE_SEGMENTS);
        }
    }
}
