//! Saved addresses shown on the search step.
//!
//! Fixed demonstration entries; the booking app has no address book yet.

use std::sync::OnceLock;

use address_wizard_types::{AddressCategory, SavedAddressPreset};

pub fn saved_presets() -> &'static [SavedAddressPreset] {
    static PRESETS: OnceLock<Vec<SavedAddressPreset>> = OnceLock::new();
    PRESETS.get_or_init(|| {
        vec![
            SavedAddressPreset {
                category: AddressCategory::Home,
                label: "Home".to_string(),
                full_label: "Ghaziabad, Uttar Pradesh - 201009".to_string(),
            },
            SavedAddressPreset {
                category: AddressCategory::Office,
                label: "Office".to_string(),
                full_label: "456, Business Park, Andheri East".to_string(),
            },
        ]
    })
}
