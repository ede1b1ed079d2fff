//! Render snapshot of the wizard.
//!
//! Everything a front end needs to draw the current step, computed in one
//! place so hosts don't re-derive affordances (preset visibility, the
//! confirm button) themselves.

use address_wizard_types::{AddressDraft, DraftField, SavedAddressPreset};
use serde::Serialize;

use super::{AddressWizard, WizardStep};

/// One row of the search result list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateRow {
    pub index: usize,
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardView {
    pub step: WizardStep,
    pub query: String,
    pub candidates: Vec<CandidateRow>,
    pub is_searching: bool,
    pub is_locating: bool,
    /// Saved addresses are listed only when there are no results and no
    /// search is running
    pub show_presets: bool,
    pub presets: Vec<SavedAddressPreset>,
    /// Address under the map, once one is known
    pub address_preview: Option<String>,
    /// Pending pin as "lat, lng"
    pub selected_label: Option<String>,
    pub map_zoom: Option<f64>,
    pub draft: AddressDraft,
    pub confirm_enabled: bool,
    pub missing: Vec<DraftField>,
    pub notice: Option<String>,
}

impl AddressWizard {
    pub fn view(&self) -> WizardView {
        let candidates = self
            .candidates()
            .iter()
            .enumerate()
            .map(|(index, c)| CandidateRow {
                index,
                title: c.title().to_string(),
                subtitle: c.subtitle(),
            })
            .collect::<Vec<_>>();

        let draft = self.draft().clone();
        let missing = draft.missing_fields();

        WizardView {
            step: self.step(),
            query: self.query().to_string(),
            show_presets: candidates.is_empty() && !self.is_searching(),
            candidates,
            is_searching: self.is_searching(),
            is_locating: self.is_locating(),
            presets: self.presets().to_vec(),
            address_preview: (!draft.address.is_empty()).then(|| draft.address.clone()),
            selected_label: self.selected().map(|c| c.label()),
            map_zoom: self.map_session().map(|m| m.zoom()),
            confirm_enabled: missing.is_empty(),
            missing,
            draft,
            notice: self.notice().map(|n| n.message().to_string()),
        }
    }
}
