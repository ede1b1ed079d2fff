//! AddressWizard - search, map pick and details form
//!
//! The wizard owns the [`AddressDraft`] from the moment the booking flow opens
//! it until the user confirms. Every interaction is a method call. Text search
//! and the device location fix run as background tasks and report over a
//! channel; their results are applied by [`AddressWizard::poll_events`] (once
//! per frame) or awaited with [`AddressWizard::settle_search`] /
//! [`AddressWizard::settle_location`]. `confirm_map` awaits its single reverse
//! lookup inline and only touches state once it has the answer, so dropping
//! its future leaves the wizard as it was.
//!
//! Provider and sensor failures never escape: they are logged, turned into a
//! [`WizardNotice`], and leave the draft as it was. [`WizardError`] is only
//! returned for calls that make no sense in the current step.

mod state;
mod view;

pub use state::{WizardNotice, WizardStep};
pub use view::{CandidateRow, WizardView};

use std::sync::Arc;

use std::time::Duration;

use address_wizard_types::{
    AddressCategory, AddressDraft, Coordinate, ReverseGeocode, SavedAddressPreset,
    SearchCandidate,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{MapConfig, WizardConfig};
use crate::debounce::{Debouncer, RequestTicket};
use crate::error::WizardError;
use crate::geocode::{GeocodingProvider, SearchOutcome, SearchParams};
use crate::geolocation::{self, LocationSource, PositionOptions};
use crate::map::{MapHost, MapSession, MapStyle, MapViewport};
use crate::presets::saved_presets;

/// External collaborators the wizard talks to.
pub struct WizardDeps {
    pub geocoder: Arc<dyn GeocodingProvider>,
    pub location: Arc<dyn LocationSource>,
    pub map_host: Box<dyn MapHost>,
}

type ConfirmHandler = Box<dyn FnMut(&AddressDraft) + Send>;

/// Messages from background search and location tasks
#[derive(Debug)]
enum WizardEvent {
    SearchStarted(RequestTicket),
    SearchFinished(RequestTicket, SearchOutcome),
    /// Fix obtained; `reverse` is `None` when the lookup failed
    Located {
        ticket: RequestTicket,
        coordinate: Coordinate,
        reverse: Option<ReverseGeocode>,
    },
    LocationFailed {
        ticket: RequestTicket,
        reason: String,
    },
}

/// Background work a caller can wait for.
#[derive(Debug, Clone, Copy)]
enum Pending {
    Search,
    Location,
}

pub struct AddressWizard {
    // =========================================================================
    // FORM STATE
    // =========================================================================
    step: WizardStep,
    draft: AddressDraft,
    /// Pending pin position; seeded from the draft, set by search, tap or fix
    selected: Option<Coordinate>,
    query: String,
    candidates: Vec<SearchCandidate>,
    is_searching: bool,
    is_locating: bool,
    notice: Option<WizardNotice>,

    // =========================================================================
    // COLLABORATORS
    // =========================================================================
    geocoder: Arc<dyn GeocodingProvider>,
    location: Arc<dyn LocationSource>,
    map_host: Box<dyn MapHost>,
    /// Alive only while on the map step
    map: Option<MapSession>,
    on_confirm: Option<ConfirmHandler>,

    // =========================================================================
    // SETTINGS
    // =========================================================================
    search_params: SearchParams,
    min_query_chars: usize,
    position_options: PositionOptions,
    map_config: MapConfig,
    map_style: MapStyle,

    // =========================================================================
    // ASYNC COORDINATION
    // =========================================================================
    debouncer: Debouncer,
    /// Ticket of the search whose result has not been applied yet
    awaiting: Option<RequestTicket>,
    /// Location fix task; zero delay, a new request supersedes the old one
    locator: Debouncer,
    events_tx: mpsc::UnboundedSender<WizardEvent>,
    events_rx: mpsc::UnboundedReceiver<WizardEvent>,
}

impl AddressWizard {
    pub fn new(initial: AddressDraft, deps: WizardDeps, config: &WizardConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let selected = initial.coordinate();

        Self {
            step: WizardStep::Search,
            draft: initial,
            selected,
            query: String::new(),
            candidates: Vec::new(),
            is_searching: false,
            is_locating: false,
            notice: None,
            geocoder: deps.geocoder,
            location: deps.location,
            map_host: deps.map_host,
            map: None,
            on_confirm: None,
            search_params: config.search_params(),
            min_query_chars: config.search.min_query_chars,
            position_options: config.position_options(),
            map_config: config.map.clone(),
            map_style: MapStyle::from_config(&config.map),
            debouncer: Debouncer::new(config.debounce()),
            awaiting: None,
            locator: Debouncer::new(Duration::ZERO),
            events_tx,
            events_rx,
        }
    }

    /// Called once with the finished draft when the user confirms.
    pub fn with_confirm_handler<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&AddressDraft) + Send + 'static,
    {
        self.on_confirm = Some(Box::new(handler));
        self
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &AddressDraft {
        &self.draft
    }

    pub fn selected(&self) -> Option<Coordinate> {
        self.selected
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn candidates(&self) -> &[SearchCandidate] {
        &self.candidates
    }

    pub fn is_searching(&self) -> bool {
        self.is_searching
    }

    pub fn is_locating(&self) -> bool {
        self.is_locating
    }

    pub fn notice(&self) -> Option<&WizardNotice> {
        self.notice.as_ref()
    }

    pub fn presets(&self) -> &'static [SavedAddressPreset] {
        saved_presets()
    }

    pub fn map_session(&self) -> Option<&MapSession> {
        self.map.as_ref()
    }

    /// Whether the details form may be confirmed.
    pub fn can_confirm(&self) -> bool {
        self.draft.is_complete()
    }

    // =========================================================================
    // SEARCH STEP
    // =========================================================================

    /// Update the search text and (re)schedule the debounced lookup.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn set_query(&mut self, text: impl Into<String>) -> Result<(), WizardError> {
        self.require(WizardStep::Search, "search")?;
        self.query = text.into();
        self.clear_search_notice();

        if self.query.chars().count() < self.min_query_chars {
            self.cancel_search();
            self.candidates.clear();
            return Ok(());
        }

        let geocoder = self.geocoder.clone();
        let params = self.search_params.clone();
        let query = self.query.clone();
        let tx = self.events_tx.clone();

        let ticket = self.debouncer.schedule(move |ticket| async move {
            let _ = tx.send(WizardEvent::SearchStarted(ticket));
            debug!(query = %query, "address search");
            let result = geocoder.search(&query, &params).await;
            let outcome = SearchOutcome::from_result(&query, result);
            let _ = tx.send(WizardEvent::SearchFinished(ticket, outcome));
        });
        self.awaiting = Some(ticket);
        Ok(())
    }

    /// The clear ("x") button on the search box.
    pub fn clear_query(&mut self) -> Result<(), WizardError> {
        self.require(WizardStep::Search, "clear the search")?;
        self.query.clear();
        self.candidates.clear();
        self.clear_search_notice();
        self.cancel_search();
        Ok(())
    }

    /// Apply any search or location results that have arrived. Returns how
    /// many events were processed.
    pub fn poll_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
            applied += 1;
        }
        applied
    }

    /// Wait until the scheduled search (if any) has reported back.
    pub async fn settle_search(&mut self) {
        self.settle(Pending::Search).await;
    }

    /// Choose a search result: fill the draft and go straight to details.
    pub fn select_candidate(&mut self, index: usize) -> Result<(), WizardError> {
        self.require(WizardStep::Search, "select a search result")?;
        let candidate = self
            .candidates
            .get(index)
            .cloned()
            .ok_or(WizardError::NoSuchCandidate(index))?;

        info!(id = candidate.id, label = %candidate.full_label, "search result selected");
        self.selected = Some(candidate.coordinate);
        self.draft.address = candidate.address_line();
        self.draft.city = candidate
            .structured
            .locality()
            .unwrap_or_default()
            .to_string();
        self.draft.pincode = candidate
            .structured
            .postcode()
            .unwrap_or_default()
            .to_string();
        self.draft.set_coordinate(candidate.coordinate);

        self.query.clear();
        self.candidates.clear();
        self.clear_search_notice();
        self.cancel_search();
        self.transition(WizardStep::Details);
        Ok(())
    }

    pub fn select_preset(&mut self, index: usize) -> Result<(), WizardError> {
        self.require(WizardStep::Search, "select a saved address")?;
        let preset = saved_presets()
            .get(index)
            .ok_or(WizardError::NoSuchPreset(index))?;

        self.draft.address_type = preset.category;
        self.draft.address = preset.full_label.clone();
        self.transition(WizardStep::Details);
        Ok(())
    }

    /// "Add new address": pick a location on the map.
    pub fn add_new_address(&mut self) -> Result<(), WizardError> {
        self.require(WizardStep::Search, "add a new address")?;
        self.transition(WizardStep::Map);
        Ok(())
    }

    /// Ask the device for its position in the background. Once the fix lands
    /// it is reverse-geocoded into the draft and shown on the map; a failure
    /// only records a notice. The wizard stays usable meanwhile.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn use_current_location(&mut self) -> Result<(), WizardError> {
        if self.step == WizardStep::Details {
            return Err(WizardError::InvalidTransition {
                from: self.step,
                action: "use the current location",
            });
        }

        let location = self.location.clone();
        let geocoder = self.geocoder.clone();
        let options = self.position_options;
        let tx = self.events_tx.clone();

        self.locator.schedule(move |ticket| async move {
            let event = match geolocation::locate(location.as_ref(), &options).await {
                Ok(coordinate) => {
                    info!(%coordinate, "device location acquired");
                    let reverse = match geocoder.reverse(coordinate).await {
                        Ok(reverse) => Some(reverse),
                        Err(e) => {
                            warn!(%coordinate, error = %e, "reverse geocode failed");
                            None
                        }
                    };
                    WizardEvent::Located {
                        ticket,
                        coordinate,
                        reverse,
                    }
                }
                Err(e) => WizardEvent::LocationFailed {
                    ticket,
                    reason: e.to_string(),
                },
            };
            let _ = tx.send(event);
        });

        self.is_locating = true;
        if matches!(self.notice, Some(WizardNotice::LocationFailed { .. })) {
            self.notice = None;
        }
        Ok(())
    }

    /// Wait until the pending location request (if any) has been applied.
    pub async fn settle_location(&mut self) {
        self.settle(Pending::Location).await;
    }

    // =========================================================================
    // MAP STEP
    // =========================================================================

    /// A tap on the mounted map. Ignored unless a map is currently mounted.
    pub fn map_clicked(&mut self, at: Coordinate) -> bool {
        let map = match self.map.as_mut() {
            Some(map) if self.step == WizardStep::Map => map,
            _ => {
                debug!(%at, "map tap with no mounted map ignored");
                return false;
            }
        };
        map.place_marker(at);
        self.selected = Some(at);
        true
    }

    pub fn zoom_in(&mut self) -> Result<(), WizardError> {
        self.require(WizardStep::Map, "zoom")?;
        if let Some(map) = self.map.as_mut() {
            map.zoom_in();
        }
        Ok(())
    }

    pub fn zoom_out(&mut self) -> Result<(), WizardError> {
        self.require(WizardStep::Map, "zoom")?;
        if let Some(map) = self.map.as_mut() {
            map.zoom_out();
        }
        Ok(())
    }

    /// Fly back to the pending pin.
    pub fn recenter(&mut self) -> Result<(), WizardError> {
        self.require(WizardStep::Map, "recenter the map")?;
        let zoom = self.map_config.located_zoom;
        if let (Some(map), Some(at)) = (self.map.as_mut(), self.selected) {
            map.fly_to(at, zoom);
        }
        Ok(())
    }

    /// "Confirm Location": backfill the address from the pin if none is known
    /// yet, then move to the details form.
    pub async fn confirm_map(&mut self) -> Result<(), WizardError> {
        self.require(WizardStep::Map, "confirm the map location")?;
        let coordinate = self.selected.ok_or(WizardError::NoLocationSelected)?;

        if self.draft.address.trim().is_empty() {
            self.reverse_fill(coordinate).await;
        }
        self.draft.set_coordinate(coordinate);
        self.transition(WizardStep::Details);
        Ok(())
    }

    pub fn back(&mut self) -> Result<(), WizardError> {
        self.require(WizardStep::Map, "go back")?;
        self.transition(WizardStep::Search);
        Ok(())
    }

    // =========================================================================
    // DETAILS STEP
    // =========================================================================

    pub fn set_category(&mut self, category: AddressCategory) -> Result<(), WizardError> {
        self.require(WizardStep::Details, "change the address type")?;
        self.draft.address_type = category;
        Ok(())
    }

    pub fn set_address(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        self.require(WizardStep::Details, "edit the address")?;
        self.draft.address = value.into();
        Ok(())
    }

    pub fn set_landmark(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        self.require(WizardStep::Details, "edit the landmark")?;
        self.draft.landmark = value.into();
        Ok(())
    }

    pub fn set_city(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        self.require(WizardStep::Details, "edit the city")?;
        self.draft.city = value.into();
        Ok(())
    }

    pub fn set_pincode(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        self.require(WizardStep::Details, "edit the pincode")?;
        self.draft.pincode = value.into();
        Ok(())
    }

    /// "Change Location": back to the map.
    pub fn change_location(&mut self) -> Result<(), WizardError> {
        self.require(WizardStep::Details, "change the location")?;
        self.transition(WizardStep::Map);
        Ok(())
    }

    /// "Confirm Address": hand the draft to the booking flow.
    pub fn confirm(&mut self) -> Result<AddressDraft, WizardError> {
        self.require(WizardStep::Details, "confirm the address")?;
        let missing = self.draft.missing_fields();
        if !missing.is_empty() {
            return Err(WizardError::Incomplete { missing });
        }

        info!(
            address_type = %self.draft.address_type,
            city = %self.draft.city,
            pincode = %self.draft.pincode,
            "address confirmed"
        );
        if let Some(handler) = self.on_confirm.as_mut() {
            handler(&self.draft);
        }
        Ok(self.draft.clone())
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn require(&self, step: WizardStep, action: &'static str) -> Result<(), WizardError> {
        if self.step == step {
            Ok(())
        } else {
            Err(WizardError::InvalidTransition {
                from: self.step,
                action,
            })
        }
    }

    /// Move to `next`, mounting the map on entry to the map step and tearing
    /// it down on exit.
    fn transition(&mut self, next: WizardStep) {
        if self.step == next {
            return;
        }
        info!(from = %self.step, to = %next, "address wizard step");
        if self.step == WizardStep::Map {
            self.release_map();
        }
        if next == WizardStep::Details {
            self.cancel_location();
        }
        self.notice = None;
        self.step = next;
        if next == WizardStep::Map {
            self.open_map();
        }
    }

    fn open_map(&mut self) {
        if self.map.is_some() {
            return;
        }
        let viewport = MapViewport::for_selection(&self.map_config, self.selected);
        match MapSession::open(
            self.map_host.as_mut(),
            viewport,
            &self.map_style,
            self.selected,
        ) {
            Ok(session) => self.map = Some(session),
            Err(e) => warn!(error = %e, "map could not be mounted"),
        }
    }

    fn release_map(&mut self) {
        if let Some(mut session) = self.map.take() {
            session.release();
        }
    }

    /// Reverse-geocode `at` into the draft. Failures leave the draft untouched.
    async fn reverse_fill(&mut self, at: Coordinate) {
        match self.geocoder.reverse(at).await {
            Ok(reverse) => self.fill_from_reverse(at, &reverse),
            Err(e) => warn!(%at, error = %e, "reverse geocode failed"),
        }
    }

    fn fill_from_reverse(&mut self, at: Coordinate, reverse: &ReverseGeocode) {
        self.draft.address = reverse.address_line();
        self.draft.city = reverse
            .structured
            .locality()
            .unwrap_or_default()
            .to_string();
        self.draft.pincode = reverse
            .structured
            .postcode()
            .unwrap_or_default()
            .to_string();
        self.draft.set_coordinate(at);
    }

    fn cancel_search(&mut self) {
        self.debouncer.cancel();
        self.awaiting = None;
        self.is_searching = false;
    }

    fn cancel_location(&mut self) {
        if self.is_locating {
            debug!("pending location request dropped");
        }
        self.locator.cancel();
        self.is_locating = false;
    }

    fn is_waiting_on(&self, pending: Pending) -> bool {
        match pending {
            Pending::Search => self.awaiting.is_some(),
            Pending::Location => self.is_locating,
        }
    }

    fn task_running(&self, pending: Pending) -> bool {
        match pending {
            Pending::Search => self.debouncer.is_pending(),
            Pending::Location => self.locator.is_pending(),
        }
    }

    /// Drain events until `pending` has been applied or its task is gone.
    /// Cancel-safe: dropping the future loses no events.
    async fn settle(&mut self, pending: Pending) {
        loop {
            self.poll_events();
            if !self.is_waiting_on(pending) {
                return;
            }
            if !self.task_running(pending) {
                // The task ended; whatever it sent is already queued.
                self.poll_events();
                if self.is_waiting_on(pending) {
                    warn!(?pending, "background task ended without reporting a result");
                    match pending {
                        Pending::Search => {
                            self.awaiting = None;
                            self.is_searching = false;
                        }
                        Pending::Location => self.is_locating = false,
                    }
                }
                return;
            }
            match self.events_rx.recv().await {
                Some(event) => self.apply_event(event),
                None => return,
            }
        }
    }

    fn clear_search_notice(&mut self) {
        if matches!(
            self.notice,
            Some(WizardNotice::NoResults | WizardNotice::SearchFailed { .. })
        ) {
            self.notice = None;
        }
    }

    fn apply_event(&mut self, event: WizardEvent) {
        match event {
            WizardEvent::SearchStarted(ticket) if self.debouncer.is_current(ticket) => {
                self.is_searching = true;
            }
            WizardEvent::SearchFinished(ticket, outcome) if self.debouncer.is_current(ticket) => {
                self.is_searching = false;
                self.awaiting = None;
                let (candidates, notice) = match outcome {
                    SearchOutcome::Found(candidates) => (candidates, None),
                    SearchOutcome::Empty => (Vec::new(), Some(WizardNotice::NoResults)),
                    SearchOutcome::Failed(reason) => {
                        (Vec::new(), Some(WizardNotice::SearchFailed { reason }))
                    }
                };
                self.candidates = candidates;
                if notice.is_some() {
                    self.notice = notice;
                }
            }
            WizardEvent::Located {
                ticket,
                coordinate,
                reverse,
            } if self.locator.is_current(ticket) && self.is_locating => {
                self.is_locating = false;
                self.selected = Some(coordinate);
                if let Some(reverse) = reverse {
                    self.fill_from_reverse(coordinate, &reverse);
                }
                self.transition(WizardStep::Map);

                let zoom = self.map_config.located_zoom;
                if let Some(map) = self.map.as_mut() {
                    map.fly_to(coordinate, zoom);
                    map.place_marker(coordinate);
                }
            }
            WizardEvent::LocationFailed { ticket, reason }
                if self.locator.is_current(ticket) && self.is_locating =>
            {
                self.is_locating = false;
                self.notice = Some(WizardNotice::LocationFailed { reason });
            }
            stale => debug!(?stale, "ignoring stale wizard event"),
        }
    }
}

impl std::fmt::Debug for AddressWizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressWizard")
            .field("step", &self.step)
            .field("draft", &self.draft)
            .field("selected", &self.selected)
            .field("query", &self.query)
            .field("candidates", &self.candidates.len())
            .field("map", &self.map)
            .finish()
    }
}
