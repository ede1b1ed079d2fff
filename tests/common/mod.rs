//! Shared fakes for wizard integration tests
//!
//! - `FakeGeocoder`: scripted search / reverse answers with call counters
//! - `RecordingMapHost`: map widget that records every call into a `MapProbe`
//! - `SlowLocation`: position sensor that answers after a delay

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use address_wizard::error::{GeocodeError, GeolocationError, MapError};
use address_wizard::{
    AddressDraft, AddressWizard, Coordinate, FixedLocation, GeocodingProvider, LocationSource,
    MapHost, MapStyle, MapSurface, MapViewport, PositionOptions, ReverseGeocode,
    SearchCandidate, SearchParams, StructuredAddress, WizardConfig, WizardDeps,
};
use async_trait::async_trait;

// ============================================================================
// GEOCODER
// ============================================================================

pub struct FakeGeocoder {
    search_answer: Mutex<Result<Vec<SearchCandidate>, String>>,
    reverse_answer: Mutex<Result<ReverseGeocode, String>>,
    reverse_delay: Duration,
    search_calls: AtomicUsize,
    reverse_calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        Self {
            search_answer: Mutex::new(Ok(vec![])),
            reverse_answer: Mutex::new(Err("no reverse answer scripted".to_string())),
            reverse_delay: Duration::ZERO,
            search_calls: AtomicUsize::new(0),
            reverse_calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_search(self, candidates: Vec<SearchCandidate>) -> Self {
        *self.search_answer.lock().unwrap() = Ok(candidates);
        self
    }

    pub fn with_search_failure(self, reason: &str) -> Self {
        *self.search_answer.lock().unwrap() = Err(reason.to_string());
        self
    }

    pub fn with_reverse(self, reverse: ReverseGeocode) -> Self {
        *self.reverse_answer.lock().unwrap() = Ok(reverse);
        self
    }

    pub fn with_reverse_delay(mut self, delay: Duration) -> Self {
        self.reverse_delay = delay;
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn reverse_calls(&self) -> usize {
        self.reverse_calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeocodingProvider for FakeGeocoder {
    async fn search(
        &self,
        query: &str,
        params: &SearchParams,
    ) -> Result<Vec<SearchCandidate>, GeocodeError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        match &*self.search_answer.lock().unwrap() {
            Ok(candidates) => Ok(candidates.iter().take(params.limit).cloned().collect()),
            Err(message) => Err(GeocodeError::Provider {
                message: message.clone(),
            }),
        }
    }

    async fn reverse(&self, _coordinate: Coordinate) -> Result<ReverseGeocode, GeocodeError> {
        self.reverse_calls.fetch_add(1, Ordering::SeqCst);
        if !self.reverse_delay.is_zero() {
            tokio::time::sleep(self.reverse_delay).await;
        }
        match &*self.reverse_answer.lock().unwrap() {
            Ok(reverse) => Ok(reverse.clone()),
            Err(message) => Err(GeocodeError::Provider {
                message: message.clone(),
            }),
        }
    }
}

// ============================================================================
// LOCATION
// ============================================================================

/// Sensor that takes `delay` to produce its fix.
pub struct SlowLocation {
    pub delay: Duration,
    pub at: Coordinate,
}

#[async_trait]
impl LocationSource for SlowLocation {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinate, GeolocationError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.at)
    }
}

// ============================================================================
// MAP
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct MapLog {
    pub mounts: Vec<MapViewport>,
    pub destroyed: usize,
    pub live: usize,
    pub markers: Vec<Coordinate>,
    pub marker_removals: usize,
    pub fly_tos: Vec<(Coordinate, f64)>,
    pub zoom_ins: usize,
    pub zoom_outs: usize,
}

#[derive(Clone, Default)]
pub struct MapProbe(Arc<Mutex<MapLog>>);

impl MapProbe {
    pub fn snapshot(&self) -> MapLog {
        self.0.lock().unwrap().clone()
    }
}

pub struct RecordingMapHost {
    probe: MapProbe,
}

impl RecordingMapHost {
    pub fn new() -> (Self, MapProbe) {
        let probe = MapProbe::default();
        (
            Self {
                probe: probe.clone(),
            },
            probe,
        )
    }
}

impl MapHost for RecordingMapHost {
    fn mount(
        &mut self,
        viewport: &MapViewport,
        _style: &MapStyle,
    ) -> Result<Box<dyn MapSurface>, MapError> {
        let mut log = self.probe.0.lock().unwrap();
        log.mounts.push(*viewport);
        log.live += 1;
        Ok(Box::new(RecordingSurface {
            probe: self.probe.clone(),
        }))
    }
}

struct RecordingSurface {
    probe: MapProbe,
}

impl MapSurface for RecordingSurface {
    fn fly_to(&mut self, center: Coordinate, zoom: f64) {
        self.probe.0.lock().unwrap().fly_tos.push((center, zoom));
    }

    fn zoom_in(&mut self) {
        self.probe.0.lock().unwrap().zoom_ins += 1;
    }

    fn zoom_out(&mut self) {
        self.probe.0.lock().unwrap().zoom_outs += 1;
    }

    fn place_marker(&mut self, at: Coordinate) {
        self.probe.0.lock().unwrap().markers.push(at);
    }

    fn remove_marker(&mut self) {
        self.probe.0.lock().unwrap().marker_removals += 1;
    }

    fn destroy(&mut self) {
        let mut log = self.probe.0.lock().unwrap();
        log.destroyed += 1;
        log.live -= 1;
    }
}

// ============================================================================
// BUILDERS
// ============================================================================

pub fn mg_road_candidate() -> SearchCandidate {
    SearchCandidate {
        id: 123456,
        full_label: "MG Road, Shivaji Nagar, Bengaluru, Karnataka, 560001, India".to_string(),
        coordinate: Coordinate::new(12.97, 77.59),
        structured: StructuredAddress {
            road: Some("MG Road".to_string()),
            city: Some("Bengaluru".to_string()),
            postcode: Some("560001".to_string()),
            ..Default::default()
        },
    }
}

pub fn indiranagar_reverse() -> ReverseGeocode {
    ReverseGeocode {
        display_label: Some(
            "12, 4th Cross, Indiranagar, Bengaluru, Karnataka, 560038, India".to_string(),
        ),
        structured: StructuredAddress {
            suburb: Some("Indiranagar".to_string()),
            city: Some("Bengaluru".to_string()),
            postcode: Some("560038".to_string()),
            ..Default::default()
        },
    }
}

pub fn empty_draft() -> AddressDraft {
    AddressDraft::default()
}

pub struct Harness {
    pub wizard: AddressWizard,
    pub geocoder: Arc<FakeGeocoder>,
    pub map: MapProbe,
}

pub fn harness(initial: AddressDraft, geocoder: FakeGeocoder) -> Harness {
    harness_with_location(initial, geocoder, FixedLocation::unavailable())
}

pub fn harness_with_location(
    initial: AddressDraft,
    geocoder: FakeGeocoder,
    location: impl LocationSource + 'static,
) -> Harness {
    let geocoder = Arc::new(geocoder);
    let (host, map) = RecordingMapHost::new();
    let deps = WizardDeps {
        geocoder: geocoder.clone(),
        location: Arc::new(location),
        map_host: Box::new(host),
    };
    Harness {
        wizard: AddressWizard::new(initial, deps, &WizardConfig::default()),
        geocoder,
        map,
    }
}
