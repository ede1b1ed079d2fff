//! Map widget resource.
//!
//! The interactive map is a host widget behind [`MapHost`] / [`MapSurface`].
//! The wizard holds at most one [`MapSession`] and only while it is on the map
//! step; dropping or releasing the session removes the marker and destroys the
//! surface, which also detaches its click handling.

use address_wizard_types::Coordinate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::MapConfig;
use crate::error::MapError;

/// Initial camera for a freshly mounted map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapViewport {
    pub center: Coordinate,
    pub zoom: f64,
    pub max_zoom: f64,
}

impl MapViewport {
    /// Centre on the chosen location at street zoom, or show the whole
    /// default region when nothing has been chosen.
    pub fn for_selection(config: &MapConfig, selected: Option<Coordinate>) -> Self {
        match selected {
            Some(center) => Self {
                center,
                zoom: config.located_zoom,
                max_zoom: config.max_zoom,
            },
            None => Self {
                center: config.default_center,
                zoom: config.default_zoom,
                max_zoom: config.max_zoom,
            },
        }
    }
}

/// Raster tile style handed to the widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapStyle {
    pub tile_urls: Vec<String>,
    pub tile_size: u32,
    pub attribution: String,
}

impl MapStyle {
    pub fn from_config(config: &MapConfig) -> Self {
        Self {
            tile_urls: config.tile_urls.clone(),
            tile_size: config.tile_size,
            attribution: config.attribution.clone(),
        }
    }
}

/// Creates map widgets on the host's display node.
pub trait MapHost: Send {
    fn mount(
        &mut self,
        viewport: &MapViewport,
        style: &MapStyle,
    ) -> Result<Box<dyn MapSurface>, MapError>;
}

/// One mounted map widget.
///
/// Taps are delivered to the wizard by the host, and only while the surface
/// is alive.
pub trait MapSurface: Send {
    fn fly_to(&mut self, center: Coordinate, zoom: f64);
    fn zoom_in(&mut self);
    fn zoom_out(&mut self);
    /// Create the single marker, or move it if it already exists.
    fn place_marker(&mut self, at: Coordinate);
    fn remove_marker(&mut self);
    /// Tear down the widget and unregister its click handler.
    fn destroy(&mut self);
}

/// Owned map widget for the duration of the map step.
pub struct MapSession {
    surface: Option<Box<dyn MapSurface>>,
    has_marker: bool,
    zoom: f64,
    max_zoom: f64,
}

impl MapSession {
    /// Mount a widget and, when a location is already chosen, mark it.
    pub fn open(
        host: &mut dyn MapHost,
        viewport: MapViewport,
        style: &MapStyle,
        marker: Option<Coordinate>,
    ) -> Result<Self, MapError> {
        info!(center = %viewport.center, zoom = viewport.zoom, "mounting map");
        let surface = host.mount(&viewport, style)?;

        let mut session = Self {
            surface: Some(surface),
            has_marker: false,
            zoom: viewport.zoom,
            max_zoom: viewport.max_zoom,
        };
        if let Some(at) = marker {
            session.place_marker(at);
        }
        Ok(session)
    }

    pub fn is_open(&self) -> bool {
        self.surface.is_some()
    }

    pub fn has_marker(&self) -> bool {
        self.has_marker
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn place_marker(&mut self, at: Coordinate) {
        if let Some(surface) = self.surface.as_mut() {
            surface.place_marker(at);
            self.has_marker = true;
        }
    }

    pub fn fly_to(&mut self, center: Coordinate, zoom: f64) {
        if let Some(surface) = self.surface.as_mut() {
            self.zoom = zoom.min(self.max_zoom);
            surface.fly_to(center, self.zoom);
        }
    }

    pub fn zoom_in(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            if self.zoom < self.max_zoom {
                self.zoom = (self.zoom + 1.0).min(self.max_zoom);
                surface.zoom_in();
            }
        }
    }

    pub fn zoom_out(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            if self.zoom > 0.0 {
                self.zoom = (self.zoom - 1.0).max(0.0);
                surface.zoom_out();
            }
        }
    }

    /// Remove the marker, then destroy the widget. Safe to call twice.
    pub fn release(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            if self.has_marker {
                surface.remove_marker();
                self.has_marker = false;
            }
            surface.destroy();
            debug!("map released");
        }
    }
}

impl Drop for MapSession {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for MapSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSession")
            .field("open", &self.is_open())
            .field("has_marker", &self.has_marker)
            .field("zoom", &self.zoom)
            .finish()
    }
}
