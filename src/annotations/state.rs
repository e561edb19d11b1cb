//! The annotation aggregate: marker, drawn area outline, address and display mode.

use bevy::prelude::*;

use crate::geo::Coordinate;

/// Everything currently annotated on the map.
///
/// Only the interaction controller mutates this resource, and only through the
/// named transitions below. The render layer reads it every frame.
#[derive(Resource, Debug, Clone, PartialEq, Default)]
pub struct AnnotationState {
    marker: Option<Coordinate>,
    outline_vertices: Vec<Coordinate>,
    address: Option<String>,
    night_mode: bool,
}

/// Where the marker/address pair currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerPhase {
    /// No marker placed
    Empty,
    /// Marker placed, address not (yet) known
    Pending,
    /// Marker placed and its address resolved
    Resolved,
}

impl AnnotationState {
    pub fn marker(&self) -> Option<Coordinate> {
        self.marker
    }

    pub fn outline_vertices(&self) -> &[Coordinate] {
        &self.outline_vertices
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn night_mode(&self) -> bool {
        self.night_mode
    }

    pub fn marker_phase(&self) -> MarkerPhase {
        match (&self.marker, &self.address) {
            (None, _) => MarkerPhase::Empty,
            (Some(_), None) => MarkerPhase::Pending,
            (Some(_), Some(_)) => MarkerPhase::Resolved,
        }
    }

    /// The address as it should be displayed: only while a marker is present.
    pub fn visible_address(&self) -> Option<&str> {
        self.marker.and(self.address.as_deref())
    }

    /// Place (or move) the marker. Any previously resolved address is stale.
    pub fn place_marker(&mut self, at: Coordinate) {
        self.marker = Some(at);
        self.address = None;
    }

    pub fn clear_marker(&mut self) {
        self.marker = None;
        self.address = None;
    }

    /// Store the address for the current marker.
    ///
    /// Ignored when there is no marker; returns whether the address was stored.
    /// Callers are responsible for checking that `text` belongs to the current marker.
    pub fn set_address(&mut self, text: impl Into<String>) -> bool {
        if self.marker.is_none() {
            return false;
        }
        self.address = Some(text.into());
        true
    }

    pub fn append_outline_vertex(&mut self, at: Coordinate) {
        self.outline_vertices.push(at);
    }

    pub fn toggle_night_mode(&mut self) {
        self.night_mode = !self.night_mode;
    }

    /// Return to the session's initial state, display mode included.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
