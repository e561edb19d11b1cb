//! Gesture handling and reconciliation of asynchronous service responses.
//!
//! Every event is handled in two halves. [`InteractionController::handle`] runs
//! synchronously: it applies the immediate state transition and returns the
//! asynchronous work still to do as a [`Followup`]. When that work finishes, its
//! [`Completion`] goes back through [`InteractionController::complete`], which checks
//! that the answer is still relevant before touching the state.
//!
//! There is no cancellation. A reverse-geocode answer is applied only if it carries
//! the ticket of the latest lookup *and* the marker is still where the lookup started;
//! anything else is a stale answer and is dropped.

use std::sync::Arc;

use bevy::prelude::*;

use crate::annotations::AnnotationState;
use crate::constants::{
    RECENTER_ANIMATION_SECS, RECENTER_ZOOM, ZOOM_ANIMATION_SECS, ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR,
};
use crate::geo::Coordinate;
use crate::services::{
    CameraAnimation, CameraPosition, CameraService, GeocodeError, GeocodedAddress,
    GeocodingService, ServiceFuture,
};

use super::events::InteractionEvent;

/// Identifies one reverse-geocode request. Strictly increasing per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LookupTicket(u64);

/// Asynchronous work requested by an event.
pub enum Followup {
    ReverseGeocode {
        ticket: LookupTicket,
        origin: Coordinate,
        request: ServiceFuture<Result<Option<GeocodedAddress>, GeocodeError>>,
    },
    /// Camera position query for a zoom step of `factor`
    CameraZoom {
        factor: f64,
        request: ServiceFuture<Option<CameraPosition>>,
    },
}

impl Followup {
    /// Whether the followup blocks on network I/O rather than on the map surface.
    pub fn performs_io(&self) -> bool {
        matches!(self, Followup::ReverseGeocode { .. })
    }

    /// Wait for the service and package its answer for [`InteractionController::complete`].
    pub async fn into_completion(self) -> Completion {
        match self {
            Followup::ReverseGeocode {
                ticket,
                origin,
                request,
            } => Completion::Geocoded {
                ticket,
                origin,
                outcome: request.await,
            },
            Followup::CameraZoom { factor, request } => Completion::CameraZoom {
                factor,
                position: request.await,
            },
        }
    }
}

impl std::fmt::Debug for Followup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Followup::ReverseGeocode { ticket, origin, .. } => f
                .debug_struct("ReverseGeocode")
                .field("ticket", ticket)
                .field("origin", origin)
                .finish_non_exhaustive(),
            Followup::CameraZoom { factor, .. } => f
                .debug_struct("CameraZoom")
                .field("factor", factor)
                .finish_non_exhaustive(),
        }
    }
}

/// A finished [`Followup`].
#[derive(Debug)]
pub enum Completion {
    Geocoded {
        ticket: LookupTicket,
        origin: Coordinate,
        outcome: Result<Option<GeocodedAddress>, GeocodeError>,
    },
    CameraZoom {
        factor: f64,
        position: Option<CameraPosition>,
    },
}

/// What [`InteractionController::complete`] did with a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The answer changed the state or issued a camera command
    Applied,
    /// The geocoder found nothing; the address stays absent
    NoResult,
    /// The answer belongs to a marker that no longer exists
    Stale,
    /// The service failed; the state is untouched
    Failed,
    /// Nothing to do (camera detached)
    Skipped,
}

/// Translates gestures into annotation state changes and service calls.
#[derive(Resource, Default)]
pub struct InteractionController {
    camera: Option<Arc<dyn CameraService>>,
    geocoder: Option<Arc<dyn GeocodingService>>,
    last_ticket: u64,
    /// The only lookup whose answer may still be applied
    pending_lookup: Option<LookupTicket>,
    last_failure: Option<String>,
}

impl InteractionController {
    pub fn attach_camera(&mut self, camera: Arc<dyn CameraService>) {
        self.camera = Some(camera);
    }

    pub fn attach_geocoder(&mut self, geocoder: Arc<dyn GeocodingService>) {
        self.geocoder = Some(geocoder);
    }

    /// Whether the address of the current marker is still being looked up.
    pub fn lookup_in_flight(&self) -> bool {
        self.pending_lookup.is_some()
    }

    /// Description of the most recent service failure, if the last lookup failed.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    /// Apply the synchronous part of `event`; return the asynchronous part, if any.
    pub fn handle(
        &mut self,
        state: &mut AnnotationState,
        event: InteractionEvent,
    ) -> Option<Followup> {
        match event {
            InteractionEvent::LongPressAt(at) => self.place_point_of_interest(state, at),
            InteractionEvent::TapMarker => {
                state.clear_marker();
                self.pending_lookup = None;
                None
            }
            InteractionEvent::TapAt(at) => {
                state.append_outline_vertex(at);
                None
            }
            InteractionEvent::ZoomIn => self.request_zoom(ZOOM_IN_FACTOR),
            InteractionEvent::ZoomOut => self.request_zoom(ZOOM_OUT_FACTOR),
            InteractionEvent::Recenter => {
                self.recenter(state);
                None
            }
            InteractionEvent::ToggleNightMode => {
                state.toggle_night_mode();
                None
            }
            InteractionEvent::ClearAll => {
                state.reset();
                self.pending_lookup = None;
                None
            }
        }
    }

    /// Apply a finished followup if it is still relevant.
    pub fn complete(&mut self, state: &mut AnnotationState, completion: Completion) -> Resolution {
        match completion {
            Completion::Geocoded {
                ticket,
                origin,
                outcome,
            } => self.apply_lookup(state, ticket, origin, outcome),
            Completion::CameraZoom { factor, position } => self.apply_zoom(factor, position),
        }
    }

    fn place_point_of_interest(
        &mut self,
        state: &mut AnnotationState,
        at: Coordinate,
    ) -> Option<Followup> {
        state.place_marker(at);
        self.last_failure = None;

        let Some(geocoder) = &self.geocoder else {
            debug!("Marker placed at {} without a geocoder; skipping lookup", at);
            self.pending_lookup = None;
            return None;
        };

        self.last_ticket += 1;
        let ticket = LookupTicket(self.last_ticket);
        self.pending_lookup = Some(ticket);
        debug!("Looking up address for {} ({:?})", at, ticket);

        Some(Followup::ReverseGeocode {
            ticket,
            origin: at,
            request: geocoder.reverse_geocode(at),
        })
    }

    fn apply_lookup(
        &mut self,
        state: &mut AnnotationState,
        ticket: LookupTicket,
        origin: Coordinate,
        outcome: Result<Option<GeocodedAddress>, GeocodeError>,
    ) -> Resolution {
        let relevant = self.pending_lookup == Some(ticket) && state.marker() == Some(origin);
        if !relevant {
            debug!("Discarding stale lookup {:?} for {}", ticket, origin);
            return Resolution::Stale;
        }
        self.pending_lookup = None;

        match outcome {
            Ok(Some(address)) => {
                self.last_failure = None;
                state.set_address(address.formatted);
                Resolution::Applied
            }
            Ok(None) => {
                self.last_failure = None;
                info!("No address found for {}", origin);
                Resolution::NoResult
            }
            Err(e) => {
                warn!("Reverse geocoding failed for {}: {}", origin, e);
                self.last_failure = Some(e.to_string());
                Resolution::Failed
            }
        }
    }

    fn request_zoom(&self, factor: f64) -> Option<Followup> {
        let camera = self.camera.as_ref()?;
        Some(Followup::CameraZoom {
            factor,
            request: camera.get_position(),
        })
    }

    fn apply_zoom(&self, factor: f64, position: Option<CameraPosition>) -> Resolution {
        let (Some(camera), Some(position)) = (&self.camera, position) else {
            return Resolution::Skipped;
        };
        camera.set_zoom(position.zoom * factor, ZOOM_ANIMATION_SECS);
        Resolution::Applied
    }

    fn recenter(&self, state: &AnnotationState) {
        let (Some(camera), Some(marker)) = (&self.camera, state.marker()) else {
            return;
        };
        camera.set_center(
            marker,
            RECENTER_ZOOM,
            0.0,
            0.0,
            RECENTER_ANIMATION_SECS,
            CameraAnimation::Smooth,
        );
    }
}
