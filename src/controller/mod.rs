//! The interaction controller and the systems that run it on Bevy's schedule.
//!
//! Events are drained from one message queue in arrival order. Service futures run
//! as tasks, geocoder lookups on the IO pool and camera queries on the async compute
//! pool; finished tasks are polled every frame and their
//! results fed back to the controller on the main schedule, so no two handler bodies
//! ever run at the same time.

mod events;
mod interaction;

#[cfg(test)]
mod tests;

pub use events::InteractionEvent;
pub use interaction::InteractionController;

use interaction::Completion;

use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, IoTaskPool, Task};
use futures_lite::future;

use crate::annotations::AnnotationState;
use crate::config::{AppConfig, ConfigLoaded};
use crate::map::CameraBridge;
use crate::services::YandexGeocoder;

/// Systems that consume [`InteractionEvent`]s. Input producers run before this set.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct InteractionSet;

/// Background task for an in-flight service request
#[derive(Component)]
struct FollowupTask(Task<Completion>);

/// Startup system to hand the service adapters to the controller
fn install_services(
    config: Res<AppConfig>,
    bridge: Res<CameraBridge>,
    mut controller: ResMut<InteractionController>,
) {
    controller.attach_camera(Arc::new(bridge.service()));

    let settings = &config.data.geocoder;
    if let Some(api_key) = settings.resolved_api_key() {
        controller.attach_geocoder(Arc::new(YandexGeocoder::new(settings, api_key)));
        info!("Reverse geocoding via {}", settings.endpoint);
    }
}

/// System to apply interaction events and start their asynchronous followups
fn process_interaction_events(
    mut commands: Commands,
    mut events: MessageReader<InteractionEvent>,
    mut controller: ResMut<InteractionController>,
    mut state: ResMut<AnnotationState>,
) {
    for event in events.read() {
        debug!("Interaction: {:?}", event);

        if let Some(followup) = controller.handle(&mut state, *event) {
            // Lookups can block for the whole HTTP timeout
            let task = if followup.performs_io() {
                IoTaskPool::get().spawn(followup.into_completion())
            } else {
                AsyncComputeTaskPool::get().spawn(followup.into_completion())
            };
            commands.spawn(FollowupTask(task));
        }
    }
}

/// System to poll in-flight followups and reconcile their results
fn poll_followups(
    mut commands: Commands,
    mut controller: ResMut<InteractionController>,
    mut state: ResMut<AnnotationState>,
    mut tasks: Query<(Entity, &mut FollowupTask)>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        if let Some(completion) = future::block_on(future::poll_once(&mut task.0)) {
            let resolution = controller.complete(&mut state, completion);
            trace!("Followup finished: {:?}", resolution);

            commands.entity(entity).despawn();
        }
    }
}

pub struct InteractionPlugin;

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AnnotationState>()
            .init_resource::<InteractionController>()
            .add_message::<InteractionEvent>()
            .add_systems(Startup, install_services.after(ConfigLoaded))
            .add_systems(
                Update,
                (process_interaction_events, poll_followups)
                    .chain()
                    .in_set(InteractionSet),
            );
    }
}
