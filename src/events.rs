use std::sync::{Arc, Weak};
use tracing::debug;
use crate::{
    engine::PlaybackEngine,
    model::events::PlayerEvent,
    types::EventReceiver,
};

/// Drains events posted by sinks and hands each one back to the engine on its own task.
pub(crate) fn listen(engine: Weak<PlaybackEngine>, mut events: EventReceiver) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let engine = match engine.upgrade() {
                Some(engine) => engine,
                None => break,
            };

            process(engine, event);
        }

        debug!("Player event loop finished");
    });
}

pub(crate) fn process(engine: Arc<PlaybackEngine>, event: PlayerEvent) {
    match event {
        PlayerEvent::TrackFinished { guild_id, error } => {
            tokio::spawn(async move {
                engine.track_finished(guild_id, error).await;
            });
        }
    }
}
