use std::{sync::Arc, time::Duration};
use async_trait::async_trait;
use dashmap::DashMap;
use serenity::model::id::{
    ChannelId as DiscordChannelId,
    GuildId as DiscordGuildId
};
use songbird::{
    events::{Event, EventContext, EventHandler as VoiceEventHandler, TrackEvent},
    input::HttpRequest,
    tracks::{PlayMode, TrackHandle},
    Songbird,
};
use tracing::{debug, info, warn};
use crate::{
    error::{MusicError, MusicResult},
    model::{events::PlayerEvent, track::Track},
    types::EventSender,
};

const JOIN_TIMEOUT: Duration = Duration::from_secs(15);
const STALE_SESSION_GRACE: Duration = Duration::from_millis(500);

/// What the guild's audio output is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkStatus {
    Disconnected,
    Idle,
    Playing,
    Paused,
}

impl SinkStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

/// Posts a track finished event back onto the engine's scheduler.
///
/// Sinks call this from their own threads, it never touches player state itself.
#[derive(Clone)]
pub struct FinishNotifier {
    guild_id: DiscordGuildId,
    events: EventSender,
}

impl FinishNotifier {
    pub fn new(guild_id: DiscordGuildId, events: EventSender) -> Self {
        Self { guild_id, events }
    }

    pub fn finished(&self, error: Option<String>) {
        let event = PlayerEvent::TrackFinished {
            guild_id: self.guild_id,
            error,
        };

        if self.events.send(event).is_err() {
            debug!("Event loop for guild {} is gone, dropping track end", self.guild_id);
        }
    }
}

/// Audio output bound to one voice channel per guild.
#[async_trait]
pub trait AudioSink: Send + Sync + 'static {
    async fn status(&self, guild_id: DiscordGuildId) -> SinkStatus;

    async fn current_channel(&self, guild_id: DiscordGuildId) -> Option<DiscordChannelId>;

    /// Connects to `channel_id`, moving over if connected elsewhere in the guild.
    async fn connect(&self, guild_id: DiscordGuildId, channel_id: DiscordChannelId) -> MusicResult<()>;

    /// Starts `track` right away. `notifier` fires exactly once when it stops, whatever the reason.
    async fn play(&self, guild_id: DiscordGuildId, track: &Track, notifier: FinishNotifier) -> MusicResult<()>;

    async fn pause(&self, guild_id: DiscordGuildId) -> MusicResult<()>;

    async fn resume(&self, guild_id: DiscordGuildId) -> MusicResult<()>;

    /// Stops the current track, which fires its notifier.
    async fn stop(&self, guild_id: DiscordGuildId) -> MusicResult<()>;

    async fn disconnect(&self, guild_id: DiscordGuildId) -> MusicResult<()>;
}

/// Sink driven by songbird, streaming straight from the resolver's url.
pub struct SongbirdSink {
    manager: Arc<Songbird>,
    http: reqwest::Client,
    handles: DashMap<DiscordGuildId, TrackHandle>,
}

impl SongbirdSink {
    pub fn new(manager: Arc<Songbird>) -> Self {
        Self {
            manager,
            http: reqwest::Client::new(),
            handles: DashMap::new(),
        }
    }

    fn handle(&self, guild_id: DiscordGuildId) -> MusicResult<TrackHandle> {
        self.handles
            .get(&guild_id)
            .map(|item| item.value().clone())
            .ok_or(MusicError::NotConnected)
    }
}

#[async_trait]
impl AudioSink for SongbirdSink {
    async fn status(&self, guild_id: DiscordGuildId) -> SinkStatus {
        let call = match self.manager.get(guild_id) {
            Some(call) => call,
            None => return SinkStatus::Disconnected,
        };

        if call.lock().await.current_connection().is_none() {
            return SinkStatus::Disconnected;
        }

        let handle = match self.handles.get(&guild_id) {
            Some(item) => item.value().clone(),
            None => return SinkStatus::Idle,
        };

        match handle.get_info().await {
            Ok(info) => match info.playing {
                PlayMode::Play => SinkStatus::Playing,
                PlayMode::Pause => SinkStatus::Paused,
                _ => SinkStatus::Idle,
            },
            Err(_) => SinkStatus::Idle,
        }
    }

    async fn current_channel(&self, guild_id: DiscordGuildId) -> Option<DiscordChannelId> {
        let call = self.manager.get(guild_id)?;
        let channel = call.lock().await.current_channel()?;

        Some(DiscordChannelId::new(channel.0.get()))
    }

    async fn connect(&self, guild_id: DiscordGuildId, channel_id: DiscordChannelId) -> MusicResult<()> {
        if let Some(call) = self.manager.get(guild_id) {
            let (connected, channel) = {
                let call = call.lock().await;
                (call.current_connection().is_some(), call.current_channel())
            };

            if connected && channel.map(|c| c.0.get()) == Some(channel_id.get()) {
                return Ok(());
            }

            if !connected {
                // A call without a live connection wedges the next join, drop it first.
                if let Err(why) = self.manager.remove(guild_id).await {
                    debug!("Failed clearing stale voice session on guild {}: {}", guild_id, why);
                }
                self.handles.remove(&guild_id);
                tokio::time::sleep(STALE_SESSION_GRACE).await;
            }
        }

        match tokio::time::timeout(JOIN_TIMEOUT, self.manager.join(guild_id, channel_id)).await {
            Ok(Ok(_)) => {
                info!("Joined voice channel {} on guild {}", channel_id, guild_id);
                Ok(())
            },
            Ok(Err(why)) => Err(why.into()),
            Err(_) => Err(MusicError::Connection("timed out".to_string())),
        }
    }

    async fn play(&self, guild_id: DiscordGuildId, track: &Track, notifier: FinishNotifier) -> MusicResult<()> {
        let call = self.manager.get(guild_id).ok_or(MusicError::NotConnected)?;

        let input = HttpRequest::new(self.http.clone(), track.stream_url.clone());

        let handle = call.lock().await.play_only_input(input.into());

        handle.add_event(Event::Track(TrackEvent::End), TrackEndNotifier(notifier.clone()))?;
        handle.add_event(Event::Track(TrackEvent::Error), TrackEndNotifier(notifier))?;

        self.handles.insert(guild_id, handle);

        Ok(())
    }

    async fn pause(&self, guild_id: DiscordGuildId) -> MusicResult<()> {
        Ok(self.handle(guild_id)?.pause()?)
    }

    async fn resume(&self, guild_id: DiscordGuildId) -> MusicResult<()> {
        Ok(self.handle(guild_id)?.play()?)
    }

    async fn stop(&self, guild_id: DiscordGuildId) -> MusicResult<()> {
        let call = self.manager.get(guild_id).ok_or(MusicError::NotConnected)?;

        call.lock().await.stop();

        Ok(())
    }

    async fn disconnect(&self, guild_id: DiscordGuildId) -> MusicResult<()> {
        self.handles.remove(&guild_id);

        if self.manager.get(guild_id).is_some() {
            self.manager.remove(guild_id).await?;

            info!("Left voice on guild {}", guild_id);
        }

        Ok(())
    }
}

struct TrackEndNotifier(FinishNotifier);

#[async_trait]
impl VoiceEventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let error = match ctx {
            EventContext::Track(tracks) => tracks.iter().find_map(|(state, _)| match &state.playing {
                PlayMode::Errored(why) => Some(format!("{:?}", why)),
                _ => None,
            }),
            _ => None,
        };

        if let Some(ref why) = error {
            warn!("Track errored during playback: {}", why);
        }

        self.0.finished(error);

        Some(Event::Cancel)
    }
}
