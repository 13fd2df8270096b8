//! Discord surface: slash commands, buttons, the music request channel and gateway events.

pub mod checkin;
pub mod commands;
pub mod controls;
pub mod handler;
pub mod music_channel;
pub mod welcome;

use std::sync::Arc;
use serenity::{
    builder::{CreateEmbed, EditInteractionResponse},
    client::Context,
    model::id::{ChannelId, GuildId, UserId},
};
use tracing::error;
use crate::{
    engine::PlaybackEngine,
    error::MusicResult,
    presence::PresenceController,
    store::Store,
    util,
};

pub use handler::Handler;

pub const NOT_IN_GUILD: &str = "Please use this inside a server.";
pub const JOIN_VOICE_FIRST: &str = "🎧 Join a voice channel first, then try again.";

/// What the bot shares across handlers, pulled out of the client's data map.
#[derive(Clone)]
pub struct Services {
    pub engine: Arc<PlaybackEngine>,
    pub presence: Arc<PresenceController>,
    pub store: Store,
}

impl Services {
    pub async fn get(ctx: &Context) -> Option<Self> {
        let data = ctx.data.read().await;

        let services = data.get::<PlaybackEngine>().zip(data.get::<PresenceController>()).zip(data.get::<Store>());

        match services {
            Some(((engine, presence), store)) => Some(Self {
                engine: engine.clone(),
                presence: presence.clone(),
                store: store.clone(),
            }),
            None => {
                error!("Bot services are missing from the client data");
                None
            }
        }
    }
}

/// Body of an interaction response.
pub enum Reply {
    Text(String),
    Embed(CreateEmbed),
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    pub fn into_edit(self) -> EditInteractionResponse {
        match self {
            Self::Text(content) => EditInteractionResponse::new().content(content),
            Self::Embed(embed) => EditInteractionResponse::new().embed(embed),
        }
    }
}

/// Moves the bot into the caller's voice channel. `None` when the caller is not in voice.
pub async fn join_caller(ctx: &Context, engine: &PlaybackEngine, guild_id: GuildId, user_id: UserId) -> MusicResult<Option<ChannelId>> {
    let channel = match util::voice_location(&ctx.cache, guild_id, user_id).user_channel() {
        Some(channel) => channel,
        None => return Ok(None),
    };

    engine.join(guild_id, channel).await?;

    Ok(Some(channel))
}
