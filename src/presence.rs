use std::{sync::Arc, time::Duration};
use dashmap::DashMap;
use serenity::model::id::{
    ChannelId as DiscordChannelId,
    GuildId as DiscordGuildId,
    UserId as DiscordUserId
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use crate::engine::PlaybackEngine;

pub const JOIN_DEBOUNCE: Duration = Duration::from_millis(500);

/// Who sits in which voice channel.
pub trait VoiceRoster: Send + Sync + 'static {
    /// Members in the channel that are not bots.
    fn human_count(&self, guild_id: DiscordGuildId, channel_id: DiscordChannelId) -> usize;
}

/// A voice membership transition, mute and deafen updates included.
#[derive(Debug, Clone, Copy)]
pub struct MemberMove {
    pub guild_id: DiscordGuildId,
    pub user_id: DiscordUserId,
    pub is_bot: bool,
    pub from: Option<DiscordChannelId>,
    pub to: Option<DiscordChannelId>,
}

/// Follows listeners around voice channels.
pub struct PresenceController {
    engine: Arc<PlaybackEngine>,
    roster: Arc<dyn VoiceRoster>,
    pending: DashMap<DiscordGuildId, JoinHandle<()>>,
    debounce: Duration,
    scope: Option<DiscordGuildId>,
}

impl PresenceController {
    pub fn new(engine: Arc<PlaybackEngine>, roster: Arc<dyn VoiceRoster>) -> Self {
        Self {
            engine,
            roster,
            pending: DashMap::new(),
            debounce: JOIN_DEBOUNCE,
            scope: None,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Only react inside this guild.
    pub fn with_scope(mut self, scope: Option<DiscordGuildId>) -> Self {
        self.scope = scope;
        self
    }

    pub async fn member_moved(&self, event: MemberMove) {
        if event.is_bot || event.from == event.to {
            return;
        }

        if self.scope.map_or(false, |scope| scope != event.guild_id) {
            return;
        }

        if let Some(from) = event.from {
            self.member_left(event.guild_id, from).await;
        }

        if let Some(to) = event.to {
            self.member_joined(event.guild_id, event.user_id, to).await;
        }
    }

    async fn member_left(&self, guild_id: DiscordGuildId, channel_id: DiscordChannelId) {
        if self.engine.voice_channel(guild_id).await != Some(channel_id) {
            return;
        }

        if self.roster.human_count(guild_id, channel_id) > 0 {
            return;
        }

        if self.engine.is_always_on(guild_id) {
            debug!("Channel {} emptied on guild {}, staying for 24/7", channel_id, guild_id);
            self.engine.start_if_idle(guild_id).await;
            return;
        }

        info!("Channel {} emptied on guild {}, leaving", channel_id, guild_id);

        if let Err(why) = self.engine.disconnect(guild_id).await {
            warn!("Failed leaving voice on guild {}: {}", guild_id, why);
        }
    }

    async fn member_joined(&self, guild_id: DiscordGuildId, user_id: DiscordUserId, channel_id: DiscordChannelId) {
        match self.engine.voice_channel(guild_id).await {
            Some(current) if current == channel_id => return,
            Some(current) if self.roster.human_count(guild_id, current) > 0 => {
                debug!("Not following {} on guild {}, channel {} still has listeners", user_id, guild_id, current);
                return;
            },
            _ => (),
        }

        let engine = Arc::clone(&self.engine);
        let delay = self.debounce;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            if let Err(why) = engine.join(guild_id, channel_id).await {
                warn!("Failed following {} into channel {} on guild {}: {}", user_id, channel_id, guild_id, why);
                return;
            }

            engine.start_if_idle(guild_id).await;
        });

        if let Some(previous) = self.pending.insert(guild_id, task) {
            previous.abort();
        }
    }
}

impl typemap_rev::TypeMapKey for PresenceController {
    type Value = Arc<PresenceController>;
}
