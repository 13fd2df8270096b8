use std::{sync::Arc, time::Duration};
use serenity::{
    builder::CreateMessage,
    cache::Cache,
    http::Http,
    model::{
        channel::ChannelType,
        id::{ChannelId, GuildId, UserId},
        permissions::Permissions,
    },
};
use tracing::debug;
use crate::presence::VoiceRoster;

/// Where the bot and a member sit in voice, relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceLocationState {
    /// The member is not connected to any VC
    UserDisconnected,
    /// The member is in `user`, the bot is not connected
    ClientDisconnected { user: ChannelId },
    /// Bot and member are on the same VC
    OnSameChannel(ChannelId),
    /// Bot and member are on different VC's
    OnDifferentChannel { user: ChannelId, bot: ChannelId },
}

impl VoiceLocationState {
    pub fn user_channel(&self) -> Option<ChannelId> {
        match *self {
            Self::UserDisconnected => None,
            Self::ClientDisconnected { user } => Some(user),
            Self::OnSameChannel(channel) => Some(channel),
            Self::OnDifferentChannel { user, .. } => Some(user),
        }
    }
}

pub fn voice_location(cache: impl AsRef<Cache>, guild_id: GuildId, user_id: UserId) -> VoiceLocationState {
    let cache = cache.as_ref();
    let bot_id = cache.current_user().id;

    let (bot_channel, user_channel) = match cache.guild(guild_id) {
        None => (None, None),
        Some(guild) => (
            guild.voice_states.get(&bot_id).and_then(|vs| vs.channel_id),
            guild.voice_states.get(&user_id).and_then(|vs| vs.channel_id),
        ),
    };

    match (user_channel, bot_channel) {
        (None, _) => VoiceLocationState::UserDisconnected,
        (Some(user), None) => VoiceLocationState::ClientDisconnected { user },
        (Some(user), Some(bot)) if user == bot => VoiceLocationState::OnSameChannel(user),
        (Some(user), Some(bot)) => VoiceLocationState::OnDifferentChannel { user, bot },
    }
}

/// The system channel if the bot may talk there, otherwise the topmost text channel it can write to.
pub fn pick_default_text_channel(cache: impl AsRef<Cache>, guild_id: GuildId) -> Option<ChannelId> {
    let cache = cache.as_ref();
    let bot_id = cache.current_user().id;
    let guild = cache.guild(guild_id)?;
    let bot = guild.members.get(&bot_id)?;

    let writable = |channel_id: &ChannelId| {
        guild
            .channels
            .get(channel_id)
            .filter(|channel| channel.kind == ChannelType::Text)
            .map_or(false, |channel| {
                guild.user_permissions_in(channel, bot).contains(Permissions::SEND_MESSAGES)
            })
    };

    if let Some(system) = guild.system_channel_id.filter(|id| writable(id)) {
        return Some(system);
    }

    let mut candidates = guild
        .channels
        .values()
        .filter(|channel| writable(&channel.id))
        .map(|channel| (channel.position, channel.id))
        .collect::<Vec<_>>();

    candidates.sort();
    candidates.first().map(|(_, id)| *id)
}

/// Voice roster read out of the gateway cache.
pub struct CacheRoster {
    cache: Arc<Cache>,
}

impl CacheRoster {
    pub fn new(cache: Arc<Cache>) -> Self {
        Self { cache }
    }
}

impl VoiceRoster for CacheRoster {
    fn human_count(&self, guild_id: GuildId, channel_id: ChannelId) -> usize {
        let guild = match self.cache.guild(guild_id) {
            Some(guild) => guild,
            None => return 0,
        };

        guild
            .voice_states
            .values()
            .filter(|vs| vs.channel_id == Some(channel_id))
            .filter(|vs| {
                let is_bot = vs
                    .member
                    .as_ref()
                    .or_else(|| guild.members.get(&vs.user_id))
                    .map_or(false, |member| member.user.bot);
                !is_bot
            })
            .count()
    }
}

/// Posts `content` and deletes it again after `ttl`.
pub async fn send_notice(http: &Arc<Http>, channel_id: ChannelId, content: impl Into<String>, ttl: Duration) {
    let message = match channel_id.send_message(&**http, CreateMessage::new().content(content)).await {
        Ok(message) => message,
        Err(why) => {
            debug!("Failed sending notice to channel {}: {}", channel_id, why);
            return;
        }
    };

    let http = Arc::clone(http);
    tokio::spawn(async move {
        tokio::time::sleep(ttl).await;

        if let Err(why) = message.delete(&*http).await {
            debug!("Failed deleting notice in channel {}: {}", channel_id, why);
        }
    });
}
