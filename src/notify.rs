use std::sync::Arc;
use async_trait::async_trait;
use serenity::{
    builder::{CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter, CreateMessage, EditMessage},
    cache::Cache,
    http::Http,
    model::{
        application::ButtonStyle,
        channel::ReactionType,
        id::{ChannelId as DiscordChannelId, GuildId as DiscordGuildId},
    },
};
use crate::{
    error::MusicResult,
    model::{player::NowPlayingMessage, track::Track},
    util,
};

pub const NOW_PLAYING_COLOUR: u32 = 0x1DB954;

pub const PAUSE_BUTTON: &str = "np_pause";
pub const SKIP_BUTTON: &str = "np_skip";
pub const LOOP_BUTTON: &str = "np_loop";
pub const AUTOPLAY_BUTTON: &str = "np_autoplay";
pub const STOP_BUTTON: &str = "np_stop";

/// What the "now playing" card shows.
#[derive(Debug, Clone, Copy)]
pub struct NowPlayingCard<'a> {
    pub track: &'a Track,
    pub looping: bool,
    pub autoplay: bool,
}

/// Toggle states rendered on the control buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlsState {
    pub paused: bool,
    pub looping: bool,
    pub autoplay: bool,
}

/// Status side effects of the playback engine.
#[async_trait]
pub trait Reporter: Send + Sync + 'static {
    /// Posts the card for a freshly started track.
    async fn now_playing(&self, guild_id: DiscordGuildId, channel_id: DiscordChannelId, card: NowPlayingCard<'_>) -> MusicResult<NowPlayingMessage>;

    /// Deletes a card that is no longer current.
    async fn retire(&self, message: NowPlayingMessage) -> MusicResult<()>;

    /// Keeps the card but removes its buttons.
    async fn clear_controls(&self, message: NowPlayingMessage) -> MusicResult<()>;

    /// Channel to talk in when nothing bound one yet.
    async fn default_channel(&self, guild_id: DiscordGuildId) -> Option<DiscordChannelId>;
}

fn on_off(flag: bool, on: &str) -> String {
    if flag { on.to_string() } else { "OFF".to_string() }
}

pub fn now_playing_embed(card: NowPlayingCard<'_>) -> CreateEmbed {
    CreateEmbed::new()
        .title("▶️ Now Playing")
        .description(format!("**{}**", card.track.title))
        .colour(NOW_PLAYING_COLOUR)
        .field("🔗 Link", format!("<{}>", card.track.page_url), false)
        .footer(CreateEmbedFooter::new(format!(
            "Loop: {}  |  Autoplay: {}  |  ⏸️ ⏭️ 🔁 🎲 ⏹️",
            on_off(card.looping, "🔁 ON"),
            on_off(card.autoplay, "✅ ON"),
        )))
}

fn toggle_style(flag: bool) -> ButtonStyle {
    if flag { ButtonStyle::Success } else { ButtonStyle::Secondary }
}

fn emoji(e: &str) -> ReactionType {
    ReactionType::Unicode(e.to_string())
}

/// The five playback buttons under a "now playing" card.
pub fn controls(state: ControlsState) -> Vec<CreateActionRow> {
    let pause = if state.paused { "▶️" } else { "⏸️" };

    vec![CreateActionRow::Buttons(vec![
        CreateButton::new(PAUSE_BUTTON).emoji(emoji(pause)).style(ButtonStyle::Primary),
        CreateButton::new(SKIP_BUTTON).emoji(emoji("⏭️")).style(ButtonStyle::Secondary),
        CreateButton::new(LOOP_BUTTON).emoji(emoji("🔁")).style(toggle_style(state.looping)),
        CreateButton::new(AUTOPLAY_BUTTON).emoji(emoji("🎲")).style(toggle_style(state.autoplay)),
        CreateButton::new(STOP_BUTTON).emoji(emoji("⏹️")).style(ButtonStyle::Danger),
    ])]
}

/// Reporter posting into guild text channels.
pub struct ChannelReporter {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl ChannelReporter {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }
}

#[async_trait]
impl Reporter for ChannelReporter {
    async fn now_playing(&self, _guild_id: DiscordGuildId, channel_id: DiscordChannelId, card: NowPlayingCard<'_>) -> MusicResult<NowPlayingMessage> {
        let buttons = controls(ControlsState {
            paused: false,
            looping: card.looping,
            autoplay: card.autoplay,
        });

        let message = channel_id
            .send_message(&*self.http, CreateMessage::new().embed(now_playing_embed(card)).components(buttons))
            .await?;

        Ok(NowPlayingMessage {
            channel_id,
            message_id: message.id,
        })
    }

    async fn retire(&self, message: NowPlayingMessage) -> MusicResult<()> {
        message.channel_id.delete_message(&self.http, message.message_id).await?;

        Ok(())
    }

    async fn clear_controls(&self, message: NowPlayingMessage) -> MusicResult<()> {
        message
            .channel_id
            .edit_message(&*self.http, message.message_id, EditMessage::new().components(vec![]))
            .await?;

        Ok(())
    }

    async fn default_channel(&self, guild_id: DiscordGuildId) -> Option<DiscordChannelId> {
        util::pick_default_text_channel(&self.cache, guild_id)
    }
}
