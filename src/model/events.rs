use serenity::model::id::GuildId as DiscordGuildId;

/// Events posted onto the engine's scheduler from foreign execution contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The sink stopped producing audio for the guild, `error` is set when playback failed.
    TrackFinished {
        guild_id: DiscordGuildId,
        error: Option<String>,
    },
}
