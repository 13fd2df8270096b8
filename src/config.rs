use std::time::Duration;
use serenity::model::id::{ChannelId, GuildId};
use crate::{error::ConfigError, presence::JOIN_DEBOUNCE, radio::RADIO_BATCH};

const DEFAULT_DATABASE_URL: &str = "sqlite:bot_data.db?mode=rwc";
const DEFAULT_YTDLP: &str = "yt-dlp";

pub struct Settings {
    pub discord_token: String,
    pub database_url: String,
    pub welcome_channel: Option<ChannelId>,
    pub welcome_image_url: Option<String>,
    /// Restricts voice auto-join to one guild.
    pub auto_vc_guild: Option<GuildId>,
    pub ytdlp_path: String,
    pub radio_batch: usize,
    pub join_debounce: Duration,
}

impl Settings {
    /// Reads the process environment, after loading `.env` when there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            discord_token: var("DISCORD_TOKEN")
                .ok_or_else(|| ConfigError::MissingEnvVar("DISCORD_TOKEN".to_string()))?,
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            welcome_channel: parse_id("WELCOME_CHANNEL_ID", var("WELCOME_CHANNEL_ID"))?.map(ChannelId::new),
            welcome_image_url: var("WELCOME_IMAGE_URL"),
            auto_vc_guild: parse_id("AUTO_VC_GUILD_ID", var("AUTO_VC_GUILD_ID"))?.map(GuildId::new),
            ytdlp_path: var("YTDLP_PATH").unwrap_or_else(|| DEFAULT_YTDLP.to_string()),
            radio_batch: parse_number("RADIO_BATCH", var("RADIO_BATCH"))?.unwrap_or(RADIO_BATCH as u64) as usize,
            join_debounce: parse_number("JOIN_DEBOUNCE_MS", var("JOIN_DEBOUNCE_MS"))?
                .map(Duration::from_millis)
                .unwrap_or(JOIN_DEBOUNCE),
        })
    }
}

fn parse_number(name: &str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    value
        .map(|value| {
            value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvVar {
                name: name.to_string(),
                value,
            })
        })
        .transpose()
}

/// Snowflake ids, where `0` means unset.
fn parse_id(name: &str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    Ok(parse_number(name, value)?.filter(|id| *id != 0))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();

        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_token_is_set() {
        let settings = settings(&[("DISCORD_TOKEN", "abc")]).unwrap();

        assert_eq!(settings.discord_token, "abc");
        assert_eq!(settings.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(settings.welcome_channel, None);
        assert_eq!(settings.auto_vc_guild, None);
        assert_eq!(settings.ytdlp_path, "yt-dlp");
        assert_eq!(settings.radio_batch, 3);
        assert_eq!(settings.join_debounce, Duration::from_millis(500));
    }

    #[test]
    fn missing_token_is_an_error() {
        assert!(matches!(settings(&[]), Err(ConfigError::MissingEnvVar(name)) if name == "DISCORD_TOKEN"));
        assert!(matches!(settings(&[("DISCORD_TOKEN", "  ")]), Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn zero_ids_mean_disabled() {
        let settings = settings(&[
            ("DISCORD_TOKEN", "abc"),
            ("WELCOME_CHANNEL_ID", "0"),
            ("AUTO_VC_GUILD_ID", "1234"),
        ])
        .unwrap();

        assert_eq!(settings.welcome_channel, None);
        assert_eq!(settings.auto_vc_guild, Some(GuildId::new(1234)));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let result = settings(&[("DISCORD_TOKEN", "abc"), ("RADIO_BATCH", "three")]);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnvVar { name, value }) if name == "RADIO_BATCH" && value == "three"
        ));
    }
}
