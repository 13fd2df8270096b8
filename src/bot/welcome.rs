use serenity::{
    builder::{CreateEmbed, CreateMessage},
    client::Context,
    model::{guild::Member, id::ChannelId, mention::Mentionable},
};
use tracing::{debug, warn};

const WELCOME_COLOUR: u32 = 0xE06C2F;

/// Where new members get greeted. No channel disables greetings.
#[derive(Debug, Clone, Default)]
pub struct WelcomeConfig {
    pub channel: Option<ChannelId>,
    pub image_url: Option<String>,
}

impl typemap_rev::TypeMapKey for WelcomeConfig {
    type Value = WelcomeConfig;
}

pub fn welcome_embed(mention: &str, guild_name: &str, image_url: Option<&str>) -> CreateEmbed {
    let embed = CreateEmbed::new()
        .title("Welcome!")
        .description(format!(
            "{} welcome to **{}**\nPlease read the rules and introduce yourself~",
            mention, guild_name
        ))
        .colour(WELCOME_COLOUR);

    match image_url {
        Some(url) => embed.image(url),
        None => embed,
    }
}

pub async fn greet(ctx: &Context, config: &WelcomeConfig, member: &Member) {
    let channel = match config.channel {
        Some(channel) => channel,
        None => return,
    };

    let guild_name = member
        .guild_id
        .name(&ctx.cache)
        .unwrap_or_else(|| "the server".to_string());

    let embed = welcome_embed(&member.mention().to_string(), &guild_name, config.image_url.as_deref());

    match channel.send_message(ctx, CreateMessage::new().embed(embed)).await {
        Ok(_) => debug!("Welcomed {} on guild {}", member.user.id, member.guild_id),
        Err(why) => warn!("Failed welcoming {} on guild {}: {}", member.user.id, member.guild_id, why),
    }
}
