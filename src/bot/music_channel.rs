use std::time::Duration;
use serenity::{
    builder::CreateEmbed,
    client::Context,
    model::{
        channel::Message,
        id::{ChannelId, GuildId},
    },
};
use tracing::{debug, warn};
use crate::{sink::SinkStatus, util};
use super::{Reply, Services};

const SETUP_COLOUR: u32 = 0x1DB954;
const NOTICE_TTL: Duration = Duration::from_secs(5);
const QUEUED_TTL: Duration = Duration::from_secs(8);

/// The text a message contributes as a song request, if any.
pub fn request_query(content: &str) -> Option<&str> {
    let query = content.trim();

    if query.is_empty() || query.starts_with('/') {
        None
    } else {
        Some(query)
    }
}

pub async fn setup(services: &Services, guild_id: GuildId, channel_id: ChannelId) -> Reply {
    if let Err(why) = services.store.set_music_channel(guild_id, channel_id).await {
        warn!("Failed saving music channel for guild {}: {}", guild_id, why);
        return Reply::text("❌ Could not save the music channel, try again later.");
    }

    Reply::Embed(
        CreateEmbed::new()
            .title("🎵 Music channel ready")
            .description(format!(
                "<#{}> is now the music request channel.\n\nJust type a song name or YouTube URL there to play it!",
                channel_id
            ))
            .colour(SETUP_COLOUR),
    )
}

/// Turns a plain message in the guild's music channel into a play request.
pub async fn handle_message(ctx: &Context, services: &Services, msg: &Message) {
    if msg.author.bot {
        return;
    }

    let guild_id = match msg.guild_id {
        Some(guild_id) => guild_id,
        None => return,
    };

    let music_channel = match services.store.music_channel(guild_id).await {
        Ok(channel) => channel,
        Err(why) => {
            warn!("Failed loading music channel for guild {}: {}", guild_id, why);
            return;
        }
    };

    if music_channel != Some(msg.channel_id) {
        return;
    }

    let query = match request_query(&msg.content) {
        Some(query) => query,
        None => return,
    };

    if let Err(why) = msg.delete(ctx).await {
        debug!("Failed deleting request message on guild {}: {}", guild_id, why);
    }

    let voice = match util::voice_location(&ctx.cache, guild_id, msg.author.id).user_channel() {
        Some(channel) => channel,
        None => {
            let notice = format!("<@{}> 🎧 Join a voice channel before requesting a song!", msg.author.id);
            util::send_notice(&ctx.http, msg.channel_id, notice, NOTICE_TTL).await;
            return;
        }
    };

    let engine = &services.engine;
    engine.bind_text_channel(guild_id, msg.channel_id);

    if let Err(why) = engine.join(guild_id, voice).await {
        warn!("Failed joining channel {} for a request on guild {}: {}", voice, guild_id, why);
        return;
    }

    let was_idle = engine.sink_status(guild_id).await == SinkStatus::Idle;

    match engine.play(guild_id, query).await {
        Ok(outcome) if !was_idle => {
            let notice = format!("➕ Added to the queue: **{}**", outcome.track.title);
            util::send_notice(&ctx.http, msg.channel_id, notice, QUEUED_TTL).await;
        },
        Ok(_) => (),
        Err(why) => {
            debug!("Request `{}` failed on guild {}: {}", query, guild_id, why);
            util::send_notice(&ctx.http, msg.channel_id, "❌ Couldn't find that song, try another keyword.", NOTICE_TTL).await;
        }
    }
}
