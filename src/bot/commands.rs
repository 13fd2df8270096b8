use serenity::{
    builder::{CreateCommand, CreateCommandOption, CreateEmbed, CreateEmbedFooter},
    client::Context,
    model::{
        application::{CommandInteraction, CommandOptionType},
        channel::ChannelType,
        id::{ChannelId, GuildId},
    },
};
use tracing::{debug, warn};
use crate::{error::MusicError, model::player::QueueSnapshot};
use super::{checkin, join_caller, music_channel, Reply, Services, JOIN_VOICE_FIRST, NOT_IN_GUILD};

const RADIO_PAGE: usize = 15;
const HELP_COLOUR: u32 = 0x5865F2;

fn string_option(command: &CommandInteraction, name: &str) -> Option<String> {
    command
        .data
        .options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| option.value.as_str())
        .map(|value| value.to_string())
}

fn channel_option(command: &CommandInteraction, name: &str) -> Option<ChannelId> {
    command
        .data
        .options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| option.value.as_channel_id())
}

fn simple(name: &str, description: &str) -> CreateCommand {
    CreateCommand::new(name).description(description)
}

fn with_query(name: &str, description: &str) -> CreateCommand {
    simple(name, description).add_option(
        CreateCommandOption::new(CommandOptionType::String, "query", "YouTube keyword or URL").required(true),
    )
}

/// Every global slash command the bot registers on ready.
pub fn definitions() -> Vec<CreateCommand> {
    vec![
        simple("setup", "Set the music request channel (type song names there to play)").add_option(
            CreateCommandOption::new(CommandOptionType::Channel, "channel", "The music request channel")
                .channel_types(vec![ChannelType::Text])
                .required(true),
        ),
        simple("checkin", "Daily check-in, once per day"),
        simple("leaderboard", "Top 3 check-ins this month"),
        with_query("play", "Play music from a YouTube keyword or URL"),
        simple("queue", "View the queue"),
        simple("pause", "Pause playback"),
        simple("resume", "Resume playback"),
        simple("skip", "Skip the current track"),
        simple("loop", "Toggle looping the current track"),
        simple("autoplay", "Toggle playing related tracks when the queue runs out"),
        simple("clear", "Clear the queue"),
        simple("stop", "Stop playback and leave voice"),
        simple("24_7", "Keep playing even when the voice channel is empty").add_option(
            CreateCommandOption::new(CommandOptionType::String, "mode", "on / off").required(true),
        ),
        with_query("radio_add", "Add a keyword or URL to the radio list"),
        simple("radio_list", "View the radio list"),
        simple("radio_clear", "Clear the radio list"),
        simple("help", "Show help"),
    ]
}

/// Replies only the caller should see.
fn is_ephemeral(name: &str) -> bool {
    matches!(name, "checkin" | "radio_list" | "radio_clear" | "help")
}

/// Parses the `/24_7` mode argument.
pub fn parse_toggle(mode: &str) -> Option<bool> {
    match mode.trim().to_lowercase().as_str() {
        "on" | "true" | "1" | "開" | "開啟" => Some(true),
        "off" | "false" | "0" | "關" | "關閉" => Some(false),
        _ => None,
    }
}

pub fn format_queue(snapshot: &QueueSnapshot) -> Option<String> {
    if snapshot.is_empty() {
        return None;
    }

    let mut lines = snapshot
        .head
        .iter()
        .enumerate()
        .map(|(i, track)| format!("{}. {}", i + 1, track.title))
        .collect::<Vec<_>>();

    if snapshot.overflow > 0 {
        lines.push(format!("... and {} more", snapshot.overflow));
    }

    Some(format!("🎶 Queue:\n{}", lines.join("\n")))
}

pub fn format_radio(list: &[String]) -> Option<String> {
    if list.is_empty() {
        return None;
    }

    let mut lines = list
        .iter()
        .take(RADIO_PAGE)
        .enumerate()
        .map(|(i, query)| format!("{}. {}", i + 1, query))
        .collect::<Vec<_>>();

    if list.len() > RADIO_PAGE {
        lines.push(format!("... and {} more", list.len() - RADIO_PAGE));
    }

    Some(format!("📻 Radio list:\n{}", lines.join("\n")))
}

fn help_embed() -> CreateEmbed {
    CreateEmbed::new()
        .title("🤖 Help")
        .description("Daily check-in, leaderboard, music playback, auto radio and 24/7 mode")
        .colour(HELP_COLOUR)
        .field(
            "🎵 Music channel",
            "`/setup <channel>` picks the request channel\nThen type a song name or URL there to play it",
            false,
        )
        .field(
            "🎵 Playback",
            "`/play <keyword or URL>`\n`/queue` `/skip` `/clear` `/stop`\n`/pause` `/resume`\n`/loop` `/autoplay`",
            false,
        )
        .field("📻 Radio", "`/radio_add` `/radio_list` `/radio_clear`", false)
        .field("♾️ 24/7 & check-in", "`/24_7 on/off` `/checkin` `/leaderboard`", false)
        .footer(CreateEmbedFooter::new("Now playing messages carry ⏸️ ⏭️ 🔁 🎲 ⏹️ controls"))
}

fn failure(guild_id: GuildId, why: MusicError) -> Reply {
    warn!("Command failed on guild {}: {}", guild_id, why);
    Reply::text(format!("❌ {}", why))
}

/// Answers a slash command. Every command is deferred first since most of them touch voice or the database.
pub async fn dispatch(ctx: &Context, command: &CommandInteraction) {
    let name = command.data.name.as_str();

    let deferred = if is_ephemeral(name) {
        command.defer_ephemeral(ctx).await
    } else {
        command.defer(ctx).await
    };

    if let Err(why) = deferred {
        warn!("Failed deferring /{}: {}", name, why);
        return;
    }

    let reply = match Services::get(ctx).await {
        Some(services) => run(ctx, &services, command).await,
        None => Reply::text("❌ The bot is still starting up, try again in a moment."),
    };

    if let Err(why) = command.edit_response(ctx, reply.into_edit()).await {
        warn!("Failed answering /{}: {}", name, why);
    }
}

async fn run(ctx: &Context, services: &Services, command: &CommandInteraction) -> Reply {
    let name = command.data.name.as_str();

    if name == "help" {
        return Reply::Embed(help_embed());
    }

    let guild_id = match command.guild_id {
        Some(guild_id) => guild_id,
        None => return Reply::text(NOT_IN_GUILD),
    };

    debug!("/{} from {} on guild {}", name, command.user.id, guild_id);

    let engine = &services.engine;

    match name {
        "setup" => match channel_option(command, "channel") {
            Some(channel) => music_channel::setup(services, guild_id, channel).await,
            None => Reply::text("Pick a text channel."),
        },
        "checkin" => checkin::checkin(&services.store, guild_id, command.user.id).await,
        "leaderboard" => checkin::leaderboard(&services.store, guild_id).await,
        "play" => play(ctx, services, command, guild_id).await,
        "queue" => Reply::text(format_queue(&engine.queue_list(guild_id)).unwrap_or_else(|| "The queue is empty.".to_string())),
        "pause" => match engine.pause(guild_id).await {
            Ok(true) => Reply::text("⏸️ Paused."),
            Ok(false) => Reply::text("Nothing is playing."),
            Err(why) => failure(guild_id, why),
        },
        "resume" => match engine.resume(guild_id).await {
            Ok(true) => Reply::text("▶️ Resumed."),
            Ok(false) => Reply::text("Nothing is paused."),
            Err(why) => failure(guild_id, why),
        },
        "skip" => match engine.skip(guild_id).await {
            Ok(true) => Reply::text("⏭️ Skipped."),
            Ok(false) => Reply::text("Nothing is playing."),
            Err(why) => failure(guild_id, why),
        },
        "loop" => if engine.toggle_loop(guild_id) {
            Reply::text("🔁 Loop is on.")
        } else {
            Reply::text("🔁 Loop is off.")
        },
        "autoplay" => if engine.toggle_autoplay(guild_id) {
            Reply::text("✅ Autoplay is on, related tracks play when the queue runs out.")
        } else {
            Reply::text("❌ Autoplay is off.")
        },
        "clear" => {
            engine.clear(guild_id);
            Reply::text("🧹 Queue cleared.")
        },
        "stop" => match engine.stop(guild_id).await {
            Ok(()) => Reply::text("⏹️ Stopped and left voice."),
            Err(why) => failure(guild_id, why),
        },
        "24_7" => always_on(ctx, services, command, guild_id).await,
        "radio_add" => radio_add(ctx, services, command, guild_id).await,
        "radio_list" => match engine.radio_list(guild_id).await {
            Ok(list) => Reply::text(format_radio(&list).unwrap_or_else(|| "The radio list is empty, add some with `/radio_add`.".to_string())),
            Err(why) => failure(guild_id, why),
        },
        "radio_clear" => match engine.radio_clear(guild_id).await {
            Ok(()) => Reply::text("🧹 Radio list cleared."),
            Err(why) => failure(guild_id, why),
        },
        other => {
            warn!("Received unknown command /{}", other);
            Reply::text("Unknown command.")
        }
    }
}

async fn play(ctx: &Context, services: &Services, command: &CommandInteraction, guild_id: GuildId) -> Reply {
    let engine = &services.engine;

    let query = match string_option(command, "query") {
        Some(query) => query,
        None => return Reply::text("Tell me what to play."),
    };

    engine.bind_text_channel(guild_id, command.channel_id);

    match join_caller(ctx, engine, guild_id, command.user.id).await {
        Ok(Some(_)) => (),
        Ok(None) => return Reply::text(JOIN_VOICE_FIRST),
        Err(why) => return failure(guild_id, why),
    }

    match engine.play(guild_id, &query).await {
        Ok(outcome) => Reply::text(format!("➕ Added to the queue: **{}**", outcome.track.title)),
        Err(why) if why.is_resolution() => Reply::text("❌ Couldn't play that, try another keyword or URL."),
        Err(why) => failure(guild_id, why),
    }
}

async fn always_on(ctx: &Context, services: &Services, command: &CommandInteraction, guild_id: GuildId) -> Reply {
    let engine = &services.engine;

    let on = match string_option(command, "mode").as_deref().and_then(parse_toggle) {
        Some(on) => on,
        None => return Reply::text("Use `on` or `off`."),
    };

    engine.set_always_on(guild_id, on);

    if !on {
        return Reply::text("✅ 24/7 is off, I'll leave when the voice channel empties.");
    }

    engine.bind_text_channel(guild_id, command.channel_id);

    if let Err(why) = join_caller(ctx, engine, guild_id, command.user.id).await {
        debug!("24/7 could not join the caller on guild {}: {}", guild_id, why);
    }

    engine.start_if_idle(guild_id).await;

    Reply::text("✅ 24/7 is on, I'll keep playing even when nobody is listening.")
}

async fn radio_add(ctx: &Context, services: &Services, command: &CommandInteraction, guild_id: GuildId) -> Reply {
    let engine = &services.engine;

    let query = match string_option(command, "query") {
        Some(query) => query,
        None => return Reply::text("Tell me what to add."),
    };

    if let Err(why) = engine.radio_add(guild_id, &query).await {
        return failure(guild_id, why);
    }

    engine.bind_text_channel(guild_id, command.channel_id);

    match join_caller(ctx, engine, guild_id, command.user.id).await {
        Ok(Some(_)) => engine.start_if_idle(guild_id).await,
        Ok(None) => (),
        Err(why) => debug!("Radio add could not join the caller on guild {}: {}", guild_id, why),
    }

    Reply::text(format!("✅ Added to the radio list: `{}`", query))
}
