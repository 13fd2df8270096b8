use serenity::{
    builder::{CreateInteractionResponse, CreateInteractionResponseFollowup, CreateInteractionResponseMessage},
    client::Context,
    model::application::ComponentInteraction,
};
use tracing::{debug, warn};
use crate::notify::{self, AUTOPLAY_BUTTON, LOOP_BUTTON, PAUSE_BUTTON, SKIP_BUTTON, STOP_BUTTON};
use super::{Services, NOT_IN_GUILD};

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

/// Handles a press on one of the "now playing" buttons.
pub async fn handle(ctx: &Context, component: &ComponentInteraction) {
    let guild_id = match component.guild_id {
        Some(guild_id) => guild_id,
        None => {
            let response = CreateInteractionResponseMessage::new().content(NOT_IN_GUILD).ephemeral(true);
            if let Err(why) = component.create_response(ctx, CreateInteractionResponse::Message(response)).await {
                debug!("Failed answering button outside a guild: {}", why);
            }
            return;
        }
    };

    let services = match Services::get(ctx).await {
        Some(services) => services,
        None => return,
    };
    let engine = &services.engine;

    let id = component.data.custom_id.as_str();

    let feedback = match id {
        PAUSE_BUTTON => {
            let result = match engine.pause(guild_id).await {
                Ok(true) => Ok(true),
                Ok(false) => engine.resume(guild_id).await,
                Err(why) => Err(why),
            };
            if let Err(why) = result {
                warn!("Pause button failed on guild {}: {}", guild_id, why);
            }
            None
        },
        SKIP_BUTTON => match engine.skip(guild_id).await {
            Ok(true) => Some("⏭️ Skipped.".to_string()),
            Ok(false) => Some("Nothing is playing.".to_string()),
            Err(why) => Some(format!("❌ {}", why)),
        },
        LOOP_BUTTON => Some(format!("🔁 Loop is {}.", on_off(engine.toggle_loop(guild_id)))),
        AUTOPLAY_BUTTON => Some(format!("🎲 Autoplay is {}.", on_off(engine.toggle_autoplay(guild_id)))),
        STOP_BUTTON => match engine.stop(guild_id).await {
            Ok(()) => Some("⏹️ Stopped and left voice.".to_string()),
            Err(why) => Some(format!("❌ {}", why)),
        },
        other => {
            debug!("Ignoring unknown button `{}`", other);
            return;
        }
    };

    let components = if id == STOP_BUTTON {
        Vec::new()
    } else {
        notify::controls(engine.controls_state(guild_id).await)
    };

    let update = CreateInteractionResponseMessage::new().components(components);

    if let Err(why) = component.create_response(ctx, CreateInteractionResponse::UpdateMessage(update)).await {
        warn!("Failed updating controls on guild {}: {}", guild_id, why);
        return;
    }

    if let Some(content) = feedback {
        let followup = CreateInteractionResponseFollowup::new().content(content).ephemeral(true);

        if let Err(why) = component.create_followup(ctx, followup).await {
            debug!("Failed sending button feedback on guild {}: {}", guild_id, why);
        }
    }
}
