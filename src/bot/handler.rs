use async_trait::async_trait;
use serenity::{
    client::{Context, EventHandler},
    model::{
        application::{Command, Interaction},
        channel::Message,
        gateway::Ready,
        guild::Member,
        voice::VoiceState,
    },
};
use tracing::{info, warn};
use crate::presence::MemberMove;
use super::{commands, controls, music_channel, welcome::{self, WelcomeConfig}, Services};

pub struct Handler;

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Logged in as {} ({})", ready.user.name, ready.user.id);

        match Command::set_global_commands(&ctx.http, commands::definitions()).await {
            Ok(registered) => info!("Registered {} slash commands", registered.len()),
            Err(why) => warn!("Failed registering slash commands: {}", why),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => commands::dispatch(&ctx, &command).await,
            Interaction::Component(component) => controls::handle(&ctx, &component).await,
            _ => (),
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot || msg.guild_id.is_none() {
            return;
        }

        if let Some(services) = Services::get(&ctx).await {
            music_channel::handle_message(&ctx, &services, &msg).await;
        }
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let guild_id = match new.guild_id {
            Some(guild_id) => guild_id,
            None => return,
        };

        let is_bot = new
            .member
            .as_ref()
            .map(|member| member.user.bot)
            .or_else(|| ctx.cache.user(new.user_id).map(|user| user.bot))
            .unwrap_or(false);

        let event = MemberMove {
            guild_id,
            user_id: new.user_id,
            is_bot,
            from: old.and_then(|state| state.channel_id),
            to: new.channel_id,
        };

        if let Some(services) = Services::get(&ctx).await {
            services.presence.member_moved(event).await;
        }
    }

    async fn guild_member_addition(&self, ctx: Context, member: Member) {
        let config = {
            let data = ctx.data.read().await;
            data.get::<WelcomeConfig>().cloned().unwrap_or_default()
        };

        welcome::greet(&ctx, &config, &member).await;
    }
}
