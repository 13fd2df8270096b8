use std::sync::Arc;
use riffbot::{
    bot::{welcome::WelcomeConfig, Handler},
    config::Settings,
    engine::PlaybackEngine,
    notify::ChannelReporter,
    presence::PresenceController,
    resolver::YtDlpResolver,
    sink::SongbirdSink,
    store::Store,
    util::CacheRoster,
};
use serenity::{client::Client, model::gateway::GatewayIntents};
use songbird::{SerenityInit, Songbird};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env()?;

    let store = Store::connect(&settings.database_url).await?;

    let manager = Songbird::serenity();

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&settings.discord_token, intents)
        .event_handler(Handler)
        .register_songbird_with(Arc::clone(&manager))
        .await?;

    let reporter = ChannelReporter::new(Arc::clone(&client.http), Arc::clone(&client.cache));

    let mut builder = PlaybackEngine::builder(
        Arc::new(SongbirdSink::new(manager)),
        Arc::new(store.clone()),
        Arc::new(reporter),
    );
    builder
        .set_resolver(Arc::new(YtDlpResolver::new(&settings.ytdlp_path)))
        .set_radio_batch(settings.radio_batch);

    let engine = builder.build();

    let presence = PresenceController::new(Arc::clone(&engine), Arc::new(CacheRoster::new(Arc::clone(&client.cache))))
        .with_debounce(settings.join_debounce)
        .with_scope(settings.auto_vc_guild);

    {
        let mut data = client.data.write().await;
        data.insert::<PlaybackEngine>(engine);
        data.insert::<PresenceController>(Arc::new(presence));
        data.insert::<Store>(store);
        data.insert::<WelcomeConfig>(WelcomeConfig {
            channel: settings.welcome_channel,
            image_url: settings.welcome_image_url,
        });
    }

    info!("Starting gateway client");
    client.start().await?;

    Ok(())
}
