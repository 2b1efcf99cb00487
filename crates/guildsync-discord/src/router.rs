use std::sync::Arc;

use serenity::{http::Http, Client};

use guildsync_core::messaging::throttled::{ThrottleConfig, ThrottledPlatform};
use guildsync_core::{
    commands::CommandService,
    config::Config,
    domain::UserId,
    messaging::port::RelayPlatform,
    ports::{SyncStore, Translator},
    reaction::ReactionTranslator,
    relay::{IdentityCache, Relay},
};

use crate::handlers::Handler;
use crate::DiscordPlatform;

pub struct AppState {
    pub relay: Relay,
    pub commands: CommandService,
    /// `None` when flag-reaction translation is disabled.
    pub reactions: Option<ReactionTranslator>,
}

pub async fn run(
    cfg: Arc<Config>,
    store: Arc<dyn SyncStore>,
    translator: Arc<dyn Translator>,
) -> anyhow::Result<()> {
    let http = Arc::new(Http::new(&cfg.discord_token));
    let me = http.get_current_user().await?;
    tracing::info!(bot = %me.name, id = %me.id, "guildsync started");
    tracing::info!(
        data_file = %cfg.data_file.display(),
        prefix = %cfg.command_prefix,
        reactions = cfg.reaction_translation,
        "configuration loaded"
    );

    // Fan-out bursts hit many channels at once; serenity still handles 429s underneath.
    let raw_platform: Arc<dyn RelayPlatform> = Arc::new(DiscordPlatform::new(
        http.clone(),
        me.id,
        cfg.webhook_name.clone(),
    ));
    let platform: Arc<dyn RelayPlatform> = Arc::new(ThrottledPlatform::new(
        raw_platform,
        ThrottleConfig {
            per_channel_min_interval: cfg.channel_min_interval,
            ..ThrottleConfig::default()
        },
    ));

    let relay = Relay::new(
        UserId(me.id.get()),
        store.clone(),
        translator.clone(),
        platform.clone(),
        Arc::new(IdentityCache::new()),
    )
    .relay_bot_messages(cfg.relay_bot_messages);

    let state = Arc::new(AppState {
        relay,
        commands: CommandService::new(store, cfg.command_prefix.clone()),
        reactions: cfg
            .reaction_translation
            .then(|| ReactionTranslator::new(translator, platform)),
    });

    let mut client = Client::builder(&cfg.discord_token, Handler::intents())
        .event_handler(Handler::new(state))
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutting down");
            shard_manager.shutdown_all().await;
        }
    });

    client.start().await?;
    Ok(())
}
