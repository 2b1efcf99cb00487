use std::sync::Arc;

use guildsync_core::{config::Config, store::JsonFileStore};
use guildsync_openai::OpenAiTranslator;

#[tokio::main]
async fn main() -> Result<(), guildsync_core::Error> {
    guildsync_core::logging::init("guildsync")?;

    let cfg = Arc::new(Config::load()?);

    // Fail at startup, not on the first message, when the provider is misconfigured.
    let translator = Arc::new(OpenAiTranslator::new(cfg.translation.clone())?);
    tracing::info!(endpoint = translator.endpoint(), model = %cfg.translation.model, "translation provider ready");

    let store = Arc::new(JsonFileStore::open(cfg.data_file.clone()).await?);

    guildsync_discord::router::run(cfg, store, translator)
        .await
        .map_err(|e| guildsync_core::Error::External(format!("discord bot failed: {e}")))?;

    Ok(())
}
