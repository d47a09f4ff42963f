//! tasknag bot binary.

use tasknag::BotConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides; quiet the HTTP stack by default.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tasknag=info,reqwest=warn,hyper=warn")),
        )
        .init();

    let config = BotConfig::from_env()?;
    if config.telegram.bot_token.trim().is_empty() {
        anyhow::bail!("BOT_TOKEN is not set");
    }

    tasknag::runtime::serve(config).await
}
