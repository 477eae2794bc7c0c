//! sponsorlens binary.

use sponsorlens::{cli, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let app_env = std::env::var("APP_ENV").ok();
    let default_filter = if cli::is_verbose() || config::is_dev_env(app_env.as_deref()) {
        "sponsorlens=debug"
    } else {
        "sponsorlens=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
