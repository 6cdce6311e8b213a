//! TutorHub analytics server binary.

use tracing_subscriber::EnvFilter;
use tutorhub_server::{AnalyticsServer, AppConfig, CONFIG_ENV, LogFormat, load_config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config path: first argument, then $TUTORHUB_CONFIG, else defaults.
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok());
    let config = match &path {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    init_tracing(&config);
    match &path {
        Some(path) => tracing::info!(%path, "Loaded configuration"),
        None => tracing::info!("No configuration file given; using defaults"),
    }

    let server = AnalyticsServer::from_config(config).await?;
    server.run().await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.server.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
