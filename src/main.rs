use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use wikismith::config::{self, Settings};
use wikismith::pipeline;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() {
    init_tracing();

    match config::ensure_env_template().await {
        Ok(true) => info!("created default {} configuration file", config::ENV_TEMPLATE_FILE),
        Ok(false) => {}
        Err(err) => warn!(error = %err, "could not create {}", config::ENV_TEMPLATE_FILE),
    }

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    info!(topic = %settings.topic, "starting wikipedia RAG pipeline");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted by user, shutting down");
        }
        result = pipeline::run(&settings) => match result {
            Ok(()) => info!("pipeline completed"),
            Err(err) => {
                error!(error = %err, "pipeline failed");
                std::process::exit(1);
            }
        },
    }
}
