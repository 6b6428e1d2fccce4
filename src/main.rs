use space_planner::api;
use space_planner::config::AppConfig;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("space_planner=info")),
        )
        .init();

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            warn!(error = %err, "Could not load .env");
        }
    }

    let app_config = AppConfig::from_env();

    info!("Space planner starting");
    if let Err(err) = api::start_api_server(app_config.api, app_config.planner).await {
        error!(error = %err, "API server terminated with an error");
        std::process::exit(1);
    }
}
