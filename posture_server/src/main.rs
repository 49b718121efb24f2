use anyhow::Context;
use posture_server::{AppState, ServerConfig, router};
use std::sync::Arc;

const DEFAULT_CONFIG_PATH: &str = "posture_server.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = match ServerConfig::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("no usable config at {config_path} ({err}), using defaults");
            ServerConfig::default()
        }
    };

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("creating upload directory {}", config.upload_dir))?;

    let state = Arc::new(AppState::from_config(&config));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    log::info!("posture server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("shutdown signal received, draining connections");
        })
        .await?;

    Ok(())
}
