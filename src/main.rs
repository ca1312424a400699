use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use content_organizer::api::{create_app, AppState};
use content_organizer::config::Config;
use content_organizer::db::Repository;
use content_organizer::services::MetadataExtractor;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (info and above unless RUST_LOG says otherwise)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let config = load_config(&args, |key| std::env::var(key).ok())?;

    let db_path = config.database_path();
    let repository = Arc::new(
        Repository::open(&db_path)
            .await
            .with_context(|| format!("Failed to open content store at {}", db_path))?,
    );
    tracing::info!("Opened content store at {}", db_path);

    let extractor = Arc::new(
        MetadataExtractor::new(Duration::from_secs(config.fetch_timeout_secs))
            .context("Failed to build metadata extractor")?,
    );

    let app = create_app(AppState::new(repository.clone(), extractor));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Content organizer listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // The router (and its state clones) are gone once serve returns
    match Arc::try_unwrap(repository) {
        Ok(repository) => repository
            .close()
            .await
            .context("Failed to close content store")?,
        Err(_) => tracing::warn!("Content store still in use at shutdown, leaving it to drop"),
    }
    tracing::info!("Shut down cleanly");

    Ok(())
}

/// Config file (`--config` or the default location), then env overrides, then `--bind`.
fn load_config<F>(args: &[String], env: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let config = match flag_value(args, "--config").map(PathBuf::from) {
        Some(path) => Config::load_from(&path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => Config::load().context("Failed to load config")?,
    };
    let mut config = config
        .with_env_overrides(env)
        .context("Invalid environment configuration")?;
    if let Some(addr) = flag_value(args, "--bind") {
        config.bind_addr = addr;
    }
    Ok(config)
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn bind_flag_wins_over_file_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "bind_addr = \"127.0.0.1:7000\"\n").unwrap();
        let path = path.to_string_lossy().to_string();

        let config = load_config(
            &args(&["content-organizer", "--config", &path, "--bind", "127.0.0.1:9100"]),
            |key: &str| (key == "BIND_ADDR").then(|| "127.0.0.1:8200".to_string()),
        )
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9100");
    }

    #[test]
    fn unreadable_config_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "bind_addr = [not toml").unwrap();
        let path = path.to_string_lossy().to_string();

        let err = load_config(&args(&["content-organizer", "--config", &path]), |_: &str| None)
            .unwrap_err();
        assert!(format!("{}", err).contains("broken.toml"));
        assert!(err.chain().count() >= 2);
    }

    #[test]
    fn bad_env_value_is_reported_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml").to_string_lossy().to_string();

        let err = load_config(&args(&["content-organizer", "--config", &path]), |key: &str| {
            (key == "FETCH_TIMEOUT_SECS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid environment configuration");
    }
}
