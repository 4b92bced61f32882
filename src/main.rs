use anyhow::{Context, Result};
use reqwest::Client;
use sharescrawler::{config::Settings, server, store::PgStore, Crawler};
use std::{env, sync::Arc};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let settings = Settings::from_env().context("loading configuration")?;
    info!(
        source = %settings.source_base_url,
        environment = %settings.environment,
        "configuration loaded"
    );

    // ─── 3) service ──────────────────────────────────────────────────
    let store = PgStore::new(&settings.database, settings.is_dev());
    let client = Client::builder()
        .build()
        .context("building HTTP client")?;
    let crawler = Arc::new(Crawler::new(
        client,
        settings.source_base_url.as_str(),
        Arc::new(store),
    ));
    let routes = server::routes(crawler);

    // ─── 4) serve ────────────────────────────────────────────────────
    let addr = ([0, 0, 0, 0], settings.server_port);
    match settings.tls {
        Some(tls) => {
            for path in [&tls.cert_path, &tls.key_path] {
                anyhow::ensure!(path.is_file(), "TLS file {} not found", path.display());
            }
            info!("start HTTPS server on port: {}", settings.server_port);
            warp::serve(routes)
                .tls()
                .cert_path(&tls.cert_path)
                .key_path(&tls.key_path)
                .run(addr)
                .await;
        }
        None => {
            info!("start HTTP server on port: {}", settings.server_port);
            warp::serve(routes).run(addr).await;
        }
    }

    Ok(())
}
