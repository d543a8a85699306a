use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use story_gateway::TokenStore;
use story_worker::config::{Config, LogFormat};
use story_worker::handlers;
use story_worker::messages;
use story_worker::probe::ConnectivityProber;
use story_worker::{PageContext, WorkerContext};

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{},actix_web=info", config.log.level).into());

    match config.log.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_thread_names(true)
                    .with_target(true),
            )
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };
    init_tracing(&config);
    info!("Starting story-worker v{}", env!("CARGO_PKG_VERSION"));

    let tokens = match &config.api.token {
        Some(token) => TokenStore::with_token(token.clone()),
        None => TokenStore::new(),
    };

    // Worker context: interception, queue draining, connectivity.
    let worker = Arc::new(WorkerContext::build(&config, tokens.clone()).await?);
    match worker.install().await {
        Ok(report) if report.is_complete() => {
            info!(cached = report.cached.len(), "Application shell installed")
        }
        Ok(report) => warn!(
            cached = report.cached.len(),
            failed = report.failed.len(),
            "Application shell partially installed"
        ),
        Err(e) => error!(error = %e, "Shell install failed, serving from network only"),
    }

    // Page context: submissions, feed, bookmarks.
    let (worker_tx, worker_rx) = messages::channel();
    let page = web::Data::new(PageContext::build(&config, tokens, worker_tx)?);

    let message_loop = {
        let worker = worker.clone();
        tokio::spawn(async move { messages::run(&worker, worker_rx).await })
    };
    let listener = worker.coordinator.spawn_listener();
    let prober = ConnectivityProber::new(
        config.api.base_url.clone(),
        config.worker.probe_interval(),
        vec![worker.connectivity.clone(), page.connectivity.clone()],
    )
    .context("failed to build connectivity prober")?;
    let prober = tokio::spawn(prober.run());

    let worker_data = web::Data::from(worker.clone());
    info!(bind = %config.worker.bind, "Local app API listening");
    let server = HttpServer::new(move || {
        App::new()
            .app_data(page.clone())
            .app_data(worker_data.clone())
            .configure(handlers::configure)
            .default_service(web::to(handlers::proxy::forward))
    })
    .bind(&config.worker.bind)
    .with_context(|| format!("failed to bind {}", config.worker.bind))?
    .run();

    let result = server.await;

    info!("Shutting down");
    prober.abort();
    listener.abort();
    message_loop.abort();
    worker.store.close().await;

    result.context("HTTP server error")
}
