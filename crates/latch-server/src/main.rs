//! Main entry point for the Latch daemon.
//!
//! Wires the lock engine, the expiry sweeper, and the HTTP server together.

use std::time::Duration;

use actix_web::{App, HttpServer, web};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use latch_core::{LockEngine, Sweeper};
use latch_server::{api, auth::AdminPolicy, config::ServerConfig};

/// Console logging; `RUST_LOG` overrides the default `info` level.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(filter),
        )
        .init();
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let config = ServerConfig::parse();
    let policy = AdminPolicy::from_option(&config.admin_userpass_file)?;

    let engine = LockEngine::new();
    tokio::spawn(
        Sweeper::new(
            engine.clone(),
            Duration::from_secs(config.sweep_interval_secs),
        )
        .run(),
    );

    let engine_data = web::Data::new(engine);
    let policy_data = web::Data::new(policy);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(engine_data.clone())
            .app_data(policy_data.clone())
            .service(api::routes())
    })
    .bind((config.bind.as_str(), config.port))?;

    info!(bind = %config.bind, port = config.port, "latch daemon is ready");
    server.run().await?;
    Ok(())
}
