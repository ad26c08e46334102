//! # Yatube Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::middleware::{NormalizePath, TrailingSlash};
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::{TelemetryConfig, init_telemetry};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();
    let bind = (config.host.clone(), config.port);

    tracing::info!("Starting Yatube server on {}:{}", bind.0, bind.1);

    let state = AppState::new(config).await?;

    HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::new(TrailingSlash::Always))
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
            .default_service(web::to(handlers::not_found))
    })
    .bind(bind.clone())
    .with_context(|| format!("failed to bind {}:{}", bind.0, bind.1))?
    .run()
    .await?;

    Ok(())
}
