// src/main.rs
mod billing;
mod database;
mod dtos;
mod error;
mod handlers;
mod matching;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
mod voice;

use axum::{routing::get, Router};
use dotenvy::dotenv;
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::fmt::init as tracing_init;

use services::gemini::GeminiClient;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_init();

    // Load environment variables
    dotenv().ok();

    // Create database pool and bring the schema up to date
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db_pool = database::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");
    database::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations");

    // Voice parsing is optional; the rest of the API works without it
    let voice_parser = GeminiClient::from_env();
    match &voice_parser {
        Some(client) => tracing::info!(model = client.model(), "Voice parser configured"),
        None => tracing::warn!("GEMINI_API_KEY not set, voice parsing disabled"),
    }

    // Create application state
    let app_state = state::AppState::new(db_pool, voice_parser);

    // Build application
    let app = Router::new()
        .route("/", get(|| async { "Shop Billing API" }))
        .route("/health", get(health_check))
        .merge(routes::create_router())
        .layer(axum::middleware::from_fn(middleware::headers::tunnel_bypass))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server with HOST/PORT env and graceful port selection
    let host_str = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let host: IpAddr = host_str
        .parse()
        .unwrap_or_else(|_| "127.0.0.1".parse().unwrap());
    let base_port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3000);

    // Try base_port..base_port+20 to avoid crash when address is in use
    let listener = {
        let mut bound = None;
        for offset in 0u16..=20 {
            let port = base_port.saturating_add(offset);
            let addr = SocketAddr::from((host, port));
            match TcpListener::bind(addr).await {
                Ok(l) => {
                    bound = Some((l, addr));
                    break;
                }
                Err(e) => {
                    if offset == 0 {
                        tracing::warn!(%addr, error=%e, "Port in use, trying next");
                    }
                }
            }
        }
        match bound {
            Some((l, addr)) => {
                tracing::info!("Server running on {}", addr);
                l
            }
            None => {
                tracing::error!(
                    "Failed to bind to any port starting at {} on {}",
                    base_port,
                    host
                );
                return;
            }
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error=%e, "Server error");
    }
}

async fn health_check() -> &'static str {
    "OK"
}
