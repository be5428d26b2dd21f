//! HTTP surface of the quote engine.
//!
//! | Method | Path                        | Body                              |
//! |--------|-----------------------------|-----------------------------------|
//! | POST   | `/shipping/quote`           | `QuoteInput` → `QuoteOutcome`     |
//! | POST   | `/shipping/cache/clear`     | → `{"cleared": true, "entries"}`  |
//! | GET    | `/shipping/tracking/{code}` | → `TrackingInfo`                  |
//! | GET    | `/health`                   | → `{"status": "ok", "version"}`   |
//!
//! Errors are `{"error": "..."}` with 400 for bad input, 500 when no option could be
//! produced, 502/503 for tracking against a failing or unconfigured carrier.

use std::{io, sync::Arc, time::Duration};

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

pub mod error;
pub mod routes;
pub mod state;

use crate::config::Config;
use crate::infra::carrier::CarrierError;
use routes::{clear_cache_handler, health_handler, quote_handler, tracking_handler};
pub use state::State;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build carrier client: {0}")]
    Carrier(#[from] CarrierError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub fn build_router(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/shipping/quote", post(quote_handler))
        .route("/shipping/cache/clear", post(clear_cache_handler))
        .route("/shipping/tracking/{code}", get(tracking_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(config: Config) -> Result<(), ServerError> {
    info!("Initializing state...");
    let state = State::from_config(&config)?;
    spawn_cache_purge(state.clone());
    let app = build_router(state);

    let address = format!("0.0.0.0:{}", config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

/// Expired quotes are otherwise only evicted when the same key is requested again.
fn spawn_cache_purge(state: Arc<State>) {
    let every = state.quotes.cache().ttl();
    if every.is_zero() {
        return;
    }
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = state.quotes.cache().purge_expired();
            if purged > 0 {
                debug!(purged, "purged expired quotes");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        } else {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QuoteInput;

    #[tokio::test(start_paused = true)]
    async fn purge_task_follows_cache_ttl() {
        let config = Config {
            cache_ttl_secs: 60,
            ..Config::default()
        };
        let state = State::from_config(&config).unwrap();
        assert_eq!(state.quotes.cache().ttl(), Duration::from_secs(60));

        state
            .quotes
            .quote(QuoteInput::new("01310-100", 3.0, 250.0))
            .await
            .unwrap();
        assert_eq!(state.quotes.cache().len(), 1);

        spawn_cache_purge(state.clone());
        tokio::time::sleep(Duration::from_secs(121)).await;
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }

        assert!(state.quotes.cache().is_empty());
    }
}
