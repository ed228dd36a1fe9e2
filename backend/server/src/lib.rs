//! Documentation of a crowdfunding campaign platform.
//!
//! Creators publish campaigns with the bank and UPI details they collect money on. Donors browse,
//! pick a campaign and get shown those details once they say how much they want to give. No money
//! moves through this service.
//!
//!
//!
//! # General Infrastructure
//! - One axum server answers every route with the JSON a page renders
//! - Campaigns live in Redis, one flat document per campaign
//! - Sign-in is the identity provider's job, the server only checks the session cookie it signs
//! - Uploaded images and QR codes are held in memory for the life of the process
//!
//!
//!
//! # Routes
//!
//! | Route | Gated | Purpose |
//! |---|---|---|
//! | `GET /` | no | Newest three campaigns |
//! | `GET /explore?category=` | no | Every campaign, filtered by category |
//! | `GET /create-campaign` | yes | Blank campaign form |
//! | `POST /create-campaign` | yes | Submit a campaign draft |
//! | `POST /uploads/image`, `POST /uploads/qr` | yes | Upload a file, get its URL |
//! | `GET /uploads/{id}` | no | Serve an uploaded file |
//! | `GET /donate/{id}?amount=&step=` | no | Donation disclosure flow |
//! | `GET /sign-in`, `GET /sign-up` | no | Forward to the identity provider |
//!
//!
//!
//! # Notes
//!
//! ## No running totals
//! Nothing records what donors actually paid, a campaign only has its target. Totals would need a
//! separate aggregation that does not exist here.
//!
//! ## Uploads are not durable
//! An upload URL dies with the process. Making campaigns durable means uploading to a content store
//! first and writing the campaign second. A failed second step would leave the first one orphaned,
//! and nothing cleans those up today.
//!
//!
//!
//! # Setup
//!
//! Run against a local Redis.
//! ```sh
//! echo dev-secret > /run/secrets/SESSION_SECRET
//! RUST_LOG=info cargo run
//! ```
//!
//! Run without Redis.
//! ```sh
//! SESSION_SECRET=dev-secret STORE_BACKEND=memory RUST_LOG=debug cargo run
//! ```
//!
//! Environment
//! - `RUST_PORT`: listen port, default 1111
//! - `STORE_BACKEND`: `redis` or `memory`, default `redis`
//! - `REDIS_URL`: default `redis://127.0.0.1:6379`
//! - `SIGN_IN_URL`, `SIGN_UP_URL`: identity provider entry points
//! - `SESSION_SECRET`: docker secret or env var, shared with the identity provider
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header::CONTENT_TYPE},
    middleware,
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod donation;
pub mod error;
pub mod fetch;
pub mod form;
pub mod identity;
pub mod listing;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod uploads;
pub mod utils;

use error::AppError;
use identity::{SIGN_IN_PATH, SIGN_UP_PATH, require_session};
use routes::{
    create_handler, donate_handler, explore_handler, featured_handler, form_handler,
    image_upload_handler, qr_upload_handler, sign_in_handler, sign_up_handler,
    upload_file_handler,
};
use state::State;
use uploads::{IMAGE_LIMIT, QR_LIMIT};

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let gated = Router::new()
        .route("/create-campaign", get(form_handler).post(create_handler))
        .route(
            "/uploads/image",
            post(image_upload_handler).layer(DefaultBodyLimit::max(IMAGE_LIMIT)),
        )
        .route(
            "/uploads/qr",
            post(qr_upload_handler).layer(DefaultBodyLimit::max(QR_LIMIT)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/", get(featured_handler))
        .route("/explore", get(explore_handler))
        .route("/donate/{id}", get(donate_handler))
        .route("/uploads/{id}", get(upload_file_handler))
        .route(SIGN_IN_PATH, get(sign_in_handler))
        .route(SIGN_UP_PATH, get(sign_up_handler))
        .merge(gated)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server() -> Result<(), AppError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await?;

    info!("Starting server...");
    let address = format!("0.0.0.0:{}", state.config.port);
    let app = app(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| AppError::InternalError(Box::new(e)))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::InternalError(Box::new(e)))?;

    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
