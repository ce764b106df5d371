//! Documentation of the Posta-AI backend.
//!
//! Server-rendered social/blogging platform: profiles with autosaved fields,
//! community posts with images, and contribution dashboards.
//!
//!
//!
//! # General Infrastructure
//! - Users reach the public endpoint through the reverse proxy
//! - The proxy terminates the session: it verifies the auth cookie and
//!   forwards the verified identity as the `X-user-id` header
//! - Anything behind `/api` that acts on behalf of a user requires that
//!   header; the proxy strips it from inbound traffic so it cannot be forged
//! - The backend and Redis run on the same machine and talk over the
//!   internal network, so the extra hop is magnitudes smaller than the user
//!   trip
//!
//!
//!
//! # Field autosave
//!
//! Profile editing is one-field-at-a-time. The frontend debounces keystrokes
//! (800 ms quiet window) and POSTs `/api/updateBio` with
//! `{ userId, valor, campo, tabela }`. The handler validates the target
//! against a static whitelist, coerces the value to the field's type, and
//! writes that single field — creating the record on first write.
//!
//! One caveat carried over from the previous iteration: `/api/updateBio`
//! takes the `userId` from the request body instead of the proxy header, so
//! the proxy-side ownership check is the only one standing.
//!
//!
//!
//! # Notes
//!
//! ## Redis
//! Everything lives in Redis: record hashes for user/perfil/pessoal fields,
//! JSON documents plus sorted-set indexes for posts and finances. Lookups
//! are O(1) by key; listing walks a time-scored index. Eventual consistency
//! between two sessions editing the same record is acceptable — last write
//! wins, and the usage pattern is single-editor-per-record.
//!
//!
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
use std::time::Duration;

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod fields;
pub mod finances;
pub mod posts;
pub mod routes;
pub mod state;
pub mod store;
pub mod upload;

use routes::{
    create_finance_handler, create_post_handler, delete_post_handler, get_post_handler,
    list_finances_handler, list_posts_handler, update_bio_handler, update_post_handler,
    upload_media_handler,
};
use state::State;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await;

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/api/updateBio", post(update_bio_handler))
        .route(
            "/api/posts",
            get(list_posts_handler).post(create_post_handler),
        )
        .route(
            "/api/posts/{id}",
            get(get_post_handler)
                .put(update_post_handler)
                .delete(delete_post_handler),
        )
        .route(
            "/api/finances",
            get(list_finances_handler).post(create_finance_handler),
        )
        .route("/api/upload", post(upload_media_handler))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
