use std::path::Path;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::{metrics::encode_metrics, types::Health};
use service::file::object_store::PUBLIC_MOUNT;

use crate::views;

pub mod auth;
pub mod console;

pub use auth::ServerState;

/// Request body cap; image uploads are the largest bodies.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics() -> Response {
    match encode_metrics() {
        Ok(body) => ([(CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e).into_response(),
    }
}

pub async fn home() -> Html<String> {
    Html(views::home_page())
}

/// Build the application router: public pages, the session-gated console,
/// static assets and, for the local backend, the object directory.
pub fn build_router(state: ServerState, assets_dir: &str, object_dir: Option<&Path>) -> Router {
    let admin = Router::new()
        .route("/admin", get(console::index))
        .route("/admin/:collection", get(console::list).post(console::create))
        .route("/admin/:collection/new", get(console::new_form))
        .route("/admin/:collection/:id", post(console::update))
        .route("/admin/:collection/:id/edit", get(console::edit_form))
        .route("/admin/:collection/:id/delete", get(console::confirm_delete).post(console::delete))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_session));

    let public = Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout));

    let mut app = public
        .merge(admin)
        .with_state(state)
        .nest_service("/assets", ServeDir::new(assets_dir));
    if let Some(dir) = object_dir {
        app = app.nest_service(PUBLIC_MOUNT, ServeDir::new(dir));
    }

    app.layer(DefaultBodyLimit::max(MAX_BODY_BYTES)).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
            .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
    )
}
