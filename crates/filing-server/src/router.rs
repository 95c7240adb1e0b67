//! Router construction for the filing server.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::{Extension, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Multipart framing overhead allowed on top of the configured file limit;
/// oversize files themselves are rejected by the upload handler.
const UPLOAD_BODY_HEADROOM: usize = 1024 * 1024;

/// Build the full axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.settings.max_upload_bytes + UPLOAD_BODY_HEADROOM;

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/v1/periods", get(handlers::periods::list_periods))
        .route(
            "/v1/institutions/:lei/filings/:period",
            post(handlers::filings::create_filing).get(handlers::filings::get_filing),
        )
        .route(
            "/v1/institutions/:lei/filings/:period/institution-snapshot-id",
            put(handlers::filings::put_institution_snapshot_id),
        )
        .route(
            "/v1/institutions/:lei/filings/:period/contact-info",
            get(handlers::filings::get_contact_info).put(handlers::filings::put_contact_info),
        )
        .route(
            "/v1/institutions/:lei/filings/:period/is-voluntary",
            put(handlers::filings::put_is_voluntary),
        )
        .route(
            "/v1/institutions/:lei/filings/:period/sign",
            put(handlers::filings::sign_filing),
        )
        .route(
            "/v1/institutions/:lei/filings/:period/submissions",
            post(handlers::submissions::upload_submission)
                .get(handlers::submissions::list_submissions),
        )
        .route(
            "/v1/institutions/:lei/filings/:period/submissions/latest",
            get(handlers::submissions::latest_submission),
        )
        .route(
            "/v1/institutions/:lei/filings/:period/submissions/latest/report",
            get(handlers::submissions::download_latest_report),
        )
        .route(
            "/v1/institutions/:lei/filings/:period/submissions/:id",
            get(handlers::submissions::get_submission),
        )
        .route(
            "/v1/institutions/:lei/filings/:period/submissions/:id/accept",
            post(handlers::submissions::accept_submission),
        )
        .route(
            "/v1/institutions/:lei/filings/:period/submissions/:id/report",
            get(handlers::submissions::download_report),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(state))
}
