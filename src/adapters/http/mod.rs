pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use crate::adapters::http::state::HttpState;

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/api/state", get(routes::get_state))
        .route("/api/source", delete(routes::clear_source))
        .route("/api/source/file", post(routes::select_file))
        .route("/api/camera/start", post(routes::start_camera))
        .route("/api/camera/switch", post(routes::switch_camera))
        .route("/api/camera/capture", post(routes::capture))
        .route("/api/camera/stop", post(routes::stop_camera))
        .route("/api/submit", post(routes::submit))
        .route("/api/blobs/:id", get(routes::get_blob))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
