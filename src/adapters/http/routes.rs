use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::adapters::http::state::HttpState;
use crate::application::dto::ErrorResponse;
use crate::application::workflow::WorkflowController;
use crate::domain::{
    errors::{DomainError, DomainResult, Rejection},
    media::JPEG_MIME,
    source::{CAPTURE_FILE_NAME, UPLOAD_FIELD},
};

fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_) | DomainError::FrameNotReady => StatusCode::CONFLICT,
        DomainError::CameraUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        DomainError::CaptureFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        DomainError::Http { .. } | DomainError::UnexpectedJsonResponse(_) | DomainError::Network(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

/// Respuesta común: la instantánea del flujo, con el error si lo hubo.
fn reply(result: DomainResult<()>, ctrl: &WorkflowController) -> Response {
    match result {
        Ok(()) => Json(ctrl.snapshot()).into_response(),
        Err(err) => {
            let body = ErrorResponse { error: err.to_string(), state: ctrl.snapshot() };
            (status_for(&err), Json(body)).into_response()
        }
    }
}

pub async fn get_state(State(st): State<HttpState>) -> impl IntoResponse {
    Json(st.workflow.lock().await.snapshot())
}

pub async fn select_file(State(st): State<HttpState>, mut multipart: Multipart) -> Response {
    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(UPLOAD_FIELD) => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let mime = field.content_type().unwrap_or("application/octet-stream").to_string();
                match field.bytes().await {
                    Ok(bytes) => upload = Some((name, bytes, mime)),
                    Err(e) => return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response(),
                }
                break;
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response(),
        }
    }

    let mut ctrl = st.workflow.lock().await;
    let result = match upload {
        Some((name, bytes, mime)) => ctrl.select_file(name, bytes, mime),
        None => Err(Rejection::NoImageSelected.into()),
    };
    reply(result, &ctrl)
}

pub async fn clear_source(State(st): State<HttpState>) -> Response {
    let mut ctrl = st.workflow.lock().await;
    ctrl.clear_source();
    reply(Ok(()), &ctrl)
}

pub async fn start_camera(State(st): State<HttpState>) -> Response {
    let mut ctrl = st.workflow.lock().await;
    let result = ctrl.start_camera().await;
    reply(result, &ctrl)
}

pub async fn switch_camera(State(st): State<HttpState>) -> Response {
    let mut ctrl = st.workflow.lock().await;
    let result = ctrl.switch_camera().await;
    reply(result, &ctrl)
}

pub async fn capture(State(st): State<HttpState>) -> Response {
    let mut ctrl = st.workflow.lock().await;
    let result = ctrl.capture().await;
    reply(result, &ctrl)
}

pub async fn stop_camera(State(st): State<HttpState>) -> Response {
    let mut ctrl = st.workflow.lock().await;
    ctrl.stop_camera();
    reply(Ok(()), &ctrl)
}

/// Reserva la petición bajo el mutex y la completa en segundo plano, de modo
/// que un segundo envío se rechaza en lugar de quedar en cola.
pub async fn submit(State(st): State<HttpState>) -> Response {
    let mut ctrl = st.workflow.lock().await;
    let submission = match ctrl.begin_submit() {
        Ok(submission) => submission,
        Err(err) => return reply(Err(err), &ctrl),
    };
    let snapshot = ctrl.snapshot();
    drop(ctrl);

    let workflow = st.workflow.clone();
    tokio::spawn(async move {
        let (id, outcome) = submission.send().await;
        if !workflow.lock().await.finish_submit(id, outcome) {
            info!(id, "Resultado de una petición descartada");
        }
    });

    (StatusCode::ACCEPTED, Json(snapshot)).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct BlobQuery {
    #[serde(default)]
    download: bool,
}

pub async fn get_blob(State(st): State<HttpState>, Path(id): Path<Uuid>, Query(query): Query<BlobQuery>) -> Response {
    let Some(blob) = st.display.fetch(id) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "reference revoked or unknown" }))).into_response();
    };

    let mut headers = HeaderMap::new();
    let content_type = HeaderValue::from_str(&blob.mime)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    headers.insert(header::CONTENT_TYPE, content_type);

    if query.download {
        let name = if blob.mime == JPEG_MIME { CAPTURE_FILE_NAME } else { st.download_name.as_str() };
        match HeaderValue::from_str(&format!("attachment; filename=\"{name}\"")) {
            Ok(value) => {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            Err(e) => warn!("Nombre de descarga inválido {}: {}", name, e),
        }
    }

    (headers, blob.bytes).into_response()
}
