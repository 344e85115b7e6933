use serde::Serialize;

use crate::domain::{
    camera::{CameraState, FacingMode},
    controls::{Controls, StatusLine},
    source::SourceView,
};

#[derive(Debug, Clone, Serialize)]
pub struct CameraView {
    pub state: CameraState,
    pub facing: FacingMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestView {
    pub state: &'static str,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    pub url: String,
    pub download_url: String,
    pub download_name: String,
    pub mime: String,
    pub size: usize,
}

/// Vista completa del flujo para el panel de control.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSnapshot {
    pub source: SourceView,
    pub camera: CameraView,
    pub request: RequestView,
    pub controls: Controls,
    pub status: StatusLine,
    pub preview_url: Option<String>,
    pub result: Option<ResultView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub state: WorkflowSnapshot,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    pub failed: usize,
}
