use thiserror::Error;

use super::camera::CameraFault;

/// Motivo por el que una acción del usuario se rechaza antes de tocar el estado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Please upload or capture an image first.")]
    NoImageSelected,
    #[error("A request is already in progress.")]
    RequestInFlight,
    #[error("Camera not started.")]
    CameraNotStarted,
    #[error("The selected file is empty.")]
    EmptyFile,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("{0}")]
    CameraUnavailable(CameraFault),
    #[error("Camera is still loading. Try again.")]
    FrameNotReady,
    #[error("Capture failed: {0}")]
    CaptureFailed(String),
    #[error("Backend error {status}{}", detail.as_ref().map(|d| format!(" - {d}")).unwrap_or_default())]
    Http { status: u16, detail: Option<String> },
    #[error("Backend returned JSON instead of PNG: {0}")]
    UnexpectedJsonResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("{0}")]
    Validation(#[from] Rejection),
}

impl DomainError {
    /// Los errores transitorios permiten reintentar la misma acción de inmediato.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::FrameNotReady)
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
