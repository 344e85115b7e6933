use serde::Serialize;

use super::camera::CameraState;

/// Acciones habilitadas en la interfaz, derivadas solo del estado actual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub submit: bool,
    pub start_camera: bool,
    pub switch_camera: bool,
    pub capture: bool,
}

impl Controls {
    pub fn derive(has_source: bool, camera: CameraState, in_flight: bool) -> Self {
        let streaming = camera == CameraState::Streaming;
        Self {
            submit: has_source && !in_flight,
            start_camera: !in_flight,
            switch_camera: streaming && !in_flight,
            capture: streaming && !in_flight,
        }
    }
}

/// Texto de estado visible para el usuario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

impl StatusLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: false }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: true }
    }

    pub fn clear() -> Self {
        Self::default()
    }
}
