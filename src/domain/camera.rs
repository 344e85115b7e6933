// src/domain/camera.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Preferencia de orientación de la cámara. El hardware puede ignorarla.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    #[default]
    Front,
    Back,
}

impl FacingMode {
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::Front => FacingMode::Back,
            FacingMode::Back => FacingMode::Front,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    /// Un vídeo sin dimensiones todavía no ha entregado ningún frame.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CameraState {
    #[default]
    Stopped,
    Starting,
    Streaming,
}

/// Causa por la que no se pudo adquirir el stream de vídeo.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraFault {
    #[error("Camera not available. Allow camera permission and try again.")]
    PermissionDenied,
    #[error("Camera not available. Camera access needs a secure context (HTTPS or localhost).")]
    InsecureContext,
    #[error("Camera not available: {0}")]
    NotAvailable(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraMode {
    pub format: String,
    pub size: FrameSize,
    pub fps: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_twice_returns_to_the_same_mode() {
        assert_eq!(FacingMode::Front.toggled(), FacingMode::Back);
        assert_eq!(FacingMode::Front.toggled().toggled(), FacingMode::Front);
    }

    #[test]
    fn zero_dimension_means_not_ready() {
        assert!(FrameSize::default().is_empty());
        assert!(FrameSize { width: 640, height: 0 }.is_empty());
        assert!(!FrameSize { width: 640, height: 480 }.is_empty());
    }
}
