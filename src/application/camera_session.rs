use std::sync::Arc;

use tracing::{info, warn};

use crate::application::ports::{CameraPort, LiveStream, StillEncoderPort};
use crate::domain::{
    camera::{CameraState, FacingMode},
    errors::{DomainError, DomainResult, Rejection},
    media::{MediaBlob, JPEG_MIME},
};

pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Sesión de cámara: dueña del único stream de hardware activo.
pub struct CameraSession {
    camera: Arc<dyn CameraPort>,
    encoder: Arc<dyn StillEncoderPort>,
    stream: Option<Box<dyn LiveStream>>,
    facing: FacingMode,
    state: CameraState,
    quality: u8,
}

impl CameraSession {
    pub fn new(camera: Arc<dyn CameraPort>, encoder: Arc<dyn StillEncoderPort>, facing: FacingMode, quality: u8) -> Self {
        Self { camera, encoder, stream: None, facing, state: CameraState::Stopped, quality }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn has_session(&self) -> bool {
        self.state != CameraState::Stopped
    }

    /// Arranca la cámara. Cualquier stream anterior se detiene antes de pedir el nuevo.
    pub async fn start(&mut self, facing: FacingMode) -> DomainResult<()> {
        self.stop();
        self.facing = facing;
        let starting = StartingGuard::enter(&mut self.state);

        match self.camera.acquire(facing).await {
            Ok(stream) => {
                self.stream = Some(stream);
                starting.settle(CameraState::Streaming);
                info!(?facing, "Cámara iniciada");
                Ok(())
            }
            Err(fault) => {
                starting.settle(CameraState::Stopped);
                warn!(?facing, %fault, "No se pudo abrir la cámara");
                Err(DomainError::CameraUnavailable(fault))
            }
        }
    }

    /// Alterna la orientación y vuelve a arrancar.
    pub async fn switch(&mut self) -> DomainResult<()> {
        if !self.has_session() {
            return Err(Rejection::CameraNotStarted.into());
        }
        self.start(self.facing.toggled()).await
    }

    /// Codifica el frame actual como JPEG.
    pub async fn capture(&mut self) -> DomainResult<MediaBlob> {
        let frame = {
            let stream = match (&self.stream, self.state) {
                (Some(stream), CameraState::Streaming) => stream,
                _ => return Err(Rejection::CameraNotStarted.into()),
            };
            if stream.video_size().is_empty() {
                return Err(DomainError::FrameNotReady);
            }
            stream.snapshot()?
        };

        let jpeg = self.encoder.encode_jpeg(frame, self.quality).await?;
        if jpeg.is_empty() {
            return Err(DomainError::CaptureFailed("encoder produced no data".into()));
        }
        Ok(MediaBlob::new(jpeg, JPEG_MIME))
    }

    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            info!("Cámara detenida");
        }
        self.state = CameraState::Stopped;
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Mantiene `Starting` solo mientras dura la adquisición: si el futuro se
/// descarta antes de resolverse, la sesión vuelve a `Stopped`.
struct StartingGuard<'a> {
    state: &'a mut CameraState,
}

impl<'a> StartingGuard<'a> {
    fn enter(state: &'a mut CameraState) -> Self {
        *state = CameraState::Starting;
        Self { state }
    }

    fn settle(self, next: CameraState) {
        *self.state = next;
    }
}

impl Drop for StartingGuard<'_> {
    fn drop(&mut self) {
        if *self.state == CameraState::Starting {
            warn!("Arranque de cámara abandonado");
            *self.state = CameraState::Stopped;
        }
    }
}
