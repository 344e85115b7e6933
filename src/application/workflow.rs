use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use crate::application::{
    camera_session::CameraSession,
    dto::{CameraView, RequestView, ResultView, WorkflowSnapshot},
    ports::{CameraPort, DisplayPort, RemovalServicePort, StillEncoderPort, TransportError},
    processing::{ProcessingRequest, RequestState, Submission},
    resource::{DisplaySlot, ResourceHandle},
};
use crate::domain::{
    camera::FacingMode,
    controls::{Controls, StatusLine},
    errors::{DomainError, DomainResult, Rejection},
    response::ServiceResponse,
    source::ImageSource,
};

pub const STATUS_CAMERA_STARTED: &str = "Camera started. Click Capture.";
pub const STATUS_CAPTURED: &str = "Captured! Now click Remove Background.";
pub const STATUS_DONE: &str = "Done";

#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub initial_facing: FacingMode,
    pub jpeg_quality: u8,
    pub download_name: String,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            initial_facing: FacingMode::Front,
            jpeg_quality: crate::application::camera_session::DEFAULT_JPEG_QUALITY,
            download_name: "transparent.png".to_string(),
        }
    }
}

/// Máquina de estados completa: origen de imagen, cámara y petición en curso.
pub struct WorkflowController {
    source: ImageSource,
    camera: CameraSession,
    request: ProcessingRequest,
    preview: DisplaySlot,
    display: Arc<dyn DisplayPort>,
    status: StatusLine,
    download_name: String,
}

impl WorkflowController {
    pub fn new(
        camera: Arc<dyn CameraPort>,
        encoder: Arc<dyn StillEncoderPort>,
        service: Arc<dyn RemovalServicePort>,
        display: Arc<dyn DisplayPort>,
        options: WorkflowOptions,
    ) -> Self {
        Self {
            source: ImageSource::Empty,
            camera: CameraSession::new(camera, encoder, options.initial_facing, options.jpeg_quality),
            request: ProcessingRequest::new(service, Arc::clone(&display)),
            preview: DisplaySlot::default(),
            display,
            status: StatusLine::clear(),
            download_name: options.download_name,
        }
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn camera(&self) -> &CameraSession {
        &self.camera
    }

    pub fn request_state(&self) -> &RequestState {
        self.request.state()
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn controls(&self) -> Controls {
        Controls::derive(!self.source.is_empty(), self.camera.state(), self.request.is_in_flight())
    }

    fn ensure_idle(&mut self) -> DomainResult<()> {
        if self.request.is_in_flight() {
            return Err(self.reject(Rejection::RequestInFlight));
        }
        Ok(())
    }

    fn reject(&mut self, rejection: Rejection) -> DomainError {
        self.fail(rejection.into())
    }

    fn fail(&mut self, err: DomainError) -> DomainError {
        self.status = StatusLine::error(err.to_string());
        err
    }

    /// Selecciona un archivo subido: detiene la cámara y descarta captura y resultado.
    pub fn select_file(&mut self, name: impl Into<String>, bytes: impl Into<Bytes>, mime: impl Into<String>) -> DomainResult<()> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(self.reject(Rejection::EmptyFile));
        }
        let name = name.into();

        self.camera.stop();
        self.preview.clear();
        self.request.reset();
        info!(file = %name, bytes = bytes.len(), "Archivo seleccionado");
        self.source.select_file(name, bytes, mime);
        self.status = StatusLine::clear();
        Ok(())
    }

    pub fn clear_source(&mut self) {
        self.preview.clear();
        self.request.reset();
        self.source.clear();
        self.status = StatusLine::clear();
    }

    /// Arranca la cámara con la orientación actual, limpiando la selección previa.
    pub async fn start_camera(&mut self) -> DomainResult<()> {
        self.ensure_idle()?;
        self.discard_selection();
        let facing = self.camera.facing();
        let started = self.camera.start(facing).await;
        self.camera_started(started)
    }

    pub async fn switch_camera(&mut self) -> DomainResult<()> {
        self.ensure_idle()?;
        if !self.camera.has_session() {
            return Err(self.reject(Rejection::CameraNotStarted));
        }
        self.discard_selection();
        let started = self.camera.switch().await;
        self.camera_started(started)
    }

    fn discard_selection(&mut self) {
        self.status = StatusLine::clear();
        self.request.reset();
        self.preview.clear();
        self.source.clear();
    }

    fn camera_started(&mut self, started: DomainResult<()>) -> DomainResult<()> {
        match started {
            Ok(()) => {
                self.status = StatusLine::info(STATUS_CAMERA_STARTED);
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Captura un frame y lo convierte en el origen activo sin detener la cámara.
    pub async fn capture(&mut self) -> DomainResult<()> {
        self.ensure_idle()?;
        match self.camera.capture().await {
            Ok(blob) => {
                self.request.reset();
                self.preview.show(ResourceHandle::create(blob.clone(), Arc::clone(&self.display)));
                self.source.select_captured_frame(blob);
                self.status = StatusLine::info(STATUS_CAPTURED);
                Ok(())
            }
            Err(err) => {
                if err.is_transient() {
                    warn!("Frame aún no disponible");
                }
                Err(self.fail(err))
            }
        }
    }

    pub fn stop_camera(&mut self) {
        self.camera.stop();
    }

    /// Reserva la petición. La llamada de red se hace fuera del controlador
    /// con `Submission::send` y se resuelve con `finish_submit`.
    pub fn begin_submit(&mut self) -> DomainResult<Submission> {
        match self.request.begin(&self.source) {
            Ok(submission) => {
                self.status = StatusLine::clear();
                Ok(submission)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    pub fn finish_submit(&mut self, id: u64, outcome: Result<ServiceResponse, TransportError>) -> bool {
        let applied = self.request.finish(id, outcome);
        if applied {
            self.refresh_status_from_request();
        }
        applied
    }

    pub async fn submit(&mut self) -> DomainResult<()> {
        let accepted = self.request.submit(&self.source).await;
        if let Err(err) = accepted {
            return Err(self.fail(err));
        }
        self.refresh_status_from_request();
        match self.request.state() {
            RequestState::Failed(err) => Err(err.clone()),
            _ => Ok(()),
        }
    }

    fn refresh_status_from_request(&mut self) {
        self.status = match self.request.state() {
            RequestState::Succeeded(_) => StatusLine::info(STATUS_DONE),
            RequestState::Failed(err) => StatusLine::error(err.to_string()),
            RequestState::Idle | RequestState::InFlight => StatusLine::clear(),
        };
    }

    /// Libera cámara y referencias. Equivale a abandonar la página.
    pub fn teardown(&mut self) {
        self.camera.stop();
        self.preview.clear();
        self.request.reset();
        self.source.clear();
        info!("Flujo de trabajo liberado");
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let result = match self.request.state() {
            RequestState::Succeeded(handle) => handle.reference().map(|reference| ResultView {
                url: reference.url.clone(),
                download_url: format!("{}?download=true", reference.url),
                download_name: self.download_name.clone(),
                mime: handle.blob().mime.clone(),
                size: handle.blob().len(),
            }),
            _ => None,
        };
        let error = match self.request.state() {
            RequestState::Failed(err) => Some(err.to_string()),
            _ => None,
        };

        WorkflowSnapshot {
            source: self.source.view(),
            camera: CameraView { state: self.camera.state(), facing: self.camera.facing() },
            request: RequestView { state: self.request.state().label(), error },
            controls: self.controls(),
            status: self.status.clone(),
            preview_url: self.preview.reference().map(|r| r.url.clone()),
            result,
        }
    }
}

impl Drop for WorkflowController {
    fn drop(&mut self) {
        self.camera.stop();
        self.preview.clear();
    }
}
