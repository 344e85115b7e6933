#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use image::RgbImage;

use bgcut::adapters::display::registry::DisplayRegistry;
use bgcut::application::ports::{CameraPort, LiveStream, RemovalServicePort, StillEncoderPort, TransportError};
use bgcut::application::workflow::{WorkflowController, WorkflowOptions};
use bgcut::domain::{
    camera::{CameraFault, FacingMode, FrameSize},
    errors::{DomainError, DomainResult},
    response::ServiceResponse,
    source::ImageUpload,
};

pub const PNG_BODY: &[u8] = b"\x89PNG\r\n\x1a\nfake";

/// Cámara simulada que cuenta streams vivos y el máximo simultáneo.
#[derive(Default)]
pub struct FakeCamera {
    pub live: Arc<AtomicUsize>,
    pub peak: AtomicUsize,
    pub acquisitions: AtomicUsize,
    pub size: Arc<Mutex<FrameSize>>,
    pub fault: Mutex<Option<CameraFault>>,
    pub facings: Mutex<Vec<FacingMode>>,
    pub stall: AtomicBool,
}

impl FakeCamera {
    pub fn set_size(&self, width: u32, height: u32) {
        *self.size.lock().unwrap() = FrameSize { width, height };
    }

    pub fn deny(&self, fault: CameraFault) {
        *self.fault.lock().unwrap() = Some(fault);
    }

    /// La adquisición queda pendiente para siempre mientras esté activo.
    pub fn stall(&self, stall: bool) {
        self.stall.store(stall, Ordering::SeqCst);
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraPort for FakeCamera {
    async fn acquire(&self, facing: FacingMode) -> Result<Box<dyn LiveStream>, CameraFault> {
        self.facings.lock().unwrap().push(facing);
        if let Some(fault) = self.fault.lock().unwrap().clone() {
            return Err(fault);
        }
        if self.stall.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Ok(Box::new(FakeStream { live: self.live.clone(), size: self.size.clone(), stopped: false }))
    }
}

pub struct FakeStream {
    live: Arc<AtomicUsize>,
    size: Arc<Mutex<FrameSize>>,
    stopped: bool,
}

impl LiveStream for FakeStream {
    fn video_size(&self) -> FrameSize {
        *self.size.lock().unwrap()
    }

    fn snapshot(&self) -> DomainResult<RgbImage> {
        let size = self.video_size();
        Ok(RgbImage::from_pixel(size.width, size.height, image::Rgb([120, 80, 40])))
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Default)]
pub struct FakeEncoder {
    pub fail: Mutex<bool>,
}

#[async_trait]
impl StillEncoderPort for FakeEncoder {
    async fn encode_jpeg(&self, frame: RgbImage, quality: u8) -> DomainResult<Vec<u8>> {
        if *self.fail.lock().unwrap() {
            return Err(DomainError::CaptureFailed("encoder failure".into()));
        }
        let mut jpeg = vec![0xFF, 0xD8, quality];
        jpeg.extend_from_slice(&frame.width().to_be_bytes());
        Ok(jpeg)
    }
}

/// Servicio remoto simulado con respuesta configurable.
pub struct FakeRemover {
    pub calls: AtomicUsize,
    pub uploads: Mutex<Vec<ImageUpload>>,
    pub response: Mutex<Result<ServiceResponse, TransportError>>,
}

impl Default for FakeRemover {
    fn default() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            uploads: Mutex::new(Vec::new()),
            response: Mutex::new(Ok(png_response())),
        }
    }
}

impl FakeRemover {
    pub fn respond(&self, response: Result<ServiceResponse, TransportError>) {
        *self.response.lock().unwrap() = response;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_upload(&self) -> Option<ImageUpload> {
        self.uploads.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl RemovalServicePort for FakeRemover {
    async fn remove_background(&self, upload: ImageUpload) -> Result<ServiceResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.uploads.lock().unwrap().push(upload);
        self.response.lock().unwrap().clone()
    }
}

pub fn png_response() -> ServiceResponse {
    ServiceResponse { status: 200, content_type: Some("image/png".into()), body: Bytes::from_static(PNG_BODY) }
}

pub fn json_response(status: u16, body: &'static str) -> ServiceResponse {
    ServiceResponse { status, content_type: Some("application/json".into()), body: Bytes::from_static(body.as_bytes()) }
}

pub struct Harness {
    pub camera: Arc<FakeCamera>,
    pub encoder: Arc<FakeEncoder>,
    pub remover: Arc<FakeRemover>,
    pub display: Arc<DisplayRegistry>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            camera: Arc::new(FakeCamera::default()),
            encoder: Arc::new(FakeEncoder::default()),
            remover: Arc::new(FakeRemover::default()),
            display: Arc::new(DisplayRegistry::new()),
        }
    }

    pub fn controller(&self) -> WorkflowController {
        WorkflowController::new(
            self.camera.clone(),
            self.encoder.clone(),
            self.remover.clone(),
            self.display.clone(),
            WorkflowOptions::default(),
        )
    }
}
