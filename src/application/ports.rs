use async_trait::async_trait;
use image::RgbImage;
use uuid::Uuid;

use crate::domain::{
    camera::{CameraFault, FacingMode, FrameSize},
    errors::DomainResult,
    media::{DisplayRef, MediaBlob},
    response::ServiceResponse,
    source::ImageUpload,
};

/// Acceso al hardware de vídeo.
#[async_trait]
pub trait CameraPort: Send + Sync {
    /// Solicita un stream con orientación preferida (no garantizada).
    async fn acquire(&self, facing: FacingMode) -> Result<Box<dyn LiveStream>, CameraFault>;
}

/// Stream de vídeo activo. Mientras exista, el dispositivo está ocupado.
pub trait LiveStream: Send {
    /// Dimensiones del último frame; 0x0 hasta que llega el primero.
    fn video_size(&self) -> FrameSize;
    /// Copia del frame actual.
    fn snapshot(&self) -> DomainResult<RgbImage>;
    /// Libera todas las pistas del dispositivo. Idempotente.
    fn stop(&mut self);
}

#[async_trait]
pub trait StillEncoderPort: Send + Sync {
    async fn encode_jpeg(&self, frame: RgbImage, quality: u8) -> DomainResult<Vec<u8>>;
}

/// Fallo de transporte: no se alcanzó el servicio o la conexión se cortó.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError(pub String);

#[async_trait]
pub trait RemovalServicePort: Send + Sync {
    async fn remove_background(&self, upload: ImageUpload) -> Result<ServiceResponse, TransportError>;
}

/// Registro de referencias de visualización (equivalente a las object URLs).
pub trait DisplayPort: Send + Sync {
    fn publish(&self, blob: &MediaBlob) -> DisplayRef;
    fn revoke(&self, reference: &DisplayRef);
    fn fetch(&self, id: Uuid) -> Option<MediaBlob>;
    fn live_count(&self) -> usize;
}
