use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const JPEG_MIME: &str = "image/jpeg";
pub const PNG_MIME: &str = "image/png";

/// Carga binaria opaca con su tipo MIME.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaBlob {
    pub bytes: Bytes,
    pub mime: String,
}

impl MediaBlob {
    pub fn new(bytes: impl Into<Bytes>, mime: impl Into<String>) -> Self {
        Self { bytes: bytes.into(), mime: mime.into() }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Referencia revocable que permite mostrar o descargar un `MediaBlob`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayRef {
    pub id: Uuid,
    pub url: String,
}

impl DisplayRef {
    pub fn new(id: Uuid) -> Self {
        Self { id, url: format!("/api/blobs/{id}") }
    }
}
