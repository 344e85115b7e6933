use std::sync::Arc;

use tracing::debug;

use crate::application::ports::DisplayPort;
use crate::domain::media::{DisplayRef, MediaBlob};

/// Dueño único de un blob transitorio y de su referencia de visualización.
///
/// Cada `present` revoca la referencia anterior antes de publicar la nueva,
/// y la referencia viva se revoca exactamente una vez: en `release` o al
/// soltar el handle.
pub struct ResourceHandle {
    blob: MediaBlob,
    display: Arc<dyn DisplayPort>,
    reference: Option<DisplayRef>,
}

impl ResourceHandle {
    pub fn create(blob: MediaBlob, display: Arc<dyn DisplayPort>) -> Self {
        Self { blob, display, reference: None }
    }

    pub fn present(&mut self) -> DisplayRef {
        self.release();
        let reference = self.display.publish(&self.blob);
        debug!(url = %reference.url, mime = %self.blob.mime, "referencia publicada");
        self.reference = Some(reference.clone());
        reference
    }

    pub fn release(&mut self) {
        if let Some(reference) = self.reference.take() {
            self.display.revoke(&reference);
            debug!(url = %reference.url, "referencia revocada");
        }
    }

    pub fn reference(&self) -> Option<&DisplayRef> {
        self.reference.as_ref()
    }

    pub fn blob(&self) -> &MediaBlob {
        &self.blob
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("mime", &self.blob.mime)
            .field("len", &self.blob.len())
            .field("reference", &self.reference)
            .finish()
    }
}

/// Un hueco lógico de visualización (vista previa o resultado) con como
/// mucho una referencia viva.
#[derive(Debug, Default)]
pub struct DisplaySlot {
    current: Option<ResourceHandle>,
}

impl DisplaySlot {
    /// Sustituye el contenido: el handle anterior se libera antes de presentar el nuevo.
    pub fn show(&mut self, mut handle: ResourceHandle) -> DisplayRef {
        self.clear();
        let reference = handle.present();
        self.current = Some(handle);
        reference
    }

    pub fn clear(&mut self) {
        if let Some(mut previous) = self.current.take() {
            previous.release();
        }
    }

    pub fn reference(&self) -> Option<&DisplayRef> {
        self.current.as_ref().and_then(ResourceHandle::reference)
    }
}
