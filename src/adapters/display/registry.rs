use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::warn;
use uuid::Uuid;

use crate::application::ports::DisplayPort;
use crate::domain::media::{DisplayRef, MediaBlob};

/// Registro en memoria de blobs publicados, servidos en `/api/blobs/{id}`.
/// Una entrada revocada deja de ser accesible.
#[derive(Default)]
pub struct DisplayRegistry {
    entries: Mutex<HashMap<Uuid, MediaBlob>>,
}

impl DisplayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<Uuid, MediaBlob>> {
        // Un pánico en otro hilo no invalida el mapa: cada operación es atómica.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DisplayPort for DisplayRegistry {
    fn publish(&self, blob: &MediaBlob) -> DisplayRef {
        let reference = DisplayRef::new(Uuid::new_v4());
        self.entries().insert(reference.id, blob.clone());
        reference
    }

    fn revoke(&self, reference: &DisplayRef) {
        if self.entries().remove(&reference.id).is_none() {
            warn!(url = %reference.url, "Revocación de una referencia inexistente");
        }
    }

    fn fetch(&self, id: Uuid) -> Option<MediaBlob> {
        self.entries().get(&id).cloned()
    }

    fn live_count(&self) -> usize {
        self.entries().len()
    }
}
