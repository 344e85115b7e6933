use std::sync::Arc;

use tokio::sync::Mutex;

use crate::application::ports::DisplayPort;
use crate::application::workflow::WorkflowController;

/// Estado compartido para los manejadores HTTP de Axum.
/// Las acciones del usuario se serializan a través del mutex del flujo.
#[derive(Clone)]
pub struct HttpState {
    /// Máquina de estados de adquisición y petición.
    pub workflow: Arc<Mutex<WorkflowController>>,
    /// Registro de blobs publicados (vista previa y resultado).
    pub display: Arc<dyn DisplayPort>,
    /// Nombre de descarga del resultado.
    pub download_name: String,
}

impl HttpState {
    pub fn new(workflow: WorkflowController, display: Arc<dyn DisplayPort>, download_name: impl Into<String>) -> Self {
        Self {
            workflow: Arc::new(Mutex::new(workflow)),
            display,
            download_name: download_name.into(),
        }
    }
}
