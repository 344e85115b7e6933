use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::ports::{DisplayPort, RemovalServicePort, TransportError};
use crate::application::resource::ResourceHandle;
use crate::domain::{
    errors::{DomainError, DomainResult, Rejection},
    media::DisplayRef,
    response::ServiceResponse,
    source::{ImageSource, ImageUpload},
};

#[derive(Debug, Default)]
pub enum RequestState {
    #[default]
    Idle,
    InFlight,
    Succeeded(ResourceHandle),
    Failed(DomainError),
}

impl RequestState {
    pub fn label(&self) -> &'static str {
        match self {
            RequestState::Idle => "idle",
            RequestState::InFlight => "in_flight",
            RequestState::Succeeded(_) => "succeeded",
            RequestState::Failed(_) => "failed",
        }
    }
}

/// Petición reservada: el hueco "en curso" ya está ocupado y falta el envío.
pub struct Submission {
    id: u64,
    upload: ImageUpload,
    service: Arc<dyn RemovalServicePort>,
}

impl std::fmt::Debug for Submission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submission")
            .field("id", &self.id)
            .field("upload", &self.upload)
            .finish_non_exhaustive()
    }
}

impl Submission {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Realiza la única llamada al servicio remoto de esta petición.
    pub async fn send(self) -> (u64, Result<ServiceResponse, TransportError>) {
        info!(file = %self.upload.file_name, bytes = self.upload.bytes.len(), "Enviando imagen al servicio");
        let outcome = self.service.remove_background(self.upload).await;
        (self.id, outcome)
    }
}

/// Controla la única petición pendiente contra el servicio de eliminación de fondo.
pub struct ProcessingRequest {
    service: Arc<dyn RemovalServicePort>,
    display: Arc<dyn DisplayPort>,
    state: RequestState,
    current: Option<u64>,
    next_id: u64,
}

impl ProcessingRequest {
    pub fn new(service: Arc<dyn RemovalServicePort>, display: Arc<dyn DisplayPort>) -> Self {
        Self { service, display, state: RequestState::Idle, current: None, next_id: 0 }
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, RequestState::InFlight)
    }

    pub fn result_reference(&self) -> Option<&DisplayRef> {
        match &self.state {
            RequestState::Succeeded(handle) => handle.reference(),
            _ => None,
        }
    }

    /// Reserva el hueco "en curso". Un rechazo no modifica el estado.
    pub fn begin(&mut self, source: &ImageSource) -> DomainResult<Submission> {
        if self.is_in_flight() {
            return Err(Rejection::RequestInFlight.into());
        }
        let upload = source.to_upload().ok_or(Rejection::NoImageSelected)?;

        self.next_id += 1;
        self.current = Some(self.next_id);
        // Reemplazar el estado suelta el resultado anterior y revoca su referencia.
        self.state = RequestState::InFlight;

        Ok(Submission { id: self.next_id, upload, service: Arc::clone(&self.service) })
    }

    /// Aplica el resultado de una petición. Devuelve `false` si la petición ya
    /// no es la vigente (se descartó o ya terminó).
    pub fn finish(&mut self, id: u64, outcome: Result<ServiceResponse, TransportError>) -> bool {
        if self.current != Some(id) {
            debug!(id, "Resultado descartado: la petición ya no está vigente");
            return false;
        }
        self.current = None;

        let classified = outcome
            .map_err(|TransportError(msg)| DomainError::Network(msg))
            .and_then(ServiceResponse::classify);

        self.state = match classified {
            Ok(blob) => {
                let mut handle = ResourceHandle::create(blob, Arc::clone(&self.display));
                handle.present();
                info!(id, "Fondo eliminado correctamente");
                RequestState::Succeeded(handle)
            }
            Err(err) => {
                warn!(id, error = %err, "La petición falló");
                RequestState::Failed(err)
            }
        };
        true
    }

    /// Descarta la petición vigente y el resultado anterior.
    pub fn reset(&mut self) {
        self.current = None;
        self.state = RequestState::Idle;
    }

    /// Envío completo: reserva, llamada y resolución. El estado "en curso" se
    /// abandona en todas las salidas, también si el futuro se descarta.
    pub async fn submit(&mut self, source: &ImageSource) -> DomainResult<()> {
        let submission = self.begin(source)?;
        let guard = CompletionGuard { request: self, id: submission.id, settled: false };
        let (_, outcome) = submission.send().await;
        guard.settle(outcome);
        Ok(())
    }
}

struct CompletionGuard<'a> {
    request: &'a mut ProcessingRequest,
    id: u64,
    settled: bool,
}

impl CompletionGuard<'_> {
    fn settle(mut self, outcome: Result<ServiceResponse, TransportError>) {
        self.request.finish(self.id, outcome);
        self.settled = true;
    }
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.request.finish(self.id, Err(TransportError("request aborted".into())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::display::registry::DisplayRegistry;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct PngService {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemovalServicePort for PngService {
        async fn remove_background(&self, _upload: ImageUpload) -> Result<ServiceResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ServiceResponse {
                status: 200,
                content_type: Some("image/png".into()),
                body: Bytes::from_static(b"\x89PNG"),
            })
        }
    }

    fn request() -> (ProcessingRequest, Arc<PngService>, Arc<DisplayRegistry>) {
        let service = Arc::new(PngService { calls: AtomicUsize::new(0) });
        let display = Arc::new(DisplayRegistry::new());
        (ProcessingRequest::new(service.clone(), display.clone()), service, display)
    }

    fn file_source() -> ImageSource {
        let mut source = ImageSource::default();
        source.select_file("photo.jpg", vec![1, 2, 3], "image/jpeg");
        source
    }

    #[tokio::test]
    async fn empty_source_is_rejected_without_calling_service() {
        let (mut req, service, _) = request();
        let err = req.submit(&ImageSource::Empty).await.unwrap_err();
        assert_eq!(err, DomainError::Validation(Rejection::NoImageSelected));
        assert!(matches!(req.state(), RequestState::Idle));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn repeated_submissions_keep_a_single_result_reference() {
        let (mut req, service, display) = request();
        let source = file_source();
        for _ in 0..3 {
            req.submit(&source).await.unwrap();
            assert!(matches!(req.state(), RequestState::Succeeded(_)));
            assert_eq!(display.live_count(), 1);
        }
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn stale_outcomes_are_ignored() {
        let (mut req, _, display) = request();
        let submission = req.begin(&file_source()).unwrap();
        req.reset();
        let applied = req.finish(
            submission.id(),
            Ok(ServiceResponse { status: 200, content_type: None, body: Bytes::from_static(b"x") }),
        );
        assert!(!applied);
        assert!(matches!(req.state(), RequestState::Idle));
        assert_eq!(display.live_count(), 0);
    }

    #[test]
    fn outcome_is_applied_only_once() {
        let (mut req, _, _) = request();
        let submission = req.begin(&file_source()).unwrap();
        assert!(req.finish(submission.id(), Err(TransportError("connection refused".into()))));
        assert!(!req.finish(
            submission.id(),
            Ok(ServiceResponse { status: 200, content_type: None, body: Bytes::from_static(b"x") })
        ));
        assert!(matches!(req.state(), RequestState::Failed(DomainError::Network(_))));
    }

    #[test]
    fn dropped_guard_settles_as_aborted() {
        let (mut req, _, _) = request();
        let submission = req.begin(&file_source()).unwrap();
        drop(CompletionGuard { request: &mut req, id: submission.id(), settled: false });
        assert!(!req.is_in_flight());
        assert!(matches!(req.state(), RequestState::Failed(DomainError::Network(ref m)) if m == "request aborted"));
    }
}
