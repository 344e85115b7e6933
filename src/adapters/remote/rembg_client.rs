use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};

use crate::application::ports::{RemovalServicePort, TransportError};
use crate::config::ServiceSettings;
use crate::domain::{
    response::ServiceResponse,
    source::{ImageUpload, UPLOAD_FIELD},
};

/// Cliente HTTP del servicio de eliminación de fondo (`POST` multipart).
pub struct RembgHttpClient {
    client: reqwest::Client,
    endpoint: String,
}

impl RembgHttpClient {
    pub fn new(settings: &ServiceSettings) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self { client: builder.build()?, endpoint: settings.endpoint.clone() })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

const FALLBACK_MIME: &str = "application/octet-stream";

fn image_part(upload: ImageUpload) -> Result<Part, TransportError> {
    let ImageUpload { file_name, bytes, mime } = upload;
    // Un MIME inválido no debe impedir el envío.
    let mime = if Part::bytes(Vec::<u8>::new()).mime_str(&mime).is_ok() { mime } else { FALLBACK_MIME.to_string() };
    Part::bytes(bytes.to_vec())
        .file_name(file_name)
        .mime_str(&mime)
        .map_err(|e| TransportError(e.to_string()))
}

#[async_trait]
impl RemovalServicePort for RembgHttpClient {
    async fn remove_background(&self, upload: ImageUpload) -> Result<ServiceResponse, TransportError> {
        let form = Form::new().part(UPLOAD_FIELD, image_part(upload)?);

        let res = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = res.bytes().await.map_err(|e| TransportError(e.to_string()))?;

        Ok(ServiceResponse { status, content_type, body })
    }
}
