use bytes::Bytes;
use serde::Deserialize;

use super::errors::{DomainError, DomainResult};
use super::media::{MediaBlob, PNG_MIME};

/// Respuesta cruda del servicio de eliminación de fondo.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl ServiceResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn declares_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
    }

    /// Traduce la respuesta a un resultado normalizado. El orden importa:
    /// estado HTTP, luego cuerpo JSON con estado 2xx, luego imagen.
    pub fn classify(self) -> DomainResult<MediaBlob> {
        if !self.is_success() {
            return Err(DomainError::Http { status: self.status, detail: parse_detail(&self.body) });
        }

        if self.declares_json() {
            let text = String::from_utf8_lossy(&self.body).into_owned();
            return Err(DomainError::UnexpectedJsonResponse(text));
        }

        let mime = self
            .content_type
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or_else(|| PNG_MIME.to_string());
        Ok(MediaBlob::new(self.body, mime))
    }
}

fn parse_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, content_type: Option<&str>, body: &[u8]) -> ServiceResponse {
        ServiceResponse {
            status,
            content_type: content_type.map(str::to_string),
            body: Bytes::copy_from_slice(body),
        }
    }

    #[test]
    fn error_status_extracts_json_detail() {
        let err = response(500, Some("application/json"), br#"{"detail":"model error"}"#)
            .classify()
            .unwrap_err();
        assert_eq!(err, DomainError::Http { status: 500, detail: Some("model error".into()) });
    }

    #[test]
    fn error_status_without_json_has_no_detail() {
        let err = response(502, Some("text/html"), b"<html>bad gateway</html>").classify().unwrap_err();
        assert_eq!(err, DomainError::Http { status: 502, detail: None });
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        let err = response(422, Some("application/json"), br#"{"detail":[{"msg":"field required"}]}"#)
            .classify()
            .unwrap_err();
        match err {
            DomainError::Http { status: 422, detail: Some(d) } => assert!(d.contains("field required")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn success_with_json_body_is_a_contract_violation() {
        let err = response(200, Some("application/json; charset=utf-8"), br#"{"error":"oops"}"#)
            .classify()
            .unwrap_err();
        assert_eq!(err, DomainError::UnexpectedJsonResponse(r#"{"error":"oops"}"#.into()));
    }

    #[test]
    fn success_with_binary_body_becomes_blob() {
        let blob = response(200, Some("image/png"), b"\x89PNG").classify().unwrap();
        assert_eq!(blob.mime, "image/png");
        assert_eq!(&blob.bytes[..], b"\x89PNG");
    }

    #[test]
    fn missing_content_type_defaults_to_png() {
        let blob = response(200, None, b"\x89PNG").classify().unwrap();
        assert_eq!(blob.mime, PNG_MIME);
    }
}
