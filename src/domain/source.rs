use bytes::Bytes;
use serde::Serialize;

use super::media::{MediaBlob, JPEG_MIME};

/// Campo multipart que espera el servicio remoto.
pub const UPLOAD_FIELD: &str = "image";
/// Nombre de archivo por defecto para los frames capturados.
pub const CAPTURE_FILE_NAME: &str = "capture.jpg";

/// Origen activo de la imagen. Solo una variante está activa a la vez.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ImageSource {
    #[default]
    Empty,
    UploadedFile { name: String, blob: MediaBlob },
    CapturedFrame { blob: MediaBlob },
}

/// Imagen lista para enviar como parte multipart.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Bytes,
    pub mime: String,
}

impl ImageSource {
    pub fn select_file(&mut self, name: impl Into<String>, bytes: impl Into<Bytes>, mime: impl Into<String>) {
        *self = ImageSource::UploadedFile { name: name.into(), blob: MediaBlob::new(bytes, mime) };
    }

    pub fn select_captured_frame(&mut self, blob: MediaBlob) {
        *self = ImageSource::CapturedFrame { blob };
    }

    pub fn clear(&mut self) {
        *self = ImageSource::Empty;
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ImageSource::Empty)
    }

    pub fn blob(&self) -> Option<&MediaBlob> {
        match self {
            ImageSource::Empty => None,
            ImageSource::UploadedFile { blob, .. } | ImageSource::CapturedFrame { blob } => Some(blob),
        }
    }

    /// Empaqueta los bytes activos con el nombre de archivo que verá el servicio.
    pub fn to_upload(&self) -> Option<ImageUpload> {
        match self {
            ImageSource::Empty => None,
            ImageSource::UploadedFile { name, blob } => Some(ImageUpload {
                file_name: name.clone(),
                bytes: blob.bytes.clone(),
                mime: blob.mime.clone(),
            }),
            ImageSource::CapturedFrame { blob } => Some(ImageUpload {
                file_name: CAPTURE_FILE_NAME.to_string(),
                bytes: blob.bytes.clone(),
                mime: if blob.mime.is_empty() { JPEG_MIME.to_string() } else { blob.mime.clone() },
            }),
        }
    }

    pub fn view(&self) -> SourceView {
        match self {
            ImageSource::Empty => SourceView::Empty,
            ImageSource::UploadedFile { name, blob } => SourceView::UploadedFile { name: name.clone(), size: blob.len() },
            ImageSource::CapturedFrame { blob } => SourceView::CapturedFrame { size: blob.len() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceView {
    Empty,
    UploadedFile { name: String, size: usize },
    CapturedFrame { size: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_is_last_write_wins() {
        let mut source = ImageSource::default();
        source.select_file("photo.jpg", vec![1, 2, 3], "image/jpeg");
        source.select_captured_frame(MediaBlob::new(vec![9], JPEG_MIME));
        assert!(matches!(source, ImageSource::CapturedFrame { .. }));

        source.select_file("other.png", vec![4], "image/png");
        assert!(matches!(source, ImageSource::UploadedFile { ref name, .. } if name == "other.png"));
    }

    #[test]
    fn captured_frames_upload_as_capture_jpg() {
        let mut source = ImageSource::default();
        source.select_captured_frame(MediaBlob::new(vec![0xff, 0xd8], JPEG_MIME));
        let upload = source.to_upload().unwrap();
        assert_eq!(upload.file_name, CAPTURE_FILE_NAME);
        assert_eq!(upload.mime, JPEG_MIME);
    }

    #[test]
    fn uploads_keep_their_original_name() {
        let mut source = ImageSource::default();
        source.select_file("photo.jpg", vec![1, 2, 3], "image/jpeg");
        let upload = source.to_upload().unwrap();
        assert_eq!(upload.file_name, "photo.jpg");
        assert_eq!(&upload.bytes[..], &[1, 2, 3]);
    }

    #[test]
    fn empty_source_has_nothing_to_upload() {
        let mut source = ImageSource::default();
        source.select_file("a.png", vec![1], "image/png");
        source.clear();
        assert!(source.is_empty());
        assert!(source.to_upload().is_none());
    }
}
