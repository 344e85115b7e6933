use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{info, warn};

use crate::adapters::imaging::compose::{blur_background, image_background, solid_background, BlurOptions};
use crate::application::dto::BatchReport;
use crate::application::ports::{RemovalServicePort, TransportError};
use crate::domain::{
    errors::DomainError,
    media::{JPEG_MIME, PNG_MIME},
    source::ImageUpload,
};

const TRANSPARENT_DIR: &str = "transparent";
const WHITE_DIR: &str = "white";
const BG_DIR: &str = "bg";
const BLUR_DIR: &str = "blur";

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub background: Option<PathBuf>,
    pub fill: [u8; 3],
    pub blur: BlurOptions,
}

/// Procesa un directorio completo contra el servicio remoto: un intento por imagen.
pub struct BatchService {
    service: Arc<dyn RemovalServicePort>,
}

impl BatchService {
    pub fn new(service: Arc<dyn RemovalServicePort>) -> Self {
        Self { service }
    }

    pub async fn run(&self, opts: &BatchOptions) -> Result<BatchReport> {
        for dir in [TRANSPARENT_DIR, WHITE_DIR, BLUR_DIR] {
            tokio::fs::create_dir_all(opts.output.join(dir)).await?;
        }

        let background = match &opts.background {
            Some(path) => {
                tokio::fs::create_dir_all(opts.output.join(BG_DIR)).await?;
                let path = path.clone();
                let img = tokio::task::spawn_blocking(move || image::open(&path).with_context(|| format!("opening background {}", path.display())))
                    .await??;
                Some(Arc::new(img))
            }
            None => None,
        };

        let files = list_images(&opts.input).await?;
        info!("Procesando {} imágenes de {}", files.len(), opts.input.display());

        let mut report = BatchReport::default();
        for path in files {
            match self.process_one(&path, opts, background.clone()).await {
                Ok(()) => {
                    report.processed += 1;
                    info!("✔ Processed {}", path.display());
                }
                Err(e) => {
                    report.failed += 1;
                    warn!("✘ {}: {:#}", path.display(), e);
                }
            }
        }
        Ok(report)
    }

    async fn process_one(&self, path: &Path, opts: &BatchOptions, background: Option<Arc<DynamicImage>>) -> Result<()> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .context("input path has no file name")?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.clone());

        let original = tokio::fs::read(path).await?;
        let upload = ImageUpload {
            file_name,
            bytes: original.clone().into(),
            mime: mime_for(path).to_string(),
        };

        let response = self
            .service
            .remove_background(upload)
            .await
            .map_err(|TransportError(msg)| DomainError::Network(msg))?;
        let blob = response.classify()?;

        tokio::fs::write(opts.output.join(TRANSPARENT_DIR).join(format!("{stem}.png")), &blob.bytes).await?;

        let output = opts.output.clone();
        let fill = opts.fill;
        let blur = opts.blur;
        tokio::task::spawn_blocking(move || -> Result<()> {
            let fg = image::load_from_memory(&blob.bytes).context("decoding service result")?.to_rgba8();
            let source = image::load_from_memory(&original).context("decoding input image")?;

            save_png(&solid_background(&fg, fill), &output.join(WHITE_DIR).join(format!("{stem}.png")))?;
            if let Some(bg) = background {
                save_png(&image_background(&fg, &bg), &output.join(BG_DIR).join(format!("{stem}.png")))?;
            }
            save_png(&blur_background(&source, &fg, blur), &output.join(BLUR_DIR).join(format!("{stem}.png")))?;
            Ok(())
        })
        .await??;

        Ok(())
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
        .unwrap_or(false)
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("png") => PNG_MIME,
        _ => JPEG_MIME,
    }
}

async fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("reading input directory {}", dir.display()))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_supported(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn save_png(img: &RgbaImage, path: &Path) -> Result<()> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    std::fs::write(path, buf.into_inner()).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::response::ServiceResponse;
    use async_trait::async_trait;
    use bytes::Bytes;
    use image::Rgba;

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    /// Devuelve un recorte PNG, salvo para archivos que empiezan por "bad".
    struct CutoutService;

    #[async_trait]
    impl RemovalServicePort for CutoutService {
        async fn remove_background(&self, upload: ImageUpload) -> Result<ServiceResponse, TransportError> {
            if upload.file_name.starts_with("bad") {
                return Ok(ServiceResponse {
                    status: 500,
                    content_type: Some("application/json".into()),
                    body: Bytes::from_static(br#"{"detail":"model error"}"#),
                });
            }
            let cut = RgbaImage::from_fn(4, 4, |x, _| if x < 2 { Rgba([255, 0, 0, 255]) } else { Rgba([0, 0, 0, 0]) });
            Ok(ServiceResponse {
                status: 200,
                content_type: Some("image/png".into()),
                body: Bytes::from(png_bytes(&cut)),
            })
        }
    }

    #[tokio::test]
    async fn writes_every_variant_and_counts_failures() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let photo = png_bytes(&RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255])));
        std::fs::write(input.path().join("cat.PNG"), &photo).unwrap();
        std::fs::write(input.path().join("bad.png"), &photo).unwrap();
        std::fs::write(input.path().join("notes.txt"), b"skip me").unwrap();
        let assets = tempfile::tempdir().unwrap();
        let bg_path = assets.path().join("backdrop.png");
        std::fs::write(&bg_path, &photo).unwrap();

        let opts = BatchOptions {
            input: input.path().to_path_buf(),
            output: output.path().to_path_buf(),
            background: Some(bg_path),
            fill: [255, 255, 255],
            blur: BlurOptions { radius: 1.0, feather: 1.0, edge_desat: 0.6 },
        };
        let report = BatchService::new(Arc::new(CutoutService)).run(&opts).await.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        for dir in [TRANSPARENT_DIR, WHITE_DIR, BG_DIR, BLUR_DIR] {
            assert!(output.path().join(dir).join("cat.png").exists(), "missing {dir}/cat.png");
            assert!(!output.path().join(dir).join("bad.png").exists());
        }
    }

    #[test]
    fn only_common_image_extensions_are_picked_up() {
        assert!(is_supported(Path::new("a.JPEG")));
        assert!(is_supported(Path::new("a.png")));
        assert!(!is_supported(Path::new("a.gif")));
        assert!(!is_supported(Path::new("README")));
        assert_eq!(mime_for(Path::new("x.PNG")), PNG_MIME);
        assert_eq!(mime_for(Path::new("x.jpg")), JPEG_MIME);
    }
}
