use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{anyhow, Result};
use image::{ImageFormat, RgbImage};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::oneshot;
use tracing::{info, warn};
use v4l::format::FourCC;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::Device;

use crate::application::ports::LiveStream;
use crate::domain::camera::{CameraMode, FrameSize};
use crate::domain::errors::{DomainError, DomainResult};

// Espera máxima por frame: acota lo que tarda el hilo en ver la orden de parada.
const FRAME_TIMEOUT: Duration = Duration::from_millis(500);

/// Configuración para inicializar la captura de vídeo.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub camera_path: String,
    pub mode: CameraMode,
}

/// Dispositivo V4L2 abierto con su flujo de memoria mapeada (MMAP).
pub struct V4l2Capture {
    // El stream se suelta antes que el dispositivo (orden de declaración).
    stream: Stream<'static>,
    _device: Device,
    fourcc: FourCC,
    width: u32,
    height: u32,
}

impl V4l2Capture {
    pub fn open(cfg: &CaptureConfig) -> Result<Self> {
        let dev = Device::with_path(&cfg.camera_path)?;

        // 1. Formato (el driver puede ajustarlo al más cercano soportado)
        let mut fmt = dev.format()?;
        let b = cfg.mode.format.as_bytes();
        if b.len() != 4 {
            return Err(anyhow!("FourCC must have 4 characters: {}", cfg.mode.format));
        }
        fmt.fourcc = FourCC::new(&[b[0], b[1], b[2], b[3]]);
        fmt.width = cfg.mode.size.width;
        fmt.height = cfg.mode.size.height;
        let actual_fmt = dev.set_format(&fmt)?;

        // 2. FPS
        let mut params = dev.params()?;
        params.interval.numerator = 1;
        params.interval.denominator = cfg.mode.fps.max(1);
        let _ = dev.set_params(&params);

        // 3. Stream
        let mut stream = Stream::with_buffers(&dev, v4l::buffer::Type::VideoCapture, 4)?;
        stream.set_timeout(FRAME_TIMEOUT);

        info!(
            "Cámara abierta: {} {}x{} [{}] a {} FPS",
            cfg.camera_path, actual_fmt.width, actual_fmt.height, actual_fmt.fourcc, cfg.mode.fps
        );

        Ok(Self {
            stream,
            _device: dev,
            fourcc: actual_fmt.fourcc,
            width: actual_fmt.width,
            height: actual_fmt.height,
        })
    }

    /// Bloquea hasta el siguiente frame y lo devuelve en RGB.
    pub fn next_rgb(&mut self) -> Result<RgbImage> {
        let (data, _) = self.stream.next()?;
        let fcc_str = self.fourcc.str().map_err(|_| anyhow!("invalid FourCC"))?;

        match fcc_str {
            "MJPG" => Ok(image::load_from_memory_with_format(data, ImageFormat::Jpeg)?.to_rgb8()),
            "YUYV" => Ok(yuyv_to_rgb(data, self.width, self.height)),
            _ => Err(anyhow!("Camera format {} is not supported", fcc_str)),
        }
    }
}

/// Convierte un buffer YUYV (YUV 4:2:2) a RGB.
fn yuyv_to_rgb(yuyv: &[u8], w: u32, h: u32) -> RgbImage {
    let mut out = RgbImage::new(w, h);

    // Cada bloque de 4 bytes define 2 píxeles: [Y0, U, Y1, V]
    for (i, chunk) in yuyv.chunks_exact(4).enumerate() {
        let u = chunk[1] as f32 - 128.0;
        let v = chunk[3] as f32 - 128.0;
        let px = |y: f32| {
            // BT.601
            image::Rgb([
                (y + 1.402 * v).clamp(0.0, 255.0) as u8,
                (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8,
                (y + 1.772 * u).clamp(0.0, 255.0) as u8,
            ])
        };

        let pixel_idx = i as u32 * 2;
        let x = pixel_idx % w.max(1);
        let y = pixel_idx / w.max(1);
        if y < h {
            out.put_pixel(x, y, px(chunk[0] as f32));
            if x + 1 < w {
                out.put_pixel(x + 1, y, px(chunk[2] as f32));
            }
        }
    }
    out
}

/// Stream vivo: un hilo dedicado lee frames y guarda el último.
/// `stop` espera a que el hilo suelte el dispositivo.
pub struct CaptureWorker {
    latest: Arc<Mutex<Option<RgbImage>>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    camera_path: String,
}

impl CaptureWorker {
    pub async fn spawn(cfg: CaptureConfig) -> Result<Self> {
        let (ready_tx, ready_rx) = oneshot::channel::<Result<()>>();
        let latest = Arc::new(Mutex::new(None));
        let running = Arc::new(AtomicBool::new(true));
        let camera_path = cfg.camera_path.clone();

        let slot = latest.clone();
        let flag = running.clone();
        let handle = std::thread::Builder::new()
            .name("v4l2-capture".into())
            .spawn(move || {
                let mut capture = match V4l2Capture::open(&cfg) {
                    Ok(c) => {
                        // Nadie espera el stream: se suelta el dispositivo.
                        if ready_tx.send(Ok(())).is_err() {
                            info!("Arranque abandonado, liberando {}", cfg.camera_path);
                            return;
                        }
                        c
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while flag.load(Ordering::Acquire) {
                    match capture.next_rgb() {
                        Ok(rgb) => {
                            if let Ok(mut latest) = slot.lock() {
                                *latest = Some(rgb);
                            }
                        }
                        Err(e) if is_timeout(&e) => {}
                        Err(e) => {
                            warn!("Error capturando frame: {}", e);
                            std::thread::sleep(Duration::from_millis(10));
                        }
                    }
                }
                info!("Hilo de captura finalizado: {}", cfg.camera_path);
            })?;

        let abort = StopOnDrop(Some(running.clone()));
        match ready_rx.await {
            Ok(Ok(())) => {
                abort.disarm();
                Ok(Self { latest, running, handle: Some(handle), camera_path })
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => Err(anyhow!("capture thread for {} exited before opening", camera_path)),
        }
    }
}

/// Si `spawn` se descarta mientras espera al hilo, le ordena parar.
struct StopOnDrop(Option<Arc<AtomicBool>>);

impl StopOnDrop {
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        if let Some(flag) = self.0.take() {
            flag.store(false, Ordering::Release);
        }
    }
}

fn is_timeout(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == ErrorKind::TimedOut)
}

/// Espera al hilo de captura sin bloquear el resto de tareas del runtime.
fn join_capture_thread(handle: JoinHandle<()>) -> std::thread::Result<()> {
    match Handle::try_current() {
        Ok(rt) if rt.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| handle.join())
        }
        _ => handle.join(),
    }
}

impl LiveStream for CaptureWorker {
    fn video_size(&self) -> FrameSize {
        self.latest
            .lock()
            .ok()
            .and_then(|latest| latest.as_ref().map(|f| FrameSize { width: f.width(), height: f.height() }))
            .unwrap_or_default()
    }

    fn snapshot(&self) -> DomainResult<RgbImage> {
        let latest = self
            .latest
            .lock()
            .map_err(|_| DomainError::CaptureFailed("frame buffer lock poisoned".into()))?;
        latest.clone().ok_or_else(|| DomainError::CaptureFailed("no frame available".into()))
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if join_capture_thread(handle).is_err() {
                warn!("El hilo de captura de {} terminó con pánico", self.camera_path);
            }
        }
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
