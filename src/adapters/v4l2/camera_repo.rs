use std::io::ErrorKind;

use async_trait::async_trait;
use tracing::info;
use v4l::capability::Flags;
use v4l::Device;

use crate::adapters::v4l2::capture::{CaptureConfig, CaptureWorker};
use crate::application::ports::{CameraPort, LiveStream};
use crate::config::CameraSettings;
use crate::domain::camera::{CameraFault, CameraMode, FacingMode, FrameSize};

/// Cámara V4L2. La orientación se resuelve a un nodo de dispositivo:
/// el configurado o, en su defecto, el primero (frontal) o el segundo
/// (trasera) de los dispositivos de captura enumerados.
pub struct V4l2Camera {
    settings: CameraSettings,
}

impl V4l2Camera {
    pub fn new(settings: CameraSettings) -> Self {
        Self { settings }
    }

    async fn device_for(&self, facing: FacingMode) -> Result<String, CameraFault> {
        let configured = match facing {
            FacingMode::Front => self.settings.front_device.clone(),
            FacingMode::Back => self.settings.back_device.clone().or_else(|| self.settings.front_device.clone()),
        };
        if let Some(path) = configured {
            return Ok(path);
        }

        // Enumerar abre cada nodo de dispositivo.
        let devices = tokio::task::spawn_blocking(capture_devices)
            .await
            .map_err(|e| CameraFault::NotAvailable(e.to_string()))?;
        pick_device(&devices, facing)
            .cloned()
            .ok_or_else(|| CameraFault::NotAvailable("no video capture devices found".into()))
    }

    fn mode(&self) -> CameraMode {
        CameraMode {
            format: self.settings.fourcc.clone(),
            size: FrameSize { width: self.settings.width, height: self.settings.height },
            fps: self.settings.fps,
        }
    }
}

fn capture_devices() -> Vec<String> {
    let mut nodes: Vec<_> = v4l::context::enum_devices()
        .into_iter()
        .filter(|node| {
            Device::with_path(node.path())
                .and_then(|dev| dev.query_caps())
                .map(|caps| caps.capabilities.contains(Flags::VIDEO_CAPTURE))
                .unwrap_or(false)
        })
        .map(|node| (node.index(), node.path().to_string_lossy().to_string()))
        .collect();
    nodes.sort();
    nodes.into_iter().map(|(_, path)| path).collect()
}

/// Preferencia de orientación sobre la lista ordenada de dispositivos.
fn pick_device(devices: &[String], facing: FacingMode) -> Option<&String> {
    match facing {
        FacingMode::Front => devices.first(),
        FacingMode::Back => devices.get(1).or_else(|| devices.first()),
    }
}

fn classify(err: &anyhow::Error) -> CameraFault {
    match err.downcast_ref::<std::io::Error>().map(|e| e.kind()) {
        Some(ErrorKind::PermissionDenied) => CameraFault::PermissionDenied,
        _ => CameraFault::NotAvailable(err.to_string()),
    }
}

#[async_trait]
impl CameraPort for V4l2Camera {
    async fn acquire(&self, facing: FacingMode) -> Result<Box<dyn LiveStream>, CameraFault> {
        let camera_path = self.device_for(facing).await?;
        info!(?facing, device = %camera_path, "Solicitando stream de vídeo");

        let worker = CaptureWorker::spawn(CaptureConfig { camera_path, mode: self.mode() })
            .await
            .map_err(|e| classify(&e))?;
        Ok(Box::new(worker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_prefers_the_second_device_and_falls_back_to_the_first() {
        let two = vec!["/dev/video0".to_string(), "/dev/video2".to_string()];
        assert_eq!(pick_device(&two, FacingMode::Front).map(String::as_str), Some("/dev/video0"));
        assert_eq!(pick_device(&two, FacingMode::Back).map(String::as_str), Some("/dev/video2"));

        let one = vec!["/dev/video0".to_string()];
        assert_eq!(pick_device(&one, FacingMode::Back).map(String::as_str), Some("/dev/video0"));
        assert!(pick_device(&[], FacingMode::Front).is_none());
    }

    #[tokio::test]
    async fn configured_devices_win_over_enumeration() {
        let camera = V4l2Camera::new(CameraSettings {
            front_device: Some("/dev/video4".into()),
            ..CameraSettings::default()
        });
        assert_eq!(camera.device_for(FacingMode::Front).await.unwrap(), "/dev/video4");
        assert_eq!(camera.device_for(FacingMode::Back).await.unwrap(), "/dev/video4");
    }

    #[test]
    fn permission_errors_are_reported_as_such() {
        let err = anyhow::Error::from(std::io::Error::from(ErrorKind::PermissionDenied));
        assert_eq!(classify(&err), CameraFault::PermissionDenied);

        let err = anyhow::Error::from(std::io::Error::from(ErrorKind::NotFound));
        assert!(matches!(classify(&err), CameraFault::NotAvailable(_)));
    }
}
