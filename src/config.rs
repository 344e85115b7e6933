use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::domain::camera::FacingMode;

pub const DEFAULT_CONFIG_FILE: &str = "bgcut.toml";
const ENV_PREFIX: &str = "BGCUT";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub service: ServiceSettings,
    pub camera: CameraSettings,
    pub server: ServerSettings,
    pub batch: BatchSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub endpoint: String,
    pub timeout_secs: Option<u64>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/process/transparent".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Dispositivo para la cámara frontal. Sin valor, se usa el primero enumerado.
    pub front_device: Option<String>,
    pub back_device: Option<String>,
    pub fourcc: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub jpeg_quality: u8,
    pub initial_facing: FacingMode,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            front_device: None,
            back_device: None,
            fourcc: "MJPG".to_string(),
            width: 640,
            height: 480,
            fps: 30,
            jpeg_quality: 95,
            initial_facing: FacingMode::Front,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub listen: String,
    pub static_dir: String,
    pub download_name: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8090".to_string(),
            static_dir: "static".to_string(),
            download_name: "transparent.png".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub blur_radius: f32,
    pub feather: f32,
    pub edge_desat: f32,
    pub fill: [u8; 3],
    pub background: Option<String>,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self { blur_radius: 20.0, feather: 3.0, edge_desat: 0.6, fill: [255, 255, 255], background: None }
    }
}

impl Settings {
    /// Carga la configuración: valores por defecto, archivo TOML opcional y
    /// variables de entorno `BGCUT_<SECCION>__<CLAVE>`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__"))
            .build()?
            .try_deserialize()
    }
}
