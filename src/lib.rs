//! Cliente de eliminación de fondo: adquisición de imagen (archivo o cámara),
//! una única petición al servicio remoto y gestión de los recursos binarios
//! transitorios que produce el flujo.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
