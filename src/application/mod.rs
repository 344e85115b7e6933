pub mod batch;
pub mod camera_session;
pub mod dto;
pub mod ports;
pub mod processing;
pub mod resource;
pub mod workflow;
