pub mod camera;
pub mod controls;
pub mod errors;
pub mod media;
pub mod response;
pub mod source;
