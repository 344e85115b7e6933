pub mod compose;
pub mod jpeg_encoder;
