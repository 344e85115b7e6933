pub mod display;
pub mod http;
pub mod imaging;
pub mod remote;
pub mod v4l2;
