pub mod rembg_client;
