use image::{imageops, imageops::FilterType, DynamicImage, GrayImage, Luma, Rgba, RgbaImage};

/// Parámetros del fondo desenfocado.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurOptions {
    pub radius: f32,
    pub feather: f32,
    pub edge_desat: f32,
}

impl Default for BlurOptions {
    fn default() -> Self {
        Self { radius: 22.0, feather: 3.0, edge_desat: 0.6 }
    }
}

// Contracción de la máscara para eliminar el halo del borde.
const ALPHA_CONTRACT: u8 = 10;

/// Pega el recorte sobre un color sólido.
pub fn solid_background(fg: &RgbaImage, color: [u8; 3]) -> RgbaImage {
    let mut bg = RgbaImage::from_pixel(fg.width(), fg.height(), Rgba([color[0], color[1], color[2], 255]));
    imageops::overlay(&mut bg, fg, 0, 0);
    bg
}

/// Pega el recorte sobre otra imagen, redimensionada al tamaño del recorte.
pub fn image_background(fg: &RgbaImage, background: &DynamicImage) -> RgbaImage {
    let mut bg = imageops::resize(&background.to_rgba8(), fg.width(), fg.height(), FilterType::Triangle);
    imageops::overlay(&mut bg, fg, 0, 0);
    bg
}

/// Pega el recorte sobre la imagen original desenfocada, suavizando el borde
/// de la máscara y desaturando el color que queda cerca de él.
pub fn blur_background(original: &DynamicImage, fg: &RgbaImage, opts: BlurOptions) -> RgbaImage {
    let (w, h) = fg.dimensions();
    let mut base = original.to_rgba8();
    if base.dimensions() != (w, h) {
        base = imageops::resize(&base, w, h, FilterType::Triangle);
    }
    let bg = if opts.radius > 0.0 { imageops::blur(&base, opts.radius) } else { base };

    let mut alpha = GrayImage::from_fn(w, h, |x, y| Luma([fg.get_pixel(x, y)[3]]));
    if opts.feather > 0.0 {
        alpha = imageops::blur(&alpha, opts.feather);
    }
    for p in alpha.pixels_mut() {
        p[0] = p[0].saturating_sub(ALPHA_CONTRACT);
    }

    let desat = opts.edge_desat.clamp(0.0, 1.0);
    RgbaImage::from_fn(w, h, |x, y| {
        let a = alpha.get_pixel(x, y)[0] as f32 / 255.0;
        let src = fg.get_pixel(x, y);
        let back = bg.get_pixel(x, y);
        let gray = 0.299 * src[0] as f32 + 0.587 * src[1] as f32 + 0.114 * src[2] as f32;

        let mut out = [0u8; 4];
        for c in 0..3 {
            let color = src[c] as f32;
            let washed = gray + (color - gray) * desat;
            let edge = color * a + washed * (1.0 - a);
            out[c] = (edge * a + back[c] as f32 * (1.0 - a)).round().clamp(0.0, 255.0) as u8;
        }
        out[3] = 255;
        Rgba(out)
    })
}
