//! Rasterizing encoded symbols to PNG.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{GrayImage, ImageBuffer, ImageFormat, Luma, Pixel, RgbImage};
use tracing::debug;

use crate::bitmap::Bitmap;
use crate::config::RenderConfig;
use crate::error::RenderError;

/// A PNG-encoded QR code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl RenderedImage {
    /// File name offered when the image is downloaded.
    pub const FILE_NAME: &'static str = "generated_qr_code.png";
    pub const MIME_TYPE: &'static str = "image/png";

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Writes the PNG bytes to `path`, creating missing parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, &self.bytes)
    }
}

/// Paints bitmaps onto a pixel canvas and encodes them as PNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rasterizer {
    config: RenderConfig,
}

impl Rasterizer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Side length in pixels of the image for `bitmap`, quiet zone included.
    pub fn canvas_side(&self, bitmap: &Bitmap) -> Result<u32, RenderError> {
        if self.config.module_size == 0 {
            return Err(RenderError::InvalidConfig("module size must be at least 1".into()));
        }
        u32::try_from(bitmap.size())
            .ok()
            .and_then(|size| self.config.border.checked_mul(2)?.checked_add(size))
            .and_then(|modules| modules.checked_mul(self.config.module_size))
            .ok_or_else(|| RenderError::InvalidConfig("image dimensions overflow".into()))
    }

    /// Renders `bitmap` and encodes it as PNG.
    pub fn render(&self, bitmap: &Bitmap) -> Result<RenderedImage, RenderError> {
        let side = self.canvas_side(bitmap)?;
        let bytes = if self.config.is_grayscale() {
            let dark = Luma([self.config.dark[0]]);
            let light = Luma([self.config.light[0]]);
            let img: GrayImage = self.paint(bitmap, side, dark, light);
            encode_png(&img)?
        } else {
            let img: RgbImage = self.paint(bitmap, side, self.config.dark, self.config.light);
            encode_png(&img)?
        };
        debug!(side, png_bytes = bytes.len(), "rasterized symbol");
        Ok(RenderedImage { bytes, width: side, height: side })
    }

    /// Light background with a `module_size` square of `dark` per dark module.
    fn paint<P>(&self, bitmap: &Bitmap, side: u32, dark: P, light: P) -> ImageBuffer<P, Vec<P::Subpixel>>
    where
        P: Pixel,
    {
        let border = self.config.border as i64;
        let module = self.config.module_size;
        ImageBuffer::from_fn(side, side, |x, y| {
            let qr_x = i64::from(x / module) - border;
            let qr_y = i64::from(y / module) - border;
            let dark_module = i32::try_from(qr_x)
                .ok()
                .zip(i32::try_from(qr_y).ok())
                .is_some_and(|(qx, qy)| bitmap.get(qx, qy));
            if dark_module {
                dark
            } else {
                light
            }
        })
    }
}

fn encode_png<P>(img: &ImageBuffer<P, Vec<P::Subpixel>>) -> Result<Vec<u8>, RenderError>
where
    P: Pixel + image::PixelWithColorType,
    [P::Subpixel]: image::EncodableLayout,
{
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qrcode::Encoder;
    use image::Rgb;

    #[test]
    fn test_default_dimensions() {
        // "Hello, world!" fits version 1: (21 + 2 * 4) * 10
        let bitmap = Encoder::new().encode("Hello, world!").unwrap();
        let image = Rasterizer::default().render(&bitmap).unwrap();
        assert_eq!((image.width(), image.height()), (290, 290));
        assert!(image.bytes().starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn test_pixels_follow_modules() {
        let bitmap = Encoder::new().encode("pixels").unwrap();
        let image = Rasterizer::default().render(&bitmap).unwrap();
        let decoded = image::load_from_memory(image.bytes()).unwrap().to_luma8();
        // Quiet zone corner is white, first finder module is black
        assert_eq!(decoded.get_pixel(0, 0)[0], 255);
        assert_eq!(decoded.get_pixel(39, 39)[0], 255);
        assert_eq!(decoded.get_pixel(40, 40)[0], 0);
        assert_eq!(decoded.get_pixel(49, 49)[0], 0);
        for y in 0..bitmap.size() as u32 {
            for x in 0..bitmap.size() as u32 {
                let px = decoded.get_pixel((x + 4) * 10 + 5, (y + 4) * 10 + 5)[0];
                assert_eq!(px == 0, bitmap.get(x as i32, y as i32));
            }
        }
    }

    #[test]
    fn test_colored_output() {
        let bitmap = Encoder::new().encode("color").unwrap();
        let config = RenderConfig::default()
            .with_module_size(2)
            .with_border(1)
            .with_colors(Rgb([200, 0, 0]), Rgb([255, 255, 255]));
        let image = Rasterizer::new(config).render(&bitmap).unwrap();
        let decoded = image::load_from_memory(image.bytes()).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (46, 46));
        assert_eq!(*decoded.get_pixel(2, 2), Rgb([200, 0, 0]));
        assert_eq!(*decoded.get_pixel(0, 0), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_into_bytes_matches_bytes() {
        let bitmap = Encoder::new().encode("owned").unwrap();
        let image = Rasterizer::default().render(&bitmap).unwrap();
        let borrowed = image.bytes().to_vec();
        assert_eq!(image.into_bytes(), borrowed);
    }

    #[test]
    fn test_config_is_kept() {
        let config = RenderConfig::default().with_module_size(7).with_border(2);
        let rasterizer = Rasterizer::new(config);
        assert_eq!(*rasterizer.config(), config);
        assert_eq!(*Rasterizer::default().config(), RenderConfig::default());
    }

    #[test]
    fn test_zero_module_size_rejected() {
        let bitmap = Encoder::new().encode("zero").unwrap();
        let result = Rasterizer::new(RenderConfig::default().with_module_size(0)).render(&bitmap);
        assert!(matches!(result, Err(RenderError::InvalidConfig(_))));
    }

    #[test]
    fn test_overflowing_dimensions_rejected() {
        let bitmap = Encoder::new().encode("big").unwrap();
        let rasterizer = Rasterizer::new(RenderConfig::default().with_module_size(u32::MAX));
        assert!(matches!(rasterizer.canvas_side(&bitmap), Err(RenderError::InvalidConfig(_))));
    }

    #[test]
    fn test_save_creates_directories() {
        let bitmap = Encoder::new().encode("save").unwrap();
        let image = Rasterizer::default().render(&bitmap).unwrap();
        let dir = std::env::temp_dir().join(format!("qrpng-save-{}", std::process::id()));
        let path = dir.join("nested").join(RenderedImage::FILE_NAME);
        image.save(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), image.bytes());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
