//! Text in, PNG out: the single call a front end makes.

use tracing::{info, warn};

use crate::bitmap::Bitmap;
use crate::config::RenderConfig;
use crate::error::QrError;
use crate::qrcode::Encoder;
use crate::raster::{Rasterizer, RenderedImage};

/// Encodes `text` at level Low and renders it with `config`.
///
/// Empty text is rejected before the encoder runs. Whitespace-only text is data like
/// any other and is encoded as-is.
///
/// # Example
///
/// ```rust
/// use qrpng::{generate, RenderConfig};
///
/// // 19 bytes do not fit version 1-L, so this is a version 2 symbol: (25 + 8) * 10
/// let image = generate("https://example.com", &RenderConfig::default()).unwrap();
/// assert_eq!(image.width(), 330);
/// ```
pub fn generate(text: &str, config: &RenderConfig) -> Result<RenderedImage, QrError> {
    generate_with_bitmap(text, config).map(|(_, image)| image)
}

/// Like [`generate`], but also hands back the encoded symbol.
pub fn generate_with_bitmap(
    text: &str,
    config: &RenderConfig,
) -> Result<(Bitmap, RenderedImage), QrError> {
    if text.is_empty() {
        warn!("empty input, nothing to encode");
        return Err(QrError::EmptyInput);
    }

    let bitmap = Encoder::new().encode(text)?;
    let image = Rasterizer::new(*config).render(&bitmap)?;
    info!(
        version = bitmap.version().value(),
        width = image.width(),
        height = image.height(),
        "generated QR code"
    );
    Ok((bitmap, image))
}
