//! # qrpng
//!
//! Turn text into a scannable QR code PNG.
//!
//! `qrpng` encodes text into QR Code Model 2 symbols without relying on an external QR
//! library: it selects the densest single segment mode (numeric, alphanumeric or byte),
//! the smallest version from 1 to 40, computes Reed–Solomon error correction, places
//! function patterns and data, and picks the mask with the lowest penalty. The result
//! is rasterized to PNG with the `image` crate.
//!
//! ## Example
//!
//! The one-call pipeline, as a front end would use it:
//!
//! ```rust
//! use qrpng::{generate, RenderConfig, RenderedImage};
//!
//! let image = generate("https://example.com", &RenderConfig::default()).unwrap();
//! assert_eq!(RenderedImage::MIME_TYPE, "image/png");
//! assert!(image.bytes().starts_with(b"\x89PNG"));
//! ```
//!
//! Encoding and rasterizing separately:
//!
//! ```rust
//! use qrpng::{Encoder, Rasterizer, RenderConfig};
//!
//! let bitmap = Encoder::new().encode("Hello, World!").unwrap();
//! let image = Rasterizer::new(RenderConfig::default().with_module_size(4))
//!     .render(&bitmap)
//!     .unwrap();
//! assert_eq!(image.width(), (bitmap.size() as u32 + 8) * 4);
//! ```
//!
//! ## Modules
//!
//! - [`qrcode`]: QR encoding (version, mask and level types, the [`Encoder`]).
//! - [`segment`]: segment modes and their bit streams.
//! - [`raster`]: PNG rendering.
//! - [`pipeline`]: the text-to-PNG entry point.

pub mod bitmap;
pub mod config;
mod ecc;
pub mod error;
pub mod pipeline;
pub mod qrcode;
pub mod raster;
pub mod segment;

pub use bitmap::Bitmap;
pub use config::RenderConfig;
pub use error::{EncodeError, QrError, RenderError};
pub use pipeline::{generate, generate_with_bitmap};
pub use qrcode::{Encoder, Mask, QrCodeEcc, Version};
pub use raster::{Rasterizer, RenderedImage};
