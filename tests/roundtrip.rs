//! End-to-end tests: text is encoded, rendered to PNG, and read back with an
//! independent QR reader.

use qrpng::{generate, Encoder, EncodeError, QrError, RenderConfig, Rasterizer, Version};

/// Decodes the PNG bytes and returns the content of the single QR code found.
fn scan(png: &[u8]) -> String {
    let luma = image::load_from_memory(png).expect("PNG should decode").to_luma8();
    let (w, h) = luma.dimensions();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
        luma.get_pixel(x as u32, y as u32)[0]
    });
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one QR code");
    let (_meta, content) = grids[0].decode().expect("QR code should decode");
    content
}

fn round_trip(text: &str) {
    let image = generate(text, &RenderConfig::default()).unwrap();
    assert_eq!(scan(image.bytes()), text);
}

#[test]
fn test_url_round_trip() {
    round_trip("https://example.com");
}

#[test]
fn test_whitespace_round_trip() {
    round_trip("   ");
}

#[test]
fn test_numeric_round_trip() {
    round_trip("31415926535897932384626433832795");
}

#[test]
fn test_alphanumeric_round_trip() {
    round_trip("HELLO WORLD $%*+-./:");
}

#[test]
fn test_utf8_round_trip() {
    round_trip("Grüße aus Köln, 東京 and ✓");
}

#[test]
fn test_multi_block_round_trip() {
    // Version 10 and up split data across several interleaved blocks
    let text: String = (0..400).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let bitmap = Encoder::new().encode(&text).unwrap();
    assert!(bitmap.version() >= Version::new(10));
    round_trip(&text);
}

#[test]
fn test_version_with_version_information_round_trip() {
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(4);
    let bitmap = Encoder::new().encode(&text).unwrap();
    assert!(bitmap.version() >= Version::new(7));
    round_trip(&text);
}

#[test]
fn test_largest_capacity_round_trip() {
    let text: String = (0..2953).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let bitmap = Encoder::new().encode(&text).unwrap();
    assert_eq!(bitmap.version(), Version::MAX);
    let image = Rasterizer::new(RenderConfig::default().with_module_size(4))
        .render(&bitmap)
        .unwrap();
    assert_eq!(scan(image.bytes()), text);
}

#[test]
fn test_binary_round_trip() {
    let data = "binary payload: ÄÖÜ".as_bytes();
    let bitmap = Encoder::new().encode_binary(data).unwrap();
    let image = Rasterizer::default().render(&bitmap).unwrap();
    assert_eq!(scan(&image.into_bytes()).as_bytes(), data);
}

#[test]
fn test_capacity_boundary() {
    let encoder = Encoder::new();
    assert_eq!(encoder.encode(&"q".repeat(2952)).unwrap().size(), 177);
    assert_eq!(encoder.encode(&"q".repeat(2953)).unwrap().size(), 177);
    assert!(matches!(
        encoder.encode(&"q".repeat(2954)),
        Err(EncodeError::DataTooLarge { .. })
    ));
    assert!(matches!(
        generate(&"q".repeat(2954), &RenderConfig::default()),
        Err(QrError::Encode(EncodeError::DataTooLarge { .. }))
    ));
}

#[test]
fn test_sizes_are_valid_versions() {
    let encoder = Encoder::new();
    for len in (1..=2953).step_by(97) {
        let bitmap = encoder.encode(&"m".repeat(len)).unwrap();
        let size = bitmap.size();
        assert!((21..=177).contains(&size));
        assert_eq!((size - 21) % 4, 0);
        assert_eq!(size, 17 + 4 * usize::from(bitmap.version().value()));
    }
}

#[test]
fn test_render_is_deterministic() {
    let config = RenderConfig::default();
    let first = generate("determinism check", &config).unwrap();
    let second = generate("determinism check", &config).unwrap();
    assert_eq!(first.bytes(), second.bytes());
}

#[test]
fn test_image_dimensions() {
    let bitmap = Encoder::new().encode("https://example.com").unwrap();
    let image = generate("https://example.com", &RenderConfig::default()).unwrap();
    let expected = (bitmap.size() as u32 + 8) * 10;
    assert_eq!((image.width(), image.height()), (expected, expected));
    let decoded = image::load_from_memory(image.bytes()).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (expected, expected));
}

#[test]
fn test_empty_input_never_encodes() {
    assert!(matches!(generate("", &RenderConfig::default()), Err(QrError::EmptyInput)));
}
