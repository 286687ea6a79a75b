use crate::qrcode::{Mask, QrCodeEcc, Version};

/// An encoded QR symbol: an immutable square grid of dark and light modules.
///
/// The side length is always `17 + 4 * version`, between 21 and 177.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    version: Version,
    ecl: QrCodeEcc,
    mask: Mask,
    modules: Vec<bool>,
}

impl Bitmap {
    /// Quiet zone width in modules that a symbol must be rendered with.
    pub const BORDER: u32 = 4;

    pub(crate) fn new(version: Version, ecl: QrCodeEcc, mask: Mask, modules: Vec<bool>) -> Self {
        debug_assert_eq!(modules.len(), version.size() * version.size());
        Self { version, ecl, mask, modules }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn ecl(&self) -> QrCodeEcc {
        self.ecl
    }

    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Width and height in modules.
    pub fn size(&self) -> usize {
        self.version.size()
    }

    /// Returns `true` for a dark module. Coordinates outside the symbol are light.
    pub fn get(&self, x: i32, y: i32) -> bool {
        let range = 0..self.size() as i32;
        range.contains(&x) && range.contains(&y) && self.modules[y as usize * self.size() + x as usize]
    }

    /// Rows from top to bottom, each left to right.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.modules.chunks(self.size())
    }

    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|&&m| m).count()
    }

    /// Text rendering for terminals, two characters per module, quiet zone included.
    pub fn to_text(&self) -> String {
        let border = Self::BORDER as i32;
        let size = self.size() as i32;
        let mut out = String::with_capacity(((size + 2 * border) * (size + 2 * border + 1) * 2) as usize);
        for y in -border..size + border {
            for x in -border..size + border {
                out.push_str(if self.get(x, y) { "██" } else { "  " });
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::qrcode::Encoder;

    #[test]
    fn test_finder_corners() {
        let bitmap = Encoder::new().encode("HELLO WORLD").unwrap();
        let last = bitmap.size() as i32 - 1;
        for (x, y) in [(0, 0), (last, 0), (0, last)] {
            assert!(bitmap.get(x, y));
        }
        // Separator next to the top-left finder
        assert!(!bitmap.get(7, 0));
        assert!(!bitmap.get(0, 7));
    }

    #[test]
    fn test_out_of_range_is_light() {
        let bitmap = Encoder::new().encode("x").unwrap();
        assert!(!bitmap.get(-1, 0));
        assert!(!bitmap.get(0, bitmap.size() as i32));
    }

    #[test]
    fn test_rows() {
        let bitmap = Encoder::new().encode("rows").unwrap();
        assert_eq!(bitmap.rows().count(), bitmap.size());
        assert!(bitmap.rows().all(|row| row.len() == bitmap.size()));
        let dark: usize = bitmap.rows().map(|row| row.iter().filter(|&&m| m).count()).sum();
        assert_eq!(dark, bitmap.dark_count());
    }

    #[test]
    fn test_to_text_dimensions() {
        let bitmap = Encoder::new().encode("preview").unwrap();
        let text = bitmap.to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), bitmap.size() + 8);
        assert!(lines[0].trim().is_empty());
        assert_eq!(lines[4].chars().count(), (bitmap.size() + 8) * 2);
    }
}
