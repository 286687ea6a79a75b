#![forbid(unsafe_code)]
//! QR code encoding functionality.
//!
//! Turns text into a QR Code Model 2 symbol: segment mode selection, version selection,
//! Reed–Solomon error correction, function pattern and data placement, and masking.
//! The result is an immutable [`Bitmap`].

use tracing::debug;

use crate::bitmap::Bitmap;
use crate::ecc;
use crate::error::EncodeError;
use crate::segment::{BitBuffer, Segment};

/// Encodes text into QR symbols at a fixed error correction level.
///
/// The smallest version that holds the data is always chosen, and the mask is picked
/// by lowest penalty score. Encoding is a pure function of the input.
///
/// # Example
///
/// ```rust
/// use qrpng::qrcode::Encoder;
///
/// let bitmap = Encoder::new().encode("Hello, World!").unwrap();
/// assert_eq!(bitmap.size(), 21);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Encoder {
    ecl: QrCodeEcc,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// An encoder at [`QrCodeEcc::Low`].
    pub fn new() -> Self {
        Self { ecl: QrCodeEcc::Low }
    }

    pub fn with_ecl(ecl: QrCodeEcc) -> Self {
        Self { ecl }
    }

    pub fn ecl(&self) -> QrCodeEcc {
        self.ecl
    }

    /// Encodes `text` into a QR symbol.
    ///
    /// # Errors
    ///
    /// [`EncodeError::DataTooLarge`] if the text does not fit version 40 at this
    /// encoder's level, [`EncodeError::EncodingFailure`] on an internal inconsistency.
    pub fn encode(&self, text: &str) -> Result<Bitmap, EncodeError> {
        let seg = Segment::from_text(text)?;
        debug!(mode = ?seg.mode(), chars = seg.num_chars(), "selected segment mode");
        self.encode_segment(&seg)
    }

    /// Encodes arbitrary bytes in byte mode.
    pub fn encode_binary(&self, data: &[u8]) -> Result<Bitmap, EncodeError> {
        self.encode_segment(&Segment::make_bytes(data))
    }

    /// Encodes a prepared segment into the smallest fitting symbol.
    pub fn encode_segment(&self, seg: &Segment) -> Result<Bitmap, EncodeError> {
        let (version, usedbits) = self.select_version(seg)?;
        let datacodewords = self.build_data_codewords(seg, version, usedbits)?;
        let allcodewords = ecc::add_ecc_and_interleave(&datacodewords, version, self.ecl);

        let mut symbol = Symbol::with_function_patterns(version);
        symbol.draw_codewords(&allcodewords)?;
        let mask = symbol.apply_best_mask(self.ecl);
        debug!(version = version.value(), mask = mask.value(), ecl = ?self.ecl, "encoded symbol");
        Ok(Bitmap::new(version, self.ecl, mask, symbol.modules))
    }

    /// Finds the minimal version able to hold `seg`, returning it with the number of
    /// data bits the segment uses there.
    fn select_version(&self, seg: &Segment) -> Result<(Version, usize), EncodeError> {
        let mut version = Version::MIN;
        loop {
            let capacitybits = ecc::num_data_codewords(version, self.ecl) * 8;
            let used = seg.total_bits(version);
            match used {
                Some(n) if n <= capacitybits => return Ok((version, n)),
                _ if version >= Version::MAX => {
                    return Err(EncodeError::DataTooLarge {
                        needed_bits: used.unwrap_or_else(|| seg.header_and_payload_bits(version)),
                        capacity_bits: capacitybits,
                    });
                }
                _ => version = Version::new(version.value() + 1),
            }
        }
    }

    /// Header, payload, terminator and padding, as whole codewords.
    fn build_data_codewords(
        &self,
        seg: &Segment,
        version: Version,
        usedbits: usize,
    ) -> Result<Vec<u8>, EncodeError> {
        let capacitybits = ecc::num_data_codewords(version, self.ecl) * 8;
        let mut bb = BitBuffer::with_capacity(capacitybits);
        seg.write_to(&mut bb, version)?;
        if bb.len() != usedbits {
            return Err(EncodeError::EncodingFailure(format!(
                "segment wrote {} bits, expected {}",
                bb.len(),
                usedbits
            )));
        }

        // Terminator of up to four zero bits, then zero fill to a byte boundary
        let terminator = (capacitybits - bb.len()).min(4);
        bb.append_bits(0, terminator as u8);
        let fill = bb.len().wrapping_neg() & 7;
        bb.append_bits(0, fill as u8);

        for &padbyte in [0xec, 0x11].iter().cycle() {
            if bb.len() >= capacitybits {
                break;
            }
            bb.append_bits(padbyte, 8);
        }
        Ok(bb.into_bytes())
    }
}

/// Working matrix while a symbol is being drawn.
struct Symbol {
    version: Version,
    size: usize,
    modules: Vec<bool>,
    is_function: Vec<bool>,
}

impl Symbol {
    /// A blank symbol with finder, timing and alignment patterns drawn, version
    /// information written, and the format areas reserved.
    fn with_function_patterns(version: Version) -> Self {
        let size = version.size();
        let mut symbol = Self {
            version,
            size,
            modules: vec![false; size * size],
            is_function: vec![false; size * size],
        };

        for i in 0..size {
            symbol.set_function(6, i, i % 2 == 0);
            symbol.set_function(i, 6, i % 2 == 0);
        }

        let last = size as i32 - 4;
        symbol.draw_finder_pattern(3, 3);
        symbol.draw_finder_pattern(last, 3);
        symbol.draw_finder_pattern(3, last);

        let positions = version.alignment_pattern_positions();
        let n = positions.len();
        for (i, &x) in positions.iter().enumerate() {
            for (j, &y) in positions.iter().enumerate() {
                // The three corners overlap finder patterns
                let corner = (i == 0 && j == 0) || (i == 0 && j == n - 1) || (i == n - 1 && j == 0);
                if !corner {
                    symbol.draw_alignment_pattern(x, y);
                }
            }
        }

        // Placeholder until the mask is known
        symbol.draw_format_bits(QrCodeEcc::Low, Mask::new(0));
        symbol.draw_version();
        symbol
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.size + x
    }

    fn get(&self, x: usize, y: usize) -> bool {
        self.modules[self.index(x, y)]
    }

    fn set_function(&mut self, x: usize, y: usize, isdark: bool) {
        let i = self.index(x, y);
        self.modules[i] = isdark;
        self.is_function[i] = true;
    }

    fn draw_finder_pattern(&mut self, cx: i32, cy: i32) {
        let range = 0..self.size as i32;
        for dy in -4i32..=4 {
            for dx in -4i32..=4 {
                let (x, y) = (cx + dx, cy + dy);
                if range.contains(&x) && range.contains(&y) {
                    // Rings at distance 2 and 4 are light; 4 is the separator
                    let dist = dx.abs().max(dy.abs());
                    self.set_function(x as usize, y as usize, dist != 2 && dist != 4);
                }
            }
        }
    }

    fn draw_alignment_pattern(&mut self, cx: usize, cy: usize) {
        for dy in -2i32..=2 {
            for dx in -2i32..=2 {
                let x = (cx as i32 + dx) as usize;
                let y = (cy as i32 + dy) as usize;
                self.set_function(x, y, dx.abs().max(dy.abs()) != 1);
            }
        }
    }

    /// Writes both copies of the 15-bit format information and the dark module.
    fn draw_format_bits(&mut self, ecl: QrCodeEcc, mask: Mask) {
        let bits = format_bits(ecl, mask);
        let size = self.size;

        for i in 0..6 {
            self.set_function(8, i, get_bit(bits, i as u8));
        }
        self.set_function(8, 7, get_bit(bits, 6));
        self.set_function(8, 8, get_bit(bits, 7));
        self.set_function(7, 8, get_bit(bits, 8));
        for i in 9..15 {
            self.set_function(14 - i, 8, get_bit(bits, i as u8));
        }

        for i in 0..8 {
            self.set_function(size - 1 - i, 8, get_bit(bits, i as u8));
        }
        for i in 8..15 {
            self.set_function(8, size - 15 + i, get_bit(bits, i as u8));
        }
        self.set_function(8, size - 8, true);
    }

    /// Version information blocks; only present from version 7 up.
    fn draw_version(&mut self) {
        let ver = u32::from(self.version.value());
        if ver < 7 {
            return;
        }
        let mut rem = ver;
        for _ in 0..12 {
            rem = (rem << 1) ^ ((rem >> 11) * 0x1f25);
        }
        let bits = (ver << 12) | rem;
        for i in 0u8..18 {
            let bit = get_bit(bits, i);
            let a = self.size - 11 + usize::from(i % 3);
            let b = usize::from(i / 3);
            self.set_function(a, b, bit);
            self.set_function(b, a, bit);
        }
    }

    /// Places codewords in the zig-zag column pairs, right to left, skipping the
    /// vertical timing column and every function module.
    fn draw_codewords(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        let expected = ecc::num_raw_data_modules(self.version) / 8;
        if data.len() != expected {
            return Err(EncodeError::EncodingFailure(format!(
                "got {} codewords for version {}, expected {}",
                data.len(),
                self.version.value(),
                expected
            )));
        }
        let size = self.size;
        let totalbits = data.len() * 8;
        let mut i = 0usize;
        let mut right = size as i32 - 1;
        while right >= 1 {
            if right == 6 {
                right = 5;
            }
            let upward = ((right + 1) & 2) == 0;
            for vert in 0..size {
                let y = if upward { size - 1 - vert } else { vert };
                for j in 0..2 {
                    let x = (right - j) as usize;
                    let idx = self.index(x, y);
                    if !self.is_function[idx] && i < totalbits {
                        self.modules[idx] = get_bit(u32::from(data[i >> 3]), 7 - (i & 7) as u8);
                        i += 1;
                    }
                }
            }
            right -= 2;
        }
        // Any remainder bits were left light
        debug_assert_eq!(i, totalbits);
        Ok(())
    }

    /// XORs every data module with the mask pattern. Applying twice undoes it.
    fn apply_mask(&mut self, mask: Mask) {
        for y in 0..self.size {
            for x in 0..self.size {
                let idx = self.index(x, y);
                if !self.is_function[idx] && mask.inverts(x, y) {
                    self.modules[idx] = !self.modules[idx];
                }
            }
        }
    }

    /// Tries every mask, keeps the one with the lowest penalty and returns it.
    fn apply_best_mask(&mut self, ecl: QrCodeEcc) -> Mask {
        let mut best = Mask::new(0);
        let mut minpenalty = i32::MAX;
        for m in 0u8..8 {
            let mask = Mask::new(m);
            self.apply_mask(mask);
            self.draw_format_bits(ecl, mask);
            let penalty = self.penalty_score();
            if penalty < minpenalty {
                best = mask;
                minpenalty = penalty;
            }
            self.apply_mask(mask);
        }
        self.apply_mask(best);
        self.draw_format_bits(ecl, best);
        best
    }

    fn penalty_score(&self) -> i32 {
        let size = self.size;
        let mut result = 0;

        // Runs and finder-like patterns, rows then columns
        for horizontal in [true, false] {
            for a in 0..size {
                let mut runcolor = false;
                let mut runlen = 0i32;
                let mut history = FinderPenalty::new(size);
                for b in 0..size {
                    let color = if horizontal { self.get(b, a) } else { self.get(a, b) };
                    if color == runcolor {
                        runlen += 1;
                        if runlen == 5 {
                            result += PENALTY_N1;
                        } else if runlen > 5 {
                            result += 1;
                        }
                    } else {
                        history.add_history(runlen);
                        if !runcolor {
                            result += history.count_patterns() * PENALTY_N3;
                        }
                        runcolor = color;
                        runlen = 1;
                    }
                }
                result += history.terminate_and_count(runcolor, runlen) * PENALTY_N3;
            }
        }

        // 2x2 blocks of one color
        for y in 0..size - 1 {
            for x in 0..size - 1 {
                let color = self.get(x, y);
                if color == self.get(x + 1, y)
                    && color == self.get(x, y + 1)
                    && color == self.get(x + 1, y + 1)
                {
                    result += PENALTY_N2;
                }
            }
        }

        // Dark/light balance
        let dark = self.modules.iter().filter(|&&m| m).count() as i32;
        let total = (size * size) as i32;
        let k = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
        result + k * PENALTY_N4
    }
}

/// Tracks the last seven run lengths of a row or column to spot 1:1:3:1:1 patterns.
struct FinderPenalty {
    qr_size: i32,
    run_history: [i32; 7],
}

impl FinderPenalty {
    fn new(size: usize) -> Self {
        Self { qr_size: size as i32, run_history: [0; 7] }
    }

    fn add_history(&mut self, mut currentrunlength: i32) {
        // The light border outside the symbol counts toward the first run
        if self.run_history[0] == 0 {
            currentrunlength += self.qr_size;
        }
        self.run_history.copy_within(0..6, 1);
        self.run_history[0] = currentrunlength;
    }

    fn count_patterns(&self) -> i32 {
        let rh = &self.run_history;
        let n = rh[1];
        let core = n > 0 && rh[2] == n && rh[3] == n * 3 && rh[4] == n && rh[5] == n;
        i32::from(core && rh[0] >= n * 4 && rh[6] >= n) + i32::from(core && rh[6] >= n * 4 && rh[0] >= n)
    }

    fn terminate_and_count(mut self, currentruncolor: bool, mut currentrunlength: i32) -> i32 {
        if currentruncolor {
            self.add_history(currentrunlength);
            currentrunlength = 0;
        }
        currentrunlength += self.qr_size;
        self.add_history(currentrunlength);
        self.count_patterns()
    }
}

const PENALTY_N1: i32 = 3;
const PENALTY_N2: i32 = 3;
const PENALTY_N3: i32 = 40;
const PENALTY_N4: i32 = 10;

/// The 15-bit format word: level and mask protected by a BCH(15,5) code.
pub(crate) fn format_bits(ecl: QrCodeEcc, mask: Mask) -> u32 {
    let data = u32::from((ecl.format_bits() << 3) | mask.value());
    let mut rem = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
    }
    ((data << 10) | rem) ^ 0x5412
}

fn get_bit(x: u32, i: u8) -> bool {
    ((x >> i) & 1) != 0
}

/// Error correction level for a QR code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub enum QrCodeEcc {
    /// Tolerates ~7% erroneous codewords.
    #[default]
    Low,
    /// Tolerates ~15% erroneous codewords.
    Medium,
    /// Tolerates ~25% erroneous codewords.
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    High,
}

impl QrCodeEcc {
    pub(crate) fn ordinal(self) -> usize {
        match self {
            QrCodeEcc::Low => 0,
            QrCodeEcc::Medium => 1,
            QrCodeEcc::Quartile => 2,
            QrCodeEcc::High => 3,
        }
    }

    /// Two-bit value stored in the format information.
    fn format_bits(self) -> u8 {
        match self {
            QrCodeEcc::Low => 1,
            QrCodeEcc::Medium => 0,
            QrCodeEcc::Quartile => 3,
            QrCodeEcc::High => 2,
        }
    }
}

/// A QR code version (1–40).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct Version(u8);

impl Version {
    pub const MIN: Version = Version(1);
    pub const MAX: Version = Version(40);

    /// # Panics
    ///
    /// Panics if the number is outside the range [1, 40].
    pub const fn new(ver: u8) -> Self {
        assert!(
            Version::MIN.value() <= ver && ver <= Version::MAX.value(),
            "Version number out of range"
        );
        Self(ver)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Side length in modules, `17 + 4 * version`.
    pub const fn size(self) -> usize {
        self.0 as usize * 4 + 17
    }

    /// Centre coordinates of the alignment patterns, ascending. Empty for version 1.
    pub fn alignment_pattern_positions(self) -> Vec<usize> {
        let ver = usize::from(self.0);
        if ver == 1 {
            return Vec::new();
        }
        let numalign = ver / 7 + 2;
        let step = if ver == 32 {
            26
        } else {
            (ver * 4 + numalign * 2 + 1) / (numalign * 2 - 2) * 2
        };
        let mut result: Vec<usize> = (0..numalign - 1).map(|i| self.size() - 7 - i * step).collect();
        result.push(6);
        result.reverse();
        result
    }
}

/// A mask pattern (0–7).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct Mask(u8);

impl Mask {
    /// # Panics
    ///
    /// Panics if the number is outside the range [0, 7].
    pub const fn new(mask: u8) -> Self {
        assert!(mask <= 7, "Mask value out of range");
        Self(mask)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Whether this mask flips the module at column `x`, row `y`.
    pub fn inverts(self, x: usize, y: usize) -> bool {
        match self.0 {
            0 => (x + y) % 2 == 0,
            1 => y % 2 == 0,
            2 => x % 3 == 0,
            3 => (x + y) % 3 == 0,
            4 => (x / 3 + y / 2) % 2 == 0,
            5 => (x * y) % 2 + (x * y) % 3 == 0,
            6 => ((x * y) % 2 + (x * y) % 3) % 2 == 0,
            _ => ((x + y) % 2 + (x * y) % 3) % 2 == 0,
        }
    }
}
