//! Data segments: mode selection and the bit stream each mode produces.

use crate::error::EncodeError;
use crate::qrcode::Version;

static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Encoding mode of a data segment.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SegmentMode {
    Numeric,
    Alphanumeric,
    Byte,
}

impl SegmentMode {
    /// The 4-bit mode indicator.
    fn mode_bits(self) -> u32 {
        match self {
            SegmentMode::Numeric => 0x1,
            SegmentMode::Alphanumeric => 0x2,
            SegmentMode::Byte => 0x4,
        }
    }

    /// Width of the character count field for the given version.
    pub fn num_char_count_bits(self, ver: Version) -> u8 {
        let widths = match self {
            SegmentMode::Numeric => [10, 12, 14],
            SegmentMode::Alphanumeric => [9, 11, 13],
            SegmentMode::Byte => [8, 16, 16],
        };
        widths[usize::from((ver.value() + 7) / 17)]
    }
}

/// A run of input encoded in a single mode.
#[derive(Clone, Debug)]
pub struct Segment {
    mode: SegmentMode,
    numchars: usize,
    data: BitBuffer,
}

impl Segment {
    /// Picks the densest single mode able to represent `text` and encodes it.
    pub fn from_text(text: &str) -> Result<Self, EncodeError> {
        if is_numeric(text) {
            Self::make_numeric(text)
        } else if is_alphanumeric(text) {
            Self::make_alphanumeric(text)
        } else {
            Ok(Self::make_bytes(text.as_bytes()))
        }
    }

    pub fn make_bytes(data: &[u8]) -> Self {
        let mut bb = BitBuffer::with_capacity(data.len() * 8);
        for &b in data {
            bb.append_bits(u32::from(b), 8);
        }
        Self { mode: SegmentMode::Byte, numchars: data.len(), data: bb }
    }

    /// Digits are packed three at a time into 10 bits; a trailing group of one or
    /// two digits takes 4 or 7 bits.
    pub fn make_numeric(text: &str) -> Result<Self, EncodeError> {
        let mut bb = BitBuffer::with_capacity(text.len() * 10 / 3 + 7);
        let mut accumdata: u32 = 0;
        let mut accumcount: u8 = 0;
        for b in text.bytes() {
            if !b.is_ascii_digit() {
                return Err(EncodeError::EncodingFailure(format!(
                    "byte {b:#04x} is not valid in numeric mode"
                )));
            }
            accumdata = accumdata * 10 + u32::from(b - b'0');
            accumcount += 1;
            if accumcount == 3 {
                bb.append_bits(accumdata, 10);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            bb.append_bits(accumdata, accumcount * 3 + 1);
        }
        Ok(Self { mode: SegmentMode::Numeric, numchars: text.len(), data: bb })
    }

    /// Characters are packed two at a time into 11 bits; an odd final character
    /// takes 6 bits.
    pub fn make_alphanumeric(text: &str) -> Result<Self, EncodeError> {
        let mut bb = BitBuffer::with_capacity(text.len() * 11 / 2 + 6);
        let mut accumdata: u32 = 0;
        let mut accumcount: u8 = 0;
        for c in text.chars() {
            let index = ALPHANUMERIC_CHARSET.find(c).ok_or_else(|| {
                EncodeError::EncodingFailure(format!("{c:?} is not valid in alphanumeric mode"))
            })?;
            // The charset is ASCII, so the index is at most 44
            accumdata = accumdata * 45 + index as u32;
            accumcount += 1;
            if accumcount == 2 {
                bb.append_bits(accumdata, 11);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            bb.append_bits(accumdata, 6);
        }
        Ok(Self { mode: SegmentMode::Alphanumeric, numchars: text.chars().count(), data: bb })
    }

    pub fn mode(&self) -> SegmentMode {
        self.mode
    }

    pub fn num_chars(&self) -> usize {
        self.numchars
    }

    /// Bits needed by mode indicator, count field and payload, ignoring whether
    /// the count fits its field.
    pub fn header_and_payload_bits(&self, version: Version) -> usize {
        4 + usize::from(self.mode.num_char_count_bits(version)) + self.data.len()
    }

    /// Total bits this segment occupies in a symbol of `version`, header included.
    /// `None` when the character count does not fit the count field.
    pub fn total_bits(&self, version: Version) -> Option<usize> {
        let ccbits = self.mode.num_char_count_bits(version);
        if self.numchars >= 1usize << ccbits {
            return None;
        }
        4usize.checked_add(usize::from(ccbits))?.checked_add(self.data.len())
    }

    /// Appends mode indicator, character count and payload to `bb`.
    pub(crate) fn write_to(&self, bb: &mut BitBuffer, version: Version) -> Result<(), EncodeError> {
        let count = u32::try_from(self.numchars)
            .map_err(|_| EncodeError::EncodingFailure("character count overflow".into()))?;
        bb.append_bits(self.mode.mode_bits(), 4);
        bb.append_bits(count, self.mode.num_char_count_bits(version));
        bb.append_buffer(&self.data);
        Ok(())
    }
}

pub fn is_numeric(text: &str) -> bool {
    text.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_alphanumeric(text: &str) -> bool {
    text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c))
}

/// A growable sequence of bits, most significant bit first within each byte.
#[derive(Clone, Debug, Default)]
pub(crate) struct BitBuffer {
    data: Vec<u8>,
    length: usize,
}

impl BitBuffer {
    pub(crate) fn with_capacity(bits: usize) -> Self {
        Self { data: Vec::with_capacity(bits.div_ceil(8)), length: 0 }
    }

    pub(crate) fn len(&self) -> usize {
        self.length
    }

    /// Appends the low `len` bits of `val`, most significant first.
    pub(crate) fn append_bits(&mut self, val: u32, len: u8) {
        debug_assert!(len <= 31 && (val >> len) == 0);
        for i in (0..len).rev() {
            self.push_bit((val >> i) & 1 != 0);
        }
    }

    pub(crate) fn append_buffer(&mut self, other: &BitBuffer) {
        for i in 0..other.length {
            self.push_bit(other.bit(i));
        }
    }

    fn push_bit(&mut self, bit: bool) {
        let shift = 7 - (self.length & 7);
        if shift == 7 {
            self.data.push(0);
        }
        if bit {
            if let Some(last) = self.data.last_mut() {
                *last |= 1 << shift;
            }
        }
        self.length += 1;
    }

    fn bit(&self, i: usize) -> bool {
        (self.data[i >> 3] >> (7 - (i & 7))) & 1 != 0
    }

    /// The packed bytes. Only meaningful once the length is a multiple of 8.
    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
