//! Reed–Solomon error correction and the per-version block tables.

use crate::qrcode::{QrCodeEcc, Version};

/// Number of error correction codewords in each block, indexed by `[ecl][version]`.
/// Index 0 of each row is padding so versions index directly.
static ECC_CODEWORDS_PER_BLOCK: [[u8; 41]; 4] = [
    [
        0, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28, 30,
        30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        0, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        0, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30, 30,
        30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        0, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24, 30,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

/// Number of error correction blocks, indexed by `[ecl][version]`.
static NUM_ERROR_CORRECTION_BLOCKS: [[u8; 41]; 4] = [
    [
        0, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        0, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        0, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29,
        34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        0, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32, 35,
        37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];

fn table_get(table: &[[u8; 41]; 4], ver: Version, ecl: QrCodeEcc) -> usize {
    usize::from(table[ecl.ordinal()][usize::from(ver.value())])
}

/// Number of modules available for data and ECC codewords once every function
/// pattern is drawn. May include up to 7 remainder bits.
pub(crate) fn num_raw_data_modules(ver: Version) -> usize {
    let ver = usize::from(ver.value());
    let mut result = (16 * ver + 128) * ver + 64;
    if ver >= 2 {
        let numalign = ver / 7 + 2;
        result -= (25 * numalign - 10) * numalign - 55;
        if ver >= 7 {
            result -= 36;
        }
    }
    result
}

/// Number of 8-bit data codewords a symbol of this version and level can hold.
pub(crate) fn num_data_codewords(ver: Version, ecl: QrCodeEcc) -> usize {
    num_raw_data_modules(ver) / 8
        - table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl) * table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl)
}

/// Splits `data` into blocks, appends the ECC of each block and interleaves the
/// result into the final codeword sequence.
pub(crate) fn add_ecc_and_interleave(data: &[u8], ver: Version, ecl: QrCodeEcc) -> Vec<u8> {
    debug_assert_eq!(data.len(), num_data_codewords(ver, ecl));
    let numblocks = table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl);
    let blockecclen = table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl);
    let rawcodewords = num_raw_data_modules(ver) / 8;
    let numshortblocks = numblocks - rawcodewords % numblocks;
    let shortblocklen = rawcodewords / numblocks;

    let rs = ReedSolomonGenerator::new(blockecclen);
    let mut blocks: Vec<Vec<u8>> = Vec::with_capacity(numblocks);
    let mut rest = data;
    for i in 0..numblocks {
        let datlen = shortblocklen - blockecclen + usize::from(i >= numshortblocks);
        let (dat, tail) = rest.split_at(datlen);
        rest = tail;
        let mut block = dat.to_vec();
        // Short blocks get a placeholder byte so every block has equal length
        if i < numshortblocks {
            block.push(0);
        }
        block.extend(rs.remainder(dat));
        blocks.push(block);
    }
    debug_assert!(rest.is_empty());

    let mut result = Vec::with_capacity(rawcodewords);
    for i in 0..blocks[0].len() {
        for (j, block) in blocks.iter().enumerate() {
            // Skip the placeholder in short blocks
            if i != shortblocklen - blockecclen || j >= numshortblocks {
                result.push(block[i]);
            }
        }
    }
    debug_assert_eq!(result.len(), rawcodewords);
    result
}

/// Generator polynomial for a fixed number of ECC codewords, stored without the
/// leading coefficient (which is always 1).
pub(crate) struct ReedSolomonGenerator {
    divisor: Vec<u8>,
}

impl ReedSolomonGenerator {
    /// Builds the generator `(x - 2^0)(x - 2^1)...(x - 2^(degree-1))`.
    pub(crate) fn new(degree: usize) -> Self {
        assert!((1..=255).contains(&degree), "Degree out of range");
        let mut divisor = vec![0u8; degree];
        divisor[degree - 1] = 1;
        let mut root: u8 = 1;
        for _ in 0..degree {
            for j in 0..degree {
                divisor[j] = gf_multiply(divisor[j], root);
                if j + 1 < degree {
                    divisor[j] ^= divisor[j + 1];
                }
            }
            root = gf_multiply(root, 0x02);
        }
        Self { divisor }
    }

    pub(crate) fn degree(&self) -> usize {
        self.divisor.len()
    }

    /// Remainder of `data * x^degree` divided by the generator.
    pub(crate) fn remainder(&self, data: &[u8]) -> Vec<u8> {
        let mut result = vec![0u8; self.degree()];
        for &b in data {
            let factor = b ^ result[0];
            result.rotate_left(1);
            if let Some(last) = result.last_mut() {
                *last = 0;
            }
            for (x, &y) in result.iter_mut().zip(&self.divisor) {
                *x ^= gf_multiply(y, factor);
            }
        }
        result
    }
}

/// Product of two elements of GF(2^8) modulo `x^8 + x^4 + x^3 + x^2 + 1`.
pub(crate) fn gf_multiply(x: u8, y: u8) -> u8 {
    let mut z: u8 = 0;
    for i in (0..8).rev() {
        z = (z << 1) ^ ((z >> 7) * 0x1d);
        z ^= ((y >> i) & 1) * x;
    }
    z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gf_multiply() {
        assert_eq!(gf_multiply(0, 0x53), 0);
        assert_eq!(gf_multiply(1, 0x53), 0x53);
        assert_eq!(gf_multiply(0x02, 0x80), 0x1d);
        assert_eq!(gf_multiply(0x53, 0xca), gf_multiply(0xca, 0x53));
    }

    #[test]
    fn test_generator_degree_seven() {
        // Exponents of the version 1-L generator: 87, 229, 146, 149, 238, 102, 21
        let rs = ReedSolomonGenerator::new(7);
        assert_eq!(rs.divisor, vec![0x7f, 0x7a, 0x9a, 0xa4, 0x0b, 0x44, 0x75]);
    }

    #[test]
    fn test_codeword_divisible_by_generator() {
        let rs = ReedSolomonGenerator::new(10);
        let data: Vec<u8> = (0u8..16).map(|i| i.wrapping_mul(37) ^ 0x5a).collect();
        let ecc = rs.remainder(&data);
        let mut codeword = data.clone();
        codeword.extend(&ecc);
        // A full codeword divided by the generator leaves no remainder
        let check = rs.remainder(&codeword);
        assert!(check.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_capacity_tables() {
        assert_eq!(num_raw_data_modules(Version::MIN), 208);
        assert_eq!(num_data_codewords(Version::MIN, QrCodeEcc::Low), 19);
        assert_eq!(num_data_codewords(Version::MAX, QrCodeEcc::Low), 2956);
        assert_eq!(num_data_codewords(Version::MAX, QrCodeEcc::High), 1276);
    }

    #[test]
    fn test_interleave_length() {
        for v in [1u8, 5, 10, 27, 40] {
            let ver = Version::new(v);
            let data = vec![0xa5u8; num_data_codewords(ver, QrCodeEcc::Low)];
            let all = add_ecc_and_interleave(&data, ver, QrCodeEcc::Low);
            assert_eq!(all.len(), num_raw_data_modules(ver) / 8);
        }
    }
}
