// Licensed under the Apache-2.0 license

use crc::{Algorithm, Crc};

/// CRC-8 with polynomial 0x31, MSB first, no reflection and no final XOR.
const CRC_8_OTA_ALGORITHM: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x31,
    init: 0x00,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0xa2,
    residue: 0x00,
};

const CRC_8_OTA: Crc<u8> = Crc::<u8>::new(&CRC_8_OTA_ALGORITHM);

/// CRC-8 of `data` starting from `seed`.
///
/// `seed` is the running value of a previous call, which lets a checksum be
/// continued across several non-contiguous byte ranges.
pub fn crc8(seed: u8, data: &[u8]) -> u8 {
    let mut digest = CRC_8_OTA.digest_with_initial(seed);
    digest.update(data);
    digest.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitwise_crc8(seed: u8, data: &[u8]) -> u8 {
        data.iter().fold(seed, |mut crc, &byte| {
            crc ^= byte;
            for _ in 0..8 {
                crc = if crc & 0x80 != 0 {
                    (crc << 1) ^ 0x31
                } else {
                    crc << 1
                };
            }
            crc
        })
    }

    #[test]
    fn test_check_value() {
        assert_eq!(crc8(0, b"123456789"), 0xa2);
    }

    #[test]
    fn test_empty_input_returns_seed() {
        assert_eq!(crc8(0, &[]), 0);
        assert_eq!(crc8(0x5a, &[]), 0x5a);
        assert_eq!(crc8(0xff, &[]), 0xff);
    }

    #[test]
    fn test_header_vector() {
        // magic 0x6420 (little endian) followed by version 1.0
        assert_eq!(crc8(0, &[0x20, 0x64, 0x01, 0x00]), 0x26);
    }

    #[test]
    fn test_seed_continues_running_value() {
        let data = b"partition table bytes";
        let (head, tail) = data.split_at(7);
        assert_eq!(crc8(crc8(0, head), tail), crc8(0, data));

        let header = [0x20, 0x64, 0x01, 0x00];
        let table = [0x00, 0x00, 0x01, 0x08];
        let mut digest = CRC_8_OTA.digest_with_initial(crc8(0, &header));
        digest.update(&table);
        assert_eq!(digest.finalize(), crc8(crc8(0, &header), &table));
        assert_eq!(crc8(crc8(0, &header), &table), crc8(0, &[header, table].concat()));
    }

    #[test]
    fn test_matches_bitwise_definition() {
        let mut data = [0u8; 256];
        for (i, b) in data.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(37).wrapping_add(11);
        }
        for seed in [0x00, 0x26, 0xff] {
            for len in [0, 1, 2, 7, 8, 32, 40, 255, 256] {
                assert_eq!(crc8(seed, &data[..len]), bitwise_crc8(seed, &data[..len]));
            }
        }
    }
}
