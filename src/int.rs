// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For packing sizes into 4-byte integer fields
//!
//! ID3v2 stores its sizes as 4 big-endian bytes in one of two ways.
//!
//! | Packing | Bits per byte | Maximum value |
//! |--------:|--------------:|--------------:|
//! | [synch-safe](`Packing::SynchSafe`) | 7 | 2²⁸ - 1 |
//! | [normal](`Packing::Normal`) | 8 | 2³² - 1 |
//!
//! Synch-safe integers keep each byte's high bit clear
//! so that a tag's header can never be mistaken for an
//! MPEG audio sync pattern.

use crate::Error;

/// How many bits of each byte an integer field uses
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Packing {
    /// 7 bits per byte, high bit always clear
    SynchSafe,
    /// All 8 bits per byte
    Normal,
}

impl Packing {
    /// The number of value bits held in each byte
    #[inline]
    pub const fn bits_per_byte(self) -> u32 {
        match self {
            Self::SynchSafe => 7,
            Self::Normal => 8,
        }
    }

    /// The largest value a 4-byte field can hold
    #[inline]
    pub const fn max(self) -> u32 {
        match self {
            Self::SynchSafe => (1 << 28) - 1,
            Self::Normal => u32::MAX,
        }
    }
}

/// Folds 4 big-endian bytes into an integer
///
/// # Errors
///
/// For synch-safe packing, returns [`Error::InvalidSynchSafeInteger`]
/// if any byte has its high bit set.
///
/// # Example
///
/// ```
/// use id3_codec::int::{decode, Packing};
///
/// assert_eq!(decode([0x44, 0x7a, 0x70, 0x04], Packing::SynchSafe).unwrap(), 144619524);
/// assert_eq!(decode([0x0b, 0x95, 0xae, 0xb4], Packing::Normal).unwrap(), 194358964);
/// assert!(decode([0x80, 0x00, 0x00, 0x00], Packing::SynchSafe).is_err());
/// ```
pub fn decode(bytes: [u8; 4], packing: Packing) -> Result<u32, Error> {
    let bits = packing.bits_per_byte();

    bytes.into_iter().try_fold(0u32, |acc, byte| {
        if bits < 8 && u32::from(byte) >> bits != 0 {
            Err(Error::InvalidSynchSafeInteger)
        } else {
            Ok((acc << bits) | u32::from(byte))
        }
    })
}

/// Splits an integer into 4 big-endian bytes
///
/// Only the low [`Packing::bits_per_byte`] bits of each output byte
/// are used, so values beyond [`Packing::max`] are truncated.
///
/// # Example
///
/// ```
/// use id3_codec::int::{encode, Packing};
///
/// assert_eq!(encode(144619524, Packing::SynchSafe), [0x44, 0x7a, 0x70, 0x04]);
/// assert_eq!(encode(194358964, Packing::Normal), [0x0b, 0x95, 0xae, 0xb4]);
/// ```
pub fn encode(value: u32, packing: Packing) -> [u8; 4] {
    let bits = packing.bits_per_byte();
    let mask = (1u32 << bits) - 1;

    [
        ((value >> (bits * 3)) & mask) as u8,
        ((value >> (bits * 2)) & mask) as u8,
        ((value >> bits) & mask) as u8,
        (value & mask) as u8,
    ]
}

/// Reads a 3-byte normal integer, as used by ID3v2.2 frame sizes
#[inline]
pub fn decode_u24([a, b, c]: [u8; 3]) -> u32 {
    (u32::from(a) << 16) | (u32::from(b) << 8) | u32::from(c)
}

/// Writes a 3-byte normal integer, as used by ID3v2.2 frame sizes
///
/// Values above 2²⁴ - 1 are truncated.
#[inline]
pub fn encode_u24(value: u32) -> [u8; 3] {
    let [_, a, b, c] = encode(value, Packing::Normal);
    [a, b, c]
}

#[test]
fn test_synch_safe_roundtrip() {
    for value in [0, 1, 0x7F, 0x80, 0x3FFF, 0x4000, Packing::SynchSafe.max()] {
        assert_eq!(
            decode(encode(value, Packing::SynchSafe), Packing::SynchSafe).unwrap(),
            value
        );
    }

    for _ in 0..10_000 {
        let value = fastrand::u32(0..=Packing::SynchSafe.max());
        let bytes = encode(value, Packing::SynchSafe);
        assert!(bytes.iter().all(|b| b & 0x80 == 0));
        assert_eq!(decode(bytes, Packing::SynchSafe).unwrap(), value);
    }
}

#[test]
fn test_normal_roundtrip() {
    for value in [0, 1, 0xFF, 0x100, u32::MAX] {
        assert_eq!(
            decode(encode(value, Packing::Normal), Packing::Normal).unwrap(),
            value
        );
    }

    for _ in 0..10_000 {
        let value = fastrand::u32(..);
        assert_eq!(
            decode(encode(value, Packing::Normal), Packing::Normal).unwrap(),
            value
        );
    }
}

#[test]
fn test_synch_safe_rejects_high_bit() {
    for position in 0..4 {
        let mut bytes = [0; 4];
        bytes[position] = 0x80;
        assert!(matches!(
            decode(bytes, Packing::SynchSafe),
            Err(Error::InvalidSynchSafeInteger)
        ));
        // the same bytes are fine as a normal integer
        assert!(decode(bytes, Packing::Normal).is_ok());
    }
}

#[test]
fn test_u24() {
    assert_eq!(decode_u24([0x01, 0x02, 0x03]), 0x010203);
    assert_eq!(encode_u24(0x010203), [0x01, 0x02, 0x03]);
    assert_eq!(encode_u24(0xFF_123456), [0x12, 0x34, 0x56]);
}
