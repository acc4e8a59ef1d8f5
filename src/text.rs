// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For converting frame strings to and from their encoded bytes
//!
//! Each text-bearing frame starts with a 1-byte encoding index
//! that applies to all of its encoded string fields.
//!
//! | Index | Encoding | Terminator |
//! |------:|---------:|-----------:|
//! | 0 | [ISO-8859-1](`Encoding::Latin1`) | `00` |
//! | 1 | [UTF-16 with byte order mark](`Encoding::Utf16`) | `00 00` |
//! | 2 | [UTF-16 big-endian](`Encoding::Utf16Be`) | `00 00` |
//! | 3 | [UTF-8](`Encoding::Utf8`) | `00` |

use crate::Error;

/// One of the four ID3v2 text encodings
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Encoding {
    /// ISO-8859-1
    #[default]
    Latin1 = 0,
    /// UTF-16, preceded by a byte order mark
    Utf16 = 1,
    /// UTF-16 big-endian, without a byte order mark
    Utf16Be = 2,
    /// UTF-8
    Utf8 = 3,
}

impl Encoding {
    /// Maps an encoding index to its encoding
    ///
    /// Out-of-range indexes are treated as ISO-8859-1,
    /// which can decode any sequence of bytes.
    ///
    /// ```
    /// use id3_codec::text::Encoding;
    ///
    /// assert_eq!(Encoding::from_index(2), Encoding::Utf16Be);
    /// assert_eq!(Encoding::from_index(200), Encoding::Latin1);
    /// ```
    pub fn from_index(index: u8) -> Self {
        Self::try_from(index).unwrap_or_default()
    }

    /// Our 1-byte encoding index
    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Width of our string terminator, in bytes
    #[inline]
    pub const fn terminator_width(self) -> usize {
        match self {
            Self::Latin1 | Self::Utf8 => 1,
            Self::Utf16 | Self::Utf16Be => 2,
        }
    }

    /// Our canonical character set name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Latin1 => "ISO-8859-1",
            Self::Utf16 => "UTF-16",
            Self::Utf16Be => "UTF-16BE",
            Self::Utf8 => "UTF-8",
        }
    }
}

impl TryFrom<u8> for Encoding {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self, Error> {
        match index {
            0 => Ok(Self::Latin1),
            1 => Ok(Self::Utf16),
            2 => Ok(Self::Utf16Be),
            3 => Ok(Self::Utf8),
            i => Err(Error::UnknownEncoding(i.to_string())),
        }
    }
}

impl std::str::FromStr for Encoding {
    type Err = Error;

    /// Parses a character set name, case-insensitively
    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_uppercase().as_str() {
            "ISO-8859-1" | "LATIN-1" | "LATIN1" => Ok(Self::Latin1),
            "UTF-16" => Ok(Self::Utf16),
            "UTF-16BE" => Ok(Self::Utf16Be),
            "UTF-8" => Ok(Self::Utf8),
            _ => Err(Error::UnknownEncoding(s.to_owned())),
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.name().fmt(f)
    }
}

/// Byte order of UTF-16 code units
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ByteOrder {
    /// Least significant byte first, marked `FF FE`
    #[default]
    LittleEndian,
    /// Most significant byte first, marked `FE FF`
    BigEndian,
}

impl ByteOrder {
    const fn bom(self) -> [u8; 2] {
        match self {
            Self::LittleEndian => [0xFF, 0xFE],
            Self::BigEndian => [0xFE, 0xFF],
        }
    }

    fn unit_bytes(self, unit: u16) -> [u8; 2] {
        match self {
            Self::LittleEndian => unit.to_le_bytes(),
            Self::BigEndian => unit.to_be_bytes(),
        }
    }

    fn unit(self, bytes: [u8; 2]) -> u16 {
        match self {
            Self::LittleEndian => u16::from_le_bytes(bytes),
            Self::BigEndian => u16::from_be_bytes(bytes),
        }
    }
}

/// Converts strings to and from the ID3v2 encodings
///
/// Decoding honors any byte order mark present.
/// The codec's own byte order only matters when encoding
/// [`Encoding::Utf16`] strings, which always start with
/// a byte order mark.
///
/// ```
/// use id3_codec::text::{ByteOrder, Encoding, TextCodec};
///
/// let codec = TextCodec::default();
/// assert_eq!(codec.encode("Hi", Encoding::Utf16).unwrap(), [0xFF, 0xFE, b'H', 0, b'i', 0]);
///
/// let codec = TextCodec::default().utf16_order(ByteOrder::BigEndian);
/// assert_eq!(codec.encode("Hi", Encoding::Utf16).unwrap(), [0xFE, 0xFF, 0, b'H', 0, b'i']);
///
/// assert_eq!(codec.decode(&[0xFF, 0xFE, b'H', 0, b'i', 0], Encoding::Utf16).unwrap(), "Hi");
/// ```
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TextCodec {
    utf16_order: ByteOrder,
}

impl TextCodec {
    /// Assigns the byte order used when writing UTF-16 strings
    pub const fn utf16_order(self, utf16_order: ByteOrder) -> Self {
        Self { utf16_order }
    }

    /// Decodes bytes in the given encoding
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not valid
    /// for the encoding.  ISO-8859-1 never fails.
    pub fn decode(&self, bytes: &[u8], encoding: Encoding) -> Result<String, Error> {
        match encoding {
            Encoding::Latin1 => Ok(bytes.iter().copied().map(char::from).collect()),
            Encoding::Utf8 => Ok(String::from_utf8(bytes.to_vec())?),
            Encoding::Utf16 => match bytes {
                [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, ByteOrder::LittleEndian),
                [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, ByteOrder::BigEndian),
                // no byte order mark, so assume big-endian
                rest => decode_utf16(rest, ByteOrder::BigEndian),
            },
            Encoding::Utf16Be => decode_utf16(bytes, ByteOrder::BigEndian),
        }
    }

    /// Encodes a string in the given encoding, without a terminator
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnencodableText`] if the string
    /// has characters ISO-8859-1 cannot represent.
    pub fn encode(&self, text: &str, encoding: Encoding) -> Result<Vec<u8>, Error> {
        match encoding {
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(c).map_err(|_| Error::UnencodableText(encoding)))
                .collect(),
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Utf16 => Ok(self
                .utf16_order
                .bom()
                .into_iter()
                .chain(
                    text.encode_utf16()
                        .flat_map(|u| self.utf16_order.unit_bytes(u)),
                )
                .collect()),
            Encoding::Utf16Be => Ok(text
                .encode_utf16()
                .flat_map(|u| ByteOrder::BigEndian.unit_bytes(u))
                .collect()),
        }
    }

    /// Size of a string encoded in the given encoding, in bytes
    ///
    /// This matches the length of [`TextCodec::encode`]'s output
    /// without building it.
    pub fn encoded_len(&self, text: &str, encoding: Encoding) -> Result<usize, Error> {
        match encoding {
            Encoding::Latin1 => text.chars().try_fold(0, |len, c| match u32::from(c) {
                0..=0xFF => Ok(len + 1),
                _ => Err(Error::UnencodableText(encoding)),
            }),
            Encoding::Utf8 => Ok(text.len()),
            Encoding::Utf16 => Ok(2 + text.encode_utf16().count() * 2),
            Encoding::Utf16Be => Ok(text.encode_utf16().count() * 2),
        }
    }

    /// Difference in encoded size between an old and new string, in bytes
    ///
    /// Positive if the new string is larger.
    ///
    /// ```
    /// use id3_codec::text::{Encoding, TextCodec};
    ///
    /// let codec = TextCodec::default();
    /// assert_eq!(
    ///     codec.encoded_length_delta(Encoding::Latin1, "Foo", Encoding::Latin1, "Foobar").unwrap(),
    ///     3,
    /// );
    /// assert_eq!(
    ///     codec.encoded_length_delta(Encoding::Utf16, "Foo", Encoding::Latin1, "Foo").unwrap(),
    ///     -5,
    /// );
    /// ```
    pub fn encoded_length_delta(
        &self,
        old_encoding: Encoding,
        old_text: &str,
        new_encoding: Encoding,
        new_text: &str,
    ) -> Result<i64, Error> {
        let old = self.encoded_len(old_text, old_encoding)?;
        let new = self.encoded_len(new_text, new_encoding)?;
        Ok(new as i64 - old as i64)
    }
}

fn decode_utf16(bytes: &[u8], order: ByteOrder) -> Result<String, Error> {
    if bytes.len() % 2 != 0 {
        return Err(Error::InvalidUtf16);
    }

    char::decode_utf16(
        bytes
            .chunks_exact(2)
            .map(|pair| order.unit([pair[0], pair[1]])),
    )
    .collect::<Result<String, _>>()
    .map_err(|_| Error::InvalidUtf16)
}

/// Finds the offset just past the first terminator, if any
///
/// Single-byte encodings look for any `00` byte.
/// UTF-16 encodings look for a `00 00` pair aligned
/// on a 2-byte boundary from the start of `bytes`.
/// A trailing orphan byte of an odd-length slice
/// is never part of a terminator.
///
/// ```
/// use id3_codec::text::{Encoding, terminator_offset};
///
/// assert_eq!(terminator_offset(b"Foo\x00Bar", Encoding::Latin1), Some(4));
/// assert_eq!(terminator_offset(b"Foo", Encoding::Latin1), None);
/// assert_eq!(
///     terminator_offset(b"\x00F\x00o\x00o\x00\x00\x00B\x00a\x00r", Encoding::Utf16Be),
///     Some(8),
/// );
/// ```
pub fn terminator_offset(bytes: &[u8], encoding: Encoding) -> Option<usize> {
    match encoding.terminator_width() {
        1 => bytes.iter().position(|b| *b == 0).map(|i| i + 1),
        width => bytes
            .chunks_exact(width)
            .position(|unit| unit.iter().all(|b| *b == 0))
            .map(|i| (i + 1) * width),
    }
}

#[test]
fn test_text_roundtrip() {
    let codec = TextCodec::default();
    let big_endian = TextCodec::default().utf16_order(ByteOrder::BigEndian);

    for text in ["", "Foo", "Caf\u{e9} \u{ff}", "\u{0}embedded"] {
        for encoding in [
            Encoding::Latin1,
            Encoding::Utf16,
            Encoding::Utf16Be,
            Encoding::Utf8,
        ] {
            for codec in [codec, big_endian] {
                let encoded = codec.encode(text, encoding).unwrap();
                assert_eq!(encoded.len(), codec.encoded_len(text, encoding).unwrap());
                assert_eq!(codec.decode(&encoded, encoding).unwrap(), text);
            }
        }
    }

    // outside of ISO-8859-1, but fine for the Unicode encodings
    for text in ["\u{3042}\u{3044}", "\u{1F3B5} notes"] {
        assert!(matches!(
            codec.encode(text, Encoding::Latin1),
            Err(Error::UnencodableText(Encoding::Latin1))
        ));
        assert!(codec.encoded_len(text, Encoding::Latin1).is_err());

        for encoding in [Encoding::Utf16, Encoding::Utf16Be, Encoding::Utf8] {
            let encoded = codec.encode(text, encoding).unwrap();
            assert_eq!(encoded.len(), codec.encoded_len(text, encoding).unwrap());
            assert_eq!(codec.decode(&encoded, encoding).unwrap(), text);
        }
    }
}

#[test]
fn test_invalid_text() {
    let codec = TextCodec::default();

    // odd number of UTF-16 bytes
    assert!(matches!(
        codec.decode(&[0x00, 0x41, 0x00], Encoding::Utf16Be),
        Err(Error::InvalidUtf16)
    ));

    // unpaired surrogate
    assert!(matches!(
        codec.decode(&[0xD8, 0x00], Encoding::Utf16Be),
        Err(Error::InvalidUtf16)
    ));

    assert!(matches!(
        codec.decode(&[0xC3, 0x28], Encoding::Utf8),
        Err(Error::Utf8(_))
    ));

    // but any bytes are valid ISO-8859-1
    assert_eq!(codec.decode(&[0xC3, 0x28], Encoding::Latin1).unwrap(), "\u{c3}(");
}

#[test]
fn test_utf16_bom_detection() {
    let codec = TextCodec::default();

    assert_eq!(
        codec.decode(&[0xFE, 0xFF, 0x00, 0x41], Encoding::Utf16).unwrap(),
        "A"
    );
    assert_eq!(
        codec.decode(&[0xFF, 0xFE, 0x41, 0x00], Encoding::Utf16).unwrap(),
        "A"
    );
    assert_eq!(codec.decode(&[0x00, 0x41], Encoding::Utf16).unwrap(), "A");
    assert_eq!(codec.decode(&[0xFF, 0xFE], Encoding::Utf16).unwrap(), "");
}

#[test]
fn test_terminator_offset() {
    assert_eq!(terminator_offset(b"\x00", Encoding::Utf8), Some(1));
    assert_eq!(terminator_offset(b"", Encoding::Latin1), None);

    // a zero pair straddling a unit boundary is not a terminator
    assert_eq!(
        terminator_offset(&[0x41, 0x00, 0x00, 0x42], Encoding::Utf16Be),
        None
    );
    assert_eq!(
        terminator_offset(&[0x41, 0x00, 0x00, 0x42, 0x00, 0x00], Encoding::Utf16),
        Some(6)
    );

    // an orphan trailing byte never completes a terminator
    assert_eq!(terminator_offset(&[0x41, 0x00, 0x00], Encoding::Utf16Be), None);
}

#[test]
fn test_encoding_names() {
    for encoding in [
        Encoding::Latin1,
        Encoding::Utf16,
        Encoding::Utf16Be,
        Encoding::Utf8,
    ] {
        assert_eq!(encoding.name().parse::<Encoding>().unwrap(), encoding);
        assert_eq!(Encoding::from_index(encoding.index()), encoding);
    }

    assert_eq!("utf-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
    assert!(matches!(
        "EBCDIC".parse::<Encoding>(),
        Err(Error::UnknownEncoding(_))
    ));
    assert!(Encoding::try_from(4).is_err());
}
