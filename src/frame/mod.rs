// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For handling an ID3v2 tag's individual frames
//!
//! Every frame is a header followed by a payload whose
//! shape depends on the frame's identifier.
//!
//! | Shape | Payload |
//! |------:|---------|
//! | [`DataFrame`] | raw bytes |
//! | [`TextFrame`] | encoding, text |
//! | [`DescribedTextFrame`] | encoding, terminated description, text |
//! | [`LanguageTextFrame`] | encoding, 3-byte language, terminated description, text |
//! | [`ImageFrame`] | encoding, terminated MIME type, picture type, terminated description, image data |
//!
//! A frame's size is always the exact size of its serialized payload.
//! Every mutator adjusts the size by however many bytes
//! the change adds or removes, and leaves the frame
//! untouched if the change is invalid.

pub mod registry;

use crate::Error;
use crate::cursor::{FrameReader, FrameWriter};
use crate::int;
use crate::text::{Encoding, TextCodec};
use bitstream_io::{
    BigEndian, BitRead, BitReader, BitWrite, BitWriter, FromBitStreamWith, ToBitStreamWith,
};
use registry::{FrameFormat, FrameKind, FrameType, SizeField};

/// A frame's header
///
/// | Bytes (v2.2) | Bytes (v2.3/v2.4) | Field | Meaning |
/// |-------------:|------------------:|------:|---------|
/// | 3 | 4 | `frame_type` | ASCII frame identifier |
/// | 3 | 4 | `size` | payload size, in bytes |
/// | - | 1 | `status_flags` | tag alter and file alter preservation |
/// | - | 1 | `format_flags` | compression, encryption and grouping |
///
/// # Example
/// ```
/// use bitstream_io::{BitReader, BigEndian, BitRead};
/// use id3_codec::frame::FrameHeader;
/// use id3_codec::frame::registry::{V22, V23};
///
/// let data: &[u8] = b"TIT2\x00\x00\x00\x04\x00\x00";
/// let header: FrameHeader = BitReader::endian(data, BigEndian).parse_with(&V23).unwrap();
/// assert_eq!(header.frame_type.id, "TIT2");
/// assert_eq!(header.size(), 4);
///
/// let data: &[u8] = b"TT2\x00\x01\x00";
/// let header: FrameHeader = BitReader::endian(data, BigEndian).parse_with(&V22).unwrap();
/// assert_eq!(header.frame_type.id, "TT2");
/// assert_eq!(header.size(), 256);
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FrameHeader {
    /// Our frame's identifier and shape
    pub frame_type: &'static FrameType,
    /// Status flags, preserved verbatim
    pub status_flags: u8,
    /// Format flags, preserved verbatim
    pub format_flags: u8,
    size: u32,
    codec: TextCodec,
}

impl FrameHeader {
    fn new(frame_type: &'static FrameType, size: usize) -> Result<Self, Error> {
        Ok(Self {
            frame_type,
            status_flags: 0,
            format_flags: 0,
            size: u32::try_from(size).map_err(|_| Error::ExcessiveFrameSize)?,
            codec: TextCodec::default(),
        })
    }

    /// Our payload size, in bytes
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The codec our frame's strings are written with
    #[inline]
    pub fn codec(&self) -> TextCodec {
        self.codec
    }

    pub(crate) fn set_codec(&mut self, codec: TextCodec) {
        self.codec = codec;
    }

    /// Our size after adding a signed delta, without applying it
    fn resized(&self, delta: i64) -> Result<u32, Error> {
        i64::from(self.size)
            .checked_add(delta)
            .and_then(|size| u32::try_from(size).ok())
            .ok_or(Error::InvalidFrameSize)
    }

    /// Our payload size as a buffer length
    fn payload_len(&self) -> Result<usize, Error> {
        usize::try_from(self.size).map_err(|_| Error::ExcessiveFrameSize)
    }
}

impl FromBitStreamWith<'_> for FrameHeader {
    type Context = FrameFormat;
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R, format: &FrameFormat) -> Result<Self, Error> {
        let id = r.read_to_vec(format.id_len())?;

        let size = match format.size_field() {
            SizeField::U24 => int::decode_u24(r.read_to()?),
            SizeField::U32(packing) => int::decode(r.read_to()?, packing)?,
        };

        let (status_flags, format_flags) = match format.has_flags() {
            true => (r.read_to()?, r.read_to()?),
            false => (0, 0),
        };

        Ok(Self {
            frame_type: std::str::from_utf8(&id)
                .ok()
                .and_then(|id| format.frame_type(id))
                .ok_or_else(|| Error::UnknownFrame(String::from_utf8_lossy(&id).into_owned()))?,
            status_flags,
            format_flags,
            size,
            codec: TextCodec::default(),
        })
    }
}

impl ToBitStreamWith<'_> for FrameHeader {
    type Context = FrameFormat;
    type Error = Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W, format: &FrameFormat) -> Result<(), Error> {
        if self.frame_type.id.len() != format.id_len() {
            return Err(Error::UnsupportedFrame(self.frame_type.id.to_owned()));
        }

        let size_field = format.size_field();
        if self.size > size_field.max() {
            return Err(Error::ExcessiveFrameSize);
        }

        w.write_bytes(self.frame_type.id.as_bytes())?;
        match size_field {
            SizeField::U24 => w.write_from(int::encode_u24(self.size))?,
            SizeField::U32(packing) => w.write_from(int::encode(self.size, packing))?,
        }
        if format.has_flags() {
            w.write_from(self.status_flags)?;
            w.write_from(self.format_flags)?;
        }
        Ok(())
    }
}

/// Behavior shared by every frame shape
pub trait FrameBody: Sized + Into<Frame> {
    /// The shape this type implements
    const KIND: FrameKind;

    /// Our frame header
    fn header(&self) -> &FrameHeader;

    /// Our payload size, computed from our current fields
    ///
    /// Always equal to the header's size for frames
    /// built by this crate.
    fn body_size(&self) -> Result<usize, Error>;

    /// Reads our fields from a payload
    fn read_body(header: FrameHeader, r: &mut FrameReader<'_>) -> Result<Self, Error>;

    /// Writes our fields to a payload sized to our header
    fn write_body(&self, w: &mut FrameWriter<'_>) -> Result<(), Error>;

    /// Our payload size, in bytes
    #[inline]
    fn size(&self) -> u32 {
        self.header().size
    }

    /// Our frame identifier
    #[inline]
    fn id(&self) -> &'static str {
        self.header().frame_type.id
    }
}

fn check_kind(frame_type: &FrameType, kind: FrameKind) -> Result<(), Error> {
    match frame_type.kind == kind {
        true => Ok(()),
        false => Err(Error::UnsupportedFrame(frame_type.id.to_owned())),
    }
}

// signed difference between two lengths
fn delta(old: usize, new: usize) -> i64 {
    new as i64 - old as i64
}

/// A frame whose payload is kept as uninterpreted bytes
///
/// # Example
/// ```
/// use id3_codec::frame::{DataFrame, FrameBody};
/// use id3_codec::frame::registry::V23;
///
/// let mut frame = DataFrame::new(V23.frame_type("PRIV").unwrap(), vec![1, 2, 3]).unwrap();
/// assert_eq!(frame.size(), 3);
/// frame.set_data(vec![1, 2, 3, 4, 5]).unwrap();
/// assert_eq!(frame.size(), 5);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DataFrame {
    header: FrameHeader,
    data: Vec<u8>,
}

impl DataFrame {
    /// Builds a frame from its type and payload
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFrame`] if the frame type
    /// has some other shape.
    pub fn new(frame_type: &'static FrameType, data: Vec<u8>) -> Result<Self, Error> {
        check_kind(frame_type, Self::KIND)?;

        Ok(Self {
            header: FrameHeader::new(frame_type, data.len())?,
            data,
        })
    }

    /// Our raw payload
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Replaces our raw payload
    pub fn set_data(&mut self, data: Vec<u8>) -> Result<(), Error> {
        self.header.size = self.header.resized(delta(self.data.len(), data.len()))?;
        self.data = data;
        Ok(())
    }
}

impl FrameBody for DataFrame {
    const KIND: FrameKind = FrameKind::Data;

    fn header(&self) -> &FrameHeader {
        &self.header
    }

    fn body_size(&self) -> Result<usize, Error> {
        Ok(self.data.len())
    }

    fn read_body(header: FrameHeader, r: &mut FrameReader<'_>) -> Result<Self, Error> {
        Ok(Self {
            header,
            data: r.read_rest().to_vec(),
        })
    }

    fn write_body(&self, w: &mut FrameWriter<'_>) -> Result<(), Error> {
        w.write_bytes(&self.data)
    }
}

/// A frame holding a single encoded string
///
/// | Bytes | Field |
/// |------:|-------|
/// | 1 | encoding |
/// | rest of payload | text |
///
/// # Example
/// ```
/// use id3_codec::frame::{FrameBody, TextFrame};
/// use id3_codec::frame::registry::V23;
/// use id3_codec::text::Encoding;
///
/// let mut frame = TextFrame::new(V23.frame_type("TIT2").unwrap(), Encoding::Latin1, "Foo").unwrap();
/// assert_eq!(frame.size(), 4);
///
/// // a byte order mark plus two bytes per character
/// frame.set_encoding(Encoding::Utf16).unwrap();
/// assert_eq!(frame.size(), 9);
///
/// frame.set_text("Foobar").unwrap();
/// assert_eq!(frame.size(), 15);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextFrame {
    header: FrameHeader,
    encoding: Encoding,
    text: String,
}

impl TextFrame {
    /// Builds a frame from its type and text
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFrame`] if the frame type
    /// has some other shape, or [`Error::UnencodableText`]
    /// if the text can't be represented in the encoding.
    pub fn new(
        frame_type: &'static FrameType,
        encoding: Encoding,
        text: impl Into<String>,
    ) -> Result<Self, Error> {
        check_kind(frame_type, Self::KIND)?;

        let mut frame = Self {
            header: FrameHeader::new(frame_type, 0)?,
            encoding,
            text: text.into(),
        };
        frame.header.size =
            u32::try_from(frame.body_size()?).map_err(|_| Error::ExcessiveFrameSize)?;
        Ok(frame)
    }

    /// Our string encoding
    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Our text
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces our text
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), Error> {
        let text = text.into();
        self.header.size = self.header.resized(self.header.codec.encoded_length_delta(
            self.encoding,
            &self.text,
            self.encoding,
            &text,
        )?)?;
        self.text = text;
        Ok(())
    }

    /// Re-encodes our text with a new encoding
    pub fn set_encoding(&mut self, encoding: Encoding) -> Result<(), Error> {
        self.header.size = self.header.resized(self.header.codec.encoded_length_delta(
            self.encoding,
            &self.text,
            encoding,
            &self.text,
        )?)?;
        self.encoding = encoding;
        Ok(())
    }
}

impl FrameBody for TextFrame {
    const KIND: FrameKind = FrameKind::Text;

    fn header(&self) -> &FrameHeader {
        &self.header
    }

    fn body_size(&self) -> Result<usize, Error> {
        Ok(1 + self.header.codec.encoded_len(&self.text, self.encoding)?)
    }

    fn read_body(header: FrameHeader, r: &mut FrameReader<'_>) -> Result<Self, Error> {
        let encoding = Encoding::from_index(r.read_byte()?);

        Ok(Self {
            header,
            encoding,
            text: r.read_rest_string(encoding)?,
        })
    }

    fn write_body(&self, w: &mut FrameWriter<'_>) -> Result<(), Error> {
        w.write_byte(self.encoding.index())?;
        w.write_string(&self.text, self.encoding)
    }
}

/// A frame holding an encoded description and text
///
/// | Bytes | Field |
/// |------:|-------|
/// | 1 | encoding |
/// | to terminator | description |
/// | rest of payload | text |
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DescribedTextFrame {
    header: FrameHeader,
    encoding: Encoding,
    description: String,
    text: String,
}

impl DescribedTextFrame {
    /// Builds a frame from its type, description and text
    ///
    /// # Example
    /// ```
    /// use id3_codec::frame::{DescribedTextFrame, FrameBody};
    /// use id3_codec::frame::registry::V23;
    /// use id3_codec::text::Encoding;
    ///
    /// let frame = DescribedTextFrame::new(
    ///     V23.frame_type("TXXX").unwrap(),
    ///     Encoding::Utf8,
    ///     "Foo",
    ///     "Bar",
    /// ).unwrap();
    /// assert_eq!(frame.size(), 8);
    /// ```
    pub fn new(
        frame_type: &'static FrameType,
        encoding: Encoding,
        description: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Self, Error> {
        check_kind(frame_type, Self::KIND)?;

        let mut frame = Self {
            header: FrameHeader::new(frame_type, 0)?,
            encoding,
            description: description.into(),
            text: text.into(),
        };
        frame.header.size =
            u32::try_from(frame.body_size()?).map_err(|_| Error::ExcessiveFrameSize)?;
        Ok(frame)
    }

    /// Our string encoding
    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Our description
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Our text
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces our text
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), Error> {
        let text = text.into();
        self.header.size = self.header.resized(self.header.codec.encoded_length_delta(
            self.encoding,
            &self.text,
            self.encoding,
            &text,
        )?)?;
        self.text = text;
        Ok(())
    }

    /// Replaces our description
    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), Error> {
        let description = description.into();
        self.header.size = self.header.resized(self.header.codec.encoded_length_delta(
            self.encoding,
            &self.description,
            self.encoding,
            &description,
        )?)?;
        self.description = description;
        Ok(())
    }

    /// Re-encodes our description and text with a new encoding
    pub fn set_encoding(&mut self, encoding: Encoding) -> Result<(), Error> {
        self.header.size = self.header.resized(described_encoding_delta(
            self.header.codec,
            [&self.description, &self.text],
            self.encoding,
            encoding,
        )?)?;
        self.encoding = encoding;
        Ok(())
    }
}

// size change of re-encoding a terminated description and its text
fn described_encoding_delta(
    codec: TextCodec,
    [description, text]: [&str; 2],
    old: Encoding,
    new: Encoding,
) -> Result<i64, Error> {
    Ok(codec.encoded_length_delta(old, description, new, description)?
        + codec.encoded_length_delta(old, text, new, text)?
        + delta(old.terminator_width(), new.terminator_width()))
}

impl FrameBody for DescribedTextFrame {
    const KIND: FrameKind = FrameKind::DescribedText;

    fn header(&self) -> &FrameHeader {
        &self.header
    }

    fn body_size(&self) -> Result<usize, Error> {
        let codec = self.header.codec;

        Ok(1 + codec.encoded_len(&self.description, self.encoding)?
            + self.encoding.terminator_width()
            + codec.encoded_len(&self.text, self.encoding)?)
    }

    fn read_body(header: FrameHeader, r: &mut FrameReader<'_>) -> Result<Self, Error> {
        let encoding = Encoding::from_index(r.read_byte()?);

        Ok(Self {
            header,
            encoding,
            description: r.read_terminated_string(encoding)?,
            text: r.read_rest_string(encoding)?,
        })
    }

    fn write_body(&self, w: &mut FrameWriter<'_>) -> Result<(), Error> {
        w.write_byte(self.encoding.index())?;
        w.write_terminated_string(&self.description, self.encoding)?;
        w.write_string(&self.text, self.encoding)
    }
}

/// A frame holding a language code, encoded description and text,
/// such as comments and lyrics
///
/// | Bytes | Field |
/// |------:|-------|
/// | 1 | encoding |
/// | 3 | ISO-639-2 language code |
/// | to terminator | description |
/// | rest of payload | text |
///
/// # Example
/// ```
/// use id3_codec::frame::{FrameBody, LanguageTextFrame};
/// use id3_codec::frame::registry::V23;
/// use id3_codec::text::Encoding;
///
/// let mut frame = LanguageTextFrame::new(
///     V23.frame_type("COMM").unwrap(),
///     Encoding::Latin1,
///     "eng",
///     "Foo",
///     "Bar",
/// ).unwrap();
/// assert_eq!(frame.size(), 11);
///
/// assert!(frame.set_language("english").is_err());
/// assert_eq!(frame.language(), b"eng");
///
/// frame.set_language("deu").unwrap();
/// assert_eq!(frame.size(), 11);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LanguageTextFrame {
    header: FrameHeader,
    encoding: Encoding,
    language: [u8; 3],
    description: String,
    text: String,
}

fn language_code(language: &str) -> Result<[u8; 3], Error> {
    match language.as_bytes() {
        code @ [_, _, _] if language.is_ascii() => Ok([code[0], code[1], code[2]]),
        _ => Err(Error::InvalidLanguage),
    }
}

impl LanguageTextFrame {
    /// Builds a frame from its type, language, description and text
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLanguage`] if the language
    /// isn't exactly 3 ASCII characters.
    pub fn new(
        frame_type: &'static FrameType,
        encoding: Encoding,
        language: &str,
        description: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Self, Error> {
        check_kind(frame_type, Self::KIND)?;

        let mut frame = Self {
            header: FrameHeader::new(frame_type, 0)?,
            encoding,
            language: language_code(language)?,
            description: description.into(),
            text: text.into(),
        };
        frame.header.size =
            u32::try_from(frame.body_size()?).map_err(|_| Error::ExcessiveFrameSize)?;
        Ok(frame)
    }

    /// Our string encoding
    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Our raw language code
    #[inline]
    pub fn language(&self) -> &[u8; 3] {
        &self.language
    }

    /// Our description
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Our text
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces our language code
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLanguage`] if the language
    /// isn't exactly 3 ASCII characters.
    pub fn set_language(&mut self, language: &str) -> Result<(), Error> {
        // always 3 bytes, so our size never changes
        self.language = language_code(language)?;
        Ok(())
    }

    /// Replaces our text
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), Error> {
        let text = text.into();
        self.header.size = self.header.resized(self.header.codec.encoded_length_delta(
            self.encoding,
            &self.text,
            self.encoding,
            &text,
        )?)?;
        self.text = text;
        Ok(())
    }

    /// Replaces our description
    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), Error> {
        let description = description.into();
        self.header.size = self.header.resized(self.header.codec.encoded_length_delta(
            self.encoding,
            &self.description,
            self.encoding,
            &description,
        )?)?;
        self.description = description;
        Ok(())
    }

    /// Re-encodes our description and text with a new encoding
    pub fn set_encoding(&mut self, encoding: Encoding) -> Result<(), Error> {
        self.header.size = self.header.resized(described_encoding_delta(
            self.header.codec,
            [&self.description, &self.text],
            self.encoding,
            encoding,
        )?)?;
        self.encoding = encoding;
        Ok(())
    }
}

impl FrameBody for LanguageTextFrame {
    const KIND: FrameKind = FrameKind::LanguageText;

    fn header(&self) -> &FrameHeader {
        &self.header
    }

    fn body_size(&self) -> Result<usize, Error> {
        let codec = self.header.codec;

        Ok(1 + self.language.len()
            + codec.encoded_len(&self.description, self.encoding)?
            + self.encoding.terminator_width()
            + codec.encoded_len(&self.text, self.encoding)?)
    }

    fn read_body(header: FrameHeader, r: &mut FrameReader<'_>) -> Result<Self, Error> {
        let encoding = Encoding::from_index(r.read_byte()?);

        Ok(Self {
            header,
            encoding,
            language: r.read_array()?,
            description: r.read_terminated_string(encoding)?,
            text: r.read_rest_string(encoding)?,
        })
    }

    fn write_body(&self, w: &mut FrameWriter<'_>) -> Result<(), Error> {
        w.write_byte(self.encoding.index())?;
        w.write_bytes(&self.language)?;
        w.write_terminated_string(&self.description, self.encoding)?;
        w.write_string(&self.text, self.encoding)
    }
}

/// An attached picture frame
///
/// | Bytes | Field |
/// |------:|-------|
/// | 1 | encoding of description |
/// | to `00` | ISO-8859-1 MIME type |
/// | 1 | picture type |
/// | to terminator | description |
/// | rest of payload | image data |
///
/// Picture type 3 is a front cover.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageFrame {
    header: FrameHeader,
    encoding: Encoding,
    mime_type: String,
    picture_type: u8,
    description: String,
    data: Vec<u8>,
}

impl ImageFrame {
    /// Builds a picture frame
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnencodableText`] if the MIME type
    /// isn't ISO-8859-1, or the description can't be
    /// represented in the encoding.
    ///
    /// # Example
    /// ```
    /// use id3_codec::frame::{FrameBody, ImageFrame};
    /// use id3_codec::frame::registry::V23;
    /// use id3_codec::text::Encoding;
    ///
    /// let mut frame = ImageFrame::new(
    ///     V23.frame_type("APIC").unwrap(),
    ///     Encoding::Latin1,
    ///     "image/png",
    ///     3,
    ///     "Cover",
    ///     vec![0; 100],
    /// ).unwrap();
    /// assert_eq!(frame.size(), 1 + 10 + 1 + 6 + 100);
    ///
    /// frame.set_mime_type("image/jpeg").unwrap();
    /// assert_eq!(frame.size(), 1 + 11 + 1 + 6 + 100);
    /// ```
    pub fn new(
        frame_type: &'static FrameType,
        encoding: Encoding,
        mime_type: impl Into<String>,
        picture_type: u8,
        description: impl Into<String>,
        data: Vec<u8>,
    ) -> Result<Self, Error> {
        check_kind(frame_type, Self::KIND)?;

        let mut frame = Self {
            header: FrameHeader::new(frame_type, 0)?,
            encoding,
            mime_type: mime_type.into(),
            picture_type,
            description: description.into(),
            data,
        };
        frame.header.size =
            u32::try_from(frame.body_size()?).map_err(|_| Error::ExcessiveFrameSize)?;
        Ok(frame)
    }

    /// Our description's encoding
    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Our image's MIME type
    #[inline]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Our picture type
    #[inline]
    pub fn picture_type(&self) -> u8 {
        self.picture_type
    }

    /// Our description
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Our raw image data
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Replaces our MIME type, which is always ISO-8859-1
    pub fn set_mime_type(&mut self, mime_type: impl Into<String>) -> Result<(), Error> {
        let mime_type = mime_type.into();
        self.header.size = self.header.resized(self.header.codec.encoded_length_delta(
            Encoding::Latin1,
            &self.mime_type,
            Encoding::Latin1,
            &mime_type,
        )?)?;
        self.mime_type = mime_type;
        Ok(())
    }

    /// Replaces our picture type
    #[inline]
    pub fn set_picture_type(&mut self, picture_type: u8) {
        self.picture_type = picture_type;
    }

    /// Replaces our description
    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), Error> {
        let description = description.into();
        self.header.size = self.header.resized(self.header.codec.encoded_length_delta(
            self.encoding,
            &self.description,
            self.encoding,
            &description,
        )?)?;
        self.description = description;
        Ok(())
    }

    /// Re-encodes our description with a new encoding
    pub fn set_encoding(&mut self, encoding: Encoding) -> Result<(), Error> {
        self.header.size = self.header.resized(
            self.header.codec.encoded_length_delta(
                self.encoding,
                &self.description,
                encoding,
                &self.description,
            )? + delta(self.encoding.terminator_width(), encoding.terminator_width()),
        )?;
        self.encoding = encoding;
        Ok(())
    }

    /// Replaces our raw image data
    pub fn set_data(&mut self, data: Vec<u8>) -> Result<(), Error> {
        self.header.size = self.header.resized(delta(self.data.len(), data.len()))?;
        self.data = data;
        Ok(())
    }
}

impl FrameBody for ImageFrame {
    const KIND: FrameKind = FrameKind::Image;

    fn header(&self) -> &FrameHeader {
        &self.header
    }

    fn body_size(&self) -> Result<usize, Error> {
        let codec = self.header.codec;

        Ok(1 + codec.encoded_len(&self.mime_type, Encoding::Latin1)?
            + Encoding::Latin1.terminator_width()
            + 1
            + codec.encoded_len(&self.description, self.encoding)?
            + self.encoding.terminator_width()
            + self.data.len())
    }

    fn read_body(header: FrameHeader, r: &mut FrameReader<'_>) -> Result<Self, Error> {
        let encoding = Encoding::from_index(r.read_byte()?);

        Ok(Self {
            header,
            encoding,
            mime_type: r.read_terminated_string(Encoding::Latin1)?,
            picture_type: r.read_byte()?,
            description: r.read_terminated_string(encoding)?,
            data: r.read_rest().to_vec(),
        })
    }

    fn write_body(&self, w: &mut FrameWriter<'_>) -> Result<(), Error> {
        w.write_byte(self.encoding.index())?;
        w.write_terminated_string(&self.mime_type, Encoding::Latin1)?;
        w.write_byte(self.picture_type)?;
        w.write_terminated_string(&self.description, self.encoding)?;
        w.write_bytes(&self.data)
    }
}

/// A frame of any shape
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Frame {
    /// Uninterpreted binary data
    Data(DataFrame),
    /// A single text string
    Text(TextFrame),
    /// A described text string
    DescribedText(DescribedTextFrame),
    /// A described text string with a language code
    LanguageText(LanguageTextFrame),
    /// An attached picture
    Image(ImageFrame),
}

macro_rules! frame {
    ($t:ty, $v:ident) => {
        impl From<$t> for Frame {
            fn from(f: $t) -> Self {
                Self::$v(f)
            }
        }

        impl TryFrom<Frame> for $t {
            type Error = Frame;

            fn try_from(frame: Frame) -> Result<Self, Frame> {
                match frame {
                    Frame::$v(f) => Ok(f),
                    frame => Err(frame),
                }
            }
        }

        impl<'f> TryFrom<&'f Frame> for &'f $t {
            type Error = ();

            fn try_from(frame: &'f Frame) -> Result<Self, ()> {
                match frame {
                    Frame::$v(f) => Ok(f),
                    _ => Err(()),
                }
            }
        }
    };
}

frame!(DataFrame, Data);
frame!(TextFrame, Text);
frame!(DescribedTextFrame, DescribedText);
frame!(LanguageTextFrame, LanguageText);
frame!(ImageFrame, Image);

impl Frame {
    /// Parses one frame from the start of some bytes,
    /// returning the frame and the bytes following it
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameExceedsTag`] if the frame's header
    /// or payload would extend past the end of `bytes`,
    /// [`Error::UnknownFrame`] if its identifier is not
    /// defined by the format, or any error from decoding
    /// the payload.
    ///
    /// # Example
    /// ```
    /// use id3_codec::frame::Frame;
    /// use id3_codec::frame::registry::V23;
    /// use id3_codec::text::TextCodec;
    ///
    /// let data = b"TIT2\x00\x00\x00\x04\x00\x00\x00FooPADDING";
    /// let (frame, rest) = Frame::parse(data, &V23, TextCodec::default()).unwrap();
    /// assert_eq!(frame.id(), "TIT2");
    /// assert_eq!(frame.text(), Some("Foo"));
    /// assert_eq!(rest, b"PADDING");
    /// ```
    pub fn parse<'b>(
        bytes: &'b [u8],
        format: &FrameFormat,
        codec: TextCodec,
    ) -> Result<(Self, &'b [u8]), Error> {
        let header_size =
            usize::try_from(format.header_size()).map_err(|_| Error::FrameExceedsTag)?;
        let (head, rest) = bytes
            .split_at_checked(header_size)
            .ok_or(Error::FrameExceedsTag)?;

        let mut header: FrameHeader = BitReader::endian(head, BigEndian).parse_with(format)?;
        header.set_codec(codec);

        let (payload, rest) = rest
            .split_at_checked(header.payload_len()?)
            .ok_or(Error::FrameExceedsTag)?;

        Ok((Self::from_payload(header, payload)?, rest))
    }

    /// Builds a frame from its header and payload bytes
    ///
    /// If the frame would serialize to a different size
    /// than its payload, its size is adjusted to match.
    pub fn from_payload(header: FrameHeader, payload: &[u8]) -> Result<Self, Error> {
        fn read<F: FrameBody>(header: FrameHeader, payload: &[u8]) -> Result<Frame, Error> {
            let mut r = FrameReader::new(payload, header.codec);
            let mut frame: Frame = F::read_body(header, &mut r)?.into();

            let written = frame.body_size()?;
            if written != payload.len() {
                tracing::warn!(
                    id = header.frame_type.id,
                    wire_size = payload.len(),
                    size = written,
                    "normalizing frame size"
                );
                frame.header_mut().size =
                    u32::try_from(written).map_err(|_| Error::ExcessiveFrameSize)?;
            }
            Ok(frame)
        }

        match header.frame_type.kind {
            FrameKind::Data => read::<DataFrame>(header, payload),
            FrameKind::Text => read::<TextFrame>(header, payload),
            FrameKind::DescribedText => read::<DescribedTextFrame>(header, payload),
            FrameKind::LanguageText => read::<LanguageTextFrame>(header, payload),
            FrameKind::Image => read::<ImageFrame>(header, payload),
        }
    }

    /// Our frame header
    pub fn header(&self) -> &FrameHeader {
        match self {
            Self::Data(f) => f.header(),
            Self::Text(f) => f.header(),
            Self::DescribedText(f) => f.header(),
            Self::LanguageText(f) => f.header(),
            Self::Image(f) => f.header(),
        }
    }

    fn header_mut(&mut self) -> &mut FrameHeader {
        match self {
            Self::Data(f) => &mut f.header,
            Self::Text(f) => &mut f.header,
            Self::DescribedText(f) => &mut f.header,
            Self::LanguageText(f) => &mut f.header,
            Self::Image(f) => &mut f.header,
        }
    }

    pub(crate) fn set_codec(&mut self, codec: TextCodec) {
        self.header_mut().set_codec(codec);
    }

    fn body_size(&self) -> Result<usize, Error> {
        match self {
            Self::Data(f) => f.body_size(),
            Self::Text(f) => f.body_size(),
            Self::DescribedText(f) => f.body_size(),
            Self::LanguageText(f) => f.body_size(),
            Self::Image(f) => f.body_size(),
        }
    }

    fn write_body(&self, w: &mut FrameWriter<'_>) -> Result<(), Error> {
        match self {
            Self::Data(f) => f.write_body(w),
            Self::Text(f) => f.write_body(w),
            Self::DescribedText(f) => f.write_body(w),
            Self::LanguageText(f) => f.write_body(w),
            Self::Image(f) => f.write_body(w),
        }
    }

    /// Our frame identifier
    #[inline]
    pub fn id(&self) -> &'static str {
        self.header().frame_type.id
    }

    /// A human-readable description of our frame type
    #[inline]
    pub fn description(&self) -> &'static str {
        self.header().frame_type.description
    }

    /// Our payload size, in bytes
    #[inline]
    pub fn size(&self) -> u32 {
        self.header().size
    }

    /// Our text, if we have a text shape
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(f) => Some(f.text()),
            Self::DescribedText(f) => Some(f.text()),
            Self::LanguageText(f) => Some(f.text()),
            Self::Data(_) | Self::Image(_) => None,
        }
    }

    /// Serializes our header and payload to the given format
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFrame`] if our identifier
    /// doesn't fit the format, [`Error::ExcessiveFrameSize`]
    /// if our size doesn't fit its size field, or
    /// [`Error::FrameSizeMismatch`] if our fields don't
    /// serialize to exactly our size.
    pub fn to_bytes(&self, format: &FrameFormat) -> Result<Vec<u8>, Error> {
        let mut w = BitWriter::endian(Vec::new(), BigEndian);
        w.build_with(self, format)?;
        Ok(w.into_writer())
    }
}

impl ToBitStreamWith<'_> for Frame {
    type Context = FrameFormat;
    type Error = Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W, format: &FrameFormat) -> Result<(), Error> {
        let header = self.header();

        // payload is always pre-sized to our current size
        let mut payload = vec![0; header.payload_len()?];
        let mut pw = FrameWriter::new(&mut payload, header.codec);
        self.write_body(&mut pw)?;
        pw.finish()?;

        w.build_with(header, format)?;
        w.write_bytes(&payload).map_err(Error::Io)
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.text() {
            Some(text) => text.fmt(f),
            None => "<binary data>".fmt(f),
        }
    }
}
