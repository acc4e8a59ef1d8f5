// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For handling a complete ID3v2 tag
//!
//! ```text
//! ┌────────────┬┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┬────────┬┄┄┄┬─────────┐
//! │ Tag Header ┆ Extended Header ┆ Frame₀ ┆ … ┆ Padding │
//! └────────────┴┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┴────────┴┄┄┄┴─────────┘
//!              ╰──────────── declared size ─────────────╯
//! ```

use crate::Error;
use crate::frame::registry::{FrameFormat, FrameType};
use crate::frame::Frame;
use crate::int::{self, Packing};
use crate::text::TextCodec;
use bitstream_io::{
    BigEndian, BitRead, BitReader, BitWrite, BitWriter, FromBitStream, ToBitStream,
};
use std::io::Read;

pub use crate::frame::registry::Version;

/// An ID3v2 tag header
///
/// | Bytes | Field | Meaning |
/// |------:|------:|---------|
/// | 3 | magic | always `"ID3"` |
/// | 1 | `version` | major version |
/// | 1 | `revision` | revision number |
/// | 1 | `flags` | unsynchronisation, extended header, etc. |
/// | 4 | `size` | synch-safe size of everything after the header |
///
/// # Example
/// ```
/// use bitstream_io::{BitReader, BitRead, BigEndian};
/// use id3_codec::tag::{TagHeader, Version};
///
/// let data: &[u8] = b"ID3\x03\x00\x00\x00\x00\x02\x01";
/// let mut r = BitReader::endian(data, BigEndian);
/// assert_eq!(
///     r.parse::<TagHeader>().unwrap(),
///     TagHeader {
///         version: Version::V23,
///         revision: 0,
///         flags: 0,
///         size: 257,
///     },
/// );
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TagHeader {
    /// Our major version
    pub version: Version,
    /// Our revision number
    pub revision: u8,
    /// Our flags byte
    pub flags: u8,
    /// Declared size of everything following the header, in bytes
    pub size: u32,
}

impl TagHeader {
    /// Size of the tag header, in bytes
    pub const SIZE: u32 = 10;

    const UNSYNCHRONISATION: u8 = 0x80;
    const EXTENDED_HEADER: u8 = 0x40;
    const FOOTER: u8 = 0x10;

    fn has_extended_header(&self) -> bool {
        // the same bit means compression in ID3v2.2
        self.version != Version::V22 && self.flags & Self::EXTENDED_HEADER != 0
    }

    /// Size of the footer following our declared size, in bytes
    ///
    /// Only ID3v2.4 tags may have a footer.
    pub fn footer_size(&self) -> u32 {
        match self.version == Version::V24 && self.flags & Self::FOOTER != 0 {
            true => Self::SIZE,
            false => 0,
        }
    }
}

impl FromBitStream for TagHeader {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        if &r.read_to::<[u8; 3]>()? != b"ID3" {
            return Err(Error::MissingId3Tag);
        }

        Ok(Self {
            version: r.read_to::<u8>()?.try_into()?,
            revision: r.read_to()?,
            flags: r.read_to()?,
            size: int::decode(r.read_to()?, Packing::SynchSafe)?,
        })
    }
}

impl ToBitStream for TagHeader {
    type Error = Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        if self.size > Packing::SynchSafe.max() {
            return Err(Error::ExcessiveTagSize);
        }

        w.write_bytes(b"ID3")?;
        w.write_from(self.version as u8)?;
        w.write_from(self.revision)?;
        w.write_from(self.flags)?;
        w.write_from(int::encode(self.size, Packing::SynchSafe))?;
        Ok(())
    }
}

/// An ID3v2 tag and its frames
///
/// Frames are kept in the order they were read or added.
/// An identifier may have any number of frames,
/// such as several comments in different languages.
///
/// An extended header is written back as it was read,
/// except that an ID3v2.3 extended header's padding size
/// is updated to our current padding.  Any CRC it carries
/// is not recalculated.  An ID3v2.4 footer is skipped when read
/// and never written; its space becomes padding when saved in place.
///
/// # Example
/// ```
/// use id3_codec::tag::{Tag, Version};
/// use id3_codec::frame::{LanguageTextFrame, TextFrame};
/// use id3_codec::text::Encoding;
///
/// let mut tag = Tag::new(Version::V23);
/// tag.add_frame(TextFrame::new(tag.frame_type("TPE1").unwrap(), Encoding::Latin1, "Artist").unwrap()).unwrap();
/// tag.add_frame(LanguageTextFrame::new(tag.frame_type("COMM").unwrap(), Encoding::Latin1, "eng", "", "Nice").unwrap()).unwrap();
///
/// assert_eq!(tag.artist(), Some("Artist"));
/// assert_eq!(tag.comments().collect::<Vec<_>>(), ["Nice"]);
///
/// // each frame is a 10 byte header plus its payload
/// assert_eq!(tag.size(), (10 + 7) + (10 + 9));
///
/// tag.set_artist("Other Artist").unwrap();
/// assert_eq!(tag.size(), (10 + 13) + (10 + 9));
/// assert_eq!(tag.padding(), 0);
/// ```
#[derive(Clone, Debug)]
pub struct Tag {
    header: TagHeader,
    format: &'static FrameFormat,
    codec: TextCodec,
    extended_header: Option<Vec<u8>>,
    frames: Vec<Frame>,
}

impl Tag {
    /// Builds an empty tag with no padding
    pub fn new(version: Version) -> Self {
        Self {
            header: TagHeader {
                version,
                revision: 0,
                flags: 0,
                size: 0,
            },
            format: version.format(),
            codec: TextCodec::default(),
            extended_header: None,
            frames: Vec::new(),
        }
    }

    /// Reads a tag from the start of a stream
    ///
    /// On success, the stream is positioned just past
    /// the tag's declared size and any footer,
    /// at the start of the audio data.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag header is missing or invalid,
    /// or the stream ends before the tag's declared size.
    /// Malformed frames are not an error; parsing stops at the
    /// first one and the rest of the tag is treated as padding.
    pub fn read<R: Read>(r: R) -> Result<Self, Error> {
        Self::read_with(r, TextCodec::default())
    }

    /// Reads a tag from the start of a stream with the given codec
    pub fn read_with<R: Read>(mut r: R, codec: TextCodec) -> Result<Self, Error> {
        let header: TagHeader = BitReader::endian(r.by_ref(), BigEndian).parse()?;

        let mut body = Vec::new();
        r.by_ref().take(header.size.into()).read_to_end(&mut body)?;
        if body.len() != usize::try_from(header.size).map_err(|_| Error::ExcessiveTagSize)? {
            return Err(Error::Io(std::io::ErrorKind::UnexpectedEof.into()));
        }

        if header.footer_size() > 0 {
            let mut footer = [0; TagHeader::SIZE as usize];
            r.read_exact(&mut footer)?;
            if !footer.starts_with(b"3DI") {
                tracing::warn!("skipped invalid tag footer");
            }
        }

        Self::from_body(header, &body, codec)
    }

    fn from_body(header: TagHeader, body: &[u8], codec: TextCodec) -> Result<Self, Error> {
        let format = header.version.format();
        let mut rest = body;

        let extended_header = match header.has_extended_header() {
            true => {
                let (extended, frames) = split_extended_header(rest, header.version)?;
                rest = frames;
                Some(extended.to_vec())
            }
            false => None,
        };

        if header.flags & TagHeader::UNSYNCHRONISATION != 0 {
            tracing::warn!("reading unsynchronised tag verbatim");
        }

        let mut frames = Vec::new();
        loop {
            match rest.first() {
                None => break,
                Some(0) => {
                    tracing::debug!(padding = rest.len(), "reached padding");
                    break;
                }
                Some(_) => match Frame::parse(rest, format, codec) {
                    Ok((frame, next)) => {
                        tracing::debug!(id = frame.id(), size = frame.size(), "read frame");
                        frames.push(frame);
                        rest = next;
                    }
                    Err(err) => {
                        tracing::warn!(
                            error = %err,
                            remaining = rest.len(),
                            "stopped reading frames"
                        );
                        break;
                    }
                },
            }
        }

        Ok(Self {
            header,
            format,
            codec,
            extended_header,
            frames,
        })
    }

    /// Re-targets us and all our frames to write with a new codec
    pub fn with_codec(mut self, codec: TextCodec) -> Self {
        self.codec = codec;
        self.frames.iter_mut().for_each(|f| f.set_codec(codec));
        self
    }

    /// Our tag header, as read
    ///
    /// Its size is the size we declared when read,
    /// which may be smaller than our current [`Tag::declared_size`].
    #[inline]
    pub fn header(&self) -> &TagHeader {
        &self.header
    }

    /// Our ID3v2 major version
    #[inline]
    pub fn version(&self) -> Version {
        self.header.version
    }

    /// Our version's frame format
    #[inline]
    pub fn format(&self) -> &'static FrameFormat {
        self.format
    }

    /// Our text codec
    #[inline]
    pub fn codec(&self) -> TextCodec {
        self.codec
    }

    /// Looks up an identifier defined by our version
    #[inline]
    pub fn frame_type(&self, id: &str) -> Option<&'static FrameType> {
        self.format.frame_type(id)
    }

    /// Size of our extended header and frames, in bytes
    ///
    /// This is every frame's header plus its payload,
    /// and is always current with any changes to our frames.
    pub fn size(&self) -> u64 {
        let header_size = u64::from(self.format.header_size());

        self.extended_header
            .as_ref()
            .map(|e| e.len() as u64)
            .unwrap_or(0)
            + self
                .frames
                .iter()
                .map(|f| header_size + u64::from(f.size()))
                .sum::<u64>()
    }

    /// Bytes reserved beyond our frames
    ///
    /// Whatever our declared size holds beyond our frames,
    /// or nothing if our frames have outgrown it.
    pub fn padding(&self) -> u64 {
        u64::from(self.header.size).saturating_sub(self.size())
    }

    /// Size of everything following our tag header, padding included
    pub fn declared_size(&self) -> u64 {
        self.size() + self.padding()
    }

    /// Our total size including the tag header, in bytes
    pub fn total_size(&self) -> u64 {
        u64::from(TagHeader::SIZE) + self.declared_size()
    }

    /// Sets our declared size to our frames plus the given padding
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExcessiveTagSize`] if the new size
    /// is too large for a tag header.
    pub fn set_padding(&mut self, padding: u64) -> Result<(), Error> {
        self.header.size = self
            .size()
            .checked_add(padding)
            .and_then(|s| u32::try_from(s).ok())
            .filter(|s| *s <= Packing::SynchSafe.max())
            .ok_or(Error::ExcessiveTagSize)?;
        Ok(())
    }

    /// Grows our declared size so our total size is at least `total`
    pub(crate) fn reserve_total(&mut self, total: u64) -> Result<(), Error> {
        if let Some(padding) = total.checked_sub(self.total_size()) {
            self.set_padding(self.padding() + padding)?;
        }
        Ok(())
    }

    /// Marks our current size as the size we declare
    pub(crate) fn commit_size(&mut self) -> Result<(), Error> {
        self.header.size =
            u32::try_from(self.declared_size()).map_err(|_| Error::ExcessiveTagSize)?;
        self.header.flags &= !TagHeader::FOOTER;
        Ok(())
    }

    /// Checks that we can be written in our version
    ///
    /// This is checked again whenever we are serialized,
    /// so nothing is written if it fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFrame`] if a frame's identifier
    /// is not defined by our version, [`Error::ExcessiveFrameSize`]
    /// if a frame is too large for our version's size field,
    /// or [`Error::ExcessiveTagSize`] if we are too large
    /// for a tag header.
    pub fn validate(&self) -> Result<(), Error> {
        let max = self.format.size_field().max();

        self.frames.iter().try_for_each(|frame| {
            self.check_frame(frame)?;
            match frame.size() <= max {
                true => Ok(()),
                false => Err(Error::ExcessiveFrameSize),
            }
        })?;

        match self.declared_size() <= u64::from(Packing::SynchSafe.max()) {
            true => Ok(()),
            false => Err(Error::ExcessiveTagSize),
        }
    }

    /// All our frames, in order
    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// All our frames with the given identifier, in order
    pub fn frames_of<'t>(&'t self, id: &'t str) -> impl Iterator<Item = &'t Frame> {
        self.frames.iter().filter(move |f| f.id() == id)
    }

    /// Our first frame with the given identifier
    pub fn frame(&self, id: &str) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id() == id)
    }

    /// Our first frame with the given identifier, mutably
    ///
    /// A frame replaced with one from some other version
    /// fails [`Tag::validate`] and will not be written.
    pub fn frame_mut(&mut self, id: &str) -> Option<&mut Frame> {
        self.frames.iter_mut().find(|f| f.id() == id)
    }

    fn check_frame(&self, frame: &Frame) -> Result<(), Error> {
        match self.format.frame_type(frame.id()) == Some(frame.header().frame_type) {
            true => Ok(()),
            false => Err(Error::UnsupportedFrame(frame.id().to_owned())),
        }
    }

    /// Appends a frame, which adopts our codec
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFrame`] if the frame's
    /// identifier is not defined by our version.
    pub fn add_frame(&mut self, frame: impl Into<Frame>) -> Result<(), Error> {
        let mut frame = frame.into();
        self.check_frame(&frame)?;
        frame.set_codec(self.codec);
        self.frames.push(frame);
        Ok(())
    }

    /// Appends several frames
    ///
    /// If any frame is not defined by our version,
    /// none of them are added.
    pub fn add_frames<F: Into<Frame>>(
        &mut self,
        frames: impl IntoIterator<Item = F>,
    ) -> Result<(), Error> {
        let mut frames = frames.into_iter().map(F::into).collect::<Vec<_>>();
        frames.iter().try_for_each(|f| self.check_frame(f))?;
        frames.iter_mut().for_each(|f| f.set_codec(self.codec));
        self.frames.append(&mut frames);
        Ok(())
    }

    /// Removes and returns all frames with the given identifier
    pub fn delete_frames(&mut self, id: &str) -> Vec<Frame> {
        self.frames.extract_if(.., |f| f.id() == id).collect()
    }

    fn common_text(&self, id: &str) -> Option<&str> {
        self.frame(id)?.text().map(|t| t.trim_end_matches('\0'))
    }

    fn set_common_text(&mut self, id: &str, text: String) -> Result<(), Error> {
        match self.frame_mut(id) {
            Some(Frame::Text(f)) => f.set_text(text),
            Some(Frame::DescribedText(f)) => f.set_text(text),
            Some(Frame::LanguageText(f)) => f.set_text(text),
            Some(Frame::Data(_) | Frame::Image(_)) | None => Ok(()),
        }
    }

    /// Our track title, if any
    pub fn title(&self) -> Option<&str> {
        self.common_text(self.format.common().title)
    }

    /// Our lead artist, if any
    pub fn artist(&self) -> Option<&str> {
        self.common_text(self.format.common().artist)
    }

    /// Our album title, if any
    pub fn album(&self) -> Option<&str> {
        self.common_text(self.format.common().album)
    }

    /// Our year or recording time, if any
    pub fn year(&self) -> Option<&str> {
        self.common_text(self.format.common().year)
    }

    /// Our content type, if any
    pub fn genre(&self) -> Option<&str> {
        self.common_text(self.format.common().genre)
    }

    /// The text of all our comments, in order
    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.frames_of(self.format.common().comments)
            .filter_map(|f| f.text())
    }

    /// Updates our track title, if we have a title frame
    pub fn set_title(&mut self, text: impl Into<String>) -> Result<(), Error> {
        self.set_common_text(self.format.common().title, text.into())
    }

    /// Updates our lead artist, if we have an artist frame
    pub fn set_artist(&mut self, text: impl Into<String>) -> Result<(), Error> {
        self.set_common_text(self.format.common().artist, text.into())
    }

    /// Updates our album title, if we have an album frame
    pub fn set_album(&mut self, text: impl Into<String>) -> Result<(), Error> {
        self.set_common_text(self.format.common().album, text.into())
    }

    /// Updates our year, if we have a year frame
    pub fn set_year(&mut self, text: impl Into<String>) -> Result<(), Error> {
        self.set_common_text(self.format.common().year, text.into())
    }

    /// Updates our content type, if we have a genre frame
    pub fn set_genre(&mut self, text: impl Into<String>) -> Result<(), Error> {
        self.set_common_text(self.format.common().genre, text.into())
    }

    /// Serializes our header and frames, without any padding
    ///
    /// The header declares our full [`Tag::declared_size`],
    /// so the caller is responsible for the padding region
    /// following these bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut w = BitWriter::endian(Vec::new(), BigEndian);
        w.build(self)?;
        Ok(w.into_writer())
    }

    /// Writes our header, frames and zeroed padding
    ///
    /// Exactly [`Tag::total_size`] bytes are written.
    pub fn write<W: std::io::Write>(&self, mut w: W) -> Result<(), Error> {
        let bytes = self.to_bytes()?;
        w.write_all(&bytes)?;
        std::io::copy(
            &mut std::io::repeat(0).take(self.total_size() - bytes.len() as u64),
            &mut w,
        )?;
        Ok(())
    }
}

impl ToBitStream for Tag {
    type Error = Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        self.validate()?;

        w.build(&TagHeader {
            size: u32::try_from(self.declared_size()).map_err(|_| Error::ExcessiveTagSize)?,
            flags: self.header.flags & !TagHeader::FOOTER,
            ..self.header
        })?;

        match (&self.extended_header, self.header.version) {
            // size, flags, padding size, optional CRC
            (Some(extended), Version::V23) if extended.len() >= 10 => {
                let padding = u32::try_from(self.padding()).map_err(|_| Error::ExcessiveTagSize)?;
                w.write_bytes(&extended[0..6])?;
                w.write_from(int::encode(padding, Packing::Normal))?;
                w.write_bytes(&extended[10..])?;
            }
            (Some(extended), _) => w.write_bytes(extended)?,
            (None, _) => {}
        }

        self.frames
            .iter()
            .try_for_each(|frame| w.build_with(frame, self.format))
    }
}

// splits the opaque extended header from the frames following it
fn split_extended_header(body: &[u8], version: Version) -> Result<(&[u8], &[u8]), Error> {
    let (size, _) = body
        .split_first_chunk::<4>()
        .ok_or(Error::InvalidExtendedHeader)?;

    let len = match version {
        // ID3v2.4 sizes include the size field itself
        Version::V24 => int::decode(*size, Packing::SynchSafe)?,
        _ => int::decode(*size, Packing::Normal)?
            .checked_add(4)
            .ok_or(Error::InvalidExtendedHeader)?,
    };

    usize::try_from(len)
        .ok()
        .filter(|len| *len >= 4)
        .and_then(|len| body.split_at_checked(len))
        .ok_or(Error::InvalidExtendedHeader)
}
