// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A library for reading, editing and rewriting ID3v2 tags
//!
//! ID3v2 tags live at the very start of an audio file
//! and are followed directly by the audio payload.
//!
//! ```text
//! ┌────────────┬────────┬────────┬┄┄┄┬─────────┬┄┄┄┄┄┄┄┄┄┄┄┄┄╮
//! │ Tag Header │ Frame₀ │ Frame₁ ┆ … ┆ Padding ┆ Audio Data  ┆
//! └────────────┴────────┴────────┴┄┄┄┴─────────┴┄┄┄┄┄┄┄┄┄┄┄┄┄╯
//! ```
//!
//! The [`tag::Tag`] type parses and serializes the tag itself,
//! the [`frame`] module holds the individual typed frames,
//! and the [`file`] module writes an edited tag back to disk,
//! shifting the audio payload forward whenever the tag outgrows
//! the space originally reserved for it.
//!
//! # Example
//!
//! ```
//! use id3_codec::tag::{Tag, Version};
//! use id3_codec::frame::TextFrame;
//! use id3_codec::text::Encoding;
//!
//! let mut tag = Tag::new(Version::V23);
//! let title = tag.frame_type("TIT2").unwrap();
//! tag.add_frame(TextFrame::new(title, Encoding::Latin1, "Track Title").unwrap()).unwrap();
//!
//! let bytes = tag.to_bytes().unwrap();
//! let parsed = Tag::read(bytes.as_slice()).unwrap();
//! assert_eq!(parsed.title(), Some("Track Title"));
//! ```

#![warn(missing_docs)]

pub mod cursor;
pub mod file;
pub mod frame;
pub mod int;
pub mod tag;
pub mod text;

use text::Encoding;

/// A possible error when handling ID3v2 tags
#[derive(Debug)]
pub enum Error {
    /// A general I/O error from the underlying stream
    Io(std::io::Error),
    /// A UTF-8 formatting error
    Utf8(std::string::FromUtf8Error),
    /// The "ID3" tag is missing at the start of the stream
    MissingId3Tag,
    /// The tag's major version is not one we understand
    UnsupportedVersion(u8),
    /// A synch-safe integer has a byte with its high bit set
    InvalidSynchSafeInteger,
    /// The extended header's size is inconsistent with the tag
    InvalidExtendedHeader,
    /// A frame identifier not defined for the tag's version
    UnknownFrame(String),
    /// A frame's header or payload extends past the tag's declared size
    FrameExceedsTag,
    /// Insufficient bytes remain in a frame's payload
    BufferExhausted,
    /// A string field is missing its terminator
    MissingTerminator,
    /// A UTF-16 string is malformed
    InvalidUtf16,
    /// A frame's body did not fill its declared size exactly
    FrameSizeMismatch,
    /// An encoding name not among the four ID3v2 encodings
    UnknownEncoding(String),
    /// Text that cannot be represented in the given encoding
    UnencodableText(Encoding),
    /// A language code that is not exactly 3 ASCII characters
    InvalidLanguage,
    /// A frame identifier used with the wrong tag version or frame shape
    UnsupportedFrame(String),
    /// A size adjustment would make a frame's size negative
    InvalidFrameSize,
    /// A frame too large for its header's size field
    ExcessiveFrameSize,
    /// A tag too large for its header's synch-safe size field
    ExcessiveTagSize,
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(error: std::string::FromUtf8Error) -> Self {
        Self::Utf8(error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Utf8(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Io(e) => e.fmt(f),
            Self::Utf8(e) => e.fmt(f),
            Self::MissingId3Tag => "missing ID3 tag".fmt(f),
            Self::UnsupportedVersion(v) => write!(f, "unsupported ID3v2.{v} tag"),
            Self::InvalidSynchSafeInteger => "invalid synch-safe integer".fmt(f),
            Self::InvalidExtendedHeader => "invalid extended header".fmt(f),
            Self::UnknownFrame(id) => write!(f, "unknown frame identifier {id:?}"),
            Self::FrameExceedsTag => "frame extends past end of tag".fmt(f),
            Self::BufferExhausted => "frame buffer exhausted".fmt(f),
            Self::MissingTerminator => "string field missing terminator".fmt(f),
            Self::InvalidUtf16 => "invalid UTF-16 string".fmt(f),
            Self::FrameSizeMismatch => "frame body does not match frame size".fmt(f),
            Self::UnknownEncoding(name) => write!(f, "unknown text encoding {name:?}"),
            Self::UnencodableText(e) => write!(f, "text not representable as {e}"),
            Self::InvalidLanguage => "language code must be 3 ASCII characters".fmt(f),
            Self::UnsupportedFrame(id) => write!(f, "frame {id:?} unsupported here"),
            Self::InvalidFrameSize => "invalid frame size".fmt(f),
            Self::ExcessiveFrameSize => "frame too large for its size field".fmt(f),
            Self::ExcessiveTagSize => "tag too large for its size field".fmt(f),
        }
    }
}
