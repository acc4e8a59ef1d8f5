// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Bounded cursors over a single frame's payload
//!
//! Neither cursor ever grows or shrinks its buffer.
//! A frame's payload size is always known in advance,
//! so writers are handed a buffer of exactly that size
//! and [`FrameWriter::finish`] confirms it was filled.

use crate::Error;
use crate::text::{Encoding, TextCodec, terminator_offset};

/// A sequential reader over a frame's payload bytes
#[derive(Debug)]
pub struct FrameReader<'b> {
    data: &'b [u8],
    codec: TextCodec,
}

impl<'b> FrameReader<'b> {
    /// Wraps payload bytes, decoding strings with the given codec
    pub fn new(data: &'b [u8], codec: TextCodec) -> Self {
        Self { data, codec }
    }

    /// Bytes not yet read
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    /// Reads a single byte
    pub fn read_byte(&mut self) -> Result<u8, Error> {
        let [byte] = self.read_array()?;
        Ok(byte)
    }

    /// Reads exactly `len` bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferExhausted`] if fewer bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'b [u8], Error> {
        let (bytes, rest) = self
            .data
            .split_at_checked(len)
            .ok_or(Error::BufferExhausted)?;
        self.data = rest;
        Ok(bytes)
    }

    /// Reads exactly `N` bytes into an array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let (bytes, rest) = self
            .data
            .split_first_chunk::<N>()
            .ok_or(Error::BufferExhausted)?;
        self.data = rest;
        Ok(*bytes)
    }

    /// Reads all remaining bytes
    pub fn read_rest(&mut self) -> &'b [u8] {
        std::mem::take(&mut self.data)
    }

    /// Reads a string up to its terminator, consuming the terminator
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingTerminator`] if no terminator
    /// remains, or an error if the string fails to decode.
    pub fn read_terminated_string(&mut self, encoding: Encoding) -> Result<String, Error> {
        let len = terminator_offset(self.data, encoding).ok_or(Error::MissingTerminator)?;
        let bytes = self.read_bytes(len)?;
        self.codec
            .decode(&bytes[..len - encoding.terminator_width()], encoding)
    }

    /// Reads a string from all remaining bytes
    pub fn read_rest_string(&mut self, encoding: Encoding) -> Result<String, Error> {
        let bytes = self.read_rest();
        self.codec.decode(bytes, encoding)
    }
}

/// A sequential writer into a pre-sized frame payload buffer
#[derive(Debug)]
pub struct FrameWriter<'b> {
    data: &'b mut [u8],
    position: usize,
    codec: TextCodec,
}

impl<'b> FrameWriter<'b> {
    /// Wraps an output buffer, encoding strings with the given codec
    pub fn new(data: &'b mut [u8], codec: TextCodec) -> Self {
        Self {
            data,
            position: 0,
            codec,
        }
    }

    /// Space not yet written
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Writes a single byte
    pub fn write_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.write_bytes(&[byte])
    }

    /// Writes raw bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferExhausted`] if the bytes don't fit.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.data
            .get_mut(self.position..self.position + bytes.len())
            .ok_or(Error::BufferExhausted)?
            .copy_from_slice(bytes);
        self.position += bytes.len();
        Ok(())
    }

    /// Writes an encoded string without a terminator
    pub fn write_string(&mut self, text: &str, encoding: Encoding) -> Result<(), Error> {
        let encoded = self.codec.encode(text, encoding)?;
        self.write_bytes(&encoded)
    }

    /// Writes an encoded string followed by its terminator
    pub fn write_terminated_string(&mut self, text: &str, encoding: Encoding) -> Result<(), Error> {
        const NULLS: [u8; 2] = [0; 2];

        self.write_string(text, encoding)?;
        self.write_bytes(&NULLS[..encoding.terminator_width()])
    }

    /// Confirms the whole buffer has been written
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameSizeMismatch`] if any space remains.
    pub fn finish(self) -> Result<(), Error> {
        match self.remaining() {
            0 => Ok(()),
            _ => Err(Error::FrameSizeMismatch),
        }
    }
}

#[test]
fn test_reader() {
    let codec = TextCodec::default();
    let mut r = FrameReader::new(b"\x03engFoo\x00Bar", codec);

    assert_eq!(r.read_byte().unwrap(), 3);
    assert_eq!(&r.read_array::<3>().unwrap(), b"eng");
    assert_eq!(r.read_terminated_string(Encoding::Utf8).unwrap(), "Foo");
    assert_eq!(r.remaining(), 3);
    assert!(matches!(r.read_bytes(4), Err(Error::BufferExhausted)));
    // a failed read consumes nothing
    assert_eq!(r.remaining(), 3);
    assert_eq!(r.read_rest_string(Encoding::Utf8).unwrap(), "Bar");
    assert_eq!(r.remaining(), 0);
    assert!(matches!(r.read_byte(), Err(Error::BufferExhausted)));
    assert_eq!(r.read_rest(), b"");
}

#[test]
fn test_reader_missing_terminator() {
    let mut r = FrameReader::new(b"\x00F\x00o\x00", TextCodec::default());

    assert!(matches!(
        r.read_terminated_string(Encoding::Utf16Be),
        Err(Error::MissingTerminator)
    ));
}

#[test]
fn test_writer() {
    let codec = TextCodec::default();
    let mut buf = [0xAA; 9];
    let mut w = FrameWriter::new(&mut buf, codec);

    w.write_byte(0).unwrap();
    w.write_terminated_string("Foo", Encoding::Latin1).unwrap();
    w.write_string("Bar", Encoding::Latin1).unwrap();
    assert_eq!(w.remaining(), 1);
    assert!(matches!(w.write_bytes(b"xy"), Err(Error::BufferExhausted)));
    assert!(matches!(w.finish(), Err(Error::FrameSizeMismatch)));

    let mut w = FrameWriter::new(&mut buf, codec);
    w.write_byte(0).unwrap();
    w.write_terminated_string("Foo", Encoding::Latin1).unwrap();
    w.write_string("Barx", Encoding::Latin1).unwrap();
    w.finish().unwrap();
    assert_eq!(&buf, b"\x00Foo\x00Barx");
}
