// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For writing edited tags back to a file
//!
//! A tag occupies the start of its file and the audio
//! data follows it directly.  If an edited tag still
//! fits in the space originally reserved for it,
//! it is rewritten in place and the leftover space becomes padding.
//! Otherwise, the audio data is shifted forward
//! to make room, without loading the whole file into memory.
//!
//! Files are never truncated.

use crate::Error;
use crate::tag::{Tag, TagHeader, Version};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Options for saving a tag to a file
///
/// # Example
/// ```
/// use id3_codec::file::SaveOptions;
///
/// // reserve 1 KiB of padding whenever the tag must grow,
/// // so later edits can be made without shifting the audio
/// let options = SaveOptions::default().padding(1024);
/// ```
#[derive(Copy, Clone, Debug)]
pub struct SaveOptions {
    padding: u32,
    buffer_size: usize,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            padding: 0,
            buffer_size: 1 << 16,
        }
    }
}

impl SaveOptions {
    /// Sets the padding reserved whenever a tag outgrows its space
    pub fn padding(self, padding: u32) -> Self {
        Self { padding, ..self }
    }

    /// Sets the minimum chunk size used when shifting audio data
    pub fn buffer_size(self, buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
            ..self
        }
    }
}

/// Moves everything from `start` to the end of the file
/// forward by `offset` bytes
///
/// The region is copied back to front in chunks of at least `offset`
/// bytes, reading each chunk before writing the one after it,
/// so no byte is overwritten before it has been read.
/// The bytes in `start..start + offset` are left as they were.
///
/// # Errors
///
/// Any short read or write is an error, and leaves the
/// file in an indeterminate state.
///
/// # Example
/// ```
/// use std::io::Cursor;
/// use id3_codec::file::shift;
///
/// let mut file = Cursor::new(b"HEADaudio".to_vec());
/// shift(&mut file, 4, 3, 2).unwrap();
/// assert_eq!(file.into_inner(), b"HEADaudaudio");
/// ```
pub fn shift<F>(file: &mut F, start: u64, offset: u64, buffer_size: usize) -> Result<(), Error>
where
    F: Read + Write + Seek,
{
    // reads the chunk ending at `end` and returns its start
    fn read_chunk<F: Read + Seek>(
        file: &mut F,
        start: u64,
        end: u64,
        chunk: u64,
        buf: &mut Vec<u8>,
    ) -> Result<u64, Error> {
        let len = chunk.min(end - start);
        let from = end - len;
        buf.resize(usize::try_from(len).map_err(|_| Error::ExcessiveTagSize)?, 0);
        file.seek(SeekFrom::Start(from))?;
        file.read_exact(buf)?;
        Ok(from)
    }

    let end = file.seek(SeekFrom::End(0))?;
    if offset == 0 || end <= start {
        return Ok(());
    }

    let chunk = offset.max(buffer_size as u64);
    tracing::debug!(start, end, offset, chunk, "shifting audio data");

    let mut current = Vec::new();
    let mut next = Vec::new();
    let mut from = read_chunk(file, start, end, chunk, &mut current)?;

    loop {
        let pending = match from > start {
            true => Some(read_chunk(file, start, from, chunk, &mut next)?),
            false => None,
        };

        file.seek(SeekFrom::Start(from + offset))?;
        file.write_all(&current)?;

        match pending {
            Some(pending) => {
                from = pending;
                std::mem::swap(&mut current, &mut next);
            }
            None => break Ok(()),
        }
    }
}

/// A file with an ID3v2 tag at its start
///
/// # Example
/// ```
/// use std::io::Cursor;
/// use id3_codec::file::TaggedFile;
/// use id3_codec::frame::TextFrame;
/// use id3_codec::text::Encoding;
///
/// // a file with no tag yet
/// let mut file = TaggedFile::read(Cursor::new(b"audio data".to_vec())).unwrap();
///
/// let title = file.tag().frame_type("TIT2").unwrap();
/// file.tag_mut().add_frame(TextFrame::new(title, Encoding::Latin1, "Title").unwrap()).unwrap();
/// file.save().unwrap();
///
/// let data = file.into_inner().into_inner();
/// assert_eq!(&data[0..3], b"ID3");
/// assert_eq!(&data[data.len() - 10..], b"audio data");
/// ```
#[derive(Debug)]
pub struct TaggedFile<F> {
    file: F,
    tag: Tag,
    region: u64,
}

impl<F: Read + Write + Seek> TaggedFile<F> {
    /// Reads a tag from the start of a file
    ///
    /// A file without an ID3v2 tag gets an empty ID3v2.3 tag
    /// which takes no space in the file until saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the file has a tag header
    /// that can't be read.
    pub fn read(mut file: F) -> Result<Self, Error> {
        file.rewind()?;
        let mut magic = Vec::with_capacity(3);
        Read::by_ref(&mut file).take(3).read_to_end(&mut magic)?;
        file.rewind()?;

        let (tag, region) = match magic.as_slice() {
            b"ID3" => {
                let tag = Tag::read(&mut file)?;
                let header = tag.header();
                let region = u64::from(TagHeader::SIZE)
                    + u64::from(header.size)
                    + u64::from(header.footer_size());
                (tag, region)
            }
            _ => {
                tracing::debug!("no ID3v2 tag found");
                (Tag::new(Version::V23), 0)
            }
        };

        Ok(Self { file, tag, region })
    }

    /// Our tag
    #[inline]
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// Our tag, mutably
    #[inline]
    pub fn tag_mut(&mut self) -> &mut Tag {
        &mut self.tag
    }

    /// Bytes at the start of the file currently reserved for our tag
    #[inline]
    pub fn tag_region(&self) -> u64 {
        self.region
    }

    /// Writes our tag back to the file with default options
    pub fn save(&mut self) -> Result<(), Error> {
        self.save_with(SaveOptions::default())
    }

    /// Writes our tag back to the file
    ///
    /// If the tag has outgrown its region, the audio data
    /// is shifted forward and the tag gets any padding
    /// requested by the options.  If the tag has shrunk,
    /// its padding grows to fill the old region.
    /// Either way, the tag is written at the start of the file
    /// and its padding is zeroed.
    ///
    /// # Errors
    ///
    /// A tag that fails [`Tag::validate`] is an error
    /// and leaves the file untouched.
    /// Any I/O error leaves the file in an indeterminate state.
    pub fn save_with(&mut self, options: SaveOptions) -> Result<(), Error> {
        self.tag.validate()?;

        let needed = self.tag.total_size();
        let grow = needed > self.region;
        match grow {
            true => self
                .tag
                .set_padding(self.tag.padding().max(options.padding.into()))?,
            false => self.tag.reserve_total(self.region)?,
        }

        // the file is untouched until the tag is fully serialized
        let bytes = self.tag.to_bytes()?;
        let total = self.tag.total_size();

        if grow {
            tracing::debug!(old = self.region, new = total, "growing tag region");
            shift(
                &mut self.file,
                self.region,
                total - self.region,
                options.buffer_size,
            )?;
        } else {
            tracing::debug!(old = self.region, new = needed, "reusing tag region");
        }

        self.file.rewind()?;
        self.file.write_all(&bytes)?;
        std::io::copy(
            &mut std::io::repeat(0).take(total - bytes.len() as u64),
            &mut self.file,
        )?;
        self.file.flush()?;

        self.tag.commit_size()?;
        self.region = total;
        Ok(())
    }

    /// Returns the underlying file
    #[inline]
    pub fn into_inner(self) -> F {
        self.file
    }
}

/// Whether to perform or rollback tag changes
pub enum Save {
    /// Commit changes to disk
    Commit,
    /// Abort changes
    Rollback,
}

/// Given a Path, attempts to update its ID3v2 tag
///
/// # Errors
///
/// Returns error if unable to open the file,
/// read its tag, or write the updated tag.
pub fn update_file<P, E>(path: P, f: impl FnOnce(&mut Tag) -> Result<Save, E>) -> Result<(), E>
where
    P: AsRef<Path>,
    E: From<Error>,
{
    use std::fs::OpenOptions;

    update(
        OpenOptions::new()
            .read(true)
            .write(true)
            .truncate(false)
            .create(false)
            .open(path.as_ref())
            .map_err(Error::Io)?,
        f,
    )
}

/// Given open file, attempts to update its ID3v2 tag
///
/// Applies closure `f` to the tag and saves it
/// if `Save::Commit` is returned.
pub fn update<F, E>(file: F, f: impl FnOnce(&mut Tag) -> Result<Save, E>) -> Result<(), E>
where
    F: Read + Write + Seek,
    E: From<Error>,
{
    update_with(file, SaveOptions::default(), f)
}

/// Given open file and save options, attempts to update its ID3v2 tag
pub fn update_with<F, E>(
    file: F,
    options: SaveOptions,
    f: impl FnOnce(&mut Tag) -> Result<Save, E>,
) -> Result<(), E>
where
    F: Read + Write + Seek,
    E: From<Error>,
{
    let mut file = TaggedFile::read(file)?;

    match f(file.tag_mut())? {
        Save::Commit => Ok(file.save_with(options)?),
        Save::Rollback => Ok(()),
    }
}

#[test]
fn test_shift() {
    use std::io::Cursor;

    for _ in 0..100 {
        let start = fastrand::usize(0..100);
        let data = std::iter::repeat_with(|| fastrand::u8(..))
            .take(start + fastrand::usize(0..1000))
            .collect::<Vec<_>>();
        let offset = fastrand::usize(1..300);
        let buffer_size = fastrand::usize(1..64);

        let mut file = Cursor::new(data.clone());
        shift(&mut file, start as u64, offset as u64, buffer_size).unwrap();
        let shifted = file.into_inner();

        if data.len() > start {
            assert_eq!(shifted.len(), data.len() + offset);
            assert_eq!(&shifted[0..start], &data[0..start]);
            assert_eq!(&shifted[start + offset..], &data[start..]);
        } else {
            assert_eq!(shifted, data);
        }
    }
}
