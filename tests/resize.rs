use id3_codec::Error;
use id3_codec::file::{Save, SaveOptions, TaggedFile, shift, update, update_file, update_with};
use id3_codec::frame::{DataFrame, Frame, LanguageTextFrame, TextFrame};
use id3_codec::int::{Packing, encode};
use id3_codec::tag::{Tag, Version};
use id3_codec::text::Encoding;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

const TITLE: &[u8] = b"TIT2\x00\x00\x00\x04\x00\x00\x00Foo";
const COMMENT: &[u8] = b"COMM\x00\x00\x00\x0B\x00\x00\x00engFoo\x00Bar";

fn tag_bytes(frames: &[&[u8]], padding: usize) -> Vec<u8> {
    let frames = frames.concat();
    let size = u32::try_from(frames.len() + padding).unwrap();

    let mut bytes = b"ID3\x03\x00\x00".to_vec();
    bytes.extend(encode(size, Packing::SynchSafe));
    bytes.extend(frames);
    bytes.extend(std::iter::repeat_n(0, padding));
    bytes
}

fn audio(len: usize) -> Vec<u8> {
    // audio frames may contain anything, including "ID3"
    std::iter::repeat_with(|| fastrand::u8(..))
        .take(len)
        .chain(b"ID3".iter().copied())
        .collect()
}

fn file(tag: &[u8], audio: &[u8]) -> Cursor<Vec<u8>> {
    Cursor::new([tag, audio].concat())
}

// splits a saved file into its tag and whatever follows the tag
fn split(data: &[u8]) -> (Tag, &[u8]) {
    let mut r = data;
    let tag = Tag::read(&mut r).unwrap();
    (tag, r)
}

fn add_comment(tag: &mut Tag, text: &str) -> Result<(), Error> {
    let comm = tag.frame_type("COMM").unwrap();
    tag.add_frame(LanguageTextFrame::new(comm, Encoding::Latin1, "eng", "", text)?)
}

#[test]
fn test_grow_shifts_audio() {
    let original = tag_bytes(&[TITLE], 0);
    let audio = audio(100_000);

    let mut tagged = TaggedFile::read(file(&original, &audio)).unwrap();
    assert_eq!(tagged.tag_region(), original.len() as u64);

    add_comment(tagged.tag_mut(), &"x".repeat(5000)).unwrap();
    tagged.tag_mut().set_title("A much longer title").unwrap();
    let total = tagged.tag().total_size();

    // small buffers force many chunks
    tagged
        .save_with(SaveOptions::default().buffer_size(1000))
        .unwrap();
    assert_eq!(tagged.tag_region(), total);

    let data = tagged.into_inner().into_inner();
    assert_eq!(data.len() as u64, total + audio.len() as u64);

    let (tag, rest) = split(&data);
    assert_eq!(rest, audio.as_slice());
    assert_eq!(tag.total_size(), total);
    assert_eq!(tag.title(), Some("A much longer title"));
    assert_eq!(tag.comments().next().map(str::len), Some(5000));
    assert_eq!(tag.padding(), 0);
}

#[test]
fn test_shrink_keeps_region() {
    let original = tag_bytes(&[TITLE, COMMENT], 20);
    let audio = audio(4096);

    let mut tagged = TaggedFile::read(file(&original, &audio)).unwrap();
    tagged.tag_mut().delete_frames("COMM");
    tagged.tag_mut().set_title("F").unwrap();
    tagged.save().unwrap();
    assert_eq!(tagged.tag_region(), original.len() as u64);

    let data = tagged.into_inner().into_inner();
    assert_eq!(data.len(), original.len() + audio.len());
    assert_eq!(&data[original.len()..], audio.as_slice());

    let (tag, rest) = split(&data);
    assert_eq!(rest, audio.as_slice());
    assert_eq!(tag.title(), Some("F"));
    assert_eq!(tag.frames().len(), 1);

    // the freed space is now zeroed padding
    let used = 10 + 10 + 2;
    assert_eq!(tag.padding(), (original.len() - used) as u64);
    assert!(data[used..original.len()].iter().all(|b| *b == 0));
}

#[test]
fn test_fits_in_padding() {
    let original = tag_bytes(&[TITLE], 100);
    let audio = audio(1000);

    let mut tagged = TaggedFile::read(file(&original, &audio)).unwrap();
    add_comment(tagged.tag_mut(), "Comment").unwrap();
    tagged.save().unwrap();

    let data = tagged.into_inner().into_inner();
    assert_eq!(data.len(), original.len() + audio.len());

    let (tag, rest) = split(&data);
    assert_eq!(rest, audio.as_slice());
    assert_eq!(tag.comments().collect::<Vec<_>>(), ["Comment"]);
    assert_eq!(tag.padding(), 100 - (10 + 12));
}

#[test]
fn test_untagged_file() {
    let audio = audio(2000);

    let mut tagged = TaggedFile::read(Cursor::new(audio.clone())).unwrap();
    assert_eq!(tagged.tag_region(), 0);
    assert_eq!(tagged.tag().version(), Version::V23);
    assert!(tagged.tag().frames().is_empty());

    let title = tagged.tag().frame_type("TIT2").unwrap();
    tagged
        .tag_mut()
        .add_frame(TextFrame::new(title, Encoding::Latin1, "New").unwrap())
        .unwrap();
    tagged.save().unwrap();

    let data = tagged.into_inner().into_inner();
    let (tag, rest) = split(&data);
    assert_eq!(rest, audio.as_slice());
    assert_eq!(tag.title(), Some("New"));
    assert_eq!(data.len(), 10 + 10 + 4 + audio.len());

    // saving an untouched, untagged file writes a bare header
    let mut tagged = TaggedFile::read(Cursor::new(audio.clone())).unwrap();
    tagged.save().unwrap();
    let data = tagged.into_inner().into_inner();
    assert_eq!(&data[0..10], b"ID3\x03\x00\x00\x00\x00\x00\x00");
    assert_eq!(&data[10..], audio.as_slice());
}

#[test]
fn test_save_options_padding() {
    let original = tag_bytes(&[TITLE], 0);
    let audio = audio(3000);

    let mut tagged = TaggedFile::read(file(&original, &audio)).unwrap();
    add_comment(tagged.tag_mut(), "First").unwrap();
    tagged
        .save_with(SaveOptions::default().padding(256))
        .unwrap();
    assert_eq!(tagged.tag().padding(), 256);
    let region = tagged.tag_region();

    // later edits fit in the reserved padding without shifting
    add_comment(tagged.tag_mut(), "Second").unwrap();
    tagged.tag_mut().set_title("Longer title").unwrap();
    tagged
        .save_with(SaveOptions::default().padding(256))
        .unwrap();
    assert_eq!(tagged.tag_region(), region);

    let data = tagged.into_inner().into_inner();
    assert_eq!(data.len() as u64, region + audio.len() as u64);

    let (tag, rest) = split(&data);
    assert_eq!(rest, audio.as_slice());
    assert_eq!(tag.comments().collect::<Vec<_>>(), ["First", "Second"]);
    assert_eq!(tag.title(), Some("Longer title"));
    assert_eq!(tag.padding(), 256 - (10 + 11) - 9);
}

#[test]
fn test_repeated_saves() {
    let original = tag_bytes(&[TITLE, COMMENT], 0);
    let audio = audio(10_000);
    let mut data = file(&original, &audio);

    for round in 0..20 {
        let text = "y".repeat(fastrand::usize(0..500));
        update_with(
            &mut data,
            SaveOptions::default().buffer_size(fastrand::usize(1..2048)),
            |tag| {
                tag.set_title(text.as_str())?;
                if round % 3 == 0 {
                    add_comment(tag, &text)?;
                }
                Ok::<_, Error>(Save::Commit)
            },
        )
        .unwrap();

        let (tag, rest) = split(data.get_ref());
        assert_eq!(rest, audio.as_slice());
        assert_eq!(tag.title(), Some(text.as_str()));
    }
}

#[test]
fn test_rollback() {
    let original = tag_bytes(&[TITLE], 0);
    let audio = audio(500);
    let mut data = file(&original, &audio);

    update(&mut data, |tag| {
        tag.set_title("Changed")?;
        Ok::<_, Error>(Save::Rollback)
    })
    .unwrap();
    assert_eq!(data.get_ref(), &[original.as_slice(), audio.as_slice()].concat());

    // errors from the closure are passed along without saving
    #[derive(Debug)]
    enum MyError {
        Tag(Error),
        Refused,
    }

    impl From<Error> for MyError {
        fn from(err: Error) -> Self {
            Self::Tag(err)
        }
    }

    let result: Result<(), MyError> = update(&mut data, |tag| {
        tag.set_title("Changed")?;
        Err(MyError::Refused)
    });
    assert!(matches!(result, Err(MyError::Refused)));
    assert_eq!(data.get_ref(), &[original.as_slice(), audio.as_slice()].concat());

    let result: Result<(), MyError> = update(&mut data, |tag| {
        add_comment(tag, "\u{65e5}")?;
        Ok(Save::Commit)
    });
    assert!(matches!(
        result,
        Err(MyError::Tag(Error::UnencodableText(_)))
    ));
}

#[test]
fn test_update_file() {
    let original = tag_bytes(&[TITLE, COMMENT], 8);
    let audio = audio(50_000);

    let mut temp = tempfile::NamedTempFile::new().unwrap();
    temp.write_all(&original).unwrap();
    temp.write_all(&audio).unwrap();
    temp.flush().unwrap();

    update_file(temp.path(), |tag| {
        tag.set_title("Updated")?;
        add_comment(tag, &"z".repeat(1000))?;
        Ok::<_, Error>(Save::Commit)
    })
    .unwrap();

    let data = std::fs::read(temp.path()).unwrap();
    let (tag, rest) = split(&data);
    assert_eq!(rest, audio.as_slice());
    assert_eq!(tag.title(), Some("Updated"));
    assert_eq!(tag.comments().count(), 2);

    update_file(temp.path(), |tag| {
        tag.set_title("Rolled back")?;
        Ok::<_, Error>(Save::Rollback)
    })
    .unwrap();
    assert_eq!(std::fs::read(temp.path()).unwrap(), data);

    // frames are addressable by their typed shape after reload
    let tag = Tag::read(std::fs::File::open(temp.path()).unwrap()).unwrap();
    assert!(matches!(tag.frame("TIT2"), Some(Frame::Text(_))));

    assert!(matches!(
        update_file(temp.path().with_extension("missing"), |_| Ok::<_, Error>(
            Save::Commit
        )),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_invalid_tag_leaves_file() {
    let mut tag = Tag::new(Version::V22);
    tag.add_frame(DataFrame::new(tag.frame_type("PIC").unwrap(), b"abc".to_vec()).unwrap())
        .unwrap();
    let mut original = Vec::new();
    tag.write(&mut original).unwrap();
    let before = [original, audio(5000)].concat();

    // too large for an ID3v2.2 size field
    let mut tagged = TaggedFile::read(Cursor::new(before.clone())).unwrap();
    if let Some(Frame::Data(pic)) = tagged.tag_mut().frame_mut("PIC") {
        pic.set_data(vec![7; 1 << 24]).unwrap();
    }
    assert!(matches!(tagged.save(), Err(Error::ExcessiveFrameSize)));
    assert_eq!(tagged.tag_region(), 10 + 6 + 3);
    assert_eq!(tagged.into_inner().into_inner(), before);

    // a frame swapped in from another version
    let before = [tag_bytes(&[TITLE], 0), audio(5000)].concat();
    let mut tagged = TaggedFile::read(Cursor::new(before.clone())).unwrap();
    if let Some(frame) = tagged.tag_mut().frame_mut("TIT2") {
        *frame = TextFrame::new(
            Version::V22.format().frame_type("TT2").unwrap(),
            Encoding::Latin1,
            "x".repeat(100),
        )
        .unwrap()
        .into();
    }
    assert!(matches!(tagged.save(), Err(Error::UnsupportedFrame(_))));
    assert_eq!(tagged.into_inner().into_inner(), before);
}

// a file whose writes start failing after a given number,
// and whose reads may come up short
struct FaultyFile {
    file: Cursor<Vec<u8>>,
    writes: usize,
    short_reads: bool,
}

impl FaultyFile {
    fn new(data: Vec<u8>, writes: usize) -> Self {
        Self {
            file: Cursor::new(data),
            writes,
            short_reads: false,
        }
    }
}

impl Read for FaultyFile {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.short_reads {
            true => Ok(0),
            false => self.file.read(buf),
        }
    }
}

impl Write for FaultyFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.writes.checked_sub(1) {
            Some(writes) => {
                self.writes = writes;
                self.file.write(buf)
            }
            None => Err(std::io::Error::other("disk full")),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

impl Seek for FaultyFile {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.file.seek(pos)
    }
}

#[test]
fn test_io_failures() {
    let original = tag_bytes(&[TITLE], 0);
    let audio = audio(10_000);

    // failing while shifting the audio
    for writes in 0..3 {
        let mut tagged =
            TaggedFile::read(FaultyFile::new([original.as_slice(), &audio].concat(), writes))
                .unwrap();
        add_comment(tagged.tag_mut(), &"x".repeat(2000)).unwrap();
        assert!(matches!(
            tagged.save_with(SaveOptions::default().buffer_size(1000)),
            Err(Error::Io(_))
        ));
    }

    // failing while rewriting the tag in place
    let mut tagged =
        TaggedFile::read(FaultyFile::new([original.as_slice(), &audio].concat(), 0)).unwrap();
    tagged.tag_mut().set_title("F").unwrap();
    assert!(matches!(tagged.save(), Err(Error::Io(_))));

    // a short read while shifting
    let mut file = FaultyFile::new(audio.clone(), usize::MAX);
    file.short_reads = true;
    assert!(matches!(
        shift(&mut file, 0, 100, 64),
        Err(Error::Io(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof
    ));
}

#[test]
fn test_footer_region() {
    let mut header = b"ID3\x04\x00\x10".to_vec();
    header.extend(encode(TITLE.len() as u32, Packing::SynchSafe));
    let mut footer = header.clone();
    footer[0..3].copy_from_slice(b"3DI");
    let original = [header.as_slice(), TITLE, &footer].concat();
    let audio = audio(3000);

    let mut tagged = TaggedFile::read(file(&original, &audio)).unwrap();
    assert_eq!(tagged.tag_region(), original.len() as u64);

    tagged.tag_mut().set_title("F").unwrap();
    tagged.save().unwrap();
    assert_eq!(tagged.tag_region(), original.len() as u64);

    let data = tagged.into_inner().into_inner();
    assert_eq!(data.len(), original.len() + audio.len());
    assert_eq!(data[5], 0);

    // the footer's space is now padding
    let (tag, rest) = split(&data);
    assert_eq!(rest, audio.as_slice());
    assert_eq!(tag.title(), Some("F"));
    assert_eq!(tag.padding(), 2 + 10);
}
