use id3_codec::Error;
use id3_codec::frame::{
    DataFrame, DescribedTextFrame, Frame, FrameBody, ImageFrame, LanguageTextFrame, TextFrame,
};
use id3_codec::int::{Packing, encode};
use id3_codec::tag::{Tag, Version};
use id3_codec::text::{ByteOrder, Encoding, TextCodec};

fn tag_bytes(version: u8, frames: &[&[u8]], padding: usize) -> Vec<u8> {
    let frames = frames.concat();
    let size = u32::try_from(frames.len() + padding).unwrap();

    let mut bytes = b"ID3".to_vec();
    bytes.extend([version, 0, 0]);
    bytes.extend(encode(size, Packing::SynchSafe));
    bytes.extend(frames);
    bytes.extend(std::iter::repeat_n(0, padding));
    bytes
}

fn reparse(tag: &Tag) -> Tag {
    let mut written = Vec::new();
    tag.write(&mut written).unwrap();
    assert_eq!(written.len() as u64, tag.total_size());
    Tag::read(written.as_slice()).unwrap()
}

#[test]
fn test_comment_byte_identity() {
    // ISO-8859-1 comment in an ID3v2.3 tag
    let comment: &[u8] = b"COMM\x00\x00\x00\x0B\x00\x00\x00engFoo\x00Bar";
    let data = tag_bytes(3, &[comment], 0);
    let tag = Tag::read(data.as_slice()).unwrap();
    assert_eq!(tag.comments().collect::<Vec<_>>(), ["Bar"]);
    assert_eq!(tag.to_bytes().unwrap(), data);

    // UTF-16 comment with an empty description in an ID3v2.4 tag
    let comment: &[u8] =
        b"COMM\x00\x00\x00\x0E\x00\x00\x01eng\xFF\xFE\x00\x00\xFF\xFEH\x00i\x00";
    let data = tag_bytes(4, &[comment], 0);
    let tag = Tag::read(data.as_slice()).unwrap();

    let Some(Frame::LanguageText(frame)) = tag.frame("COMM") else {
        panic!("comment not found");
    };
    assert_eq!(frame.encoding(), Encoding::Utf16);
    assert_eq!(frame.language(), b"eng");
    assert_eq!(frame.description(), "");
    assert_eq!(frame.text(), "Hi");
    assert_eq!(frame.size(), 14);

    assert_eq!(tag.to_bytes().unwrap(), data);
}

#[test]
fn test_user_defined_text() {
    let mut tag = Tag::new(Version::V24);
    tag.add_frame(
        DescribedTextFrame::new(
            tag.frame_type("TXXX").unwrap(),
            Encoding::Utf8,
            "MOOD",
            "Calm",
        )
        .unwrap(),
    )
    .unwrap();

    let bytes = tag.to_bytes().unwrap();
    assert_eq!(&bytes[10..], b"TXXX\x00\x00\x00\x0A\x00\x00\x03MOOD\x00Calm");

    let tag = Tag::read(bytes.as_slice()).unwrap();
    let frame: &DescribedTextFrame = tag.frame("TXXX").unwrap().try_into().unwrap();
    assert_eq!(frame.description(), "MOOD");
    assert_eq!(frame.text(), "Calm");

    // not a text frame of some other shape
    assert!(<&TextFrame>::try_from(tag.frame("TXXX").unwrap()).is_err());
}

#[test]
fn test_frame_size_fields() {
    fn frame_size(version: Version) -> [u8; 4] {
        let mut tag = Tag::new(version);
        tag.add_frame(
            TextFrame::new(
                tag.frame_type("TIT2").unwrap(),
                Encoding::Latin1,
                "x".repeat(199),
            )
            .unwrap(),
        )
        .unwrap();

        let bytes = tag.to_bytes().unwrap();
        bytes[14..18].try_into().unwrap()
    }

    // 200 bytes, synch-safe in ID3v2.4 only
    assert_eq!(frame_size(Version::V23), [0x00, 0x00, 0x00, 0xC8]);
    assert_eq!(frame_size(Version::V24), [0x00, 0x00, 0x01, 0x48]);

    let mut tag = Tag::new(Version::V22);
    tag.add_frame(
        TextFrame::new(
            tag.frame_type("TT2").unwrap(),
            Encoding::Latin1,
            "x".repeat(299),
        )
        .unwrap(),
    )
    .unwrap();
    let bytes = tag.to_bytes().unwrap();
    assert_eq!(&bytes[10..16], b"TT2\x00\x01\x2C");
}

#[test]
fn test_every_encoding_roundtrips() {
    for encoding in [
        Encoding::Latin1,
        Encoding::Utf16,
        Encoding::Utf16Be,
        Encoding::Utf8,
    ] {
        let mut tag = Tag::new(Version::V24);
        tag.add_frame(
            TextFrame::new(tag.frame_type("TIT2").unwrap(), encoding, "Caf\u{e9}").unwrap(),
        )
        .unwrap();
        tag.add_frame(
            LanguageTextFrame::new(
                tag.frame_type("USLT").unwrap(),
                encoding,
                "fra",
                "Paroles",
                "\u{c0} bient\u{f4}t",
            )
            .unwrap(),
        )
        .unwrap();

        let reparsed = reparse(&tag);
        assert_eq!(reparsed.title(), Some("Caf\u{e9}"));
        assert_eq!(reparsed.frames(), tag.frames());
        assert_eq!(reparsed.size(), tag.size());
    }

    // ISO-8859-1 can't hold everything
    let mut tag = Tag::new(Version::V24);
    assert!(matches!(
        TextFrame::new(
            tag.frame_type("TIT2").unwrap(),
            Encoding::Latin1,
            "\u{65e5}\u{672c}",
        ),
        Err(Error::UnencodableText(Encoding::Latin1))
    ));

    tag.add_frame(
        TextFrame::new(
            tag.frame_type("TIT2").unwrap(),
            Encoding::Utf16,
            "\u{65e5}\u{672c}",
        )
        .unwrap(),
    )
    .unwrap();
    let Some(Frame::Text(title)) = tag.frame_mut("TIT2") else {
        panic!("title not found");
    };
    assert!(matches!(
        title.set_encoding(Encoding::Latin1),
        Err(Error::UnencodableText(Encoding::Latin1))
    ));
    assert_eq!(title.encoding(), Encoding::Utf16);
    assert_eq!(title.size(), 1 + 2 + 4);
}

#[test]
fn test_big_endian_utf16() {
    let codec = TextCodec::default().utf16_order(ByteOrder::BigEndian);
    let title: &[u8] = b"TIT2\x00\x00\x00\x07\x00\x00\x01\xFE\xFF\x00H\x00i";
    let data = tag_bytes(3, &[title], 0);

    // the default codec writes little-endian strings
    let tag = Tag::read(data.as_slice()).unwrap();
    assert_eq!(tag.title(), Some("Hi"));
    assert_eq!(
        &tag.to_bytes().unwrap()[20..],
        b"\x01\xFF\xFEH\x00i\x00"
    );

    let tag = Tag::read_with(data.as_slice(), codec).unwrap();
    assert_eq!(tag.codec(), codec);
    assert_eq!(tag.to_bytes().unwrap(), data);
}

#[test]
fn test_every_shape_roundtrips() {
    let mut tag = Tag::new(Version::V23);
    tag.add_frames([
        Frame::from(TextFrame::new(tag.frame_type("TALB").unwrap(), Encoding::Latin1, "Album").unwrap()),
        DescribedTextFrame::new(
            tag.frame_type("TXXX").unwrap(),
            Encoding::Latin1,
            "Catalog",
            "ABC-123",
        )
        .unwrap()
        .into(),
        LanguageTextFrame::new(
            tag.frame_type("COMM").unwrap(),
            Encoding::Utf16,
            "eng",
            "Note",
            "Remastered",
        )
        .unwrap()
        .into(),
        ImageFrame::new(
            tag.frame_type("APIC").unwrap(),
            Encoding::Latin1,
            "image/png",
            3,
            "Cover",
            (0..=255).collect(),
        )
        .unwrap()
        .into(),
        DataFrame::new(tag.frame_type("PRIV").unwrap(), b"owner\x00data".to_vec())
            .unwrap()
            .into(),
    ])
    .unwrap();
    tag.set_padding(64).unwrap();

    let reparsed = reparse(&tag);
    assert_eq!(reparsed.frames(), tag.frames());
    assert_eq!(reparsed.padding(), 64);
    assert_eq!(reparsed.album(), Some("Album"));

    let image: &ImageFrame = reparsed.frame("APIC").unwrap().try_into().unwrap();
    assert_eq!(image.mime_type(), "image/png");
    assert_eq!(image.picture_type(), 3);
    assert_eq!(image.data().len(), 256);

    assert_eq!(reparsed.frame("PRIV").unwrap().to_string(), "<binary data>");
    assert_eq!(reparsed.frame("COMM").unwrap().to_string(), "Remastered");
}

#[test]
fn test_serialization_is_idempotent() {
    let title: &[u8] = b"TIT2\x00\x00\x00\x04\x00\x00\x00Foo";
    let comment: &[u8] = b"COMM\x00\x00\x00\x0B\x00\x00\x00engFoo\x00Bar";
    let data = tag_bytes(3, &[comment, title, comment], 17);

    let first = Tag::read(data.as_slice()).unwrap();
    let mut written = Vec::new();
    first.write(&mut written).unwrap();
    assert_eq!(written, data);

    let second = Tag::read(written.as_slice()).unwrap();
    let mut rewritten = Vec::new();
    second.write(&mut rewritten).unwrap();
    assert_eq!(rewritten, written);
}

#[test]
fn test_several_comments() {
    let mut tag = Tag::new(Version::V23);
    for (language, text) in [("eng", "Hello"), ("deu", "Hallo"), ("fra", "Bonjour")] {
        tag.add_frame(
            LanguageTextFrame::new(
                tag.frame_type("COMM").unwrap(),
                Encoding::Latin1,
                language,
                "",
                text,
            )
            .unwrap(),
        )
        .unwrap();
    }

    let reparsed = reparse(&tag);
    assert_eq!(
        reparsed.comments().collect::<Vec<_>>(),
        ["Hello", "Hallo", "Bonjour"]
    );

    let languages = reparsed
        .frames_of("COMM")
        .filter_map(|f| <&LanguageTextFrame>::try_from(f).ok())
        .map(|f| *f.language())
        .collect::<Vec<_>>();
    assert_eq!(languages, [*b"eng", *b"deu", *b"fra"]);
}

#[test]
fn test_size_matches_serialization() {
    let mut tag = Tag::new(Version::V23);
    tag.add_frames([
        Frame::from(TextFrame::new(tag.frame_type("TIT2").unwrap(), Encoding::Latin1, "").unwrap()),
        DescribedTextFrame::new(tag.frame_type("TXXX").unwrap(), Encoding::Utf16, "", "")
            .unwrap()
            .into(),
        LanguageTextFrame::new(tag.frame_type("COMM").unwrap(), Encoding::Latin1, "eng", "", "")
            .unwrap()
            .into(),
    ])
    .unwrap();

    const ENCODINGS: [Encoding; 4] = [
        Encoding::Latin1,
        Encoding::Utf16,
        Encoding::Utf16Be,
        Encoding::Utf8,
    ];

    fn random_text() -> String {
        std::iter::repeat_with(|| match fastrand::u8(0..10) {
            0 => '\u{e9}',
            1 => '\u{65e5}',
            2 => '\u{1F3B5}',
            _ => fastrand::char('a'..='z'),
        })
        .take(fastrand::usize(0..20))
        .collect()
    }

    for _ in 0..500 {
        let encoding = ENCODINGS[fastrand::usize(..ENCODINGS.len())];
        let frame = fastrand::usize(..tag.frames().len());
        let id = tag.frames()[frame].id();

        // failed mutations leave everything as it was
        let _ = match (tag.frame_mut(id).unwrap(), fastrand::u8(0..3)) {
            (Frame::Text(f), 0) => f.set_encoding(encoding),
            (Frame::Text(f), _) => f.set_text(random_text()),
            (Frame::DescribedText(f), 0) => f.set_encoding(encoding),
            (Frame::DescribedText(f), 1) => f.set_description(random_text()),
            (Frame::DescribedText(f), _) => f.set_text(random_text()),
            (Frame::LanguageText(f), 0) => f.set_encoding(encoding),
            (Frame::LanguageText(f), 1) => f.set_description(random_text()),
            (Frame::LanguageText(f), _) => f.set_text(random_text()),
            (Frame::Data(_) | Frame::Image(_), _) => unreachable!(),
        };

        let bytes = tag.to_bytes().unwrap();
        assert_eq!(bytes.len() as u64, tag.total_size());
        assert_eq!(tag.padding(), 0);

        let reparsed = Tag::read(bytes.as_slice()).unwrap();
        assert_eq!(reparsed.frames(), tag.frames());
    }
}

#[test]
fn test_version_mismatch() {
    let mut tag = Tag::new(Version::V23);

    // recording time is ID3v2.4 only
    let tdrc = Version::V24.format().frame_type("TDRC").unwrap();
    assert!(tag.frame_type("TDRC").is_none());
    assert!(matches!(
        tag.add_frame(TextFrame::new(tdrc, Encoding::Latin1, "2024").unwrap()),
        Err(Error::UnsupportedFrame(_))
    ));

    // nothing is added if any frame is unsupported
    let tyer = tag.frame_type("TYER").unwrap();
    assert!(matches!(
        tag.add_frames([
            TextFrame::new(tyer, Encoding::Latin1, "2024").unwrap(),
            TextFrame::new(tdrc, Encoding::Latin1, "2024").unwrap(),
        ]),
        Err(Error::UnsupportedFrame(_))
    ));
    assert!(tag.frames().is_empty());
    assert_eq!(tag.size(), 0);

    // the wrong shape for an identifier
    assert!(matches!(
        TextFrame::new(tag.frame_type("COMM").unwrap(), Encoding::Latin1, "Foo"),
        Err(Error::UnsupportedFrame(_))
    ));
}
