// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Per-version frame identifier tables
//!
//! Each ID3v2 version gets one static [`FrameFormat`],
//! chosen once when a tag is built or parsed,
//! which knows that version's frame header layout
//! and which identifiers it defines.
//!
//! | Version | Header | Identifier | Size field |
//! |--------:|-------:|-----------:|-----------:|
//! | 2.2 | 6 bytes | 3 bytes | 3-byte normal |
//! | 2.3 | 10 bytes | 4 bytes | 4-byte normal |
//! | 2.4 | 10 bytes | 4 bytes | 4-byte synch-safe |

use crate::Error;
use crate::int::Packing;

/// The shape of a frame's payload
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FrameKind {
    /// Uninterpreted binary data
    Data,
    /// Encoding and text
    Text,
    /// Encoding, description and text
    DescribedText,
    /// Encoding, language, description and text
    LanguageText,
    /// Encoding, MIME type, picture type, description and image data
    Image,
}

/// A frame identifier defined by some ID3v2 version
#[derive(Debug, Eq, PartialEq)]
pub struct FrameType {
    /// The ASCII frame identifier
    pub id: &'static str,
    /// A human-readable description of the frame
    pub description: &'static str,
    /// The shape of the frame's payload
    pub kind: FrameKind,
}

const fn ty(id: &'static str, description: &'static str, kind: FrameKind) -> FrameType {
    FrameType {
        id,
        description,
        kind,
    }
}

/// Identifiers of the commonly used frames
#[derive(Debug)]
pub struct CommonFrames {
    /// Track title
    pub title: &'static str,
    /// Lead artist
    pub artist: &'static str,
    /// Album title
    pub album: &'static str,
    /// Year or recording time
    pub year: &'static str,
    /// Content type
    pub genre: &'static str,
    /// Comments
    pub comments: &'static str,
}

/// How a frame header stores its payload size
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SizeField {
    /// 3-byte normal integer
    U24,
    /// 4-byte integer of the given packing
    U32(Packing),
}

impl SizeField {
    /// The largest size the field can hold
    pub const fn max(self) -> u32 {
        match self {
            Self::U24 => (1 << 24) - 1,
            Self::U32(packing) => packing.max(),
        }
    }
}

/// An ID3v2 major version
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Version {
    /// ID3v2.2, with 6-byte frame headers
    V22 = 2,
    /// ID3v2.3, with 10-byte frame headers
    V23 = 3,
    /// ID3v2.4, with 10-byte synch-safe frame headers
    V24 = 4,
}

impl Version {
    /// The frame format of this version
    pub fn format(self) -> &'static FrameFormat {
        match self {
            Self::V22 => &V22,
            Self::V23 => &V23,
            Self::V24 => &V24,
        }
    }
}

impl TryFrom<u8> for Version {
    type Error = Error;

    fn try_from(major: u8) -> Result<Self, Error> {
        match major {
            2 => Ok(Self::V22),
            3 => Ok(Self::V23),
            4 => Ok(Self::V24),
            v => Err(Error::UnsupportedVersion(v)),
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "ID3v2.{}", *self as u8)
    }
}

/// The frame layout and identifiers of one ID3v2 version
#[derive(Debug)]
pub struct FrameFormat {
    version: Version,
    header_size: u32,
    size_field: SizeField,
    has_flags: bool,
    tables: &'static [&'static [FrameType]],
    common: CommonFrames,
}

impl FrameFormat {
    /// Our ID3v2 version
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Size of each frame's header, in bytes
    #[inline]
    pub fn header_size(&self) -> u32 {
        self.header_size
    }

    /// Length of each frame identifier, in bytes
    #[inline]
    pub fn id_len(&self) -> usize {
        match self.size_field {
            SizeField::U24 => 3,
            SizeField::U32(_) => 4,
        }
    }

    /// How frame headers store their payload size
    #[inline]
    pub fn size_field(&self) -> SizeField {
        self.size_field
    }

    /// Whether frame headers carry status and format flags
    #[inline]
    pub fn has_flags(&self) -> bool {
        self.has_flags
    }

    /// The identifiers of our commonly used frames
    #[inline]
    pub fn common(&self) -> &CommonFrames {
        &self.common
    }

    /// Looks up a frame identifier
    ///
    /// ```
    /// use id3_codec::frame::registry::{FrameKind, Version};
    ///
    /// let v23 = Version::V23.format();
    /// assert_eq!(v23.frame_type("TIT2").unwrap().kind, FrameKind::Text);
    /// assert_eq!(v23.frame_type("APIC").unwrap().description, "Attached picture");
    /// assert!(v23.frame_type("TT2").is_none());
    /// assert!(Version::V24.format().frame_type("TDRC").is_some());
    /// ```
    pub fn frame_type(&self, id: &str) -> Option<&'static FrameType> {
        self.tables.iter().find_map(|table| {
            table
                .binary_search_by(|t| t.id.cmp(id))
                .ok()
                .map(|i| &table[i])
        })
    }

    /// Iterates over every identifier we define
    pub fn frame_types(&self) -> impl Iterator<Item = &'static FrameType> {
        self.tables.iter().flat_map(|table| table.iter())
    }
}

/// Translates an ID3v2.2 identifier to its ID3v2.3 equivalent
///
/// ```
/// use id3_codec::frame::registry::upgrade_id;
///
/// assert_eq!(upgrade_id("TT2"), Some("TIT2"));
/// assert_eq!(upgrade_id("PIC"), Some("APIC"));
/// assert_eq!(upgrade_id("CRM"), None);
/// ```
pub fn upgrade_id(id: &str) -> Option<&'static str> {
    UPGRADES
        .binary_search_by(|(old, _)| old.cmp(&id))
        .ok()
        .map(|i| UPGRADES[i].1)
}

use FrameKind::{Data, DescribedText, Image, LanguageText, Text};

/// The ID3v2.2 frame format
pub static V22: FrameFormat = FrameFormat {
    version: Version::V22,
    header_size: 6,
    size_field: SizeField::U24,
    has_flags: false,
    tables: &[V22_TYPES],
    common: CommonFrames {
        title: "TT2",
        artist: "TP1",
        album: "TAL",
        year: "TYE",
        genre: "TCO",
        comments: "COM",
    },
};

/// The ID3v2.3 frame format
pub static V23: FrameFormat = FrameFormat {
    version: Version::V23,
    header_size: 10,
    size_field: SizeField::U32(Packing::Normal),
    has_flags: true,
    tables: &[V23_TYPES],
    common: CommonFrames {
        title: "TIT2",
        artist: "TPE1",
        album: "TALB",
        year: "TYER",
        genre: "TCON",
        comments: "COMM",
    },
};

/// The ID3v2.4 frame format
pub static V24: FrameFormat = FrameFormat {
    version: Version::V24,
    header_size: 10,
    size_field: SizeField::U32(Packing::SynchSafe),
    has_flags: true,
    tables: &[V23_TYPES, V24_TYPES],
    common: CommonFrames {
        title: "TIT2",
        artist: "TPE1",
        album: "TALB",
        year: "TDRC",
        genre: "TCON",
        comments: "COMM",
    },
};

// all tables are sorted by identifier for binary searching

static V22_TYPES: &[FrameType] = &[
    ty("BUF", "Recommended buffer size", Data),
    ty("CNT", "Play counter", Data),
    ty("COM", "Comments", LanguageText),
    ty("CRA", "Audio encryption", Data),
    ty("CRM", "Encrypted meta frame", Data),
    ty("EQU", "Equalization", Data),
    ty("ETC", "Event timing codes", Data),
    ty("GEO", "General encapsulated object", Data),
    ty("IPL", "Involved people list", Data),
    ty("LNK", "Linked information", Data),
    ty("MCI", "Music CD Identifier", Data),
    ty("MLL", "MPEG location lookup table", Data),
    // v2.2 pictures have a 3-byte image format rather than a MIME type
    ty("PIC", "Attached picture", Data),
    ty("POP", "Popularimeter", Data),
    ty("REV", "Reverb", Data),
    ty("RVA", "Relative volume adjustment", Data),
    ty("SLT", "Synchronized lyric/text", Data),
    ty("STC", "Synced tempo codes", Data),
    ty("TAL", "Album/Movie/Show title", Text),
    ty("TBP", "BPM (Beats Per Minute)", Text),
    ty("TCM", "Composer", Text),
    ty("TCO", "Content type", Text),
    ty("TCR", "Copyright message", Text),
    ty("TDA", "Date", Text),
    ty("TDY", "Playlist delay", Text),
    ty("TEN", "Encoded by", Text),
    ty("TFT", "File type", Text),
    ty("TIM", "Time", Text),
    ty("TKE", "Initial key", Text),
    ty("TLA", "Language(s)", Text),
    ty("TLE", "Length", Text),
    ty("TMT", "Media type", Text),
    ty("TOA", "Original artist(s)/performer(s)", Text),
    ty("TOF", "Original filename", Text),
    ty("TOL", "Original Lyricist(s)/text writer(s)", Text),
    ty("TOR", "Original release year", Text),
    ty("TOT", "Original album/Movie/Show title", Text),
    ty(
        "TP1",
        "Lead artist(s)/Lead performer(s)/Soloist(s)/Performing group",
        Text,
    ),
    ty("TP2", "Band/Orchestra/Accompaniment", Text),
    ty("TP3", "Conductor/Performer refinement", Text),
    ty("TP4", "Interpreted, remixed, or otherwise modified by", Text),
    ty("TPA", "Part of a set", Text),
    ty("TPB", "Publisher", Text),
    ty("TRC", "ISRC (International Standard Recording Code)", Text),
    ty("TRD", "Recording dates", Text),
    ty("TRK", "Track number/Position in set", Text),
    ty("TSI", "Size", Text),
    ty("TSS", "Software/hardware and settings used for encoding", Text),
    ty("TT1", "Content group description", Text),
    ty("TT2", "Title/Songname/Content description", Text),
    ty("TT3", "Subtitle/Description refinement", Text),
    ty("TXT", "Lyricist/text writer", Text),
    ty("TXX", "User defined text information frame", DescribedText),
    ty("TYE", "Year", Text),
    ty("UFI", "Unique file identifier", Data),
    ty("ULT", "Unsychronized lyric/text transcription", LanguageText),
    ty("WAF", "Official audio file webpage", Data),
    ty("WAR", "Official artist/performer webpage", Data),
    ty("WAS", "Official audio source webpage", Data),
    ty("WCM", "Commercial information", Data),
    ty("WCP", "Copyright/Legal information", Data),
    ty("WPB", "Publishers official webpage", Data),
    ty("WXX", "User defined URL link frame", Data),
];

static V23_TYPES: &[FrameType] = &[
    ty("AENC", "Audio encryption", Data),
    ty("APIC", "Attached picture", Image),
    ty("COMM", "Comments", LanguageText),
    ty("COMR", "Commercial frame", Data),
    ty("ENCR", "Encryption method registration", Data),
    ty("EQUA", "Equalization", Data),
    ty("ETCO", "Event timing codes", Data),
    ty("GEOB", "General encapsulated object", Data),
    ty("GRID", "Group identification registration", Data),
    ty("IPLS", "Involved people list", Data),
    ty("LINK", "Linked information", Data),
    ty("MCDI", "Music CD identifier", Data),
    ty("MLLT", "MPEG location lookup table", Data),
    ty("OWNE", "Ownership frame", Data),
    ty("PCNT", "Play counter", Data),
    ty("POPM", "Popularimeter", Data),
    ty("POSS", "Position synchronisation frame", Data),
    ty("PRIV", "Private frame", Data),
    ty("RBUF", "Recommended buffer size", Data),
    ty("RVAD", "Relative volume adjustment", Data),
    ty("RVRB", "Reverb", Data),
    ty("SYLT", "Synchronized lyric/text", Data),
    ty("SYTC", "Synchronized tempo codes", Data),
    ty("TALB", "Album/Movie/Show title", Text),
    ty("TBPM", "BPM (beats per minute)", Text),
    ty("TCOM", "Composer", Text),
    ty("TCON", "Content type", Text),
    ty("TCOP", "Copyright message", Text),
    ty("TDAT", "Date", Text),
    ty("TDLY", "Playlist delay", Text),
    ty("TENC", "Encoded by", Text),
    ty("TEXT", "Lyricist/Text writer", Text),
    ty("TFLT", "File type", Text),
    ty("TIME", "Time", Text),
    ty("TIT1", "Content group description", Text),
    ty("TIT2", "Title/songname/content description", Text),
    ty("TIT3", "Subtitle/Description refinement", Text),
    ty("TKEY", "Initial key", Text),
    ty("TLAN", "Language(s)", Text),
    ty("TLEN", "Length", Text),
    ty("TMED", "Media type", Text),
    ty("TOAL", "Original album/movie/show title", Text),
    ty("TOFN", "Original filename", Text),
    ty("TOLY", "Original lyricist(s)/text writer(s)", Text),
    ty("TOPE", "Original artist(s)/performer(s)", Text),
    ty("TORY", "Original release year", Text),
    ty("TOWN", "File owner/licensee", Text),
    ty("TPE1", "Lead performer(s)/Soloist(s)", Text),
    ty("TPE2", "Band/orchestra/accompaniment", Text),
    ty("TPE3", "Conductor/performer refinement", Text),
    ty("TPE4", "Interpreted, remixed, or otherwise modified by", Text),
    ty("TPOS", "Part of a set", Text),
    ty("TPUB", "Publisher", Text),
    ty("TRCK", "Track number/Position in set", Text),
    ty("TRDA", "Recording dates", Text),
    ty("TRSN", "Internet radio station name", Text),
    ty("TRSO", "Internet radio station owner", Text),
    ty("TSIZ", "Size", Text),
    ty("TSRC", "ISRC (international standard recording code)", Text),
    ty("TSSE", "Software/Hardware and settings used for encoding", Text),
    ty("TXXX", "User defined text information frame", DescribedText),
    ty("TYER", "Year", Text),
    ty("UFID", "Unique file identifier", Data),
    ty("USER", "Terms of use", Data),
    ty("USLT", "Unsychronized lyric/text transcription", LanguageText),
    ty("WCOM", "Commercial information", Data),
    ty("WCOP", "Copyright/Legal information", Data),
    ty("WOAF", "Official audio file webpage", Data),
    ty("WOAR", "Official artist/performer webpage", Data),
    ty("WOAS", "Official audio source webpage", Data),
    ty("WORS", "Official internet radio station homepage", Data),
    ty("WPAY", "Payment", Data),
    ty("WPUB", "Publishers official webpage", Data),
    ty("WXXX", "User defined URL link frame", Data),
];

// identifiers ID3v2.4 adds on top of ID3v2.3's
static V24_TYPES: &[FrameType] = &[
    ty("ASPI", "Audio seek point index", Data),
    ty("EQU2", "Equalisation (2)", Data),
    ty("RVA2", "Relative volume adjustment (2)", Data),
    ty("SEEK", "Seek frame", Data),
    ty("SIGN", "Signature frame", Data),
    ty("TDEN", "Encoding time", Text),
    ty("TDOR", "Original release time", Text),
    ty("TDRC", "Recording time", Text),
    ty("TDRL", "Release time", Text),
    ty("TDTG", "Tagging time", Text),
    ty("TIPL", "Involved people list", Text),
    ty("TMCL", "Musician credits list", Text),
    ty("TMOO", "Mood", Text),
    ty("TPRO", "Produced notice", Text),
    ty("TSOA", "Album sort order", Text),
    ty("TSOP", "Performer sort order", Text),
    ty("TSOT", "Title sort order", Text),
    ty("TSST", "Set subtitle", Text),
];

static UPGRADES: &[(&str, &str)] = &[
    ("BUF", "RBUF"),
    ("CNT", "PCNT"),
    ("COM", "COMM"),
    ("CRA", "AENC"),
    ("EQU", "EQUA"),
    ("ETC", "ETCO"),
    ("GEO", "GEOB"),
    ("IPL", "IPLS"),
    ("LNK", "LINK"),
    ("MCI", "MCDI"),
    ("MLL", "MLLT"),
    ("PIC", "APIC"),
    ("POP", "POPM"),
    ("REV", "RVRB"),
    ("RVA", "RVAD"),
    ("SLT", "SYLT"),
    ("STC", "SYTC"),
    ("TAL", "TALB"),
    ("TBP", "TBPM"),
    ("TCM", "TCOM"),
    ("TCO", "TCON"),
    ("TCR", "TCOP"),
    ("TDA", "TDAT"),
    ("TDY", "TDLY"),
    ("TEN", "TENC"),
    ("TFT", "TFLT"),
    ("TIM", "TIME"),
    ("TKE", "TKEY"),
    ("TLA", "TLAN"),
    ("TLE", "TLEN"),
    ("TMT", "TMED"),
    ("TOA", "TOPE"),
    ("TOF", "TOFN"),
    ("TOL", "TOLY"),
    ("TOR", "TORY"),
    ("TOT", "TOAL"),
    ("TP1", "TPE1"),
    ("TP2", "TPE2"),
    ("TP3", "TPE3"),
    ("TP4", "TPE4"),
    ("TPA", "TPOS"),
    ("TPB", "TPUB"),
    ("TRC", "TSRC"),
    ("TRD", "TRDA"),
    ("TRK", "TRCK"),
    ("TSI", "TSIZ"),
    ("TSS", "TSSE"),
    ("TT1", "TIT1"),
    ("TT2", "TIT2"),
    ("TT3", "TIT3"),
    ("TXT", "TEXT"),
    ("TXX", "TXXX"),
    ("TYE", "TYER"),
    ("UFI", "UFID"),
    ("ULT", "USLT"),
    ("WAF", "WOAF"),
    ("WAR", "WOAR"),
    ("WAS", "WOAS"),
    ("WCM", "WCOM"),
    ("WCP", "WCOP"),
    ("WPB", "WPUB"),
    ("WXX", "WXXX"),
];

#[test]
fn test_tables_sorted() {
    for table in [V22_TYPES, V23_TYPES, V24_TYPES] {
        assert!(table.windows(2).all(|w| w[0].id < w[1].id));
    }
    assert!(UPGRADES.windows(2).all(|w| w[0].0 < w[1].0));

    // ID3v2.4 additions must not shadow ID3v2.3 identifiers
    assert!(
        V24_TYPES
            .iter()
            .all(|t| V23_TYPES.binary_search_by(|u| u.id.cmp(t.id)).is_err())
    );
}

#[test]
fn test_identifier_lengths() {
    for format in [&V22, &V23, &V24] {
        assert!(format.frame_types().all(|t| t.id.len() == format.id_len()));
        assert!(format.frame_types().all(|t| t.id.is_ascii()));

        let common = format.common();
        for id in [
            common.title,
            common.artist,
            common.album,
            common.year,
            common.genre,
            common.comments,
        ] {
            assert!(format.frame_type(id).is_some(), "{id} missing");
        }
    }
}

#[test]
fn test_upgrades() {
    for (old, new) in UPGRADES {
        assert!(V22.frame_type(old).is_some(), "{old} not in ID3v2.2");
        assert!(V23.frame_type(new).is_some(), "{new} not in ID3v2.3");
    }

    // shape is preserved across an upgrade, except for PIC
    for (old, new) in UPGRADES.iter().filter(|(old, _)| *old != "PIC") {
        assert_eq!(
            V22.frame_type(old).map(|t| t.kind),
            V23.frame_type(new).map(|t| t.kind),
        );
    }
}

#[test]
fn test_versions() {
    assert_eq!(Version::try_from(3).unwrap().format().header_size(), 10);
    assert_eq!(Version::try_from(2).unwrap().format().header_size(), 6);
    assert!(matches!(
        Version::try_from(5),
        Err(Error::UnsupportedVersion(5))
    ));
    assert_eq!(Version::V24.to_string(), "ID3v2.4");
}
