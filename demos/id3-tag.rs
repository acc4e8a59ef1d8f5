use id3_codec::{
    Error,
    file::{Save, update_file},
    frame::{Frame, TextFrame, registry::FrameKind},
    tag::{Tag, Version},
    text::Encoding,
};

/// Sets text frames in a file's ID3v2 tag
///
/// Though without a full argument parser,
/// it operates on only a single file at time.
/// When no frames are indicated, it simply
/// displays the file's existing text frames.

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match std::env::args().skip(1).collect::<Vec<_>>().as_slice() {
        [path] => match std::fs::File::open(path).map_err(Error::Io).and_then(Tag::read) {
            Ok(tag) => {
                for frame in tag.frames() {
                    if let Some(text) = frame.text() {
                        println!("{}={text}", frame.id());
                    }
                }
            }
            Err(err) => eprintln!("* Error: {err}"),
        },
        [frames @ .., path] if frames.iter().all(|f| f.contains('=')) => {
            match update_file(path, |tag| {
                for frame in frames {
                    if let Some((id, text)) = frame.split_once('=') {
                        set_text(tag, id, text)?;
                    }
                }
                Ok::<_, Error>(Save::Commit)
            }) {
                Ok(()) => println!("* {path}: Updated"),
                Err(err) => println!("* Error: {path} - {err}"),
            }
        }
        _ => eprintln!("* Usage: \"TIT2=Track Title\" \"TALB=Album Title\" <file.mp3>"),
    }
}

fn set_text(tag: &mut Tag, id: &str, text: &str) -> Result<(), Error> {
    let frame_type = tag
        .frame_type(id)
        .filter(|t| t.kind == FrameKind::Text)
        .ok_or_else(|| Error::UnsupportedFrame(id.to_owned()))?;

    if let Some(Frame::Text(frame)) = tag.frame_mut(id) {
        return frame.set_text(text);
    }

    // Latin-1 where possible, otherwise the widest
    // Unicode encoding the tag's version supports
    let encoding = match text.chars().all(|c| u32::from(c) <= 0xFF) {
        true => Encoding::Latin1,
        false if tag.version() == Version::V24 => Encoding::Utf8,
        false => Encoding::Utf16,
    };

    tag.add_frame(TextFrame::new(frame_type, encoding, text)?)
}
