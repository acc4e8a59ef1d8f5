use id3_codec::{
    Error,
    frame::{Frame, ImageFrame},
    tag::Tag,
};
use std::path::Path;

/// Displays the ID3v2 tag of each given file
///
/// Set `RUST_LOG=debug` to also follow along
/// as each frame is read.

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    for path in std::env::args_os().skip(1) {
        if let Err(err) = display_tag(&path) {
            eprintln!("* {}: {err}", path.display());
        }
    }
}

fn display_tag<P: AsRef<Path>>(path: P) -> Result<(), Error> {
    let tag = Tag::read(std::io::BufReader::new(std::fs::File::open(
        path.as_ref(),
    )?))?;

    println!("{}:", path.as_ref().display());
    println!("  version: {}", tag.version());
    println!("  size: {} bytes", tag.size());
    println!("  padding: {} bytes", tag.padding());

    for (num, frame) in tag.frames().iter().enumerate() {
        println!("frame #{num}");
        println!("  id: {} ({})", frame.id(), frame.description());
        println!("  size: {} bytes", frame.size());

        match frame {
            Frame::Data(f) => println!("  data: {} bytes", f.data().len()),
            Frame::Text(f) => {
                println!("  encoding: {}", f.encoding());
                println!("  text: {}", f.text());
            }
            Frame::DescribedText(f) => {
                println!("  encoding: {}", f.encoding());
                println!("  description: {}", f.description());
                println!("  text: {}", f.text());
            }
            Frame::LanguageText(f) => {
                println!("  encoding: {}", f.encoding());
                println!("  language: {}", String::from_utf8_lossy(f.language()));
                println!("  description: {}", f.description());
                println!("  text: {}", f.text());
            }
            Frame::Image(f) => display_image(f),
        }
    }

    Ok(())
}

fn display_image(image: &ImageFrame) {
    println!("  MIME type: {}", image.mime_type());
    println!("  picture type: {}", image.picture_type());
    println!("  description: {}", image.description());
    println!("  data: {} bytes", image.data().len());
}
