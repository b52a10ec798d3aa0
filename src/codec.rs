//! Decoding sources and encoding carved results.
//!
//! The output container is resolved once, up front, from the destination
//! file extension; the carving core itself never looks at bytes. Encoded
//! output is assembled in memory and written in one piece, so a failed
//! run never leaves a partial file behind.

use crate::buffer;
use crate::driver::Processor;
use crate::error::Error;
use crate::sink::GifRecorder;
use image::codecs::bmp::BmpEncoder;
use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, Frame, ImageEncoder, RgbaImage};
use std::io::{Cursor, Read, Write};
use std::path::Path;

/// Output container format.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// JPEG at quality 100. Also the fallback when the destination gives
    /// no extension to go on.
    Jpeg,
    /// PNG.
    Png,
    /// BMP.
    Bmp,
    /// Animated GIF replaying the carve, one frame per iteration.
    Gif,
}

impl OutputFormat {
    /// Resolves the output format from a destination path.
    ///
    /// A missing extension falls back to JPEG; anything other than
    /// jpg/jpeg/png/bmp/gif is [`Error::UnsupportedFormat`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<OutputFormat, Error> {
        let extension = path
            .as_ref()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        match extension.as_deref() {
            None | Some("") => Ok(OutputFormat::Jpeg),
            Some("jpg") | Some("jpeg") => Ok(OutputFormat::Jpeg),
            Some("png") => Ok(OutputFormat::Png),
            Some("bmp") => Ok(OutputFormat::Bmp),
            Some("gif") => Ok(OutputFormat::Gif),
            Some(other) => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Reads an encoded image to the end and decodes it into RGBA8.
pub fn decode<R: Read>(mut reader: R) -> Result<RgbaImage, Error> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let decoded = image::load_from_memory(&bytes).map_err(|e| Error::Decode(e.to_string()))?;
    Ok(buffer::to_rgba8(decoded))
}

impl Processor {
    /// Decodes `reader`, resizes to the configured targets, and encodes
    /// the result to `writer` in `format`.
    ///
    /// For [`OutputFormat::Gif`] the animation is assembled from one
    /// frame per carve iteration. Nothing is written unless the whole
    /// pipeline succeeds.
    pub fn process<R: Read, W: Write>(
        &self,
        reader: R,
        mut writer: W,
        format: OutputFormat,
    ) -> Result<(), Error> {
        let source = decode(reader)?;
        let mut encoded = Vec::new();

        match format {
            OutputFormat::Gif => {
                let recorder = GifRecorder::new();
                let result = self.resize_with(&source, Some(&recorder))?;
                let mut frames = recorder.take_frames();
                if frames.is_empty() {
                    // Nothing was carved; a single-frame animation of the
                    // result is still a valid output.
                    frames.push(result);
                }
                encode_gif(&mut encoded, frames)?;
            }
            still => {
                let result = self.resize(&source)?;
                encode_still(&mut encoded, &result, still)?;
            }
        }

        writer.write_all(&encoded)?;
        Ok(())
    }

    /// Convenience wrapper over [`Processor::process`] reading and
    /// writing files, with the format taken from the destination
    /// extension. The destination file is only created on success.
    pub fn process_path<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source: P,
        destination: Q,
    ) -> Result<(), Error> {
        let format = OutputFormat::from_path(&destination)?;
        let input = std::fs::read(source)?;
        let mut encoded = Vec::new();
        self.process(Cursor::new(input), &mut encoded, format)?;
        std::fs::write(destination, encoded)?;
        Ok(())
    }
}

fn encode_still(buffer: &mut Vec<u8>, image: &RgbaImage, format: OutputFormat) -> Result<(), Error> {
    let (width, height) = image.dimensions();
    match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            JpegEncoder::new_with_quality(buffer, 100)
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(|e| Error::Encode(e.to_string()))?;
        }
        OutputFormat::Png => {
            PngEncoder::new(buffer)
                .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| Error::Encode(e.to_string()))?;
        }
        OutputFormat::Bmp => {
            BmpEncoder::new(buffer)
                .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| Error::Encode(e.to_string()))?;
        }
        OutputFormat::Gif => {
            return Err(Error::Encode(
                "animated output goes through the frame recorder".into(),
            ));
        }
    }
    Ok(())
}

fn encode_gif(buffer: &mut Vec<u8>, frames: Vec<RgbaImage>) -> Result<(), Error> {
    let mut encoder = GifEncoder::new(&mut *buffer);
    encoder
        .set_repeat(Repeat::Infinite)
        .map_err(|e| Error::Encode(e.to_string()))?;
    for image in frames {
        encoder
            .encode_frame(Frame::new(image))
            .map_err(|e| Error::Encode(e.to_string()))?;
    }
    Ok(())
}
