//! Pixel-buffer normalization and lossless quarter-turn rotation.
//!
//! The carver only ever sees non-premultiplied RGBA8 buffers with the
//! origin at (0, 0); everything a decoder may produce is funneled through
//! [`to_rgba8`] first. Vertical carving reuses the horizontal machinery by
//! rotating the buffer a quarter turn and back.

use image::{imageops, DynamicImage, RgbaImage};

/// Normalizes any decoded image to non-premultiplied RGBA8.
///
/// Buffers that are already RGBA8 pass through without copying.
pub fn to_rgba8(image: DynamicImage) -> RgbaImage {
    match image {
        DynamicImage::ImageRgba8(buffer) => buffer,
        other => other.to_rgba8(),
    }
}

/// Returns a new buffer rotated 90° clockwise, with width and height
/// swapped. The source is left untouched.
pub fn rotate90(image: &RgbaImage) -> RgbaImage {
    imageops::rotate90(image)
}

/// Returns a new buffer rotated 270° clockwise; the inverse of
/// [`rotate90`], bit for bit.
pub fn rotate270(image: &RgbaImage) -> RgbaImage {
    imageops::rotate270(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn gradient_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([x as u8, y as u8, (x * 7 + y * 13) as u8, 255])
        })
    }

    #[test]
    fn rotate90_swaps_dimensions() {
        let image = gradient_image(8, 5);
        let rotated = rotate90(&image);
        assert_eq!(rotated.dimensions(), (5, 8));
    }

    #[test]
    fn rotate90_then_rotate270_is_identity() {
        let image = gradient_image(9, 4);
        let round_trip = rotate270(&rotate90(&image));
        assert_eq!(round_trip.as_raw(), image.as_raw());
    }

    #[test]
    fn to_rgba8_preserves_rgba_buffers() {
        let image = gradient_image(6, 6);
        let normalized = to_rgba8(DynamicImage::ImageRgba8(image.clone()));
        assert_eq!(normalized.as_raw(), image.as_raw());
    }

    #[test]
    fn to_rgba8_expands_rgb_buffers() {
        let rgb = image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]));
        let normalized = to_rgba8(DynamicImage::ImageRgb8(rgb));
        assert_eq!(normalized.dimensions(), (3, 2));
        assert_eq!(normalized.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }
}
