//! Seam removal and insertion on RGBA buffers.

use crate::seam::Seam;
use image::{Rgba, RgbaImage};

const BYTES_PER_PIXEL: usize = 4;

/// Returns a copy of `image` one column narrower, with the pixel on
/// `seam` removed from every row and the tail of the row shifted left.
///
/// # Panics
///
/// Panics if the seam length differs from the image height or the image
/// is too narrow to lose a column.
pub fn remove_seam(image: &RgbaImage, seam: &Seam) -> RgbaImage {
    let (width, height) = image.dimensions();
    assert_eq!(seam.len(), height as usize, "seam must span every row");
    assert!(width >= 2, "cannot remove a column from a 1-wide image");

    let src = image.as_raw();
    let row_len = width as usize * BYTES_PER_PIXEL;
    let mut out = Vec::with_capacity((width as usize - 1) * height as usize * BYTES_PER_PIXEL);

    for y in 0..height {
        let row = &src[y as usize * row_len..(y as usize + 1) * row_len];
        let cut = seam.x_at(y) as usize * BYTES_PER_PIXEL;
        out.extend_from_slice(&row[..cut]);
        out.extend_from_slice(&row[cut + BYTES_PER_PIXEL..]);
    }

    RgbaImage::from_raw(width - 1, height, out).expect("output length matches dimensions")
}

/// Returns a copy of `image` one column wider. In every row the pixel on
/// `seam` is replaced by two pixels averaging it with its left and right
/// neighbors, so the duplicated path blends into its surroundings.
/// At the borders the missing neighbor is the seam pixel itself.
///
/// # Panics
///
/// Panics if the seam length differs from the image height.
pub fn insert_seam(image: &RgbaImage, seam: &Seam) -> RgbaImage {
    let (width, height) = image.dimensions();
    assert_eq!(seam.len(), height as usize, "seam must span every row");

    let src = image.as_raw();
    let row_len = width as usize * BYTES_PER_PIXEL;
    let mut out = Vec::with_capacity((width as usize + 1) * height as usize * BYTES_PER_PIXEL);

    for y in 0..height {
        let row = &src[y as usize * row_len..(y as usize + 1) * row_len];
        let x = seam.x_at(y).min(width - 1) as usize;
        let cut = x * BYTES_PER_PIXEL;

        let current = &row[cut..cut + BYTES_PER_PIXEL];
        let left = if x > 0 {
            &row[cut - BYTES_PER_PIXEL..cut]
        } else {
            current
        };
        let right = if x + 1 < width as usize {
            &row[cut + BYTES_PER_PIXEL..cut + 2 * BYTES_PER_PIXEL]
        } else {
            current
        };

        out.extend_from_slice(&row[..cut]);
        out.extend_from_slice(&average(left, current));
        out.extend_from_slice(&average(current, right));
        out.extend_from_slice(&row[cut + BYTES_PER_PIXEL..]);
    }

    RgbaImage::from_raw(width + 1, height, out).expect("output length matches dimensions")
}

#[inline]
fn average(a: &[u8], b: &[u8]) -> [u8; BYTES_PER_PIXEL] {
    let mut mixed = [0u8; BYTES_PER_PIXEL];
    for (channel, (&a, &b)) in mixed.iter_mut().zip(a.iter().zip(b)) {
        *channel = ((u16::from(a) + u16::from(b)) / 2) as u8;
    }
    mixed
}

/// Paints `seam` on a copy of `image`. The carved output never contains
/// this overlay; it exists for progress frames and debugging only.
pub fn draw_seam(image: &RgbaImage, seam: &Seam, color: Rgba<u8>) -> RgbaImage {
    let mut out = image.clone();
    for (y, x) in seam.iter().enumerate() {
        out.put_pixel(x, y as u32, color);
    }
    out
}
