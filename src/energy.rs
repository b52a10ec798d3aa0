//! The per-pixel energy field driving seam selection.
//!
//! Energy approximates local visual importance: the Sobel gradient
//! magnitude of the luminance plane, optionally smoothed beforehand, with
//! small responses clamped to zero and protected regions raised to a
//! penalty no minimal path can afford to cross.

use crate::filter::{gaussian_blur, Plane};
use crate::region::Region;
use image::RgbaImage;
use rayon::prelude::*;

/// Scalar field of per-pixel importance, aligned with its source buffer.
pub type EnergyMap = Plane;

/// Energy assigned to every cell of a protected region. Gradient
/// magnitudes top out near 1.5e3, so even a path crossing a single
/// protected cell outweighs any path that stays clear.
pub const REGION_PENALTY: f32 = 1.0e9;

// ITU-R BT.601 luma weights.
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

const SOBEL_X: [f32; 9] = [-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0];
const SOBEL_Y: [f32; 9] = [-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0];

/// Tuning knobs for the energy operator.
#[derive(Copy, Clone, Debug)]
pub struct EnergyOptions {
    /// Gaussian pre-blur radius in pixels; 0 disables the blur.
    pub blur_radius: u32,
    /// Gradient magnitudes below this value are clamped to zero.
    pub sobel_threshold: u8,
}

impl Default for EnergyOptions {
    fn default() -> EnergyOptions {
        EnergyOptions {
            blur_radius: 1,
            sobel_threshold: 4,
        }
    }
}

/// Computes the energy of every pixel of `image`.
///
/// Total over any non-empty buffer: there are no failure modes. Regions
/// are clipped to the buffer bounds before the penalty is applied, so
/// detector boxes hanging past a border are fine.
pub fn energy_map(image: &RgbaImage, regions: &[Region], options: &EnergyOptions) -> EnergyMap {
    let mut luma = luminance(image);
    if options.blur_radius > 0 {
        luma = gaussian_blur(&luma, options.blur_radius as f32 / 2.0);
    }

    let mut energy = sobel_magnitude(&luma, f32::from(options.sobel_threshold));

    for region in regions {
        if let Some(clipped) = region.clip(image.width(), image.height()) {
            penalize(&mut energy, &clipped);
        }
    }

    energy
}

/// BT.601 luminance of every pixel, as an f32 plane.
fn luminance(image: &RgbaImage) -> Plane {
    let (width, height) = image.dimensions();
    let data = image
        .as_raw()
        .chunks_exact(4)
        .map(|px| LUMA_R * f32::from(px[0]) + LUMA_G * f32::from(px[1]) + LUMA_B * f32::from(px[2]))
        .collect();
    Plane::from_raw(width, height, data)
}

/// 3×3 Sobel gradient magnitude with sub-threshold responses clamped to
/// zero. Samples past the borders replicate the nearest in-range value.
/// Output rows are independent, so they are computed in parallel.
fn sobel_magnitude(luma: &Plane, threshold: f32) -> Plane {
    let (width, height) = (luma.width(), luma.height());
    let w = width as usize;
    let mut data = vec![0.0f32; w * height as usize];

    data.par_chunks_mut(w).enumerate().for_each(|(y, out_row)| {
        let y = y as u32;
        let rows = [
            luma.row(y.saturating_sub(1)),
            luma.row(y),
            luma.row((y + 1).min(height - 1)),
        ];
        for x in 0..width {
            let columns = [
                x.saturating_sub(1) as usize,
                x as usize,
                ((x + 1).min(width - 1)) as usize,
            ];
            let mut gx = 0.0;
            let mut gy = 0.0;
            for (ky, row) in rows.iter().enumerate() {
                for (kx, &column) in columns.iter().enumerate() {
                    let sample = row[column];
                    gx += sample * SOBEL_X[ky * 3 + kx];
                    gy += sample * SOBEL_Y[ky * 3 + kx];
                }
            }
            let magnitude = (gx * gx + gy * gy).sqrt();
            out_row[x as usize] = if magnitude < threshold { 0.0 } else { magnitude };
        }
    });

    Plane::from_raw(width, height, data)
}

fn penalize(energy: &mut EnergyMap, region: &Region) {
    for y in region.top()..=region.bottom() {
        let row = energy.row_mut(y as u32);
        for cell in &mut row[region.left() as usize..=region.right() as usize] {
            *cell = REGION_PENALTY;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn flat_image(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255]))
    }

    fn raw_options() -> EnergyOptions {
        EnergyOptions {
            blur_radius: 0,
            sobel_threshold: 0,
        }
    }

    #[test]
    fn constant_image_has_zero_energy() {
        let energy = energy_map(&flat_image(7, 5, 120), &[], &raw_options());
        assert_eq!(energy.width(), 7);
        assert_eq!(energy.height(), 5);
        assert!(energy.as_slice().iter().all(|&e| e == 0.0));
    }

    #[test]
    fn step_edge_concentrates_energy_at_the_boundary() {
        let image = RgbaImage::from_fn(8, 6, |x, _| {
            if x < 4 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let energy = energy_map(&image, &[], &raw_options());
        // Columns adjacent to the step respond; columns far from it do not.
        assert!(energy.get(3, 3) > 0.0);
        assert!(energy.get(4, 3) > 0.0);
        assert_eq!(energy.get(0, 3), 0.0);
        assert_eq!(energy.get(7, 3), 0.0);
    }

    #[test]
    fn threshold_clamps_weak_responses() {
        let image = RgbaImage::from_fn(8, 6, |x, _| {
            if x < 4 {
                Rgba([100, 100, 100, 255])
            } else {
                Rgba([101, 101, 101, 255])
            }
        });
        let weak = energy_map(&image, &[], &raw_options());
        assert!(weak.get(4, 3) > 0.0);

        let clamped = energy_map(
            &image,
            &[],
            &EnergyOptions {
                blur_radius: 0,
                sobel_threshold: 50,
            },
        );
        assert!(clamped.as_slice().iter().all(|&e| e == 0.0));
    }

    #[test]
    fn protected_cells_get_the_penalty() {
        let region = Region::new(2, 1, 3, 2);
        let energy = energy_map(&flat_image(8, 6, 50), &[region], &raw_options());
        for y in 0..6 {
            for x in 0..8 {
                if region.contains(x, y) {
                    assert_eq!(energy.get(x, y), REGION_PENALTY);
                } else {
                    assert_eq!(energy.get(x, y), 0.0);
                }
            }
        }
    }

    #[test]
    fn regions_hanging_past_the_border_are_clipped() {
        let region = Region::new(-2, -2, 4, 4);
        let energy = energy_map(&flat_image(6, 6, 50), &[region], &raw_options());
        assert_eq!(energy.get(0, 0), REGION_PENALTY);
        assert_eq!(energy.get(1, 1), REGION_PENALTY);
        assert_eq!(energy.get(2, 2), 0.0);
    }

    #[test]
    fn blur_changes_the_field_but_not_its_shape() {
        let image = RgbaImage::from_fn(10, 10, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let sharp = energy_map(&image, &[], &raw_options());
        let smoothed = energy_map(
            &image,
            &[],
            &EnergyOptions {
                blur_radius: 2,
                sobel_threshold: 0,
            },
        );
        assert_eq!(smoothed.width(), sharp.width());
        assert_eq!(smoothed.height(), sharp.height());
        assert_ne!(smoothed.as_slice(), sharp.as_slice());
    }
}
