//! Lowest-energy seam search over an energy field.

use crate::energy::EnergyMap;

/// A connected top-to-bottom path through an image, one x-coordinate per
/// row. Seams produced by [`find_vertical_seam`] move at most one column
/// between adjacent rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Seam {
    xs: Vec<u32>,
}

impl Seam {
    pub(crate) fn from_xs(xs: Vec<u32>) -> Seam {
        Seam { xs }
    }

    /// Number of rows the seam spans.
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Whether the seam spans zero rows.
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// The x-coordinate of the seam at row `y`.
    pub fn x_at(&self, y: u32) -> u32 {
        self.xs[y as usize]
    }

    /// x-coordinates from the top row down.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.xs.iter().copied()
    }
}

/// Finds the vertical seam with the lowest accumulated energy among all
/// valid top-to-bottom paths.
///
/// Deterministic: identical energy fields produce identical seams. Every
/// tie — both in the bottom-row minimum and during the upward walk — is
/// broken toward the smaller x-coordinate.
///
/// # Panics
///
/// Panics if the field is narrower than two columns or has zero rows.
pub fn find_vertical_seam(energy: &EnergyMap) -> Seam {
    let (width, height) = (energy.width() as usize, energy.height() as usize);
    assert!(width >= 2, "cannot find a seam in a field narrower than 2");
    assert!(height >= 1, "cannot find a seam in a field with no rows");

    // Cumulative minimum-energy table: each cell holds the cheapest total
    // energy of any path from the top row to that cell.
    let mut table = vec![0.0f32; width * height];
    table[..width].copy_from_slice(energy.row(0));
    for y in 1..height {
        let row = energy.row(y as u32);
        for x in 0..width {
            let above = (y - 1) * width + x;
            let mut best = table[above];
            if x > 0 && table[above - 1] < best {
                best = table[above - 1];
            }
            if x + 1 < width && table[above + 1] < best {
                best = table[above + 1];
            }
            table[y * width + x] = row[x] + best;
        }
    }

    // Bottom-row argmin, scanned left to right so ties keep the smaller x.
    let bottom = &table[(height - 1) * width..];
    let mut x = 0;
    for (i, &total) in bottom.iter().enumerate() {
        if total < bottom[x] {
            x = i;
        }
    }

    // Walk back up, at each step taking the cheapest of the three cells
    // reachable in the row above.
    let mut xs = vec![0u32; height];
    xs[height - 1] = x as u32;
    for y in (1..height).rev() {
        let above = &table[(y - 1) * width..y * width];
        let lo = x.saturating_sub(1);
        let hi = (x + 1).min(width - 1);
        let mut best = lo;
        for candidate in lo + 1..=hi {
            if above[candidate] < above[best] {
                best = candidate;
            }
        }
        x = best;
        xs[y - 1] = x as u32;
    }

    Seam::from_xs(xs)
}
