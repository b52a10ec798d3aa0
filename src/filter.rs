//! Separable Gaussian filtering over single-channel f32 planes.

/// An owned single-channel f32 raster in row-major layout.
///
/// Used for the luminance plane, the energy field, and the cumulative
/// seam table, all of which stay dimensionally aligned with the pixel
/// buffer they were derived from.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Plane {
    /// Constructs a zero-initialized plane of size `width` × `height`.
    pub fn new(width: u32, height: u32) -> Plane {
        Plane {
            width,
            height,
            data: vec![0.0; (width as usize) * (height as usize)],
        }
    }

    /// Wraps existing row-major storage.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != width * height`.
    pub fn from_raw(width: u32, height: u32, data: Vec<f32>) -> Plane {
        assert_eq!(
            data.len(),
            (width as usize) * (height as usize),
            "storage length must match dimensions"
        );
        Plane {
            width,
            height,
            data,
        }
    }

    /// Width of the plane in cells.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the plane in cells.
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }

    /// Value at (x, y).
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[self.idx(x, y)]
    }

    /// Overwrites the value at (x, y).
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        let i = self.idx(x, y);
        self.data[i] = value;
    }

    /// Row `y` as a contiguous slice.
    #[inline]
    pub fn row(&self, y: u32) -> &[f32] {
        let start = (y as usize) * (self.width as usize);
        &self.data[start..start + self.width as usize]
    }

    /// Mutable access to row `y`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [f32] {
        let width = self.width as usize;
        let start = (y as usize) * width;
        &mut self.data[start..start + width]
    }

    /// The whole plane as one row-major slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// One-dimensional Gaussian kernel with radius `ceil(2σ)`, normalized so
/// the weights sum to one. The normal-distribution prefactor cancels
/// under normalization, so only the exponential falloff is evaluated.
pub(crate) fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (2.0 * sigma).ceil() as i32;
    let falloff: Vec<f32> = (-radius..=radius)
        .map(|offset| (-(offset * offset) as f32 / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f32 = falloff.iter().sum();
    falloff.into_iter().map(|weight| weight / total).collect()
}

// Mirrors an out-of-range coordinate back into [0, len). The edge sample
// itself is not repeated: -1 maps to 1, len maps to len - 2.
#[inline]
fn reflect(i: i64, len: i64) -> usize {
    if len == 1 {
        return 0;
    }
    let mut i = i;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= len {
            i = 2 * len - 2 - i;
        } else {
            return i as usize;
        }
    }
}

/// Blurs a plane with a Gaussian of standard deviation `sigma`. Samples
/// past the edges are reflected back into the plane.
///
/// # Panics
///
/// Panics if `sigma <= 0.0`.
pub fn gaussian_blur(plane: &Plane, sigma: f32) -> Plane {
    assert!(sigma > 0.0, "sigma must be > 0.0");
    let kernel = gaussian_kernel(sigma);
    let horizontal = horizontal_filter(plane, &kernel);
    vertical_filter(&horizontal, &kernel)
}

/// Correlates every row of `plane` with a 1-D kernel, reflecting at the
/// left and right edges.
pub(crate) fn horizontal_filter(plane: &Plane, kernel: &[f32]) -> Plane {
    let (width, height) = (plane.width(), plane.height());
    let mut out = Plane::new(width, height);
    let radius = (kernel.len() / 2) as i64;

    for y in 0..height {
        let row = plane.row(y);
        let out_row = out.row_mut(y);
        for x in 0..width as i64 {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sample = row[reflect(x + k as i64 - radius, width as i64)];
                acc += sample * weight;
            }
            out_row[x as usize] = acc;
        }
    }

    out
}

/// Correlates every column of `plane` with a 1-D kernel, reflecting at
/// the top and bottom edges.
pub(crate) fn vertical_filter(plane: &Plane, kernel: &[f32]) -> Plane {
    let (width, height) = (plane.width(), plane.height());
    let mut out = Plane::new(width, height);
    let radius = (kernel.len() / 2) as i64;

    for y in 0..height as i64 {
        for (k, weight) in kernel.iter().enumerate() {
            let source = plane.row(reflect(y + k as i64 - radius, height as i64) as u32);
            let out_row = out.row_mut(y as u32);
            for (cell, sample) in out_row.iter_mut().zip(source) {
                *cell += sample * weight;
            }
        }
    }

    out
}
