//! The carving driver: pre-scale, rotation, and the interleaved
//! horizontal/vertical passes.
//!
//! Horizontal and vertical work share one code path: vertical carving
//! rotates the working buffer a quarter turn so its seams become vertical
//! seams, and rotates back when the other axis (or the caller) needs the
//! upright image. When both axes change, the driver removes one seam at a
//! time from whichever axis has the larger remaining delta, so seams on
//! the two axes adapt to the co-evolving image instead of being carved in
//! two independent campaigns.

use crate::buffer;
use crate::carve::{draw_seam, insert_seam, remove_seam};
use crate::config::ProcessorConfig;
use crate::energy::{energy_map, EnergyOptions};
use crate::error::Error;
use crate::faces::FaceDetector;
use crate::region::Region;
use crate::seam::{find_vertical_seam, Seam};
use crate::sink::{ProgressFrame, ProgressSink};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Color of carved seams on debug progress frames.
const SEAM_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Cooperative cancellation flag, checked at carve-iteration boundaries.
///
/// Clones share the same flag, so one token can be handed to another
/// thread while the original drives the resize.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that has not been cancelled.
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    /// Requests cancellation. The driver aborts with [`Error::Cancelled`]
    /// at the next iteration boundary.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Axis a carving pass operates on, in upright coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// One step of the resize state machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Step {
    ShrinkH,
    EnlargeH,
    ShrinkV,
    EnlargeV,
    Done,
}

/// Working buffer plus the bookkeeping that has to move with it.
struct WorkingState {
    buffer: RgbaImage,
    /// Whether the buffer is currently rotated 90° for vertical carving.
    rotated: bool,
    /// Caller-supplied protected regions, kept in the buffer's current
    /// orientation and shifted as seams come and go.
    regions: Vec<Region>,
    iteration: usize,
}

impl WorkingState {
    /// Dimensions in upright coordinates, regardless of orientation.
    fn logical_dimensions(&self) -> (u32, u32) {
        if self.rotated {
            (self.buffer.height(), self.buffer.width())
        } else {
            self.buffer.dimensions()
        }
    }
}

/// Content-aware resizer.
///
/// Owns the configuration and the collaborators a run needs: progress
/// sinks, an optional face detector, caller-supplied protected regions,
/// and a cancellation token.
///
/// ```no_run
/// use recarve::{Processor, ProcessorConfig};
///
/// let config = ProcessorConfig {
///     target_width: 640,
///     ..ProcessorConfig::default()
/// };
/// let source = image::open("input.jpg").unwrap().to_rgba8();
/// let resized = Processor::new(config).resize(&source).unwrap();
/// assert_eq!(resized.width(), 640);
/// ```
pub struct Processor {
    config: ProcessorConfig,
    sinks: Vec<Box<dyn ProgressSink>>,
    detector: Option<Box<dyn FaceDetector>>,
    protected: Vec<Region>,
    cancel: CancelToken,
}

impl Processor {
    /// Creates a processor for the given configuration.
    pub fn new(config: ProcessorConfig) -> Processor {
        Processor {
            config,
            sinks: Vec::new(),
            detector: None,
            protected: Vec::new(),
            cancel: CancelToken::new(),
        }
    }

    /// The configuration this processor runs with.
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Attaches a progress sink. Every sink receives every published
    /// frame, in iteration order.
    pub fn progress_sink(mut self, sink: Box<dyn ProgressSink>) -> Processor {
        self.sinks.push(sink);
        self
    }

    /// Attaches the face detector consulted when
    /// [`face_detect`](ProcessorConfig::face_detect) is set.
    pub fn face_detector(mut self, detector: Box<dyn FaceDetector>) -> Processor {
        self.detector = Some(detector);
        self
    }

    /// Adds regions that no seam may cross, in source-image coordinates.
    pub fn protect<I: IntoIterator<Item = Region>>(mut self, regions: I) -> Processor {
        self.protected.extend(regions);
        self
    }

    /// A token that cancels this processor's runs when triggered.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Resizes `image` to the configured target dimensions.
    ///
    /// The source is never mutated; each carve iteration produces a fresh
    /// buffer. On success the output dimensions equal the resolved
    /// targets exactly.
    pub fn resize(&self, image: &RgbaImage) -> Result<RgbaImage, Error> {
        self.resize_with(image, None)
    }

    /// Like [`Processor::resize`], with an extra sink the codec layer uses
    /// to record animation frames.
    pub(crate) fn resize_with(
        &self,
        image: &RgbaImage,
        recorder: Option<&dyn ProgressSink>,
    ) -> Result<RgbaImage, Error> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::Carve("source image is empty".into()));
        }
        if self.config.face_detect && self.detector.is_none() {
            return Err(Error::InvalidRequest(
                "face detection is enabled but no detector is attached".into(),
            ));
        }

        let (target_width, target_height) = self.config.resolve_targets(width, height)?;
        info!("resizing {width}x{height} to {target_width}x{target_height}");

        let prescaled = self.prescale(image, target_width, target_height);
        let mut regions = self.protected.clone();
        if prescaled.width() != width {
            let factor = f64::from(prescaled.width()) / f64::from(width);
            regions = regions.iter().map(|r| r.scaled(factor)).collect();
        }

        let mut state = WorkingState {
            buffer: prescaled,
            rotated: false,
            regions,
            iteration: 0,
        };

        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            match next_step(state.logical_dimensions(), (target_width, target_height)) {
                Step::Done => break,
                Step::ShrinkH => {
                    self.orient(&mut state, Axis::Horizontal);
                    self.carve_one(&mut state, recorder)?;
                }
                Step::ShrinkV => {
                    self.orient(&mut state, Axis::Vertical);
                    self.carve_one(&mut state, recorder)?;
                }
                Step::EnlargeH => {
                    self.orient(&mut state, Axis::Horizontal);
                    let missing = target_width - state.buffer.width();
                    self.enlarge(&mut state, missing, recorder)?;
                }
                Step::EnlargeV => {
                    self.orient(&mut state, Axis::Vertical);
                    let missing = target_height - state.buffer.width();
                    self.enlarge(&mut state, missing, recorder)?;
                }
            }
        }

        self.orient(&mut state, Axis::Horizontal);
        Ok(state.buffer)
    }

    /// Proportional Lanczos-3 downscale applied before carving when both
    /// axes shrink. Scaling by the smaller of the two shrink factors
    /// makes one axis land exactly on its target and leaves the other a
    /// small residual for the carver, instead of carving thousands of
    /// seams that plain resampling handles just as well.
    fn prescale(&self, image: &RgbaImage, target_width: u32, target_height: u32) -> RgbaImage {
        let (width, height) = image.dimensions();
        let both_change = target_width != width && target_height != height;
        let both_shrink = target_width < width && target_height < height;
        if !both_change || !both_shrink {
            return image.clone();
        }

        let factor = (f64::from(width) / f64::from(target_width))
            .min(f64::from(height) / f64::from(target_height));
        let scaled_width = ((f64::from(width) / factor).round() as u32).max(target_width);
        let scaled_height = ((f64::from(height) / factor).round() as u32).max(target_height);
        if (scaled_width, scaled_height) == (width, height) {
            return image.clone();
        }

        debug!("pre-scaling to {scaled_width}x{scaled_height} before carving");
        imageops::resize(image, scaled_width, scaled_height, FilterType::Lanczos3)
    }

    /// Rotates the working buffer (and its regions) so that carving along
    /// `axis` is a vertical-seam operation. No-op when already oriented.
    fn orient(&self, state: &mut WorkingState, axis: Axis) {
        let want_rotated = axis == Axis::Vertical;
        if state.rotated == want_rotated {
            return;
        }
        if want_rotated {
            let source_height = state.buffer.height();
            state.buffer = buffer::rotate90(&state.buffer);
            state.regions = state
                .regions
                .iter()
                .map(|r| r.rotate90(source_height))
                .collect();
        } else {
            let source_width = state.buffer.width();
            state.buffer = buffer::rotate270(&state.buffer);
            state.regions = state
                .regions
                .iter()
                .map(|r| r.rotate270(source_width))
                .collect();
        }
        state.rotated = want_rotated;
    }

    /// One carve iteration: energy, lowest seam, removal, publication.
    fn carve_one(
        &self,
        state: &mut WorkingState,
        recorder: Option<&dyn ProgressSink>,
    ) -> Result<(), Error> {
        let (width, height) = state.buffer.dimensions();
        if width < 3 {
            return Err(Error::Carve(format!(
                "cannot carve a buffer this narrow ({width}x{height})"
            )));
        }

        let regions = self.active_regions(&state.buffer, &state.regions);
        let energy = energy_map(&state.buffer, &regions, &self.energy_options());
        let seam = find_vertical_seam(&energy);

        let carved = remove_seam(&state.buffer, &seam);
        if self.observed(recorder) {
            let frame = if self.config.debug {
                draw_seam(&state.buffer, &seam, SEAM_COLOR)
            } else {
                carved.clone()
            };
            self.publish(state.rotated, state.iteration, frame, recorder);
        }

        state.regions = state
            .regions
            .iter()
            .map(|r| r.shift_for_removal(&seam))
            .collect();
        state.buffer = carved;
        state.iteration += 1;
        Ok(())
    }

    /// Grows the oriented buffer by `missing` columns in one batch.
    ///
    /// All seams are planned against the current buffer before anything
    /// is inserted — finding and inserting one at a time would rediscover
    /// the same low-energy path over and over and pile every duplicate
    /// onto it. The plan is carried in pre-insertion coordinates, so each
    /// seam's x-coordinates are bumped by one for every column already
    /// inserted to its left in that row.
    fn enlarge(
        &self,
        state: &mut WorkingState,
        missing: u32,
        recorder: Option<&dyn ProgressSink>,
    ) -> Result<(), Error> {
        let seams = self.plan_insertions(state, missing)?;
        let height = state.buffer.height();
        let mut inserted: Vec<Vec<u32>> = vec![Vec::new(); height as usize];

        for seam in seams {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let adjusted = Seam::from_xs(
                (0..height)
                    .map(|y| {
                        let x = seam.x_at(y);
                        let offset = inserted[y as usize].iter().filter(|&&c| c < x).count();
                        x + offset as u32
                    })
                    .collect(),
            );
            for y in 0..height {
                inserted[y as usize].push(seam.x_at(y));
            }

            let grown = insert_seam(&state.buffer, &adjusted);
            if self.observed(recorder) {
                let frame = if self.config.debug {
                    draw_seam(&grown, &adjusted, SEAM_COLOR)
                } else {
                    grown.clone()
                };
                self.publish(state.rotated, state.iteration, frame, recorder);
            }

            state.regions = state
                .regions
                .iter()
                .map(|r| r.shift_for_insertion(&adjusted))
                .collect();
            state.buffer = grown;
            state.iteration += 1;
        }
        Ok(())
    }

    /// Finds the `count` lowest-energy seams of the current buffer, in
    /// its own coordinates, by peeling them off a scratch copy so no seam
    /// is selected twice.
    fn plan_insertions(&self, state: &WorkingState, count: u32) -> Result<Vec<Seam>, Error> {
        let (width, height) = state.buffer.dimensions();
        if width < 3 || count > width - 2 {
            return Err(Error::Carve(format!(
                "cannot plan {count} insertions in a {width}-column buffer"
            )));
        }
        debug!("planning {count} insertion seams");

        // Original column index of every surviving scratch column, per row.
        let mut columns: Vec<Vec<u32>> = (0..height).map(|_| (0..width).collect()).collect();
        let mut scratch = state.buffer.clone();
        let mut tracked = state.regions.clone();
        let mut seams = Vec::with_capacity(count as usize);

        for _ in 0..count {
            let regions = self.active_regions(&scratch, &tracked);
            let energy = energy_map(&scratch, &regions, &self.energy_options());
            let seam = find_vertical_seam(&energy);

            let original = Seam::from_xs(
                (0..height)
                    .map(|y| columns[y as usize][seam.x_at(y) as usize])
                    .collect(),
            );
            for y in 0..height {
                columns[y as usize].remove(seam.x_at(y) as usize);
            }

            tracked = tracked.iter().map(|r| r.shift_for_removal(&seam)).collect();
            scratch = remove_seam(&scratch, &seam);
            seams.push(original);
        }

        Ok(seams)
    }

    /// Regions in effect for the current buffer: the tracked caller
    /// regions plus, when enabled, fresh detector results.
    fn active_regions(&self, buffer: &RgbaImage, tracked: &[Region]) -> Vec<Region> {
        let mut regions = tracked.to_vec();
        if self.config.face_detect {
            if let Some(detector) = &self.detector {
                let gray = imageops::grayscale(buffer);
                regions.extend(detector.detect(
                    gray.as_raw(),
                    buffer.width(),
                    buffer.height(),
                    self.config.face_angle,
                ));
            }
        }
        regions
    }

    /// Whether anyone is listening for progress frames.
    fn observed(&self, recorder: Option<&dyn ProgressSink>) -> bool {
        !self.sinks.is_empty() || recorder.is_some()
    }

    /// Hands one frame to every attached sink, upright. Never blocks.
    fn publish(
        &self,
        rotated: bool,
        iteration: usize,
        image: RgbaImage,
        recorder: Option<&dyn ProgressSink>,
    ) {
        let upright = if rotated {
            buffer::rotate270(&image)
        } else {
            image
        };
        let frame = ProgressFrame {
            image: upright,
            iteration,
        };
        for sink in &self.sinks {
            sink.deliver(frame.clone());
        }
        if let Some(recorder) = recorder {
            recorder.deliver(frame);
        }
    }

    fn energy_options(&self) -> EnergyOptions {
        EnergyOptions {
            blur_radius: self.config.blur_radius,
            sobel_threshold: self.config.sobel_threshold,
        }
    }
}

/// Picks the next pass: the axis with the larger remaining delta, ties
/// going to the horizontal one. `Done` once both deltas are zero.
fn next_step(current: (u32, u32), target: (u32, u32)) -> Step {
    let delta_w = i64::from(target.0) - i64::from(current.0);
    let delta_h = i64::from(target.1) - i64::from(current.1);

    if delta_w == 0 && delta_h == 0 {
        Step::Done
    } else if delta_w != 0 && delta_w.abs() >= delta_h.abs() {
        if delta_w < 0 {
            Step::ShrinkH
        } else {
            Step::EnlargeH
        }
    } else if delta_h < 0 {
        Step::ShrinkV
    } else {
        Step::EnlargeV
    }
}
