//! Content-aware image resizing.
//!
//! `recarve` shrinks or enlarges raster images along one or both axes by
//! repeatedly removing or duplicating the lowest-energy seam — a
//! connected top-to-bottom path of pixels — so that visually important
//! content survives while smooth areas give way. Energy is the Sobel
//! gradient magnitude of the luminance plane, optionally pre-blurred, and
//! optionally biased so detected faces (or any caller-supplied regions)
//! are never cut.
//!
//! # Example
//!
//! ```no_run
//! use recarve::{Processor, ProcessorConfig};
//!
//! let config = ProcessorConfig {
//!     target_width: 640,
//!     target_height: 480,
//!     ..ProcessorConfig::default()
//! };
//! let source = image::open("input.jpg").unwrap().to_rgba8();
//! let resized = Processor::new(config).resize(&source).unwrap();
//! assert_eq!(resized.dimensions(), (640, 480));
//! ```
//!
//! For whole-file workflows, [`Processor::process`] decodes, carves, and
//! encodes in one call, including an animated-GIF mode that replays the
//! carve one frame per iteration.
#![warn(missing_docs)]

pub mod buffer;
pub mod carve;
pub mod codec;
pub mod config;
pub mod driver;
pub mod energy;
pub mod error;
pub mod faces;
pub mod filter;
pub mod region;
pub mod seam;
pub mod sink;

pub use codec::OutputFormat;
pub use config::ProcessorConfig;
pub use driver::{CancelToken, Processor};
pub use error::Error;
pub use region::Region;
pub use seam::Seam;
pub use sink::{ChannelSink, GifRecorder, NoopSink, ProgressFrame, ProgressSink};
