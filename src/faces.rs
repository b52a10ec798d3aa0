//! Protected-region providers.
//!
//! The carver itself only understands [`Region`]s; where they come from is
//! pluggable. The built-in backend wraps the SeetaFace cascade from the
//! `rustface` crate and is compiled in by default via the `rustface`
//! feature.

use crate::region::Region;

/// Finds faces so the carver can fence them off from seam removal.
///
/// `angle` is the in-plane rotation tolerance in radians the caller is
/// willing to accept. Backends that only scan upright windows may not be
/// able to honor it.
pub trait FaceDetector: Send + Sync {
    /// Detects faces in a row-major grayscale buffer of
    /// `width` × `height` bytes.
    fn detect(&self, gray: &[u8], width: u32, height: u32, angle: f64) -> Vec<Region>;
}

#[cfg(feature = "rustface")]
pub use self::seeta::SeetaDetector;

#[cfg(feature = "rustface")]
mod seeta {
    use super::FaceDetector;
    use crate::error::Error;
    use crate::region::Region;

    /// Face detector backed by the `rustface` crate (SeetaFace engine).
    ///
    /// The serialized cascade is supplied by the caller; embedding it in
    /// the binary with `include_bytes!` is the front end's choice, not
    /// this crate's.
    pub struct SeetaDetector {
        model: rustface::Model,
    }

    impl SeetaDetector {
        /// Loads a SeetaFace cascade from its serialized bytes.
        pub fn from_model_bytes(bytes: &[u8]) -> Result<SeetaDetector, Error> {
            let model = rustface::read_model(std::io::Cursor::new(bytes))
                .map_err(|e| Error::InvalidRequest(format!("unreadable cascade model: {e}")))?;
            Ok(SeetaDetector { model })
        }
    }

    impl FaceDetector for SeetaDetector {
        // The SeetaFace cascade scans upright frontal windows only, so the
        // rotation tolerance has no effect on this backend.
        fn detect(&self, gray: &[u8], width: u32, height: u32, _angle: f64) -> Vec<Region> {
            let mut detector = rustface::create_detector_with_model(self.model.clone());
            detector.set_min_face_size(20);
            detector.set_score_thresh(2.0);
            detector.set_pyramid_scale_factor(0.8);
            detector.set_slide_window_step(4, 4);

            let faces = detector.detect(&rustface::ImageData::new(gray, width, height));

            faces
                .iter()
                .map(|face| {
                    let bbox = face.bbox();
                    Region::new(
                        i64::from(bbox.x()),
                        i64::from(bbox.y()),
                        bbox.width().max(1),
                        bbox.height().max(1),
                    )
                })
                .collect()
        }
    }
}
