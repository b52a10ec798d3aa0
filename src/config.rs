//! Processor options and target-dimension resolution.

use crate::error::Error;

/// Options controlling a resize run.
///
/// A target of zero means "preserve the source dimension", both in pixel
/// and in percentage mode.
#[derive(Clone, Debug)]
pub struct ProcessorConfig {
    /// Desired output width in pixels, or a percentage of the source
    /// width when [`percentage`](ProcessorConfig::percentage) is set.
    pub target_width: u32,
    /// Desired output height; same interpretation as the width.
    pub target_height: u32,
    /// Interpret the targets as shrink percentages of the source
    /// dimensions. Enlargement is rejected in this mode.
    pub percentage: bool,
    /// Produce a square output whose side is the smaller of the two
    /// targets. Both targets must be non-zero.
    pub square: bool,
    /// Publish progress frames with the current seam painted red instead
    /// of the plain working buffer. The carved output is unaffected.
    pub debug: bool,
    /// Gaussian pre-blur radius for the energy operator; 0 disables.
    pub blur_radius: u32,
    /// Gradient magnitudes below this value count as zero energy.
    pub sobel_threshold: u8,
    /// Ask the attached face detector for regions to protect on every
    /// carve iteration.
    pub face_detect: bool,
    /// In-plane rotation tolerance handed to the face detector, radians.
    pub face_angle: f64,
}

impl Default for ProcessorConfig {
    fn default() -> ProcessorConfig {
        ProcessorConfig {
            target_width: 0,
            target_height: 0,
            percentage: false,
            square: false,
            debug: false,
            blur_radius: 1,
            sobel_threshold: 4,
            face_detect: false,
            face_angle: 0.0,
        }
    }
}

impl ProcessorConfig {
    /// Resolves the configured targets against a `width` × `height`
    /// source into absolute output dimensions.
    pub(crate) fn resolve_targets(&self, width: u32, height: u32) -> Result<(u32, u32), Error> {
        if self.percentage {
            let target_width = percent_of(width, self.target_width)?;
            let target_height = percent_of(height, self.target_height)?;
            return Ok((target_width, target_height));
        }

        if self.square {
            if self.target_width == 0 || self.target_height == 0 {
                return Err(Error::InvalidRequest(
                    "square output needs both a target width and a target height".into(),
                ));
            }
            let side = self.target_width.min(self.target_height);
            return Ok((side, side));
        }

        let target_width = if self.target_width > 0 {
            self.target_width
        } else {
            width
        };
        let target_height = if self.target_height > 0 {
            self.target_height
        } else {
            height
        };
        Ok((target_width, target_height))
    }
}

// Percentages above 100 would enlarge; percentage mode only shrinks.
fn percent_of(dimension: u32, percent: u32) -> Result<u32, Error> {
    match percent {
        0 => Ok(dimension),
        1..=100 => {
            let scaled = (f64::from(dimension) * f64::from(percent) / 100.0).round() as u32;
            Ok(scaled.max(1))
        }
        _ => Err(Error::InvalidRequest(
            "cannot use the percentage option for image enlargement".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn zero_targets_preserve_the_source() {
        let config = ProcessorConfig::default();
        assert_eq!(config.resolve_targets(640, 480).unwrap(), (640, 480));

        let config = ProcessorConfig {
            target_width: 320,
            ..ProcessorConfig::default()
        };
        assert_eq!(config.resolve_targets(640, 480).unwrap(), (320, 480));
    }

    #[test]
    fn percentage_shrinks_each_axis() {
        let config = ProcessorConfig {
            target_width: 50,
            target_height: 100,
            percentage: true,
            ..ProcessorConfig::default()
        };
        assert_eq!(config.resolve_targets(200, 100).unwrap(), (100, 100));
    }

    #[test]
    fn percentage_enlargement_is_rejected() {
        let config = ProcessorConfig {
            target_width: 200,
            percentage: true,
            ..ProcessorConfig::default()
        };
        assert!(matches!(
            config.resolve_targets(50, 50),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn percentage_of_a_tiny_source_stays_positive() {
        let config = ProcessorConfig {
            target_width: 1,
            target_height: 1,
            percentage: true,
            ..ProcessorConfig::default()
        };
        assert_eq!(config.resolve_targets(10, 10).unwrap(), (1, 1));
    }

    #[test]
    fn square_takes_the_smaller_side() {
        let config = ProcessorConfig {
            target_width: 60,
            target_height: 80,
            square: true,
            ..ProcessorConfig::default()
        };
        assert_eq!(config.resolve_targets(120, 80).unwrap(), (60, 60));
    }

    #[test]
    fn square_requires_both_targets() {
        let config = ProcessorConfig {
            target_width: 60,
            square: true,
            ..ProcessorConfig::default()
        };
        assert!(matches!(
            config.resolve_targets(120, 80),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn percentage_wins_over_square() {
        let config = ProcessorConfig {
            target_width: 50,
            target_height: 50,
            percentage: true,
            square: true,
            ..ProcessorConfig::default()
        };
        assert_eq!(config.resolve_targets(100, 80).unwrap(), (50, 40));
    }
}
