use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{darkness::Orientation, delta::Scoring, Grid};

/// Nail the first chord starts from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartNail {
    Fixed(usize),
    /// Uniformly drawn nail. Seeded draws are reproducible.
    Random { seed: Option<u64> },
}

impl StartNail {
    pub fn resolve<R: Rng + ?Sized>(self, nail_count: usize, rng: &mut R) -> usize {
        match self {
            Self::Fixed(index) => index,
            Self::Random { .. } => rng.gen_range(0..nail_count),
        }
    }
}

impl Default for StartNail {
    fn default() -> Self {
        Self::Fixed(0)
    }
}

/// Every knob of a run. Defaults reproduce the classic 100 nail, 2000 line setup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of nails around the circle.
    pub nail_count: usize,
    /// Hard cap on committed lines.
    pub max_lines: usize,
    /// Intensity a single line adds to every pixel it crosses.
    pub darkening: f32,
    /// Integer ratio between the frame and the grid used for scoring.
    pub downscale: usize,
    /// Distance in frame pixels between the nail circle and the frame border.
    pub margin: f32,
    /// Enables the overlap guard with the given distance in frame pixels.
    pub overlap_threshold: Option<f32>,
    pub orientation: Orientation,
    pub start: StartNail,
    /// A line must improve the error by more than this to be committed.
    pub epsilon: f32,
    pub scoring: Scoring,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            nail_count: 100,
            max_lines: 2000,
            darkening: 1.0,
            downscale: 1,
            margin: 10.0,
            overlap_threshold: None,
            orientation: Orientation::default(),
            start: StartNail::default(),
            epsilon: 0.0,
            scoring: Scoring::default(),
        }
    }
}

impl Settings {
    /// Checks every parameter before anything is built.
    pub fn validate(&self) -> Result<(), Error> {
        if self.nail_count < 2 {
            return Err(Error::NailCount(self.nail_count));
        }
        if self.max_lines == 0 {
            return Err(Error::LineLimit);
        }
        if !(self.darkening > 0.0 && self.darkening.is_finite()) {
            return Err(Error::Darkening(self.darkening));
        }
        if self.downscale == 0 {
            return Err(Error::Downscale);
        }
        if !(self.margin >= 0.0 && self.margin.is_finite()) {
            return Err(Error::Margin(self.margin));
        }
        if let Some(threshold) = self.overlap_threshold {
            if !(threshold >= 0.0 && threshold.is_finite()) {
                return Err(Error::OverlapThreshold(threshold));
            }
        }
        if !(self.epsilon >= 0.0 && self.epsilon.is_finite()) {
            return Err(Error::Epsilon(self.epsilon));
        }
        if let StartNail::Fixed(index) = self.start {
            if index >= self.nail_count {
                return Err(Error::StartNail {
                    index,
                    nail_count: self.nail_count,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    #[error("At least 2 nails are required, got {0}")]
    NailCount(usize),
    #[error("The line limit must be greater than 0")]
    LineLimit,
    #[error("The darkening amount must be a positive number, got {0}")]
    Darkening(f32),
    #[error("The downscale factor must be at least 1")]
    Downscale,
    #[error("A downscale factor of {downscale} overflows a {}x{} field", .field.width, .field.height)]
    DownscaleOverflow { downscale: usize, field: Grid },
    #[error("The margin must be a non negative number, got {0}")]
    Margin(f32),
    #[error("The overlap threshold must be a non negative number, got {0}")]
    OverlapThreshold(f32),
    #[error("The improvement epsilon must be a non negative number, got {0}")]
    Epsilon(f32),
    #[error("Start nail {index} does not exist, there are only {nail_count} nails")]
    StartNail { index: usize, nail_count: usize },
}
