use serde::{Deserialize, Serialize};

use crate::Float;

/// How intensities are laid out in the target field and the residual canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Values are brightness: black is 0, white is 255. Ink lowers values.
    #[default]
    Brightness,
    /// Values are inverted brightness: black is 255, white is 0. Ink raises values.
    Inverted,
}

impl Orientation {
    /// Canvas value meaning "no ink yet".
    pub fn baseline<S: Float>(self) -> S {
        match self {
            Self::Brightness => S::TWO_FIVE_FIVE,
            Self::Inverted => S::ZERO,
        }
    }

    /// Converts a brightness in `[0, 255]` into this orientation.
    ///
    /// The conversion is its own inverse.
    pub fn from_brightness<S: Float>(self, brightness: S) -> S {
        match self {
            Self::Brightness => brightness,
            Self::Inverted => S::TWO_FIVE_FIVE - brightness,
        }
    }

    /// How dark `value` is, from 0 (white) to 1 (black).
    pub fn darkness_ratio<S: Float>(self, value: S) -> S {
        match self {
            Self::Brightness => S::ONE - value / S::TWO_FIVE_FIVE,
            Self::Inverted => value / S::TWO_FIVE_FIVE,
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Brightness => write!(f, "Brightness"),
            Self::Inverted => write!(f, "Inverted"),
        }
    }
}

pub trait Darkness<S>: Copy + Send + Sync {
    /// Value of a pixel after one more stroke crosses it.
    fn compute(&self, value: S) -> S;
}

/// Every stroke moves a pixel a fixed amount towards black, saturating at the
/// end of the `[0, 255]` range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatDarkness<S> {
    amount: S,
    orientation: Orientation,
}

impl<S> FlatDarkness<S> {
    pub fn new(amount: S, orientation: Orientation) -> Self {
        Self {
            amount,
            orientation,
        }
    }
}

impl<S: Float> Darkness<S> for FlatDarkness<S> {
    fn compute(&self, value: S) -> S {
        match self.orientation {
            Orientation::Brightness => (value - self.amount).max(S::ZERO),
            Orientation::Inverted => (value + self.amount).min(S::TWO_FIVE_FIVE),
        }
    }
}
