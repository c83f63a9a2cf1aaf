use std::ops::Deref;

use crate::{
    darkness::{Darkness, Orientation},
    geometry::Point,
    pixels::{ImageIndexer, PixelData},
    Float, Grid,
};

/// Ink deposited so far by committed chords.
#[derive(Clone, Debug)]
pub struct Canvas<S> {
    data: PixelData<S>,
    baseline: S,
}

impl<S: Float> Canvas<S> {
    pub fn new(grid: Grid, baseline: S) -> Self {
        Self {
            data: PixelData::filled(baseline, grid),
            baseline,
        }
    }

    /// An untouched canvas for `orientation`.
    pub fn blank(grid: Grid, orientation: Orientation) -> Self {
        Self::new(grid, orientation.baseline())
    }

    pub fn baseline(&self) -> S {
        self.baseline
    }

    /// Current value of a cell; `None` outside the canvas.
    pub fn get(&self, index: impl ImageIndexer) -> Option<S> {
        self.data.get(index).copied()
    }

    pub fn values(&self) -> &[S] {
        self.data.pixels()
    }

    /// Applies one stroke of `darkness` to every pixel in `points`.
    ///
    /// Points outside the canvas are ignored.
    pub fn apply(
        &mut self,
        points: impl IntoIterator<Item = Point<isize>>,
        darkness: &impl Darkness<S>,
    ) {
        for point in points {
            if let Some(value) = self.data.get_mut(point) {
                *value = darkness.compute(*value);
            }
        }
    }
}

impl<S> Deref for Canvas<S> {
    type Target = Grid;

    fn deref(&self) -> &Self::Target {
        self.data.grid()
    }
}
