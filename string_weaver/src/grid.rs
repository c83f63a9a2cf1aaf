use num_traits::Unsigned;
use serde::{Deserialize, Serialize};

use crate::geometry::Point;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T = usize> {
    pub height: T,
    pub width: T,
}

impl<T> Grid<T> {
    pub fn new(height: T, width: T) -> Self {
        Self { height, width }
    }
}

impl<T: Unsigned + PartialOrd + Copy> Grid<T> {
    pub fn index_of(&self, point: Point<T>) -> Option<T> {
        if point.x < self.width && point.y < self.height {
            Some(point.y * self.width + point.x)
        } else {
            None
        }
    }

    pub fn len(&self) -> T {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == T::zero() || self.height == T::zero()
    }
}

impl Grid {
    /// Index of a signed pixel coordinate, `None` when it falls outside the grid.
    pub fn index_of_signed(&self, point: Point<isize>) -> Option<usize> {
        point.cast::<usize>().and_then(|point| self.index_of(point))
    }

    /// Both sides multiplied by `factor`, `None` on overflow.
    pub fn scaled(&self, factor: usize) -> Option<Self> {
        Some(Self {
            height: self.height.checked_mul(factor)?,
            width: self.width.checked_mul(factor)?,
        })
    }
}
