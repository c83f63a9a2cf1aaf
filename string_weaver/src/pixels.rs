use std::ops::Deref;

use crate::{geometry::Point, Grid};

/// Row major storage of one value per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelData<T> {
    pixels: Vec<T>,
    grid: Grid,
}

impl<T> PixelData<T> {
    pub fn new(mut builder: impl FnMut(Point<usize>) -> T, grid: Grid) -> Self {
        let mut pixels = Vec::with_capacity(grid.len());
        for y in 0..grid.height {
            for x in 0..grid.width {
                pixels.push(builder(Point { x, y }));
            }
        }
        Self { pixels, grid }
    }

    pub fn filled(value: T, grid: Grid) -> Self
    where
        T: Clone,
    {
        Self {
            pixels: vec![value; grid.len()],
            grid,
        }
    }

    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    pub fn get(&self, index: impl ImageIndexer) -> Option<&T> {
        index.get(self)
    }

    pub fn get_mut(&mut self, index: impl ImageIndexer) -> Option<&mut T> {
        index.get_mut(self)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }
}

impl<T> Deref for PixelData<T> {
    type Target = Grid;

    fn deref(&self) -> &Self::Target {
        &self.grid
    }
}

pub trait ImageIndexer {
    fn get_mut<T>(self, image: &mut PixelData<T>) -> Option<&mut T>;

    fn get<T>(self, image: &PixelData<T>) -> Option<&T>;
}

impl ImageIndexer for usize {
    fn get_mut<T>(self, image: &mut PixelData<T>) -> Option<&mut T> {
        image.pixels.get_mut(self)
    }

    fn get<T>(self, image: &PixelData<T>) -> Option<&T> {
        image.pixels.get(self)
    }
}

impl ImageIndexer for Point<usize> {
    fn get_mut<T>(self, image: &mut PixelData<T>) -> Option<&mut T> {
        image
            .grid
            .index_of(self)
            .and_then(|index| image.pixels.get_mut(index))
    }

    fn get<T>(self, image: &PixelData<T>) -> Option<&T> {
        image
            .grid
            .index_of(self)
            .and_then(|index| image.pixels.get(index))
    }
}

impl ImageIndexer for Point<isize> {
    fn get_mut<T>(self, image: &mut PixelData<T>) -> Option<&mut T> {
        image
            .grid
            .index_of_signed(self)
            .and_then(|index| image.pixels.get_mut(index))
    }

    fn get<T>(self, image: &PixelData<T>) -> Option<&T> {
        image
            .grid
            .index_of_signed(self)
            .and_then(|index| image.pixels.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_row_major() {
        let data = PixelData::new(|p| p.y * 10 + p.x, Grid::new(2, 3));
        assert_eq!(data.pixels(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(data.get(Point::new(2usize, 1)), Some(&12));
        assert_eq!(data.get(Point::new(3usize, 1)), None);
        assert_eq!(data.get(Point::new(-1isize, 0)), None);
        assert_eq!(data.get(4usize), Some(&11));
    }
}
