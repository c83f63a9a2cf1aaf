use num_traits::AsPrimitive;

use crate::{
    geometry::{Point, Segment},
    Float, Grid,
};

/// Turns chords expressed in full resolution coordinates into the pixels they
/// cross on the (possibly downscaled) field grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rasterizer {
    downscale: usize,
}

impl Rasterizer {
    /// `downscale` is clamped to 1.
    pub fn new(downscale: usize) -> Self {
        Self {
            downscale: downscale.max(1),
        }
    }

    pub fn downscale(&self) -> usize {
        self.downscale
    }

    /// Pixels crossed by `segment` in downscaled space, both ends included.
    ///
    /// Non finite endpoints produce no pixels.
    pub fn rasterize<S: Float>(&self, segment: Segment<S>) -> impl Iterator<Item = Point<isize>>
    where
        usize: AsPrimitive<S>,
    {
        let factor: S = self.downscale.as_();
        Segment::new(segment.start / factor, segment.end / factor)
            .floor()
            .cast::<isize>()
            .into_iter()
            .flat_map(|segment| segment.points_between())
    }

    /// Same pixels as [`Self::rasterize`], mapped back to full resolution.
    pub fn rasterize_full_resolution<S: Float>(
        &self,
        segment: Segment<S>,
    ) -> impl Iterator<Item = Point<isize>>
    where
        usize: AsPrimitive<S>,
    {
        let factor = self.downscale as isize;
        self.rasterize(segment).map(move |point| Point {
            x: point.x * factor,
            y: point.y * factor,
        })
    }

    /// Grid indexes crossed by `segment`. Pixels outside `grid` are skipped.
    pub fn pixel_indexes<'a, S: Float>(
        &self,
        grid: &'a Grid,
        segment: Segment<S>,
    ) -> impl Iterator<Item = usize> + 'a
    where
        usize: AsPrimitive<S>,
    {
        self.rasterize(segment)
            .filter_map(move |point| grid.index_of_signed(point))
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rasterize_without_downscale_keeps_endpoints() {
        let segment = Segment::new(Point::new(3.7, 1.2), Point::new(12.1, 6.9));
        let points: Vec<_> = Rasterizer::new(1).rasterize::<f64>(segment).collect();
        assert_eq!(points.first(), Some(&Point::new(3, 1)));
        assert_eq!(points.last(), Some(&Point::new(12, 6)));
        assert_eq!(points.len(), 10);
    }

    #[test]
    fn rasterize_works_in_downscaled_space() {
        let segment = Segment::new(Point::new(0.0, 0.0), Point::new(40.0, 20.0));
        let rasterizer = Rasterizer::new(4);
        let points: Vec<_> = rasterizer.rasterize::<f32>(segment).collect();
        assert_eq!(points.len(), 11);
        assert_eq!(points.last(), Some(&Point::new(10, 5)));

        let full: Vec<_> = rasterizer.rasterize_full_resolution::<f32>(segment).collect();
        assert_eq!(full.len(), points.len());
        assert_eq!(full.last(), Some(&Point::new(40, 20)));
        assert!(full.iter().all(|p| p.x % 4 == 0 && p.y % 4 == 0));
    }

    #[test]
    fn pixel_indexes_skip_out_of_bounds() {
        let grid = Grid::new(5, 5);
        let segment = Segment::new(Point::new(-2.0, 2.0), Point::new(7.0, 2.0));
        let indexes: Vec<_> = Rasterizer::default()
            .pixel_indexes::<f64>(&grid, segment)
            .collect();
        assert_eq!(indexes, vec![10, 11, 12, 13, 14]);
    }

    #[test]
    fn rasterize_ignores_non_finite_segments() {
        let segment = Segment::new(Point::new(f64::NAN, 0.0), Point::new(3.0, 3.0));
        assert_eq!(Rasterizer::default().rasterize(segment).count(), 0);
    }

    #[test]
    fn zero_downscale_is_clamped() {
        assert_eq!(Rasterizer::new(0).downscale(), 1);
    }
}
