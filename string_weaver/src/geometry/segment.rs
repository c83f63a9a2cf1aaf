use std::fmt;

use bresenham::Bresenham;

use super::Point;
use crate::Float;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment<T> {
    pub start: Point<T>,
    pub end: Point<T>,
}

impl<T: fmt::Display> fmt::Display for Segment<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:2}, {:2}]", self.start, self.end)
    }
}

impl<T> Segment<T> {
    pub fn new(start: Point<T>, end: Point<T>) -> Self {
        Self { start, end }
    }
}

impl<T: Float> Segment<T> {
    pub fn floor(&self) -> Self {
        Self {
            start: self.start.floor(),
            end: self.end.floor(),
        }
    }

    pub fn sq_length(&self) -> T {
        self.start.sq_distance(&self.end)
    }

    /// Euclidean distance from `point` to the closest point of the segment.
    ///
    /// The projection of `point` onto the supporting line is clamped to the
    /// segment ends, so points beyond either end measure to that end.
    pub fn distance_to(&self, point: &Point<T>) -> T {
        let direction = self.end - self.start;
        let sq_length = direction.dot(&direction);
        if sq_length <= T::ZERO {
            return self.start.distance(point);
        }
        let t = ((*point - self.start).dot(&direction) / sq_length)
            .max(T::ZERO)
            .min(T::ONE);
        (self.start + direction * t).distance(point)
    }
}

impl<T: num_traits::NumCast> Segment<T> {
    pub fn cast<I: num_traits::NumCast>(self) -> Option<Segment<I>> {
        self.start
            .cast()
            .and_then(|start| self.end.cast().map(|end| Segment { start, end }))
    }
}

impl Segment<isize> {
    /// Pixels crossed by the segment, from `start` to `end`, both included.
    ///
    /// Yields exactly `max(|dx|, |dy|) + 1` points.
    pub fn points_between(&self) -> impl Iterator<Item = Point<isize>> {
        Bresenham::new((self.start.x, self.start.y), (self.end.x, self.end.y))
            .map(|(x, y)| Point { x, y })
            .chain(core::iter::once(self.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(x0: isize, y0: isize, x1: isize, y1: isize) -> Segment<isize> {
        Segment::new(Point::new(x0, y0), Point::new(x1, y1))
    }

    #[test]
    fn points_between_includes_both_ends() {
        for (x0, y0, x1, y1) in [
            (0, 0, 7, 3),
            (7, 3, 0, 0),
            (2, 9, 2, -4),
            (-3, 5, 6, 5),
            (4, 4, 4, 4),
            (0, 0, -5, -11),
        ] {
            let points: Vec<_> = segment(x0, y0, x1, y1).points_between().collect();
            let expected = (x1 - x0).abs().max((y1 - y0).abs()) as usize + 1;
            assert_eq!(points.len(), expected, "({x0}, {y0}) -> ({x1}, {y1})");
            assert_eq!(points.first(), Some(&Point::new(x0, y0)));
            assert_eq!(points.last(), Some(&Point::new(x1, y1)));
        }
    }

    #[test]
    fn points_between_steps_are_connected() {
        let points: Vec<_> = segment(-4, 1, 9, 14).points_between().collect();
        for pair in points.windows(2) {
            assert!((pair[1].x - pair[0].x).abs() <= 1);
            assert!((pair[1].y - pair[0].y).abs() <= 1);
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn distance_to_clamps_projection() {
        let seg = Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert_eq!(seg.distance_to(&Point::new(5.0, 3.0)), 3.0);
        assert_eq!(seg.distance_to(&Point::new(-3.0, 4.0)), 5.0);
        assert_eq!(seg.distance_to(&Point::new(13.0, -4.0)), 5.0);
        assert_eq!(seg.distance_to(&Point::new(10.0, 0.0)), 0.0);
    }

    #[test]
    fn distance_to_degenerate_segment() {
        let seg = Segment::new(Point::new(1.0f32, 1.0), Point::new(1.0, 1.0));
        assert_eq!(seg.distance_to(&Point::new(4.0, 5.0)), 5.0);
    }
}
