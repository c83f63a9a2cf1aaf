use num_traits::AsPrimitive;

use crate::{
    geometry::{Point, Segment},
    verboser::{Message, Verboser},
    Float, Grid,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nail<S> {
    pub index: usize,
    pub position: Point<S>,
}

/// Nails evenly spaced on a circle. Nail `i` sits at angle `2πi/n`.
#[derive(Clone, Debug)]
pub struct NailRing<S> {
    nails: Vec<Nail<S>>,
    center: Point<S>,
    radius: S,
}

impl<S: Float> NailRing<S>
where
    usize: AsPrimitive<S>,
{
    pub fn circle(
        nail_count: usize,
        radius: S,
        center: Point<S>,
        verboser: &mut impl Verboser,
    ) -> Result<Self, Error> {
        if nail_count < 2 {
            return Err(Error::NailCount(nail_count));
        }
        if !(radius > S::ZERO && radius.is_finite()) {
            return Err(Error::Radius(radius.to_f64().unwrap_or(f64::NAN)));
        }
        let nails = (0..nail_count)
            .map(|index| {
                verboser.verbose(Message::CreatingNail(index));
                let theta: S = S::TWO * S::PI * index.as_() / nail_count.as_();
                Nail {
                    index,
                    position: Point {
                        x: center.x + radius * theta.cos(),
                        y: center.y + radius * theta.sin(),
                    },
                }
            })
            .collect();
        verboser.verbose(Message::CreatingNail(nail_count));
        Ok(Self {
            nails,
            center,
            radius,
        })
    }

    /// Circle centered on `frame`, `margin` pixels inside its shortest side.
    pub fn inscribed(
        frame: Grid,
        nail_count: usize,
        margin: S,
        verboser: &mut impl Verboser,
    ) -> Result<Self, Error> {
        let width: S = frame.width.as_();
        let height: S = frame.height.as_();
        Self::circle(
            nail_count,
            width.min(height) * S::HALF - margin,
            Point {
                x: width * S::HALF,
                y: height * S::HALF,
            },
            verboser,
        )
    }
}

impl<S: Float> NailRing<S> {
    pub fn nails(&self) -> &[Nail<S>] {
        &self.nails
    }

    pub fn len(&self) -> usize {
        self.nails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nails.is_empty()
    }

    pub fn center(&self) -> Point<S> {
        self.center
    }

    pub fn radius(&self) -> S {
        self.radius
    }

    pub fn position(&self, index: usize) -> Option<Point<S>> {
        self.nails.get(index).map(|nail| nail.position)
    }

    /// Chord from nail `from` to nail `to`, `None` if either index is out of range.
    pub fn segment(&self, from: usize, to: usize) -> Option<Segment<S>> {
        self.position(from)
            .and_then(|start| self.position(to).map(|end| Segment::new(start, end)))
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    #[error("At least 2 nails are required, got {0}")]
    NailCount(usize),
    #[error("The nail circle radius must be a positive number, got {0}")]
    Radius(f64),
}
