use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};

use crate::{
    canvas::Canvas, darkness::Darkness, field::TargetField, geometry::Segment, raster::Rasterizer,
    Float,
};

/// Optional adjustments of the raw delta.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Scoring {
    /// Divide the delta by the number of pixels crossed, so long and short
    /// chords compete on equal terms.
    pub normalize: bool,
    /// Scale each pixel by how dark its target is.
    pub weighted: bool,
}

/// Scores candidate chords against a snapshot of the canvas.
///
/// The evaluator only reads the field and the canvas, so a single instance can
/// be shared by every worker scanning candidates.
#[derive(Clone, Copy)]
pub struct DeltaEvaluator<'a, S, D> {
    field: &'a TargetField<S>,
    canvas: &'a Canvas<S>,
    darkness: D,
    scoring: Scoring,
    rasterizer: Rasterizer,
}

impl<'a, S: Float, D: Darkness<S>> DeltaEvaluator<'a, S, D>
where
    usize: AsPrimitive<S>,
{
    pub fn new(
        field: &'a TargetField<S>,
        canvas: &'a Canvas<S>,
        darkness: D,
        scoring: Scoring,
        rasterizer: Rasterizer,
    ) -> Self {
        Self {
            field,
            canvas,
            darkness,
            scoring,
            rasterizer,
        }
    }

    /// Squared error change if one more stroke were drawn along `chord`.
    ///
    /// Pixels that would move away from their target contribute zero, so the
    /// result is never positive; more negative is better. Pixels outside the
    /// field are skipped.
    pub fn score(&self, chord: Segment<S>) -> S {
        let mut delta = S::ZERO;
        let mut count = 0usize;
        for index in self.rasterizer.pixel_indexes(self.field, chord) {
            let (Some(original), Some(current)) = (self.field.get(index), self.canvas.get(index))
            else {
                continue;
            };
            count += 1;
            let hypothetical = self.darkness.compute(current);
            let before = original - current;
            let after = original - hypothetical;
            let mut improvement = (after * after - before * before).min(S::ZERO);
            if self.scoring.weighted {
                improvement *= self.field.orientation().darkness_ratio(original);
            }
            delta += improvement;
        }
        if self.scoring.normalize && count > 0 {
            delta / count.as_()
        } else {
            delta
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        darkness::{FlatDarkness, Orientation},
        geometry::Point,
        Grid,
    };

    fn horizontal(y: f64, x0: f64, x1: f64) -> Segment<f64> {
        Segment::new(Point::new(x0, y), Point::new(x1, y))
    }

    #[test]
    fn score_of_dark_target_counts_every_pixel() {
        let grid = Grid::new(4, 10);
        let field = TargetField::from_brightness(|_| 0.0, grid, Orientation::Brightness);
        let canvas = Canvas::blank(grid, Orientation::Brightness);
        let darkness = FlatDarkness::new(255.0, Orientation::Brightness);
        let evaluator =
            DeltaEvaluator::new(&field, &canvas, darkness, Scoring::default(), Rasterizer::default());

        assert_eq!(evaluator.score(horizontal(1.0, 0.0, 9.0)), -10.0 * 65025.0);
        assert_eq!(evaluator.score(horizontal(1.0, 0.0, 4.0)), -5.0 * 65025.0);
    }

    #[test]
    fn worsening_pixels_are_clipped() {
        let grid = Grid::new(1, 6);
        // Left half is already at its target, right half wants black.
        let field = TargetField::from_brightness(
            |p| if p.x < 3 { 255.0 } else { 0.0 },
            grid,
            Orientation::Brightness,
        );
        let canvas = Canvas::blank(grid, Orientation::Brightness);
        let darkness = FlatDarkness::new(5.0, Orientation::Brightness);
        let evaluator =
            DeltaEvaluator::new(&field, &canvas, darkness, Scoring::default(), Rasterizer::default());

        let per_pixel = 250.0 * 250.0 - 255.0 * 255.0;
        assert_eq!(evaluator.score(horizontal(0.0, 0.0, 5.0)), 3.0 * per_pixel);
        assert_eq!(evaluator.score(horizontal(0.0, 0.0, 2.0)), 0.0);
    }

    #[test]
    fn score_is_never_positive() {
        let grid = Grid::new(16, 16);
        let field = TargetField::from_brightness(
            |p| ((p.x * 37 + p.y * 11) % 256) as f64,
            grid,
            Orientation::Inverted,
        );
        let mut canvas = Canvas::blank(grid, Orientation::Inverted);
        let darkness = FlatDarkness::new(60.0, Orientation::Inverted);
        for y in 0..16 {
            canvas.apply(
                Rasterizer::default().rasterize(horizontal(y as f64, 0.0, (y % 7) as f64)),
                &darkness,
            );
        }
        for scoring in [
            Scoring::default(),
            Scoring { normalize: true, weighted: false },
            Scoring { normalize: false, weighted: true },
            Scoring { normalize: true, weighted: true },
        ] {
            let evaluator =
                DeltaEvaluator::new(&field, &canvas, darkness, scoring, Rasterizer::default());
            for x0 in 0..16 {
                for y1 in 0..16 {
                    let chord = Segment::new(Point::new(x0 as f64, 0.0), Point::new(15.0, y1 as f64));
                    assert!(evaluator.score(chord) <= 0.0);
                }
            }
        }
    }

    #[test]
    fn normalization_divides_by_length() {
        let grid = Grid::new(1, 10);
        let field = TargetField::from_brightness(|_| 0.0, grid, Orientation::Brightness);
        let canvas = Canvas::blank(grid, Orientation::Brightness);
        let darkness = FlatDarkness::new(255.0, Orientation::Brightness);
        let scoring = Scoring {
            normalize: true,
            weighted: false,
        };
        let evaluator = DeltaEvaluator::new(&field, &canvas, darkness, scoring, Rasterizer::default());
        assert_eq!(evaluator.score(horizontal(0.0, 0.0, 9.0)), -65025.0);
        assert_eq!(evaluator.score(horizontal(0.0, 2.0, 4.0)), -65025.0);
    }

    #[test]
    fn weighting_favours_dark_targets() {
        let grid = Grid::new(2, 10);
        // Top row wants mid gray, bottom row wants black.
        let field = TargetField::from_brightness(
            |p| if p.y == 0 { 127.5 } else { 0.0 },
            grid,
            Orientation::Brightness,
        );
        let canvas = Canvas::blank(grid, Orientation::Brightness);
        let darkness = FlatDarkness::new(10.0, Orientation::Brightness);
        let plain =
            DeltaEvaluator::new(&field, &canvas, darkness, Scoring::default(), Rasterizer::default());
        let weighted = DeltaEvaluator::new(
            &field,
            &canvas,
            darkness,
            Scoring {
                normalize: false,
                weighted: true,
            },
            Rasterizer::default(),
        );
        let top = horizontal(0.0, 0.0, 9.0);
        let bottom = horizontal(1.0, 0.0, 9.0);
        assert_eq!(weighted.score(top), plain.score(top) * 0.5);
        assert_eq!(weighted.score(bottom), plain.score(bottom));
    }

    #[test]
    fn downscaled_chords_index_the_small_grid() {
        let grid = Grid::new(5, 5);
        let field = TargetField::from_brightness(|_| 0.0, grid, Orientation::Brightness);
        let canvas = Canvas::blank(grid, Orientation::Brightness);
        let darkness = FlatDarkness::new(255.0, Orientation::Brightness);
        let evaluator =
            DeltaEvaluator::new(&field, &canvas, darkness, Scoring::default(), Rasterizer::new(4));
        // Full resolution chord across a 20 pixel wide frame.
        assert_eq!(evaluator.score(horizontal(8.0, 0.0, 19.0)), -5.0 * 65025.0);
    }
}
