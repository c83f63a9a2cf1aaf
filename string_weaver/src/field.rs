use std::ops::Deref;

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use num_traits::AsPrimitive;

use crate::{darkness::Orientation, geometry::Point, pixels::PixelData, Float, Grid};

/// Desired darkness of every cell, in `[0, 255]` under a fixed [`Orientation`].
#[derive(Clone, Debug)]
pub struct TargetField<S> {
    data: PixelData<S>,
    orientation: Orientation,
}

impl<S: Float> TargetField<S>
where
    u8: AsPrimitive<S>,
{
    /// Resamples `source` to `frame / downscale`, reduces it to the mean of its
    /// color channels and applies `orientation`.
    pub fn build(
        source: Option<&DynamicImage>,
        frame: Grid,
        downscale: usize,
        orientation: Orientation,
    ) -> Result<Self, Error> {
        let source = source.ok_or(Error::MissingSource)?;
        if downscale == 0 {
            return Err(Error::Downscale);
        }
        let grid = Grid {
            height: frame.height / downscale,
            width: frame.width / downscale,
        };
        if grid.is_empty() {
            return Err(Error::EmptyField { frame, downscale });
        }
        let (width, height) = match (u32::try_from(grid.width), u32::try_from(grid.height)) {
            (Ok(width), Ok(height)) => (width, height),
            _ => return Err(Error::TooLarge(grid)),
        };
        let resized = if source.dimensions() == (width, height) {
            source.to_rgb8()
        } else {
            source
                .resize_exact(width, height, FilterType::Triangle)
                .to_rgb8()
        };

        Ok(Self::from_brightness(
            |point| {
                // `grid` fits in u32, checked above.
                let [red, green, blue] = resized.get_pixel(point.x as u32, point.y as u32).0;
                let (red, green, blue): (S, S, S) = (red.as_(), green.as_(), blue.as_());
                (red + green + blue) / S::THREE
            },
            grid,
            orientation,
        ))
    }
}

impl<S: Float> TargetField<S> {
    /// Builds a field from brightness samples (black is 0, white is 255).
    ///
    /// Samples are clamped to `[0, 255]` before `orientation` is applied.
    pub fn from_brightness(
        mut brightness: impl FnMut(Point<usize>) -> S,
        grid: Grid,
        orientation: Orientation,
    ) -> Self {
        Self {
            data: PixelData::new(
                |point| {
                    orientation
                        .from_brightness(brightness(point).max(S::ZERO).min(S::TWO_FIVE_FIVE))
                },
                grid,
            ),
            orientation,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn get(&self, index: usize) -> Option<S> {
        self.data.get(index).copied()
    }

    pub fn values(&self) -> &[S] {
        self.data.pixels()
    }
}

impl<S> Deref for TargetField<S> {
    type Target = Grid;

    fn deref(&self) -> &Self::Target {
        self.data.grid()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No source image was supplied")]
    MissingSource,
    #[error("The downscale factor must be at least 1")]
    Downscale,
    #[error("A {}x{} frame downscaled by {downscale} leaves no pixels", .frame.width, .frame.height)]
    EmptyField { frame: Grid, downscale: usize },
    #[error("The field is too large to be resampled ({}x{})", .0.width, .0.height)]
    TooLarge(Grid),
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;

    #[test]
    fn build_without_source_fails() {
        let result = TargetField::<f32>::build(
            None,
            Grid::new(10, 10),
            1,
            Orientation::Brightness,
        );
        assert!(matches!(result, Err(Error::MissingSource)));
    }

    #[test]
    fn build_uses_channel_mean() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, Rgb([30, 60, 90])));
        let field =
            TargetField::<f64>::build(Some(&image), Grid::new(3, 4), 1, Orientation::Brightness)
                .unwrap();
        assert_eq!(field.width, 4);
        assert_eq!(field.height, 3);
        assert!(field.values().iter().all(|&v| v == 60.0));

        let inverted =
            TargetField::<f64>::build(Some(&image), Grid::new(3, 4), 1, Orientation::Inverted)
                .unwrap();
        assert!(inverted.values().iter().all(|&v| v == 195.0));
    }

    #[test]
    fn build_downscales_by_integer_factor() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, Rgb([0, 0, 0])));
        let field =
            TargetField::<f32>::build(Some(&image), Grid::new(100, 100), 4, Orientation::Brightness)
                .unwrap();
        assert_eq!(*field.deref(), Grid::new(25, 25));
        assert!(field.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn build_rejects_empty_field() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let result =
            TargetField::<f32>::build(Some(&image), Grid::new(3, 3), 4, Orientation::Brightness);
        assert!(matches!(result, Err(Error::EmptyField { .. })));
        let result =
            TargetField::<f32>::build(Some(&image), Grid::new(3, 3), 0, Orientation::Brightness);
        assert!(matches!(result, Err(Error::Downscale)));
    }

    #[test]
    fn from_brightness_clamps_samples() {
        let field = TargetField::from_brightness(
            |point| if point.x == 0 { -20.0 } else { 300.0 },
            Grid::new(1, 2),
            Orientation::Inverted,
        );
        assert_eq!(field.values(), &[255.0, 0.0]);
    }
}
