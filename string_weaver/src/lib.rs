pub mod geometry {
    pub mod point;
    pub mod segment;

    pub use point::Point;
    pub use segment::Segment;
}

mod algorithm;
pub mod canvas;
pub mod darkness;
pub mod delta;
pub mod field;
mod float;
pub mod grid;
pub mod nails;
pub mod overlap;
pub mod pixels;
pub mod raster;
pub mod settings;
pub mod verboser;

pub use algorithm::*;
pub use canvas::Canvas;
pub use darkness::{Darkness, FlatDarkness, Orientation};
pub use delta::{DeltaEvaluator, Scoring};
pub use field::TargetField;
pub use float::Float;
pub use grid::Grid;
pub use nails::{Nail, NailRing};
pub use overlap::OverlapGuard;
pub use raster::Rasterizer;
pub use settings::{Settings, StartNail};
