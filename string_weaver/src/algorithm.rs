use std::{fmt, ops::Range};

use image::{DynamicImage, GrayImage, Luma};
use log::{debug, info, warn};
use num_traits::AsPrimitive;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rayon::iter::{IntoParallelRefMutIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::{
    canvas::Canvas,
    darkness::{FlatDarkness, Orientation},
    delta::{DeltaEvaluator, Scoring},
    field::{self, TargetField},
    geometry::Segment,
    nails::{self, NailRing},
    overlap::OverlapGuard,
    raster::Rasterizer,
    settings::{self, Settings, StartNail},
    verboser::{Message, Verboser},
    Float, Grid,
};

/// Builds the field from `source` and runs [`compute`] on it.
///
/// `frame` is the full resolution size the source is resampled to.
pub fn compute_image<S: Float>(
    source: Option<&DynamicImage>,
    frame: Grid,
    settings: &Settings,
    verboser: &mut impl Verboser,
) -> Result<Computation<S>, Error>
where
    usize: AsPrimitive<S>,
    u8: AsPrimitive<S>,
    f32: AsPrimitive<S>,
{
    settings.validate()?;
    let field = TargetField::build(source, frame, settings.downscale, settings.orientation)?;
    compute(&field, settings, verboser)
}

/// Greedily winds lines over `field` until no line improves the result or
/// `settings.max_lines` is reached.
///
/// A random start nail draws from a generator seeded with the configured seed,
/// or from entropy when there is none.
pub fn compute<S: Float>(
    field: &TargetField<S>,
    settings: &Settings,
    verboser: &mut impl Verboser,
) -> Result<Computation<S>, Error>
where
    usize: AsPrimitive<S>,
    f32: AsPrimitive<S>,
{
    wind(
        field,
        settings,
        |nail_count| match settings.start {
            StartNail::Fixed(index) => index,
            StartNail::Random { seed: Some(seed) } => {
                settings.start.resolve(nail_count, &mut SmallRng::seed_from_u64(seed))
            }
            StartNail::Random { seed: None } => {
                settings.start.resolve(nail_count, &mut SmallRng::from_entropy())
            }
        },
        verboser,
    )
}

/// Same as [`compute`], drawing a random start nail from `rng`.
pub fn compute_with_rng<S: Float, R: Rng + ?Sized>(
    field: &TargetField<S>,
    settings: &Settings,
    rng: &mut R,
    verboser: &mut impl Verboser,
) -> Result<Computation<S>, Error>
where
    usize: AsPrimitive<S>,
    f32: AsPrimitive<S>,
{
    wind(
        field,
        settings,
        |nail_count| settings.start.resolve(nail_count, rng),
        verboser,
    )
}

fn wind<S: Float>(
    field: &TargetField<S>,
    settings: &Settings,
    start: impl FnOnce(usize) -> usize,
    verboser: &mut impl Verboser,
) -> Result<Computation<S>, Error>
where
    usize: AsPrimitive<S>,
    f32: AsPrimitive<S>,
{
    settings.validate()?;
    if field.orientation() != settings.orientation {
        return Err(Error::Orientation {
            field: field.orientation(),
            settings: settings.orientation,
        });
    }
    let frame = field
        .scaled(settings.downscale)
        .ok_or(settings::Error::DownscaleOverflow {
            downscale: settings.downscale,
            field: **field,
        })?;
    let ring = NailRing::inscribed(frame, settings.nail_count, settings.margin.as_(), verboser)?;
    let start = start(ring.len());
    info!(
        "Winding up to {} lines over {} nails on a {}x{} grid, starting at nail {}",
        settings.max_lines,
        ring.len(),
        field.width,
        field.height,
        start + 1
    );
    Ok(Algorithm::new(field, frame, ring, settings, start).compute(settings.max_lines, verboser))
}

/// A committed line, wound from nail `from` to nail `to` (0 based).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    pub from: usize,
    pub to: usize,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "From nail {} to nail {}", self.from + 1, self.to + 1)
    }
}

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Termination {
    /// No line from the current nail improves the canvas any more.
    NoImprovementFound,
    /// The configured line limit was reached.
    LineLimit,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoImprovementFound => write!(f, "no line improves the image"),
            Self::LineLimit => write!(f, "line limit reached"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Nails and field prepared, nothing committed.
    Ready,
    /// Scanning candidates from the current nail.
    Selecting,
    /// Best candidate committed to the canvas and the sequence.
    Committed,
    Done(Termination),
}

pub struct Computation<S> {
    ring: NailRing<S>,
    steps: Vec<Step>,
    canvas: Canvas<S>,
    start: usize,
    termination: Termination,
    orientation: Orientation,
    frame: Grid,
}

impl<S: Float> Computation<S> {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn ring(&self) -> &NailRing<S> {
        &self.ring
    }

    pub fn canvas(&self) -> &Canvas<S> {
        &self.canvas
    }

    pub fn start_nail(&self) -> usize {
        self.start
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn state(&self) -> State {
        State::Done(self.termination)
    }

    /// `true` when not a single line could improve the blank canvas.
    pub fn is_already_optimal(&self) -> bool {
        self.steps.is_empty() && self.termination == Termination::NoImprovementFound
    }

    /// One `From nail <a> to nail <b>` line per step, 1 based, in winding order.
    pub fn build_instructions(&self) -> String {
        self.steps
            .iter()
            .map(Step::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Preview of the nails and the lines in full resolution coordinates.
    pub fn build_svg(&self, line_tickness: f32, line_opacity: f32) -> svg::Document {
        let frame = self.frame;
        let mut doc = svg::Document::new().set("viewBox", (0, 0, frame.width, frame.height));
        for nail in self.ring.nails() {
            doc = doc.add(
                svg::node::element::Circle::new()
                    .set("cx", format!("{:.4}", nail.position.x))
                    .set("cy", format!("{:.4}", nail.position.y))
                    .set("r", 2)
                    .set("fill", "black"),
            );
        }

        for segment in self
            .steps
            .iter()
            .filter_map(|step| self.ring.segment(step.from, step.to))
        {
            doc = doc.add(
                svg::node::element::Line::new()
                    .set("x1", format!("{:.4}", segment.start.x))
                    .set("y1", format!("{:.4}", segment.start.y))
                    .set("x2", format!("{:.4}", segment.end.x))
                    .set("y2", format!("{:.4}", segment.end.y))
                    .set("stroke", "black")
                    .set("stroke-width", format!("{:.4}", line_tickness))
                    .set("stroke-opacity", format!("{:.4}", line_opacity)),
            );
        }
        doc
    }

    /// The residual canvas as a grayscale image (black ink on white).
    pub fn build_gray(&self) -> GrayImage {
        let orientation = self.orientation;
        let width = self.canvas.width as u32;
        let height = self.canvas.height as u32;
        let values = self.canvas.values();
        GrayImage::from_fn(width, height, |x, y| {
            let value = values
                .get(y as usize * self.canvas.width + x as usize)
                .map(|&value| orientation.from_brightness(value))
                .and_then(|brightness| brightness.round().to_u8())
                .unwrap_or(u8::MAX);
            Luma([value])
        })
    }
}

struct Algorithm<'a, S> {
    field: &'a TargetField<S>,
    frame: Grid,
    ring: NailRing<S>,
    canvas: Canvas<S>,
    darkness: FlatDarkness<S>,
    rasterizer: Rasterizer,
    scoring: Scoring,
    guard: Option<OverlapGuard<S>>,
    threshold: S,
    steps: Vec<Step>,
    buffers: Vec<BatchBuffer<S>>,
    start: usize,
    current: usize,
    state: State,
}

impl<'a, S: Float> Algorithm<'a, S>
where
    usize: AsPrimitive<S>,
    f32: AsPrimitive<S>,
{
    fn new(
        field: &'a TargetField<S>,
        frame: Grid,
        ring: NailRing<S>,
        settings: &Settings,
        start: usize,
    ) -> Self {
        let epsilon: S = settings.epsilon.as_();
        Self {
            canvas: Canvas::blank(**field, field.orientation()),
            darkness: FlatDarkness::new(settings.darkening.as_(), field.orientation()),
            rasterizer: Rasterizer::new(settings.downscale),
            scoring: settings.scoring,
            // Thresholds are given in frame pixels, chords live in frame coordinates.
            guard: settings
                .overlap_threshold
                .map(|threshold| OverlapGuard::new(threshold.as_())),
            threshold: -epsilon,
            steps: Vec::with_capacity(settings.max_lines.min(1 << 16)),
            buffers: BatchBuffer::new(),
            field,
            frame,
            ring,
            start,
            current: start,
            state: State::Ready,
        }
    }

    fn compute(mut self, max_lines: usize, verboser: &mut impl Verboser) -> Computation<S> {
        loop {
            match self.state {
                State::Ready | State::Committed => {
                    self.state = if self.steps.len() < max_lines {
                        State::Selecting
                    } else {
                        State::Done(Termination::LineLimit)
                    };
                }
                State::Selecting => {
                    verboser.verbose(Message::Computing(self.steps.len()));
                    self.state = match self.get_best_line() {
                        Some(candidate) => {
                            self.commit(candidate);
                            State::Committed
                        }
                        None => State::Done(Termination::NoImprovementFound),
                    };
                }
                State::Done(termination) => {
                    if self.steps.is_empty() {
                        warn!("Finished without lines: {}", termination);
                    } else {
                        info!("Finished with {} lines: {}", self.steps.len(), termination);
                    }
                    verboser.verbose(Message::Finished(termination));
                    return Computation {
                        ring: self.ring,
                        steps: self.steps,
                        canvas: self.canvas,
                        start: self.start,
                        termination,
                        orientation: self.field.orientation(),
                        frame: self.frame,
                    };
                }
            }
        }
    }

    fn commit(&mut self, candidate: Candidate<S>) {
        self.canvas
            .apply(self.rasterizer.rasterize(candidate.segment), &self.darkness);
        let step = Step {
            from: self.current,
            to: candidate.to,
        };
        debug!("Line {}: {} (delta {})", self.steps.len() + 1, step, candidate.delta);
        self.steps.push(step);
        self.current = candidate.to;
    }

    /// Best line from the current nail, if any beats the threshold.
    ///
    /// Candidates are split in contiguous ranges, one per buffer. Each buffer
    /// keeps the first strictly better candidate of its range and buffers are
    /// reduced in range order, so ties resolve to the lowest nail index no
    /// matter how the work was scheduled.
    fn get_best_line(&mut self) -> Option<Candidate<S>> {
        let nail_count = self.ring.len();
        let chunk_size = nail_count.div_ceil(self.buffers.len());
        for (index, buffer) in self.buffers.iter_mut().enumerate() {
            let start = (index * chunk_size).min(nail_count);
            buffer.range = start..(start + chunk_size).min(nail_count);
        }

        let evaluator = DeltaEvaluator::new(
            self.field,
            &self.canvas,
            self.darkness,
            self.scoring,
            self.rasterizer,
        );
        let current = self.current;
        let threshold = self.threshold;
        let ring = &self.ring;
        let steps = self.steps.as_slice();
        let guard = self.guard;

        self.buffers.par_iter_mut().for_each(|buffer| {
            buffer.result = None;
            let mut best = threshold;
            for to in buffer.range.clone() {
                if to == current {
                    continue;
                }
                let Some(segment) = ring.segment(current, to) else {
                    continue;
                };
                if segment.sq_length() <= S::ZERO {
                    continue;
                }
                if let Some(guard) = guard {
                    if !guard.allowed(segment, steps, ring) {
                        continue;
                    }
                }
                let delta = evaluator.score(segment);
                if delta < best {
                    best = delta;
                    buffer.result = Some(Candidate { to, delta, segment });
                }
            }
        });

        let mut best: Option<Candidate<S>> = None;
        for BatchBuffer { range: _, result } in self.buffers.iter() {
            if let Some(candidate) = result {
                if best.map_or(true, |best| candidate.delta < best.delta) {
                    best = Some(*candidate);
                }
            }
        }
        best
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate<S> {
    to: usize,
    delta: S,
    segment: Segment<S>,
}

struct BatchBuffer<S> {
    range: Range<usize>,
    result: Option<Candidate<S>>,
}

impl<S> BatchBuffer<S> {
    fn new() -> Vec<Self> {
        (0..num_cpus::get().max(1))
            .map(|_| Self {
                range: 0..0,
                result: None,
            })
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Settings(#[from] settings::Error),
    #[error(transparent)]
    Field(#[from] field::Error),
    #[error(transparent)]
    Nails(#[from] nails::Error),
    #[error("The target field uses {field} orientation but the settings ask for {settings}")]
    Orientation {
        field: Orientation,
        settings: Orientation,
    },
}
