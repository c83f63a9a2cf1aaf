use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use clap::{Parser, ValueEnum};
use log::info;
use num_traits::AsPrimitive;
use string_weaver::{
    compute_image,
    verboser::{Message, Verboser},
    Computation, Float, Grid, Orientation, Settings, StartNail,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input file path.
    #[arg()]
    input: PathBuf,

    /// JSON file with base settings. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of nails surrounding the image.
    #[arg(short, long)]
    nails: Option<usize>,

    /// Maximum number of lines.
    #[arg(short, long)]
    lines: Option<usize>,

    /// Size in pixels of the square frame the image is resized to.
    #[arg(short, long, default_value_t = 500)]
    resolution: usize,

    /// Precision of calculations (Single/Double).
    #[arg(short, long, default_value_t = Precision::Single)]
    precision: Precision,

    /// Intensity every line adds to the pixels it crosses.
    #[arg(short, long)]
    darkening: Option<f32>,

    /// Integer factor the frame is reduced by before scoring.
    #[arg(long)]
    downscale: Option<usize>,

    /// Distance in pixels between the nails and the frame border.
    #[arg(short, long)]
    margin: Option<f32>,

    /// Rejects lines running closer than this to an already wound line.
    #[arg(long)]
    overlap: Option<f32>,

    #[arg(long)]
    ink: Option<Ink>,

    /// Nail the first line starts from (1 based).
    #[arg(long, conflicts_with = "random")]
    start: Option<usize>,

    /// Start from a random nail.
    #[arg(long)]
    random: bool,

    /// Seed of the random start nail.
    #[arg(long, requires = "random")]
    seed: Option<u64>,

    /// Minimum improvement a line must bring to be wound.
    #[arg(long)]
    epsilon: Option<f32>,

    /// Divide every line score by the number of pixels it crosses.
    #[arg(long)]
    normalize: bool,

    /// Weight every pixel score by the darkness of its target.
    #[arg(long)]
    weighted: bool,

    /// Output folder. Defaults to `output` next to the input.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, default_value_t = 0.5)]
    line_thickness: f32,

    #[arg(long, default_value_t = 0.5)]
    line_opacity: f32,

    /// Also save the residual canvas as a png.
    #[arg(long)]
    residual: bool,
}

#[derive(Clone, Copy, Debug)]
enum Precision {
    Single,
    Double,
}

impl ValueEnum for Precision {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Single, Self::Double]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Single => clap::builder::PossibleValue::new("Single")
                .alias("single")
                .alias("f32"),
            Self::Double => clap::builder::PossibleValue::new("Double")
                .alias("double")
                .alias("f64"),
        })
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => write!(f, "Single"),
            Self::Double => write!(f, "Double"),
        }
    }
}

/// How the ink is laid on the canvas.
#[derive(Clone, Copy, Debug)]
enum Ink {
    /// Dark lines over a white canvas.
    Dark,
    /// Light lines over a black canvas.
    Light,
}

impl ValueEnum for Ink {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Dark, Self::Light]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Dark => clap::builder::PossibleValue::new("Dark")
                .alias("dark")
                .alias("brightness"),
            Self::Light => clap::builder::PossibleValue::new("Light")
                .alias("light")
                .alias("inverted"),
        })
    }
}

impl From<Ink> for Orientation {
    fn from(ink: Ink) -> Self {
        match ink {
            Ink::Dark => Orientation::Brightness,
            Ink::Light => Orientation::Inverted,
        }
    }
}

/// Prints a line every few hundred wound lines.
struct Progress {
    interval: usize,
}

impl Verboser for Progress {
    fn verbose(&mut self, message: Message) {
        match message {
            Message::CreatingNail(_) => {}
            Message::Computing(lines) if lines > 0 && lines % self.interval == 0 => {
                println!("{lines} lines wound...")
            }
            Message::Computing(_) => {}
            Message::Finished(termination) => info!("Stopped: {termination}"),
        }
    }
}

impl Args {
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed reading {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Invalid settings in {}", path.display()))?
            }
            None => Settings::default(),
        };
        if let Some(nails) = self.nails {
            settings.nail_count = nails;
        }
        if let Some(lines) = self.lines {
            settings.max_lines = lines;
        }
        if let Some(darkening) = self.darkening {
            settings.darkening = darkening;
        }
        if let Some(downscale) = self.downscale {
            settings.downscale = downscale;
        }
        if let Some(margin) = self.margin {
            settings.margin = margin;
        }
        if let Some(overlap) = self.overlap {
            settings.overlap_threshold = Some(overlap);
        }
        if let Some(ink) = self.ink {
            settings.orientation = ink.into();
        }
        if let Some(start) = self.start {
            let index = start
                .checked_sub(1)
                .ok_or_else(|| anyhow!("Nails are numbered from 1"))?;
            settings.start = StartNail::Fixed(index);
        }
        if self.random {
            settings.start = StartNail::Random { seed: self.seed };
        }
        if let Some(epsilon) = self.epsilon {
            settings.epsilon = epsilon;
        }
        settings.scoring.normalize |= self.normalize;
        settings.scoring.weighted |= self.weighted;
        settings.validate()?;
        Ok(settings)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let settings = args.settings()?;
    match args.precision {
        Precision::Single => with_precision::<f32>(&args, &settings),
        Precision::Double => with_precision::<f64>(&args, &settings),
    }
}

fn with_precision<S: Float>(args: &Args, settings: &Settings) -> anyhow::Result<()>
where
    f32: AsPrimitive<S>,
    usize: AsPrimitive<S>,
    u8: AsPrimitive<S>,
{
    let image = image::open(&args.input)
        .with_context(|| format!("Failed opening {}", args.input.display()))?;
    let frame = Grid::new(args.resolution, args.resolution);
    let computation = compute_image::<S>(
        Some(&image),
        frame,
        settings,
        &mut Progress { interval: 200 },
    )?;

    let file_name = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("Invalid file name {}", args.input.display()))?;
    let out_folder = match &args.output {
        Some(folder) => folder.clone(),
        None => args
            .input
            .parent()
            .unwrap_or(Path::new("."))
            .join("output"),
    };
    fs::create_dir_all(&out_folder)
        .with_context(|| format!("Output directory {} can not be created", out_folder.display()))?;

    let sequence = out_folder.join(format!("{file_name}_nail_sequence.txt"));
    let exported = export_sequence(&computation, &sequence)?;

    let preview = out_folder.join(format!("{file_name}.svg"));
    svg::save(
        &preview,
        &computation.build_svg(args.line_thickness, args.line_opacity),
    )
    .with_context(|| format!("Failed creating svg image {}", preview.display()))?;

    if args.residual {
        let residual = out_folder.join(format!("{file_name}_residual.png"));
        computation
            .build_gray()
            .save(&residual)
            .with_context(|| format!("Failed saving {}", residual.display()))?;
    }

    if exported {
        println!(
            "Generation complete! {} lines added.",
            computation.steps().len()
        );
        info!("Nail sequence written to {}", sequence.display());
    } else {
        println!("No line improves the image, it is already optimal. No sequence was written.");
    }
    Ok(())
}

/// Writes the instructions to `path`. Nothing is written for an empty sequence.
fn export_sequence<S: Float>(computation: &Computation<S>, path: &Path) -> anyhow::Result<bool> {
    if computation.is_already_optimal() {
        return Ok(false);
    }
    fs::write(path, computation.build_instructions())
        .with_context(|| format!("Failed writing {}", path.display()))?;
    Ok(true)
}
