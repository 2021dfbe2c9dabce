use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use pmd::driver::ObserverResult;
use pmd::{Config, DiffusionState, Diffusivity, GradientOperator, IterationController, Scheme};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GFunc {
    /// exp(-(|grad u| / K)^2)
    #[value(name = "exp", alias = "0")]
    Exponential,
    /// 1 / (1 + (|grad u| / K)^2)
    #[value(name = "rational", alias = "1")]
    Rational,
}

impl From<GFunc> for Diffusivity {
    fn from(g: GFunc) -> Self {
        match g {
            GFunc::Exponential => Diffusivity::Exponential,
            GFunc::Rational => Diffusivity::Rational,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Gradient {
    Central,
    Sobel,
    Laplacian,
}

impl From<Gradient> for GradientOperator {
    fn from(g: Gradient) -> Self {
        match g {
            Gradient::Central => GradientOperator::CentralDifference,
            Gradient::Sobel => GradientOperator::Sobel,
            Gradient::Laplacian => GradientOperator::Laplacian,
        }
    }
}

/// Apply Perona-Malik edge-preserving smoothing to an image.
#[derive(Debug, Parser)]
#[command(name = "perona-malik", version)]
struct Cli {
    /// Image to process
    filename: PathBuf,

    /// Number of iterations, greater than 0
    iterations: usize,

    /// Time step. Stable in (0, 0.25]
    #[arg(allow_negative_numbers = true)]
    time_step: f64,

    /// Contrast constant K of the diffusivity function, greater than 0
    #[arg(allow_negative_numbers = true)]
    k: f64,

    /// Diffusivity function
    #[arg(value_enum)]
    g_func: GFunc,

    /// Gradient estimator
    #[arg(long, value_enum, default_value = "sobel")]
    gradient: Gradient,

    /// Write every iteration as a frame into --frames-dir
    #[arg(long)]
    animate: bool,

    /// Directory for animation frames
    #[arg(long, default_value = "out")]
    frames_dir: PathBuf,

    /// Report the runtime of the diffusion loop
    #[arg(long)]
    time: bool,

    /// Output image, defaults to <stem>_pm.png next to the input
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_owned());
    input.with_file_name(format!("{}_pm.png", stem))
}

fn progress_bar(total: usize) -> anyhow::Result<ProgressBar> {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template(
                "[{bar:50}] {percent:>3}% complete, iteration {pos}/{len} ({elapsed_precise})",
            )?
            .progress_chars("=>-"),
    );
    Ok(bar)
}

fn progress(
    bar: &ProgressBar,
) -> impl FnMut(usize, usize, &DiffusionState) -> ObserverResult + '_ {
    move |index: usize, _: usize, _: &DiffusionState| -> ObserverResult {
        bar.set_position(index as u64);
        Ok(())
    }
}

const FRAME_PREFIX: &str = "perona_malik";

/// Create `dir` and write the initial state as frame 0.
fn start_animation(dir: &Path, state: &DiffusionState) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    image_util::save_frame(dir, FRAME_PREFIX, 0, state)
}

/// Write every completed iteration as a numbered frame under `dir`.
fn frame_writer(dir: PathBuf) -> impl FnMut(usize, usize, &DiffusionState) -> ObserverResult {
    move |index: usize, _: usize, state: &DiffusionState| -> ObserverResult {
        image_util::save_frame(&dir, FRAME_PREFIX, index, state)?;
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let scheme =
        Scheme::new(cli.time_step, cli.k, cli.g_func.into()).with_gradient(cli.gradient.into());
    let config = Config::new(cli.iterations, scheme)?;

    let state = image_util::load_state(&cli.filename)?;
    let (h, w) = state.dim();
    info!("loaded {} ({}x{})", cli.filename.display(), w, h);

    let bar = if cli.quiet {
        ProgressBar::hidden()
    } else {
        progress_bar(cli.iterations)?
    };

    let mut controller = IterationController::new(config).with_observer(progress(&bar));
    if cli.animate {
        start_animation(&cli.frames_dir, &state)?;
        controller = controller.with_observer(frame_writer(cli.frames_dir.clone()));
    }

    let start = Instant::now();
    let state = controller.run(state)?;
    let elapsed = start.elapsed();
    bar.finish();

    if cli.time {
        info!("finished, total runtime: {:.3} seconds", elapsed.as_secs_f64());
    } else {
        info!("finished");
    }

    let output = match cli.output {
        Some(path) => path,
        None => default_output(&cli.filename),
    };
    image_util::save_state(&output, &state)?;
    info!("wrote {}", output.display());

    Ok(())
}
