//! Command-line driver: scans in, assembled puzzle image out.

use clap::Parser;
use log::{error, info, LevelFilter};
use std::path::PathBuf;
use std::process::ExitCode;

use jigsaw_extract::{extract_pieces, ExtractError, ExtractParams, ImagePair};
use jigsaw_render::{visualize, RenderError, RenderParams};
use jigsaw_solve::{assemble_puzzle, CompatParams, SolveError};

/// Reconstruct a jigsaw puzzle from scans of its pieces.
///
/// Every piece must appear on exactly one front scan (printed side)
/// and on the corresponding back scan (silhouettes on a dark
/// background), given in the same order.
#[derive(Parser, Debug)]
#[command(name = "jigsaw-solver", version, about)]
struct Args {
    /// Front-side scan images, one or more.
    #[arg(short = 'f', long = "front", num_args = 1.., required = true)]
    front: Vec<PathBuf>,

    /// Back-side scan images, pair-wise corresponding to the fronts.
    #[arg(short = 'b', long = "back", num_args = 1.., required = true)]
    back: Vec<PathBuf>,

    /// Output image.
    #[arg(short = 'o', long = "output", default_value = "output.jpg")]
    output: PathBuf,

    /// Worker threads; 0 uses all available cores.
    #[arg(short = 't', long = "threads", default_value_t = 0)]
    threads: usize,

    /// Verbose progress logging.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

#[derive(thiserror::Error, Debug)]
enum AppError {
    #[error("got {fronts} front image(s) but {backs} back image(s)")]
    InputMismatch { fronts: usize, backs: usize },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Solve(#[from] SolveError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        source: image::ImageError,
    },
}

fn run(args: &Args) -> Result<(), AppError> {
    if args.front.len() != args.back.len() {
        return Err(AppError::InputMismatch {
            fronts: args.front.len(),
            backs: args.back.len(),
        });
    }

    if args.threads > 0 {
        // Both parallel regions (extraction, table build) share the
        // global pool.
        let _ = rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global();
    }

    let pairs: Vec<ImagePair> = args
        .front
        .iter()
        .zip(args.back.iter())
        .map(|(front, back)| ImagePair {
            front: front.clone(),
            back: back.clone(),
        })
        .collect();

    let pieces = extract_pieces(&pairs, &ExtractParams::default())?;
    let layout = assemble_puzzle(&pieces, &CompatParams::default())?;
    let canvas = visualize(&pieces, &layout, &RenderParams::default())?;

    canvas.save(&args.output).map_err(|source| AppError::Output {
        path: args.output.clone(),
        source,
    })?;
    info!("wrote {}", args.output.display());
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = jigsaw_core::init_with_level(level);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
