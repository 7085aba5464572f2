// mixcut-cli/src/main.rs
//
// Command-line interface for the mixcut video assembly system. Parses a job
// manifest, builds the core configuration from CLI flags, resolves the
// asset and stock-footage providers once, and hands everything to
// `mixcut_core::process_job`.

use clap::{Parser, Subcommand};
use mixcut_core::{
    format_duration, process_job, resolve_provider, DirectoryAssets, MixConfig, Orientation,
    StockFootageProvider,
};
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

mod logging;
mod manifest;

use manifest::Manifest;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Mixcut: narrated short-video assembly",
    long_about = "Assembles short videos from narrated scenes: selects and \
                  normalizes clips to cover each narration, maps inline \
                  overlay/sound-effect tags onto the clip timeline, and \
                  produces one muxed, optionally scored artifact."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assembles the job described by a manifest into one video
    Assemble(AssembleArgs),
}

#[derive(Parser, Debug)]
struct AssembleArgs {
    /// Job manifest (JSON) naming scenes, narration audio and clip pools
    #[arg(required = true, value_name = "MANIFEST")]
    manifest: PathBuf,

    /// Directory where the final video is published
    #[arg(short, long, value_name = "OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Optional: base directory for working files (defaults to OUTPUT_DIR)
    #[arg(long, value_name = "WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Optional: directory for log files (defaults to OUTPUT_DIR/logs)
    #[arg(long, value_name = "LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Target frame width
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Target frame height
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Target frame rate
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Minimum usable clip length in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 2.0)]
    clip_min: f64,

    /// Maximum clip length in seconds; longer clips are trimmed
    #[arg(long, value_name = "SECONDS", default_value_t = 15.0)]
    clip_max: f64,

    /// Orientation filter for candidate clips: landscape, portrait or any
    #[arg(long, default_value = "any")]
    orientation: String,
}

// --- Main Logic ---

fn run_assemble(args: AssembleArgs) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();

    let log_dir = args
        .log_dir
        .clone()
        .unwrap_or_else(|| args.output_dir.join("logs"));
    let log_file = logging::setup(&log_dir)?;
    log::info!("logging to {}", log_file.display());

    let manifest = Manifest::load(&args.manifest)?;

    // --- Build the core configuration from flags + manifest features ---
    let mut config = MixConfig::new(args.output_dir.clone());
    config.work_dir = args.work_dir.clone();
    config.target_width = args.width;
    config.target_height = args.height;
    config.fps = args.fps;
    config.clip_min_secs = args.clip_min;
    config.clip_max_secs = args.clip_max;
    config.image_duration_secs = config.image_duration_secs.max(args.clip_min);
    config.orientation = args.orientation.parse::<Orientation>()?;
    config.transition = manifest.transition_config();
    config.background_music = manifest.background_music_config();
    config.validate()?;

    // --- Resolve providers once, at job construction ---
    let assets = match &manifest.assets {
        Some(dirs) => DirectoryAssets::new(dirs.overlay_dir.clone(), dirs.sound_dir.clone()),
        None => DirectoryAssets::default(),
    };
    let stock: Option<Box<dyn StockFootageProvider>> = match &manifest.stock {
        Some(entry) => Some(resolve_provider(&entry.provider, entry.api_key.clone())?),
        None => None,
    };

    let job = manifest.job_spec();
    log::info!(
        "assembling {} scenes into {}",
        job.scenes.len(),
        args.output_dir.display()
    );

    let report = process_job(&config, &job, &assets, &assets, stock.as_deref())?;

    println!();
    println!("published:  {}", report.output.display());
    println!(
        "duration:   {:.1}s across {} clips in {} scenes",
        report.duration_secs, report.clip_count, report.scene_count
    );
    if let Some(srt) = &report.subtitles {
        println!("subtitles:  {}", srt.display());
    }
    println!(
        "elapsed:    {}",
        format_duration(Duration::from_secs(start_time.elapsed().as_secs()))
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Assemble(args) => run_assemble(args),
    };

    if let Err(err) = result {
        log::error!("{err}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}
