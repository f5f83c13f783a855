//! digitstrip CLI
//!
//! Command-line entry point for the digit strip reading pipeline: incremental
//! training from a folder of labeled images, single-image number reading, and
//! source-folder statistics.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use digitstrip::backend::{backend_name, default_device, DefaultBackend, TrainingBackend};
use digitstrip::dataset::{scan_source_images, DatasetStats, SliceSpec};
use digitstrip::inference::reader::{read_number, ReaderConfig};
use digitstrip::training::incremental::{run_incremental_training, IncrementalRunConfig};
use digitstrip::training::TrainingConfig;
use digitstrip::utils::logging::{init_logging, LogConfig};

/// Digit strip segmentation and incremental CNN recognition
#[derive(Parser, Debug)]
#[command(name = "digitstrip")]
#[command(version)]
#[command(about = "Read multi-digit numeral strips with an incrementally trained CNN", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train the classifier incrementally from a folder of labeled images
    Train {
        /// Folder of source images named {date}_{time}_{digits}.{jpg|png}
        #[arg(short, long, default_value = "dataset_folder")]
        input_dir: PathBuf,

        /// Folder for the persisted slice files
        #[arg(short, long, default_value = "processed_images")]
        slice_dir: PathBuf,

        /// Model artifact path (recorder extension added on save)
        #[arg(short, long, default_value = "digit_model")]
        model: PathBuf,

        /// Optional JSON label manifest mapping image stem to digit string
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Passes over each per-image batch
        #[arg(long, default_value = "2")]
        epochs_per_image: usize,

        /// Adam learning rate
        #[arg(long, default_value = "0.001")]
        learning_rate: f64,

        #[command(flatten)]
        geometry: GeometryArgs,
    },

    /// Read the number from a single image with a trained model
    Read {
        /// Path to the test image
        #[arg(short, long)]
        image: PathBuf,

        /// Model artifact path
        #[arg(short, long, default_value = "digit_model")]
        model: PathBuf,

        /// Folder for the persisted slice files
        #[arg(short, long, default_value = "split_images")]
        slice_dir: PathBuf,

        #[command(flatten)]
        geometry: GeometryArgs,
    },

    /// Show statistics for a folder of source images
    Stats {
        /// Folder of source images
        #[arg(short, long, default_value = "dataset_folder")]
        input_dir: PathBuf,
    },
}

/// Crop geometry flags, fixed per deployment
#[derive(Args, Debug)]
struct GeometryArgs {
    /// Horizontal crop start offset in pixels
    #[arg(long, default_value = "7")]
    crop_start: u32,

    /// Horizontal crop end offset in pixels
    #[arg(long, default_value = "83")]
    crop_end: u32,

    /// Number of digit cells per image
    #[arg(long, default_value = "5")]
    slices: usize,
}

impl GeometryArgs {
    fn spec(&self) -> SliceSpec {
        SliceSpec::new(self.crop_start, self.crop_end, self.slices)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let _ = init_logging(&log_config);

    print_banner();

    match cli.command {
        Commands::Train {
            input_dir,
            slice_dir,
            model,
            manifest,
            epochs_per_image,
            learning_rate,
            geometry,
        } => {
            let config = IncrementalRunConfig {
                input_dir,
                slice_dir,
                model_path: model,
                manifest_path: manifest,
                spec: geometry.spec(),
                training: TrainingConfig {
                    epochs_per_image,
                    learning_rate,
                },
            };
            cmd_train(&config)
        }

        Commands::Read {
            image,
            model,
            slice_dir,
            geometry,
        } => {
            let config = ReaderConfig {
                model_path: model,
                slice_dir,
                spec: geometry.spec(),
            };
            cmd_read(&image, &config)
        }

        Commands::Stats { input_dir } => cmd_stats(&input_dir),
    }
}

fn print_banner() {
    println!("{}", "digitstrip".cyan().bold());
    println!("  Backend: {}", backend_name());
    println!();
}

fn cmd_train(config: &IncrementalRunConfig) -> Result<()> {
    let device = default_device();
    let report = run_incremental_training::<TrainingBackend>(config, &device)?;

    println!();
    println!("{}", "Training complete!".green().bold());
    println!("  📷 Images processed: {}", report.totals.images_seen);
    println!("  ✅ Images trained: {}", report.totals.images_trained);
    if report.totals.images_skipped > 0 {
        println!("  ⏭️  Images skipped: {}", report.totals.images_skipped);
    }
    println!("  📊 Samples trained: {}", report.totals.samples_trained);
    println!("  📉 Mean step loss: {:.4}", report.mean_loss);
    println!(
        "  🎯 Running accuracy: {:.2}%",
        report.train_accuracy * 100.0
    );
    println!("  💾 Model saved to: {:?}", report.model_artifact);

    Ok(())
}

fn cmd_read(image: &PathBuf, config: &ReaderConfig) -> Result<()> {
    let device = default_device();
    let result = read_number::<DefaultBackend>(image, config, &device)?;

    println!("{}", result.display());
    println!(
        "{} {}",
        "📊 Final prediction:".green().bold(),
        result.number.bold()
    );

    Ok(())
}

fn cmd_stats(input_dir: &PathBuf) -> Result<()> {
    let paths = scan_source_images(input_dir)?;
    DatasetStats::from_paths(&paths).print();
    Ok(())
}
