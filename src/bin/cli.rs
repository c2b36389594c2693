//! F1 Race CLI - Build and inspect finishing-position training datasets

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use f1race::data::{
    feature_names, AssemblerConfig, CsvRaceSource, Dataset, DatasetCache, DatasetConfig, DatasetLoader,
    RaceSource, SeasonProgress, RECENT_RACE_WINDOW,
};

#[cfg(feature = "openf1")]
use f1race::openf1::{OpenF1Source, SupplierConfig};

/// Default cache directory (relative to project root)
const DEFAULT_CACHE_DIR: &str = "data/cache";

#[derive(Parser)]
#[command(name = "f1race")]
#[command(author, version, about = "F1 race feature dataset CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch seasons and build the feature dataset
    Build {
        /// Seasons to include
        #[arg(required = true, num_args = 1..)]
        years: Vec<i32>,

        /// Read race results from a CSV file instead of the OpenF1 API
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Directory for cached datasets
        #[arg(long, default_value = DEFAULT_CACHE_DIR)]
        cache_dir: PathBuf,

        /// Ignore and don't write the cache
        #[arg(long)]
        no_cache: bool,

        /// Number of prior results in the recency window
        #[arg(long, default_value_t = RECENT_RACE_WINDOW)]
        window: usize,

        /// Query session weather from the API
        #[arg(long, conflicts_with = "csv")]
        weather: bool,

        /// Delay between API requests in milliseconds
        #[arg(long, conflicts_with = "csv")]
        delay: Option<u64>,

        /// Also write the dataset as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize a cached dataset
    Inspect {
        /// Cache file to read
        file: PathBuf,
    },

    /// Convert a cached dataset to CSV
    Export {
        /// Cache file to read
        file: PathBuf,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the feature vector layout
    Features,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    println!("{}", format!("F1 Race CLI v{}", env!("CARGO_PKG_VERSION")).cyan().bold());
    println!();

    match cli.command {
        Commands::Build {
            years,
            csv,
            cache_dir,
            no_cache,
            window,
            weather,
            delay,
            output,
        } => {
            let config = DatasetConfig {
                assembler: AssemblerConfig { history_window: window },
                cache_dir,
                use_cache: !no_cache,
            };
            let mut source = open_source(csv.as_deref(), weather, delay)?;
            run_build(source.as_mut(), &years, config, output.as_deref())?;
        }
        Commands::Inspect { file } => {
            run_inspect(&file)?;
        }
        Commands::Export { file, output } => {
            run_export(&file, &output)?;
        }
        Commands::Features => {
            list_features();
        }
    }

    Ok(())
}

/// Pick the race supplier from the command-line flags
fn open_source(csv: Option<&Path>, weather: bool, delay: Option<u64>) -> Result<Box<dyn RaceSource>> {
    if let Some(path) = csv {
        let source = CsvRaceSource::load(path).with_context(|| format!("Failed to load CSV from {:?}", path))?;
        return Ok(Box::new(source));
    }

    #[cfg(feature = "openf1")]
    {
        let mut config = SupplierConfig::from_env();
        config.fetch_weather = weather;
        if let Some(delay) = delay {
            config.delay_ms = delay;
        }
        let source = OpenF1Source::new(config).context("Failed to create OpenF1 client")?;
        Ok(Box::new(source))
    }

    #[cfg(not(feature = "openf1"))]
    {
        let _ = (weather, delay);
        bail!("Built without the openf1 feature; pass --csv <FILE>")
    }
}

fn run_build(source: &mut dyn RaceSource, years: &[i32], config: DatasetConfig, output: Option<&Path>) -> Result<()> {
    println!(
        "{} {} season(s) from {}",
        "Building".green(),
        years.len(),
        source.name()
    );

    let pb = ProgressBar::new(years.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let loader = DatasetLoader::new(config);
    let dataset = loader
        .load_with_progress(source, years, |progress| {
            match progress {
                SeasonProgress::Fetched { year, races } => {
                    pb.set_message(format!("{}: {} races", year, races));
                }
                SeasonProgress::Failed { year } => {
                    pb.println(format!("{} {}: season skipped", "Warning".yellow(), year));
                }
            }
            pb.inc(1);
        })
        .context("Dataset build failed")?;

    pb.finish_and_clear();

    print_summary(&dataset);

    if let Some(path) = output {
        dataset
            .export_csv(path)
            .with_context(|| format!("Failed to write CSV to {:?}", path))?;
        println!("{}: {:?}", "Saved".green(), path);
    }

    Ok(())
}

fn run_inspect(file: &Path) -> Result<()> {
    let dataset = DatasetCache::read_file(file).with_context(|| format!("Failed to read cache {:?}", file))?;
    print_summary(&dataset);

    if dataset.is_empty() {
        return Ok(());
    }

    println!();
    println!("{}", "Feature ranges:".yellow().bold());
    println!("{:>3} {:<24} {:>8} {:>8} {:>8}", "#", "Feature", "Min", "Mean", "Max");
    println!("{}", "-".repeat(55));

    let n = dataset.len() as f64;
    for (i, name) in feature_names().iter().enumerate() {
        let values = dataset.features.iter().map(|row| row[i]);
        let min = values.clone().fold(f64::INFINITY, f64::min);
        let max = values.clone().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.sum::<f64>() / n;
        println!("{:>3} {:<24} {:>8.3} {:>8.3} {:>8.3}", i, name, min, mean, max);
    }

    Ok(())
}

fn run_export(file: &Path, output: &Path) -> Result<()> {
    let dataset = DatasetCache::read_file(file).with_context(|| format!("Failed to read cache {:?}", file))?;
    if dataset.is_empty() {
        bail!("Cache {:?} holds no samples", file);
    }

    dataset
        .export_csv(output)
        .with_context(|| format!("Failed to write CSV to {:?}", output))?;

    println!(
        "{}: {} samples written to {:?}",
        "Complete".green(),
        dataset.len(),
        output
    );
    Ok(())
}

fn list_features() {
    println!("{}", "Feature Vector Layout:".yellow().bold());
    println!("{}", "-".repeat(30));
    for (i, name) in feature_names().iter().enumerate() {
        println!("{:>3}  {}", i, name);
    }
}

fn print_summary(dataset: &Dataset) {
    println!("{}", "Dataset Summary:".yellow().bold());
    println!("{}", "-".repeat(40));
    println!("Samples:        {}", dataset.len());

    match dataset.label_summary() {
        Some((min, max, mean)) => {
            println!("Position range: {}-{}", min, max);
            println!("Mean position:  {:.2}", mean);
        }
        None => println!("{}", "(no samples)".dimmed()),
    }
}
