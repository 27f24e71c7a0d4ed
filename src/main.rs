use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::HumanBytes;

use pixstash::config::DEFAULT_PARALLEL_THRESHOLD;
use pixstash::{
    decode_file, encode_file, CapacityReport, Carrier, FilenameCheck, Level, Padding, StegoConfig,
};

/// pixstash: hide files in the low bits of lossless images.
///
/// With only CARRIER: print its capacity and extract any hidden file.
/// With CARRIER PAYLOAD OUTPUT: hide PAYLOAD in CARRIER and write OUTPUT as PNG.
#[derive(Parser)]
#[command(name = "pixstash", version, about)]
struct Cli {
    /// Carrier image
    carrier: PathBuf,

    /// File to hide
    #[arg(requires = "output")]
    payload: Option<PathBuf>,

    /// Output image (extension is forced to .png)
    output: Option<PathBuf>,

    /// Directory extracted files are saved into
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Fill unused low bits with random noise when embedding
    #[arg(long)]
    fill_random: bool,

    /// Accept any UTF-8 filename, not only plain filename characters
    #[arg(long)]
    no_filename_check: bool,

    /// Worker threads for large reads (default: all cores)
    #[arg(long)]
    workers: Option<usize>,

    /// Reads longer than this many bytes run in parallel
    #[arg(long, default_value_t = DEFAULT_PARALLEL_THRESHOLD)]
    parallel_threshold: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let cfg = StegoConfig {
        padding: if cli.fill_random {
            Padding::RandomNoise
        } else {
            Padding::Preserve
        },
        filename_check: if cli.no_filename_check {
            FilenameCheck::Utf8Only
        } else {
            FilenameCheck::Whitelist
        },
        parallel_threshold: cli.parallel_threshold,
        workers: cli.workers,
    };

    if !cli.carrier.is_file() {
        anyhow::bail!("file '{}' not found", cli.carrier.display());
    }

    let carrier = Carrier::open(&cli.carrier)
        .with_context(|| format!("'{}' is not a valid image file", cli.carrier.display()))?;
    let file_size = std::fs::metadata(&cli.carrier)?.len();
    print_capacity(&cli.carrier, file_size, &CapacityReport::for_carrier(&carrier));

    let start = Instant::now();

    match (cli.payload, cli.output) {
        (Some(payload_path), Some(output)) => {
            if !payload_path.is_file() {
                anyhow::bail!("file '{}' not found", payload_path.display());
            }
            let report = encode_file(carrier, &payload_path, &output, &cfg)?;
            println!(
                "Payload '{}' ({} packed) encoded into '{}' using {}, result saved as '{}'.",
                payload_path.display(),
                HumanBytes(report.packed_size as u64),
                cli.carrier.display(),
                report.level,
                report.output.display()
            );
        }
        _ => match decode_file(&carrier, &cli.output_dir, &cfg)? {
            Some(report) => println!(
                "File '{}' ({}) found encoded as {}, saved to '{}'.",
                report.filename,
                HumanBytes(report.size as u64),
                report.level,
                report.path.display()
            ),
            None => println!("No payload detected in '{}'.", cli.carrier.display()),
        },
    }
    println!("Took {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}

fn print_capacity(path: &std::path::Path, file_size: u64, report: &CapacityReport) {
    println!(
        "'{}' has file size {} and dimensions {}x{} ({} pixels).",
        path.display(),
        HumanBytes(file_size),
        report.width,
        report.height,
        report.pixels
    );
    println!("Payload storage capacities (including payload header):");
    for level in Level::ALL {
        match report.range(level) {
            Some((0, high)) => println!("  {}: up to {}", level, HumanBytes(high as u64)),
            Some((low, high)) => println!(
                "  {}: {} to {}",
                level,
                HumanBytes(low as u64),
                HumanBytes(high as u64)
            ),
            None => println!("  {}: never used", level),
        }
    }
}
