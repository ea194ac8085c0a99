use bytemut_core::config::{BytemutConfig, MutationSettings};
use bytemut_core::fuzzer::{FuzzRun, FuzzRunError};
use bytemut_core::mutator::MutationError;
use bytemut_core::seedfile::SeedFile;

use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Deterministic byte-mutation fuzzer", long_about = None)]
struct Cli {
    #[clap(short, long, value_parser)]
    config_file: Option<PathBuf>,
    #[clap(short, long)]
    seed_file: Option<PathBuf>,
    #[clap(short, long)]
    output_dir: Option<PathBuf>,
    #[clap(short, long)]
    iterations: Option<u64>,
    #[clap(long)]
    start_iteration: Option<u64>,
    #[clap(long)]
    ratio_min: Option<f64>,
    #[clap(long)]
    ratio_max: Option<f64>,
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match cli.config_file {
        Some(config_path) => {
            println!("Loading configuration from specified path: {config_path:?}");
            BytemutConfig::load_from_file(&config_path)?
        }
        None => {
            let default_config_path = PathBuf::from("bytemut.toml");
            if default_config_path.exists() {
                println!(
                    "No config file specified via CLI, loading default: {default_config_path:?}"
                );
                BytemutConfig::load_from_file(&default_config_path)?
            } else {
                println!(
                    "No config file specified and default 'bytemut.toml' not found, using built-in defaults."
                );
                BytemutConfig::default()
            }
        }
    };

    if let Some(seed_file) = cli.seed_file {
        config.campaign.seed_file = Some(seed_file);
    }
    if let Some(output_dir) = cli.output_dir {
        config.campaign.output_dir = output_dir;
    }
    if let Some(iterations) = cli.iterations {
        config.campaign.iterations = iterations;
    }
    if let Some(start) = cli.start_iteration {
        config.campaign.start_iteration = start;
    }
    if cli.ratio_min.is_some() || cli.ratio_max.is_some() {
        let ratio_min = cli.ratio_min.unwrap_or(config.mutation.band.min());
        let ratio_max = cli.ratio_max.unwrap_or(config.mutation.band.max());
        let exclude_ranges = config
            .mutation
            .exclusions
            .ranges()
            .iter()
            .map(|range| (range.start(), range.end()))
            .collect();
        config.mutation = MutationSettings::new(ratio_min, ratio_max, Some(exclude_ranges))?;
    }

    println!("Effective configuration: {config:#?}");

    let seed_path = config
        .campaign
        .seed_file
        .clone()
        .ok_or_else(|| anyhow::anyhow!("No seed file given (use --seed-file or [campaign] seed-file)"))?;
    let seed = SeedFile::new(seed_path);
    let campaign = &config.campaign;
    let first = campaign.start_iteration;
    let last = first.saturating_add(campaign.iterations);

    println!(
        "Fuzzing {:?} for iterations {first}..{last} into {:?}",
        seed.path(),
        campaign.output_dir
    );
    let start_time = Instant::now();
    let mut ratio_sum = 0.0;
    let mut written = 0u64;

    for iteration in first..last {
        let mut run = FuzzRun::new(
            &seed,
            &campaign.output_dir,
            iteration,
            config.mutation.clone(),
        );
        match run.run() {
            Ok(_) => {}
            Err(FuzzRunError::Mutation(e @ MutationError::Unfuzzable { .. })) => {
                error!("{e}; adjust exclude-ranges for this seed");
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        }
        let path = run.save()?;
        ratio_sum += run.fuzzed_byte_ratio().unwrap_or(0.0);
        written += 1;
        info!("wrote {path:?}");
    }

    let elapsed_total = start_time.elapsed();
    println!("\nCampaign finished in {elapsed_total:.2?}.");
    if written > 0 {
        println!(
            "Outputs written: {}, mean mutation ratio: {:.4}, minimizable: {}",
            written,
            ratio_sum / written as f64,
            FuzzRun::<SeedFile>::IS_MINIMIZABLE
        );
    } else {
        println!("No iterations requested, nothing written.");
    }

    Ok(())
}
