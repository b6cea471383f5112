use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::process::ExitCode;

use longan::cli::{Args, confirm_overwrite};
use longan::{FileOutcome, OptimizeOptions, Optimizer};

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let base = match &args.config {
        Some(path) => OptimizeOptions::from_yaml_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => OptimizeOptions::default(),
    };
    let options = args.apply(base);
    let optimizer = Optimizer::new(options).with_context(|| "Invalid options")?;

    if optimizer.options().overwrite && !optimizer.options().force {
        let confirmed = confirm_overwrite(&mut io::stdin().lock(), &mut io::stdout(), args.files.len())
            .with_context(|| "Failed to read confirmation")?;
        if !confirmed {
            eprintln!("Aborted, no files changed.");
            return Ok(ExitCode::FAILURE);
        }
    }

    log::info!("Optimizing {} file(s)", args.files.len());
    let outcomes = optimizer.optimize_batch(&args.files);

    let mut saved = 0u64;
    let mut failed = 0usize;
    for (path, outcome) in &outcomes {
        println!("{}: {}", path.display(), outcome);
        saved += outcome.saved_bytes();
        if let FileOutcome::Failed { .. } = outcome {
            failed += 1;
        }
    }

    if outcomes.len() > 1 {
        println!(
            "{} file(s), {} failed, {} bytes saved",
            outcomes.len(),
            failed,
            saved
        );
    }

    Ok(if failed > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
