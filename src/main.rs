//! ElbowForge CLI: runs the clustering pipeline end to end
//!
//! Loads the dataset, sweeps k, persists the selected model, reports the
//! elbow and predicts the cluster of the first record.

use anyhow::{Context, Result};
use clap::Parser;
use elbowforge::{pipeline, viz, Args};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_tracing(&args);

    let config = args.pipeline_config()?;
    info!(input = %config.input.display(), k_max = config.sweep.k_max, "Starting pipeline");

    let start_time = Instant::now();
    let report = pipeline::run(&config)
        .with_context(|| format!("pipeline failed for {}", config.input.display()))?;

    println!("=== Inertia per k ===");
    for point in &report.curve.points {
        match point.sse {
            Some(sse) => println!("k={:2}  SSE={:.4}", point.k, sse),
            None => println!("k={:2}  SSE=undefined (skipped)", point.k),
        }
    }

    match report.elbow {
        Some(k) => println!("\nOptimal K = {}", k),
        None => println!("\nOptimal K = undefined (no elbow detected)"),
    }
    println!(
        "Stored model: k={} at {}",
        report.selected_k,
        config.model_dir.join(&config.model_name).display()
    );
    println!("Predicted cluster for first record: {}", report.prediction);

    if let Some(plot_path) = &args.plot {
        viz::render_elbow_curve(&report.curve, report.elbow, plot_path)
            .context("failed to render elbow curve")?;
        println!("Elbow curve saved to: {}", plot_path.display());
    }

    info!(elapsed_secs = start_time.elapsed().as_secs_f64(), "Pipeline complete");

    Ok(())
}

fn init_tracing(args: &Args) {
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}
