//! Snakeplot: cluster profile plots from normalized RFM metrics
//!
//! This is the main entrypoint that orchestrates data loading, optional
//! standardization, reshaping and rendering.

use anyhow::Result;
use clap::Parser;
use snakeplot::viz::{self, Figure, PlotStyle};
use snakeplot::{
    load_metrics_table, reshape_for_profile_plot, split_profile_inputs, standardize_columns,
    write_long_table, Args, ProfileColumns,
};
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_logging(args.verbose);

    run_pipeline(&args)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Load, reshape and plot
fn run_pipeline(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let metric_names = args.metric_names()?;

    // Step 1: Load data
    info!(input = %args.input, "loading metrics table");
    let df = load_metrics_table(&args.input)?;
    let mut inputs = split_profile_inputs(&df, &args.id_column, &args.label_column)?;
    info!(customers = inputs.identifiers.len(), "data loaded");

    // Step 2: Optional standardization
    if args.standardize {
        let (scaled, scaler) = standardize_columns(&inputs.metrics, &metric_names)?;
        debug!(mean = ?scaler.mean, std = ?scaler.std, "fitted standard scaler");
        inputs.metrics = scaled;
    }

    // Step 3: Reshape to long format
    let long = reshape_for_profile_plot(
        &inputs.metrics,
        &inputs.labels,
        &inputs.identifiers,
        &metric_names,
    )?;
    info!(rows = long.height(), "reshaped to long format");

    if let Some(path) = &args.long_output {
        write_long_table(&long, path)?;
    }

    // Step 4: Summarize and render
    let figure = Figure::new(&args.output, (args.width, args.height));
    let profiles = viz::render_snake_plot(
        &long,
        &ProfileColumns::default(),
        &metric_names,
        &figure,
        &PlotStyle::default(),
    )?;
    viz::print_profile_table(&profiles, &metric_names);

    info!(
        elapsed_secs = start_time.elapsed().as_secs_f64(),
        "pipeline complete"
    );
    println!("\nSnake plot saved to: {}", figure.path().display());
    if let Some(path) = &args.long_output {
        println!("Long table saved to: {}", path);
    }

    Ok(())
}
