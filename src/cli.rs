//! Command-line interface definitions and argument parsing

use clap::Parser;

/// Draw a cluster profile (snake plot) from normalized customer metrics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file (identifier, cluster label and metric columns)
    #[arg(short, long, default_value = "data.csv")]
    pub input: String,

    /// Column holding the customer identifier
    #[arg(long, default_value = "CustomerID")]
    pub id_column: String,

    /// Column holding the cluster label
    #[arg(long, default_value = "Cluster")]
    pub label_column: String,

    /// Metric columns to plot, comma-separated, in axis order
    #[arg(short, long, default_value = "Recency,Frequency,Monetary")]
    pub metrics: String,

    /// Output path for the plot (.png or .svg)
    #[arg(short, long, default_value = "snake_plot.png")]
    pub output: String,

    /// Also write the long-format table to this CSV path
    #[arg(long)]
    pub long_output: Option<String>,

    /// Standardize (z-score) the metric columns before plotting
    #[arg(long)]
    pub standardize: bool,

    /// Figure width in pixels
    #[arg(long, default_value = "1500")]
    pub width: u32,

    /// Figure height in pixels
    #[arg(long, default_value = "400")]
    pub height: u32,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse metric names from the comma-separated metrics string
    pub fn metric_names(&self) -> crate::Result<Vec<&str>> {
        let names: Vec<&str> = self
            .metrics
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();

        if names.is_empty() {
            anyhow::bail!("At least one metric name is required");
        }
        Ok(names)
    }
}
