//! Wide-to-long reshaping of per-customer metrics for cluster profile plots
//!
//! A metrics table holds one row per customer and one column per metric. The
//! profile plot wants one row per (customer, metric) pair, carrying the
//! customer's identifier and cluster label alongside the metric name and
//! value. Rows come out customer-major, with metrics in the order requested.

use polars::prelude::*;
use tracing::debug;

use crate::error::{ProfileError, ProfileResult};

/// Metrics used for RFM segmentation
pub const DEFAULT_METRICS: [&str; 3] = ["Recency", "Frequency", "Monetary"];

/// Column names of the long table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileColumns {
    pub identifier: String,
    pub cluster: String,
    pub metric: String,
    pub value: String,
}

impl Default for ProfileColumns {
    fn default() -> Self {
        Self {
            identifier: "CustomerID".to_string(),
            cluster: "Cluster".to_string(),
            metric: "Metric".to_string(),
            value: "Value".to_string(),
        }
    }
}

/// Melt `metrics_table` into the long profile layout using the default column names
///
/// # Arguments
/// * `metrics_table` - One row per customer, containing at least `metric_names`
/// * `labels` - Cluster label per row, aligned by position
/// * `identifiers` - Customer identifier per row, aligned by position
/// * `metric_names` - Metric columns to melt, in output order
///
/// # Returns
/// * A new table with identifier, cluster, metric and value columns
pub fn reshape_for_profile_plot(
    metrics_table: &DataFrame,
    labels: &Series,
    identifiers: &Series,
    metric_names: &[&str],
) -> ProfileResult<DataFrame> {
    reshape_with_columns(
        metrics_table,
        labels,
        identifiers,
        metric_names,
        &ProfileColumns::default(),
    )
}

/// Melt `metrics_table` into the long profile layout with custom column names
pub fn reshape_with_columns(
    metrics_table: &DataFrame,
    labels: &Series,
    identifiers: &Series,
    metric_names: &[&str],
    columns: &ProfileColumns,
) -> ProfileResult<DataFrame> {
    let n_rows = metrics_table.height();
    check_row_count("labels", n_rows, labels.len())?;
    check_row_count("identifiers", n_rows, identifiers.len())?;

    let metric_values = metric_names
        .iter()
        .map(|&name| metric_column(metrics_table, name))
        .collect::<ProfileResult<Vec<_>>>()?;

    let n_metrics = metric_names.len();
    let n_out = n_rows * n_metrics;

    // Row i of the input feeds rows i*M .. i*M+M of the output
    let repeat_idx: Vec<IdxSize> = (0..n_rows)
        .flat_map(|row| std::iter::repeat(row as IdxSize).take(n_metrics))
        .collect();
    let repeat_idx = IdxCa::from_vec("", repeat_idx);

    let mut id_out = identifiers.take(&repeat_idx)?;
    id_out.rename(&columns.identifier);
    let mut cluster_out = labels.take(&repeat_idx)?;
    cluster_out.rename(&columns.cluster);

    let mut metric_out: Vec<&str> = Vec::with_capacity(n_out);
    let mut value_out: Vec<Option<f64>> = Vec::with_capacity(n_out);
    for row in 0..n_rows {
        for (name, values) in metric_names.iter().zip(&metric_values) {
            metric_out.push(*name);
            value_out.push(values[row]);
        }
    }

    debug!(
        rows = n_rows,
        metrics = n_metrics,
        long_rows = n_out,
        "reshaped metrics table to long format"
    );

    let long = DataFrame::new(vec![
        id_out,
        cluster_out,
        Series::new(&columns.metric, metric_out),
        Series::new(&columns.value, value_out),
    ])?;
    Ok(long)
}

/// Return a copy of `metrics_table` with the cluster label and identifier columns appended
///
/// The caller's table is left untouched. Existing columns with the same names
/// are replaced in the copy.
pub fn attach_cluster_columns(
    metrics_table: &DataFrame,
    labels: &Series,
    identifiers: &Series,
    columns: &ProfileColumns,
) -> ProfileResult<DataFrame> {
    let n_rows = metrics_table.height();
    check_row_count("labels", n_rows, labels.len())?;
    check_row_count("identifiers", n_rows, identifiers.len())?;

    let mut labels = labels.clone();
    labels.rename(&columns.cluster);
    let mut identifiers = identifiers.clone();
    identifiers.rename(&columns.identifier);

    let mut augmented = metrics_table.clone();
    augmented.with_column(labels)?;
    augmented.with_column(identifiers)?;
    Ok(augmented)
}

fn check_row_count(what: &'static str, expected: usize, actual: usize) -> ProfileResult<()> {
    if expected != actual {
        return Err(ProfileError::LengthMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Fetch a metric column as `f64` values, keeping nulls
fn metric_column(df: &DataFrame, name: &str) -> ProfileResult<Vec<Option<f64>>> {
    if df.get_column_index(name).is_none() {
        return Err(ProfileError::MissingColumn(name.to_string()));
    }
    let values = df.column(name)?.strict_cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}
