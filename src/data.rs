//! Loading metric tables and writing long tables using Polars

use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::error::{ProfileError, ProfileResult};

/// Inputs for the profile reshaper, split out of a single loaded table
#[derive(Debug, Clone)]
pub struct ProfileInputs {
    /// Remaining columns, one row per customer
    pub metrics: DataFrame,
    /// Cluster label per row
    pub labels: Series,
    /// Customer identifier per row
    pub identifiers: Series,
}

/// Load a CSV file with a header row into a DataFrame
///
/// # Arguments
/// * `file_path` - Path to the CSV file
///
/// # Returns
/// * The loaded table, with at least one row
pub fn load_metrics_table(file_path: impl AsRef<Path>) -> crate::Result<DataFrame> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        anyhow::bail!("Input file not found: {}", file_path.display());
    }

    let df = LazyCsvReader::new(file_path)
        .with_has_header(true)
        .finish()?
        .collect()?;

    if df.height() == 0 {
        anyhow::bail!("No rows found in {}", file_path.display());
    }

    info!(
        path = %file_path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded metrics table"
    );
    Ok(df)
}

/// Separate the identifier and cluster label columns from a loaded table
pub fn split_profile_inputs(
    df: &DataFrame,
    id_column: &str,
    label_column: &str,
) -> ProfileResult<ProfileInputs> {
    let identifiers = take_column(df, id_column)?;
    let labels = take_column(df, label_column)?;
    let metrics = df.drop_many(&[id_column, label_column]);

    Ok(ProfileInputs {
        metrics,
        labels,
        identifiers,
    })
}

/// Write a long profile table as CSV
pub fn write_long_table(df: &DataFrame, output_path: impl AsRef<Path>) -> crate::Result<()> {
    let output_path = output_path.as_ref();
    let mut file = File::create(output_path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df.clone())?;

    info!(path = %output_path.display(), rows = df.height(), "wrote long table");
    Ok(())
}

fn take_column(df: &DataFrame, name: &str) -> ProfileResult<Series> {
    if df.get_column_index(name).is_none() {
        return Err(ProfileError::MissingColumn(name.to_string()));
    }
    Ok(df.column(name)?.clone())
}
