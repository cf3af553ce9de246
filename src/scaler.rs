//! Z-score normalization of metric columns

use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use tracing::debug;

use crate::error::{ProfileError, ProfileResult};

/// Per-column mean and standard deviation fitted on a feature matrix
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    /// Column means
    pub mean: Array1<f64>,
    /// Column population standard deviations
    pub std: Array1<f64>,
}

impl StandardScaler {
    /// Fit on a (n_samples, n_features) matrix
    pub fn fit(features: &Array2<f64>) -> Self {
        let n_features = features.ncols();
        let mean = features
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(n_features));
        let std = if features.nrows() == 0 {
            Array1::zeros(n_features)
        } else {
            features.std_axis(Axis(0), 0.0)
        };
        Self { mean, std }
    }

    /// Scale a matrix with the fitted parameters
    ///
    /// Constant columns (zero deviation) are only centred.
    pub fn transform(&self, features: &Array2<f64>) -> Array2<f64> {
        let mut scaled = features - &self.mean;
        for (mut column, &std) in scaled.axis_iter_mut(Axis(1)).zip(self.std.iter()) {
            if std > 0.0 {
                column /= std;
            }
        }
        scaled
    }

    /// Scale a single value of the feature at column `feature`
    pub fn scale_value(&self, feature: usize, value: f64) -> f64 {
        let centred = value - self.mean[feature];
        match self.std[feature] {
            std if std > 0.0 => centred / std,
            _ => centred,
        }
    }
}

/// Standardize the named columns of `df`
///
/// Returns a new frame with the metric columns replaced by their z-scores,
/// along with the fitted scaler. Means and deviations are taken over the
/// non-null values of each column, and nulls stay null.
pub fn standardize_columns(
    df: &DataFrame,
    metric_names: &[&str],
) -> ProfileResult<(DataFrame, StandardScaler)> {
    if metric_names.is_empty() {
        return Err(ProfileError::EmptyMetrics);
    }

    let mut columns = Vec::with_capacity(metric_names.len());
    for &name in metric_names {
        if df.get_column_index(name).is_none() {
            return Err(ProfileError::MissingColumn(name.to_string()));
        }
        columns.push(df.column(name)?.strict_cast(&DataType::Float64)?);
    }

    let mut mean = Vec::with_capacity(columns.len());
    let mut std = Vec::with_capacity(columns.len());
    for column in &columns {
        let values = column.f64()?;
        mean.push(values.mean().unwrap_or(0.0));
        std.push(values.std(0).unwrap_or(0.0));
    }
    let scaler = StandardScaler {
        mean: Array1::from(mean),
        std: Array1::from(std),
    };

    let mut out = df.clone();
    for (feature, (&name, column)) in metric_names.iter().zip(&columns).enumerate() {
        let scaled: Vec<Option<f64>> = column
            .f64()?
            .into_iter()
            .map(|v| v.map(|x| scaler.scale_value(feature, x)))
            .collect();
        out.with_column(Series::new(name, scaled))?;
    }

    debug!(
        samples = df.height(),
        features = metric_names.len(),
        "standardized metric columns"
    );

    Ok((out, scaler))
}
