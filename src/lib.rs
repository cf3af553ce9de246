//! Snakeplot: cluster profile plots for RFM customer segmentation
//!
//! Normalized per-customer metrics and externally assigned cluster labels are
//! melted into a long table (one row per customer and metric), reduced to a
//! mean per metric and cluster, and drawn as one line per cluster.

pub mod cli;
pub mod data;
pub mod error;
pub mod profile;
pub mod scaler;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{load_metrics_table, split_profile_inputs, write_long_table, ProfileInputs};
pub use error::{ProfileError, ProfileResult};
pub use profile::{
    attach_cluster_columns, reshape_for_profile_plot, reshape_with_columns, ProfileColumns,
    DEFAULT_METRICS,
};
pub use scaler::{standardize_columns, StandardScaler};
pub use viz::{cluster_profiles, render_snake_plot, ClusterProfile, Figure, PlotStyle};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
