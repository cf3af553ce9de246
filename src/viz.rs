//! Snake plot rendering using Plotters
//!
//! The long profile table is reduced to one mean per (metric, cluster) pair,
//! then drawn as one connected line per cluster across the metric axis.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use polars::prelude::*;
use tracing::{debug, info};

use crate::error::ProfileResult;
use crate::profile::ProfileColumns;

/// Color palette for different clusters
const CLUSTER_COLORS: [RGBColor; 5] = [RED, BLUE, GREEN, MAGENTA, CYAN];

/// Default figure size in pixels
pub const DEFAULT_FIGURE_SIZE: (u32, u32) = (1500, 400);

/// Mean metric values for one cluster, in metric order
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterProfile {
    /// Cluster label as text; `None` for rows with a null label
    pub label: Option<String>,
    /// Mean per metric; `None` when the cluster has no values for that metric
    pub means: Vec<Option<f64>>,
    /// Number of long-table rows that went into the means
    pub observations: usize,
}

impl ClusterProfile {
    /// Label used in legends and tables
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or("null")
    }
}

/// Cosmetic settings for the snake plot
#[derive(Debug, Clone, PartialEq)]
pub struct PlotStyle {
    pub title: Option<String>,
    pub axis_label_size: f64,
    pub tick_label_size: f64,
    pub legend_font_size: f64,
    pub line_width: u32,
    pub marker_size: u32,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            title: None,
            axis_label_size: 14.0,
            tick_label_size: 12.0,
            legend_font_size: 12.0,
            line_width: 2,
            marker_size: 4,
        }
    }
}

/// Compute the mean value of every (metric, cluster) pair in a long table
///
/// Rows whose metric is not in `metric_names` are ignored, as are null values.
/// Clusters are ordered numerically when every label is an integer and
/// lexicographically otherwise. Rows with a null label form their own
/// cluster, sorted last.
pub fn cluster_profiles(
    long: &DataFrame,
    columns: &ProfileColumns,
    metric_names: &[&str],
) -> ProfileResult<Vec<ClusterProfile>> {
    let clusters = long.column(&columns.cluster)?.cast(&DataType::String)?;
    let metrics = long.column(&columns.metric)?.cast(&DataType::String)?;
    let values = long.column(&columns.value)?.strict_cast(&DataType::Float64)?;

    let metric_index: HashMap<&str, usize> = metric_names
        .iter()
        .enumerate()
        .map(|(i, &name)| (name, i))
        .collect();

    // cluster label -> (sum, count) per metric, plus row count
    let mut sums: HashMap<Option<String>, (Vec<(f64, usize)>, usize)> = HashMap::new();

    for ((cluster, metric), value) in clusters
        .str()?
        .into_iter()
        .zip(metrics.str()?.into_iter())
        .zip(values.f64()?.into_iter())
    {
        let Some(&idx) = metric.and_then(|m| metric_index.get(m)) else {
            continue;
        };
        let entry = sums
            .entry(cluster.map(str::to_string))
            .or_insert_with(|| (vec![(0.0, 0); metric_names.len()], 0));
        entry.1 += 1;
        if let Some(value) = value {
            entry.0[idx].0 += value;
            entry.0[idx].1 += 1;
        }
    }

    let mut profiles: Vec<ClusterProfile> = sums
        .into_iter()
        .map(|(label, (acc, observations))| ClusterProfile {
            label,
            means: acc
                .into_iter()
                .map(|(sum, count)| (count > 0).then(|| sum / count as f64))
                .collect(),
            observations,
        })
        .collect();
    sort_by_label(&mut profiles);

    debug!(clusters = profiles.len(), "computed cluster profiles");
    Ok(profiles)
}

fn sort_by_label(profiles: &mut [ClusterProfile]) {
    let numeric = profiles
        .iter()
        .filter_map(|p| p.label.as_deref())
        .all(|label| label.parse::<i64>().is_ok());

    profiles.sort_by(|a, b| match (a.label.as_deref(), b.label.as_deref()) {
        (Some(a), Some(b)) if numeric => a
            .parse::<i64>()
            .unwrap_or_default()
            .cmp(&b.parse::<i64>().unwrap_or_default()),
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Pick the line color for the cluster at `index`
fn cluster_color(index: usize) -> RGBColor {
    match CLUSTER_COLORS.get(index) {
        Some(&color) => color,
        None => {
            let rgba = Palette99::pick(index).to_rgba();
            RGBColor(rgba.0, rgba.1, rgba.2)
        }
    }
}

/// Value-axis range covering every mean, with some padding
fn value_bounds(profiles: &[ClusterProfile]) -> (f64, f64) {
    let (min, max) = profiles
        .iter()
        .flat_map(|p| p.means.iter().flatten())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if !min.is_finite() || !max.is_finite() {
        return (-1.0, 1.0);
    }
    let padding = if max > min { (max - min) * 0.1 } else { 0.5 };
    (min - padding, max + padding)
}

/// A drawing target: an output file and a pixel size
///
/// Every draw call goes through an explicit figure; there is no ambient
/// "current figure".
#[derive(Debug, Clone)]
pub struct Figure {
    path: PathBuf,
    size: (u32, u32),
}

impl Figure {
    /// Create a figure writing to `path`; `.svg` paths produce SVG, anything else PNG
    pub fn new(path: impl Into<PathBuf>, size: (u32, u32)) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    fn is_svg(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
    }

    /// Draw one line per cluster across the metric axis and save the figure
    pub fn draw_snake_plot(
        &self,
        profiles: &[ClusterProfile],
        metric_names: &[&str],
        style: &PlotStyle,
    ) -> crate::Result<()> {
        if metric_names.is_empty() {
            anyhow::bail!("Cannot draw a snake plot without metrics");
        }

        if self.is_svg() {
            let root = SVGBackend::new(&self.path, self.size).into_drawing_area();
            draw_profiles(root, profiles, metric_names, style)?;
        } else {
            let root = BitMapBackend::new(&self.path, self.size).into_drawing_area();
            draw_profiles(root, profiles, metric_names, style)?;
        }

        info!(path = %self.path.display(), clusters = profiles.len(), "snake plot saved");
        Ok(())
    }
}

fn draw_profiles<DB>(
    root: DrawingArea<DB, Shift>,
    profiles: &[ClusterProfile],
    metric_names: &[&str],
    style: &PlotStyle,
) -> crate::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    // Integer ranges are inclusive, so 0..n-1 gives one segment per metric
    let last_metric = metric_names.len() as u32 - 1;
    let (y_min, y_max) = value_bounds(profiles);

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60);
    if let Some(title) = &style.title {
        builder.caption(title, ("sans-serif", style.axis_label_size + 6.0));
    }
    let mut chart =
        builder.build_cartesian_2d((0u32..last_metric).into_segmented(), y_min..y_max)?;

    let metric_label = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => metric_names
            .get(*i as usize)
            .map(|name| name.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(metric_names.len())
        .x_label_formatter(&metric_label)
        .x_desc("Metric")
        .y_desc("Value")
        .axis_desc_style(("sans-serif", style.axis_label_size))
        .label_style(("sans-serif", style.tick_label_size))
        .draw()?;

    for (i, profile) in profiles.iter().enumerate() {
        let color = cluster_color(i);
        let points: Vec<(SegmentValue<u32>, f64)> = profile
            .means
            .iter()
            .enumerate()
            .filter_map(|(m, mean)| mean.map(|v| (SegmentValue::CenterOf(m as u32), v)))
            .collect();

        let line_width = style.line_width;
        chart
            .draw_series(LineSeries::new(
                points.clone(),
                color.stroke_width(line_width),
            ))?
            .label(format!("Cluster {}", profile.display_label()))
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(line_width))
            });

        chart.draw_series(
            points
                .into_iter()
                .map(|point| Circle::new(point, style.marker_size, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .label_font(("sans-serif", style.legend_font_size))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Compute profiles from a long table and draw them on `figure`
///
/// Returns the profiles that were drawn.
pub fn render_snake_plot(
    long: &DataFrame,
    columns: &ProfileColumns,
    metric_names: &[&str],
    figure: &Figure,
    style: &PlotStyle,
) -> crate::Result<Vec<ClusterProfile>> {
    let profiles = cluster_profiles(long, columns, metric_names)?;
    figure.draw_snake_plot(&profiles, metric_names, style)?;
    Ok(profiles)
}

/// Print cluster profile means to console
pub fn print_profile_table(profiles: &[ClusterProfile], metric_names: &[&str]) {
    println!("\n=== Cluster Profiles (mean values) ===");

    let mut header = format!("  {:>8} | {:>6}", "Cluster", "Rows");
    for name in metric_names {
        header.push_str(&format!(" | {:>10}", name));
    }
    println!("{}", header);
    println!("  {}", "-".repeat(header.len().saturating_sub(2)));

    for profile in profiles {
        let mut line = format!(
            "  {:>8} | {:>6}",
            profile.display_label(),
            profile.observations
        );
        for mean in &profile.means {
            match mean {
                Some(v) => line.push_str(&format!(" | {:>10.3}", v)),
                None => line.push_str(&format!(" | {:>10}", "-")),
            }
        }
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{reshape_for_profile_plot, DEFAULT_METRICS};
    use std::path::Path;
    use tempfile::tempdir;

    fn create_long_table() -> DataFrame {
        let table = df!(
            "Recency" => &[1.0f64, 3.0, 10.0, -2.0],
            "Frequency" => &[10.0f64, 20.0, 5.0, 0.0],
            "Monetary" => &[100.0f64, 300.0, 50.0, 40.0]
        )
        .unwrap();
        let labels = Series::new("labels", &[1i32, 1, 0, 10]);
        let ids = Series::new("ids", &["A", "B", "C", "D"]);
        reshape_for_profile_plot(&table, &labels, &ids, &DEFAULT_METRICS).unwrap()
    }

    #[test]
    fn test_cluster_profile_means() {
        let long = create_long_table();
        let profiles =
            cluster_profiles(&long, &ProfileColumns::default(), &DEFAULT_METRICS).unwrap();

        let labels: Vec<&str> = profiles.iter().map(|p| p.display_label()).collect();
        assert_eq!(labels, vec!["0", "1", "10"]);

        assert_eq!(profiles[1].means, vec![Some(2.0), Some(15.0), Some(200.0)]);
        assert_eq!(profiles[1].observations, 6);
        assert_eq!(profiles[0].means, vec![Some(10.0), Some(5.0), Some(50.0)]);
    }

    #[test]
    fn test_profiles_follow_requested_metric_order() {
        let long = create_long_table();
        let profiles =
            cluster_profiles(&long, &ProfileColumns::default(), &["Monetary", "Tenure"]).unwrap();

        assert_eq!(profiles[0].means, vec![Some(50.0), None]);
        assert_eq!(profiles[0].observations, 1);
    }

    #[test]
    fn test_string_labels_sorted_lexicographically() {
        let table = df!("Recency" => &[1.0f64, 2.0, 3.0]).unwrap();
        let labels = Series::new("labels", &["loyal", "at-risk", "new"]);
        let ids = Series::new("ids", &[1i64, 2, 3]);
        let long = reshape_for_profile_plot(&table, &labels, &ids, &["Recency"]).unwrap();

        let profiles = cluster_profiles(&long, &ProfileColumns::default(), &["Recency"]).unwrap();
        let labels: Vec<&str> = profiles.iter().map(|p| p.display_label()).collect();
        assert_eq!(labels, vec!["at-risk", "loyal", "new"]);
    }

    #[test]
    fn test_null_label_kept_apart() {
        let table = df!("Recency" => &[1.0f64, 3.0, 5.0, 7.0]).unwrap();
        let labels = Series::new("labels", &[Some("null"), None, Some("null"), Some("churned")]);
        let ids = Series::new("ids", &[1i64, 2, 3, 4]);
        let long = reshape_for_profile_plot(&table, &labels, &ids, &["Recency"]).unwrap();

        let profiles = cluster_profiles(&long, &ProfileColumns::default(), &["Recency"]).unwrap();
        let labels: Vec<Option<&str>> = profiles.iter().map(|p| p.label.as_deref()).collect();
        assert_eq!(labels, vec![Some("churned"), Some("null"), None]);

        assert_eq!(profiles[1].means, vec![Some(3.0)]);
        assert_eq!(profiles[2].means, vec![Some(3.0)]);
        assert_eq!(profiles[2].observations, 1);
        assert_eq!(profiles[2].display_label(), "null");
    }

    #[test]
    fn test_null_label_sorted_after_numeric_labels() {
        let table = df!("Recency" => &[1.0f64, 2.0, 3.0]).unwrap();
        let labels = Series::new("labels", &[None, Some(2i32), Some(1)]);
        let ids = Series::new("ids", &[1i64, 2, 3]);
        let long = reshape_for_profile_plot(&table, &labels, &ids, &["Recency"]).unwrap();

        let profiles = cluster_profiles(&long, &ProfileColumns::default(), &["Recency"]).unwrap();
        let labels: Vec<Option<&str>> = profiles.iter().map(|p| p.label.as_deref()).collect();
        assert_eq!(labels, vec![Some("1"), Some("2"), None]);
    }

    #[test]
    fn test_value_bounds() {
        let profiles = vec![
            ClusterProfile {
                label: Some("0".to_string()),
                means: vec![Some(-1.0), None],
                observations: 2,
            },
            ClusterProfile {
                label: Some("1".to_string()),
                means: vec![Some(1.0), Some(0.5)],
                observations: 2,
            },
        ];
        let (lo, hi) = value_bounds(&profiles);
        assert!((lo + 1.2).abs() < 1e-12);
        assert!((hi - 1.2).abs() < 1e-12);

        assert_eq!(value_bounds(&[]), (-1.0, 1.0));
    }

    #[test]
    fn test_cluster_color_fallback() {
        assert_eq!(cluster_color(0), RED);
        let extra = cluster_color(CLUSTER_COLORS.len() + 3);
        let _ = extra.to_rgba();
    }

    #[test]
    fn test_figure_backend_selection() {
        assert!(Figure::new("plot.svg", DEFAULT_FIGURE_SIZE).is_svg());
        assert!(Figure::new("plot.SVG", DEFAULT_FIGURE_SIZE).is_svg());
        assert!(!Figure::new("plot.png", DEFAULT_FIGURE_SIZE).is_svg());
        assert_eq!(Figure::new("x.png", (10, 20)).size(), (10, 20));
    }

    #[test]
    fn test_draw_without_metrics_fails() {
        let temp_dir = tempdir().unwrap();
        let figure = Figure::new(temp_dir.path().join("empty.png"), DEFAULT_FIGURE_SIZE);
        assert!(figure
            .draw_snake_plot(&[], &[], &PlotStyle::default())
            .is_err());
    }

    #[test]
    fn test_render_snake_plot_png() {
        let long = create_long_table();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("snake.png");
        let figure = Figure::new(&output_path, DEFAULT_FIGURE_SIZE);

        let profiles = render_snake_plot(
            &long,
            &ProfileColumns::default(),
            &DEFAULT_METRICS,
            &figure,
            &PlotStyle::default(),
        )
        .unwrap();
        assert_eq!(profiles.len(), 3);
        assert!(Path::new(&output_path).exists());
    }

    #[test]
    fn test_render_snake_plot_svg() {
        let long = create_long_table();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("snake.svg");
        let profiles =
            cluster_profiles(&long, &ProfileColumns::default(), &DEFAULT_METRICS).unwrap();

        let style = PlotStyle {
            title: Some("Snake plot".to_string()),
            ..PlotStyle::default()
        };
        Figure::new(&output_path, (800, 300))
            .draw_snake_plot(&profiles, &DEFAULT_METRICS, &style)
            .unwrap();

        let svg = std::fs::read_to_string(&output_path).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_render_single_metric() {
        let long = create_long_table();
        let temp_dir = tempdir().unwrap();

        for file_name in ["recency.png", "recency.svg"] {
            let output_path = temp_dir.path().join(file_name);
            let figure = Figure::new(&output_path, (600, 300));

            let profiles = render_snake_plot(
                &long,
                &ProfileColumns::default(),
                &["Recency"],
                &figure,
                &PlotStyle::default(),
            )
            .unwrap();
            assert_eq!(profiles.len(), 3);
            assert!(profiles.iter().all(|p| p.means.len() == 1));
            assert!(output_path.exists());
        }

        let svg = std::fs::read_to_string(temp_dir.path().join("recency.svg")).unwrap();
        assert_eq!(svg.matches("<circle").count(), 3);
    }
}
