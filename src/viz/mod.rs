// src/viz/mod.rs
//! Diagnostic plot rendering
//!
//! SVG output for the three diagnostics the lab reviews: per-trial channel
//! traces split by leg, quality-metric distributions over a batch, and the
//! row-normalized confusion heatmap of a classifier run.

use std::path::Path;

use ndarray::Array2;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::config::PlotConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::ingest::Recording;
use crate::quality::QualityMetrics;

/// Right-leg channels, plotted on the upper panel.
const RIGHT_CHANNELS: [&str; 4] = ["RGM", "RBF", "RVM", "RVL"];
/// Left-leg channels, plotted on the lower panel.
const LEFT_CHANNELS: [&str; 4] = ["LGM", "LBF", "LVM", "LVL"];

const HISTOGRAM_BINS: usize = 20;

fn plot_err<E: std::fmt::Display>(err: E) -> AnalysisError {
    AnalysisError::Plot(err.to_string())
}

/// Render one trial as two stacked panels of channel traces, right leg on
/// top, with time in seconds on the x axis.
pub fn plot_trial(
    recording: &Recording,
    title: &str,
    sample_rate_hz: f32,
    config: &PlotConfig,
    path: &Path,
) -> AnalysisResult<()> {
    let root = SVGBackend::new(path, (config.width, config.panel_height * 2))
        .into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let panels = root.split_evenly((2, 1));
    draw_trace_panel(
        &panels[0],
        recording,
        &RIGHT_CHANNELS,
        "Right EMG",
        title,
        sample_rate_hz,
    )?;
    draw_trace_panel(
        &panels[1],
        recording,
        &LEFT_CHANNELS,
        "Left EMG",
        "",
        sample_rate_hz,
    )?;
    root.present().map_err(plot_err)?;
    Ok(())
}

fn draw_trace_panel(
    area: &DrawingArea<SVGBackend, Shift>,
    recording: &Recording,
    channels: &[&str],
    y_label: &str,
    caption: &str,
    sample_rate_hz: f32,
) -> AnalysisResult<()> {
    let n = recording.len();
    let t_max = (n.max(1) as f32) / sample_rate_hz;

    let mut y_min = f32::INFINITY;
    let mut y_max = f32::NEG_INFINITY;
    for name in channels {
        let column = recording
            .channel_by_name(name)
            .ok_or_else(|| AnalysisError::Plot(format!("unknown channel {:?}", name)))?;
        for &value in column.iter() {
            if value.is_finite() {
                y_min = y_min.min(value);
                y_max = y_max.max(value);
            }
        }
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = 0.0;
        y_max = 1.0;
    }
    if y_min == y_max {
        y_max = y_min + 1.0;
    }

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(32)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0f32..t_max, y_min..y_max)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("time [sec]")
        .y_desc(y_label)
        .draw()
        .map_err(plot_err)?;

    for (ix, name) in channels.iter().enumerate() {
        let column = recording
            .channel_by_name(name)
            .ok_or_else(|| AnalysisError::Plot(format!("unknown channel {:?}", name)))?;
        let color = Palette99::pick(ix).mix(0.9);
        let points: Vec<(f32, f32)> = column
            .iter()
            .enumerate()
            .map(|(t, &value)| (t as f32 / sample_rate_hz, value))
            .collect();
        chart
            .draw_series(LineSeries::new(points, &color))
            .map_err(plot_err)?
            .label(*name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.clone()));
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;
    Ok(())
}

/// Render the distribution of every quality metric over a batch as a grid
/// of histograms.
pub fn plot_quality(
    metrics: &[QualityMetrics],
    config: &PlotConfig,
    path: &Path,
) -> AnalysisResult<()> {
    let root = SVGBackend::new(path, (config.width, config.panel_height * 2))
        .into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let series: [(&str, Vec<f32>); 6] = [
        ("Length", metrics.iter().map(|m| m.length as f32).collect()),
        ("Max", metrics.iter().map(|m| m.max_in_range).collect()),
        ("Median", metrics.iter().map(|m| m.median).collect()),
        (
            "N_spikes",
            metrics.iter().map(|m| m.spike_count as f32).collect(),
        ),
        (
            "MaxFrac_zero",
            metrics.iter().map(|m| m.max_zero_frac).collect(),
        ),
        (
            "MaxFrac_repeat",
            metrics.iter().map(|m| m.max_repeat_frac).collect(),
        ),
    ];

    let panels = root.split_evenly((2, 3));
    for (panel, (name, values)) in panels.iter().zip(series.iter()) {
        draw_histogram_panel(panel, name, values)?;
    }
    root.present().map_err(plot_err)?;
    Ok(())
}

fn draw_histogram_panel(
    area: &DrawingArea<SVGBackend, Shift>,
    name: &str,
    values: &[f32],
) -> AnalysisResult<()> {
    let Some((low, bin_width, counts)) = histogram_bins(values, HISTOGRAM_BINS) else {
        // nothing finite to show, leave the panel with just its caption
        return area.titled(name, ("sans-serif", 20)).map(|_| ()).map_err(plot_err);
    };
    let top = *counts.iter().max().unwrap_or(&1) as u32;
    let x_max = low + bin_width * counts.len() as f32;

    let mut chart = ChartBuilder::on(area)
        .caption(name, ("sans-serif", 20))
        .margin(8)
        .x_label_area_size(28)
        .y_label_area_size(40)
        .build_cartesian_2d(low..x_max, 0u32..top + 1)
        .map_err(plot_err)?;
    chart.configure_mesh().draw().map_err(plot_err)?;

    chart
        .draw_series(counts.iter().enumerate().map(|(bin, &count)| {
            let x0 = low + bin as f32 * bin_width;
            let x1 = x0 + bin_width;
            Rectangle::new([(x0, 0), (x1, count as u32)], BLUE.mix(0.5).filled())
        }))
        .map_err(plot_err)?;
    Ok(())
}

/// Bin finite values into `n_bins` equal-width buckets.
///
/// Returns `(low, bin_width, counts)`, or `None` when no finite values
/// exist. A degenerate all-equal input gets a unit-wide single bucket.
fn histogram_bins(values: &[f32], n_bins: usize) -> Option<(f32, f32, Vec<usize>)> {
    let finite: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || n_bins == 0 {
        return None;
    }
    let low = finite.iter().copied().fold(f32::INFINITY, f32::min);
    let high = finite.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let bin_width = if high > low {
        (high - low) / n_bins as f32
    } else {
        1.0
    };

    let mut counts = vec![0usize; n_bins];
    for value in finite {
        let bin = (((value - low) / bin_width) as usize).min(n_bins - 1);
        counts[bin] += 1;
    }
    Some((low, bin_width, counts))
}

/// Render a row-normalized confusion matrix as a heatmap with per-cell
/// fraction labels.
pub fn plot_confusion(
    fractions: &Array2<f32>,
    classes: &[String],
    config: &PlotConfig,
    path: &Path,
) -> AnalysisResult<()> {
    let n = classes.len();
    if fractions.nrows() != n || fractions.ncols() != n {
        return Err(AnalysisError::Plot(format!(
            "matrix is {}x{} but there are {} classes",
            fractions.nrows(),
            fractions.ncols(),
            n
        )));
    }
    let side = config.panel_height * 2;
    let root = SVGBackend::new(path, (side, side)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let label_of = |v: &f32| -> String {
        classes
            .get(v.floor() as usize)
            .cloned()
            .unwrap_or_default()
    };
    let mut chart = ChartBuilder::on(&root)
        .caption("Confusion (row fractions)", ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(36)
        .y_label_area_size(72)
        .build_cartesian_2d(0.0f32..n as f32, 0.0f32..n as f32)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&label_of)
        .y_label_formatter(&label_of)
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series((0..n).flat_map(|row| {
            (0..n).map(move |col| (row, col))
        }).map(|(row, col)| {
            let value = fractions[[row, col]].clamp(0.0, 1.0);
            let shade = (255.0 * (1.0 - value)) as u8;
            let color = RGBColor(shade, shade, 255);
            // row 0 drawn at the top
            let y = (n - 1 - row) as f32;
            Rectangle::new(
                [(col as f32, y), (col as f32 + 1.0, y + 1.0)],
                color.filled(),
            )
        }))
        .map_err(plot_err)?;

    chart
        .draw_series((0..n).flat_map(|row| {
            (0..n).map(move |col| (row, col))
        }).map(|(row, col)| {
            let value = fractions[[row, col]];
            let y = (n - 1 - row) as f32;
            Text::new(
                format!("{:.2}", value),
                (col as f32 + 0.35, y + 0.55),
                ("sans-serif", 16).into_font().color(&BLACK),
            )
        }))
        .map_err(plot_err)?;
    root.present().map_err(plot_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_bins_cover_range() {
        let values = [0.0f32, 1.0, 2.0, 3.0, 10.0];
        let (low, width, counts) = histogram_bins(&values, 5).unwrap();
        assert_eq!(low, 0.0);
        assert!((width - 2.0).abs() < 1e-6);
        assert_eq!(counts.iter().sum::<usize>(), 5);
        // 10.0 lands in the last bucket
        assert_eq!(counts[4], 1);
    }

    #[test]
    fn test_histogram_bins_skip_nan() {
        let values = [1.0f32, f32::NAN, 2.0];
        let (_, _, counts) = histogram_bins(&values, 4).unwrap();
        assert_eq!(counts.iter().sum::<usize>(), 2);
    }

    #[test]
    fn test_histogram_bins_degenerate_input() {
        let values = [5.0f32; 8];
        let (low, width, counts) = histogram_bins(&values, 4).unwrap();
        assert_eq!(low, 5.0);
        assert_eq!(width, 1.0);
        assert_eq!(counts[0], 8);
    }

    #[test]
    fn test_histogram_bins_empty() {
        assert!(histogram_bins(&[], 4).is_none());
        assert!(histogram_bins(&[f32::NAN], 4).is_none());
    }
}
