//! Chart renderer (`charts/*.png`).
//!
//! Renders monthly trend lines (revenue, gross profit, margin) and
//! latest-month bar charts (revenue by region / product, top 12). Returns
//! the created paths so the PDF writer can embed them. Skips a chart when
//! its series is empty rather than failing the whole artifact.

use anyhow::anyhow;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use super::{month_label, ReportContext, ReportWriter};
use crate::core::DrillRow;

pub const CHARTS_DIR: &str = "charts";

const CHART_SIZE: (u32, u32) = (900, 540);
const BAR_TOP_N: usize = 12;

pub struct ChartWriter;

impl ReportWriter for ChartWriter {
    fn artifact(&self) -> &'static str {
        "charts"
    }

    // Charts also render when only the PDF wants them embedded.
    fn enabled(&self, config: &crate::config::AppConfig) -> bool {
        config.write_charts || config.make_pdf
    }

    fn write(&self, ctx: &ReportContext) -> anyhow::Result<Vec<PathBuf>> {
        let dir = ctx.out_dir.join(CHARTS_DIR);
        crate::io::ensure_dir(&dir)?;
        let mut created = Vec::new();

        let labels: Vec<String> = ctx.tables.trends.iter().map(|t| month_label(t.month)).collect();

        let trend_series: [(&str, &str, Vec<Option<f64>>); 3] = [
            (
                "trend_revenue.png",
                "Revenue Trend",
                ctx.tables.trends.iter().map(|t| Some(t.revenue)).collect(),
            ),
            (
                "trend_gross_profit.png",
                "Gross Profit Trend",
                ctx.tables
                    .trends
                    .iter()
                    .map(|t| Some(t.gross_profit))
                    .collect(),
            ),
            (
                "trend_margin.png",
                "Margin Trend",
                ctx.tables.trends.iter().map(|t| t.margin).collect(),
            ),
        ];
        for (file, title, series) in trend_series {
            let path = dir.join(file);
            if draw_line_chart(&path, title, &labels, &series)? {
                created.push(path);
            }
        }

        if let Some(latest) = ctx.insights.latest_month {
            let latest_label = month_label(latest);
            let bars: [(&str, &str, &[DrillRow]); 2] = [
                (
                    "latest_month_revenue_by_region.png",
                    "Revenue by Region",
                    &ctx.tables.by_region,
                ),
                (
                    "latest_month_revenue_by_product.png",
                    "Revenue by Product",
                    &ctx.tables.by_product,
                ),
            ];
            for (file, title, rows) in bars {
                let mut series: Vec<(String, f64)> = rows
                    .iter()
                    .filter(|r| r.month == latest)
                    .map(|r| (r.key.clone(), r.revenue))
                    .collect();
                series.sort_by(|a, b| b.1.total_cmp(&a.1));
                series.truncate(BAR_TOP_N);

                let path = dir.join(file);
                let full_title = format!("{title} ({latest_label})");
                if draw_bar_chart(&path, &full_title, &series)? {
                    created.push(path);
                }
            }
        }

        Ok(created)
    }
}

fn chart_err(path: &Path, err: impl std::fmt::Display) -> anyhow::Error {
    anyhow!("render {}: {err}", path.display())
}

/// Render a line chart; returns false (and renders nothing) when the
/// series has no plottable points.
fn draw_line_chart(
    path: &Path,
    title: &str,
    labels: &[String],
    series: &[Option<f64>],
) -> anyhow::Result<bool> {
    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
        .collect();
    if points.is_empty() {
        return Ok(false);
    }

    let (y_min, y_max) = padded_range(points.iter().map(|p| p.1));
    let x_max = (labels.len().max(1) - 1) as f64;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| chart_err(path, e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(48)
        .y_label_area_size(72)
        .build_cartesian_2d(-0.5..x_max + 0.5, y_min..y_max)
        .map_err(|e| chart_err(path, e))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|x| {
            let idx = x.round() as i64;
            if idx >= 0 && (x - idx as f64).abs() < 0.25 {
                labels.get(idx as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .x_desc("Month")
        .draw()
        .map_err(|e| chart_err(path, e))?;

    chart
        .draw_series(LineSeries::new(points.clone(), &BLUE))
        .map_err(|e| chart_err(path, e))?;
    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 3, BLUE.filled())))
        .map_err(|e| chart_err(path, e))?;

    root.present().map_err(|e| chart_err(path, e))?;
    Ok(true)
}

fn draw_bar_chart(path: &Path, title: &str, series: &[(String, f64)]) -> anyhow::Result<bool> {
    if series.is_empty() {
        return Ok(false);
    }

    let (_, y_max) = padded_range(series.iter().map(|s| s.1));
    let y_min = series.iter().map(|s| s.1).fold(0.0_f64, f64::min);

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| chart_err(path, e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(64)
        .y_label_area_size(72)
        .build_cartesian_2d(-0.5..series.len() as f64 - 0.5, y_min..y_max)
        .map_err(|e| chart_err(path, e))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(series.len())
        .x_label_formatter(&|x| {
            let idx = x.round() as i64;
            if idx >= 0 && (x - idx as f64).abs() < 0.25 {
                series
                    .get(idx as usize)
                    .map(|s| s.0.clone())
                    .unwrap_or_default()
            } else {
                String::new()
            }
        })
        .draw()
        .map_err(|e| chart_err(path, e))?;

    chart
        .draw_series(series.iter().enumerate().map(|(i, (_, v))| {
            Rectangle::new(
                [(i as f64 - 0.35, 0.0), (i as f64 + 0.35, *v)],
                BLUE.filled(),
            )
        }))
        .map_err(|e| chart_err(path, e))?;

    root.present().map_err(|e| chart_err(path, e))?;
    Ok(true)
}

fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let span = (max - min).abs();
    let pad = if span == 0.0 { max.abs().max(1.0) * 0.1 } else { span * 0.1 };
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_range_expands_flat_series() {
        let (min, max) = padded_range([5.0, 5.0].into_iter());
        assert!(min < 5.0 && max > 5.0);
    }

    #[test]
    fn padded_range_defaults_when_empty() {
        assert_eq!(padded_range(std::iter::empty()), (0.0, 1.0));
    }
}
