//! Aggregation: turn the cleaned dataset into the KPI tables every report
//! is built from.
//!
//! Pure functions of their input — no I/O, no clock reads — so two runs
//! over identical input produce identical tables. Rows without a parseable
//! date stay in the overall summary but are excluded from the monthly
//! trend, variance and drilldown buckets (there is no month to put them
//! in).

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use crate::cleaning::{CANON_COST, CANON_DATE, CANON_PRODUCT, CANON_REGION, CANON_REVENUE, CANON_UNITS};
use crate::core::{Dataset, DrillRow, ExecInsights, KpiTables, Summary, TrendRow, VarianceRow};

/// Label used when a drilldown dimension is missing for a row.
pub const UNKNOWN_KEY: &str = "Unknown";

#[derive(Default, Clone, Copy)]
struct Accumulator {
    revenue: f64,
    cost: f64,
    gross_profit: f64,
    units: f64,
}

impl Accumulator {
    fn add(&mut self, revenue: Option<f64>, cost: Option<f64>, units: Option<f64>) {
        if let Some(r) = revenue {
            self.revenue += r;
        }
        if let Some(c) = cost {
            self.cost += c;
        }
        // Per-row gross profit needs both sides present.
        if let (Some(r), Some(c)) = (revenue, cost) {
            self.gross_profit += r - c;
        }
        if let Some(u) = units {
            self.units += u;
        }
    }

    fn margin(&self) -> Option<f64> {
        if self.revenue != 0.0 {
            Some(self.gross_profit / self.revenue)
        } else {
            None
        }
    }
}

fn month_bucket(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Build all KPI tables from the cleaned dataset.
pub fn build_tables(ds: &Dataset) -> KpiTables {
    let mut overall = Accumulator::default();
    let mut monthly: BTreeMap<NaiveDate, Accumulator> = BTreeMap::new();
    let mut by_region: BTreeMap<(NaiveDate, String), Accumulator> = BTreeMap::new();
    let mut by_product: BTreeMap<(NaiveDate, String), Accumulator> = BTreeMap::new();

    for row in 0..ds.len() {
        let revenue = ds.cell(row, CANON_REVENUE).as_number();
        let cost = ds.cell(row, CANON_COST).as_number();
        let units = ds.cell(row, CANON_UNITS).as_number();
        overall.add(revenue, cost, units);

        let Some(month) = ds.cell(row, CANON_DATE).as_date().map(month_bucket) else {
            continue;
        };
        monthly.entry(month).or_default().add(revenue, cost, units);

        let region = dimension_key(ds, row, CANON_REGION);
        by_region
            .entry((month, region))
            .or_default()
            .add(revenue, cost, units);

        let product = dimension_key(ds, row, CANON_PRODUCT);
        by_product
            .entry((month, product))
            .or_default()
            .add(revenue, cost, units);
    }

    let summary = Summary {
        revenue: overall.revenue,
        cost: overall.cost,
        gross_profit: overall.gross_profit,
        margin: overall.margin(),
        units: overall.units,
        rows_loaded: ds.len(),
    };

    let trends: Vec<TrendRow> = monthly
        .iter()
        .map(|(&month, acc)| TrendRow {
            month,
            revenue: acc.revenue,
            cost: acc.cost,
            gross_profit: acc.gross_profit,
            units: acc.units,
            margin: acc.margin(),
        })
        .collect();

    let variance = build_variance(&trends);

    KpiTables {
        summary,
        trends,
        variance,
        by_region: drill_rows(by_region),
        by_product: drill_rows(by_product),
    }
}

fn dimension_key(ds: &Dataset, row: usize, column: &str) -> String {
    match ds.cell(row, column) {
        v if v.is_null() => UNKNOWN_KEY.to_string(),
        v => v.render(),
    }
}

fn drill_rows(map: BTreeMap<(NaiveDate, String), Accumulator>) -> Vec<DrillRow> {
    map.into_iter()
        .map(|((month, key), acc)| DrillRow {
            month,
            key,
            revenue: acc.revenue,
            gross_profit: acc.gross_profit,
        })
        .collect()
}

fn delta(current: f64, previous: Option<f64>) -> (Option<f64>, Option<f64>) {
    match previous {
        Some(prev) => {
            let abs = current - prev;
            let pct = if prev != 0.0 { Some(abs / prev) } else { None };
            (Some(abs), pct)
        }
        None => (None, None),
    }
}

fn option_delta(current: Option<f64>, previous: Option<f64>) -> (Option<f64>, Option<f64>) {
    match (current, previous) {
        (Some(cur), Some(prev)) => delta(cur, Some(prev)),
        _ => (None, None),
    }
}

/// Month-over-month variance rows derived from the trend table.
fn build_variance(trends: &[TrendRow]) -> Vec<VarianceRow> {
    let mut rows = Vec::with_capacity(trends.len());
    for (i, t) in trends.iter().enumerate() {
        let prev = if i > 0 { Some(&trends[i - 1]) } else { None };

        let (revenue_mom_abs, revenue_mom_pct) = delta(t.revenue, prev.map(|p| p.revenue));
        let (cost_mom_abs, cost_mom_pct) = delta(t.cost, prev.map(|p| p.cost));
        let (gross_profit_mom_abs, gross_profit_mom_pct) =
            delta(t.gross_profit, prev.map(|p| p.gross_profit));
        let (units_mom_abs, units_mom_pct) = delta(t.units, prev.map(|p| p.units));
        let (margin_mom_abs, margin_mom_pct) =
            option_delta(t.margin, prev.and_then(|p| p.margin));

        rows.push(VarianceRow {
            month: t.month,
            revenue: t.revenue,
            cost: t.cost,
            gross_profit: t.gross_profit,
            units: t.units,
            margin: t.margin,
            revenue_mom_abs,
            revenue_mom_pct,
            cost_mom_abs,
            cost_mom_pct,
            gross_profit_mom_abs,
            gross_profit_mom_pct,
            units_mom_abs,
            units_mom_pct,
            margin_mom_abs,
            margin_mom_pct,
        });
    }
    rows
}

/// Headline numbers for the executive summary sheet and the PDF cover.
pub fn build_insights(tables: &KpiTables) -> ExecInsights {
    let latest_month = tables.trends.last().map(|t| t.month);

    let revenue_mom_pct = tables
        .variance
        .iter()
        .rev()
        .find_map(|v| v.revenue_mom_pct);
    let margin_mom_abs = tables.variance.iter().rev().find_map(|v| v.margin_mom_abs);

    let top_in = |rows: &[DrillRow]| -> Option<(String, f64)> {
        let latest = latest_month?;
        rows.iter()
            .filter(|r| r.month == latest)
            .max_by(|a, b| a.revenue.total_cmp(&b.revenue))
            .map(|r| (r.key.clone(), r.revenue))
    };

    ExecInsights {
        latest_month,
        rows_loaded: tables.summary.rows_loaded,
        revenue_mom_pct,
        margin_mom_abs,
        top_region: top_in(&tables.by_region),
        top_product: top_in(&tables.by_product),
    }
}
