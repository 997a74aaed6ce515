//! Excel report pack writer (`report_pack.xlsx`).
//!
//! Sheet layout mirrors what stakeholders expect from the pack:
//! ExecutiveSummary first, then Summary, Trends, Variance (with a
//! red-yellow-green scale on the month-over-month columns) and a combined
//! Drilldowns sheet. Number formats are chosen per column name so the
//! same table writer serves every sheet.

use anyhow::Context;
use rust_xlsxwriter::{
    Color, ConditionalFormat3ColorScale, Format, FormatAlign, Workbook, Worksheet, XlsxError,
};
use std::path::PathBuf;

use super::{month_label, ReportContext, ReportWriter};
use crate::core::{DrillRow, ExecInsights, Summary};

pub const REPORT_PACK_FILE: &str = "report_pack.xlsx";

const HEADER_FILL: Color = Color::RGB(0xD9E1F2);
const SCALE_LOW: Color = Color::RGB(0xF8696B);
const SCALE_MID: Color = Color::RGB(0xFFEB84);
const SCALE_HIGH: Color = Color::RGB(0x63BE7B);

const PERCENT_FMT: &str = "0.00%";
const INT_FMT: &str = "#,##0";
const DECIMAL_FMT: &str = "#,##0.00";

const MIN_COLUMN_WIDTH: f64 = 10.0;
const MAX_COLUMN_WIDTH: f64 = 45.0;

pub struct ExcelPackWriter;

impl ReportWriter for ExcelPackWriter {
    fn artifact(&self) -> &'static str {
        "excel pack"
    }

    fn enabled(&self, config: &crate::config::AppConfig) -> bool {
        config.write_excel_pack
    }

    fn write(&self, ctx: &ReportContext) -> anyhow::Result<Vec<PathBuf>> {
        let path = ctx.out_dir.join(REPORT_PACK_FILE);
        let currency_fmt = currency_format(&ctx.config.currency_code);
        let mut workbook = Workbook::new();

        write_exec_summary_sheet(
            workbook.add_worksheet(),
            ctx.insights,
            &ctx.config.currency_code,
            &currency_fmt,
        )
        .context("executive summary sheet")?;

        write_summary_sheet(workbook.add_worksheet(), &ctx.tables.summary, &currency_fmt)
            .context("summary sheet")?;

        let trends = trends_table(ctx);
        write_table_sheet(workbook.add_worksheet(), "Trends", &trends, &currency_fmt)
            .context("trends sheet")?;

        let variance = variance_table(ctx);
        let sheet = workbook.add_worksheet();
        write_table_sheet(sheet, "Variance", &variance, &currency_fmt)
            .context("variance sheet")?;
        add_variance_color_scale(sheet, &variance).context("variance conditional format")?;

        write_drilldowns_sheet(workbook.add_worksheet(), ctx, &currency_fmt)
            .context("drilldowns sheet")?;

        workbook
            .save(&path)
            .with_context(|| format!("save {}", path.display()))?;
        Ok(vec![path])
    }
}

/// Currency format that works for any code: shows it as a text prefix.
pub(crate) fn currency_format(code: &str) -> String {
    format!("\"{code} \" #,##0.00")
}

fn is_percent_col(name: &str) -> bool {
    let n = name.to_lowercase();
    n.contains("margin") || n.ends_with("_pct")
}

fn is_int_col(name: &str) -> bool {
    let n = name.to_lowercase();
    n == "units" || n == "rows_loaded" || n.ends_with("_count")
}

fn is_currency_col(name: &str) -> bool {
    let n = name.to_lowercase();
    if n.ends_with("_mom_abs") && !n.contains("margin") && !n.contains("units") {
        return true;
    }
    ["revenue", "cost", "gross_profit"]
        .iter()
        .any(|k| n.contains(k))
        && !n.ends_with("_pct")
}

fn number_format_for(name: &str, currency_fmt: &str) -> String {
    if is_percent_col(name) {
        PERCENT_FMT.to_string()
    } else if is_int_col(name) {
        INT_FMT.to_string()
    } else if is_currency_col(name) {
        currency_fmt.to_string()
    } else {
        DECIMAL_FMT.to_string()
    }
}

/// One cell of a prepared table; months are pre-rendered as text.
#[derive(Clone, Debug)]
pub(crate) enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    fn opt(value: Option<f64>) -> Self {
        value.map_or(Cell::Empty, Cell::Number)
    }

    pub(crate) fn text(value: &str) -> Self {
        Cell::Text(value.to_string())
    }

    fn width(&self) -> usize {
        match self {
            Cell::Empty => 0,
            Cell::Text(s) => s.len(),
            Cell::Number(_) => 12,
        }
    }
}

pub(crate) struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color(HEADER_FILL)
        .set_align(FormatAlign::Center)
}

fn title_format() -> Format {
    Format::new().set_bold().set_font_size(12)
}

fn h1_format() -> Format {
    Format::new().set_bold().set_font_size(16)
}

/// Write one table starting at `first_row`, headers styled, per-column
/// number formats applied. Returns the first free row after the table.
pub(crate) fn write_table_at(
    sheet: &mut Worksheet,
    first_row: u32,
    table: &Table,
    currency_fmt: &str,
) -> Result<u32, XlsxError> {
    let header = header_format();
    let column_formats: Vec<Format> = table
        .headers
        .iter()
        .map(|name| Format::new().set_num_format(number_format_for(name, currency_fmt)))
        .collect();

    for (col, name) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(first_row, col as u16, name, &header)?;
    }
    for (i, row) in table.rows.iter().enumerate() {
        let r = first_row + 1 + i as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    sheet.write_string(r, col as u16, s)?;
                }
                Cell::Number(n) => {
                    sheet.write_number_with_format(r, col as u16, *n, &column_formats[col])?;
                }
            }
        }
    }

    fit_columns(sheet, table)?;
    Ok(first_row + 1 + table.rows.len() as u32)
}

fn fit_columns(sheet: &mut Worksheet, table: &Table) -> Result<(), XlsxError> {
    for (col, name) in table.headers.iter().enumerate() {
        let content_max = table
            .rows
            .iter()
            .map(|row| row.get(col).map_or(0, Cell::width))
            .max()
            .unwrap_or(0)
            .max(name.len());
        let width = ((content_max + 2) as f64).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        sheet.set_column_width(col as u16, width)?;
    }
    Ok(())
}

fn write_table_sheet(
    sheet: &mut Worksheet,
    name: &str,
    table: &Table,
    currency_fmt: &str,
) -> Result<(), XlsxError> {
    sheet.set_name(name)?;
    write_table_at(sheet, 0, table, currency_fmt)?;
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_summary_sheet(
    sheet: &mut Worksheet,
    summary: &Summary,
    currency_fmt: &str,
) -> Result<(), XlsxError> {
    sheet.set_name("Summary")?;
    let header = header_format();
    sheet.write_string_with_format(0, 0, "metric", &header)?;
    sheet.write_string_with_format(0, 1, "value", &header)?;

    let currency = Format::new().set_num_format(currency_fmt);
    let percent = Format::new().set_num_format(PERCENT_FMT);
    let int = Format::new().set_num_format(INT_FMT);

    let rows: [(&str, Option<f64>, &Format); 6] = [
        ("revenue", Some(summary.revenue), &currency),
        ("cost", Some(summary.cost), &currency),
        ("gross_profit", Some(summary.gross_profit), &currency),
        ("margin", summary.margin, &percent),
        ("units", Some(summary.units), &int),
        ("rows_loaded", Some(summary.rows_loaded as f64), &int),
    ];
    for (i, (metric, value, fmt)) in rows.iter().enumerate() {
        let r = 1 + i as u32;
        sheet.write_string(r, 0, *metric)?;
        if let Some(v) = value {
            sheet.write_number_with_format(r, 1, *v, fmt)?;
        }
    }
    sheet.set_freeze_panes(1, 0)?;
    sheet.set_column_width(0, 16)?;
    sheet.set_column_width(1, 18)?;
    Ok(())
}

fn write_exec_summary_sheet(
    sheet: &mut Worksheet,
    insights: &ExecInsights,
    currency_code: &str,
    currency_fmt: &str,
) -> Result<(), XlsxError> {
    sheet.set_name("ExecutiveSummary")?;
    sheet.write_string_with_format(0, 0, "Executive Summary", &h1_format())?;
    sheet.write_string(1, 0, "Auto-generated highlights for stakeholders")?;

    let header = header_format();
    let percent = Format::new().set_num_format(PERCENT_FMT);
    let currency = Format::new().set_num_format(currency_fmt);
    let int = Format::new().set_num_format(INT_FMT);

    let latest_label = insights
        .latest_month
        .map(month_label)
        .unwrap_or_else(|| "N/A".to_string());

    let mut rows: Vec<(String, Cell, Option<&Format>)> = vec![
        ("Latest month".into(), Cell::Text(latest_label.clone()), None),
        (
            "Rows loaded".into(),
            Cell::Number(insights.rows_loaded as f64),
            Some(&int),
        ),
        (
            "Revenue MoM".into(),
            Cell::opt(insights.revenue_mom_pct),
            Some(&percent),
        ),
        (
            "Margin change (MoM)".into(),
            Cell::opt(insights.margin_mom_abs),
            Some(&percent),
        ),
    ];
    for (dim, top) in [
        ("region", &insights.top_region),
        ("product", &insights.top_product),
    ] {
        match top {
            Some((key, revenue)) => {
                rows.push((
                    format!("Top {dim} by revenue ({latest_label})"),
                    Cell::Text(key.clone()),
                    None,
                ));
                rows.push((
                    format!("Top {dim} revenue ({latest_label})"),
                    Cell::Number(*revenue),
                    Some(&currency),
                ));
            }
            None => rows.push((
                format!("Top {dim} by revenue ({latest_label})"),
                Cell::Text("N/A".into()),
                None,
            )),
        }
    }
    rows.push(("Currency".into(), Cell::Text(currency_code.into()), None));

    const TABLE_START: u32 = 3;
    sheet.write_string_with_format(TABLE_START, 0, "Insight", &header)?;
    sheet.write_string_with_format(TABLE_START, 1, "Value", &header)?;
    for (i, (label, cell, fmt)) in rows.iter().enumerate() {
        let r = TABLE_START + 1 + i as u32;
        sheet.write_string(r, 0, label)?;
        match (cell, fmt) {
            (Cell::Empty, _) => {
                sheet.write_string(r, 1, "N/A")?;
            }
            (Cell::Text(s), _) => {
                sheet.write_string(r, 1, s)?;
            }
            (Cell::Number(n), Some(fmt)) => {
                sheet.write_number_with_format(r, 1, *n, fmt)?;
            }
            (Cell::Number(n), None) => {
                sheet.write_number(r, 1, *n)?;
            }
        }
    }
    sheet.set_freeze_panes(TABLE_START + 1, 0)?;
    sheet.set_column_width(0, 34)?;
    sheet.set_column_width(1, 18)?;
    Ok(())
}

fn trends_table(ctx: &ReportContext) -> Table {
    let headers = ["month", "revenue", "cost", "gross_profit", "units", "margin"]
        .map(String::from)
        .to_vec();
    let rows = ctx
        .tables
        .trends
        .iter()
        .map(|t| {
            vec![
                Cell::Text(month_label(t.month)),
                Cell::Number(t.revenue),
                Cell::Number(t.cost),
                Cell::Number(t.gross_profit),
                Cell::Number(t.units),
                Cell::opt(t.margin),
            ]
        })
        .collect();
    Table { headers, rows }
}

fn variance_table(ctx: &ReportContext) -> Table {
    let mut headers = vec![
        "month".to_string(),
        "revenue".to_string(),
        "cost".to_string(),
        "gross_profit".to_string(),
        "units".to_string(),
        "margin".to_string(),
    ];
    for metric in ["revenue", "cost", "gross_profit", "units", "margin"] {
        headers.push(format!("{metric}_mom_abs"));
        headers.push(format!("{metric}_mom_pct"));
    }

    let rows = ctx
        .tables
        .variance
        .iter()
        .map(|v| {
            vec![
                Cell::Text(month_label(v.month)),
                Cell::Number(v.revenue),
                Cell::Number(v.cost),
                Cell::Number(v.gross_profit),
                Cell::Number(v.units),
                Cell::opt(v.margin),
                Cell::opt(v.revenue_mom_abs),
                Cell::opt(v.revenue_mom_pct),
                Cell::opt(v.cost_mom_abs),
                Cell::opt(v.cost_mom_pct),
                Cell::opt(v.gross_profit_mom_abs),
                Cell::opt(v.gross_profit_mom_pct),
                Cell::opt(v.units_mom_abs),
                Cell::opt(v.units_mom_pct),
                Cell::opt(v.margin_mom_abs),
                Cell::opt(v.margin_mom_pct),
            ]
        })
        .collect();
    Table { headers, rows }
}

/// Red/yellow/green scale over the month-over-month delta columns.
fn add_variance_color_scale(sheet: &mut Worksheet, table: &Table) -> Result<(), XlsxError> {
    if table.rows.is_empty() {
        return Ok(());
    }
    let last_row = table.rows.len() as u32;
    let scale = ConditionalFormat3ColorScale::new()
        .set_minimum_color(SCALE_LOW)
        .set_midpoint_color(SCALE_MID)
        .set_maximum_color(SCALE_HIGH);
    for (col, name) in table.headers.iter().enumerate() {
        if name.ends_with("_mom_abs") || name.ends_with("_mom_pct") {
            sheet.add_conditional_format(1, col as u16, last_row, col as u16, &scale)?;
        }
    }
    Ok(())
}

fn drill_table(rows: &[DrillRow], dim: &str) -> Table {
    Table {
        headers: ["month", dim, "revenue", "gross_profit"]
            .map(String::from)
            .to_vec(),
        rows: rows
            .iter()
            .map(|r| {
                vec![
                    Cell::Text(month_label(r.month)),
                    Cell::Text(r.key.clone()),
                    Cell::Number(r.revenue),
                    Cell::Number(r.gross_profit),
                ]
            })
            .collect(),
    }
}

fn write_drilldowns_sheet(
    sheet: &mut Worksheet,
    ctx: &ReportContext,
    currency_fmt: &str,
) -> Result<(), XlsxError> {
    sheet.set_name("Drilldowns")?;
    let title = title_format();

    let mut row: u32 = 0;
    if !ctx.warnings.is_empty() {
        sheet.write_string_with_format(0, 0, "WARNINGS", &title)?;
        for (i, warning) in ctx.warnings.iter().enumerate() {
            sheet.write_string(1 + i as u32, 0, warning)?;
        }
        row = ctx.warnings.len() as u32 + 2;
    }

    sheet.write_string_with_format(row, 0, "Revenue & GP by Month x Region", &title)?;
    row = write_table_at(
        sheet,
        row + 2,
        &drill_table(&ctx.tables.by_region, "region"),
        currency_fmt,
    )?;

    sheet.write_string_with_format(row + 1, 0, "Revenue & GP by Month x Product", &title)?;
    write_table_at(
        sheet,
        row + 3,
        &drill_table(&ctx.tables.by_product, "product"),
        currency_fmt,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_format_embeds_code_as_text() {
        assert_eq!(currency_format("USD"), "\"USD \" #,##0.00");
    }

    #[test]
    fn column_classification_matches_naming_scheme() {
        assert!(is_percent_col("margin"));
        assert!(is_percent_col("revenue_mom_pct"));
        assert!(is_int_col("units"));
        assert!(is_int_col("rows_loaded"));
        assert!(is_currency_col("revenue"));
        assert!(is_currency_col("gross_profit_mom_abs"));
        assert!(!is_currency_col("units_mom_abs"));
        assert!(!is_currency_col("revenue_mom_pct"));
    }

    #[test]
    fn number_format_precedence_is_percent_int_currency() {
        let cur = currency_format("AUD");
        assert_eq!(number_format_for("margin_mom_pct", &cur), PERCENT_FMT);
        assert_eq!(number_format_for("units", &cur), INT_FMT);
        assert_eq!(number_format_for("cost", &cur), cur);
        assert_eq!(number_format_for("other", &cur), DECIMAL_FMT);
    }
}
