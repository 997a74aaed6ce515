//! PDF report composer (`report.pdf`).
//!
//! Builds a stakeholder-facing document from the same KPI tables that feed
//! the Excel pack: cover block, executive insights, summary and trend
//! tables, warnings and configured notes, then the rendered chart images.
//! Font discovery walks common system font directories; a machine with no
//! usable family fails this writer only, never the run.

use anyhow::anyhow;
use chrono::Local;
use genpdf::elements::{Break, FrameCellDecorator, Image, PageBreak, Paragraph, TableLayout};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{Style, StyledString};
use genpdf::{Alignment, Document, SimplePageDecorator};
use log::warn;
use std::path::PathBuf;

use super::{fmt_currency, fmt_pct, group_thousands, month_label, ReportContext, ReportWriter};

pub const PDF_FILE: &str = "report.pdf";

const FONT_CANDIDATES: [(&str, &str); 4] = [
    ("/usr/share/fonts/truetype/liberation", "LiberationSans"),
    ("/usr/share/fonts/liberation-sans-fonts", "LiberationSans"),
    ("/System/Library/Fonts", "Helvetica"),
    ("/Library/Fonts", "Arial"),
];

pub struct PdfWriter;

impl ReportWriter for PdfWriter {
    fn artifact(&self) -> &'static str {
        "pdf report"
    }

    fn enabled(&self, config: &crate::config::AppConfig) -> bool {
        config.make_pdf
    }

    fn write(&self, ctx: &ReportContext) -> anyhow::Result<Vec<PathBuf>> {
        let path = ctx.out_dir.join(PDF_FILE);
        let mut doc = Document::new(load_font_family()?);
        doc.set_title(ctx.config.report_title.clone());

        let mut decorator = SimplePageDecorator::new();
        decorator.set_margins(20);
        doc.set_page_decorator(decorator);

        push_cover(&mut doc, ctx);
        push_insights(&mut doc, ctx)?;
        push_summary(&mut doc, ctx)?;
        push_trends(&mut doc, ctx)?;
        push_warnings_and_notes(&mut doc, ctx);
        push_charts(&mut doc, ctx);

        doc.render_to_file(&path)
            .map_err(|e| anyhow!("render {}: {e}", path.display()))?;
        Ok(vec![path])
    }
}

fn load_font_family() -> anyhow::Result<FontFamily<FontData>> {
    for (dir, name) in FONT_CANDIDATES {
        if let Ok(family) = genpdf::fonts::from_files(dir, name, None) {
            return Ok(family);
        }
    }
    Err(anyhow!(
        "no usable font family found (looked for LiberationSans/Helvetica/Arial)"
    ))
}

fn heading(text: &str, size: u8) -> Paragraph {
    Paragraph::new(StyledString::new(
        text.to_string(),
        Style::new().bold().with_font_size(size),
    ))
}

fn push_cover(doc: &mut Document, ctx: &ReportContext) {
    doc.push(heading(&ctx.config.report_title, 20));
    if !ctx.config.report_subtitle.is_empty() {
        doc.push(Paragraph::new(ctx.config.report_subtitle.clone()));
    }
    doc.push(Break::new(1));
    doc.push(Paragraph::new(format!(
        "Generated: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )));
    doc.push(Paragraph::new(format!("Source: {}", ctx.source_label)));
    doc.push(Paragraph::new(format!(
        "Currency: {}",
        ctx.config.currency_code
    )));
    doc.push(Break::new(1));
}

fn two_column_table(rows: &[(String, String)]) -> anyhow::Result<TableLayout> {
    let mut table = TableLayout::new(vec![2, 1]);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));
    for (label, value) in rows {
        table
            .row()
            .element(Paragraph::new(label.clone()))
            .element(Paragraph::new(value.clone()))
            .push()
            .map_err(|e| anyhow!("table row: {e}"))?;
    }
    Ok(table)
}

fn na_or<T>(value: Option<T>, fmt: impl Fn(T) -> String) -> String {
    value.map(fmt).unwrap_or_else(|| "N/A".to_string())
}

fn push_insights(doc: &mut Document, ctx: &ReportContext) -> anyhow::Result<()> {
    let code = &ctx.config.currency_code;
    let insights = ctx.insights;
    let latest_label = na_or(insights.latest_month, month_label);

    let mut rows = vec![
        ("Latest month".to_string(), latest_label.clone()),
        (
            "Rows loaded".to_string(),
            insights.rows_loaded.to_string(),
        ),
        (
            "Revenue MoM".to_string(),
            na_or(insights.revenue_mom_pct, fmt_pct),
        ),
        (
            "Margin change (MoM)".to_string(),
            na_or(insights.margin_mom_abs, fmt_bps),
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
                    key.clone(),
                ));
                rows.push((
                    format!("Top {dim} revenue ({latest_label})"),
                    fmt_currency(code, *revenue),
                ));
            }
            None => rows.push((
                format!("Top {dim} by revenue ({latest_label})"),
                "N/A".to_string(),
            )),
        }
    }

    doc.push(heading("Executive Insights", 14));
    doc.push(Break::new(0.5));
    doc.push(two_column_table(&rows)?);
    doc.push(Break::new(1));
    Ok(())
}

/// Margin deltas read better in basis points ("-45 bps") than "-0.45%".
fn fmt_bps(ratio: f64) -> String {
    let bps = ratio * 10_000.0;
    let sign = if bps > 0.0 { "+" } else { "" };
    format!("{sign}{bps:.0} bps")
}

fn push_summary(doc: &mut Document, ctx: &ReportContext) -> anyhow::Result<()> {
    let code = &ctx.config.currency_code;
    let s = &ctx.tables.summary;
    let rows = vec![
        ("Revenue".to_string(), fmt_currency(code, s.revenue)),
        ("Cost".to_string(), fmt_currency(code, s.cost)),
        (
            "Gross profit".to_string(),
            fmt_currency(code, s.gross_profit),
        ),
        ("Margin".to_string(), na_or(s.margin, fmt_pct)),
        ("Units".to_string(), group_thousands(s.units)),
        ("Rows aggregated".to_string(), s.rows_loaded.to_string()),
    ];
    doc.push(heading("Summary", 14));
    doc.push(Break::new(0.5));
    doc.push(two_column_table(&rows)?);
    doc.push(Break::new(1));
    Ok(())
}

fn push_trends(doc: &mut Document, ctx: &ReportContext) -> anyhow::Result<()> {
    if ctx.tables.trends.is_empty() {
        return Ok(());
    }
    let code = &ctx.config.currency_code;
    let bold = Style::new().bold();

    let mut table = TableLayout::new(vec![1, 1, 1, 1, 1]);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));
    table
        .row()
        .element(Paragraph::new(StyledString::new("Month", bold.clone())))
        .element(Paragraph::new(StyledString::new("Revenue", bold.clone())))
        .element(Paragraph::new(StyledString::new("Cost", bold.clone())))
        .element(Paragraph::new(StyledString::new("Gross profit", bold.clone())))
        .element(Paragraph::new(StyledString::new("Margin", bold)))
        .push()
        .map_err(|e| anyhow!("trend header: {e}"))?;
    for t in &ctx.tables.trends {
        table
            .row()
            .element(Paragraph::new(month_label(t.month)))
            .element(Paragraph::new(fmt_currency(code, t.revenue)))
            .element(Paragraph::new(fmt_currency(code, t.cost)))
            .element(Paragraph::new(fmt_currency(code, t.gross_profit)))
            .element(Paragraph::new(na_or(t.margin, fmt_pct)))
            .push()
            .map_err(|e| anyhow!("trend row: {e}"))?;
    }

    doc.push(heading("Monthly Trends", 14));
    doc.push(Break::new(0.5));
    doc.push(table);
    doc.push(Break::new(1));
    Ok(())
}

fn push_warnings_and_notes(doc: &mut Document, ctx: &ReportContext) {
    if !ctx.warnings.is_empty() {
        doc.push(heading("Data Warnings", 14));
        doc.push(Break::new(0.5));
        for warning in ctx.warnings {
            doc.push(Paragraph::new(format!("- {warning}")));
        }
        doc.push(Break::new(1));
    }
    if !ctx.config.notes.is_empty() {
        doc.push(heading("Notes", 14));
        doc.push(Break::new(0.5));
        for note in &ctx.config.notes {
            doc.push(Paragraph::new(format!("- {note}")));
        }
        doc.push(Break::new(1));
    }
}

fn push_charts(doc: &mut Document, ctx: &ReportContext) {
    if ctx.chart_paths.is_empty() {
        return;
    }
    doc.push(PageBreak::new());
    doc.push(heading("Charts", 14));
    doc.push(Break::new(0.5));
    for path in &ctx.chart_paths {
        match Image::from_path(path) {
            Ok(image) => {
                doc.push(image.with_alignment(Alignment::Center));
                doc.push(Break::new(1));
            }
            // A bad image degrades the PDF, it does not fail it.
            Err(e) => warn!("skipping chart {}: {e}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bps_formatting_signs_and_scales() {
        assert_eq!(fmt_bps(0.0045), "+45 bps");
        assert_eq!(fmt_bps(-0.0045), "-45 bps");
    }

    #[test]
    fn na_or_falls_back() {
        assert_eq!(na_or(None::<f64>, fmt_pct), "N/A");
        assert_eq!(na_or(Some(0.5), fmt_pct), "50.00%");
    }
}
