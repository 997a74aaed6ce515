//! The `demo` command: generate sample inputs and run the pipeline on them.
//!
//! The generated data is deterministic (fixed seed) so two demo runs
//! produce identical KPI tables. It deliberately includes the mess the
//! cleaner exists for: aliased headers, a blank revenue cell, an
//! unparseable date, serial-number dates in the workbook, and a duplicate
//! row.

use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;
use std::path::Path;

use crate::config::Overrides;
use crate::io;

use super::run::{run_pipeline, RunOptions, RunReport};

const REGIONS: [&str; 3] = ["NSW", "VIC", "QLD"];
const PRODUCTS: [&str; 3] = ["Widget", "Gadget", "Sprocket"];

/// Months covered by the generated data, as (year, month).
const MONTHS: [(i32, u32); 6] = [
    (2024, 1),
    (2024, 2),
    (2024, 3),
    (2024, 4),
    (2024, 5),
    (2024, 6),
];

pub fn run_demo(dir: &Path) -> Result<RunReport> {
    let input_dir = dir.join("data/in");
    io::ensure_dir(&input_dir)?;

    let mut rng = Lcg::new(42);
    write_sales_csv(&input_dir.join("sales_2024.csv"), &mut rng)?;
    write_channel_workbook(&input_dir.join("extra_channel.xlsx"), &mut rng)?;

    let config_path = dir.join("config.yaml");
    io::write_file(
        &config_path,
        &format!(
            "input_dir: {}\nout_dir: {}\nreport_title: Demo Reporting Pack\nnotes: Generated by the demo command.\n",
            input_dir.display(),
            dir.join("out").display()
        ),
    )?;

    println!("Demo inputs written under {}", input_dir.display());
    run_pipeline(&RunOptions {
        config_path,
        overrides: Overrides::default(),
    })
}

/// CSV with aliased, messy headers plus a few deliberately bad rows.
fn write_sales_csv(path: &Path, rng: &mut Lcg) -> Result<()> {
    let mut out = String::from("Date,Sales($),Cost,Qty,State,SKU\n");
    for (year, month) in MONTHS {
        for region in REGIONS {
            for product in PRODUCTS {
                let day = 1 + rng.below(28);
                let revenue = 800.0 + rng.below(4200) as f64 + rng.below(100) as f64 / 100.0;
                let cost = revenue * (0.55 + rng.below(20) as f64 / 100.0);
                let units = 5 + rng.below(40);
                out.push_str(&format!(
                    "{year}-{month:02}-{day:02},{revenue:.2},{cost:.2},{units},{region},{product}\n"
                ));
            }
        }
    }
    // Bad rows the cleaner should report.
    out.push_str("2024-03-15,,310.00,7,VIC,Widget\n");
    out.push_str("not a date,950.00,500.00,9,NSW,Gadget\n");
    // Exact duplicate of the line above it.
    out.push_str("2024-04-02,1200.00,640.00,12,QLD,Sprocket\n");
    out.push_str("2024-04-02,1200.00,640.00,12,QLD,Sprocket\n");

    io::write_file(path, &out)
}

/// Workbook with canonical headers and serial-number dates.
fn write_channel_workbook(path: &Path, rng: &mut Lcg) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, header) in ["date", "revenue", "cost", "units", "region", "product"]
        .iter()
        .enumerate()
    {
        sheet.write_string(0, col as u16, *header)?;
    }

    let mut row = 1u32;
    for (i, _) in MONTHS.iter().enumerate() {
        for product in PRODUCTS {
            // Serial for the 10th of each month; 45292 is 2024-01-01.
            let serial = 45292.0 + (i as f64) * 30.0 + 9.0;
            let revenue = 400.0 + rng.below(1500) as f64;
            sheet.write_number(row, 0, serial)?;
            sheet.write_number(row, 1, revenue)?;
            sheet.write_number(row, 2, revenue * 0.6)?;
            sheet.write_number(row, 3, (2 + rng.below(15)) as f64)?;
            sheet.write_string(row, 4, "Online")?;
            sheet.write_string(row, 5, product)?;
            row += 1;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("save {}", path.display()))?;
    Ok(())
}

/// Small deterministic generator; enough for demo data, nothing more.
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_mul(0x9E3779B97F4A7C15).wrapping_add(1),
        }
    }

    fn next(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state >> 33
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcg_is_deterministic() {
        let mut a = Lcg::new(42);
        let mut b = Lcg::new(42);
        for _ in 0..10 {
            assert_eq!(a.next(), b.next());
        }
    }

    #[test]
    fn demo_run_produces_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let report = run_demo(dir.path()).unwrap();
        assert!(report.cleaned_rows > 0);
        assert!(report.out_dir.join("report_pack.xlsx").exists());
        assert!(report.out_dir.join("cleaned_data.csv").exists());
        assert!(report.out_dir.join("data_quality.xlsx").exists());
        assert!(report.out_dir.join("run_log.txt").exists());
    }
}
