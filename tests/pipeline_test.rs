//! End-to-end pipeline tests over real files in a temp directory.

use std::fs;
use std::path::{Path, PathBuf};

use indoc::indoc;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use reportpack::cleaning;
use reportpack::commands::{run_pipeline, RunOptions};
use reportpack::config::{AppConfig, Overrides};
use reportpack::errors::PipelineError;
use reportpack::ingest;
use reportpack::kpis;

const SAMPLE_CSV: &str = indoc! {"
    Date,Sales($),Cost,Qty,State,SKU
    2024-01-10,1000.00,600.00,10,NSW,Widget
    2024-01-20,500.00,300.00,5,VIC,Gadget
    2024-02-05,1500.00,800.00,12,NSW,Widget
    2024-02-18,,200.00,3,QLD,Sprocket
    not a date,750.00,400.00,6,VIC,Widget
"};

fn write_workspace(dir: &Path) -> PathBuf {
    let input_dir = dir.join("in");
    fs::create_dir_all(&input_dir).unwrap();
    fs::write(input_dir.join("sales.csv"), SAMPLE_CSV).unwrap();

    let config_path = dir.join("config.yaml");
    fs::write(
        &config_path,
        format!(
            "input_dir: {}\nout_dir: {}\nmake_pdf: false\nwrite_charts: false\n",
            input_dir.display(),
            dir.join("out").display()
        ),
    )
    .unwrap();
    config_path
}

fn run_in(dir: &Path) -> reportpack::commands::RunReport {
    run_pipeline(&RunOptions {
        config_path: write_workspace(dir),
        overrides: Overrides::default(),
    })
    .unwrap()
}

#[test]
fn run_produces_core_artifacts() {
    let tmp = TempDir::new().unwrap();
    let report = run_in(tmp.path());

    let out = tmp.path().join("out");
    assert!(out.join("report_pack.xlsx").exists());
    assert!(out.join("data_quality.xlsx").exists());
    assert!(out.join("cleaned_data.csv").exists());
    assert!(out.join("run_log.txt").exists());
    // PDF and charts were toggled off.
    assert!(!out.join("report.pdf").exists());
    assert!(!out.join("charts").exists());

    assert!(report.outcomes.iter().all(|o| o.succeeded()));
}

#[test]
fn row_accounting_is_conserved() {
    let tmp = TempDir::new().unwrap();
    let report = run_in(tmp.path());

    // 5 ingested; the blank-revenue row is dropped, the bad-date row kept.
    assert_eq!(report.ingested_rows, 5);
    assert_eq!(report.dropped_rows, 1);
    assert_eq!(report.cleaned_rows + report.dropped_rows, report.ingested_rows);
}

#[test]
fn cleaned_csv_reflects_alias_mapping() {
    let tmp = TempDir::new().unwrap();
    run_in(tmp.path());

    let csv = fs::read_to_string(tmp.path().join("out/cleaned_data.csv")).unwrap();
    let header = csv.lines().next().unwrap();
    assert!(header.contains("revenue"));
    assert!(header.contains("units"));
    assert!(header.contains("region"));
    assert!(header.contains("product"));
    assert!(header.contains("source_file"));
    assert!(!header.contains("Sales"));
}

#[test]
fn aggregation_is_deterministic_across_runs() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_workspace(tmp.path());
    let config = AppConfig::resolve(&config_path, &Overrides::default()).unwrap();

    let tables = |cfg: &AppConfig| {
        let raw = ingest::read_all(&cfg.input_dir).unwrap();
        let outcome = cleaning::clean(&raw, &cfg.merged_aliases(), cfg.drop_duplicates);
        kpis::build_tables(&outcome.dataset)
    };

    let first = serde_json::to_string(&tables(&config)).unwrap();
    let second = serde_json::to_string(&tables(&config)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_config_is_fatal_and_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("nope.yaml");

    let err = run_pipeline(&RunOptions {
        config_path,
        overrides: Overrides::default(),
    })
    .unwrap_err();

    assert!(err.downcast_ref::<PipelineError>().is_some());
    // The output directory must not have been created.
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn empty_input_directory_is_fatal_but_logged() {
    let tmp = TempDir::new().unwrap();
    let input_dir = tmp.path().join("in");
    fs::create_dir_all(&input_dir).unwrap();
    let out_dir = tmp.path().join("out");
    let config_path = tmp.path().join("config.yaml");
    fs::write(
        &config_path,
        format!(
            "input_dir: {}\nout_dir: {}\n",
            input_dir.display(),
            out_dir.display()
        ),
    )
    .unwrap();

    let err = run_pipeline(&RunOptions {
        config_path,
        overrides: Overrides::default(),
    })
    .unwrap_err();
    assert!(err.downcast_ref::<PipelineError>().is_some());

    // The abort happened after the output directory existed, so the run
    // log records it.
    let log = fs::read_to_string(out_dir.join("run_log.txt")).unwrap();
    assert!(log.contains("fatal"));
}

#[test]
fn writer_failure_does_not_block_other_artifacts() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_workspace(tmp.path());
    let out_dir = tmp.path().join("out");

    // A directory squatting on the cleaned-CSV path makes that writer fail.
    fs::create_dir_all(out_dir.join("cleaned_data.csv")).unwrap();

    let report = run_pipeline(&RunOptions {
        config_path,
        overrides: Overrides::default(),
    })
    .unwrap();

    assert!(report.failed_artifacts().contains(&"cleaned csv"));
    assert!(out_dir.join("report_pack.xlsx").exists());
    assert!(out_dir.join("data_quality.xlsx").exists());

    let log = fs::read_to_string(out_dir.join("run_log.txt")).unwrap();
    assert!(log.contains("cleaned csv failed"));
}

#[test]
fn cli_overrides_replace_configured_values() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_workspace(tmp.path());
    let other_out = tmp.path().join("elsewhere");

    let report = run_pipeline(&RunOptions {
        config_path,
        overrides: Overrides {
            out_dir: Some(other_out.clone()),
            currency_code: Some("usd".to_string()),
            ..Overrides::default()
        },
    })
    .unwrap();

    assert_eq!(report.out_dir, other_out);
    assert!(other_out.join("report_pack.xlsx").exists());
}
