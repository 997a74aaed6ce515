//! CLI command implementations.
//!
//! - **run**: execute the full pipeline (ingest, clean, aggregate, report)
//! - **init**: write a starter `config.yaml`
//! - **demo**: generate deterministic sample inputs and run over them

pub mod demo;
pub mod init;
pub mod run;

pub use demo::run_demo;
pub use init::init_config;
pub use run::{run_pipeline, RunOptions, RunReport};
