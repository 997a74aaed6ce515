use clap::Parser;
use colored::Colorize;
use env_logger::Env;

use reportpack::cli::{Cli, Commands};
use reportpack::commands;
use reportpack::config::Overrides;
use reportpack::errors::PipelineError;

// Exit codes: 0 success, 1 unexpected failure, 2 config/ingest error.
fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            input,
            out,
            currency,
            pdf,
            no_pdf,
        } => {
            let make_pdf = match (pdf, no_pdf) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let options = commands::RunOptions {
                config_path: config,
                overrides: Overrides {
                    input_dir: input,
                    out_dir: out,
                    currency_code: currency,
                    make_pdf,
                },
            };
            commands::run_pipeline(&options).map(|_| ())
        }
        Commands::Init { force } => commands::init_config(force),
        Commands::Demo { dir } => commands::run_demo(&dir).map(|_| ()),
    };

    if let Err(e) = result {
        eprintln!("{} {e:#}", "error:".red().bold());
        let code = if e.downcast_ref::<PipelineError>().is_some() {
            2
        } else {
            1
        };
        std::process::exit(code);
    }
}
