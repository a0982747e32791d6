#![allow(clippy::print_stderr)]

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;

use exscope_cli::args::{CliArgs, OutputFormat};
use exscope_cli::driver::{self, EXIT_FAILURE, EXIT_SUCCESS};
use exscope_cli::reporter::{Reporter, render_json};
use exscope_cli::{config, tracing_config};

fn main() -> ExitCode {
    // No-op unless EXSCOPE_LOG or RUST_LOG is set.
    tracing_config::init_tracing();

    let args = CliArgs::parse();
    match run(&args) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(args: &CliArgs) -> Result<u8> {
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;

    if args.show_config {
        let options = config::resolve_options(args, &cwd)?;
        println!("{}", serde_json::to_string_pretty(&options)?);
        return Ok(EXIT_SUCCESS);
    }

    let result = driver::run(args, &cwd)?;
    match args.format {
        OutputFormat::Text => {
            let color = args
                .pretty
                .unwrap_or_else(|| std::io::stdout().is_terminal());
            print!("{}", Reporter::new(color).render_result(&result));
        }
        OutputFormat::Json => println!("{}", render_json(&result)?),
    }
    Ok(result.exit_code())
}
