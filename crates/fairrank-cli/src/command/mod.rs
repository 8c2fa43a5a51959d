use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use self::{analyze::AnalyzeArg, generate::GenerateArg};

mod analyze;
mod generate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Increase log verbosity (-v: debug, -vv: trace); `RUST_LOG` takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Generate a synthetic evaluation batch
    Generate(#[clap(flatten)] GenerateArg),
    /// Run the bias pipeline on an evaluation batch
    Analyze(#[clap(flatten)] AnalyzeArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_tracing(args.verbose);
    match args.mode {
        Mode::Generate(arg) => generate::run(&arg)?,
        Mode::Analyze(arg) => analyze::run(&arg)?,
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}
