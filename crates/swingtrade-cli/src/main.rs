mod commands;
mod config;
mod obs;
mod output;

use clap::{Parser, Subcommand};
use commands::Command;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "swingtrade")]
#[command(about = "Swing-trading simulator over historical OHLCV data", version, arg_required_else_help = true)]
#[command(
    after_help = "Examples:\n  swingtrade simulate --config configs/sample.toml --out runs/\n  swingtrade validate --config configs/sample.toml --strict\n  swingtrade bounds --config configs/sample.toml\n  swingtrade report --input runs/<run_id>/\n"
)]
struct Cli {
    /// Log filter (overridden by SWINGTRADE_LOG).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// Log output format: text or json.
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
    /// Serve Prometheus metrics on host:port.
    #[arg(long, global = true)]
    metrics_addr: Option<String>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run a strategy over the configured series and write run artifacts.
    Simulate {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Load and clean the configured CSVs and print data quality.
    Validate {
        #[arg(long)]
        config: PathBuf,
        /// Fail when any row was dropped or trading days are missing.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Print the usable date range of each configured frequency.
    Bounds {
        #[arg(long)]
        config: PathBuf,
    },
    /// Recompute and print the summary of a finished run.
    Report {
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() {
    output::print_banner();
    let cli = Cli::parse();

    if let Err(err) = obs::init_tracing(&cli.log_level, &cli.log_format) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
    if let Err(err) = obs::init_metrics(cli.metrics_addr.as_deref()) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }

    let command = match cli.command {
        CliCommand::Simulate { config, out } => Command::Simulate { config, out },
        CliCommand::Validate { config, strict } => Command::Validate { config, strict },
        CliCommand::Bounds { config } => Command::Bounds { config },
        CliCommand::Report { input } => Command::Report { input },
    };

    if let Err(err) = commands::run(command) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
