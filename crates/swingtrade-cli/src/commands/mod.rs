mod bounds;
mod common;
mod report;
mod simulate;
mod validate;

use std::path::PathBuf;

pub enum Command {
    Simulate { config: PathBuf, out: Option<PathBuf> },
    Validate { config: PathBuf, strict: bool },
    Bounds { config: PathBuf },
    Report { input: PathBuf },
}

pub fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Simulate { config, out } => simulate::run_simulate(config, out),
        Command::Validate { config, strict } => validate::run_validate(config, strict),
        Command::Bounds { config } => bounds::run_bounds(config),
        Command::Report { input } => report::run_report(input),
    }
}
