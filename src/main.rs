mod cli;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cli::check::CheckArgs;
use cli::dump::DumpArgs;
use cli::run::RunArgs;

#[derive(Parser)]
#[command(
    name = "voxscript",
    version,
    about = "Compile and run wire-connected voxel block scripts"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile every prefab and report errors
    Check(CheckArgs),
    /// Print the compiled AST listing and its fingerprint
    Dump(DumpArgs),
    /// Run frames in the headless host, printing inspections and effects
    Run(RunArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Check(args) => cli::check::cmd_check(args),
        Command::Dump(args) => cli::dump::cmd_dump(args),
        Command::Run(args) => cli::run::cmd_run(args),
    }
}
