use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cmd;

use cmd::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    let res = match &cli.command {
        Commands::Show(a) => a.run(),
        Commands::Faults(a) => a.run(),
        Commands::Atpg(a) => a.run(),
        Commands::Coverage(a) => a.run(),
    };
    if let Err(e) = res {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
