//! stacktest - Acceptance-test harness for infrastructure-as-code stacks

use clap::Parser;
use stacktest::commands::Commands;
use stacktest::{cli, common::logging};

#[derive(Parser)]
#[command(name = "stacktest", about = "Acceptance-test harness for infrastructure-as-code stacks")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    logging::init_cli();

    let cli = Cli::parse();

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
