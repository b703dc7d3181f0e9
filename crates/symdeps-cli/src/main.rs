use anyhow::Result;
use clap::Parser;
use symdeps::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    symdeps::init_tracing(&cli);

    let status = symdeps::run(&cli)?;
    std::process::exit(status.code());
}
