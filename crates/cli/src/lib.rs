pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "printquote",
    about = "Printquote operator CLI",
    long_about = "Inspect configuration, validate the price table, and price web-order forms offline.",
    after_help = "Examples:\n  printquote doctor --json\n  printquote config\n  printquote quote order.json\n  printquote tiers --item ドライTシャツ"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config and the price table, and report readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Price a web-order form without starting the server")]
    Quote {
        #[arg(help = "Path to a web-order form JSON document")]
        form: PathBuf,
        #[arg(long, help = "Emit the full quote record as JSON")]
        json: bool,
    },
    #[command(about = "List the resolved price tiers")]
    Tiers {
        #[arg(long, help = "Only list tiers for this item")]
        item: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Quote { form, json } => commands::quote::run(&form, json),
        Command::Tiers { item } => commands::tiers::run(item.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
