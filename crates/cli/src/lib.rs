pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "carelog",
    about = "Carelog operator CLI",
    long_about = "Operate Carelog migrations, demo data, config inspection, readiness checks, and one-shot assistant turns.",
    after_help = "Examples:\n  carelog doctor --json\n  carelog config\n  carelog chat \"my blood sugar is 120\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo user's week of glucose, meal, and exercise history")]
    Seed,
    #[command(about = "Delete every demo row and reseed it, leaving personal data untouched")]
    ResetDemo,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, database, knowledge corpus, and language model readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Send one message through the assistant and print the reply")]
    Chat {
        #[arg(help = "The message to process, quoted")]
        message: String,
        #[arg(long, help = "Acting user name (defaults to the demo user)")]
        user: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::ResetDemo => commands::reset_demo::run(),
        Command::Config => commands::CommandResult::plain(commands::config::run()),
        Command::Doctor { json } => commands::CommandResult::plain(commands::doctor::run(json)),
        Command::Chat { message, user } => commands::chat::run(&message, user.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
