mod amount;
mod categorize;
mod cli;
mod error;
mod extract;
mod fmt;
mod models;
mod parse;
mod pdf;
mod rules_store;
mod segment;
mod settings;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands, RulesCommands};
use error::BankrecError;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            file,
            lang,
            password,
            rules_file,
            json,
        } => cli::parse::run(
            &file,
            &lang,
            password.as_deref(),
            rules_file.as_deref(),
            json,
        ),
        Commands::Rules { command } => match command {
            RulesCommands::List { lang } => cli::rules::list(&lang),
            RulesCommands::Add {
                pattern,
                category,
                lang,
            } => cli::rules::add(&pattern, &category, &lang),
            RulesCommands::Remove {
                index,
                pattern,
                lang,
            } => cli::rules::remove(index, pattern.as_deref(), &lang),
            RulesCommands::Import { file, mode, lang } => {
                cli::rules::import(&file, &mode, &lang)
            }
            RulesCommands::Export { output, lang } => {
                cli::rules::export(output.as_deref(), &lang)
            }
        },
    };

    if let Err(e) = result {
        match e {
            // The caller-facing distinction between needing a password and
            // having the wrong one must survive to the user.
            BankrecError::PasswordRequired => {
                eprintln!("{}", "This PDF is encrypted; re-run with --password.".red())
            }
            BankrecError::PasswordIncorrect => {
                eprintln!("{}", "Incorrect PDF password.".red())
            }
            other => eprintln!("Error: {other}"),
        }
        std::process::exit(1);
    }
}
