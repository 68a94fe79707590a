pub mod parse;
pub mod rules;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bankrec",
    about = "Parse bank statements and categorize transactions with pattern rules."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a statement (PDF, XLSX/XLS or CSV) and print categorized transactions.
    Parse {
        /// Path to the statement file
        file: String,
        /// Rule set language key
        #[arg(long, default_value = "en")]
        lang: String,
        /// Password for encrypted PDFs
        #[arg(long)]
        password: Option<String>,
        /// Use an explicit rules CSV instead of the stored rule set
        #[arg(long = "rules-file")]
        rules_file: Option<String>,
        /// Print the full parse result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage categorization rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// List the rules for a language.
    List {
        #[arg(long, default_value = "en")]
        lang: String,
    },
    /// Add a rule. '*' in the pattern matches any run of characters.
    Add {
        /// Pattern to match against transaction descriptions, e.g. '*KAUFLAND*'
        pattern: String,
        /// Category to assign
        category: String,
        #[arg(long, default_value = "en")]
        lang: String,
    },
    /// Remove a rule by index or by pattern.
    Remove {
        /// Zero-based index as shown by `rules list`
        #[arg(long, conflicts_with = "pattern")]
        index: Option<usize>,
        /// Exact pattern (case-insensitive)
        #[arg(long)]
        pattern: Option<String>,
        #[arg(long, default_value = "en")]
        lang: String,
    },
    /// Import rules from a CSV file.
    Import {
        /// Path to a `pattern,category` CSV file
        file: String,
        /// 'replace' the rule set or 'merge' new patterns into it
        #[arg(long, default_value = "replace")]
        mode: String,
        #[arg(long, default_value = "en")]
        lang: String,
    },
    /// Export rules as CSV.
    Export {
        /// Output path (default: stdout)
        #[arg(long)]
        output: Option<String>,
        #[arg(long, default_value = "en")]
        lang: String,
    },
}
