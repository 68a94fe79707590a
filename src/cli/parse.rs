use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::{BankrecError, Result};
use crate::fmt;
use crate::models::Rule;
use crate::parse::{parse_statement, ParseOptions};
use crate::rules_store::{parse_rules_csv, RuleStore};
use crate::settings::data_dir;

pub fn run(
    file: &str,
    lang: &str,
    password: Option<&str>,
    rules_file: Option<&str>,
    json: bool,
) -> Result<()> {
    let bytes = std::fs::read(file)?;
    let rules: Vec<Rule> = match rules_file {
        Some(path) => parse_rules_csv(&std::fs::read_to_string(path)?),
        None => RuleStore::open(&data_dir()).load(lang)?,
    };
    let original_name = Path::new(file)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file);
    let options = ParseOptions {
        password: password.map(str::to_string),
    };

    let result = parse_statement(&bytes, original_name, &rules, &options)?;

    if json {
        let rendered = serde_json::to_string_pretty(&result)
            .map_err(|e| BankrecError::Other(e.to_string()))?;
        println!("{rendered}");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Amount", "Category"]);
    for tx in &result.items {
        let rendered = fmt::amount(tx.amount);
        let amount_cell = if tx.amount < 0.0 {
            Cell::new(rendered.red())
        } else {
            Cell::new(rendered)
        };
        table.add_row(vec![
            Cell::new(&tx.id),
            Cell::new(&tx.date),
            Cell::new(&tx.description),
            amount_cell,
            Cell::new(&tx.category),
        ]);
    }
    println!("{} transactions\n{table}", result.count);

    let mut totals = Table::new();
    totals.set_header(vec!["Category", "Total"]);
    for (category, total) in &result.totals {
        totals.add_row(vec![Cell::new(category), Cell::new(fmt::amount(*total))]);
    }
    println!("\nTotals\n{totals}");
    Ok(())
}
