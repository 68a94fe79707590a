use comfy_table::{Cell, Table};

use crate::error::{BankrecError, Result};
use crate::models::Rule;
use crate::rules_store::{ImportMode, RuleSelector, RuleStore};
use crate::settings::data_dir;

fn store() -> RuleStore {
    RuleStore::open(&data_dir())
}

pub fn list(lang: &str) -> Result<()> {
    let rules = store().load(lang)?;
    let mut table = Table::new();
    table.set_header(vec!["#", "Pattern", "Category"]);
    for (i, rule) in rules.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i),
            Cell::new(&rule.pattern),
            Cell::new(&rule.category),
        ]);
    }
    println!("Rules ({lang})\n{table}");
    Ok(())
}

pub fn add(pattern: &str, category: &str, lang: &str) -> Result<()> {
    store().add(
        lang,
        Rule {
            pattern: pattern.to_string(),
            category: category.to_string(),
        },
    )?;
    println!("Added rule: '{pattern}' \u{2192} {category}");
    Ok(())
}

pub fn remove(index: Option<usize>, pattern: Option<&str>, lang: &str) -> Result<()> {
    let selector = match (index, pattern) {
        (Some(i), _) => RuleSelector::Index(i),
        (None, Some(p)) => RuleSelector::Pattern(p.to_string()),
        (None, None) => {
            return Err(BankrecError::Rules(
                "either --index or --pattern is required".to_string(),
            ))
        }
    };
    store().remove(lang, &selector)?;
    println!("Removed rule.");
    Ok(())
}

pub fn import(file: &str, mode: &str, lang: &str) -> Result<()> {
    let mode = match mode {
        "replace" => ImportMode::Replace,
        "merge" => ImportMode::Merge,
        other => {
            return Err(BankrecError::Rules(format!(
                "unknown import mode '{other}' (expected 'replace' or 'merge')"
            )))
        }
    };
    let text = std::fs::read_to_string(file)?;
    let outcome = store().import(lang, &text, mode)?;
    println!(
        "Imported {} rules, rule set now has {}",
        outcome.imported, outcome.total
    );
    Ok(())
}

pub fn export(output: Option<&str>, lang: &str) -> Result<()> {
    let csv = store().export(lang)?;
    match output {
        Some(path) => {
            std::fs::write(path, &csv)?;
            println!("Exported rules to {path}");
        }
        None => print!("{csv}"),
    }
    Ok(())
}
