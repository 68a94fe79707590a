use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::categorize::{categorize, compile_rules};
use crate::error::Result;
use crate::extract::extract_rows;
use crate::models::{ParseResult, ParsedRow, Rule, Transaction};

#[derive(Debug, Default, Clone)]
pub struct ParseOptions {
    pub password: Option<String>,
}

/// The one operation this crate exposes: extract transaction rows from a
/// statement file, categorize them against the supplied rules, assign
/// stable IDs and aggregate per-category totals.
pub fn parse_statement(
    bytes: &[u8],
    original_name: &str,
    rules: &[Rule],
    options: &ParseOptions,
) -> Result<ParseResult> {
    let rows = extract_rows(bytes, original_name, options)?;
    finalize_rows(rows, rules)
}

/// Categorize extracted rows and finalize them into a [`ParseResult`].
pub fn finalize_rows(rows: Vec<ParsedRow>, rules: &[Rule]) -> Result<ParseResult> {
    let compiled = compile_rules(rules)?;

    let mut items = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let category = categorize(&row.description, &compiled);
        let id = make_id(&row, index);
        items.push(Transaction {
            id,
            date: row.date,
            description: row.description,
            amount: row.amount,
            category,
        });
    }

    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for tx in &items {
        let amount = if tx.amount.is_finite() { tx.amount } else { 0.0 };
        *totals.entry(tx.category.clone()).or_default() += amount;
    }

    Ok(ParseResult {
        count: items.len(),
        items,
        totals,
    })
}

/// Deterministic ID: hash of date, description, amount and position within
/// this parse result, truncated to 12 hex chars under a constant tag.
fn make_id(row: &ParsedRow, index: usize) -> String {
    let base = format!("{}|{}|{}|{}", row.date, row.description, row.amount, index);
    let mut hasher = Sha256::new();
    hasher.update(base.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("tx_{}", &digest[..12])
}
