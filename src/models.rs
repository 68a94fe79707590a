use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A transaction extracted from a statement, after categorization and
/// ID assignment.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: String,
    pub date: String,
    pub description: String,
    pub amount: f64,
    pub category: String,
}

/// A categorization rule: `*` in the pattern matches any run of characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub pattern: String,
    pub category: String,
}

/// The result of parsing one statement.
#[derive(Debug, Serialize)]
pub struct ParseResult {
    pub count: usize,
    pub items: Vec<Transaction>,
    pub totals: BTreeMap<String, f64>,
}

/// Intermediate representation from an extraction strategy, before
/// categorization and ID assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub date: String,
    pub description: String,
    pub amount: f64,
}

/// One positioned run of text recovered from a PDF page.
#[derive(Debug, Clone)]
pub struct TextFragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// Fragments sharing one rounded-baseline bucket, ordered left to right.
#[derive(Debug, Clone)]
pub struct TokenLine {
    pub y: i64,
    pub fragments: Vec<TextFragment>,
}

impl TokenLine {
    /// Textual form of the line: fragment strings joined by single spaces
    /// with repeated whitespace collapsed.
    pub fn text(&self) -> String {
        let joined = self
            .fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        joined.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
