use std::sync::OnceLock;

use regex::Regex;

use crate::amount::normalize_amount;
use crate::models::{ParsedRow, TokenLine};

// Day/month-like groups separated by '.', '/' or '-' with a 2-or-4-digit
// year, or an ISO date. First (leftmost) match in a line wins.
const DATE_PATTERN: &str = r"\b(\d{2}[./-]\d{2}[./-]\d{2,4}|\d{4}-\d{2}-\d{2})\b";

// Optional sign, digits either grouped in triples or a bare run, and a
// mandatory 2-digit fraction. Only end-anchored occurrences qualify a line
// as carrying a transaction amount.
const AMOUNT_PATTERN: &str =
    r"[+-]?[0-9]{1,3}(?:[.,][0-9]{3})*(?:[.,][0-9]{2})|[+-]?[0-9]+(?:[.,][0-9]{2})";

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DATE_PATTERN).unwrap())
}

fn trailing_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("(?:{AMOUNT_PATTERN})$")).unwrap())
}

fn exact_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("^(?:{AMOUNT_PATTERN})$")).unwrap())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn append_continuation(rows: &mut [ParsedRow], extra: &str) {
    if extra.is_empty() {
        return;
    }
    if let Some(last) = rows.last_mut() {
        if last.description.is_empty() {
            last.description = extra.to_string();
        } else {
            last.description.push(' ');
            last.description.push_str(extra);
        }
    }
}

/// Segment plain text lines into transaction rows.
///
/// A line with both a date and a trailing amount opens a new transaction;
/// a line with neither is a continuation appended to the open transaction's
/// description; a line with exactly one of the two is noise and is dropped
/// without closing the open transaction.
pub fn segment_lines<S: AsRef<str>>(lines: &[S]) -> Vec<ParsedRow> {
    let mut rows: Vec<ParsedRow> = Vec::new();
    for line in lines {
        let text = line.as_ref().trim();
        if text.is_empty() {
            continue;
        }
        let date_match = date_re().find(text);
        let amount_match = trailing_amount_re().find(text);
        match (date_match, amount_match) {
            (Some(d), Some(a)) => {
                let description = collapse_whitespace(
                    &text
                        .replacen(d.as_str(), "", 1)
                        .replacen(a.as_str(), "", 1),
                );
                rows.push(ParsedRow {
                    date: d.as_str().to_string(),
                    description,
                    amount: normalize_amount(a.as_str()),
                });
            }
            (None, None) => append_continuation(&mut rows, text),
            // Date-only or amount-only lines carry headers, balances and
            // page furniture; skip them without closing the open row.
            _ => {}
        }
    }
    rows
}

/// Segment reconstructed token lines into transaction rows.
///
/// Same classification as [`segment_lines`], but the description of a
/// transaction line is sliced from the fragments strictly between the one
/// holding the date and the one holding the amount, preserving the spacing
/// recovered from actual token positions.
pub fn segment_token_lines(lines: &[TokenLine]) -> Vec<ParsedRow> {
    let mut rows: Vec<ParsedRow> = Vec::new();
    for line in lines {
        let text = line.text();
        if text.is_empty() {
            continue;
        }
        let date_match = date_re().find(&text);
        let amount_match = trailing_amount_re().find(&text);
        match (date_match, amount_match) {
            (Some(d), Some(a)) => {
                let date = d.as_str();
                let amount_str = a.as_str();
                let date_idx = line
                    .fragments
                    .iter()
                    .position(|f| f.text.contains(date))
                    .unwrap_or(0);
                // Rightmost fragment that is, or ends with, the amount.
                let Some(amount_idx) = line.fragments.iter().rposition(|f| {
                    let s = f.text.trim();
                    exact_amount_re().is_match(s) || s.ends_with(amount_str)
                }) else {
                    continue;
                };
                let lo = (date_idx + 1).min(amount_idx);
                let hi = amount_idx.max(date_idx + 1);
                let description = collapse_whitespace(
                    &line.fragments[lo..hi]
                        .iter()
                        .map(|f| f.text.as_str())
                        .collect::<Vec<_>>()
                        .join(" "),
                );
                rows.push(ParsedRow {
                    date: date.to_string(),
                    description,
                    amount: normalize_amount(amount_str),
                });
            }
            (None, None) => append_continuation(&mut rows, &text),
            _ => {}
        }
    }
    rows
}
