use regex::{Regex, RegexBuilder};

use crate::error::{BankrecError, Result};
use crate::models::Rule;

pub const UNCATEGORIZED: &str = "Uncategorized";

/// A rule compiled for one parse call: the wildcard pattern becomes an
/// anchored case-insensitive matcher over the whole description.
pub struct CompiledRule {
    matcher: Regex,
    pub category: String,
}

/// Compile rules in list order. Regex metacharacters in the pattern are
/// escaped; `*` becomes "any run of characters".
pub fn compile_rules(rules: &[Rule]) -> Result<Vec<CompiledRule>> {
    rules
        .iter()
        .map(|rule| {
            let escaped = regex::escape(&rule.pattern).replace(r"\*", ".*");
            let matcher = RegexBuilder::new(&format!("^{escaped}$"))
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    BankrecError::Rules(format!("invalid pattern '{}': {e}", rule.pattern))
                })?;
            let category = if rule.category.trim().is_empty() {
                UNCATEGORIZED.to_string()
            } else {
                rule.category.clone()
            };
            Ok(CompiledRule { matcher, category })
        })
        .collect()
}

/// First matching rule wins; no match means [`UNCATEGORIZED`].
pub fn categorize(description: &str, compiled: &[CompiledRule]) -> String {
    compiled
        .iter()
        .find(|rule| rule.matcher.is_match(description))
        .map(|rule| rule.category.clone())
        .unwrap_or_else(|| UNCATEGORIZED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, category: &str) -> Rule {
        Rule {
            pattern: pattern.to_string(),
            category: category.to_string(),
        }
    }

    #[test]
    fn test_wildcard_matches_any_run() {
        let compiled = compile_rules(&[rule("*KAUFLAND*", "Groceries")]).unwrap();
        assert_eq!(categorize("POS KAUFLAND BUCURESTI", &compiled), "Groceries");
        assert_eq!(categorize("KAUFLAND", &compiled), "Groceries");
    }

    #[test]
    fn test_match_is_anchored() {
        // Without wildcards the pattern must cover the whole description.
        let compiled = compile_rules(&[rule("KAUFLAND", "Groceries")]).unwrap();
        assert_eq!(categorize("POS KAUFLAND", &compiled), UNCATEGORIZED);
        assert_eq!(categorize("KAUFLAND", &compiled), "Groceries");
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let compiled = compile_rules(&[rule("*uber*", "Transport")]).unwrap();
        assert_eq!(categorize("UBER *TRIP HELP.UBER.COM", &compiled), "Transport");
    }

    #[test]
    fn test_first_match_wins() {
        let compiled = compile_rules(&[
            rule("*KAUFLAND*", "Groceries"),
            rule("*MART*", "Shopping"),
        ])
        .unwrap();
        assert_eq!(categorize("KAUFLAND MART", &compiled), "Groceries");
    }

    #[test]
    fn test_unmatched_is_uncategorized() {
        let compiled = compile_rules(&[rule("*LIDL*", "Groceries")]).unwrap();
        assert_eq!(categorize("RANDOM VENDOR", &compiled), UNCATEGORIZED);
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let compiled = compile_rules(&[rule("*HELP.UBER.COM*", "Transport")]).unwrap();
        assert_eq!(categorize("UBER HELPXUBERYCOM", &compiled), UNCATEGORIZED);
        assert_eq!(categorize("UBER HELP.UBER.COM", &compiled), "Transport");
    }

    #[test]
    fn test_empty_category_defaults() {
        let compiled = compile_rules(&[rule("*A*", "")]).unwrap();
        assert_eq!(categorize("CAB", &compiled), UNCATEGORIZED);
    }
}
