use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{BankrecError, Result};
use crate::models::Rule;

// Starter rule sets, written out on first use of a language that has no
// rules file yet.
const DEFAULT_RULES_EN: &str = "\
*GROCERY*,Food
*SUPERMARKET*,Food
*RESTAURANT*,Dining
*UBER*,Transport
*FUEL*,Transport
*AMAZON*,Shopping
*SALARY*,Income
*RENT*,Housing
*ELECTRIC*,Utilities
";

const DEFAULT_RULES_RO: &str = "\
*KAUFLAND*,Alimente
*LIDL*,Alimente
*MEGA IMAGE*,Alimente
*CARREFOUR*,Alimente
*OMV*,Transport
*PETROM*,Transport
*BOLT*,Transport
*EMAG*,Cumparaturi
*ENEL*,Utilitati
*DIGI*,Utilitati
*SALARIU*,Venit
*CHIRIE*,Locuinta
";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImportMode {
    Replace,
    Merge,
}

#[derive(Debug)]
pub enum RuleSelector {
    Index(usize),
    Pattern(String),
}

pub struct ImportOutcome {
    pub imported: usize,
    pub total: usize,
}

/// Per-language rule sets persisted as `<dir>/<lang>.csv`, one
/// `pattern,category` per line, no header, no quoting. Loaded sets are
/// cached by language key; every write invalidates the cached entry.
pub struct RuleStore {
    dir: PathBuf,
    cache: HashMap<String, Vec<Rule>>,
}

impl RuleStore {
    pub fn open(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join("rules"),
            cache: HashMap::new(),
        }
    }

    fn path_for(&self, lang: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", lang.to_lowercase()))
    }

    pub fn load(&mut self, lang: &str) -> Result<Vec<Rule>> {
        let key = lang.to_lowercase();
        if let Some(rules) = self.cache.get(&key) {
            return Ok(rules.clone());
        }
        let path = self.path_for(&key);
        if !path.exists() {
            std::fs::create_dir_all(&self.dir)?;
            std::fs::write(&path, default_rules(&key))?;
        }
        let text = std::fs::read_to_string(&path)?;
        let rules = parse_rules_csv(&text);
        self.cache.insert(key, rules.clone());
        Ok(rules)
    }

    pub fn save(&mut self, lang: &str, rules: &[Rule]) -> Result<()> {
        let key = lang.to_lowercase();
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(&key), render_rules_csv(rules))?;
        self.cache.remove(&key);
        Ok(())
    }

    pub fn add(&mut self, lang: &str, rule: Rule) -> Result<Vec<Rule>> {
        if rule.pattern.trim().is_empty() {
            return Err(BankrecError::Rules("pattern is required".to_string()));
        }
        let mut rules = self.load(lang)?;
        rules.push(rule);
        self.save(lang, &rules)?;
        self.load(lang)
    }

    pub fn remove(&mut self, lang: &str, selector: &RuleSelector) -> Result<Vec<Rule>> {
        let mut rules = self.load(lang)?;
        let index = match selector {
            RuleSelector::Index(i) => {
                if *i >= rules.len() {
                    return Err(BankrecError::Rules(format!("no rule at index {i}")));
                }
                *i
            }
            RuleSelector::Pattern(pattern) => rules
                .iter()
                .position(|r| r.pattern.eq_ignore_ascii_case(pattern))
                .ok_or_else(|| {
                    BankrecError::Rules(format!("no rule with pattern '{pattern}'"))
                })?,
        };
        rules.remove(index);
        self.save(lang, &rules)?;
        self.load(lang)
    }

    /// Import rules from CSV text. `Replace` overwrites the language's rule
    /// set; `Merge` appends rules whose pattern is not already present
    /// (case-insensitive).
    pub fn import(&mut self, lang: &str, text: &str, mode: ImportMode) -> Result<ImportOutcome> {
        let incoming = parse_rules_csv(text);
        let imported = incoming.len();
        let merged = match mode {
            ImportMode::Replace => incoming,
            ImportMode::Merge => {
                let mut rules = self.load(lang)?;
                let existing: Vec<String> = rules
                    .iter()
                    .map(|r| r.pattern.to_lowercase())
                    .collect();
                rules.extend(
                    incoming
                        .into_iter()
                        .filter(|r| !existing.contains(&r.pattern.to_lowercase())),
                );
                rules
            }
        };
        let total = merged.len();
        self.save(lang, &merged)?;
        Ok(ImportOutcome { imported, total })
    }

    pub fn export(&mut self, lang: &str) -> Result<String> {
        Ok(render_rules_csv(&self.load(lang)?))
    }
}

fn default_rules(lang: &str) -> &'static str {
    match lang {
        "ro" => DEFAULT_RULES_RO,
        _ => DEFAULT_RULES_EN,
    }
}

/// One rule per line, `pattern,category`. Extra commas are dropped with the
/// rest of the line; this format does not support embedded commas.
pub fn parse_rules_csv(text: &str) -> Vec<Rule> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|line| {
            let mut fields = line.split(',');
            let pattern = fields.next().unwrap_or("").trim();
            let category = fields.next().unwrap_or("").trim();
            if pattern.is_empty() {
                return None;
            }
            Some(Rule {
                pattern: pattern.to_string(),
                category: category.to_string(),
            })
        })
        .collect()
}

fn render_rules_csv(rules: &[Rule]) -> String {
    let mut out = String::new();
    for rule in rules {
        out.push_str(&rule.pattern);
        out.push(',');
        out.push_str(&rule.category);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, RuleStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::open(dir.path());
        (dir, store)
    }

    #[test]
    fn test_parse_rules_csv() {
        let rules = parse_rules_csv("*KAUFLAND*,Groceries\n\n*UBER*,Transport\n");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].pattern, "*KAUFLAND*");
        assert_eq!(rules[0].category, "Groceries");
    }

    #[test]
    fn test_parse_rules_csv_extra_fields_dropped() {
        let rules = parse_rules_csv("*A*,Cat,extra\nonly-pattern\n");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].category, "Cat");
        assert_eq!(rules[1].pattern, "only-pattern");
        assert_eq!(rules[1].category, "");
    }

    #[test]
    fn test_load_seeds_defaults() {
        let (_dir, mut store) = store();
        let rules = store.load("en").unwrap();
        assert!(!rules.is_empty());
        let ro = store.load("ro").unwrap();
        assert!(ro.iter().any(|r| r.pattern == "*KAUFLAND*"));
    }

    #[test]
    fn test_add_and_remove_round_trip() {
        let (_dir, mut store) = store();
        let before = store.load("en").unwrap().len();
        let rules = store
            .add(
                "en",
                Rule {
                    pattern: "*NETFLIX*".to_string(),
                    category: "Entertainment".to_string(),
                },
            )
            .unwrap();
        assert_eq!(rules.len(), before + 1);

        let rules = store
            .remove("en", &RuleSelector::Pattern("*netflix*".to_string()))
            .unwrap();
        assert_eq!(rules.len(), before);
    }

    #[test]
    fn test_remove_bad_index_errors() {
        let (_dir, mut store) = store();
        store.load("en").unwrap();
        assert!(store.remove("en", &RuleSelector::Index(999)).is_err());
    }

    #[test]
    fn test_import_replace_and_merge() {
        let (_dir, mut store) = store();
        let outcome = store
            .import("en", "*A*,One\n*B*,Two\n", ImportMode::Replace)
            .unwrap();
        assert_eq!(outcome.imported, 2);
        assert_eq!(outcome.total, 2);

        let outcome = store
            .import("en", "*a*,Dup\n*C*,Three\n", ImportMode::Merge)
            .unwrap();
        assert_eq!(outcome.imported, 2);
        // "*a*" already exists case-insensitively, only "*C*" lands.
        assert_eq!(outcome.total, 3);
    }

    #[test]
    fn test_write_invalidates_cache() {
        let (_dir, mut store) = store();
        store.load("en").unwrap();
        store
            .import("en", "*ONLY*,Rule\n", ImportMode::Replace)
            .unwrap();
        let rules = store.load("en").unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].pattern, "*ONLY*");
    }

    #[test]
    fn test_export_round_trips() {
        let (_dir, mut store) = store();
        store
            .import("en", "*A*,One\n*B*,Two\n", ImportMode::Replace)
            .unwrap();
        let csv = store.export("en").unwrap();
        assert_eq!(csv, "*A*,One\n*B*,Two\n");
    }
}
