use std::sync::OnceLock;

use regex::Regex;

// Sign, integer part either grouped in runs of 3 by '.'/',' or a bare digit
// run, then an optional 2-digit fraction. Both separators serve either role
// depending on locale; the 3-digit run length is what disambiguates. The
// grouped branch requires at least one group so that an ungrouped value
// like "2500.00" falls through to the bare-run branch instead of being
// truncated to its first three digits.
fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([+-]?)([0-9]{1,3}(?:[.,][0-9]{3})+|[0-9]+)([.,][0-9]{2})?").unwrap()
    })
}

/// Convert a locale-ambiguous numeric string into a signed float.
///
/// `"1.234,56"` and `"1,234.56"` both come out as `1234.56`; `"12,34"` as
/// `12.34`. Never fails: unparseable input degrades to `0.0` so that a bad
/// cell never aborts a statement parse.
pub fn normalize_amount(raw: &str) -> f64 {
    let s: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let Some(caps) = amount_re().captures(&s) else {
        // Last resort: strip everything that is not a digit, '.' or '-'.
        let cleaned: String = s
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();
        return cleaned
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .unwrap_or(0.0);
    };
    let sign = if &caps[1] == "-" { -1.0 } else { 1.0 };
    // Every separator inside a matched grouped integer part heads a 3-digit
    // group, so dropping them all is the grouping-conformance rule.
    let int_part: String = caps[2].chars().filter(char::is_ascii_digit).collect();
    let frac_part = caps
        .get(3)
        .map(|m| m.as_str().replace(',', "."))
        .unwrap_or_default();
    let n: f64 = format!("{int_part}{frac_part}").parse().unwrap_or(0.0);
    if n.is_finite() {
        sign * n
    } else {
        0.0
    }
}
