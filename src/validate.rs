//! Post-conversion validation.

use crate::catalog::catalog;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Matches a canonical `{{ variable_name }}` span and captures the name.
fn variable_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("valid regex"))
}

/// The outcome of validating a converted document.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Occurrences of `{{ variable }}` spans, duplicates included.
    pub variable_count: usize,
    /// Distinct variable names in first-seen order.
    pub unique_variables: Vec<String>,
    /// Raw placeholders still present after conversion.
    pub remaining: Vec<String>,
    /// True when nothing raw remains and at least one variable exists.
    pub is_valid: bool,
}

/// Scans `text` for raw placeholders that survived conversion, flattened in
/// catalog order with duplicates removed.
///
/// Canonical `{{ variable }}` spans are blanked out before the scan so that
/// the single-brace family cannot fire on the inside of already-converted
/// syntax.
pub fn remaining_placeholders(text: &str) -> Vec<String> {
    let masked = variable_re().replace_all(text, " ");

    let mut seen: HashSet<String> = HashSet::new();
    let mut remaining = Vec::new();
    for (_, re) in catalog() {
        for m in re.find_iter(&masked) {
            let literal = m.as_str();
            if seen.contains(literal) {
                continue;
            }
            seen.insert(literal.to_string());
            remaining.push(literal.to_string());
        }
    }
    remaining
}

/// Validates the full text of a converted document.
pub fn validate_text(text: &str) -> ValidationReport {
    let mut variable_count = 0;
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique_variables = Vec::new();

    for captures in variable_re().captures_iter(text) {
        variable_count += 1;
        let name = &captures[1];
        if !seen.contains(name) {
            seen.insert(name.to_string());
            unique_variables.push(name.to_string());
        }
    }

    let remaining = remaining_placeholders(text);
    let is_valid = remaining.is_empty() && !unique_variables.is_empty();

    ValidationReport {
        variable_count,
        unique_variables,
        remaining,
        is_valid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_converted_text_is_valid() {
        let report = validate_text("Rent of {{ amount }} is due on {{ date }} each month");
        assert_eq!(report.variable_count, 2);
        assert_eq!(report.unique_variables, vec!["amount", "date"]);
        assert!(report.remaining.is_empty());
        assert!(report.is_valid);
    }

    #[test]
    fn converted_spans_do_not_trigger_the_curly_family() {
        // Without masking, the single-brace pattern would match `{ amount }`
        // inside the converted span and report it as a leftover.
        assert!(remaining_placeholders("pay {{ amount }} now").is_empty());
    }

    #[test]
    fn duplicate_variables_count_every_occurrence() {
        let report = validate_text("{{ name }} agrees with {{ name }}");
        assert_eq!(report.variable_count, 2);
        assert_eq!(report.unique_variables, vec!["name"]);
        assert!(report.is_valid);
    }

    #[test]
    fn leftover_placeholders_invalidate_the_document() {
        let report = validate_text("Tenant {{ tenant }} at [ADDRESS]");
        assert_eq!(report.remaining, vec!["[ADDRESS]"]);
        assert!(!report.is_valid);
    }

    #[test]
    fn text_without_variables_is_not_valid() {
        let report = validate_text("just plain prose");
        assert_eq!(report.variable_count, 0);
        assert!(report.remaining.is_empty());
        assert!(!report.is_valid);
    }

    #[test]
    fn malformed_double_braces_surface_as_leftovers() {
        // `{{ two words }}` is not a canonical variable, so its interior
        // still looks like a raw curly placeholder.
        let report = validate_text("{{ two words }} and {{ ok }}");
        assert_eq!(report.unique_variables, vec!["ok"]);
        assert_eq!(report.remaining, vec!["{ two words }"]);
        assert!(!report.is_valid);
    }

    #[test]
    fn remaining_follows_catalog_order_with_dedup() {
        let remaining = remaining_placeholders("[A] then #1 then [A] then ____");
        assert_eq!(remaining, vec!["#1", "____", "[A]"]);
    }

    #[test]
    fn masking_does_not_join_neighbouring_runs() {
        // Two short dot runs separated by a converted span must not merge
        // into one detectable run.
        assert!(remaining_placeholders("..{{ a }}..").is_empty());
    }
}
