//! Placeholder detection over a document's full text.

use crate::catalog::{catalog, PatternKind};
use log::debug;
use serde::Serialize;
use std::collections::HashSet;

/// The placeholders found for one pattern family, in first-seen order.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceholderGroup {
    #[serde(rename = "type")]
    pub kind: PatternKind,
    pub placeholders: Vec<String>,
}

/// All detected placeholders, grouped by family in catalog order.
///
/// Families with no matches are omitted. A literal is recorded at most once
/// across the whole report: the first family (in catalog order) that matches
/// it keeps it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub groups: Vec<PlaceholderGroup>,
}

impl ScanReport {
    pub fn total(&self) -> usize {
        self.groups.iter().map(|g| g.placeholders.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every placeholder, flattened in catalog order.
    pub fn all_placeholders(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .flat_map(|g| g.placeholders.iter().map(String::as_str))
    }
}

/// Scans `text` against every pattern family in the catalog.
pub fn scan(text: &str) -> ScanReport {
    let mut seen: HashSet<String> = HashSet::new();
    let mut groups = Vec::new();

    for (kind, re) in catalog() {
        let mut placeholders = Vec::new();
        for m in re.find_iter(text) {
            let literal = m.as_str();
            if seen.contains(literal) {
                continue;
            }
            seen.insert(literal.to_string());
            placeholders.push(literal.to_string());
        }
        if !placeholders.is_empty() {
            groups.push(PlaceholderGroup {
                kind: *kind,
                placeholders,
            });
        }
    }

    let report = ScanReport { groups };
    debug!(
        "Detected {} placeholder(s) across {} type(s)",
        report.total(),
        report.groups.len()
    );
    report
}
