//! Placeholder pattern catalog
//!
//! The eight placeholder families recognised in uploaded legal templates,
//! held in a fixed scan order. Scanning, fallback naming and leftover
//! detection all iterate this catalog in the same order, so earlier
//! families win whenever a literal could be claimed by more than one.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A family of raw placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Numbered markers: `#1`, `#2`, `#123`
    Hash,
    /// Blank runs: `____`, `___________`
    Underscore,
    /// Dotted blanks: `....`, `..........`
    Dots,
    /// `[NAME]`, `[Effective Date]`
    BracketsSquare,
    /// `{NAME}`, `{DATE}`
    BracketsCurly,
    /// `<NAME>`, `<DATE>`
    BracketsAngle,
    /// `${NAME}`, `${DATE}`
    Dollar,
    /// `%NAME%`, `%DATE%`
    Percent,
}

impl PatternKind {
    /// Every family in scan order.
    pub const ALL: [PatternKind; 8] = [
        PatternKind::Hash,
        PatternKind::Underscore,
        PatternKind::Dots,
        PatternKind::BracketsSquare,
        PatternKind::BracketsCurly,
        PatternKind::BracketsAngle,
        PatternKind::Dollar,
        PatternKind::Percent,
    ];

    /// Stable name used in reports and mapping files.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Hash => "hash",
            PatternKind::Underscore => "underscore",
            PatternKind::Dots => "dots",
            PatternKind::BracketsSquare => "brackets_square",
            PatternKind::BracketsCurly => "brackets_curly",
            PatternKind::BracketsAngle => "brackets_angle",
            PatternKind::Dollar => "dollar",
            PatternKind::Percent => "percent",
        }
    }

    /// The bracketed families carry a human-readable label between their
    /// delimiters, which fallback naming can reuse.
    pub fn is_bracketed(&self) -> bool {
        matches!(
            self,
            PatternKind::BracketsSquare | PatternKind::BracketsCurly | PatternKind::BracketsAngle
        )
    }

    fn pattern(&self) -> &'static str {
        match self {
            PatternKind::Hash => r"#\d+",
            PatternKind::Underscore => r"_{4,}",
            PatternKind::Dots => r"\.{4,}",
            PatternKind::BracketsSquare => r"\[[\s\w-]+\]",
            PatternKind::BracketsCurly => r"\{[\s\w-]+\}",
            PatternKind::BracketsAngle => r"<[\s\w-]+>",
            PatternKind::Dollar => r"\$\{[\w_]+\}",
            PatternKind::Percent => r"%[\w_]+%",
        }
    }
}

/// The compiled catalog, in scan order.
pub fn catalog() -> &'static [(PatternKind, Regex)] {
    static CATALOG: OnceLock<Vec<(PatternKind, Regex)>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        PatternKind::ALL
            .iter()
            .map(|kind| (*kind, Regex::new(kind.pattern()).expect("valid regex")))
            .collect()
    })
}
