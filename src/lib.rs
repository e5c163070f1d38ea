//! Stencil converts legal document templates with ad-hoc placeholders
//! (`#1`, `____`, `[TENANT NAME]`, `{DAY}`, ...) into templates with
//! normalized `{{ variable_name }}` variables, ready for automated filling.

pub mod catalog;
pub mod completion;
pub mod context;
pub mod converter;
pub mod document;
pub mod metadata;
pub mod naming;
pub mod scanner;
pub mod substitute;
pub mod tracker;
pub mod validate;
