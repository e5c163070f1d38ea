//! High-level facade over the scan, naming, substitution and validation
//! stages.

use log::info;
use serde::Serialize;

use crate::completion::ChatCompletion;
use crate::context::{extract_context, PlaceholderContext};
use crate::document::TextTree;
use crate::metadata::{build_metadata, TemplateMetadata};
use crate::naming::{NameSuggester, NamingConfig, NamingPrompts, VariableMapping};
use crate::scanner::{scan, ScanReport};
use crate::substitute::apply_mapping;
use crate::validate::{remaining_placeholders, validate_text, ValidationReport};

/// Characters of document text echoed back in an analysis report.
const DOCUMENT_PREVIEW_CHARS: usize = 500;

/// Everything learned from a read-only analysis pass over a document.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub total_placeholders: usize,
    pub placeholder_types: ScanReport,
    pub suggested_mapping: VariableMapping,
    pub contexts: Vec<PlaceholderContext>,
    pub document_preview: String,
}

/// Outcome of substituting a mapping into a document.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub converted_count: usize,
    pub remaining: Vec<String>,
}

/// Ties the pipeline stages together behind one entry point per operation.
pub struct Converter<C: ChatCompletion> {
    suggester: NameSuggester<C>,
}

impl<C: ChatCompletion> Converter<C> {
    pub fn new(config: NamingConfig, client: Option<C>) -> Self {
        Converter {
            suggester: NameSuggester::new(config, client),
        }
    }

    pub fn with_prompts(config: NamingConfig, client: Option<C>, prompts: NamingPrompts) -> Self {
        Converter {
            suggester: NameSuggester::with_prompts(config, client, prompts),
        }
    }

    /// Scans the document and proposes a variable name for every placeholder
    /// found. The document itself is not modified.
    pub fn analyze<T: TextTree + ?Sized>(&self, doc: &T) -> AnalysisReport {
        let text = doc.full_text();
        let report = scan(&text);
        let contexts: Vec<PlaceholderContext> = report
            .all_placeholders()
            .map(|p| PlaceholderContext {
                placeholder: p.to_string(),
                window: extract_context(&text, p),
            })
            .collect();
        let suggested_mapping = self.suggester.suggest(&report, &contexts, &text);
        info!(
            "Analysis found {} placeholder(s) across {} type(s)",
            report.total(),
            report.groups.len()
        );

        AnalysisReport {
            total_placeholders: report.total(),
            suggested_mapping,
            contexts,
            document_preview: text.chars().take(DOCUMENT_PREVIEW_CHARS).collect(),
            placeholder_types: report,
        }
    }

    /// Replaces every mapped placeholder with its `{{ variable }}` form and
    /// reports what is left over.
    pub fn convert<T: TextTree + ?Sized>(
        &self,
        doc: &mut T,
        mapping: &VariableMapping,
    ) -> ConversionReport {
        let converted_count = apply_mapping(doc, mapping);
        let remaining = remaining_placeholders(&doc.full_text());
        info!(
            "Converted {} unit(s), {} placeholder(s) left",
            converted_count,
            remaining.len()
        );

        ConversionReport {
            converted_count,
            remaining,
        }
    }

    /// Checks that the document carries `{{ variable }}` markers and nothing
    /// the scanner still recognizes as a raw placeholder.
    pub fn validate<T: TextTree + ?Sized>(&self, doc: &T) -> ValidationReport {
        validate_text(&doc.full_text())
    }

    /// Derives catalog metadata for a converted document.
    pub fn extract_metadata<T: TextTree + ?Sized>(
        &self,
        doc: &T,
        template_name: &str,
        category: &str,
    ) -> TemplateMetadata {
        build_metadata(template_name, category, &self.validate(doc))
    }
}
