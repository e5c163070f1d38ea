//! Variable name suggestion.
//!
//! Given the detected placeholders and their context windows, the engine
//! produces a placeholder-to-variable-name mapping. When an AI backend is
//! configured it is asked once, with a bounded prompt, to propose names; any
//! failure on that path degrades to deterministic naming instead of
//! surfacing an error. Without a backend, bracketed placeholders reuse the
//! label between their delimiters and everything else receives a sequential
//! `field_<n>` name.

use crate::completion::{ChatCompletion, ChatMessage, CompletionError, CompletionParams};
use crate::context::PlaceholderContext;
use crate::scanner::ScanReport;
use anyhow::{Context, Result};
use log::{info, warn};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// At most this many placeholder contexts go into the prompt.
const MAX_PROMPT_CONTEXTS: usize = 20;
/// At most this many characters of the document go into the prompt.
const MAX_PROMPT_PREVIEW_CHARS: usize = 2000;

/// Settings for the naming engine, passed explicitly at construction.
#[derive(Debug, Clone)]
pub struct NamingConfig {
    pub enabled: bool,
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for NamingConfig {
    fn default() -> Self {
        NamingConfig {
            enabled: false,
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 1000,
            timeout_secs: 30,
        }
    }
}

impl NamingConfig {
    /// Builds a config from `STENCIL_AI_*` environment variables. AI naming
    /// turns on only when `STENCIL_AI_KEY` is set.
    pub fn from_env() -> Self {
        let mut config = NamingConfig::default();
        if let Ok(url) = env::var("STENCIL_AI_URL") {
            config.api_base = url;
        }
        if let Ok(key) = env::var("STENCIL_AI_KEY") {
            config.api_key = key;
        }
        if let Ok(model) = env::var("STENCIL_AI_MODEL") {
            config.model = model;
        }
        if let Some(t) = env::var("STENCIL_AI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.temperature = t;
        }
        if let Some(m) = env::var("STENCIL_AI_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.max_tokens = m;
        }
        if let Some(s) = env::var("STENCIL_AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.timeout_secs = s;
        }
        config.enabled = !config.api_key.is_empty();
        config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Prompt text for the AI naming call, overridable from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingPrompts {
    pub system: String,
    pub rules: Vec<String>,
}

impl Default for NamingPrompts {
    fn default() -> Self {
        NamingPrompts {
            system: "You are a legal document template analyzer. Return only valid JSON."
                .to_string(),
            rules: vec![
                "Use context to infer meaning".to_string(),
                "Common legal fields: party_name, effective_date, amount, address".to_string(),
                "For numbered placeholders (#1, #2), use descriptive names".to_string(),
                "Keep names under 30 characters".to_string(),
                "Use snake_case (lowercase with underscores)".to_string(),
            ],
        }
    }
}

impl NamingPrompts {
    /// Loads prompt overrides from a YAML file. Missing keys keep their
    /// defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse prompt file {}", path.display()))
    }
}

/// Placeholder-to-variable-name assignments in insertion order.
///
/// Serializes as a JSON object whose keys keep their insertion order, so
/// mapping files written by `analyze` and read back by `convert` stay stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableMapping {
    entries: Vec<(String, String)>,
}

impl VariableMapping {
    pub fn new() -> Self {
        VariableMapping::default()
    }

    /// Adds or updates an assignment. Updating keeps the original position.
    pub fn insert(&mut self, placeholder: impl Into<String>, variable: impl Into<String>) {
        let placeholder = placeholder.into();
        let variable = variable.into();
        if let Some(entry) = self.entries.iter_mut().find(|(p, _)| *p == placeholder) {
            entry.1 = variable;
        } else {
            self.entries.push((placeholder, variable));
        }
    }

    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p.as_str() == placeholder)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for VariableMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (placeholder, variable) in &self.entries {
            map.serialize_entry(placeholder, variable)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for VariableMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = VariableMapping;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of placeholder to variable name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut mapping = VariableMapping::new();
                while let Some((placeholder, variable)) = access.next_entry::<String, String>()? {
                    mapping.insert(placeholder, variable);
                }
                Ok(mapping)
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}

/// The name suggestion engine.
pub struct NameSuggester<C: ChatCompletion> {
    config: NamingConfig,
    client: Option<C>,
    prompts: NamingPrompts,
}

impl<C: ChatCompletion> NameSuggester<C> {
    pub fn new(config: NamingConfig, client: Option<C>) -> Self {
        Self::with_prompts(config, client, NamingPrompts::default())
    }

    pub fn with_prompts(config: NamingConfig, client: Option<C>, prompts: NamingPrompts) -> Self {
        if !config.enabled {
            warn!("AI naming not configured, using deterministic variable names");
        }
        NameSuggester {
            config,
            client,
            prompts,
        }
    }

    /// Suggests a variable name for every detected placeholder.
    ///
    /// The AI path is attempted once when the engine is enabled and a client
    /// is present; transport errors, API errors and unparsable replies all
    /// degrade to sequential `field_<n>` names over every placeholder. With
    /// no AI, bracketed placeholders keep their labels and the rest share a
    /// single `field_<n>` counter.
    pub fn suggest(
        &self,
        report: &ScanReport,
        contexts: &[PlaceholderContext],
        document_text: &str,
    ) -> VariableMapping {
        if report.is_empty() {
            return VariableMapping::new();
        }

        if self.config.enabled {
            if let Some(client) = &self.client {
                return match self.request_names(client, contexts, document_text) {
                    Ok(reply) => match parse_mapping_reply(&reply) {
                        Some(mapping) => {
                            info!("AI suggested {} variable name(s)", mapping.len());
                            mapping
                        }
                        None => {
                            warn!("AI reply contained no JSON object, using sequential names");
                            sequential_names(report.all_placeholders())
                        }
                    },
                    Err(e) => {
                        warn!("AI variable name suggestion failed: {}", e);
                        sequential_names(report.all_placeholders())
                    }
                };
            }
        }

        fallback_names(report)
    }

    fn request_names(
        &self,
        client: &C,
        contexts: &[PlaceholderContext],
        document_text: &str,
    ) -> Result<String, CompletionError> {
        let messages = [
            ChatMessage::system(self.prompts.system.clone()),
            ChatMessage::user(self.build_user_prompt(contexts, document_text)),
        ];
        let params = CompletionParams {
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            json_reply: true,
        };
        client.complete(&messages, &params)
    }

    fn build_user_prompt(&self, contexts: &[PlaceholderContext], document_text: &str) -> String {
        let preview: String = document_text
            .chars()
            .take(MAX_PROMPT_PREVIEW_CHARS)
            .collect();
        let context_lines: Vec<String> = contexts
            .iter()
            .take(MAX_PROMPT_CONTEXTS)
            .map(|c| format!("'{}' appears in: \"{}\"", c.placeholder, c.window))
            .collect();
        let rules: Vec<String> = self
            .prompts
            .rules
            .iter()
            .enumerate()
            .map(|(i, rule)| format!("{}. {}", i + 1, rule))
            .collect();

        format!(
            "You are analyzing a legal document template. Generate appropriate variable names for placeholders.\n\n\
             Document preview:\n{}\n\n\
             Placeholders with context:\n{}\n\n\
             Generate clean, descriptive variable names (snake_case, no special characters).\n\n\
             Rules:\n{}\n\n\
             Return ONLY a JSON object mapping placeholders to variable names:\n\
             {{\n    \"#1\": \"party_name_1\",\n    \"#2\": \"effective_date\",\n    \"____\": \"recipient_address\"\n}}",
            preview,
            context_lines.join("\n"),
            rules.join("\n"),
        )
    }
}

/// Deterministic naming used when no AI backend is configured. Bracketed
/// placeholders reuse the label between their delimiters; all other
/// placeholders share one sequential counter.
fn fallback_names(report: &ScanReport) -> VariableMapping {
    let mut mapping = VariableMapping::new();
    let mut counter = 1;

    for group in &report.groups {
        for placeholder in &group.placeholders {
            if group.kind.is_bracketed() {
                mapping.insert(placeholder.clone(), label_to_variable(placeholder));
            } else {
                mapping.insert(placeholder.clone(), format!("field_{}", counter));
                counter += 1;
            }
        }
    }

    mapping
}

/// Naming used after a failed AI attempt: every placeholder, bracketed or
/// not, receives a sequential name.
fn sequential_names<'a>(placeholders: impl Iterator<Item = &'a str>) -> VariableMapping {
    let mut mapping = VariableMapping::new();
    for (index, placeholder) in placeholders.enumerate() {
        mapping.insert(placeholder, format!("field_{}", index + 1));
    }
    mapping
}

fn label_to_variable(placeholder: &str) -> String {
    let inner: String = placeholder
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '<' | '>' | '{' | '}'))
        .collect();
    inner
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace('-', "_")
}

/// Extracts a placeholder-to-name mapping from an AI reply. The whole reply
/// is tried as JSON first; failing that, the first balanced `{...}` span is.
fn parse_mapping_reply(reply: &str) -> Option<VariableMapping> {
    if let Ok(mapping) = serde_json::from_str::<VariableMapping>(reply.trim()) {
        return Some(mapping);
    }
    let span = balanced_object_span(reply)?;
    serde_json::from_str::<VariableMapping>(span).ok()
}

fn balanced_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
