use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

mod progress;

use progress::ProgressIndicator;

use stencil::completion::OpenAiChatService;
use stencil::converter::{AnalysisReport, ConversionReport, Converter};
use stencil::document::{TemplateDocument, TextTree};
use stencil::metadata::build_metadata;
use stencil::naming::{NamingConfig, NamingPrompts, VariableMapping};
use stencil::tracker::ConversionTracker;
use stencil::validate::validate_text;

#[derive(Clone, Copy)]
pub struct Config {
    pub verbose: bool,
    pub dry_run: bool,
}

const DOCUMENT_EXTENSIONS: [&str; 4] = ["txt", "md", "html", "htm"];
const BATCH_OUTPUT_DIR: &str = "converted";

/// Analyzes a document and writes the suggested variable mapping next to it.
pub async fn analyze(
    path: PathBuf,
    suggestions: Option<PathBuf>,
    prompts: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    let input = path.clone();
    let analysis = tokio::task::spawn_blocking(move || -> Result<AnalysisReport> {
        let converter = build_converter(prompts.as_deref())?;
        let doc = TemplateDocument::load(&input)?;
        Ok(converter.analyze(&doc))
    })
    .await??;

    println!("Analyzed {}", path.display());
    println!("  Placeholders found: {}", analysis.total_placeholders);
    for group in &analysis.placeholder_types.groups {
        println!(
            "  {}: {}",
            group.kind.as_str(),
            group.placeholders.join(", ")
        );
    }

    if analysis.suggested_mapping.is_empty() {
        println!("Nothing to convert");
        return Ok(());
    }

    println!("Suggested variables:");
    for (placeholder, variable) in analysis.suggested_mapping.iter() {
        println!("  {} -> {{{{ {} }}}}", placeholder, variable);
    }

    let out_path = suggestions.unwrap_or_else(|| path.with_extension("suggestions.json"));
    if config.dry_run {
        println!("Dry run: not writing {}", out_path.display());
        return Ok(());
    }

    let content =
        serde_json::to_string_pretty(&analysis).context("Failed to serialize analysis")?;
    fs::write(&out_path, content)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;
    println!("✓ Wrote suggestions to {}", out_path.display());

    Ok(())
}

/// Converts a document into a `{{ variable }}` template.
///
/// With no mapping file the document is analyzed first and the suggested
/// mapping is applied directly.
pub async fn convert(
    path: PathBuf,
    mapping: Option<PathBuf>,
    output: Option<PathBuf>,
    prompts: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    let input = path.clone();
    let (report, doc) =
        tokio::task::spawn_blocking(move || -> Result<(ConversionReport, TemplateDocument)> {
            let converter = build_converter(prompts.as_deref())?;
            let mut doc = TemplateDocument::load(&input)?;
            let mapping = match mapping {
                Some(mapping_path) => load_mapping(&mapping_path)?,
                None => converter.analyze(&doc).suggested_mapping,
            };
            let report = converter.convert(&mut doc, &mapping);
            Ok((report, doc))
        })
        .await??;

    println!(
        "✓ Converted {} text unit(s) in {}",
        report.converted_count,
        path.display()
    );
    if !report.remaining.is_empty() {
        println!(
            "  {} placeholder(s) left unconverted: {}",
            report.remaining.len(),
            report.remaining.join(", ")
        );
    }

    let out_path = output.unwrap_or_else(|| path.with_extension("converted.txt"));
    if config.dry_run {
        println!("Dry run: not writing {}", out_path.display());
        return Ok(());
    }

    doc.save(&out_path)?;
    println!("✓ Wrote template to {}", out_path.display());

    Ok(())
}

/// Checks that a converted template contains only `{{ variable }}` markers.
pub async fn validate(path: PathBuf, _config: &Config) -> Result<()> {
    let doc = TemplateDocument::load(&path)?;
    let report = validate_text(&doc.full_text());

    if report.is_valid {
        println!(
            "✓ {} is a valid template ({} variable(s), {} unique)",
            path.display(),
            report.variable_count,
            report.unique_variables.len()
        );
        return Ok(());
    }

    println!("✗ {} is not a valid template", path.display());
    if report.unique_variables.is_empty() {
        println!("  No {{{{ variable }}}} markers found");
    }
    for placeholder in &report.remaining {
        println!("  Unconverted: {}", placeholder);
    }
    bail!("Validation failed for {}", path.display())
}

/// Derives field metadata from a converted template and writes it as JSON.
pub async fn metadata(
    path: PathBuf,
    name: Option<String>,
    category: String,
    output: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    let template_name = name.unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("template")
            .to_string()
    });

    let doc = TemplateDocument::load(&path)?;
    let validation = validate_text(&doc.full_text());
    if !validation.is_valid {
        println!("✗ Warning: {} is not fully converted", path.display());
    }
    let metadata = build_metadata(&template_name, &category, &validation);

    println!(
        "Template: {} ({}, {} field(s))",
        metadata.name,
        metadata.category,
        metadata.fields.len()
    );
    for field in &metadata.fields {
        println!("  {} [{}]: {}", field.name, field.kind.as_str(), field.label);
    }

    let out_path = output.unwrap_or_else(|| path.with_extension("metadata.json"));
    if config.dry_run {
        println!("Dry run: not writing {}", out_path.display());
        return Ok(());
    }

    let content =
        serde_json::to_string_pretty(&metadata).context("Failed to serialize metadata")?;
    fs::write(&out_path, content)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;
    println!("✓ Wrote metadata to {}", out_path.display());

    Ok(())
}

/// Converts every document in a directory, skipping documents whose output
/// is already up to date.
pub async fn batch(
    dir: PathBuf,
    output_dir: Option<PathBuf>,
    clear_cache: bool,
    prompts: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    let documents = discover_documents(&dir)?;
    if documents.is_empty() {
        println!("No documents found in {}", dir.display());
        return Ok(());
    }

    let out_dir = output_dir.unwrap_or_else(|| dir.join(BATCH_OUTPUT_DIR));
    if !config.dry_run {
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
    }

    let mut tracker = ConversionTracker::load(&dir)?;
    if clear_cache {
        let removed = tracker.clear();
        if config.verbose {
            println!("Cleared {} cached conversion(s)", removed);
        }
    }

    println!(
        "Converting {} document(s) from {}",
        documents.len(),
        dir.display()
    );

    let mut progress = ProgressIndicator::new(documents.len());
    let mut tasks = Vec::new();

    for input_path in documents {
        let name = file_name_string(&input_path);
        let output_path = batch_output_path(&out_dir, &input_path);

        progress.start_item(&name);
        if !tracker.needs_conversion(&name, &input_path, &output_path)? {
            if config.verbose {
                println!("⊚ Skipping {} (up to date)", name);
            }
            progress.skip_item(&name);
            continue;
        }

        let cfg = *config;
        let prompts_path = prompts.clone();
        tasks.push(tokio::task::spawn_blocking(move || {
            let result = convert_one(&input_path, &output_path, prompts_path.as_deref(), &cfg);
            (name, input_path, output_path, result)
        }));
    }

    for task in tasks {
        let (name, input_path, output_path, result) = task.await?;
        match result {
            Ok(converted_count) => {
                if !config.dry_run {
                    tracker.record(&name, &input_path, &output_path)?;
                }
                progress.complete_item(&name, true);
                if config.verbose {
                    println!("✓ Converted {} ({} text unit(s))", name, converted_count);
                }
            }
            Err(e) => {
                progress.complete_item(&name, false);
                eprintln!("✗ Failed to convert {}: {}", name, e);
            }
        }
    }

    if !config.dry_run {
        tracker.save()?;
    }

    progress.finish();
    if config.verbose {
        println!("{}", tracker.summary());
    }

    Ok(())
}

/// Runs the whole pipeline for one document on the current thread.
fn convert_one(
    input_path: &Path,
    output_path: &Path,
    prompts_path: Option<&Path>,
    config: &Config,
) -> Result<usize> {
    let converter = build_converter(prompts_path)?;
    let mut doc = TemplateDocument::load(input_path)?;
    let analysis = converter.analyze(&doc);
    let report = converter.convert(&mut doc, &analysis.suggested_mapping);
    if !config.dry_run {
        doc.save(output_path)?;
    }
    Ok(report.converted_count)
}

/// Builds the converter from environment configuration. Constructed on a
/// blocking thread because the chat client owns a blocking HTTP client.
fn build_converter(prompts_path: Option<&Path>) -> Result<Converter<OpenAiChatService>> {
    let config = NamingConfig::from_env();
    let client = if config.enabled {
        Some(OpenAiChatService::new(
            &config.api_base,
            &config.api_key,
            &config.model,
            config.timeout(),
        )?)
    } else {
        None
    };
    let prompts = match prompts_path {
        Some(path) => NamingPrompts::load(path)?,
        None => NamingPrompts::default(),
    };
    Ok(Converter::with_prompts(config, client, prompts))
}

/// Reads a mapping file: either a plain placeholder-to-variable JSON object
/// or a suggestions file written by `analyze`.
fn load_mapping(path: &Path) -> Result<VariableMapping> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping file {}", path.display()))?;

    if let Ok(mapping) = serde_json::from_str::<VariableMapping>(&content) {
        return Ok(mapping);
    }

    #[derive(Deserialize)]
    struct SuggestionsFile {
        suggested_mapping: VariableMapping,
    }

    let file: SuggestionsFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse mapping file {}", path.display()))?;
    Ok(file.suggested_mapping)
}

fn discover_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let Some(extension) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        if path.is_file() && DOCUMENT_EXTENSIONS.contains(&extension.to_lowercase().as_str()) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn batch_output_path(out_dir: &Path, input_path: &Path) -> PathBuf {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    out_dir.join(format!("{}.txt", stem))
}

fn file_name_string(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string()
}
