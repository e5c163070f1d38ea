//! End-to-end tests for the conversion pipeline.
//!
//! These run with AI naming disabled, so every placeholder gets its
//! deterministic fallback name and no network access is needed:
//! 1. Analyze a document and apply the suggested mapping
//! 2. Save the converted template and load it back
//! 3. Drive the stencil binary over single files and whole directories

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use stencil::completion::OpenAiChatService;
use stencil::converter::Converter;
use stencil::document::{TemplateDocument, TextTree};
use stencil::metadata::FieldKind;
use stencil::naming::NamingConfig;
use stencil::validate::validate_text;

const LEASE: &str = "\
RESIDENTIAL LEASE AGREEMENT #1

This agreement is made on ........ between [LANDLORD NAME]
and [TENANT NAME] for the property at [PROPERTY ADDRESS].

| Monthly rent | $____ |
| Payment day | The {DAY} of each month |
| Contact | <TENANT EMAIL> |

Signed: ____________
";

fn temp_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("stencil_e2e_{}_{}", std::process::id(), suffix));
    fs::create_dir_all(&dir).expect("Failed to create temp directory");
    dir
}

fn offline_converter() -> Converter<OpenAiChatService> {
    Converter::new(NamingConfig::default(), None)
}

#[test]
fn full_pipeline_converts_a_lease_document() {
    let converter = offline_converter();
    let mut doc = TemplateDocument::from_text(LEASE);

    let analysis = converter.analyze(&doc);
    assert_eq!(analysis.total_placeholders, 9);
    assert_eq!(analysis.contexts.len(), 9);

    let report = converter.convert(&mut doc, &analysis.suggested_mapping);
    assert!(report.converted_count > 0);
    assert!(report.remaining.is_empty(), "leftovers: {:?}", report.remaining);

    let text = doc.to_text();
    assert!(text.contains("{{ landlord_name }}"));
    assert!(text.contains("{{ tenant_name }}"));
    assert!(text.contains("{{ day }}"));
    // The dollar sign sits outside the placeholder and survives conversion.
    assert!(text.contains("${{ "));
    assert!(!text.contains("[LANDLORD"));

    let validation = converter.validate(&doc);
    assert!(validation.is_valid);
    assert_eq!(validation.unique_variables.len(), 9);

    let metadata = converter.extract_metadata(&doc, "Residential Lease", "Leases");
    assert_eq!(metadata.variable_count, 9);
    let kind_of = |name: &str| {
        metadata
            .fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.kind)
    };
    assert_eq!(kind_of("day"), Some(FieldKind::Date));
    assert_eq!(kind_of("tenant_email"), Some(FieldKind::Email));
    assert_eq!(kind_of("field_1"), Some(FieldKind::Text));
}

#[test]
fn converted_templates_survive_a_save_load_round_trip() {
    let dir = temp_dir("round_trip");
    let path = dir.join("lease.txt");

    let converter = offline_converter();
    let mut doc = TemplateDocument::from_text(LEASE);
    let analysis = converter.analyze(&doc);
    converter.convert(&mut doc, &analysis.suggested_mapping);

    doc.save(&path).expect("Failed to save template");
    let reloaded = TemplateDocument::load(&path).expect("Failed to load template");

    assert_eq!(reloaded.to_text(), doc.to_text());
    assert!(validate_text(&reloaded.full_text()).is_valid);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn binary_converts_and_validates_a_document() {
    let dir = temp_dir("binary");
    let input = dir.join("notice.txt");
    let output = dir.join("notice.template.txt");
    fs::write(&input, "Notice #1: [RECIPIENT] must vacate by {DATE}.\n").unwrap();

    println!("\n=== Step 1: Converting {} ===", input.display());
    let convert_status = Command::new(env!("CARGO_BIN_EXE_stencil"))
        .arg("convert")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .env_remove("STENCIL_AI_KEY")
        .current_dir(&dir)
        .status()
        .expect("Failed to run stencil convert");
    assert!(convert_status.success(), "convert command failed");

    let template = fs::read_to_string(&output).expect("Converted template not written");
    assert!(template.contains("{{ recipient }}"));
    assert!(template.contains("{{ date }}"));
    assert!(template.contains("{{ field_1 }}"));

    println!("\n=== Step 2: Validating the converted template ===");
    let validate_ok = Command::new(env!("CARGO_BIN_EXE_stencil"))
        .arg("validate")
        .arg(&output)
        .current_dir(&dir)
        .status()
        .expect("Failed to run stencil validate");
    assert!(validate_ok.success(), "converted template should validate");

    println!("\n=== Step 3: Validating the raw document fails ===");
    let validate_raw = Command::new(env!("CARGO_BIN_EXE_stencil"))
        .arg("validate")
        .arg(&input)
        .current_dir(&dir)
        .status()
        .expect("Failed to run stencil validate");
    assert!(!validate_raw.success(), "raw document must not validate");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn binary_batch_converts_a_directory_and_tracks_it() {
    let dir = temp_dir("batch");
    fs::write(dir.join("a.txt"), "Pay ____ to [PAYEE].\n").unwrap();
    fs::write(dir.join("b.md"), "Effective {DATE} for [CLIENT NAME].\n").unwrap();
    fs::write(dir.join("ignored.bin"), "not a document").unwrap();

    let run = |step: &str| {
        println!("\n=== {} ===", step);
        Command::new(env!("CARGO_BIN_EXE_stencil"))
            .arg("batch")
            .arg(&dir)
            .env_remove("STENCIL_AI_KEY")
            .current_dir(&dir)
            .status()
            .expect("Failed to run stencil batch")
    };

    assert!(run("Step 1: First batch run").success(), "batch run failed");

    let out_a = dir.join("converted").join("a.txt");
    let out_b = dir.join("converted").join("b.txt");
    assert!(out_a.exists(), "a.txt was not converted");
    assert!(out_b.exists(), "b.md was not converted");
    assert!(!dir.join("converted").join("ignored.txt").exists());
    assert!(
        dir.join(".stencil").join("conversions.json").exists(),
        "conversion tracker not written"
    );

    let converted = fs::read_to_string(&out_a).unwrap();
    assert!(converted.contains("{{ payee }}"));

    // Second run skips the already converted documents.
    assert!(run("Step 2: Second batch run").success(), "second batch run failed");

    fs::remove_dir_all(&dir).ok();
}
