use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "stencil")]
#[command(about = "Convert legal document templates to {{ variable }} placeholders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Enable verbose output")]
    verbose: bool,

    #[arg(long, global = true, help = "Perform a dry run without writing files")]
    dry_run: bool,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        help = "YAML file overriding the AI naming prompts"
    )]
    prompts: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Detect placeholders and suggest variable names")]
    Analyze {
        #[arg(help = "Document to analyze")]
        path: PathBuf,

        #[arg(long, value_name = "FILE", help = "Where to write the suggestions JSON")]
        suggestions: Option<PathBuf>,
    },

    #[command(about = "Convert a document into a {{ variable }} template")]
    Convert {
        #[arg(help = "Document to convert")]
        path: PathBuf,

        #[arg(
            long,
            value_name = "FILE",
            help = "Mapping JSON to apply instead of fresh suggestions"
        )]
        mapping: Option<PathBuf>,

        #[arg(long, short, value_name = "FILE", help = "Where to write the converted template")]
        output: Option<PathBuf>,
    },

    #[command(about = "Check that a template contains only {{ variable }} markers")]
    Validate {
        #[arg(help = "Template to validate")]
        path: PathBuf,
    },

    #[command(about = "Extract field metadata from a converted template")]
    Metadata {
        #[arg(help = "Template to inspect")]
        path: PathBuf,

        #[arg(long, help = "Template name (defaults to the file stem)")]
        name: Option<String>,

        #[arg(long, default_value = "Custom", help = "Template category")]
        category: String,

        #[arg(long, short, value_name = "FILE", help = "Where to write the metadata JSON")]
        output: Option<PathBuf>,
    },

    #[command(about = "Convert every document in a directory")]
    Batch {
        #[arg(help = "Directory holding the documents")]
        dir: PathBuf,

        #[arg(
            long,
            value_name = "DIR",
            help = "Where converted templates go (defaults to <dir>/converted)"
        )]
        output_dir: Option<PathBuf>,

        #[arg(long, help = "Drop the conversion cache before running")]
        clear_cache: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = cli::Config {
        verbose: cli.verbose,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Analyze { path, suggestions } => {
            cli::analyze(path, suggestions, cli.prompts, &config).await?;
        }
        Commands::Convert {
            path,
            mapping,
            output,
        } => {
            cli::convert(path, mapping, output, cli.prompts, &config).await?;
        }
        Commands::Validate { path } => {
            cli::validate(path, &config).await?;
        }
        Commands::Metadata {
            path,
            name,
            category,
            output,
        } => {
            cli::metadata(path, name, category, output, &config).await?;
        }
        Commands::Batch {
            dir,
            output_dir,
            clear_cache,
        } => {
            cli::batch(dir, output_dir, clear_cache, cli.prompts, &config).await?;
        }
    }

    Ok(())
}
