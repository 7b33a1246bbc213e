//! Schemagraph CLI
//!
//! Command-line interface for the rule compiler:
//! - compiling a schema's business rules into an ISO-Schematron document
//! - checking rules without emitting anything
//! - inspecting the noun/verb vocabulary derived from a schema

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use schemagraph_cnl::Diagnostic;
use schemagraph_model::{SchemaGraph, Vocabulary};
use schemagraph_schematron::{check_schema, compile_schema, XpathConfig};

#[derive(Parser)]
#[command(name = "schemagraph")]
#[command(
    author,
    version,
    about = "Compile controlled-natural-language business rules into ISO-Schematron"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every rule of a schema into a Schematron document.
    Compile {
        /// Schema graph (JSON)
        schema: PathBuf,
        /// Output Schematron file; stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Also write the structured findings as JSON
        #[arg(long)]
        findings: Option<PathBuf>,
        /// Query-language binding declared on the document root
        #[arg(long, default_value = "xslt2")]
        query_binding: String,
        /// Attribute carrying an element's identifier
        #[arg(long, default_value = "@gml:id")]
        id_attribute: String,
        /// Attribute carrying an object reference
        #[arg(long, default_value = "@xlink:href")]
        reference_attribute: String,
        /// Decoration prepended to identifiers in references
        #[arg(long, default_value = "#")]
        id_prefix: String,
    },

    /// Parse, validate and build rules without running the backend.
    Check {
        /// Schema graph (JSON)
        schema: PathBuf,
    },

    /// Print the noun/verb vocabulary derived from a schema.
    Vocab {
        /// Schema graph (JSON)
        schema: PathBuf,
        /// Emit JSON instead of plain lists
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Compile {
            schema,
            out,
            findings,
            query_binding,
            id_attribute,
            reference_attribute,
            id_prefix,
        } => {
            let config = XpathConfig {
                query_binding,
                id_attribute,
                reference_attribute,
                id_prefix,
                ..XpathConfig::default()
            };
            cmd_compile(&schema, out.as_deref(), findings.as_deref(), config)
        }
        Commands::Check { schema } => cmd_check(&schema),
        Commands::Vocab { schema, json } => cmd_vocab(&schema, json),
    }
}

fn load_schema(path: &Path) -> Result<SchemaGraph> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut graph: SchemaGraph =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    graph
        .finalize()
        .with_context(|| format!("schema graph {} is inconsistent", path.display()))?;
    Ok(graph)
}

fn report_findings(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{} {}", "finding:".yellow().bold(), diagnostic);
    }
}

fn cmd_compile(
    schema: &Path,
    out: Option<&Path>,
    findings: Option<&Path>,
    config: XpathConfig,
) -> Result<()> {
    let graph = load_schema(schema)?;
    let outcome = compile_schema(&graph, &config);
    report_findings(&outcome.diagnostics);

    if let Some(path) = findings {
        let json = serde_json::to_string_pretty(&outcome.diagnostics)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        eprintln!(
            "{} {}",
            "wrote".green().bold(),
            path.display().to_string().bold()
        );
    }

    let Some(document) = outcome.document else {
        eprintln!(
            "{} no rule compiled ({} skipped); no document written",
            "info:".yellow().bold(),
            outcome.skipped
        );
        return Ok(());
    };

    let xml = document.to_xml().context("serializing schematron document")?;
    match out {
        Some(path) => {
            fs::write(path, &xml).with_context(|| format!("writing {}", path.display()))?;
            eprintln!(
                "{} {} ({} compiled, {} skipped)",
                "wrote".green().bold(),
                path.display().to_string().bold(),
                outcome.compiled,
                outcome.skipped
            );
        }
        None => println!("{xml}"),
    }
    Ok(())
}

fn cmd_check(schema: &Path) -> Result<()> {
    let graph = load_schema(schema)?;
    let outcome = check_schema(&graph);
    report_findings(&outcome.diagnostics);
    if outcome.skipped > 0 {
        bail!(
            "{} of {} rules failed to check",
            outcome.skipped,
            outcome.checked + outcome.skipped
        );
    }
    eprintln!(
        "{} {} rules check",
        "ok".green().bold(),
        outcome.checked
    );
    Ok(())
}

fn cmd_vocab(schema: &Path, json: bool) -> Result<()> {
    let graph = load_schema(schema)?;
    let vocabulary = Vocabulary::from_graph(&graph);
    if json {
        println!("{}", serde_json::to_string_pretty(&vocabulary)?);
        return Ok(());
    }
    println!("{}", "nouns:".bold());
    for noun in &vocabulary.nouns {
        println!("  {noun}");
    }
    println!("{}", "verbs:".bold());
    for verb in &vocabulary.verbs {
        println!("  {verb}");
    }
    Ok(())
}
