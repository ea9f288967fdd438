//! Extract command - Pull citations and entities out of debate records
//!
//! Usage:
//! ```bash
//! mizan extract ./debates
//! mizan extract ./debates --backend anthropic --model claude-3-5-sonnet-latest
//! ```

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use std::path::PathBuf;

use mizan_citations::{save_analyses, CitationAnalyzer};
use mizan_llm::{LlmBackend, LlmConfig};

/// Arguments for the extract command
#[derive(Args)]
pub struct ExtractArgs {
    /// Directory containing debate record JSON files
    pub directory: PathBuf,

    /// Output file for the analysis
    #[arg(long, short = 'o', value_name = "FILE", default_value = "citation_analysis_results.json")]
    pub output: PathBuf,

    /// Backend used for citation and entity extraction
    #[arg(long, short = 'b', default_value = "openai")]
    pub backend: LlmBackend,

    /// Model used for extraction
    #[arg(long, short = 'm', default_value = "gpt-4")]
    pub model: String,
}

/// Run the extract command
pub async fn run(args: ExtractArgs) -> Result<()> {
    if !args.directory.is_dir() {
        bail!("The directory '{}' does not exist", args.directory.display());
    }

    let config = LlmConfig::from_env().context("Invalid configuration")?;
    let llm = config
        .provider(args.backend, &args.model)
        .with_context(|| format!("Cannot use backend '{}'", args.backend))?;

    println!("{}", "🔎 Citation Extraction".bold().cyan());
    println!("{}", "═".repeat(40).cyan());
    println!("  {} {}", "Input:".dimmed(), args.directory.display());
    println!("  {} {} / {}", "Backend:".dimmed(), args.backend, args.model);
    println!();

    let analyzer = CitationAnalyzer::with_llm(llm);
    let analyses = analyzer
        .analyze_dir(&args.directory)
        .await
        .context("Extraction failed")?;

    if analyses.is_empty() {
        crate::print_warning("No debate records could be analyzed");
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("File").fg(Color::Cyan),
            Cell::new("Sections").fg(Color::Cyan),
            Cell::new("Pattern citations").fg(Color::Cyan),
            Cell::new("LLM citations (for / against)").fg(Color::Cyan),
        ]);

    for analysis in &analyses {
        let pattern_citations = analysis.combined_for.citations.len() + analysis.combined_against.citations.len();
        table.add_row(vec![
            Cell::new(&analysis.filename).fg(Color::Green),
            Cell::new(analysis.debate_analysis.len()),
            Cell::new(pattern_citations),
            Cell::new(format!(
                "{} / {}",
                analysis.combined_for.citations_llm.len(),
                analysis.combined_against.citations_llm.len()
            ))
            .fg(Color::Yellow),
        ]);
    }
    println!("{table}");
    println!();

    save_analyses(&args.output, &analyses).context("Failed to write analysis")?;
    crate::print_success(&format!(
        "{} file(s) analyzed, results saved to {}",
        analyses.len(),
        args.output.display()
    ));
    Ok(())
}
