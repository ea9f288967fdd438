//! Verify command - Check extracted Quran quotes against translations
//!
//! Usage:
//! ```bash
//! mizan verify citation_analysis_results.json
//! mizan verify analysis.json --output report.csv
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use std::path::PathBuf;
use std::sync::Arc;

use mizan_citations::{
    load_analyses, verify_analyses, BatchSummary, CitationVerifier, QuranComClient, TranslationFetcher,
    TranslationRegistry,
};
use mizan_llm::MizanConfig;

/// Arguments for the verify command
#[derive(Args)]
pub struct VerifyArgs {
    /// Analysis file written by `mizan extract`
    pub input: PathBuf,

    /// CSV report to write
    #[arg(long, short = 'o', value_name = "FILE", default_value = "combined_results.csv")]
    pub output: PathBuf,
}

/// Run the verify command
pub async fn run(args: VerifyArgs) -> Result<()> {
    let config = MizanConfig::from_env().context("Invalid configuration")?;
    let analyses = load_analyses(&args.input)
        .with_context(|| format!("Failed to read analysis file: {}", args.input.display()))?;

    println!("{}", "📖 Citation Verification".bold().cyan());
    println!("{}", "═".repeat(40).cyan());
    println!("  {} {}", "Input:".dimmed(), args.input.display());
    println!("  {} {}", "Records:".dimmed(), analyses.len());
    println!("  {} {}", "Lookup:".dimmed(), config.quran_api_url);
    println!();

    let client = QuranComClient::from_config(&config);
    let fetcher = TranslationFetcher::new(Arc::new(client), TranslationRegistry::standard());
    let verifier = CitationVerifier::new(fetcher);

    let report = verify_analyses(&verifier, &analyses).await;
    report
        .save_csv(&args.output)
        .with_context(|| format!("Failed to write report: {}", args.output.display()))?;

    println!("{}", summary_table(&report.summary));
    println!();

    if report.summary.unavailable > 0 {
        crate::print_warning(&format!(
            "{} citation(s) could not be checked because verse lookup failed",
            report.summary.unavailable
        ));
    }
    crate::print_success(&format!(
        "{} row(s) written to {}",
        report.rows.len(),
        args.output.display()
    ));
    Ok(())
}

fn summary_table(summary: &BatchSummary) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Outcome").fg(Color::Cyan),
            Cell::new("Citations").fg(Color::Cyan),
        ]);

    let rows = [
        ("Verified", summary.verified, Color::Green),
        ("Unmatched", summary.unmatched, Color::Red),
        ("Skipped", summary.skipped, Color::White),
        ("Unavailable", summary.unavailable, Color::Yellow),
        ("Malformed", summary.malformed, Color::Magenta),
    ];
    for (label, count, color) in rows {
        table.add_row(vec![Cell::new(label).fg(color), Cell::new(count)]);
    }
    table
}
