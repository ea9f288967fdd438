//! Info command - Show backends, configuration and translations
//!
//! Usage:
//! ```bash
//! mizan info
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use mizan_citations::TranslationRegistry;
use mizan_llm::{LlmBackend, MizanConfig};

/// Arguments for the info command
#[derive(Args)]
pub struct InfoArgs;

/// Run the info command
pub fn run(_args: InfoArgs) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let config = MizanConfig::from_env().context("Invalid configuration")?;

    println!("{}", "Mizan - LLM Debates with Citation Verification".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!();

    println!("{}", "Version Information:".bold());
    println!("  {} {}", "CLI Version:".dimmed(), version.green());
    println!();

    println!("{}", "Generation Backends:".bold());
    for backend in LlmBackend::ALL {
        let status = if config.llm.is_configured(backend) {
            "✓".green()
        } else {
            "✗".red()
        };
        let detail = match (backend, backend.credential_var()) {
            (LlmBackend::Ollama, _) => config.llm.ollama_url.clone(),
            (LlmBackend::Mock, _) => "offline, deterministic".to_string(),
            (_, Some(var)) => var.to_string(),
            (_, None) => String::new(),
        };
        println!("  {} {:<10} {}", status, backend.as_str(), detail.dimmed());
    }
    println!();

    println!("{}", "Timeouts:".bold());
    println!(
        "  {} {}s x {} attempts",
        "Generation:".dimmed(),
        config.llm.retry.attempt_timeout.as_secs(),
        config.llm.retry.max_attempts
    );
    println!(
        "  {} {}s x {} attempts",
        "Verse lookup:".dimmed(),
        config.lookup_retry.attempt_timeout.as_secs(),
        config.lookup_retry.max_attempts
    );
    println!("  {} {}", "Lookup service:".dimmed(), config.quran_api_url);
    println!();

    println!("{}", "Translations:".bold());
    let registry = TranslationRegistry::standard();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("ID").fg(Color::Cyan),
            Cell::new("Name").fg(Color::Cyan),
            Cell::new("Author").fg(Color::Cyan),
        ]);
    for translation in registry.iter() {
        let name = if translation.id == registry.default_id() {
            Cell::new(format!("{} (default)", translation.name)).fg(Color::Yellow)
        } else {
            Cell::new(translation.name).fg(Color::Green)
        };
        table.add_row(vec![Cell::new(translation.id), name, Cell::new(translation.author)]);
    }
    println!("{table}");
    println!();

    println!("{}", "Configuration:".bold());
    println!(
        "  {} OPENAI_API_KEY, ANTHROPIC_API_KEY, OLLAMA_URL, QURAN_API_URL,",
        "ℹ".blue()
    );
    println!("    MIZAN_REQUEST_TIMEOUT_SECS, MIZAN_MAX_RETRIES, RUST_LOG");
    println!();

    Ok(())
}
