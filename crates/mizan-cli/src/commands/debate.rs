//! Debate command - Run a For/Against debate and save the record
//!
//! Usage:
//! ```bash
//! mizan debate openai gpt-4o "Free will is an illusion"
//! mizan debate ollama llama3 "Tea beats coffee" --rounds 1 --html
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use mizan_debate::{generate_filename, save_html, save_json, Debate, DebateConfig};
use mizan_llm::{LlmBackend, LlmConfig};

/// Arguments for the debate command
#[derive(Args)]
pub struct DebateArgs {
    /// Generation backend: openai, anthropic, ollama or mock
    pub backend: LlmBackend,

    /// Model name passed to the backend
    pub model: String,

    /// Proposition to debate
    pub topic: String,

    /// Exchange rounds between openings and conclusions
    #[arg(long, short = 'r', default_value_t = 3)]
    pub rounds: u32,

    /// Output file name without extension (default: topic and timestamp)
    #[arg(long, short = 'f', value_name = "NAME")]
    pub filename: Option<String>,

    /// Also write an HTML rendering
    #[arg(long)]
    pub html: bool,

    /// Directory for the output files
    #[arg(long, short = 'o', value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,

    /// Token limit per turn
    #[arg(long, default_value_t = 2048)]
    pub max_tokens: u32,
}

/// Run the debate command
pub async fn run(args: DebateArgs) -> Result<()> {
    let config = LlmConfig::from_env().context("Invalid configuration")?;
    let llm = config
        .provider(args.backend, &args.model)
        .with_context(|| format!("Cannot use backend '{}'", args.backend))?;

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Cannot create output directory: {}", args.output_dir.display()))?;

    println!("{}", "⚖ Mizan Debate".bold().cyan());
    println!("{}", "═".repeat(40).cyan());
    println!("  {} {}", "Topic:".dimmed(), args.topic);
    println!("  {} {} / {}", "Backend:".dimmed(), args.backend, args.model);
    println!("  {} {}", "Rounds:".dimmed(), args.rounds);
    println!();

    let debate_config = DebateConfig::new(&args.topic, &args.model, args.backend.as_str())
        .with_rounds(args.rounds)
        .with_limits(args.temperature, args.max_tokens);
    let mut debate = Debate::new(llm, debate_config);

    let record = debate
        .run()
        .await
        .context("Debate aborted; no record was written")?;

    let name = args
        .filename
        .unwrap_or_else(|| generate_filename(&args.topic, Local::now().naive_local()));

    let json_path = save_json(&record, &args.output_dir, &name)
        .with_context(|| format!("Failed to write {name}.json"))?;
    crate::print_success(&format!("Debate saved to {}", json_path.display()));

    if args.html {
        let html_path = save_html(&record, &args.output_dir, &name)
            .with_context(|| format!("Failed to write {name}.html"))?;
        crate::print_success(&format!("HTML saved to {}", html_path.display()));
    }

    crate::print_info(&format!(
        "{} turns in {:.2}s",
        debate.transcript().len(),
        record.metadata.time_taken
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_debate_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let args = DebateArgs {
            backend: LlmBackend::Mock,
            model: "mock-model".to_string(),
            topic: "Tea beats coffee".to_string(),
            rounds: 1,
            filename: Some("tea".to_string()),
            html: true,
            output_dir: dir.path().to_path_buf(),
            temperature: 0.7,
            max_tokens: 256,
        };

        run(args).await.unwrap();

        let json = std::fs::read_to_string(dir.path().join("tea.json")).unwrap();
        assert!(json.contains("\"round_1\""));
        assert!(dir.path().join("tea.html").exists());
    }
}
