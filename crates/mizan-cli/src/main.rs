//! Mizan CLI - LLM debates and Quran citation verification
//!
//! # Usage
//!
//! ```bash
//! # Run a three-round debate and save JSON + HTML
//! mizan debate openai gpt-4o "Free will is an illusion" --html
//!
//! # Extract citations from every debate record in a directory
//! mizan extract ./debates --output citation_analysis_results.json
//!
//! # Verify the Quran quotes found by extraction
//! mizan verify citation_analysis_results.json --output combined_results.csv
//!
//! # Show backends and translations
//! mizan info
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;

use commands::{debate, extract, info, verify};

/// Mizan - weigh both sides, then check the sources
///
/// Two LLM agents debate a proposition; their citations are extracted and
/// Quran quotes are checked against published translations.
#[derive(Parser)]
#[command(
    name = "mizan",
    version,
    about = "Mizan CLI - LLM debates with citation verification",
    long_about = "Mizan runs For/Against debates between LLM agents,\n\
                  extracts the citations they make, and verifies Quran\n\
                  quotes against nine English translations."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a debate and save its record
    #[command(name = "debate")]
    Debate(debate::DebateArgs),

    /// Extract citations and entities from debate records
    #[command(name = "extract")]
    Extract(extract::ExtractArgs),

    /// Verify extracted Quran citations and write a CSV report
    #[command(name = "verify")]
    Verify(verify::VerifyArgs),

    /// Show backends, configuration and translations
    #[command(name = "info")]
    Info(info::InfoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Debate(args) => debate::run(args).await,
        Commands::Extract(args) => extract::run(args).await,
        Commands::Verify(args) => verify::run(args).await,
        Commands::Info(args) => info::run(args),
    }
}

/// Setup logging based on verbosity level
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

/// Print a success message with a checkmark
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("{} {}", "⚠".yellow().bold(), msg);
}

/// Print an info message
pub fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_debate_args() {
        let cli = Cli::try_parse_from(["mizan", "debate", "ollama", "llama3", "Tea beats coffee", "--rounds", "2"]).unwrap();
        match cli.command {
            Commands::Debate(args) => {
                assert_eq!(args.topic, "Tea beats coffee");
                assert_eq!(args.rounds, 2);
                assert!(!args.html);
            }
            _ => panic!("expected debate"),
        }
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(Cli::try_parse_from(["mizan", "debate", "gemini", "m", "t"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["mizan", "-vv", "verify", "analysis.json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Verify(args) => assert_eq!(args.output.to_str(), Some("combined_results.csv")),
            _ => panic!("expected verify"),
        }
    }
}
