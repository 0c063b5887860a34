//! Command-line interface for copycheck.

use clap::{ArgGroup, Parser, Subcommand};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analyze::{AnalysisRequest, Analyzer, CommitStatus};
use crate::config::{self, Config};
use crate::corpus;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FLAGGED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Submission analysis gate - language, plagiarism, and machine authorship.
///
/// Copycheck classifies a submission's language, compares it against earlier
/// submissions in the same language, and estimates how likely it is to be
/// machine-written.
#[derive(Parser)]
#[command(name = "copycheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze one submission
    #[command(visible_alias = "check")]
    Analyze(AnalyzeArgs),
    /// Inspect the corpus
    Corpus(CorpusArgs),
    /// Write a default configuration file
    Init(InitArgs),
}

/// Arguments for the analyze command.
#[derive(Parser)]
#[command(group(ArgGroup::new("source").required(true).args(["code", "code_file"])))]
pub struct AnalyzeArgs {
    /// Code to analyze
    #[arg(long)]
    pub code: Option<String>,

    /// Path to a file containing the code to analyze
    #[arg(long)]
    pub code_file: Option<PathBuf>,

    /// Original filename, used for extension-based language detection
    #[arg(long)]
    pub filename: Option<String>,

    /// Add the submission to the corpus after analysis
    #[arg(long)]
    pub insert: bool,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Corpus location (overrides the config)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Output format: json or pretty
    #[arg(short, long, default_value = "json")]
    pub format: String,
}

/// Arguments for the corpus command.
#[derive(Parser)]
pub struct CorpusArgs {
    #[command(subcommand)]
    pub command: CorpusCommands,
}

#[derive(Subcommand)]
pub enum CorpusCommands {
    /// Show submission counts per language
    Stats {
        /// Path to config YAML file (default: auto-discover)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Corpus location (overrides the config)
        #[arg(long)]
        corpus: Option<PathBuf>,
    },
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "copycheck.yaml")]
    pub output: PathBuf,
}

/// Problems with the request itself, reported before any analysis.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("exactly one of --code or --code-file is required")]
    MissingInput,
    #[error("cannot read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolve the code text and the filename used for classification.
///
/// With `--code-file` and no `--filename`, the file's own name is used.
pub fn read_input(args: &AnalyzeArgs) -> Result<(String, Option<String>), InputError> {
    match (&args.code, &args.code_file) {
        (Some(code), None) => Ok((code.clone(), args.filename.clone())),
        (None, Some(path)) => {
            let code = std::fs::read_to_string(path).map_err(|source| InputError::Unreadable {
                path: path.clone(),
                source,
            })?;
            let filename = args.filename.clone().or_else(|| {
                path.file_name()
                    .map(|name| name.to_string_lossy().to_string())
            });
            Ok((code, filename))
        }
        _ => Err(InputError::MissingInput),
    }
}

/// Load config, applying a command-line corpus override.
fn load_config(config_path: Option<&Path>, corpus: Option<&PathBuf>) -> anyhow::Result<Config> {
    let mut config = Config::load(config_path)?;
    if let Some(path) = corpus {
        config.corpus = Some(path.clone());
    }
    Ok(config)
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "json" && args.format != "pretty" {
        eprintln!(
            "Error: invalid format {:?}, must be 'json' or 'pretty'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let config = match load_config(args.config.as_deref(), args.corpus.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: invalid config: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let (code, filename) = match read_input(args) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let corpus_path = config.corpus_path();
    let store = match corpus::open(config.backend, &corpus_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: cannot open corpus {}: {}", corpus_path.display(), e);
            return Ok(EXIT_ERROR);
        }
    };

    let analyzer = Analyzer::from_config(&config, store)?;
    let request = AnalysisRequest::new(&code)
        .filename(filename.as_deref())
        .commit(args.insert);
    let outcome = analyzer.run(&request)?;

    match args.format.as_str() {
        "pretty" => {
            report::write_pretty(&outcome.result, &outcome.commit, config.plagiarism_threshold)
        }
        _ => report::write_json(&outcome.result)?,
    }

    // A failed commit is an error even though the report was produced
    if let CommitStatus::Failed(msg) = &outcome.commit {
        eprintln!("Error: failed to commit submission: {}", msg);
        return Ok(EXIT_ERROR);
    }

    if outcome.result.is_plagiarized {
        Ok(EXIT_FLAGGED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the corpus command.
pub fn run_corpus(args: &CorpusArgs) -> anyhow::Result<i32> {
    match &args.command {
        CorpusCommands::Stats { config, corpus } => {
            let config = load_config(config.as_deref(), corpus.as_ref())?;
            let path = config.corpus_path();
            let store = corpus::open(config.backend, &path)?;
            let stats = store.stats()?;

            println!("Corpus: {}", path.display());
            if stats.is_empty() {
                println!("  (empty)");
            }
            for (language, count) in stats {
                println!("  {:<12} {}", language.as_str(), count);
            }
            Ok(EXIT_SUCCESS)
        }
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, config::TEMPLATE) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to set the corpus location and thresholds", args.output.display());
    println!(
        "  2. Run: copycheck analyze --code-file <file> --config {}",
        args.output.display()
    );

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("copycheck").chain(args.iter().copied()))
    }

    fn analyze_args(args: &[&str]) -> AnalyzeArgs {
        match parse(args).unwrap().command {
            Commands::Analyze(a) => a,
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_code_and_code_file_are_exclusive() {
        assert!(parse(&["analyze", "--code", "x", "--code-file", "a.py"]).is_err());
        assert!(parse(&["analyze"]).is_err());
        assert!(parse(&["analyze", "--code", "x"]).is_ok());
    }

    #[test]
    fn test_read_inline_input() {
        let args = analyze_args(&["analyze", "--code", "print(1)", "--filename", "a.py"]);
        let (code, filename) = read_input(&args).unwrap();
        assert_eq!(code, "print(1)");
        assert_eq!(filename.as_deref(), Some("a.py"));
    }

    #[test]
    fn test_code_file_name_is_used_for_detection() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("main.go");
        std::fs::write(&path, "package main").unwrap();

        let args = analyze_args(&["analyze", "--code-file", path.to_str().unwrap()]);
        let (code, filename) = read_input(&args).unwrap();
        assert_eq!(code, "package main");
        assert_eq!(filename.as_deref(), Some("main.go"));

        let args = analyze_args(&[
            "analyze",
            "--code-file",
            path.to_str().unwrap(),
            "--filename",
            "other.rs",
        ]);
        assert_eq!(read_input(&args).unwrap().1.as_deref(), Some("other.rs"));
    }

    #[test]
    fn test_unreadable_file_is_input_error() {
        let args = analyze_args(&["analyze", "--code-file", "/nonexistent/copycheck/x.py"]);
        assert!(matches!(read_input(&args), Err(InputError::Unreadable { .. })));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("conf").join("copycheck.yaml");
        let args = InitArgs {
            output: output.clone(),
        };

        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        assert!(Config::parse_file(&output).is_ok());
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
    }
}
