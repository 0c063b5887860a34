//! Output formatting for analysis results.
//!
//! Supports two output formats:
//! - JSON: the machine-readable record consumed by callers
//! - Pretty: colored terminal summary for humans

use colored::*;
use serde::{Deserialize, Serialize};

use crate::analyze::{AnalysisResult, CommitStatus};

/// JSON record printed for each analysis.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct JsonReport {
    pub language: String,
    pub ai_percentage: f64,
    pub plagiarism_percentage: f64,
    pub is_plagiarized: bool,
}

impl From<&AnalysisResult> for JsonReport {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            language: result.language.as_str().to_string(),
            ai_percentage: result.ai_percentage,
            plagiarism_percentage: result.plagiarism_percentage,
            is_plagiarized: result.is_plagiarized,
        }
    }
}

/// Render a result as a single-line JSON object.
pub fn to_json(result: &AnalysisResult) -> serde_json::Result<String> {
    serde_json::to_string(&JsonReport::from(result))
}

/// Write results in JSON format to stdout.
pub fn write_json(result: &AnalysisResult) -> anyhow::Result<()> {
    println!("{}", to_json(result)?);
    Ok(())
}

/// AI likelihoods above this are shown in red.
const AI_HIGH: f64 = 80.0;

/// Percentages from this value up are shown in yellow.
const WARN_AT: f64 = 50.0;

/// Write a human-readable summary to stdout.
///
/// `threshold` is the plagiarism threshold the result was judged against, so
/// the colour of the percentage agrees with the verdict line.
pub fn write_pretty(result: &AnalysisResult, commit: &CommitStatus, threshold: f64) {
    println!();
    println!("{} {}", "Language:".bold(), result.language.as_str().cyan());

    print!("{} ", "AI likelihood:".bold());
    write_colored_percentage(result.ai_percentage, AI_HIGH);
    if let Some(reason) = &result.scoring_degraded {
        print!(" {}", format!("(fallback: {})", reason).dimmed());
    }
    println!();

    print!("{} ", "Plagiarism:".bold());
    write_colored_percentage(result.plagiarism_percentage, threshold);
    if let Some(id) = result.best_match {
        print!(" {}", format!("(closest: submission {})", id).dimmed());
    }
    println!();

    if result.is_plagiarized {
        println!("{}", "FLAGGED: likely plagiarized".red().bold());
    } else {
        println!("{}", "OK: no close match in corpus".green());
    }

    match commit {
        CommitStatus::NotRequested => {}
        CommitStatus::Committed(id) => {
            println!("{} {}", "Committed as".dimmed(), id.to_string().dimmed());
        }
        CommitStatus::Failed(msg) => {
            println!("{} {}", "Commit failed:".red(), msg);
        }
    }
    println!();
}

/// Red strictly above `flag_above`, else yellow from [`WARN_AT`], else green.
fn percentage_color(value: f64, flag_above: f64) -> Color {
    if value > flag_above {
        Color::Red
    } else if value >= WARN_AT {
        Color::Yellow
    } else {
        Color::Green
    }
}

fn write_colored_percentage(value: f64, flag_above: f64) {
    let text = format!("{:.2}%", value);
    match percentage_color(value, flag_above) {
        Color::Red => print!("{}", text.red().bold()),
        color => print!("{}", text.color(color)),
    }
}
