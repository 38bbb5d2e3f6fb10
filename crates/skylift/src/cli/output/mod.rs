//! Output formatting utilities

use console::{style, Style, StyledObject};
use serde_json::Value;

use skylift_stores::{failure_count, SubmitResults};

use crate::cli::OutputFormat;

/// Kind of status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
    Warning,
    Info,
}

impl Tone {
    fn marker(self) -> StyledObject<&'static str> {
        match self {
            Tone::Success => style("✓").green().bold(),
            Tone::Error => style("✗").red().bold(),
            Tone::Warning => style("!").yellow().bold(),
            Tone::Info => style("→").blue(),
        }
    }
}

/// A message prefixed with its tone's marker
pub fn line(tone: Tone, message: &str) -> String {
    format!("{} {}", tone.marker(), message)
}

pub fn success(message: &str) {
    println!("{}", line(Tone::Success, message));
}

/// Errors go to stderr
pub fn error(message: &str) {
    eprintln!("{}", line(Tone::Error, message));
}

pub fn warning(message: &str) {
    println!("{}", line(Tone::Warning, message));
}

pub fn info(message: &str) {
    println!("{}", line(Tone::Info, message));
}

pub fn header(text: &str) -> String {
    style(text).bold().to_string()
}

/// Indented `key: value`, e.g. for a value the user should copy
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

pub fn path_style() -> Style {
    Style::new().cyan()
}

/// Results as `{"chrome": {"success": true}, ...}`
pub fn results_json(results: &SubmitResults) -> serde_json::Result<Value> {
    serde_json::to_value(results)
}

/// Print the outcome of a submission run
pub fn print_results(
    results: &SubmitResults,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results_json(results)?)?);
        }
        OutputFormat::Text => {
            if quiet && failure_count(results) == 0 {
                return Ok(());
            }
            println!();
            for text in result_lines(results) {
                println!("{}", text);
            }
        }
    }
    Ok(())
}

/// One line per attempted store, then a summary if anything failed
pub fn result_lines(results: &SubmitResults) -> Vec<String> {
    let mut lines: Vec<String> = results
        .iter()
        .map(|(store, result)| match result.error() {
            None => line(Tone::Success, &format!("{}: submitted", store.display_name())),
            Some(e) => line(Tone::Error, &format!("{}: {}", store.display_name(), e)),
        })
        .collect();

    let failed = failure_count(results);
    if failed > 0 {
        lines.push(String::new());
        lines.push(header(&format!(
            "{} of {} submissions failed",
            failed,
            results.len()
        )));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use skylift_stores::{StoreError, StoreId, SubmissionResult};

    #[test]
    fn test_results_json_shape() {
        let mut results = SubmitResults::new();
        results.insert(StoreId::Chrome, SubmissionResult::Success);
        results.insert(
            StoreId::Firefox,
            SubmissionResult::Failure {
                error: StoreError::Timeout("Waiting for validation results".to_string()),
            },
        );

        let json = results_json(&results).unwrap();

        assert_eq!(json["chrome"], serde_json::json!({ "success": true }));
        assert_eq!(json["firefox"]["success"], false);
        assert!(json["firefox"]["error"]
            .as_str()
            .unwrap()
            .contains("Waiting for validation results"));
        assert!(json.get("edge").is_none());
    }

    #[test]
    fn test_result_lines_end_with_failure_summary() {
        console::set_colors_enabled(false);
        let mut results = SubmitResults::new();
        results.insert(StoreId::Chrome, SubmissionResult::Success);
        results.insert(
            StoreId::Edge,
            SubmissionResult::Failure {
                error: StoreError::AuthenticationFailed("401 - bad key".to_string()),
            },
        );

        let lines = result_lines(&results);

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "✓ Chrome Web Store: submitted");
        assert!(lines[1].starts_with("✗ Edge Addon Store: "));
        assert!(lines[1].contains("401 - bad key"));
        assert_eq!(lines[3], "1 of 2 submissions failed");
    }
}
