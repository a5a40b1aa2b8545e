//! Console output formatter for arena results

use arena_application::RequestResult;
use arena_domain::TaskState;
use colored::Colorize;

/// Formats a finished request for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete result: scoreboard first, then the winning answer
    pub fn format(result: &RequestResult) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Arena Results"));
        output.push('\n');

        output.push_str(&format!("{} {}\n\n", "Prompt:".cyan().bold(), result.prompt));

        output.push_str(&Self::section_header("Scoreboard"));
        for entry in &result.results {
            let line = match entry.state {
                TaskState::Completed => format!(
                    "{:>5}  {} ({}) - {:.1}s",
                    entry.score.to_string().bold(),
                    entry.display_name,
                    entry.category,
                    entry.elapsed_seconds,
                ),
                TaskState::Error => format!(
                    "{:>5}  {} ({}) - {}",
                    "x".red(),
                    entry.display_name,
                    entry.category,
                    entry.error_detail.as_deref().unwrap_or("failed").red(),
                ),
                _ => format!(
                    "{:>5}  {} ({}) - {}",
                    "...".dimmed(),
                    entry.display_name,
                    entry.category,
                    entry.state,
                ),
            };
            output.push_str(&line);
            output.push('\n');
        }
        output.push('\n');

        match (&result.winner_id, &result.winner_display_name) {
            (Some(winner_id), Some(winner_name)) => {
                output.push_str(&Self::section_header(&format!(
                    "Winner: {winner_name} ({winner_id})"
                )));
                let winning_text = result
                    .results
                    .iter()
                    .find(|r| Some(&r.backend_id) == result.winner_id.as_ref())
                    .and_then(|r| r.response_text.as_deref())
                    .unwrap_or("");
                output.push_str(winning_text);
                output.push('\n');
            }
            _ => {
                output.push_str(&"No model produced a usable answer.\n".red().to_string());
            }
        }

        if let Some(total) = result.total_seconds {
            output.push_str(&format!("\n{} {total:.1}s\n", "Total time:".cyan().bold()));
        }

        output
    }

    fn header(title: &str) -> String {
        format!(
            "\n{}\n{}\n{}\n",
            "=".repeat(60),
            format!("  {title}").bold(),
            "=".repeat(60)
        )
    }

    fn section_header(title: &str) -> String {
        format!("{}\n{}\n", title.yellow().bold(), "-".repeat(60))
    }
}
