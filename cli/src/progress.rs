//! Live progress rendering for one request

use arena_application::ArenaEvent;
use arena_domain::{PanelConfig, TaskState};
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Renders one spinner per panel member, driven by the request's event stream
pub struct ProgressRenderer {
    multi: MultiProgress,
    bars: HashMap<String, ProgressBar>,
    overall: ProgressBar,
}

impl ProgressRenderer {
    pub fn new(panel: &PanelConfig) -> Self {
        let multi = MultiProgress::new();

        let overall = multi.add(ProgressBar::new(100));
        overall.set_style(Self::overall_style());
        overall.set_prefix("Panel");

        let mut bars = HashMap::new();
        for spec in panel.iter() {
            let bar = multi.add(ProgressBar::new_spinner());
            bar.set_style(Self::spinner_style());
            bar.set_prefix(spec.display_name.clone());
            bar.set_message("pending");
            bars.insert(spec.id.to_string(), bar);
        }

        Self { multi, bars, overall }
    }

    fn overall_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap()
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap()
    }

    /// Consume events until the request completes or the stream closes
    pub async fn run(self, mut events: broadcast::Receiver<ArenaEvent>) {
        loop {
            match events.recv().await {
                Ok(ArenaEvent::ModelUpdate {
                    model,
                    status,
                    progress,
                    score,
                    ..
                }) => {
                    self.overall.set_position(progress as u64);
                    if let Some(bar) = self.bars.get(model.as_str()) {
                        match status {
                            TaskState::Pending => bar.set_message("pending"),
                            TaskState::Processing => bar.set_message("thinking..."),
                            TaskState::Completed => {
                                let score = score.unwrap_or(0);
                                bar.finish_with_message(format!(
                                    "{} score {}",
                                    "v".green(),
                                    score.to_string().bold()
                                ));
                            }
                            TaskState::Error => {
                                bar.finish_with_message(format!("{} failed", "x".red()));
                            }
                        }
                    }
                }
                Ok(ArenaEvent::RequestComplete { winner_model, .. }) => {
                    let message = match winner_model {
                        Some(winner) => format!("winner: {}", winner.to_string().green().bold()),
                        None => "no winner".red().to_string(),
                    };
                    self.overall.finish_with_message(message);
                    break;
                }
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(_)) => {}
            }
        }
        let _ = self.multi.clear();
    }
}

/// Wait for completion without rendering anything (for --quiet)
pub async fn wait_for_completion(mut events: broadcast::Receiver<ArenaEvent>) {
    loop {
        match events.recv().await {
            Ok(ArenaEvent::RequestComplete { .. }) => break,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Closed) => break,
            Err(broadcast::error::RecvError::Lagged(_)) => {}
        }
    }
}
