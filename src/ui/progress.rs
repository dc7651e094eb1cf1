use crate::ui::theme;
use crate::ui::Icons;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_message(message.to_string());
        if console::Term::stdout().is_term() {
            pb.enable_steady_tick(Duration::from_millis(100));
        }
        Self { pb }
    }

    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}

/// Determinate bar for batched work such as the embedding pass.
pub struct BatchProgress {
    pb: ProgressBar,
}

impl BatchProgress {
    pub fn new(total: usize, message: &str) -> Self {
        let pb = if console::Term::stdout().is_term() {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}") {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.set_message(message.to_string());
        Self { pb }
    }

    pub fn set_position(&self, done: usize) {
        self.pb.set_position(done as u64);
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

pub fn finish_with_summary(duration: Duration, databases: usize, tables: usize, columns: usize) {
    println!();
    println!(
        "{} {}",
        Icons::CHECK.style(theme().success.clone()),
        format!("Complete in {}", HumanDuration(duration)).style(theme().success.clone())
    );
    println!(
        "  {} {}  {} {}  {} {}",
        Icons::DATABASE.style(theme().info.clone()),
        databases,
        Icons::PACKAGE.style(theme().info.clone()),
        tables,
        Icons::LINK.style(theme().info.clone()),
        columns
    );
}
