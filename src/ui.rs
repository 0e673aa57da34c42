//! Terminal output for the `nrvna` binary: spinners and colored messages.
//!
//! Uses `indicatif` for the single-shot progress spinner and `console` for
//! styling. Results and job IDs go to stdout undecorated so they can be
//! piped; everything else is decoration on stderr.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use nrvna::job::JobId;

/// Spinner shown while a single-shot batch runs.
pub struct BatchProgress {
    pb: ProgressBar,
    green: Style,
    yellow: Style,
}

impl BatchProgress {
    pub fn start(workspace: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Processing queued jobs in {workspace}"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Clears the spinner and prints the processed count.
    pub fn finish(&self, processed: usize) {
        self.pb.finish_and_clear();
        if processed == 0 {
            eprintln!("  {} No jobs completed", self.yellow.apply_to("∅"));
        } else {
            eprintln!("  {} {processed} job(s) completed", self.green.apply_to("✓"));
        }
        println!("{processed}");
    }

    /// Clears the spinner without reporting a count.
    pub fn abandon(&self) {
        self.pb.finish_and_clear();
    }
}

/// Prints the ID of a freshly submitted job.
pub fn print_submitted(id: &JobId) {
    println!("{id}");
}

/// Prints a retrieved result, or a dim notice on stderr if there is none.
pub fn print_result(result: Option<&str>) {
    match result {
        Some(text) if !text.is_empty() => println!("{text}"),
        _ => eprintln!("{}", Style::new().dim().apply_to("no result")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abandon_clears_spinner_without_finishing_count() {
        let progress = BatchProgress::start("./data");
        progress.abandon();
        assert!(progress.pb.is_finished());
    }

    #[test]
    fn missing_or_empty_result_prints_notice() {
        print_result(None);
        print_result(Some(""));
        print_result(Some("text"));
    }
}
