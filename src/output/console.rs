//! Operator-facing console reporting

use colored::*;
use std::sync::Mutex;

/// Sink for human-readable pipeline progress.
///
/// Passed explicitly to every component that reports; nothing writes to the console
/// behind its back.
pub trait Reporter: Send + Sync {
    fn section(&self, title: &str);
    fn info(&self, msg: &str);
    fn success(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Colored terminal output
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n{}", title.bright_yellow().bold());
            println!("{}", "=".repeat(title.len()).yellow());
        }
    }

    fn info(&self, msg: &str) {
        if !self.quiet {
            println!("\t{} {}", "INFO -".cyan(), msg);
        }
    }

    fn success(&self, msg: &str) {
        println!("{} {}", "[OK]".bright_green().bold(), msg.green());
    }

    fn warn(&self, msg: &str) {
        eprintln!("{} {}", "[!]".yellow().bold(), msg.yellow());
    }

    fn error(&self, msg: &str) {
        eprintln!("{} {}", "[ERROR]".red().bold(), msg.red());
    }
}

/// Discards everything
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn section(&self, _title: &str) {}
    fn info(&self, _msg: &str) {}
    fn success(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

/// Keeps every message in memory, tagged with its level
#[derive(Default)]
pub struct MemoryReporter {
    messages: Mutex<Vec<(&'static str, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(&'static str, String)> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Messages recorded at `level` ("section", "info", "success", "warn", "error")
    pub fn at_level(&self, level: &str) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    fn record(&self, level: &'static str, msg: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((level, msg.to_string()));
        }
    }
}

impl Reporter for MemoryReporter {
    fn section(&self, title: &str) {
        self.record("section", title);
    }

    fn info(&self, msg: &str) {
        self.record("info", msg);
    }

    fn success(&self, msg: &str) {
        self.record("success", msg);
    }

    fn warn(&self, msg: &str) {
        self.record("warn", msg);
    }

    fn error(&self, msg: &str) {
        self.record("error", msg);
    }
}

/// Print the startup banner
pub fn print_banner(program: &str) {
    let title = format!("subrecon v{}", env!("CARGO_PKG_VERSION"));
    println!("{}", "=".repeat(60).bright_cyan());
    println!("{}", title.bright_cyan().bold());
    println!(
        "{} {}",
        "Subdomain enumeration pipeline for".bright_white(),
        program.bright_yellow().bold()
    );
    println!("{}\n", "=".repeat(60).bright_cyan());
}
