// src/utils/log.rs

//! Run log with server-style formatting.
//!
//! Every line is mirrored to the `log` facade and kept in memory so the
//! pipeline can write it to `run.log` when the run ends.

use chrono::Local;

/// Log level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn facade(&self) -> log::Level {
        match self {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

/// Format a log message with timestamp and level
fn format_log(level: LogLevel, message: &str) -> String {
    let timestamp = Local::now().format("%H:%M:%S");
    format!("[{}] [{}] {}", timestamp, level.as_str(), message)
}

/// Timestamped lines of a single run.
#[derive(Debug, Default)]
pub struct RunLog {
    lines: Vec<String>,
    verbose: bool,
}

impl RunLog {
    pub fn new(verbose: bool) -> Self {
        Self {
            lines: Vec::new(),
            verbose,
        }
    }

    fn record(&mut self, level: LogLevel, message: &str) {
        log::log!(level.facade(), "{}", message);
        if level == LogLevel::Debug && !self.verbose {
            return;
        }
        self.lines.push(format_log(level, message));
    }

    /// Log a debug message (kept only in verbose runs)
    pub fn debug(&mut self, message: impl AsRef<str>) {
        self.record(LogLevel::Debug, message.as_ref());
    }

    /// Log an info message
    pub fn info(&mut self, message: impl AsRef<str>) {
        self.record(LogLevel::Info, message.as_ref());
    }

    /// Log a warning message
    pub fn warn(&mut self, message: impl AsRef<str>) {
        self.record(LogLevel::Warn, message.as_ref());
    }

    /// Log an error message
    pub fn error(&mut self, message: impl AsRef<str>) {
        self.record(LogLevel::Error, message.as_ref());
    }

    /// Log a header
    pub fn header(&mut self, title: &str) {
        let border = "═".repeat(60);
        self.info(&border);
        self.info(format!("  {}", title));
        self.info(&border);
    }

    /// Log a summary section
    pub fn summary(&mut self, title: &str, items: &[(&str, String)]) {
        self.info(format!("[SUMMARY] {}", title));
        for (key, value) in items {
            self.info(format!("    {}: {}", key, value));
        }
    }

    /// Whole log as file content.
    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_lines_carry_level() {
        let mut run_log = RunLog::new(false);
        run_log.info("started");
        run_log.warn("weekText absent");
        run_log.debug("hidden");

        let rendered = run_log.render();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] started"));
        assert!(lines[1].contains("[WARN] weekText absent"));
        assert!(run_log.render().ends_with('\n'));
    }

    #[test]
    fn test_verbose_keeps_debug() {
        let mut run_log = RunLog::new(true);
        run_log.debug("detail");
        assert!(run_log.render().contains("[DEBUG] detail"));
    }

    #[test]
    fn test_summary_lines() {
        let mut run_log = RunLog::new(false);
        run_log.summary("Run", &[("records", "3".to_string())]);
        let rendered = run_log.render();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with("    records: 3"));
    }
}
