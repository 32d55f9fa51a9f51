use cogex_timing::format_elapsed;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic line, timestamped relative to ledger construction.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub elapsed: Duration,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "# {:<15} | {:<8} | {}",
            format_elapsed(self.elapsed),
            self.level.as_str(),
            self.message
        )
    }
}

/// Append-only event log. Every entry is mirrored to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, elapsed: Duration, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => tracing::info!(target: "cogex_triggers", "{message}"),
            LogLevel::Warning => tracing::warn!(target: "cogex_triggers", "{message}"),
            LogLevel::Critical => tracing::error!(target: "cogex_triggers", "{message}"),
        }
        self.entries.push(LogEntry {
            elapsed,
            level,
            message,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn with_level(&self, level: LogLevel) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.level == level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_line_is_padded() {
        let entry = LogEntry {
            elapsed: Duration::from_micros(1_234),
            level: LogLevel::Info,
            message: "hello".into(),
        };
        assert_eq!(entry.to_string(), "# 0:00:00.001234  | info     | hello");
    }

    #[test]
    fn filter_by_level() {
        let mut log = EventLog::new();
        log.push(Duration::ZERO, LogLevel::Info, "a".into());
        log.push(Duration::ZERO, LogLevel::Critical, "b".into());
        log.push(Duration::ZERO, LogLevel::Critical, "c".into());
        assert_eq!(log.len(), 3);
        assert_eq!(log.with_level(LogLevel::Critical).count(), 2);
    }
}
