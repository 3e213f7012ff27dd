use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

/// Milestones of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    ConfigResolved {
        /// `None` when built-in defaults are in effect
        source: Option<PathBuf>,
    },
    TranscriptLoaded {
        path: PathBuf,
        events: usize,
        repaired: usize,
        dropped: usize,
    },
    DetectorFinished {
        detector: String,
        findings: usize,
    },
    AnalysisCompleted {
        events: usize,
        stuck_runs: usize,
        environment_issues: usize,
        workflow_escapes: usize,
        duration_secs: f64,
    },
    ErrorEncountered {
        error: String,
    },
}

impl LogEvent {
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Writes [`LogEvent`]s to stderr in the configured format.
pub struct Logger {
    format: LogFormat,
    quiet: bool,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            quiet: false,
        }
    }

    /// A logger that drops every event except errors.
    pub fn quiet(format: LogFormat) -> Self {
        Self {
            format,
            quiet: true,
        }
    }

    pub fn log(&self, event: &LogEvent) {
        if self.quiet && !matches!(event, LogEvent::ErrorEncountered { .. }) {
            return;
        }
        if let Some(line) = self.render(event) {
            let _ = writeln!(std::io::stderr(), "{}", line);
        }
    }

    /// The text `log` would write, or `None` when the format skips the event.
    pub fn render(&self, event: &LogEvent) -> Option<String> {
        match self.format {
            LogFormat::Json => Some(event.with_timestamp().to_string()),
            LogFormat::Pretty => Self::render_pretty(event),
            LogFormat::Compact => Some(Self::render_compact(event)),
        }
    }

    fn render_pretty(event: &LogEvent) -> Option<String> {
        let line = match event {
            LogEvent::ConfigResolved { source } => match source {
                Some(path) => format!(
                    "{} {} {}",
                    "⚙".dimmed(),
                    "Config:".dimmed(),
                    path.display().to_string().dimmed()
                ),
                None => format!("{} {}", "⚙".dimmed(), "Config: defaults".dimmed()),
            },
            LogEvent::TranscriptLoaded {
                path,
                events,
                repaired,
                dropped,
            } => {
                let mut line = format!(
                    "{} {} {} ({} events)",
                    "▶".bright_cyan(),
                    "Loaded".bright_cyan().bold(),
                    path.display(),
                    events
                );
                if *repaired > 0 {
                    line.push_str(&format!(", {}", format!("{} repaired", repaired).yellow()));
                }
                if *dropped > 0 {
                    line.push_str(&format!(", {}", format!("{} dropped", dropped).bright_red()));
                }
                line
            }
            // Per-detector detail is tracing output in pretty mode
            LogEvent::DetectorFinished { .. } => return None,
            LogEvent::AnalysisCompleted {
                events,
                stuck_runs,
                environment_issues,
                workflow_escapes,
                duration_secs,
            } => {
                let flagged = stuck_runs + environment_issues + workflow_escapes;
                let mark = if flagged == 0 {
                    "✓".bright_green()
                } else {
                    "⚠".bright_yellow()
                };
                format!(
                    "{} Analyzed {} events in {:.2}s: {} stuck runs, {} environment issues, {} workflow escapes",
                    mark, events, duration_secs, stuck_runs, environment_issues, workflow_escapes
                )
            }
            LogEvent::ErrorEncountered { error } => {
                format!("{} {}", "✗".bright_red(), error.bright_red())
            }
        };
        Some(line)
    }

    fn render_compact(event: &LogEvent) -> String {
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        match event {
            LogEvent::ConfigResolved { source } => match source {
                Some(path) => format!("[{}] config:{}", timestamp, path.display()),
                None => format!("[{}] config:defaults", timestamp),
            },
            LogEvent::TranscriptLoaded {
                events,
                repaired,
                dropped,
                ..
            } => format!(
                "[{}] load:{} repaired={} dropped={}",
                timestamp, events, repaired, dropped
            ),
            LogEvent::DetectorFinished { detector, findings } => {
                format!("[{}] detect:{}:{}", timestamp, detector, findings)
            }
            LogEvent::AnalysisCompleted {
                events,
                duration_secs,
                ..
            } => format!("[{}] done:{} {:.2}s", timestamp, events, duration_secs),
            LogEvent::ErrorEncountered { error } => format!("[{}] error:{}", timestamp, error),
        }
    }
}
