use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use ralphlens_core::session::trace;
use ralphlens_core::{Analysis, AnalysisConfig, Transcript};
use ralphlens_logging::{LogEvent, LogFormat, Logger};

mod report;

#[derive(Parser, Debug)]
#[command(
    name = "ralphlens",
    about = "Workflow health analysis for coding-agent session transcripts",
    version,
    author
)]
struct Cli {
    /// Session transcript (JSON lines)
    log_file: PathBuf,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Analysis config file (default: ./ralphlens.toml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the chronological session trace instead of the analysis
    #[arg(long)]
    trace: bool,

    /// Include thinking blocks and successful results in the trace
    #[arg(short, long, requires = "trace")]
    verbose: bool,

    /// Tracing filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    /// Only report errors on stderr
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_format: LogFormat = cli.log_format.into();
    ralphlens_logging::init_tracing(&cli.log_level, log_format);
    let logger = if cli.quiet {
        Logger::quiet(log_format)
    } else {
        Logger::new(log_format)
    };

    if let Err(err) = run(&cli, &logger) {
        logger.log(&LogEvent::ErrorEncountered {
            error: format!("{:#}", err),
        });
        std::process::exit(1);
    }
}

fn run(cli: &Cli, logger: &Logger) -> Result<()> {
    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let config_source = AnalysisConfig::locate(cli.config.as_deref(), &working_dir);
    let config = AnalysisConfig::resolve(cli.config.as_deref(), &working_dir)
        .context("Failed to load analysis config")?;
    logger.log(&LogEvent::ConfigResolved {
        source: config_source,
    });

    let started = Instant::now();
    let transcript = Transcript::load(&cli.log_file)
        .with_context(|| format!("Failed to read transcript {}", cli.log_file.display()))?;
    let stats = transcript.stats();
    logger.log(&LogEvent::TranscriptLoaded {
        path: cli.log_file.clone(),
        events: transcript.len(),
        repaired: stats.repaired_lines,
        dropped: stats.dropped(),
    });

    if cli.trace {
        let entries = trace(&transcript, &config, cli.verbose);
        match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
            OutputFormat::Text => {
                for entry in &entries {
                    println!("{}", report::trace_line(entry));
                }
            }
        }
        return Ok(());
    }

    let analysis = Analysis::run(&transcript, &config);
    for (detector, findings) in report::detector_counts(&analysis) {
        logger.log(&LogEvent::DetectorFinished {
            detector: detector.to_string(),
            findings,
        });
    }
    logger.log(&LogEvent::AnalysisCompleted {
        events: analysis.event_count,
        stuck_runs: analysis.tool_runs.len(),
        environment_issues: analysis.environment_issues.len(),
        workflow_escapes: analysis.workflow_escapes.len(),
        duration_secs: started.elapsed().as_secs_f64(),
    });

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        OutputFormat::Text => print!("{}", report::digest(&analysis)),
    }
    Ok(())
}
