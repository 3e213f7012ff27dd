//! Text rendering of analysis findings and session traces.

use std::fmt::Write;

use colored::Colorize;

use ralphlens_core::session::TraceEntry;
use ralphlens_core::Analysis;

/// Findings per detector, in report order.
pub fn detector_counts(analysis: &Analysis) -> Vec<(&'static str, usize)> {
    vec![
        ("tool_runs", analysis.tool_runs.len()),
        ("bash_sequences", analysis.bash_sequences.len()),
        ("recoveries", analysis.recoveries.recoveries.len()),
        ("read_before_edit", analysis.read_before_edit.total_edits),
        ("environment_issues", analysis.environment_issues.len()),
        ("test_attempts", analysis.test_attempts.total()),
        ("categories", analysis.categories.total),
        ("workflow_escapes", analysis.workflow_escapes.len()),
        ("task_timeline", analysis.task_timeline.len()),
    ]
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", title.bright_blue().bold());
}

fn row(out: &mut String, label: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "  {:<22} {}", format!("{}:", label).dimmed(), value);
}

/// Counts-only digest of an analysis.
pub fn digest(analysis: &Analysis) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=== Session Analysis ===".bright_blue().bold());

    let session = &analysis.session;
    if let Some(init) = &session.init {
        row(&mut out, "Model", init.model.as_deref().unwrap_or("unknown"));
        row(&mut out, "Working dir", init.cwd.as_deref().unwrap_or("unknown"));
    }
    row(&mut out, "Events", analysis.event_count);
    if analysis.decode.dropped() > 0 || analysis.decode.repaired_lines > 0 {
        row(
            &mut out,
            "Decode",
            format!(
                "{} repaired, {} dropped",
                analysis.decode.repaired_lines,
                analysis.decode.dropped()
            ),
        );
    }

    heading(&mut out, "Iterations");
    let iterations = &session.iterations;
    row(&mut out, "Started", iterations.started);
    row(&mut out, "Completed", iterations.completed);
    row(&mut out, "Failures", iterations.failures);
    row(&mut out, "Total time", format!("{:.0}s", iterations.total_seconds));
    if let Some(wall_clock) = iterations.wall_clock_seconds {
        row(&mut out, "Wall clock", format!("{:.0}s", wall_clock));
    }

    heading(&mut out, "Tools");
    row(&mut out, "Invocations", session.total_invocations);
    row(&mut out, "Errors", session.tool_errors);
    for usage in session.tool_usage.iter().take(5) {
        row(&mut out, &usage.name, usage.count);
    }

    heading(&mut out, "Categories");
    for category in analysis.categories.ranked() {
        if category.count > 0 {
            row(
                &mut out,
                &category.name,
                format!("{} ({:.1}%)", category.count, category.percent),
            );
        }
    }
    let efficiency = &analysis.categories.efficiency;
    row(
        &mut out,
        "Productive",
        format!("{:.1}%", efficiency.productive.percent),
    );
    row(&mut out, "Overhead", format!("{:.1}%", efficiency.overhead.percent));
    row(&mut out, "Workflow", format!("{:.1}%", efficiency.workflow.percent));

    heading(&mut out, "Findings");
    let tests = &analysis.test_attempts;
    row(
        &mut out,
        "Test attempts",
        format!("{} ({} passed, {} failed)", tests.total(), tests.passed, tests.failed),
    );
    let rbe = &analysis.read_before_edit;
    row(
        &mut out,
        "Read before edit",
        format!(
            "{}/{} ({:.1}%)",
            rbe.edits_with_read,
            rbe.total_edits,
            rbe.coverage() * 100.0
        ),
    );
    row(&mut out, "Recoveries", analysis.recoveries.recoveries.len());
    if let Some(index) = analysis.recoveries.unresolved {
        row(&mut out, "Unresolved error", format!("event {}", index));
    }
    flag(&mut out, "Stuck runs", analysis.tool_runs.len());
    flag(&mut out, "Bash sequences", analysis.bash_sequences.len());
    flag(&mut out, "Environment issues", analysis.environment_issues.len());
    flag(&mut out, "Workflow escapes", analysis.workflow_escapes.len());

    let tracker = &session.tracker;
    row(
        &mut out,
        "Tracker",
        format!(
            "{} commands ({} create, {} update, {} close)",
            tracker.commands.len(),
            tracker.creates,
            tracker.updates,
            tracker.closes
        ),
    );
    out
}

/// A row that turns yellow when anything was found.
fn flag(out: &mut String, label: &str, count: usize) {
    if count == 0 {
        row(out, label, count.to_string().green());
    } else {
        row(out, label, count.to_string().bright_yellow());
    }
}

/// One line of the stream-style trace.
pub fn trace_line(entry: &TraceEntry) -> String {
    match entry {
        TraceEntry::IterationStart {
            timestamp,
            iteration,
            mode,
            issue_id,
            ..
        } => {
            let mut line = format!("=== Iteration {}", display_or(iteration, "?"));
            if let Some(mode) = mode {
                line.push_str(&format!(" [{}]", mode));
            }
            if let Some(issue) = issue_id {
                line.push_str(&format!(" {}", issue));
            }
            if !timestamp.is_empty() {
                line.push_str(&format!(" @ {}", timestamp));
            }
            line
        }
        TraceEntry::IterationEnd {
            iteration,
            duration_seconds,
            exit_code,
            ..
        } => format!(
            "=== Iteration {} done ({}s, exit {})",
            display_or(iteration, "?"),
            display_or(duration_seconds, "?"),
            display_or(exit_code, "?")
        ),
        TraceEntry::Init { cwd, model, .. } => format!(
            "[init] {} in {}",
            model,
            cwd.as_deref().unwrap_or("unknown")
        ),
        TraceEntry::Thinking { text, .. } => format!("  (thinking) {}", text),
        TraceEntry::Thought { text, .. } => format!("  > {}", text),
        TraceEntry::Shell { command, .. } => format!("  $ {}", command),
        TraceEntry::Read { file_path, .. } => format!("  read {}", file_path),
        TraceEntry::Edit { file_path, .. } => format!("  edit {}", file_path),
        TraceEntry::Write { file_path, .. } => format!("  write {}", file_path),
        TraceEntry::Tool { name, input, .. } => format!("  {} {}", name, input),
        TraceEntry::Error { preview, .. } => format!(
            "    ✗ {}",
            preview.as_deref().unwrap_or("<structured output>")
        ),
        TraceEntry::Result { preview, .. } => format!(
            "    → {}",
            preview.as_deref().unwrap_or("<structured output>")
        ),
    }
}

fn display_or<T: std::fmt::Display>(value: &Option<T>, fallback: &str) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| fallback.to_string())
}
