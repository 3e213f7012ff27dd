//! Session-level views: iteration totals, tool usage, issue-tracker activity,
//! the task timeline and a chronological trace.

mod summary;
mod timeline;
mod trace;

pub use summary::{
    summarize, IterationSummary, Narrative, NarrativeEntry, SessionInit, SessionSummary,
    ToolUsage, TrackerCommands,
};
pub use timeline::{task_timeline, TaskAction, TaskTransition};
pub use trace::{trace, TraceEntry};
