//! # ralphlens-core
//!
//! Workflow-health analysis for coding-agent session transcripts.
//!
//! A transcript is a JSONL log of loop markers, assistant turns (thinking,
//! text, tool invocations) and user turns (tool results). This crate decodes
//! it into an immutable [`Transcript`], correlates every tool invocation with
//! its result through a [`ToolCallIndex`], and runs a set of independent
//! detectors over both.
//!
//! ## Key Types
//!
//! - [`Decoder`] - line decoding with an explicit repair policy
//! - [`Transcript`] - ordered, indexed events plus decode statistics
//! - [`ToolCallIndex`] - invocations and call-id to result lookup
//! - [`AnalysisConfig`] - thresholds, keyword lists and tool categories
//! - [`Analysis`] - every detector's findings in one serialisable value

mod analysis;
mod config;
mod decoder;
pub mod detectors;
mod error;
mod event;
mod index;
pub mod session;
mod text;
mod transcript;

pub use analysis::{Analysis, AnalysisContext};
pub use config::{
    AnalysisConfig, CategoryRule, EfficiencyGroup, ExcerptLimits, ResultLookup, ToolNames,
    CONFIG_FILE_NAME,
};
pub use decoder::{Decoded, Decoder, RepairRule};
pub use error::{AnalysisError, Result};
pub use event::{
    ContentBlock, Event, EventKind, LoopEvent, LoopMeta, Message, ResultContent, SystemRecord, Turn,
};
pub use index::{ToolCallIndex, ToolInvocation, ToolResult};
pub use transcript::{DecodeStats, Transcript};
