use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::decoder::Decoder;
use crate::error::{AnalysisError, Result};
use crate::event::{Event, EventKind, LoopMeta, SystemRecord, Turn};

/// Line-level decode accounting for one transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    pub total_lines: usize,
    pub blank_lines: usize,
    pub repaired_lines: usize,
    /// 1-based line numbers that could not be decoded
    pub dropped_lines: Vec<usize>,
}

impl DecodeStats {
    pub fn dropped(&self) -> usize {
        self.dropped_lines.len()
    }
}

/// An immutable, ordered session log.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    events: Vec<Event>,
    stats: DecodeStats,
}

impl Transcript {
    /// Read and decode a transcript file with the default decoder.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, &Decoder::default())
    }

    /// Lines that are not valid UTF-8 are dropped like any other
    /// undecodable line; only an unreadable file is an error.
    pub fn load_with(path: &Path, decoder: &Decoder) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let body = bytes.strip_suffix(b"\n").unwrap_or(&bytes[..]);
        let lines = body
            .split(|b| *b == b'\n')
            .filter(|_| !body.is_empty())
            .map(|line| std::str::from_utf8(line).ok());
        let transcript = Self::decode_raw(lines, decoder);
        debug!(
            path = %path.display(),
            events = transcript.len(),
            dropped = transcript.stats.dropped(),
            "Loaded transcript"
        );
        Ok(transcript)
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::decode_lines(lines, &Decoder::default())
    }

    /// Decode lines in order. Indices are assigned to surviving records only.
    pub fn decode_lines<I, S>(lines: I, decoder: &Decoder) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<S> = lines.into_iter().collect();
        Self::decode_raw(lines.iter().map(|l| Some(l.as_ref())), decoder)
    }

    /// `None` marks a line whose bytes were not text.
    fn decode_raw<'l, I>(lines: I, decoder: &Decoder) -> Self
    where
        I: IntoIterator<Item = Option<&'l str>>,
    {
        let mut events = Vec::new();
        let mut stats = DecodeStats::default();

        for (line_no, line) in lines.into_iter().enumerate() {
            stats.total_lines += 1;
            let Some(line) = line else {
                debug!(line = line_no + 1, "Dropped line with invalid UTF-8");
                stats.dropped_lines.push(line_no + 1);
                continue;
            };
            if line.trim().is_empty() {
                stats.blank_lines += 1;
                continue;
            }
            match decoder.decode(line) {
                Some(decoded) => {
                    if decoded.repaired_by.is_some() {
                        stats.repaired_lines += 1;
                    }
                    events.push(decoded.into_event(events.len()));
                }
                None => {
                    debug!(line = line_no + 1, "Dropped undecodable line");
                    stats.dropped_lines.push(line_no + 1);
                }
            }
        }

        if !stats.dropped_lines.is_empty() {
            warn!(dropped = stats.dropped(), "Some transcript lines could not be decoded");
        }

        Self { events, stats }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    pub fn loop_markers(&self) -> impl Iterator<Item = (usize, &LoopMeta)> {
        self.events
            .iter()
            .filter_map(|e| e.as_loop_meta().map(|meta| (e.index, meta)))
    }

    pub fn assistant_turns(&self) -> impl Iterator<Item = (usize, &Turn)> {
        self.events
            .iter()
            .filter_map(|e| e.as_assistant().map(|turn| (e.index, turn)))
    }

    /// Turns carrying tool results.
    pub fn user_turns(&self) -> impl Iterator<Item = (usize, &Turn)> {
        self.events
            .iter()
            .filter_map(|e| e.as_user().map(|turn| (e.index, turn)))
    }

    /// The first `system`/`init` record, if any.
    pub fn system_init(&self) -> Option<&SystemRecord> {
        self.events.iter().find_map(|e| match &e.kind {
            EventKind::System(system) if system.is_init() => Some(system),
            _ => None,
        })
    }
}
