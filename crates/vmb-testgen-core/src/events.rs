// crates/vmb-testgen-core/src/events.rs
// ============================================================================
// Module: Generation Events
// Description: Structured generation events and JSON-line sinks.
// Purpose: Record generation progress without hard logging dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Generation emits one JSON object per line. Every event carries an `event`
//! tag and a `timestamp_ms`; the remaining fields depend on the event. Sinks
//! never fail the generation run: serialization or write errors are dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::hashing::HashDigest;
use crate::labels::TestMode;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Generation event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationEvent {
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event-specific fields.
    #[serde(flatten)]
    pub kind: GenerationEventKind,
}

/// Event-specific fields, tagged by `event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GenerationEventKind {
    /// A definition was compiled in every planned mode.
    DefinitionExpanded {
        /// Full test description (group prefix included).
        description: String,
        /// Modes compiled, in plan order.
        modes: Vec<TestMode>,
        /// Short ids produced, in plan order.
        short_ids: Vec<String>,
    },
    /// The master list was assembled.
    GenerationSummary {
        /// Number of definitions expanded.
        definitions: usize,
        /// Number of vectors in the master list.
        vectors: usize,
        /// Number of non-empty test sets.
        test_sets: usize,
    },
    /// An artifact was written to the output directory.
    ArtifactWritten {
        /// Path relative to the output directory.
        path: String,
        /// Artifact size in bytes.
        bytes: usize,
        /// Artifact content digest.
        digest: HashDigest,
    },
    /// An output directory was compared against freshly generated artifacts.
    OutputVerified {
        /// Output directory checked.
        directory: String,
        /// Number of artifacts compared.
        artifacts: usize,
        /// Whether the directory matched.
        up_to_date: bool,
    },
}

impl GenerationEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(kind: GenerationEventKind) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            timestamp_ms,
            kind,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for generation events.
pub trait GenerationLogSink: Send + Sync {
    /// Record a generation event.
    fn record(&self, event: &GenerationEvent);
}

/// Sink that logs JSON lines to stderr.
pub struct StderrLogSink;

impl GenerationLogSink for StderrLogSink {
    fn record(&self, event: &GenerationEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileLogSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileLogSink {
    /// Opens the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl GenerationLogSink for FileLogSink {
    fn record(&self, event: &GenerationEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op sink.
pub struct NoopLogSink;

impl GenerationLogSink for NoopLogSink {
    fn record(&self, _event: &GenerationEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
