// crates/vmb-testgen-core/src/process.rs
// ============================================================================
// Module: Process Compiler Bridge
// Description: Scenario compiler backed by a long-running child process.
// Purpose: Reach an out-of-process script compiler over newline-delimited JSON.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`ProcessScenarioCompiler`] spawns the configured command once and keeps
//! it alive for the whole run. Each call writes one JSON request line to the
//! child's stdin and reads one JSON response line from its stdout:
//!
//! ```text
//! -> {"id":1,"configuration":{...},"request":{...}}
//! <- {"id":1,"scenario":{...}}        or        {"id":1,"error":"..."}
//! ```
//!
//! The child's stderr is inherited so compiler diagnostics stay visible.
//! Response lines are size-limited, the response id must echo the request id,
//! and the child is killed when the bridge is dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Write;
use std::process::Child;
use std::process::ChildStdin;
use std::process::ChildStdout;
use std::process::Command;
use std::process::Stdio;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;

use crate::scenario::CompilerError;
use crate::scenario::GeneratedScenario;
use crate::scenario::ScenarioCompiler;
use crate::scenario::ScenarioRequest;
use crate::template::CompilerConfiguration;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum size of one compiler response line.
pub const MAX_COMPILER_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Request line written to the compiler.
#[derive(Serialize)]
struct CompilerRequest<'a> {
    /// Request id echoed by the response.
    id: u64,
    /// Configuration to compile.
    configuration: &'a CompilerConfiguration,
    /// Scenario to generate.
    request: &'a ScenarioRequest,
}

/// Response line read from the compiler.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CompilerResponse {
    /// Echoed request id.
    id: u64,
    /// Generated scenario on success.
    #[serde(default)]
    scenario: Option<GeneratedScenario>,
    /// Compiler message on failure.
    #[serde(default)]
    error: Option<String>,
}

// ============================================================================
// SECTION: Process Handle
// ============================================================================

/// Spawned compiler process handle and IO.
#[derive(Debug)]
struct CompilerProcess {
    /// Child process handle.
    child: Child,
    /// Child stdin for request writes.
    stdin: ChildStdin,
    /// Buffered child stdout for response reads.
    stdout: BufReader<ChildStdout>,
}

impl Drop for CompilerProcess {
    fn drop(&mut self) {
        if let Ok(Some(_)) = self.child.try_wait() {
            return;
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

// ============================================================================
// SECTION: Compiler
// ============================================================================

/// Scenario compiler reached over a child process's stdio.
#[derive(Debug)]
pub struct ProcessScenarioCompiler {
    /// Locked process handle; one request is in flight at a time.
    process: Mutex<CompilerProcess>,
    /// Next request id.
    next_id: AtomicU64,
    /// Maximum accepted response line size in bytes.
    max_response_bytes: usize,
}

impl ProcessScenarioCompiler {
    /// Spawns the compiler command (program followed by its arguments).
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::Transport`] when the command is empty or the
    /// process cannot be spawned.
    pub fn spawn(command: &[String], max_response_bytes: usize) -> Result<Self, CompilerError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| CompilerError::Transport("compiler command is empty".to_string()))?;
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::inherit());
        let mut child = cmd.spawn().map_err(|err| {
            CompilerError::Transport(format!("failed to spawn compiler {program}: {err}"))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CompilerError::Transport("compiler stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CompilerError::Transport("compiler stdout unavailable".to_string()))?;
        Ok(Self {
            process: Mutex::new(CompilerProcess {
                child,
                stdin,
                stdout: BufReader::new(stdout),
            }),
            next_id: AtomicU64::new(1),
            max_response_bytes,
        })
    }

    /// Sends one request and returns the raw response line.
    fn exchange(&self, payload: &[u8]) -> Result<String, CompilerError> {
        let mut guard = self
            .process
            .lock()
            .map_err(|_| CompilerError::Transport("compiler process lock poisoned".to_string()))?;
        if let Some(status) = guard.child.try_wait().map_err(|err| {
            CompilerError::Transport(format!("compiler process state unavailable: {err}"))
        })? {
            return Err(CompilerError::Transport(format!("compiler process exited: {status}")));
        }
        write_line(&mut guard.stdin, payload)?;
        read_line(&mut guard.stdout, self.max_response_bytes)
    }
}

impl ScenarioCompiler for ProcessScenarioCompiler {
    fn generate_scenario(
        &self,
        configuration: &CompilerConfiguration,
        request: &ScenarioRequest,
    ) -> Result<GeneratedScenario, CompilerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = serde_json::to_vec(&CompilerRequest {
            id,
            configuration,
            request,
        })
        .map_err(|err| CompilerError::Transport(format!("request serialization failed: {err}")))?;
        let line = self.exchange(&payload)?;
        let response: CompilerResponse = serde_json::from_str(&line)
            .map_err(|err| CompilerError::Transport(format!("invalid compiler response: {err}")))?;
        if response.id != id {
            return Err(CompilerError::Transport(format!(
                "compiler answered request {} while {id} was pending",
                response.id
            )));
        }
        match (response.scenario, response.error) {
            (Some(scenario), None) => Ok(scenario),
            (None, Some(message)) => Err(CompilerError::Scenario(message)),
            (Some(_), Some(_)) => Err(CompilerError::Transport(
                "compiler response holds both scenario and error".to_string(),
            )),
            (None, None) => Err(CompilerError::Transport(
                "compiler response holds neither scenario nor error".to_string(),
            )),
        }
    }
}

// ============================================================================
// SECTION: Line IO
// ============================================================================

/// Writes one newline-terminated request.
fn write_line(writer: &mut ChildStdin, payload: &[u8]) -> Result<(), CompilerError> {
    let write_failed = |err: std::io::Error| {
        CompilerError::Transport(format!("compiler write failed: {err}"))
    };
    writer.write_all(payload).map_err(write_failed)?;
    writer.write_all(b"\n").map_err(write_failed)?;
    writer.flush().map_err(write_failed)
}

/// Reads one newline-terminated response of at most `max_bytes`.
fn read_line(reader: &mut BufReader<impl Read>, max_bytes: usize) -> Result<String, CompilerError> {
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let mut line = String::new();
    let bytes = reader
        .by_ref()
        .take(limit)
        .read_line(&mut line)
        .map_err(|err| CompilerError::Transport(format!("compiler read failed: {err}")))?;
    if bytes == 0 {
        return Err(CompilerError::Transport("compiler closed its output".to_string()));
    }
    let body = line.strip_suffix('\n').unwrap_or(&line);
    if body.len() > max_bytes {
        return Err(CompilerError::Transport(format!(
            "compiler response exceeds {max_bytes} bytes"
        )));
    }
    if !line.ends_with('\n') {
        return Err(CompilerError::Transport("compiler closed its output mid-line".to_string()));
    }
    Ok(body.to_string())
}
