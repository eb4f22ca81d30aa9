//! External command execution with piped stdin and a hard deadline

use std::io::Read;
use std::io::Write;
use std::process::ChildStdin;
use std::process::Command;
use std::process::Stdio;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// Polling interval while waiting for a child process
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Errors raised while running an external command
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Command is empty")]
    EmptyCommand,

    #[error("Spawn '{program}' failed: {source}")]
    SpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Write stdin of '{program}' failed: {source}")]
    StdinError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Wait for '{program}' failed: {source}")]
    WaitError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Captured output of a finished command
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs `command` (program followed by its arguments), feeding `input` on stdin.
///
/// The child is killed once `timeout` elapses. A non-zero exit status is reported
/// as [`ProcessError::Failed`] together with whatever the child wrote to stderr.
pub fn run_command(command: &[String], input: &[u8], timeout: Duration) -> Result<CommandOutput, ProcessError> {
    let (program, arguments) = command.split_first().ok_or(ProcessError::EmptyCommand)?;
    let start = Instant::now();
    let mut child = Command::new(program)
        .args(arguments)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ProcessError::SpawnError {
            program: program.to_owned(),
            source,
        })?;
    debug!(program = %program, input_bytes = input.len(), "Spawned external command");

    // Every pipe gets its own thread so the deadline below holds even when the
    // child stops reading or writing
    let mut stdout_handle = child.stdout.take().map(spawn_drain);
    let mut stderr_handle = child.stderr.take().map(spawn_drain);
    let stdin_handle = child.stdin.take().map(|stdin| spawn_feed(stdin, input.to_vec()));

    let status = loop {
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ProcessError::TimedOut {
                program: program.to_owned(),
                timeout,
            });
        }
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProcessError::WaitError {
                    program: program.to_owned(),
                    source,
                });
            }
        }
    };

    let written = stdin_handle.and_then(|join| join.join().ok());
    let stdout = collect(&mut stdout_handle);
    let stderr = collect(&mut stderr_handle);
    debug!(program = %program, %status, stdout_bytes = stdout.len(), "External command finished");

    if !status.success() {
        return Err(ProcessError::Failed {
            program: program.to_owned(),
            status: status.to_string(),
            stderr: stderr.trim().to_owned(),
        });
    }
    // A child that exits before taking all of its input did not answer the prompt
    if let Some(Err(source)) = written {
        return Err(ProcessError::StdinError {
            program: program.to_owned(),
            source,
        });
    }
    Ok(CommandOutput { stdout, stderr })
}

fn spawn_feed(mut stdin: ChildStdin, input: Vec<u8>) -> JoinHandle<std::io::Result<()>> {
    thread::spawn(move || {
        stdin.write_all(&input)?;
        stdin.flush()
    })
}

fn spawn_drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut captured = Vec::new();
        let _ = reader.read_to_end(&mut captured);
        captured
    })
}

fn collect(handle: &mut Option<JoinHandle<Vec<u8>>>) -> String {
    let bytes = handle
        .take()
        .and_then(|join| join.join().ok())
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}
