//! The external simplex solver boundary.
//!
//! The pivoting engine is a separate numeric program spoken to over a
//! line-oriented protocol: the full serialized input is written to its
//! stdin and its full stdout is read back before returning — a blocking
//! request/response exchange with no partial streaming. The trait seam
//! exists so the pipeline can be exercised against a scripted solver in
//! tests.

use crate::utils::errors::{SolverError, SolverErrorKind};
use log::debug;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// A blocking simplex solver.
pub trait SimplexSolver {
    /// Run one solve: write the serialized problem, return the raw reply.
    fn solve(&self, input: &str) -> Result<String, SolverError>;
}

/// Runs the solver binary as a subprocess.
pub struct SubprocessSolver {
    binary: PathBuf,
    timeout: Option<Duration>,
}

impl SubprocessSolver {
    /// Create a client for the given solver binary, with no timeout.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: None,
        }
    }

    /// Kill the subprocess if it has not finished within `timeout`.
    ///
    /// A hung solver must not block a serving thread indefinitely.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn spawn(&self) -> Result<Child, SolverError> {
        Command::new(&self.binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SolverError {
                message: format!("failed to spawn solver {:?}: {}", self.binary, e),
                kind: SolverErrorKind::Spawn,
            })
    }

    /// Wait for exit, polling, killing the child once the deadline passes.
    fn wait_with_deadline(&self, child: &mut Child) -> Result<(), SolverError> {
        let timeout = match self.timeout {
            Some(timeout) => timeout,
            None => {
                return child.wait().map(|_| ()).map_err(|e| SolverError {
                    message: format!("failed waiting for solver: {}", e),
                    kind: SolverErrorKind::Io,
                })
            }
        };

        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => return Ok(()),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(SolverError {
                            message: format!("solver did not finish within {:?}", timeout),
                            kind: SolverErrorKind::Timeout,
                        });
                    }
                    std::thread::sleep(Duration::from_millis(5));
                }
                Err(e) => {
                    return Err(SolverError {
                        message: format!("failed waiting for solver: {}", e),
                        kind: SolverErrorKind::Io,
                    })
                }
            }
        }
    }
}

impl SimplexSolver for SubprocessSolver {
    fn solve(&self, input: &str) -> Result<String, SolverError> {
        debug!("invoking solver {:?}", self.binary);
        let mut child = self.spawn()?;

        // Write the whole problem, then close stdin so the solver sees EOF.
        let mut stdin = child.stdin.take().ok_or_else(|| SolverError {
            message: "solver stdin unavailable".to_string(),
            kind: SolverErrorKind::Io,
        })?;
        stdin.write_all(input.as_bytes()).map_err(|e| {
            let _ = child.kill();
            SolverError {
                message: format!("failed writing solver input: {}", e),
                kind: SolverErrorKind::Io,
            }
        })?;
        drop(stdin);

        // Drain stdout on a separate thread so a chatty solver cannot
        // fill the pipe and stall before exiting.
        let mut stdout = child.stdout.take().ok_or_else(|| SolverError {
            message: "solver stdout unavailable".to_string(),
            kind: SolverErrorKind::Io,
        })?;
        let reader = std::thread::spawn(move || {
            let mut output = String::new();
            stdout.read_to_string(&mut output).map(|_| output)
        });

        self.wait_with_deadline(&mut child)?;

        let output = reader
            .join()
            .map_err(|_| SolverError {
                message: "solver output reader panicked".to_string(),
                kind: SolverErrorKind::Io,
            })?
            .map_err(|e| SolverError {
                message: format!("failed reading solver output: {}", e),
                kind: SolverErrorKind::Io,
            })?;
        debug!("solver output:\n{}", output);
        Ok(output)
    }
}
