//! Builder for executing external tool commands.
//!
//! Every invocation is a blocking call. The pipeline runs exactly two of
//! them per job and has nothing to do while they run.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use crate::{Error, Result};

/// Number of stderr lines kept in a [`Error::ToolFailed`] message.
const STDERR_TAIL_LINES: usize = 20;

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// One block of ffmpeg `-progress` output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodeProgress {
    /// Frames written so far.
    pub frame: Option<u64>,
    /// Current encoding speed in frames per second.
    pub fps: Option<f64>,
    /// Output position in microseconds.
    pub out_time_us: Option<i64>,
    /// Speed relative to realtime, e.g. `"2.5x"`.
    pub speed: Option<String>,
    /// Set on the final block (`progress=end`).
    pub done: bool,
}

impl EncodeProgress {
    /// Output position in seconds.
    pub fn out_time_secs(&self) -> Option<f64> {
        self.out_time_us.map(|us| us as f64 / 1_000_000.0)
    }
}

/// Incremental parser for ffmpeg's `key=value` progress stream.
#[derive(Debug, Default)]
pub struct ProgressParser {
    current: EncodeProgress,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line; returns a finished block on `progress=...`.
    pub fn feed(&mut self, line: &str) -> Option<EncodeProgress> {
        let (key, value) = line.trim().split_once('=')?;
        let value = value.trim();

        match key {
            "frame" => self.current.frame = value.parse().ok(),
            "fps" => self.current.fps = value.parse().ok(),
            "out_time_us" => self.current.out_time_us = value.parse().ok(),
            "speed" if value != "N/A" => self.current.speed = Some(value.to_string()),
            "progress" => {
                let mut block = std::mem::take(&mut self.current);
                block.done = value == "end";
                return Some(block);
            }
            _ => {}
        }

        None
    }
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use datamosh_av::ToolCommand;
/// use std::path::PathBuf;
///
/// let output = ToolCommand::new(PathBuf::from("ffmpeg"))
///     .arg("-hide_banner")
///     .arg("-version")
///     .execute()?;
/// println!("{}", output.stdout);
/// # Ok::<(), datamosh_av::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Arguments added so far.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Render the command as a single shell-like line, for logs and dry runs.
    pub fn display(&self) -> String {
        let mut line = self.program.to_string_lossy().to_string();
        for arg in &self.args {
            line.push(' ');
            if arg.contains(' ') {
                line.push('"');
                line.push_str(arg);
                line.push('"');
            } else {
                line.push_str(arg);
            }
        }
        line
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    fn spawn_error(&self, e: std::io::Error) -> Error {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::tool_not_found(self.program_name())
        } else {
            Error::tool_failed(self.program_name(), format!("failed to spawn: {e}"))
        }
    }

    fn check_status(&self, status: ExitStatus, stderr: &str) -> Result<()> {
        if status.success() {
            return Ok(());
        }
        Err(Error::tool_failed(
            self.program_name(),
            format!("exited with status {}: {}", status, stderr_tail(stderr)),
        ))
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] if the executable does not exist.
    /// - [`Error::ToolFailed`] if spawning fails or the process exits with a
    ///   non-zero status (message includes the end of stderr).
    pub fn execute(&self) -> Result<ToolOutput> {
        #[cfg(feature = "tracing")]
        tracing::debug!("Running: {}", self.display());

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        let tool_output = ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        self.check_status(output.status, &tool_output.stderr)?;

        Ok(tool_output)
    }

    /// Execute an ffmpeg command that writes `-progress` blocks to stdout,
    /// calling `on_progress` for each block as it arrives.
    ///
    /// The caller is responsible for adding `-progress pipe:1 -nostats`.
    /// Stderr is drained on a helper thread so a chatty process cannot
    /// block on a full pipe.
    pub fn execute_with_progress(
        &self,
        mut on_progress: impl FnMut(&EncodeProgress),
    ) -> Result<ToolOutput> {
        #[cfg(feature = "tracing")]
        tracing::debug!("Running: {}", self.display());

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let mut stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                String::from_utf8_lossy(&buf).to_string()
            })
        });

        let mut stdout = String::new();
        if let Some(pipe) = child.stdout.take() {
            let mut parser = ProgressParser::new();
            for line in BufReader::new(pipe).lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        // Don't leave the child or the stderr thread behind.
                        let _ = child.kill();
                        let _ = child.wait();
                        if let Some(handle) = stderr_reader.take() {
                            let _ = handle.join();
                        }
                        return Err(e.into());
                    }
                };
                if let Some(block) = parser.feed(&line) {
                    on_progress(&block);
                }
                stdout.push_str(&line);
                stdout.push('\n');
            }
        }

        let status = child.wait()?;
        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        self.check_status(status, &stderr)?;

        Ok(ToolOutput {
            status,
            stdout,
            stderr,
        })
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
