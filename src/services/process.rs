//! Process execution service for running external commands.
//!
//! Handles spawning processes, streaming output, and log persistence.

use crate::domain::Stage;
use crate::error::{ProcessError, ProcessResult};
use std::ffi::{OsStr, OsString};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Output event from a running process
#[derive(Debug, Clone)]
pub enum ProcessOutput {
    /// Line from stdout
    Stdout(String),
    /// Line from stderr
    Stderr(String),
    /// Error occurred while reading a stream
    Error(String),
}

/// Captured result of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Command line as displayed (secrets redacted)
    pub command: String,
    pub code: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub duration: Duration,
    /// Log file the output was appended to
    pub log_file: Option<PathBuf>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    pub fn stdout_text(&self) -> String {
        self.stdout.join("\n")
    }
}

#[derive(Debug, Clone)]
struct Arg {
    value: OsString,
    display: String,
}

/// An external command to run
#[derive(Debug, Clone)]
pub struct CommandLine {
    program: OsString,
    args: Vec<Arg>,
    current_dir: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        let value = arg.as_ref().to_os_string();
        let display = value.to_string_lossy().into_owned();
        self.args.push(Arg { value, display });
        self
    }

    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        args.into_iter().fold(self, |cmd, a| cmd.arg(a))
    }

    /// Argument shown as `<prefix>***` in logs and errors
    pub fn secret_arg(mut self, prefix: &str, secret: &str) -> Self {
        self.args.push(Arg {
            value: OsString::from(format!("{}{}", prefix, secret)),
            display: format!("{}***", prefix),
        });
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Printable command line
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.to_string_lossy().into_owned()];
        parts.extend(self.args.iter().map(|a| a.display.clone()));
        parts.join(" ")
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(self.args.iter().map(|a| &a.value));
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

/// Process execution service
#[derive(Debug, Clone)]
pub struct ProcessService {
    /// Log directory
    log_dir: Option<PathBuf>,
    /// Echo output lines to the console while running
    echo: bool,
    /// Timestamp shared by every log file of this run
    started: String,
}

impl ProcessService {
    /// Create a new process service
    pub fn new(log_dir: PathBuf) -> Self {
        Self {
            log_dir: Some(log_dir),
            echo: true,
            started: chrono_lite_timestamp(),
        }
    }

    /// Process service that keeps no log files
    pub fn without_logs() -> Self {
        Self {
            log_dir: None,
            echo: true,
            started: chrono_lite_timestamp(),
        }
    }

    /// Stop echoing output to the console
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    /// Ensure log directory exists
    fn ensure_log_dir(&self, log_dir: &Path) -> ProcessResult<()> {
        if !log_dir.exists() {
            fs::create_dir_all(log_dir).map_err(|source| ProcessError::Log {
                path: log_dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    /// Log file of a stage; every command of the stage appends to it
    fn log_file_path(&self, log_dir: &Path, stage: Stage) -> PathBuf {
        let filename = format!("{}-{}.log", stage.slug(), self.started);
        log_dir.join(filename)
    }

    /// Open (append) the stage log and write the command header
    fn open_log(&self, stage: Stage, command: &CommandLine) -> ProcessResult<Option<PathBuf>> {
        let Some(log_dir) = &self.log_dir else {
            return Ok(None);
        };
        self.ensure_log_dir(log_dir)?;

        let path = self.log_file_path(log_dir, stage);
        let log_err = |source| ProcessError::Log {
            path: path.clone(),
            source,
        };

        let mut log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(log_err)?;

        writeln!(log_file, "# Stage: {}", stage.slug()).map_err(log_err)?;
        writeln!(log_file, "# Command: {}", command.display()).map_err(log_err)?;
        writeln!(log_file, "# Started: {}", chrono_lite_timestamp()).map_err(log_err)?;
        if let Some(dir) = &command.current_dir {
            writeln!(log_file, "# Directory: {}", dir.display()).map_err(log_err)?;
        }
        writeln!(log_file, "---").map_err(log_err)?;

        Ok(Some(path))
    }

    /// Run a command to completion, streaming and capturing its output.
    ///
    /// A non-zero exit status is returned as [`ProcessError::Failed`].
    pub fn run(&self, stage: Stage, command: &CommandLine) -> ProcessResult<CommandOutput> {
        let shown = command.display();
        tracing::debug!(stage = stage.slug(), "$ {}", shown);

        let log_path = self.open_log(stage, command)?;
        let mut log_file = match &log_path {
            Some(path) => Some(
                OpenOptions::new()
                    .append(true)
                    .open(path)
                    .map_err(|source| ProcessError::Log {
                        path: path.clone(),
                        source,
                    })?,
            ),
            None => None,
        };

        let start_time = Instant::now();

        // Spawn the process
        let mut child = command
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                command: shown.clone(),
                source,
            })?;

        let (output_tx, output_rx) = mpsc::channel();

        // Spawn thread to read stdout
        let stdout_reader = child.stdout.take().map(|stdout| {
            let tx = output_tx.clone();
            std::thread::spawn(move || forward_lines(stdout, tx, ProcessOutput::Stdout))
        });

        // Spawn thread to read stderr
        let stderr_reader = child.stderr.take().map(|stderr| {
            let tx = output_tx.clone();
            std::thread::spawn(move || forward_lines(stderr, tx, ProcessOutput::Stderr))
        });

        drop(output_tx);

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        for event in output_rx {
            match event {
                ProcessOutput::Stdout(text) => {
                    if self.echo {
                        println!("{}", text);
                    }
                    if let Some(f) = log_file.as_mut() {
                        let _ = writeln!(f, "[OUT] {}", text);
                    }
                    stdout.push(text);
                }
                ProcessOutput::Stderr(text) => {
                    if self.echo {
                        eprintln!("{}", text);
                    }
                    if let Some(f) = log_file.as_mut() {
                        let _ = writeln!(f, "[ERR] {}", text);
                    }
                    stderr.push(text);
                }
                ProcessOutput::Error(e) => {
                    tracing::warn!("Failed to read output of `{}`: {}", shown, e);
                }
            }
        }

        for reader in [stdout_reader, stderr_reader].into_iter().flatten() {
            let _ = reader.join();
        }

        let status = child.wait().map_err(|source| ProcessError::Spawn {
            command: shown.clone(),
            source,
        })?;
        let code = status.code().unwrap_or(-1);

        if let Some(f) = log_file.as_mut() {
            let _ = writeln!(f, "# Exit: {}", code);
        }

        let output = CommandOutput {
            command: shown,
            code,
            stdout,
            stderr,
            duration: start_time.elapsed(),
            log_file: log_path,
        };

        tracing::debug!(
            code = output.code,
            elapsed_ms = output.duration.as_millis() as u64,
            "finished `{}`",
            output.command
        );

        if !output.success() {
            return Err(ProcessError::Failed {
                command: output.command.clone(),
                code: output.code,
                stderr: tail(&output.stderr, 20),
            });
        }

        Ok(output)
    }
}

/// Send each line of a stream to the channel until it closes
fn forward_lines<R: Read>(
    stream: R,
    tx: mpsc::Sender<ProcessOutput>,
    wrap: fn(String) -> ProcessOutput,
) {
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        match line {
            Ok(text) => {
                if tx.send(wrap(text)).is_err() {
                    break;
                }
            }
            Err(e) => {
                let _ = tx.send(ProcessOutput::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Last `n` lines joined with newlines
fn tail(lines: &[String], n: usize) -> String {
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

/// Generate a simple timestamp without chrono dependency
fn chrono_lite_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", duration.as_secs())
}
