//! Line-oriented connections to an analysis engine
//!
//! [`EngineLauncher`] produces an [`EngineConnection`]; the session only talks
//! to the engine through these two traits. [`ProcessLauncher`] spawns a UCI
//! binary such as Stockfish as a subprocess.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// Executable looked up on `PATH` when no engine path is configured
pub const DEFAULT_ENGINE: &str = "stockfish";

/// How long `quit` gets before the process is killed
const QUIT_GRACE: Duration = Duration::from_millis(100);

/// A bidirectional text channel to a running engine
#[async_trait]
pub trait EngineConnection: Send {
    /// Sends one command line
    async fn send(&mut self, command: &str) -> io::Result<()>;

    /// Next line of output with surrounding whitespace trimmed, or `None`
    /// once the engine has closed its output
    async fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Whether the engine is still running, as far as the transport can tell
    fn is_alive(&mut self) -> bool {
        true
    }

    /// Asks the engine to exit and releases the connection
    async fn close(&mut self);
}

/// Starts engine instances
#[async_trait]
pub trait EngineLauncher: Send + Sync {
    async fn launch(&self) -> io::Result<Box<dyn EngineConnection>>;

    /// Human-readable name of what gets launched, for logs
    fn describe(&self) -> String;
}

/// Launches a UCI engine binary
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: PathBuf,
}

impl ProcessLauncher {
    /// Uses `path` if given, otherwise looks up [`DEFAULT_ENGINE`] on `PATH`
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            program: path.unwrap_or_else(|| PathBuf::from(DEFAULT_ENGINE)),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl EngineLauncher for ProcessLauncher {
    async fn launch(&self) -> io::Result<Box<dyn EngineConnection>> {
        // Bare names go through PATH lookup; explicit paths must exist
        if self.program.components().count() > 1 && !self.program.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("engine not found at path: {}", self.program.display()),
            ));
        }

        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "failed to open engine stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "failed to open engine stdout"))?;

        tracing::debug!(program = %self.program.display(), pid = ?child.id(), "engine process spawned");

        Ok(Box::new(ProcessConnection {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        }))
    }

    fn describe(&self) -> String {
        self.program.display().to_string()
    }
}

struct ProcessConnection {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

#[async_trait]
impl EngineConnection for ProcessConnection {
    async fn send(&mut self, command: &str) -> io::Result<()> {
        tracing::trace!(command, "engine <<");
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await
    }

    async fn read_line(&mut self) -> io::Result<Option<String>> {
        let line = self.stdout.next_line().await?;
        if let Some(line) = &line {
            tracing::trace!(line = line.as_str(), "engine >>");
        }
        Ok(line.map(|l| l.trim().to_string()))
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    async fn close(&mut self) {
        let _ = self.send("quit").await;
        if tokio::time::timeout(QUIT_GRACE, self.child.wait()).await.is_err() {
            let _ = self.child.kill().await; // Kill if still running
        }
    }
}
