//! A long-lived UCI engine session
//!
//! Owns one engine connection and walks it through
//! `Uninitialized -> Starting -> Ready -> (Evaluating -> Ready)* -> Stopped`.
//! Any timeout or protocol failure drops the connection and leaves the
//! session `Failed` until the next [`EngineSession::start`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::evaluation::EvaluationResult;
use super::transport::{EngineConnection, EngineLauncher};
use super::uci::{self, SearchReport, MAX_UCI_LINES};
use crate::rules::Position;

/// Error type for engine operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine is not running and could not be started
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// The engine did not answer in time
    #[error("engine did not reply within {0:?}")]
    Timeout(Duration),

    /// The engine answered with something we can't use
    #[error("engine protocol error: {0}")]
    Protocol(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Starting,
    Ready,
    Evaluating,
    Failed,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Starting => "starting",
            SessionState::Ready => "ready",
            SessionState::Evaluating => "evaluating",
            SessionState::Failed => "failed",
            SessionState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Time bounds for each kind of exchange with the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTimeouts {
    /// `uci` .. `readyok` at startup
    pub handshake: Duration,
    /// `go` .. `bestmove`
    pub evaluate: Duration,
    /// `isready` .. `readyok` liveness probe
    pub health: Duration,
}

impl Default for EngineTimeouts {
    fn default() -> Self {
        Self {
            handshake: Duration::from_secs(5),
            evaluate: Duration::from_secs(30),
            health: Duration::from_secs(2),
        }
    }
}

/// One analysis engine and its connection state
pub struct EngineSession {
    launcher: Arc<dyn EngineLauncher>,
    /// Sent as `setoption` during the handshake
    options: Vec<(String, String)>,
    timeouts: EngineTimeouts,
    connection: Option<Box<dyn EngineConnection>>,
    state: SessionState,
    engine_name: Option<String>,
}

impl EngineSession {
    pub fn new(
        launcher: Arc<dyn EngineLauncher>,
        options: Vec<(String, String)>,
        timeouts: EngineTimeouts,
    ) -> Self {
        Self {
            launcher,
            options,
            timeouts,
            connection: None,
            state: SessionState::Uninitialized,
            engine_name: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Name the engine reported during the handshake
    pub fn engine_name(&self) -> Option<&str> {
        self.engine_name.as_deref()
    }

    /// Launches the engine and completes the UCI handshake.
    ///
    /// Does nothing if the session is already `Ready`.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        if self.state == SessionState::Ready {
            return Ok(());
        }

        self.teardown().await;
        self.state = SessionState::Starting;
        let engine = self.launcher.describe();
        info!(%engine, "starting analysis engine");

        let mut connection = match self.launcher.launch().await {
            Ok(connection) => connection,
            Err(e) => {
                self.state = SessionState::Failed;
                warn!(%engine, error = %e, "failed to launch analysis engine");
                return Err(EngineError::Unavailable(format!(
                    "failed to start {}: {}",
                    engine, e
                )));
            }
        };

        let outcome = timeout(
            self.timeouts.handshake,
            handshake(connection.as_mut(), &self.options),
        )
        .await
        .unwrap_or(Err(EngineError::Timeout(self.timeouts.handshake)));

        match outcome {
            Ok(name) => {
                info!(%engine, name = name.as_deref().unwrap_or("unknown"), "analysis engine ready");
                self.engine_name = name;
                self.connection = Some(connection);
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                connection.close().await;
                self.state = SessionState::Failed;
                warn!(%engine, error = %e, "analysis engine handshake failed");
                Err(EngineError::Unavailable(format!(
                    "handshake with {} failed: {}",
                    engine, e
                )))
            }
        }
    }

    /// Probes the engine with `isready`.
    ///
    /// Returns false when the session is not `Ready` or the probe fails; a
    /// failed probe leaves the session `Failed`.
    pub async fn health_check(&mut self) -> bool {
        if self.state != SessionState::Ready {
            return false;
        }
        let Some(connection) = self.connection.as_mut() else {
            return false;
        };

        let outcome = timeout(self.timeouts.health, wait_ready(connection.as_mut()))
            .await
            .unwrap_or(Err(EngineError::Timeout(self.timeouts.health)));

        match outcome {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "engine health check failed");
                self.mark_failed().await;
                false
            }
        }
    }

    /// Searches `position` to `depth` plies and parses the engine's answer.
    pub async fn evaluate(
        &mut self,
        position: &Position,
        depth: u32,
    ) -> Result<EvaluationResult, EngineError> {
        if self.state != SessionState::Ready {
            return Err(EngineError::Unavailable(format!("engine session is {}", self.state)));
        }
        let Some(connection) = self.connection.as_mut() else {
            return Err(EngineError::Unavailable("engine session has no connection".into()));
        };
        if !connection.is_alive() {
            warn!("analysis engine exited while idle");
            self.mark_failed().await;
            return Err(EngineError::Unavailable("engine process is not running".into()));
        }

        self.state = SessionState::Evaluating;
        // Canonical FEN only: raw client text never reaches the engine's stdin
        let fen = position.fen();
        debug!(%fen, depth, "submitting position");

        let outcome = timeout(self.timeouts.evaluate, search(connection.as_mut(), &fen, depth))
            .await
            .unwrap_or(Err(EngineError::Timeout(self.timeouts.evaluate)));

        match outcome {
            Ok(result) => {
                self.state = SessionState::Ready;
                debug!(summary = %result.summary(), "evaluation complete");
                Ok(result)
            }
            Err(e) => {
                warn!(%fen, depth, error = %e, "evaluation failed");
                self.mark_failed().await;
                Err(e)
            }
        }
    }

    /// Drops the connection and marks the session `Failed`
    pub async fn mark_failed(&mut self) {
        self.teardown().await;
        self.state = SessionState::Failed;
    }

    /// Shuts the engine down; calling it again is harmless
    pub async fn stop(&mut self) {
        if self.connection.is_some() {
            info!("stopping analysis engine");
        }
        self.teardown().await;
        self.state = SessionState::Stopped;
    }

    async fn teardown(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close().await;
        }
        self.engine_name = None;
    }
}

/// `uci` .. `uciok`, options, `isready` .. `readyok`; returns the `id name`
async fn handshake(
    connection: &mut dyn EngineConnection,
    options: &[(String, String)],
) -> Result<Option<String>, EngineError> {
    send(connection, "uci").await?;

    let mut name = None;
    let mut lines_read = 0;
    loop {
        if lines_read > MAX_UCI_LINES {
            return Err(EngineError::Protocol("no uciok from engine".into()));
        }
        lines_read += 1;
        let line = next_line(connection).await?;
        if let Some(id) = line.strip_prefix("id name ") {
            name = Some(id.to_string());
        } else if line == "uciok" {
            break;
        }
    }

    for (option, value) in options {
        send(connection, &format!("setoption name {} value {}", option, value)).await?;
    }

    wait_ready(connection).await?;
    Ok(name)
}

async fn wait_ready(connection: &mut dyn EngineConnection) -> Result<(), EngineError> {
    send(connection, "isready").await?;
    for _ in 0..MAX_UCI_LINES {
        if next_line(connection).await? == "readyok" {
            return Ok(());
        }
    }
    Err(EngineError::Protocol("no readyok from engine".into()))
}

async fn search(
    connection: &mut dyn EngineConnection,
    fen: &str,
    depth: u32,
) -> Result<EvaluationResult, EngineError> {
    // Nothing has reached the engine yet, so a dead pipe here means it is gone
    connection
        .send(&format!("position fen {}", fen))
        .await
        .map_err(|e| EngineError::Unavailable(format!("engine is not running: {}", e)))?;
    send(connection, &format!("go depth {}", depth)).await?;

    let mut report = SearchReport::default();
    for _ in 0..MAX_UCI_LINES {
        let line = next_line(connection).await?;
        if let Some(rest) = line.strip_prefix("bestmove") {
            return report.finish(rest);
        }
        if let Some(info) = uci::parse_info(&line) {
            report.absorb(info);
        }
    }
    Err(EngineError::Protocol("too many lines without bestmove".into()))
}

async fn send(connection: &mut dyn EngineConnection, command: &str) -> Result<(), EngineError> {
    connection
        .send(command)
        .await
        .map_err(|e| EngineError::Protocol(format!("failed to write to engine: {}", e)))
}

async fn next_line(connection: &mut dyn EngineConnection) -> Result<String, EngineError> {
    match connection.read_line().await {
        Ok(Some(line)) => Ok(line),
        Ok(None) => Err(EngineError::Protocol("engine closed unexpectedly".into())),
        Err(e) => Err(EngineError::Protocol(format!("failed to read from engine: {}", e))),
    }
}
