//! Position analysis front door
//!
//! [`Orchestrator`] owns the process's single [`EngineSession`]. Evaluations
//! are serialized on a fair (FIFO) async mutex; validation never touches it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use crate::config::{DepthPolicy, EngineConfig, TutorConfig};
use crate::engine::{
    EngineError, EngineLauncher, EngineSession, EvaluationResult, ProcessLauncher, SessionState,
};
use crate::error::{AnalysisError, Result};
use crate::rules::Position;

#[derive(Debug, Clone, Copy)]
struct Probe {
    at: Instant,
    ready: bool,
}

pub struct Orchestrator {
    session: Arc<Mutex<EngineSession>>,
    /// Set only while a ready session is searching
    searching: Arc<AtomicBool>,
    depth_policy: DepthPolicy,
    status_ttl: Duration,
    last_probe: std::sync::Mutex<Option<Probe>>,
    shut_down: AtomicBool,
}

impl Orchestrator {
    /// Builds an orchestrator that runs the configured engine binary
    pub fn new(config: &TutorConfig) -> Self {
        let launcher = Arc::new(ProcessLauncher::new(config.engine.path.clone()));
        Self::with_launcher(launcher, &config.engine, config.analysis)
    }

    pub fn with_launcher(
        launcher: Arc<dyn EngineLauncher>,
        engine: &EngineConfig,
        depth_policy: DepthPolicy,
    ) -> Self {
        let session = EngineSession::new(launcher, engine.uci_options(), engine.timeouts());
        Self {
            session: Arc::new(Mutex::new(session)),
            searching: Arc::new(AtomicBool::new(false)),
            depth_policy,
            status_ttl: engine.status_ttl(),
            last_probe: std::sync::Mutex::new(None),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn depth_policy(&self) -> DepthPolicy {
        self.depth_policy
    }

    pub fn default_depth(&self) -> u32 {
        self.depth_policy.default_depth
    }

    /// Starts the engine ahead of the first request
    pub async fn warm_up(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        let outcome = session.start().await;
        drop(session);
        self.record_probe(outcome.is_ok());
        outcome.map_err(AnalysisError::from)
    }

    /// Evaluates `fen` to `depth` plies (clamped to the depth policy).
    ///
    /// A session that is not ready, or whose engine turns out to have exited
    /// while idle, gets exactly one restart attempt. Engine timeouts and
    /// protocol errors are returned as-is, never retried.
    pub async fn analyze(&self, fen: &str, depth: i64) -> Result<EvaluationResult> {
        let position = Position::from_fen(fen)?;
        let depth = self.depth_policy.clamp(depth);

        if self.shut_down.load(Ordering::Acquire) {
            return Err(AnalysisError::EngineUnavailable("analysis service is shut down".into()));
        }

        let session = Arc::clone(&self.session).lock_owned().await;
        // The task owns the lock: a caller that goes away mid-search still
        // lets the engine finish (or time out) before the next caller starts
        let searching = Arc::clone(&self.searching);
        let outcome = tokio::spawn(evaluate_exclusive(session, searching, position, depth))
            .await
            .map_err(|e| AnalysisError::Internal(format!("analysis task failed: {}", e)))?;

        self.record_probe(outcome.is_ok());
        outcome
    }

    /// Whether the engine is up.
    ///
    /// Answers from the last observation while it is younger than the status
    /// TTL; otherwise probes the engine. Never starts the engine.
    pub async fn status(&self) -> bool {
        if let Some(ready) = self.cached_probe() {
            return ready;
        }

        let Ok(mut session) = self.session.try_lock() else {
            // held for a search on a ready engine, or for a start or shutdown
            return self.searching.load(Ordering::Acquire);
        };
        let ready = session.health_check().await;
        drop(session);

        self.record_probe(ready);
        ready
    }

    /// Current session state, waiting for any evaluation in flight
    pub async fn session_state(&self) -> SessionState {
        self.session.lock().await.state()
    }

    /// Stops the engine; later analysis requests fail without respawning it
    pub async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
        self.session.lock().await.stop().await;
        self.record_probe(false);
        info!("analysis service shut down");
    }

    fn cached_probe(&self) -> Option<bool> {
        let probe = *self.last_probe.lock().unwrap_or_else(PoisonError::into_inner);
        probe
            .filter(|p| p.at.elapsed() < self.status_ttl)
            .map(|p| p.ready)
    }

    fn record_probe(&self, ready: bool) {
        let mut probe = self.last_probe.lock().unwrap_or_else(PoisonError::into_inner);
        *probe = Some(Probe {
            at: Instant::now(),
            ready,
        });
    }
}

async fn evaluate_exclusive(
    mut session: OwnedMutexGuard<EngineSession>,
    searching: Arc<AtomicBool>,
    position: Position,
    depth: u32,
) -> Result<EvaluationResult> {
    let mut restarted = false;
    match session.state() {
        SessionState::Ready => {}
        SessionState::Stopped => {
            return Err(AnalysisError::EngineUnavailable("engine session stopped".into()));
        }
        state => {
            info!(%state, "engine session not ready, starting it");
            restart(&mut session).await?;
            restarted = true;
        }
    }

    match search(&mut session, &searching, &position, depth).await {
        Err(EngineError::Unavailable(reason)) if !restarted => {
            info!(%reason, "engine went away while idle, starting it");
            restart(&mut session).await?;
            Ok(search(&mut session, &searching, &position, depth).await?)
        }
        outcome => Ok(outcome?),
    }
}

async fn restart(session: &mut EngineSession) -> Result<()> {
    session.start().await.map_err(|e| {
        warn!(error = %e, "engine restart failed");
        AnalysisError::from(e)
    })
}

async fn search(
    session: &mut EngineSession,
    searching: &AtomicBool,
    position: &Position,
    depth: u32,
) -> std::result::Result<EvaluationResult, EngineError> {
    searching.store(true, Ordering::Release);
    let outcome = session.evaluate(position, depth).await;
    searching.store(false, Ordering::Release);
    outcome
}
