//! Scripted in-process UCI engine for orchestration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chess_tutor_core::config::{DepthPolicy, EngineConfig};
use chess_tutor_core::engine::{EngineConnection, EngineLauncher};
use chess_tutor_core::{rules, Orchestrator, Position};

/// Shared knobs and recordings for every connection a [`FakeLauncher`] makes
#[derive(Default)]
pub struct FakeEngine {
    pub launches: AtomicUsize,
    pub ready_probes: AtomicUsize,
    pub fail_launches: AtomicBool,
    pub hang_handshake: AtomicBool,
    pub hang_next_search: AtomicBool,
    pub garble_next_search: AtomicBool,
    pub die_next_search: AtomicBool,
    /// Exit right after answering the next search
    pub exit_after_search: AtomicBool,
    /// Whether the connection reports its own exit through `is_alive`
    pub exit_visible: AtomicBool,
    pub overlapping_searches: AtomicUsize,
    searching: AtomicBool,
    search_delay: Mutex<Duration>,
    searches: Mutex<Vec<(String, u32)>>,
}

impl FakeEngine {
    pub fn set_search_delay(&self, delay: Duration) {
        *self.search_delay.lock().unwrap() = delay;
    }

    /// Every `(fen, depth)` the engine was asked to search, in order
    pub fn searches(&self) -> Vec<(String, u32)> {
        self.searches.lock().unwrap().clone()
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    fn search_delay(&self) -> Duration {
        *self.search_delay.lock().unwrap()
    }
}

/// Score the fake reports for `fen` searched to `depth`
pub fn expected_score(fen: &str, depth: u32) -> i32 {
    depth as i32 * 10 + rules::legal_moves(fen).len() as i32
}

/// Best move the fake reports for `fen`: the first legal move
pub fn expected_best(fen: &str) -> Option<String> {
    let canonical = Position::from_fen(fen).ok()?.fen();
    rules::legal_moves(&canonical).first().map(|m| m.to_string())
}

pub struct FakeLauncher {
    engine: Arc<FakeEngine>,
}

impl FakeLauncher {
    pub fn new() -> (Arc<Self>, Arc<FakeEngine>) {
        let engine = Arc::new(FakeEngine::default());
        let launcher = Arc::new(Self {
            engine: Arc::clone(&engine),
        });
        (launcher, engine)
    }
}

#[async_trait]
impl EngineLauncher for FakeLauncher {
    async fn launch(&self) -> io::Result<Box<dyn EngineConnection>> {
        self.engine.launches.fetch_add(1, Ordering::SeqCst);
        if self.engine.fail_launches.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "fake engine missing"));
        }
        Ok(Box::new(FakeConnection {
            engine: Arc::clone(&self.engine),
            pending: VecDeque::new(),
            fen: String::new(),
            closed: false,
        }))
    }

    fn describe(&self) -> String {
        "fake-engine".to_string()
    }
}

struct FakeConnection {
    engine: Arc<FakeEngine>,
    pending: VecDeque<(Duration, String)>,
    fen: String,
    closed: bool,
}

impl FakeConnection {
    fn reply(&mut self, line: impl Into<String>) {
        self.pending.push_back((Duration::ZERO, line.into()));
    }

    fn search(&mut self, depth: u32) {
        if self.engine.searching.swap(true, Ordering::SeqCst) {
            self.engine.overlapping_searches.fetch_add(1, Ordering::SeqCst);
        }
        self.engine
            .searches
            .lock()
            .unwrap()
            .push((self.fen.clone(), depth));

        if self.engine.hang_next_search.swap(false, Ordering::SeqCst) {
            return;
        }
        if self.engine.die_next_search.swap(false, Ordering::SeqCst) {
            self.closed = true;
            return;
        }
        if self.engine.garble_next_search.swap(false, Ordering::SeqCst) {
            self.reply("info depth 1 score cp 5");
            self.reply("bestmove ???");
            return;
        }

        let delay = self.engine.search_delay();
        match rules::legal_moves(&self.fen).first() {
            None => {
                self.pending.push_back((delay, "info depth 0 score mate 0".to_string()));
                self.reply("bestmove (none)");
            }
            Some(best) => {
                let score = expected_score(&self.fen, depth);
                self.pending.push_back((
                    delay,
                    format!("info depth {} score cp {} nodes 1000 pv {}", depth, score, best),
                ));
                self.reply(format!("bestmove {}", best));
            }
        }
    }
}

#[async_trait]
impl EngineConnection for FakeConnection {
    async fn send(&mut self, command: &str) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "fake engine closed"));
        }

        let mut words = command.split_whitespace();
        match words.next() {
            Some("uci") => {
                if !self.engine.hang_handshake.load(Ordering::SeqCst) {
                    self.reply("id name FakeFish 1.0");
                    self.reply("option name Threads type spin default 1 min 1 max 512");
                    self.reply("uciok");
                }
            }
            Some("isready") => {
                self.engine.ready_probes.fetch_add(1, Ordering::SeqCst);
                self.reply("readyok");
            }
            Some("position") => {
                self.fen = command
                    .strip_prefix("position fen ")
                    .unwrap_or_default()
                    .to_string();
            }
            Some("go") => {
                let depth = words.nth(1).and_then(|d| d.parse().ok()).unwrap_or(0);
                self.search(depth);
            }
            Some("quit") => self.closed = true,
            _ => {}
        }
        Ok(())
    }

    async fn read_line(&mut self) -> io::Result<Option<String>> {
        if let Some((delay, line)) = self.pending.pop_front() {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if line.starts_with("bestmove") {
                self.engine.searching.store(false, Ordering::SeqCst);
                if self.engine.exit_after_search.swap(false, Ordering::SeqCst) {
                    self.closed = true;
                }
            }
            return Ok(Some(line));
        }
        if self.closed {
            return Ok(None);
        }
        // silent engine
        std::future::pending::<()>().await;
        Ok(None)
    }

    fn is_alive(&mut self) -> bool {
        !(self.closed && self.engine.exit_visible.load(Ordering::SeqCst))
    }

    async fn close(&mut self) {
        self.closed = true;
        self.pending.clear();
        self.engine.searching.store(false, Ordering::SeqCst);
    }
}

/// Short timeouts, status always re-probed
pub fn test_engine_config() -> EngineConfig {
    EngineConfig {
        handshake_timeout_ms: 300,
        evaluate_timeout_ms: 500,
        health_timeout_ms: 200,
        status_ttl_ms: 0,
        ..EngineConfig::default()
    }
}

pub fn orchestrator_with(config: &EngineConfig) -> (Arc<Orchestrator>, Arc<FakeEngine>) {
    let (launcher, engine) = FakeLauncher::new();
    let orchestrator = Orchestrator::with_launcher(launcher, config, DepthPolicy::default());
    (Arc::new(orchestrator), engine)
}

pub fn fake_orchestrator() -> (Arc<Orchestrator>, Arc<FakeEngine>) {
    orchestrator_with(&test_engine_config())
}
