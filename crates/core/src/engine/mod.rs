//! Chess engine integration
//!
//! Provides a session around UCI-compatible engines like Stockfish.

pub mod evaluation;
pub mod session;
pub mod transport;
pub mod uci;

// Re-export main types for convenience
pub use evaluation::{Evaluation, EvaluationResult};
pub use session::{EngineError, EngineSession, EngineTimeouts, SessionState};
pub use transport::{EngineConnection, EngineLauncher, ProcessLauncher, DEFAULT_ENGINE};
