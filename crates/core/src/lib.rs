//! Chess Tutor Core Library
//!
//! Move validation for FEN positions and engine-backed position analysis.

pub mod config;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod rules;
pub mod validation;

pub use config::{ConfigError, DepthPolicy, TutorConfig};
pub use engine::{EngineError, Evaluation, EvaluationResult, SessionState};
pub use error::{AnalysisError, ErrorClass, Result};
pub use orchestrator::Orchestrator;
pub use rules::{Move, Outcome, Position, PositionError};
