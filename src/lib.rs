//! recovery-engine - Muscle recovery and training-readiness engine
//!
//! Turns logged training volume into per-muscle fatigue, decays it over
//! elapsed time, and suggests what to train next.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod muscles;
pub mod recovery;
pub mod session;

pub use config::EngineConfig;
pub use db::Database;
pub use error::{RecoveryError, Result};
pub use recovery::RecoveryEngine;
