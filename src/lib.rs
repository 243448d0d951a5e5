//! `collapse` - Phase and contention orchestration engine
//!
//! Drives the four-act cycle (ORDER, SCHISM, EVENT, REBUILD) of a
//! two-agent generative piece. The engine observes the disagreement between
//! two agents, accumulates it into contention energy, sequences the phases
//! with hysteresis, and owns the particle pools that renderers and audio
//! consume through a per-frame [`engine::Snapshot`].

pub mod agents;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod observability;
pub mod particles;
pub mod phase;
pub mod signal;
