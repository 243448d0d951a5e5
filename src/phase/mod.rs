//! Phase state machine
//!
//! Sequences the four-act cycle ORDER → SCHISM → EVENT → REBUILD → ORDER.
//!
//! # Architecture
//!
//! - [`PhaseState`]: tagged union carrying each phase's continuous variables
//! - [`PhaseMachine`]: pure transition function returning a [`Step`]
//! - [`PhaseCommand`]: side effects the engine executes after a step

pub mod machine;
pub mod state;

pub use machine::{PhaseInput, PhaseMachine};
pub use state::{Phase, PhaseCommand, PhaseState, PhaseTransition, Step, TransitionReason};
