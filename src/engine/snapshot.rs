//! Per-tick inputs and the read-only snapshot handed to renderers.

use serde::{Deserialize, Serialize};

use crate::particles::Particle;
use crate::phase::Phase;

/// Pointer state threaded from input capture to the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerState {
    /// Horizontal position, normalized.
    pub x: f64,
    /// Vertical position, normalized.
    pub y: f64,
    /// Horizontal velocity.
    pub vx: f64,
    /// Vertical velocity.
    pub vy: f64,
    /// Whether a button is held.
    pub down: bool,
}

/// External inputs of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameInputs {
    /// Monotonic timestamp in seconds.
    pub timestamp: f64,
    /// Pointer state, passed through untouched.
    pub pointer: PointerState,
    /// Tempo in beats per minute.
    pub bpm: f64,
}

impl FrameInputs {
    /// Default tempo when nothing has been tapped.
    pub const DEFAULT_BPM: f64 = 120.0;

    /// Inputs at `timestamp` with an idle pointer and the default tempo.
    #[must_use]
    pub fn at(timestamp: f64) -> Self {
        Self {
            timestamp,
            pointer: PointerState::default(),
            bpm: Self::DEFAULT_BPM,
        }
    }
}

/// Immutable view of the engine after a tick.
///
/// Borrowed from the engine; particle slices serialize as counts only.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Snapshot<'a> {
    /// Frame index of the tick that produced this snapshot.
    pub frame: u64,
    /// Simulated seconds.
    pub time: f64,
    /// Integration step of the tick.
    pub dt: f64,
    /// Current phase.
    pub phase: Phase,
    /// Numeric index of the current phase.
    pub phase_index: u8,
    /// Contention energy in `[0, 1]`.
    pub contention_energy: f64,
    /// EVENT progress in `[0, 1]`.
    pub event_progress: f64,
    /// REBUILD progress in `[0, 1]`.
    pub rebuild_progress: f64,
    /// Simulated seconds since the current phase was entered.
    pub phase_time: f64,
    /// Smoothed disagreement in `[0, 1]`.
    pub disagreement: f64,
    /// Seconds of sustained disagreement while in ORDER.
    pub schism_timer: f64,
    /// Remaining post-rebuild cooldown.
    pub cooldown: f64,
    /// Whether the external simulation should reseed on this tick.
    ///
    /// False right after a reset; the reseed it requests shows on the
    /// next tick.
    pub reseed_requested: bool,
    /// Whether the agent kernels should stop stepping.
    pub agents_frozen: bool,
    /// Pointer state, as received.
    pub pointer: PointerState,
    /// Tempo in beats per minute.
    pub bpm: f64,
    /// Position within the current beat, in `[0, 1)`.
    pub beat_phase: f64,
    /// Hash of the typed phrase, used to vary render parameters.
    pub phrase_hash: u32,
    /// Agent A's territory share, in percent.
    pub territory_split: f64,
    /// Live flow particles.
    pub flow_count: usize,
    /// Live shard particles.
    pub shard_count: usize,
    /// Flow particles, oldest first.
    #[serde(skip)]
    pub flow: &'a [Particle],
    /// Shard particles, oldest first.
    #[serde(skip)]
    pub shards: &'a [Particle],
}

/// Position within the current beat at simulated `time`.
#[must_use]
pub fn beat_phase(time: f64, bpm: f64) -> f64 {
    let beats = time * bpm / 60.0;
    if beats.is_finite() { beats.rem_euclid(1.0) } else { 0.0 }
}

/// Agent A's territory share for disagreement `d`, in percent.
#[must_use]
pub fn territory_split(disagreement: f64) -> f64 {
    30.0f64.mul_add(-disagreement, 50.0).clamp(20.0, 80.0)
}
