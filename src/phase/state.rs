//! Phase state representation
//!
//! The orchestration state is an explicit tagged union: each phase carries
//! exactly the continuous variables that are meaningful while it is
//! current. Transitions produce [`PhaseCommand`]s instead of performing side
//! effects, so timing and effects can be tested independently.

use serde::{Deserialize, Serialize};

/// One of the four narrative phases.
///
/// The cycle is strictly `Order → Schism → Event → Rebuild → Order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    /// Harmony; disagreement is watched for sustained divergence.
    Order,
    /// Territorial conflict; contention energy accumulates.
    Schism,
    /// The timed collapse.
    Event,
    /// Timed reconstruction after the collapse.
    Rebuild,
}

impl Phase {
    /// Numeric index consumed by render and audio kernels (`0..=3`).
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Order => 0,
            Self::Schism => 1,
            Self::Event => 2,
            Self::Rebuild => 3,
        }
    }

    /// Upper-case phase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Order => "ORDER",
            Self::Schism => "SCHISM",
            Self::Event => "EVENT",
            Self::Rebuild => "REBUILD",
        }
    }

    /// The phase that follows this one in the cycle.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Order => Self::Schism,
            Self::Schism => Self::Event,
            Self::Event => Self::Rebuild,
            Self::Rebuild => Self::Order,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Phase together with its continuous variables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseState {
    /// Watching for sustained disagreement.
    Order {
        /// Seconds of sustained disagreement above threshold.
        schism_timer: f64,
        /// Remaining post-rebuild immunity in seconds.
        cooldown: f64,
    },
    /// Accumulating contention.
    Schism {
        /// Contention energy in `[0, 1]`.
        energy: f64,
    },
    /// Collapse in progress.
    Event {
        /// Simulated time of entry.
        entered_at: f64,
        /// Normalized progress in `[0, 1]`.
        progress: f64,
        /// Contention energy at the climax, held for renderers.
        energy: f64,
    },
    /// Reconstruction in progress.
    Rebuild {
        /// Simulated time of entry.
        entered_at: f64,
        /// Normalized progress in `[0, 1]`.
        progress: f64,
    },
}

impl Default for PhaseState {
    fn default() -> Self {
        Self::initial()
    }
}

impl PhaseState {
    /// ORDER with every accumulator and timer at zero.
    #[must_use]
    pub const fn initial() -> Self {
        Self::Order {
            schism_timer: 0.0,
            cooldown: 0.0,
        }
    }

    /// The current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Order { .. } => Phase::Order,
            Self::Schism { .. } => Phase::Schism,
            Self::Event { .. } => Phase::Event,
            Self::Rebuild { .. } => Phase::Rebuild,
        }
    }

    /// Contention energy as seen by renderers (zero outside SCHISM and EVENT).
    #[must_use]
    pub const fn contention_energy(&self) -> f64 {
        match self {
            Self::Schism { energy } | Self::Event { energy, .. } => *energy,
            Self::Order { .. } | Self::Rebuild { .. } => 0.0,
        }
    }

    /// EVENT progress; reported as complete throughout REBUILD.
    #[must_use]
    pub const fn event_progress(&self) -> f64 {
        match self {
            Self::Event { progress, .. } => *progress,
            Self::Rebuild { .. } => 1.0,
            Self::Order { .. } | Self::Schism { .. } => 0.0,
        }
    }

    /// REBUILD progress (zero outside REBUILD).
    #[must_use]
    pub const fn rebuild_progress(&self) -> f64 {
        match self {
            Self::Rebuild { progress, .. } => *progress,
            _ => 0.0,
        }
    }

    /// Schism timer (zero outside ORDER).
    #[must_use]
    pub const fn schism_timer(&self) -> f64 {
        match self {
            Self::Order { schism_timer, .. } => *schism_timer,
            _ => 0.0,
        }
    }

    /// Remaining cooldown (zero outside ORDER).
    #[must_use]
    pub const fn cooldown(&self) -> f64 {
        match self {
            Self::Order { cooldown, .. } => *cooldown,
            _ => 0.0,
        }
    }
}

/// Side effect requested by a transition, executed by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseCommand {
    /// Spawn one flow particle scaled by the given energy.
    SpawnFlow {
        /// Contention energy after this tick's integration.
        energy: f64,
    },
    /// Spawn the one-shot shard burst.
    SpawnShardBurst {
        /// Number of shards to spawn.
        count: usize,
    },
    /// Empty both particle pools.
    ClearParticles,
    /// Ask the external simulation to reseed its state.
    RequestReseed,
}

/// Why a transition fired.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionReason {
    /// Disagreement stayed above threshold long enough.
    SustainedDisagreement {
        /// Schism timer value when the guard fired.
        held: f64,
    },
    /// Contention energy crossed the event threshold.
    EnergyPeak {
        /// Energy when the guard fired.
        energy: f64,
    },
    /// EVENT ran its full duration.
    EventComplete {
        /// Simulated seconds spent in EVENT.
        elapsed: f64,
    },
    /// REBUILD ran its full duration.
    RebuildComplete {
        /// Simulated seconds spent in REBUILD.
        elapsed: f64,
    },
}

impl std::fmt::Display for TransitionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SustainedDisagreement { held } => {
                write!(f, "disagreement sustained for {held:.2}s")
            }
            Self::EnergyPeak { energy } => write!(f, "contention energy peaked at {energy:.3}"),
            Self::EventComplete { elapsed } => write!(f, "event completed after {elapsed:.2}s"),
            Self::RebuildComplete { elapsed } => {
                write!(f, "rebuild completed after {elapsed:.2}s")
            }
        }
    }
}

/// Record of a phase transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseTransition {
    /// Phase we transitioned from
    pub from: Phase,
    /// Phase we transitioned to
    pub to: Phase,
    /// Why the guard fired
    pub reason: TransitionReason,
}

/// Output of one application of the transition function.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Step {
    /// State after this tick.
    pub state: PhaseState,
    /// Side effects to execute, in order.
    pub commands: Vec<PhaseCommand>,
    /// Set when the phase changed this tick.
    pub transition: Option<PhaseTransition>,
}
