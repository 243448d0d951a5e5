//! Phase transition function
//!
//! [`PhaseMachine::advance`] is a pure function of the previous state and
//! this tick's inputs. Continuous variables evolve every tick; discrete
//! guards are evaluated once per tick, so at most one transition fires per
//! tick and entry effects fire exactly once.

use crate::config::schema::{ContentionConfig, ParticleConfig, PhaseConfig};
use crate::signal::ContentionAccumulator;

use super::state::{Phase, PhaseCommand, PhaseState, PhaseTransition, Step, TransitionReason};

/// Per-tick inputs to the transition function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseInput {
    /// Simulated time at the end of this tick, in seconds.
    pub time: f64,
    /// Integration step of this tick, in seconds.
    pub dt: f64,
    /// Smoothed disagreement in `[0, 1]`.
    pub disagreement: f64,
    /// Frame counter of this tick.
    pub frame: u64,
}

/// The four-phase hybrid automaton.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phases: PhaseConfig,
    accumulator: ContentionAccumulator,
    shard_burst: usize,
    flow_every_frames: u64,
}

impl PhaseMachine {
    /// Creates a machine from the phase, contention and particle settings.
    #[must_use]
    pub fn new(phases: PhaseConfig, contention: ContentionConfig, particles: &ParticleConfig) -> Self {
        Self {
            phases,
            accumulator: ContentionAccumulator::new(contention),
            shard_burst: particles.shard_burst,
            flow_every_frames: particles.flow_every_frames,
        }
    }

    /// Whether the agent kernels should stop stepping in `state`.
    ///
    /// The agents freeze once the EVENT shatter is under way.
    #[must_use]
    pub fn agents_frozen(&self, state: &PhaseState) -> bool {
        matches!(state, PhaseState::Event { progress, .. } if *progress > self.phases.freeze_after_progress)
    }

    /// Applies one tick to `state`.
    #[must_use]
    pub fn advance(&self, state: &PhaseState, input: &PhaseInput) -> Step {
        let dt = if input.dt.is_finite() { input.dt.max(0.0) } else { 0.0 };
        let d = if input.disagreement.is_finite() {
            input.disagreement.clamp(0.0, 1.0)
        } else {
            0.0
        };

        match *state {
            PhaseState::Order {
                schism_timer,
                cooldown,
            } => self.advance_order(schism_timer, cooldown, d, dt),
            PhaseState::Schism { energy } => self.advance_schism(energy, d, dt, input),
            PhaseState::Event {
                entered_at,
                progress,
                energy,
            } => self.advance_event(entered_at, progress, energy, input),
            PhaseState::Rebuild {
                entered_at,
                progress,
            } => self.advance_rebuild(entered_at, progress, input),
        }
    }

    fn advance_order(&self, schism_timer: f64, cooldown: f64, d: f64, dt: f64) -> Step {
        if cooldown > 0.0 {
            return stay(PhaseState::Order {
                schism_timer: 0.0,
                cooldown: (cooldown - dt).max(0.0),
            });
        }

        let timer = if d > self.phases.schism_threshold {
            schism_timer + dt
        } else {
            self.phases.schism_decay.mul_add(-dt, schism_timer).max(0.0)
        };

        if timer > self.phases.schism_hold {
            return transition(
                Phase::Order,
                PhaseState::Schism { energy: 0.0 },
                TransitionReason::SustainedDisagreement { held: timer },
                Vec::new(),
            );
        }

        stay(PhaseState::Order {
            schism_timer: timer,
            cooldown: 0.0,
        })
    }

    fn advance_schism(&self, energy: f64, d: f64, dt: f64, input: &PhaseInput) -> Step {
        let energy = self.accumulator.step(energy, d, dt);

        let mut commands = Vec::new();
        if input.frame.is_multiple_of(self.flow_every_frames) {
            commands.push(PhaseCommand::SpawnFlow { energy });
        }

        if energy > self.phases.event_energy {
            commands.push(PhaseCommand::SpawnShardBurst {
                count: self.shard_burst,
            });
            return transition(
                Phase::Schism,
                PhaseState::Event {
                    entered_at: input.time,
                    progress: 0.0,
                    energy,
                },
                TransitionReason::EnergyPeak { energy },
                commands,
            );
        }

        Step {
            state: PhaseState::Schism { energy },
            commands,
            transition: None,
        }
    }

    fn advance_event(&self, entered_at: f64, progress: f64, energy: f64, input: &PhaseInput) -> Step {
        let elapsed = input.time - entered_at;
        let progress = normalized(elapsed, self.phases.event_duration).max(progress);

        if progress >= 1.0 {
            return transition(
                Phase::Event,
                PhaseState::Rebuild {
                    entered_at: input.time,
                    progress: 0.0,
                },
                TransitionReason::EventComplete { elapsed },
                vec![PhaseCommand::ClearParticles, PhaseCommand::RequestReseed],
            );
        }

        stay(PhaseState::Event {
            entered_at,
            progress,
            energy,
        })
    }

    fn advance_rebuild(&self, entered_at: f64, progress: f64, input: &PhaseInput) -> Step {
        let elapsed = input.time - entered_at;
        let progress = normalized(elapsed, self.phases.rebuild_duration).max(progress);

        if progress >= 1.0 {
            return transition(
                Phase::Rebuild,
                PhaseState::Order {
                    schism_timer: 0.0,
                    cooldown: self.phases.post_rebuild_cooldown,
                },
                TransitionReason::RebuildComplete { elapsed },
                Vec::new(),
            );
        }

        stay(PhaseState::Rebuild {
            entered_at,
            progress,
        })
    }
}

/// `elapsed / duration` clamped to `[0, 1]`.
fn normalized(elapsed: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 1.0;
    }
    let p = elapsed / duration;
    if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 }
}

const fn stay(state: PhaseState) -> Step {
    Step {
        state,
        commands: Vec::new(),
        transition: None,
    }
}

fn transition(
    from: Phase,
    state: PhaseState,
    reason: TransitionReason,
    commands: Vec<PhaseCommand>,
) -> Step {
    Step {
        transition: Some(PhaseTransition {
            from,
            to: state.phase(),
            reason,
        }),
        state,
        commands,
    }
}
