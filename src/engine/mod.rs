//! Frame-driven orchestration engine
//!
//! [`Engine`] owns every piece of mutable state and advances it one tick at
//! a time in a fixed order:
//!
//! 1. clock advance (dt clamped to `max_dt`)
//! 2. disagreement sampling (on cadence frames)
//! 3. phase machine step and execution of its commands
//! 4. particle integration
//!
//! Readers then borrow an immutable [`Snapshot`]. Because ticks take
//! `&mut self`, [`Engine::reset`] can only ever run between ticks.

pub mod clock;
pub mod snapshot;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

use crate::config::schema::EngineConfig;
use crate::observability::metrics;
use crate::particles::{ParticleKind, Particles, spawn};
use crate::phase::{Phase, PhaseCommand, PhaseInput, PhaseMachine, PhaseState, PhaseTransition};
use crate::signal::{DisagreementSampler, FeatureSource, SampleOutcome};

pub use clock::{FrameClock, Tick};
pub use snapshot::{FrameInputs, PointerState, Snapshot};

/// Upper bound (exclusive) of the phrase hash picked on reset.
const PHRASE_HASH_RANGE: u32 = 100_000;

/// Mask keeping the phrase hash a non-negative 31-bit value.
const PHRASE_HASH_MASK: u32 = 0x7fff_ffff;

/// Shard burst outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstReport {
    /// Shards requested by the transition.
    pub requested: usize,
    /// Shards stored; the remainder hit pool capacity.
    pub spawned: usize,
}

/// What happened during one tick, for event reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Timing of the tick.
    pub tick: Tick,
    /// Outcome of the disagreement sampling step.
    pub sample: SampleOutcome,
    /// Phase transition fired on this tick, if any.
    pub transition: Option<PhaseTransition>,
    /// Shard burst spawned on this tick, if any.
    pub shard_burst: Option<BurstReport>,
    /// Whether a simulation reseed was requested on this tick.
    pub reseed_requested: bool,
    /// Particle spawns dropped at capacity on this tick.
    pub particles_dropped: u64,
}

/// The phase and contention orchestration engine.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    seed: u64,
    rng: StdRng,
    clock: FrameClock,
    last_tick: Tick,
    sampler: DisagreementSampler,
    machine: PhaseMachine,
    state: PhaseState,
    phase_time: f64,
    particles: Particles,
    pointer: PointerState,
    bpm: f64,
    phrase_hash: u32,
    reseed_requested: bool,
    pending_reseed: bool,
    cycles: u64,
    transitions: u64,
    resets: u64,
}

impl Engine {
    /// Creates an engine in ORDER with empty pools.
    ///
    /// Uses `particles.seed` from the configuration when set, otherwise a
    /// random seed (see [`Engine::seed`] to reproduce the run).
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let seed = config.particles.seed.unwrap_or_else(rand::random);
        Self::with_seed(config, seed)
    }

    /// Creates an engine whose randomness is fully determined by `seed`.
    #[must_use]
    pub fn with_seed(config: EngineConfig, seed: u64) -> Self {
        let machine = PhaseMachine::new(
            config.phases.clone(),
            config.contention.clone(),
            &config.particles,
        );
        let particles = Particles::new(
            config.particles.flow_capacity,
            config.particles.shard_capacity,
        );
        debug!(
            seed,
            flow_capacity = config.particles.flow_capacity,
            shard_capacity = config.particles.shard_capacity,
            "engine created"
        );
        metrics::set_current_phase(Phase::Order, None);
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            clock: FrameClock::new(config.clock.max_dt),
            last_tick: Tick {
                frame: 0,
                dt: 0.0,
                time: 0.0,
            },
            sampler: DisagreementSampler::new(config.sampler.clone()),
            machine,
            state: PhaseState::initial(),
            phase_time: 0.0,
            particles,
            pointer: PointerState::default(),
            bpm: FrameInputs::DEFAULT_BPM,
            phrase_hash: 0,
            reseed_requested: false,
            pending_reseed: false,
            cycles: 0,
            transitions: 0,
            resets: 0,
            config,
        }
    }

    /// Advances the engine by one frame.
    pub fn tick(&mut self, inputs: &FrameInputs, source: &mut dyn FeatureSource) -> TickReport {
        let tick = self.clock.advance(inputs.timestamp);
        self.last_tick = tick;
        self.pointer = inputs.pointer;
        self.bpm = inputs.bpm;
        self.reseed_requested = std::mem::take(&mut self.pending_reseed);

        let sample = self.sampler.sample(tick.frame, source);
        if sample == SampleOutcome::Unavailable {
            debug!(frame = tick.frame, "feature readback unavailable, keeping disagreement");
            metrics::record_sample_dropped();
        }

        let step = self.machine.advance(
            &self.state,
            &PhaseInput {
                time: tick.time,
                dt: tick.dt,
                disagreement: self.sampler.value(),
                frame: tick.frame,
            },
        );
        self.state = step.state;

        let mut report = TickReport {
            tick,
            sample,
            transition: step.transition,
            shard_burst: None,
            reseed_requested: self.reseed_requested,
            particles_dropped: 0,
        };

        for command in step.commands {
            self.execute(command, &mut report);
        }

        match step.transition {
            Some(transition) => {
                self.phase_time = 0.0;
                self.record_transition(&transition, tick);
            }
            None => self.phase_time += tick.dt,
        }

        self.particles.integrate(tick.dt);

        report.reseed_requested = self.reseed_requested;
        self.publish_gauges();
        report
    }

    fn execute(&mut self, command: PhaseCommand, report: &mut TickReport) {
        match command {
            PhaseCommand::SpawnFlow { energy } => {
                let particle = spawn::flow(&mut self.rng, energy);
                if !self.particles.spawn(particle) {
                    trace!(frame = report.tick.frame, "flow pool at capacity");
                    report.particles_dropped += 1;
                    metrics::record_particles_dropped(ParticleKind::Flow, 1);
                }
            }
            PhaseCommand::SpawnShardBurst { count } => {
                let mut spawned = 0;
                for _ in 0..count {
                    if self.particles.spawn(spawn::shard(&mut self.rng)) {
                        spawned += 1;
                    }
                }
                let dropped = (count - spawned) as u64;
                if dropped > 0 {
                    debug!(
                        requested = count,
                        spawned,
                        capacity = self.particles.shards().capacity(),
                        "shard pool saturated during burst"
                    );
                    metrics::record_particles_dropped(ParticleKind::Shard, dropped);
                }
                report.particles_dropped += dropped;
                report.shard_burst = Some(BurstReport {
                    requested: count,
                    spawned,
                });
            }
            PhaseCommand::ClearParticles => self.particles.clear(),
            PhaseCommand::RequestReseed => {
                debug!(frame = report.tick.frame, "simulation reseed requested");
                self.reseed_requested = true;
            }
        }
    }

    fn record_transition(&mut self, transition: &PhaseTransition, tick: Tick) {
        info!(
            from = %transition.from,
            to = %transition.to,
            frame = tick.frame,
            sim_time = tick.time,
            reason = %transition.reason,
            "phase transition"
        );
        self.transitions += 1;
        if transition.from == Phase::Rebuild && transition.to == Phase::Order {
            self.cycles += 1;
        }
        metrics::record_phase_transition(transition.from, transition.to);
        metrics::set_current_phase(transition.to, Some(transition.from));
    }

    fn publish_gauges(&self) {
        metrics::record_frame();
        metrics::set_contention_energy(self.state.contention_energy());
        metrics::set_disagreement(self.sampler.value());
        for kind in [ParticleKind::Flow, ParticleKind::Shard] {
            metrics::set_particle_count(kind, self.particles.pool(kind).len());
        }
    }

    /// Forces ORDER with every accumulator zeroed and both pools empty.
    ///
    /// Also cancels any cooldown, requests a simulation reseed on the next
    /// tick and picks a new phrase hash.
    pub fn reset(&mut self) {
        let previous = self.state.phase();
        info!(
            frame = self.clock.frames(),
            sim_time = self.clock.time(),
            phase = %previous,
            "engine reset"
        );
        self.state = PhaseState::initial();
        self.phase_time = 0.0;
        self.sampler.reset();
        self.particles.clear();
        self.reseed_requested = false;
        self.pending_reseed = true;
        self.phrase_hash = self.rng.random_range(0..PHRASE_HASH_RANGE);
        self.resets += 1;
        metrics::record_reset();
        if previous != Phase::Order {
            metrics::set_current_phase(Phase::Order, Some(previous));
        }
    }

    /// Folds one typed character into the phrase hash.
    pub fn push_phrase_char(&mut self, c: char) {
        self.phrase_hash = self
            .phrase_hash
            .wrapping_mul(31)
            .wrapping_add(u32::from(c))
            & PHRASE_HASH_MASK;
    }

    /// Borrows the state produced by the last tick.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<'_> {
        let disagreement = self.sampler.value();
        Snapshot {
            frame: self.last_tick.frame,
            time: self.clock.time(),
            dt: self.last_tick.dt,
            phase: self.state.phase(),
            phase_index: self.state.phase().index(),
            contention_energy: self.state.contention_energy(),
            event_progress: self.state.event_progress(),
            rebuild_progress: self.state.rebuild_progress(),
            phase_time: self.phase_time,
            disagreement,
            schism_timer: self.state.schism_timer(),
            cooldown: self.state.cooldown(),
            reseed_requested: self.reseed_requested,
            agents_frozen: self.machine.agents_frozen(&self.state),
            pointer: self.pointer,
            bpm: self.bpm,
            beat_phase: snapshot::beat_phase(self.clock.time(), self.bpm),
            phrase_hash: self.phrase_hash,
            territory_split: snapshot::territory_split(disagreement),
            flow_count: self.particles.flow().len(),
            shard_count: self.particles.shards().len(),
            flow: self.particles.flow().as_slice(),
            shards: self.particles.shards().as_slice(),
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// RNG seed of this engine.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Current phase state.
    #[must_use]
    pub const fn state(&self) -> &PhaseState {
        &self.state
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Smoothed disagreement.
    #[must_use]
    pub const fn disagreement(&self) -> f64 {
        self.sampler.value()
    }

    /// Particle pools.
    #[must_use]
    pub const fn particles(&self) -> &Particles {
        &self.particles
    }

    /// Ticks executed.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.clock.frames()
    }

    /// Simulated seconds elapsed.
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.clock.time()
    }

    /// Simulated seconds since the current phase was entered.
    #[must_use]
    pub const fn phase_time(&self) -> f64 {
        self.phase_time
    }

    /// Completed REBUILD → ORDER cycles.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Phase transitions so far.
    #[must_use]
    pub const fn transitions(&self) -> u64 {
        self.transitions
    }

    /// External resets so far.
    #[must_use]
    pub const fn resets(&self) -> u64 {
        self.resets
    }

    /// Current phrase hash.
    #[must_use]
    pub const fn phrase_hash(&self) -> u32 {
        self.phrase_hash
    }

    /// Whether the agent kernels should stop stepping.
    #[must_use]
    pub fn agents_frozen(&self) -> bool {
        self.machine.agents_frozen(&self.state)
    }
}
