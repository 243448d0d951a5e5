//! Synthetic agents
//!
//! A headless [`FeatureSource`] standing in for the two agent kernels. Each
//! scenario prescribes how far apart the agents drift over time; every read
//! produces a pair of feature samples whose weighted distance tracks that
//! target, with a little noise on top.

use std::f64::consts::TAU;

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::signal::{FeatureSample, FeatureSource};

/// Period of the oscillating scenario, in seconds.
const OSCILLATION_PERIOD: f64 = 40.0;

/// Amplitude of per-read measurement noise.
const READ_NOISE: f64 = 0.02;

/// Random-walk step scale of the drift scenario, per square-root second.
const DRIFT_VOLATILITY: f64 = 0.15;

/// Upper bound of the drift scenario's target divergence.
const DRIFT_CEILING: f64 = 0.9;

/// How the two agents behave relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// The agents mostly agree; the cycle never starts.
    Calm,
    /// Sustained high divergence; the cycle repeats back to back.
    #[default]
    Contested,
    /// Divergence swings slowly across the schism threshold.
    Oscillating,
    /// Divergence follows a bounded random walk.
    Drift,
}

impl Scenario {
    /// Lower-case scenario name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Calm => "calm",
            Self::Contested => "contested",
            Self::Oscillating => "oscillating",
            Self::Drift => "drift",
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Seeded pair of synthetic agents.
#[derive(Debug, Clone)]
pub struct SyntheticAgents {
    scenario: Scenario,
    rng: StdRng,
    time: f64,
    drift: f64,
    unavailable_rate: f64,
}

impl SyntheticAgents {
    /// Creates agents following `scenario`, reproducible from `seed`.
    #[must_use]
    pub fn new(scenario: Scenario, seed: u64) -> Self {
        Self {
            scenario,
            rng: StdRng::seed_from_u64(seed),
            time: 0.0,
            drift: 0.2,
            unavailable_rate: 0.0,
        }
    }

    /// Makes a fraction of reads fail, as a lost readback would.
    ///
    /// `rate` is clamped to `[0, 1]`; non-finite values disable failures.
    #[must_use]
    pub fn with_unavailable_rate(mut self, rate: f64) -> Self {
        self.unavailable_rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
        self
    }

    /// Agent-local time, in seconds.
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Steps the agents by `dt` seconds.
    ///
    /// Not called while the engine reports the agents frozen, so the
    /// divergence holds still through the collapse.
    pub fn step(&mut self, dt: f64) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.time += dt;
        if self.scenario == Scenario::Drift {
            let kick = self.rng.random_range(-1.0..1.0) * DRIFT_VOLATILITY * dt.sqrt();
            self.drift = (self.drift + kick).clamp(0.0, DRIFT_CEILING);
        }
    }

    /// Restarts the agents from a fresh seed, as the external simulation
    /// does when a reseed is requested.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.time = 0.0;
        self.drift = 0.2;
    }

    /// Divergence the scenario prescribes at the current time, in `[0, 1]`.
    #[must_use]
    pub fn target_divergence(&self) -> f64 {
        match self.scenario {
            Scenario::Calm => 0.08,
            Scenario::Contested => 0.65,
            Scenario::Oscillating => {
                0.3f64.mul_add((TAU * self.time / OSCILLATION_PERIOD).sin(), 0.35)
            }
            Scenario::Drift => self.drift,
        }
    }
}

impl FeatureSource for SyntheticAgents {
    #[allow(clippy::cast_possible_truncation)]
    fn read(&mut self) -> Option<(FeatureSample, FeatureSample)> {
        if self.unavailable_rate > 0.0 && self.rng.random_bool(self.unavailable_rate) {
            return None;
        }
        let noise = self.rng.random_range(-READ_NOISE..READ_NOISE);
        let delta = (self.target_divergence() + noise).clamp(0.0, 1.0);
        let heading = self.rng.random_range(0.0..TAU);
        let base0 = self.rng.random::<f64>();
        let base1 = self.rng.random::<f64>();

        // Each weighted term contributes `delta`, so the weights sum it back.
        let b = [base0 as f32, base1 as f32, 0.0, 0.0];
        let a = [
            (base0 + delta) as f32,
            (base1 + delta) as f32,
            (delta * heading.cos()) as f32,
            (delta * heading.sin()) as f32,
        ];
        Some((a, b))
    }
}
