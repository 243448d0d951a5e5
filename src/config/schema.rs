//! Engine configuration schema
//!
//! Every calibrated constant of the engine lives here with its tuned
//! default. Configuration files only need to name the values they change;
//! all sections use `#[serde(default)]`.

use serde::{Deserialize, Serialize};

// ============================================================================
// Top-Level Configuration
// ============================================================================

/// Root configuration for the orchestration engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Frame clock settings
    pub clock: ClockConfig,

    /// Disagreement sampling settings
    pub sampler: SamplerConfig,

    /// Contention energy integration constants
    pub contention: ContentionConfig,

    /// Phase guards, durations and hysteresis
    pub phases: PhaseConfig,

    /// Particle pool capacities and spawn parameters
    pub particles: ParticleConfig,
}

// ============================================================================
// Clock
// ============================================================================

/// Frame clock settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClockConfig {
    /// Upper bound on a single integration step, in seconds.
    ///
    /// Bounds the step after a suspended tab or a slow frame so that one
    /// tick cannot skip several phase transitions.
    pub max_dt: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { max_dt: 0.05 }
    }
}

// ============================================================================
// Sampler
// ============================================================================

/// Disagreement sampler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplerConfig {
    /// Sample once every this many frames.
    pub every_frames: u64,

    /// Weight of the new sample in the exponential smoother.
    pub smoothing: f64,

    /// Weight of the channel-0 absolute difference.
    pub primary_weight: f64,

    /// Weight of the channel-1 absolute difference.
    pub secondary_weight: f64,

    /// Weight of the channel-2/3 magnitude of the first agent.
    pub magnitude_weight: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            every_frames: 10,
            smoothing: 0.15,
            primary_weight: 0.4,
            secondary_weight: 0.3,
            magnitude_weight: 0.3,
        }
    }
}

// ============================================================================
// Contention
// ============================================================================

/// Constants of the contention energy integrator.
///
/// `energy += (min(d, cap)^exponent + boundary_weight * boundary - leak * energy) * dt`
/// with `boundary = max(0, d - boundary_offset) * boundary_gain`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentionConfig {
    /// Power applied to the capped disagreement.
    pub exponent: f64,

    /// Disagreement cap before the power law.
    pub disagreement_cap: f64,

    /// Disagreement level where boundary pressure begins.
    pub boundary_offset: f64,

    /// Gain applied to disagreement above the offset.
    pub boundary_gain: f64,

    /// Contribution of boundary pressure to growth.
    pub boundary_weight: f64,

    /// Self-damping leak rate.
    pub leak: f64,
}

impl Default for ContentionConfig {
    fn default() -> Self {
        Self {
            exponent: 1.6,
            disagreement_cap: 0.8,
            boundary_offset: 0.3,
            boundary_gain: 2.0,
            boundary_weight: 0.002,
            leak: 0.08,
        }
    }
}

// ============================================================================
// Phases
// ============================================================================

/// Phase guards, durations and hysteresis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhaseConfig {
    /// Disagreement above which the schism timer accumulates.
    pub schism_threshold: f64,

    /// Seconds of sustained disagreement required to enter SCHISM.
    pub schism_hold: f64,

    /// Rate at which the schism timer decays, relative to `dt`.
    pub schism_decay: f64,

    /// Contention energy above which SCHISM collapses into EVENT.
    pub event_energy: f64,

    /// Length of the EVENT phase in seconds.
    pub event_duration: f64,

    /// Length of the REBUILD phase in seconds.
    pub rebuild_duration: f64,

    /// Immunity granted after a rebuild, in seconds.
    pub post_rebuild_cooldown: f64,

    /// Event progress after which the agent kernels stop stepping.
    pub freeze_after_progress: f64,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            schism_threshold: 0.28,
            schism_hold: 4.0,
            schism_decay: 0.5,
            event_energy: 0.85,
            event_duration: 7.0,
            rebuild_duration: 12.0,
            post_rebuild_cooldown: 6.0,
            freeze_after_progress: 0.086,
        }
    }
}

// ============================================================================
// Particles
// ============================================================================

/// Particle pool capacities and spawn parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParticleConfig {
    /// Maximum number of live flow particles.
    pub flow_capacity: usize,

    /// Maximum number of live shard particles.
    pub shard_capacity: usize,

    /// Shards spawned by the burst on entering EVENT.
    pub shard_burst: usize,

    /// Request a flow spawn once every this many frames during SCHISM.
    pub flow_every_frames: u64,

    /// Seed for the spawn RNG. A random seed is drawn when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            flow_capacity: 8000,
            shard_capacity: 12_000,
            shard_burst: 12_000,
            flow_every_frames: 3,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_calibration() {
        let config = EngineConfig::default();
        assert!((config.clock.max_dt - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.sampler.every_frames, 10);
        assert!((config.contention.exponent - 1.6).abs() < f64::EPSILON);
        assert!((config.contention.leak - 0.08).abs() < f64::EPSILON);
        assert!((config.phases.schism_threshold - 0.28).abs() < f64::EPSILON);
        assert!((config.phases.event_duration - 7.0).abs() < f64::EPSILON);
        assert!((config.phases.rebuild_duration - 12.0).abs() < f64::EPSILON);
        assert_eq!(config.particles.flow_capacity, 8000);
        assert_eq!(config.particles.shard_burst, 12_000);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "phases:\n  event_duration: 3.5\nparticles:\n  seed: 42\n";
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert!((config.phases.event_duration - 3.5).abs() < f64::EPSILON);
        assert!((config.phases.rebuild_duration - 12.0).abs() < f64::EPSILON);
        assert_eq!(config.particles.seed, Some(42));
        assert_eq!(config.particles.flow_capacity, 8000);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "phases:\n  event_length: 3.5\n";
        let result: Result<EngineConfig, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_yaml_roundtrip_of_defaults() {
        let yaml = serde_yaml::to_string(&EngineConfig::default()).unwrap();
        let parsed: EngineConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, EngineConfig::default());
    }
}
