//! Configuration validation
//!
//! Runs after deserialization on the typed `EngineConfig`. Validation
//! collects every issue instead of stopping at the first one.

use crate::config::schema::{
    ClockConfig, ContentionConfig, EngineConfig, ParticleConfig, PhaseConfig, SamplerConfig,
};
use crate::error::{Severity, ValidationIssue};

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration and returns the result.
    pub fn validate(&mut self, config: &EngineConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_clock(&config.clock);
        self.validate_sampler(&config.sampler);
        self.validate_contention(&config.contention);
        self.validate_phases(&config.phases);
        self.validate_particles(&config.particles);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn validate_clock(&mut self, clock: &ClockConfig) {
        self.require_positive("clock.max_dt", clock.max_dt);
        if clock.max_dt > 0.25 {
            self.add_warning(
                "clock.max_dt",
                "steps above 250ms can skip through short phases",
            );
        }
    }

    fn validate_sampler(&mut self, sampler: &SamplerConfig) {
        if sampler.every_frames == 0 {
            self.add_error("sampler.every_frames", "must be at least 1");
        }
        if !(sampler.smoothing > 0.0 && sampler.smoothing <= 1.0) {
            self.add_error("sampler.smoothing", "must be in (0, 1]");
        }
        self.require_non_negative("sampler.primary_weight", sampler.primary_weight);
        self.require_non_negative("sampler.secondary_weight", sampler.secondary_weight);
        self.require_non_negative("sampler.magnitude_weight", sampler.magnitude_weight);
    }

    fn validate_contention(&mut self, contention: &ContentionConfig) {
        self.require_positive("contention.exponent", contention.exponent);
        self.require_unit("contention.disagreement_cap", contention.disagreement_cap);
        self.require_unit("contention.boundary_offset", contention.boundary_offset);
        self.require_non_negative("contention.boundary_gain", contention.boundary_gain);
        self.require_non_negative("contention.boundary_weight", contention.boundary_weight);
        self.require_non_negative("contention.leak", contention.leak);
    }

    fn validate_phases(&mut self, phases: &PhaseConfig) {
        self.require_unit("phases.schism_threshold", phases.schism_threshold);
        self.require_positive("phases.schism_hold", phases.schism_hold);
        self.require_non_negative("phases.schism_decay", phases.schism_decay);
        self.require_unit("phases.event_energy", phases.event_energy);
        self.require_positive("phases.event_duration", phases.event_duration);
        self.require_positive("phases.rebuild_duration", phases.rebuild_duration);
        self.require_non_negative("phases.post_rebuild_cooldown", phases.post_rebuild_cooldown);
        self.require_unit("phases.freeze_after_progress", phases.freeze_after_progress);

        // Energy saturates at the fixed point of the leak; a threshold at or
        // above 1 can never be crossed.
        if phases.event_energy >= 1.0 {
            self.add_warning(
                "phases.event_energy",
                "threshold of 1.0 is unreachable, SCHISM will never end",
            );
        }
    }

    fn validate_particles(&mut self, particles: &ParticleConfig) {
        if particles.flow_capacity == 0 {
            self.add_error("particles.flow_capacity", "must be at least 1");
        }
        if particles.shard_capacity == 0 {
            self.add_error("particles.shard_capacity", "must be at least 1");
        }
        if particles.flow_every_frames == 0 {
            self.add_error("particles.flow_every_frames", "must be at least 1");
        }
        if particles.shard_burst > particles.shard_capacity {
            self.add_warning(
                "particles.shard_burst",
                &format!(
                    "burst of {} exceeds shard capacity {}; excess shards are dropped",
                    particles.shard_burst, particles.shard_capacity
                ),
            );
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn require_positive(&mut self, path: &str, value: f64) {
        if !(value.is_finite() && value > 0.0) {
            self.add_error(path, &format!("must be a positive number, got {value}"));
        }
    }

    fn require_non_negative(&mut self, path: &str, value: f64) {
        if !(value.is_finite() && value >= 0.0) {
            self.add_error(path, &format!("must be a non-negative number, got {value}"));
        }
    }

    fn require_unit(&mut self, path: &str, value: f64) {
        if !(0.0..=1.0).contains(&value) {
            self.add_error(path, &format!("must be in [0, 1], got {value}"));
        }
    }

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}
