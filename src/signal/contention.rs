//! Contention energy integration
//!
//! During SCHISM the smoothed disagreement is integrated into a bounded
//! energy scalar. Growth follows a power law of the (capped) disagreement
//! plus a small boundary-pressure term; a linear leak proportional to the
//! current energy gives a soft ceiling below the hard clamp at 1.

use crate::config::schema::ContentionConfig;

/// Integrator for contention energy.
///
/// Stateless apart from its constants: the energy itself is owned by the
/// SCHISM phase state and passed in on every step.
#[derive(Debug, Clone)]
pub struct ContentionAccumulator {
    config: ContentionConfig,
}

impl ContentionAccumulator {
    /// Creates an accumulator with the given constants.
    #[must_use]
    pub const fn new(config: ContentionConfig) -> Self {
        Self { config }
    }

    /// Boundary pressure derived from disagreement above the offset.
    #[must_use]
    pub fn boundary_pressure(&self, disagreement: f64) -> f64 {
        (disagreement - self.config.boundary_offset).max(0.0) * self.config.boundary_gain
    }

    /// Instantaneous rate of change of energy.
    #[must_use]
    pub fn rate(&self, energy: f64, disagreement: f64) -> f64 {
        let c = &self.config;
        let drive = disagreement.min(c.disagreement_cap).max(0.0).powf(c.exponent);
        drive + c.boundary_weight * self.boundary_pressure(disagreement) - c.leak * energy
    }

    /// Advances `energy` by `dt` seconds, returning the clamped result.
    #[must_use]
    pub fn step(&self, energy: f64, disagreement: f64, dt: f64) -> f64 {
        if !disagreement.is_finite() {
            return energy.clamp(0.0, 1.0);
        }
        let next = energy + self.rate(energy, disagreement) * dt;
        if next.is_finite() {
            next.clamp(0.0, 1.0)
        } else {
            energy.clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acc() -> ContentionAccumulator {
        ContentionAccumulator::new(ContentionConfig::default())
    }

    #[test]
    fn test_no_disagreement_only_leaks() {
        let a = acc();
        let e = a.step(0.5, 0.0, 1.0);
        assert!((e - (0.5 - 0.08 * 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_exact_formula() {
        let a = acc();
        let d: f64 = 0.6;
        let energy = 0.2;
        let dt = 0.016;
        let expected = energy
            + (d.min(0.8).powf(1.6) + 0.002 * ((d - 0.3) * 2.0) - 0.08 * energy) * dt;
        assert!((a.step(energy, d, dt) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_disagreement_capped() {
        let a = acc();
        let high = a.rate(0.0, 1.0);
        let capped = a.rate(0.0, 0.8);
        // Only the boundary term keeps growing past the cap.
        assert!((high - capped - 0.002 * 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_clamped_to_unit_interval() {
        let a = acc();
        assert!((a.step(0.99, 1.0, 10.0) - 1.0).abs() < f64::EPSILON);
        assert!(a.step(0.0, 0.0, 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_finite_input_keeps_energy() {
        let a = acc();
        assert!((a.step(0.4, f64::NAN, 0.016) - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_power_law_favours_sustained_high_disagreement() {
        let a = acc();
        assert!(a.rate(0.0, 0.8) > 2.0 * a.rate(0.0, 0.4));
    }

    #[test]
    fn test_out_of_range_cap_does_not_panic() {
        for cap in [-0.5, f64::NAN] {
            let a = ContentionAccumulator::new(ContentionConfig {
                disagreement_cap: cap,
                ..ContentionConfig::default()
            });
            assert!((0.0..=1.0).contains(&a.step(0.2, 0.6, 0.016)));
        }
    }
}
