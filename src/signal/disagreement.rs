//! Disagreement sampling
//!
//! Measures how far the two agents' outputs have drifted apart and
//! low-pass-filters the measurement into a smoothed scalar in `[0, 1]`.

use tracing::trace;

use crate::config::schema::SamplerConfig;

/// Four-channel feature vector read back from one agent.
///
/// The channel meaning belongs to the agent kernels; the sampler only
/// compares them.
pub type FeatureSample = [f32; 4];

/// Source of per-agent feature samples.
///
/// Backed in production by a readback from the simulation device. A read
/// may fail (readback not ready, device lost); returning `None` makes the
/// sampler keep its previous value.
pub trait FeatureSource {
    /// Reads the current feature sample of agent A and agent B.
    fn read(&mut self) -> Option<(FeatureSample, FeatureSample)>;
}

impl<F> FeatureSource for F
where
    F: FnMut() -> Option<(FeatureSample, FeatureSample)>,
{
    fn read(&mut self) -> Option<(FeatureSample, FeatureSample)> {
        self()
    }
}

/// Outcome of a sampling attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// Not a sampling frame.
    Skipped,
    /// Source had no sample, or the sample was not finite.
    Unavailable,
    /// A raw distance was blended into the smoothed value.
    Blended(f64),
}

/// Cadenced, exponentially smoothed disagreement sampler.
#[derive(Debug, Clone)]
pub struct DisagreementSampler {
    config: SamplerConfig,
    value: f64,
}

impl DisagreementSampler {
    /// Creates a sampler starting from zero disagreement.
    #[must_use]
    pub const fn new(config: SamplerConfig) -> Self {
        Self { config, value: 0.0 }
    }

    /// Current smoothed disagreement, always in `[0, 1]`.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Whether `frame` is a sampling frame.
    #[must_use]
    pub const fn is_sampling_frame(&self, frame: u64) -> bool {
        frame.is_multiple_of(self.config.every_frames)
    }

    /// Samples the source if `frame` falls on the cadence.
    pub fn sample(&mut self, frame: u64, source: &mut dyn FeatureSource) -> SampleOutcome {
        if !self.is_sampling_frame(frame) {
            return SampleOutcome::Skipped;
        }
        let Some((a, b)) = source.read() else {
            return SampleOutcome::Unavailable;
        };
        match self.distance(&a, &b) {
            Some(d) => {
                self.blend(d);
                trace!(frame, raw = d, smoothed = self.value, "disagreement sampled");
                SampleOutcome::Blended(d)
            }
            None => SampleOutcome::Unavailable,
        }
    }

    /// Weighted distance between two feature samples, clamped to `[0, 1]`.
    ///
    /// Returns `None` if any channel is NaN or infinite.
    #[must_use]
    pub fn distance(&self, a: &FeatureSample, b: &FeatureSample) -> Option<f64> {
        if a.iter().chain(b.iter()).any(|c| !c.is_finite()) {
            return None;
        }
        let primary = f64::from((a[0] - b[0]).abs());
        let secondary = f64::from((a[1] - b[1]).abs());
        let magnitude = f64::from(a[2]).hypot(f64::from(a[3]));
        let d = primary * self.config.primary_weight
            + magnitude * self.config.magnitude_weight
            + secondary * self.config.secondary_weight;
        Some(d.clamp(0.0, 1.0))
    }

    /// Blends a raw distance into the smoothed value.
    ///
    /// A blend that is not finite (NaN input or weights) leaves the value
    /// unchanged.
    pub fn blend(&mut self, raw: f64) {
        let k = self.config.smoothing;
        let next = self.value * (1.0 - k) + raw.clamp(0.0, 1.0) * k;
        if next.is_finite() {
            self.value = next.clamp(0.0, 1.0);
        }
    }

    /// Returns the smoothed value to zero.
    pub const fn reset(&mut self) {
        self.value = 0.0;
    }
}
