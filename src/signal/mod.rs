//! Disagreement and contention signals
//!
//! - [`DisagreementSampler`]: cadenced, smoothed distance between agents
//! - [`ContentionAccumulator`]: energy integrator active during SCHISM
//! - [`FeatureSource`]: injected readback of the two agents' features

pub mod contention;
pub mod disagreement;

pub use contention::ContentionAccumulator;
pub use disagreement::{DisagreementSampler, FeatureSample, FeatureSource, SampleOutcome};
