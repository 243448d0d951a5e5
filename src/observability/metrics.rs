//! Metrics collection for the collapse engine.
//!
//! Prometheus-compatible metrics with typed convenience functions. Every
//! label value comes from a closed set (phase names, particle kinds), so no
//! label sanitizing is needed. The `metrics` macros silently no-op until a
//! recorder is installed, which lets the engine record unconditionally.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::CollapseError;
use crate::particles::ParticleKind;
use crate::phase::Phase;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without an
/// HTTP endpoint. Calling this more than once is a no-op.
///
/// The HTTP listener is spawned on the current Tokio runtime, so call this
/// from within one when a port is given.
///
/// # Errors
///
/// Returns `CollapseError::Metrics` if the recorder or HTTP listener
/// cannot be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), CollapseError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| CollapseError::Metrics(e.to_string()))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!("collapse_frames_total", "Total number of engine ticks");
    describe_counter!(
        "collapse_phase_transitions_total",
        "Total number of phase transitions"
    );
    describe_counter!(
        "collapse_samples_dropped_total",
        "Disagreement samples skipped because the feature readback was unavailable"
    );
    describe_counter!(
        "collapse_particles_dropped_total",
        "Particle spawns dropped because the pool was at capacity"
    );
    describe_counter!("collapse_resets_total", "Total number of engine resets");
    describe_gauge!("collapse_current_phase", "Currently active phase (1 = active)");
    describe_gauge!("collapse_contention_energy", "Current contention energy");
    describe_gauge!("collapse_disagreement", "Current smoothed disagreement");
    describe_gauge!("collapse_particles", "Live particles by kind");
}

/// Records one engine tick.
pub fn record_frame() {
    counter!("collapse_frames_total").increment(1);
}

/// Records a phase transition.
pub fn record_phase_transition(from: Phase, to: Phase) {
    counter!(
        "collapse_phase_transitions_total",
        "from" => from.name(),
        "to" => to.name()
    )
    .increment(1);
}

/// Sets the currently active phase gauge.
///
/// Zeros out the previous phase label (if any) before setting the new one,
/// preventing stale labels from showing `1.0` in Prometheus.
pub fn set_current_phase(phase: Phase, previous: Option<Phase>) {
    if let Some(prev) = previous {
        gauge!("collapse_current_phase", "phase" => prev.name()).set(0.0);
    }
    gauge!("collapse_current_phase", "phase" => phase.name()).set(1.0);
}

/// Records a sampling attempt that found no usable readback.
pub fn record_sample_dropped() {
    counter!("collapse_samples_dropped_total").increment(1);
}

/// Records spawns dropped at pool capacity.
pub fn record_particles_dropped(kind: ParticleKind, count: u64) {
    if count > 0 {
        counter!("collapse_particles_dropped_total", "kind" => kind.as_str()).increment(count);
    }
}

/// Records an engine reset.
pub fn record_reset() {
    counter!("collapse_resets_total").increment(1);
}

/// Sets the contention energy gauge.
pub fn set_contention_energy(energy: f64) {
    gauge!("collapse_contention_energy").set(energy);
}

/// Sets the disagreement gauge.
pub fn set_disagreement(disagreement: f64) {
    gauge!("collapse_disagreement").set(disagreement);
}

/// Sets the live particle count for `kind`.
#[allow(clippy::cast_precision_loss)]
pub fn set_particle_count(kind: ParticleKind, count: usize) {
    gauge!("collapse_particles", "kind" => kind.as_str()).set(count as f64);
}
