//! Shared integration-test helpers for driving the engine and the built
//! `collapse` binary.

#![allow(dead_code)]

use std::process::{Command, Output};

use collapse::config::EngineConfig;
use collapse::engine::{Engine, FrameInputs, TickReport};
use collapse::signal::{FeatureSample, FeatureSource};

/// Frame rate used by the engine helpers.
pub const FPS: f64 = 60.0;

/// Feature pair whose weighted distance is `d` (for `d` in `[0, 1]`).
#[allow(clippy::cast_possible_truncation)]
pub fn pair_with_distance(d: f64) -> (FeatureSample, FeatureSample) {
    let d = d as f32;
    ([d, d, d, 0.0], [0.0, 0.0, 0.0, 0.0])
}

/// Source that always reports distance `d`.
pub fn constant(d: f64) -> impl FnMut() -> Option<(FeatureSample, FeatureSample)> {
    move || Some(pair_with_distance(d))
}

/// Engine with default configuration and a fixed seed.
pub fn engine() -> Engine {
    Engine::with_seed(EngineConfig::default(), 1234)
}

/// Ticks `engine` once at the next 60 fps timestamp.
pub fn step(engine: &mut Engine, source: &mut dyn FeatureSource) -> TickReport {
    #[allow(clippy::cast_precision_loss)]
    let timestamp = (engine.frames() + 1) as f64 / FPS;
    engine.tick(&FrameInputs::at(timestamp), source)
}

/// Runs the built binary with `args` and waits for it to exit.
#[allow(clippy::missing_panics_doc)]
pub fn collapse(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_collapse"))
        .args(args)
        .env_remove("COLLAPSE_CONFIG")
        .env_remove("COLLAPSE_LOG_LEVEL")
        .output()
        .expect("failed to spawn collapse")
}
