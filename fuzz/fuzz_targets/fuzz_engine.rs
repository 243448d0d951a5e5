#![no_main]

use collapse::config::EngineConfig;
use collapse::engine::{Engine, FrameInputs};
use collapse::signal::FeatureSample;
use libfuzzer_sys::fuzz_target;

const FRAME_BYTES: usize = 1 + 32;

fn sample(bytes: &[u8]) -> FeatureSample {
    let mut out = [0.0; 4];
    for (value, chunk) in out.iter_mut().zip(bytes.chunks_exact(4)) {
        *value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    out
}

fuzz_target!(|data: &[u8]| {
    let mut engine = Engine::with_seed(EngineConfig::default(), 0);
    let mut timestamp = 0.0;

    for frame in data.chunks_exact(FRAME_BYTES) {
        let control = frame[0];
        if control == 0xff {
            engine.reset();
            continue;
        }
        // Low bits pick the step, high bit marks the readback unavailable
        timestamp += f64::from(control & 0x7f) / 1000.0;
        let features =
            (control & 0x80 == 0).then(|| (sample(&frame[1..17]), sample(&frame[17..33])));
        let mut source = move || features;
        engine.tick(&FrameInputs::at(timestamp), &mut source);

        let snap = engine.snapshot();
        assert!((0.0..=1.0).contains(&snap.contention_energy));
        assert!((0.0..=1.0).contains(&snap.disagreement));
        assert!(snap.flow_count <= engine.config().particles.flow_capacity);
        assert!(snap.shard_count <= engine.config().particles.shard_capacity);
    }
});
