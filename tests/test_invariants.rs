//! Property tests: engine invariants hold for arbitrary input sequences,
//! including non-finite features, stalled and regressing clocks, and resets
//! at arbitrary points.

mod common;

use collapse::config::EngineConfig;
use collapse::engine::{Engine, FrameInputs};
use collapse::particles::{Particle, ParticleKind, ParticlePool};
use collapse::phase::Phase;
use collapse::signal::FeatureSample;
use proptest::prelude::*;

/// Configuration with short phases and small pools so that random inputs
/// reach every phase and saturate the pools.
fn fast_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.phases.schism_hold = 0.2;
    config.phases.event_duration = 0.3;
    config.phases.rebuild_duration = 0.3;
    config.phases.post_rebuild_cooldown = 0.2;
    config.sampler.every_frames = 2;
    config.particles.flow_capacity = 20;
    config.particles.shard_capacity = 50;
    config.particles.shard_burst = 80;
    config.particles.flow_every_frames = 1;
    config
}

#[derive(Debug, Clone)]
struct Frame {
    advance: f64,
    features: Option<(FeatureSample, FeatureSample)>,
    reset: bool,
}

fn feature() -> impl Strategy<Value = FeatureSample> {
    prop_oneof![
        4 => prop::array::uniform4(0.0f32..1.0),
        1 => prop::array::uniform4(any::<f32>()),
    ]
}

fn frame() -> impl Strategy<Value = Frame> {
    (
        prop_oneof![8 => 0.0f64..0.05, 1 => -1.0f64..0.0, 1 => 0.05f64..10.0],
        prop::option::weighted(0.9, (feature(), feature())),
        prop::bool::weighted(0.01),
    )
        .prop_map(|(advance, features, reset)| Frame {
            advance,
            features,
            reset,
        })
}

fn unit(x: f64) -> bool {
    (0.0..=1.0).contains(&x)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn engine_state_stays_in_range(frames in prop::collection::vec(frame(), 1..600), seed in any::<u64>()) {
        let config = fast_config();
        let mut engine = Engine::with_seed(config.clone(), seed);
        let mut timestamp = 0.0;
        let mut phase = Phase::Order;

        for f in frames {
            if f.reset {
                engine.reset();
                phase = Phase::Order;
                prop_assert!(engine.particles().is_empty());
                prop_assert_eq!(engine.phase(), Phase::Order);
            }
            timestamp += f.advance;
            let mut source = move || f.features;
            let report = engine.tick(&FrameInputs::at(timestamp), &mut source);

            prop_assert!(report.tick.dt >= 0.0 && report.tick.dt <= config.clock.max_dt);
            if let Some(t) = report.transition {
                prop_assert_eq!(t.from, phase);
                prop_assert_eq!(t.to, phase.next());
                phase = t.to;
            }

            let snap = engine.snapshot();
            prop_assert!(unit(snap.contention_energy));
            prop_assert!(unit(snap.disagreement));
            prop_assert!(unit(snap.event_progress));
            prop_assert!(unit(snap.rebuild_progress));
            prop_assert!(snap.schism_timer >= 0.0);
            prop_assert!(snap.cooldown >= 0.0);
            prop_assert!((20.0..=80.0).contains(&snap.territory_split));
            prop_assert!(snap.flow.len() <= config.particles.flow_capacity);
            prop_assert!(snap.shards.len() <= config.particles.shard_capacity);
            for p in snap.flow.iter().chain(snap.shards) {
                prop_assert!(p.age <= p.max_life);
            }
        }
    }

    #[test]
    fn particles_age_every_step_and_expire_once_past_max_life(
        lives in prop::collection::vec(0.01f64..1.0, 1..40),
        steps in prop::collection::vec(0.001f64..0.1, 1..60),
    ) {
        let mut pool = ParticlePool::new(ParticleKind::Flow, lives.len());
        for (id, life) in lives.iter().enumerate() {
            // The hue carries the index so ages can be matched across steps
            #[allow(clippy::cast_precision_loss)]
            let hue = id as f64;
            pool.spawn(Particle {
                x: 0.5,
                y: 0.5,
                vx: 0.0,
                vy: 0.0,
                age: 0.0,
                max_life: *life,
                size: 1.0,
                hue,
                kind: ParticleKind::Flow,
            });
        }

        let mut previous: Vec<f64> = vec![0.0; lives.len()];
        let mut elapsed = 0.0;
        for dt in steps {
            elapsed += dt;
            pool.integrate(dt);
            let expected = lives.iter().filter(|life| elapsed <= **life).count();
            prop_assert_eq!(pool.len(), expected);
            for p in pool.as_slice() {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let id = p.hue as usize;
                prop_assert!(p.age > previous[id], "age {} did not grow past {}", p.age, previous[id]);
                prop_assert!(p.age <= p.max_life);
                previous[id] = p.age;
            }
        }
    }

    #[test]
    fn zero_step_changes_nothing(lives in prop::collection::vec(0.1f64..2.0, 1..20)) {
        let mut pool = ParticlePool::new(ParticleKind::Shard, 32);
        for (i, life) in lives.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let v = i as f64 * 0.01;
            pool.spawn(Particle {
                x: 0.5,
                y: 0.5,
                vx: v,
                vy: -v,
                age: 0.0,
                max_life: *life,
                size: 1.0,
                hue: 0.1,
                kind: ParticleKind::Shard,
            });
        }
        let before = pool.as_slice().to_vec();
        pool.integrate(0.0);
        prop_assert_eq!(pool.as_slice(), before.as_slice());
    }
}
