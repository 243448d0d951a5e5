//! Spawn recipes for flow and shard particles.
//!
//! All randomness is drawn from the caller's RNG so that a seeded engine
//! reproduces the same particles.

use std::f64::consts::TAU;

use rand::Rng;

use super::pool::{Particle, ParticleKind};

/// Hue of agent A's flow particles.
pub const AGENT_A_HUE: f64 = 0.55;

/// Hue of agent B's flow particles.
pub const AGENT_B_HUE: f64 = 0.9;

/// Half-width of the square around the canvas centre where shards spawn.
const SHARD_JITTER: f64 = 0.15;

/// Builds a flow particle at a uniformly random position.
///
/// Speed and size grow with contention `energy`; the hue picks one of the
/// two agents with equal probability.
pub fn flow<R: Rng>(rng: &mut R, energy: f64) -> Particle {
    let energy = energy.clamp(0.0, 1.0);
    let speed = 0.05 + 0.15 * energy;
    let angle = rng.random_range(0.0..TAU);
    Particle {
        x: rng.random::<f64>(),
        y: rng.random::<f64>(),
        vx: angle.cos() * speed,
        vy: angle.sin() * speed,
        age: 0.0,
        max_life: 2.0f64.mul_add(rng.random::<f64>(), 1.5),
        size: 4.0f64.mul_add(energy, 2.0),
        hue: if rng.random_bool(0.5) {
            AGENT_A_HUE
        } else {
            AGENT_B_HUE
        },
        kind: ParticleKind::Flow,
    }
}

/// Builds a shard particle near the canvas centre flying outward.
pub fn shard<R: Rng>(rng: &mut R) -> Particle {
    let x = 0.5 + rng.random_range(-SHARD_JITTER..SHARD_JITTER);
    let y = 0.5 + rng.random_range(-SHARD_JITTER..SHARD_JITTER);
    let angle = rng.random_range(0.0..TAU);
    let speed = 0.4f64.mul_add(rng.random::<f64>(), 0.05);
    Particle {
        x,
        y,
        vx: angle.cos() * speed,
        vy: 0.1f64.mul_add(rng.random::<f64>(), angle.sin() * speed),
        age: 0.0,
        max_life: 4.0f64.mul_add(rng.random::<f64>(), 3.0),
        size: 3.0f64.mul_add(rng.random::<f64>(), 1.0),
        hue: rng.random::<f64>(),
        kind: ParticleKind::Shard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_flow_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let p = flow(&mut rng, 1.0);
            assert_eq!(p.kind, ParticleKind::Flow);
            assert!((0.0..1.0).contains(&p.x));
            assert!((0.0..1.0).contains(&p.y));
            assert!((1.5..3.5).contains(&p.max_life));
            assert!((p.size - 6.0).abs() < 1e-12);
            assert!((p.vx.hypot(p.vy) - 0.2).abs() < 1e-9);
            assert!(p.hue == AGENT_A_HUE || p.hue == AGENT_B_HUE);
        }
    }

    #[test]
    fn test_flow_speed_scales_with_energy() {
        let mut rng = StdRng::seed_from_u64(7);
        let calm = flow(&mut rng, 0.0);
        assert!((calm.vx.hypot(calm.vy) - 0.05).abs() < 1e-9);
        assert!((calm.size - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_shard_ranges() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let p = shard(&mut rng);
            assert_eq!(p.kind, ParticleKind::Shard);
            assert!((0.35..0.65).contains(&p.x));
            assert!((0.35..0.65).contains(&p.y));
            assert!((3.0..7.0).contains(&p.max_life));
            assert!((1.0..4.0).contains(&p.size));
            assert!((0.0..1.0).contains(&p.hue));
            assert!(p.age.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        assert_eq!(shard(&mut a), shard(&mut b));
        assert_eq!(flow(&mut a, 0.5), flow(&mut b, 0.5));
    }
}
