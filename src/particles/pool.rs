//! Bounded particle pools and their integration step.

use serde::Serialize;
use tracing::debug;

/// Constant downward acceleration applied to shards, per second.
pub const SHARD_GRAVITY: f64 = 0.3;

/// Horizontal velocity damping applied to shards each tick.
pub const SHARD_DRAG: f64 = 0.995;

/// Isotropic velocity damping applied to flow particles each tick.
pub const FLOW_DRAG: f64 = 0.98;

/// Particle kind, selecting spawn trigger and secondary dynamics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    /// Ambient particle spawned continuously during SCHISM.
    Flow,
    /// Burst particle spawned once on entering EVENT.
    Shard,
}

impl ParticleKind {
    /// Lower-case name, used for metrics labels and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flow => "flow",
            Self::Shard => "shard",
        }
    }
}

impl std::fmt::Display for ParticleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transient particle in normalized canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Particle {
    /// Horizontal position
    pub x: f64,
    /// Vertical position
    pub y: f64,
    /// Horizontal velocity, units per second
    pub vx: f64,
    /// Vertical velocity, units per second
    pub vy: f64,
    /// Seconds since spawn
    pub age: f64,
    /// Lifetime in seconds; the particle is removed once `age` exceeds it
    pub max_life: f64,
    /// Point size in pixels
    pub size: f64,
    /// Hue in `[0, 1]`
    pub hue: f64,
    /// Particle kind
    pub kind: ParticleKind,
}

impl Particle {
    /// Advances this particle by `dt` seconds.
    ///
    /// Returns `false` if the particle expired this tick, in which case it
    /// is not moved.
    fn advance(&mut self, dt: f64) -> bool {
        self.age += dt;
        if self.age > self.max_life {
            return false;
        }
        self.x += self.vx * dt;
        self.y += self.vy * dt;
        match self.kind {
            ParticleKind::Shard => {
                self.vy -= SHARD_GRAVITY * dt;
                self.vx *= SHARD_DRAG;
            }
            ParticleKind::Flow => {
                self.vx *= FLOW_DRAG;
                self.vy *= FLOW_DRAG;
            }
        }
        true
    }
}

/// A capacity-bounded collection of particles of one kind.
///
/// Spawning into a full pool is silently dropped; saturation under high
/// contention is expected steady-state behavior.
#[derive(Debug, Clone)]
pub struct ParticlePool {
    kind: ParticleKind,
    capacity: usize,
    particles: Vec<Particle>,
}

impl ParticlePool {
    /// Creates an empty pool for `kind` holding at most `capacity` particles.
    #[must_use]
    pub fn new(kind: ParticleKind, capacity: usize) -> Self {
        Self {
            kind,
            capacity,
            particles: Vec::with_capacity(capacity.min(1024)),
        }
    }

    /// Appends a particle unless the pool is full.
    ///
    /// Returns `true` if the particle was stored.
    pub fn spawn(&mut self, particle: Particle) -> bool {
        if self.particles.len() >= self.capacity {
            return false;
        }
        self.particles.push(particle);
        true
    }

    /// Integrates every particle by `dt` seconds and removes expired ones.
    ///
    /// A non-positive `dt` leaves the pool untouched.
    pub fn integrate(&mut self, dt: f64) {
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }
        self.particles.retain_mut(|p| p.advance(dt));
    }

    /// Removes every particle.
    pub fn clear(&mut self) {
        if !self.particles.is_empty() {
            debug!(kind = %self.kind, count = self.particles.len(), "particle pool cleared");
        }
        self.particles.clear();
    }

    /// Maximum number of live particles.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live particles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Live particles.
    #[must_use]
    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }
}

/// The flow and shard pools, owned together by the engine.
#[derive(Debug, Clone)]
pub struct Particles {
    flow: ParticlePool,
    shards: ParticlePool,
}

impl Particles {
    /// Creates both pools with independent capacities.
    #[must_use]
    pub fn new(flow_capacity: usize, shard_capacity: usize) -> Self {
        Self {
            flow: ParticlePool::new(ParticleKind::Flow, flow_capacity),
            shards: ParticlePool::new(ParticleKind::Shard, shard_capacity),
        }
    }

    /// Routes a particle to the pool of its kind.
    ///
    /// Returns `true` if the particle was stored.
    pub fn spawn(&mut self, particle: Particle) -> bool {
        self.pool_mut(particle.kind).spawn(particle)
    }

    /// Integrates both pools by `dt` seconds.
    pub fn integrate(&mut self, dt: f64) {
        self.flow.integrate(dt);
        self.shards.integrate(dt);
    }

    /// Empties both pools.
    pub fn clear(&mut self) {
        self.flow.clear();
        self.shards.clear();
    }

    /// The flow pool.
    #[must_use]
    pub const fn flow(&self) -> &ParticlePool {
        &self.flow
    }

    /// The shard pool.
    #[must_use]
    pub const fn shards(&self) -> &ParticlePool {
        &self.shards
    }

    /// The pool holding particles of `kind`.
    #[must_use]
    pub const fn pool(&self, kind: ParticleKind) -> &ParticlePool {
        match kind {
            ParticleKind::Flow => &self.flow,
            ParticleKind::Shard => &self.shards,
        }
    }

    const fn pool_mut(&mut self, kind: ParticleKind) -> &mut ParticlePool {
        match kind {
            ParticleKind::Flow => &mut self.flow,
            ParticleKind::Shard => &mut self.shards,
        }
    }

    /// Live particles across both pools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flow.len() + self.shards.len()
    }

    /// Whether both pools are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flow.is_empty() && self.shards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(kind: ParticleKind, max_life: f64) -> Particle {
        Particle {
            x: 0.5,
            y: 0.5,
            vx: 1.0,
            vy: 1.0,
            age: 0.0,
            max_life,
            size: 2.0,
            hue: 0.55,
            kind,
        }
    }

    #[test]
    fn test_spawn_respects_capacity() {
        let mut pool = ParticlePool::new(ParticleKind::Flow, 3);
        for _ in 0..10 {
            pool.spawn(particle(ParticleKind::Flow, 1.0));
        }
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.capacity(), 3);
    }

    #[test]
    fn test_flow_dynamics() {
        let mut pool = ParticlePool::new(ParticleKind::Flow, 1);
        pool.spawn(particle(ParticleKind::Flow, 1.0));
        pool.integrate(0.1);
        let p = pool.as_slice()[0];
        assert!((p.x - 0.6).abs() < 1e-12);
        assert!((p.y - 0.6).abs() < 1e-12);
        assert!((p.vx - 0.98).abs() < 1e-12);
        assert!((p.vy - 0.98).abs() < 1e-12);
        assert!((p.age - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_shard_dynamics() {
        let mut pool = ParticlePool::new(ParticleKind::Shard, 1);
        pool.spawn(particle(ParticleKind::Shard, 1.0));
        pool.integrate(0.1);
        let p = pool.as_slice()[0];
        assert!((p.x - 0.6).abs() < 1e-12);
        assert!((p.vx - 0.995).abs() < 1e-12);
        assert!((p.vy - (1.0 - 0.03)).abs() < 1e-12);
    }

    #[test]
    fn test_removed_first_tick_age_exceeds_max_life() {
        let mut pool = ParticlePool::new(ParticleKind::Flow, 1);
        pool.spawn(particle(ParticleKind::Flow, 0.25));
        pool.integrate(0.1);
        pool.integrate(0.1);
        assert_eq!(pool.len(), 1);
        assert!(pool.as_slice()[0].age <= 0.25);
        pool.integrate(0.1);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_age_equal_to_max_life_survives() {
        let mut pool = ParticlePool::new(ParticleKind::Flow, 1);
        pool.spawn(particle(ParticleKind::Flow, 0.5));
        pool.integrate(0.5);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_integrate_zero_is_noop() {
        let mut particles = Particles::new(4, 4);
        particles.spawn(particle(ParticleKind::Flow, 1.0));
        particles.spawn(particle(ParticleKind::Shard, 1.0));
        let before_flow = particles.flow().as_slice().to_vec();
        let before_shards = particles.shards().as_slice().to_vec();
        particles.integrate(0.0);
        assert_eq!(particles.flow().as_slice(), before_flow.as_slice());
        assert_eq!(particles.shards().as_slice(), before_shards.as_slice());
    }

    #[test]
    fn test_routing_and_clear() {
        let mut particles = Particles::new(2, 5);
        for _ in 0..4 {
            particles.spawn(particle(ParticleKind::Flow, 1.0));
            particles.spawn(particle(ParticleKind::Shard, 1.0));
        }
        assert_eq!(particles.flow().len(), 2);
        assert_eq!(particles.shards().len(), 4);
        assert_eq!(particles.len(), 6);
        particles.clear();
        assert!(particles.is_empty());
        assert_eq!(particles.pool(ParticleKind::Flow).capacity(), 2);
    }

    #[test]
    fn test_mixed_expiry_keeps_survivors_in_order() {
        let mut pool = ParticlePool::new(ParticleKind::Flow, 4);
        for (i, life) in [0.05, 1.0, 0.05, 1.0].into_iter().enumerate() {
            let mut p = particle(ParticleKind::Flow, life);
            p.hue = f64::from(u8::try_from(i).unwrap());
            pool.spawn(p);
        }
        pool.integrate(0.1);
        let hues: Vec<f64> = pool.as_slice().iter().map(|p| p.hue).collect();
        assert_eq!(hues, vec![1.0, 3.0]);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ParticleKind::Shard).unwrap(),
            "\"shard\""
        );
    }
}
