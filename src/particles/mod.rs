//! Particle pools
//!
//! Two independently capacitated pools: ambient flow particles spawned
//! during SCHISM and a one-shot shard burst spawned on entering EVENT.
//! Both are integrated every tick and pruned by age.

pub mod pool;
pub mod spawn;

pub use pool::{Particle, ParticleKind, ParticlePool, Particles};
