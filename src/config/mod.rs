//! Configuration module
//!
//! Loading and validation of engine configuration files. Every tuned
//! constant of the orchestration engine is a field of [`EngineConfig`].

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{LoadResult, LoadWarning, load_config, parse_config};
pub use schema::*;
pub use validation::{ValidationResult, Validator};
