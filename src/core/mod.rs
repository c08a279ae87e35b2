/*!
 * Core Module
 * Fundamental types, limits, configuration, errors, serde helpers and lock primitives
 */

pub mod config;
pub mod errors;
pub mod limits;
pub mod serde;
pub mod sync;
pub mod types;

// Re-export for convenience
pub use config::{CoreConfig, FactMode};
pub use errors::*;
pub use types::*;
