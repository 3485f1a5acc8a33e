//! Core types for pricetrail
//!
//! Domain types and pure computation shared by storage and service crates:
//! observations, product records, identity resolution, price metrics and the
//! field-level merge policy. Nothing in here performs I/O.

pub mod constants;
mod env_config;
mod error;
mod identity;
pub mod merge;
pub mod metrics;
pub mod normalize;
mod observation;
mod product;

pub use constants::*;
pub use env_config::*;
pub use error::*;
pub use identity::*;
pub use merge::{UpdateEffects, merge_observation};
pub use observation::*;
pub use product::*;
