//! valkey-operator library crate
//!
//! This module exports the CRD definitions, synthesis defaults, resource
//! generators, and the manifest loading used by the binary.

pub mod config;
pub mod crd;
pub mod error;
pub mod manifest;
pub mod resources;

pub use config::SynthesisDefaults;
pub use error::{Error, Result};
pub use resources::generate_deployment;
