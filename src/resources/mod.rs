//! Resource generation module.
//!
//! Contains utilities for generating Kubernetes resources for a ValkeyCluster.
//!
//! ## Resources Generated
//!
//! | Resource | Purpose |
//! |----------|---------|
//! | Deployment | Single Valkey pod with optional metrics exporter |

pub mod common;
pub mod deployment;

// Re-export commonly used items
pub use common::standard_labels;
pub use deployment::generate_deployment;
