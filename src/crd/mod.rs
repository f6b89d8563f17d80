//! Custom Resource Definitions (CRDs) for valkey-operator.
//!
//! - `ValkeyCluster`: Declared intent for a Valkey deployment

mod valkey_cluster;

pub use valkey_cluster::*;
