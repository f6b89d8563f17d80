//! Common resource generation utilities.
//!
//! Label and name derivation shared by every object generated for a
//! ValkeyCluster.

use kube::ResourceExt;
use std::collections::BTreeMap;

use crate::crd::ValkeyCluster;

/// Value of `app.kubernetes.io/name` on managed objects
pub const APP_NAME: &str = "valkey";
/// Value of `app.kubernetes.io/component` on managed objects
pub const COMPONENT: &str = "valkey-cluster";
/// Value of `app.kubernetes.io/managed-by` on managed objects
pub const MANAGED_BY: &str = "valkey-operator";

/// Standard labels applied to all managed resources.
///
/// Derived only from the cluster's identity, so the same set can serve as
/// both object labels and pod selector.
pub fn standard_labels(resource: &ValkeyCluster) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("app.kubernetes.io/name".to_string(), APP_NAME.to_string());
    labels.insert(
        "app.kubernetes.io/instance".to_string(),
        resource.name_any(),
    );
    labels.insert(
        "app.kubernetes.io/component".to_string(),
        COMPONENT.to_string(),
    );
    labels.insert(
        "app.kubernetes.io/managed-by".to_string(),
        MANAGED_BY.to_string(),
    );
    labels
}

/// Name of the ConfigMap holding scripts and `valkey.conf` for a cluster.
pub fn config_map_name(resource: &ValkeyCluster) -> String {
    resource.name_any()
}

/// Prefix the API server completes into a unique workload name.
pub fn generate_name_prefix(resource: &ValkeyCluster) -> String {
    format!("{}-", resource.name_any())
}
