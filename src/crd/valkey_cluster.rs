//! ValkeyCluster Custom Resource Definition.
//!
//! Declares the intent the operator synthesizes workloads from: which
//! Valkey image to run and whether a metrics exporter sidecar rides along.

use k8s_openapi::api::core::v1::ResourceRequirements;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ValkeyCluster is a custom resource for deploying Valkey.
///
/// Example:
/// ```yaml
/// apiVersion: valkey.io/v1alpha1
/// kind: ValkeyCluster
/// metadata:
///   name: cache1
///   namespace: default
/// spec:
///   image: valkey/valkey:9-alpine
///   exporter:
///     enabled: true
///     resources:
///       requests:
///         cpu: 50m
///         memory: 64Mi
/// ```
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "valkey.io",
    version = "v1alpha1",
    kind = "ValkeyCluster",
    plural = "valkeyclusters",
    shortname = "vkc",
    namespaced,
    derive = "PartialEq",
    printcolumn = r#"{"name":"Image", "type":"string", "jsonPath":".spec.image"}"#,
    printcolumn = r#"{"name":"Exporter", "type":"boolean", "jsonPath":".spec.exporter.enabled"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ValkeyClusterSpec {
    /// Valkey container image. Empty selects the operator default.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,

    /// Metrics exporter sidecar configuration.
    #[serde(default)]
    pub exporter: ExporterSpec,
}

/// Metrics exporter sidecar configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExporterSpec {
    /// Run the exporter next to the server (default: false).
    #[serde(default)]
    pub enabled: bool,

    /// Exporter container image. Empty selects the operator default.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,

    /// Resource requirements for the exporter container.
    /// Copied as-is; absent means none are declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}
