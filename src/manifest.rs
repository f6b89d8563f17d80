//! Loading ValkeyCluster manifests and rendering generated resources.
//!
//! This is the caller side of resource generation: it reads user-authored
//! YAML, checks the identity fields the generators rely on, and serializes
//! the result.

use std::io::Read;
use std::path::Path;

use k8s_openapi::api::apps::v1::Deployment;
use kube::core::TypeMeta;
use kube::{Resource, ResourceExt};
use tracing::debug;

use crate::crd::ValkeyCluster;
use crate::error::{Error, Result};

/// Path value that selects standard input.
pub const STDIN_PATH: &str = "-";

/// Output encoding for rendered resources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Read a ValkeyCluster manifest from `path` (or stdin for `-`).
///
/// A manifest without a namespace is placed in `fallback_namespace`.
pub fn load_cluster(path: &Path, fallback_namespace: &str) -> Result<ValkeyCluster> {
    let content = if path == Path::new(STDIN_PATH) {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?
    };
    debug!(path = %path.display(), bytes = content.len(), "Read cluster manifest");

    parse_cluster(&content, fallback_namespace)
}

/// Parse a ValkeyCluster from YAML (or JSON) text and validate its identity.
///
/// The document's `apiVersion`/`kind` are checked first, since every spec
/// field has a default and other kinds would otherwise parse cleanly.
pub fn parse_cluster(content: &str, fallback_namespace: &str) -> Result<ValkeyCluster> {
    let types: TypeMeta = serde_yaml::from_str(content)?;
    validate_type(&types)?;

    let mut cluster: ValkeyCluster = serde_yaml::from_str(content)?;
    validate_identity(&mut cluster, fallback_namespace)?;
    debug!(
        name = %cluster.name_any(),
        namespace = %cluster.namespace().unwrap_or_default(),
        exporter = cluster.spec.exporter.enabled,
        "Parsed ValkeyCluster"
    );
    Ok(cluster)
}

/// Ensure the manifest declares the ValkeyCluster group/version and kind.
pub fn validate_type(types: &TypeMeta) -> Result<()> {
    let api_version = ValkeyCluster::api_version(&());
    let kind = ValkeyCluster::kind(&());
    if types.api_version != api_version || types.kind != kind {
        return Err(Error::WrongKind {
            expected: format!("{api_version} {kind}"),
            found: format!("{} {}", types.api_version, types.kind),
        });
    }
    Ok(())
}

/// Ensure the name and namespace used to derive child objects are present.
pub fn validate_identity(cluster: &mut ValkeyCluster, fallback_namespace: &str) -> Result<()> {
    if cluster.metadata.name.as_deref().unwrap_or_default().is_empty() {
        return Err(Error::MissingField("metadata.name".to_string()));
    }

    let has_namespace = cluster
        .metadata
        .namespace
        .as_deref()
        .is_some_and(|ns| !ns.is_empty());
    if !has_namespace {
        if fallback_namespace.is_empty() {
            return Err(Error::MissingField("metadata.namespace".to_string()));
        }
        cluster.metadata.namespace = Some(fallback_namespace.to_string());
    }

    Ok(())
}

/// Serialize a generated Deployment in the requested format.
pub fn render(deployment: &Deployment, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(deployment)?),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(deployment)?),
    }
}
