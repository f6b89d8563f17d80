// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Property-based tests for valkey-operator.
//!
//! Uses proptest to generate random clusters and verify the invariants of
//! Deployment generation.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use proptest::prelude::*;

use valkey_operator::config::{DEFAULT_EXPORTER_PORT, DEFAULT_IMAGE};
use valkey_operator::crd::{ExporterSpec, ValkeyCluster, ValkeyClusterSpec};
use valkey_operator::{SynthesisDefaults, generate_deployment};

/// Strategy for generating DNS-1123 style names.
fn dns_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,20}[a-z0-9]"
}

/// Strategy for generating image references, including the empty override.
fn image_ref() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[a-z]{1,10}/[a-z]{1,10}:v[0-9]{1,2}",
    ]
}

/// Strategy for generating optional resource requirements.
fn resources() -> impl Strategy<Value = Option<ResourceRequirements>> {
    proptest::option::of((1..2000u32, 1..4096u32).prop_map(|(cpu, mem)| {
        ResourceRequirements {
            requests: Some(BTreeMap::from([
                ("cpu".to_string(), Quantity(format!("{cpu}m"))),
                ("memory".to_string(), Quantity(format!("{mem}Mi"))),
            ])),
            ..Default::default()
        }
    }))
}

/// Strategy for generating arbitrary ValkeyClusters.
fn any_cluster() -> impl Strategy<Value = ValkeyCluster> {
    (
        dns_name(),
        dns_name(),
        image_ref(),
        any::<bool>(),
        image_ref(),
        resources(),
    )
        .prop_map(|(name, namespace, image, enabled, exporter_image, resources)| {
            ValkeyCluster {
                metadata: ObjectMeta {
                    name: Some(name),
                    namespace: Some(namespace),
                    ..Default::default()
                },
                spec: ValkeyClusterSpec {
                    image,
                    exporter: ExporterSpec {
                        enabled,
                        image: exporter_image,
                        resources,
                    },
                },
            }
        })
}

fn containers(deployment: &Deployment) -> &[Container] {
    &deployment
        .spec
        .as_ref()
        .unwrap()
        .template
        .spec
        .as_ref()
        .unwrap()
        .containers
}

proptest! {
    /// Property: Generating twice from the same cluster yields identical output.
    #[test]
    fn test_generation_deterministic(cluster in any_cluster()) {
        let defaults = SynthesisDefaults::default();
        prop_assert_eq!(
            generate_deployment(&cluster, &defaults),
            generate_deployment(&cluster, &defaults)
        );
    }

    /// Property: Empty image selects the default, anything else is used as-is.
    #[test]
    fn test_image_default_substitution(cluster in any_cluster()) {
        let deployment = generate_deployment(&cluster, &SynthesisDefaults::default());
        let image = containers(&deployment)[0].image.clone().unwrap();
        if cluster.spec.image.is_empty() {
            prop_assert_eq!(image, DEFAULT_IMAGE);
        } else {
            prop_assert_eq!(image, cluster.spec.image.clone());
        }
    }

    /// Property: The exporter appears exactly when enabled, always second.
    #[test]
    fn test_exporter_gating(cluster in any_cluster()) {
        let deployment = generate_deployment(&cluster, &SynthesisDefaults::default());
        let containers = containers(&deployment);

        prop_assert_eq!(containers[0].name.as_str(), "valkey-server");
        if cluster.spec.exporter.enabled {
            prop_assert_eq!(containers.len(), 2);
            let exporter = &containers[1];
            prop_assert_eq!(exporter.name.as_str(), "metrics-exporter");
            let ports = exporter.ports.as_ref().unwrap();
            prop_assert_eq!(ports[0].container_port, DEFAULT_EXPORTER_PORT);
            prop_assert_eq!(&exporter.resources, &cluster.spec.exporter.resources);
        } else {
            prop_assert_eq!(containers.len(), 1);
            let server = &containers[0];
            prop_assert!(server.resources.is_none());
            prop_assert!(
                server
                    .ports
                    .iter()
                    .flatten()
                    .all(|p| p.name.as_deref() != Some("metrics"))
            );
            prop_assert!(server.liveness_probe.as_ref().unwrap().http_get.is_none());
            prop_assert!(server.readiness_probe.as_ref().unwrap().http_get.is_none());
        }
    }

    /// Property: Object labels, selector and pod template labels are identical.
    #[test]
    fn test_label_triple_equality(cluster in any_cluster()) {
        let deployment = generate_deployment(&cluster, &SynthesisDefaults::default());
        let labels = deployment.metadata.labels.clone().unwrap();
        let spec = deployment.spec.unwrap();

        prop_assert_eq!(spec.selector.match_labels.as_ref(), Some(&labels));
        let template_labels = spec.template.metadata.unwrap().labels;
        prop_assert_eq!(template_labels.as_ref(), Some(&labels));
    }

    /// Property: Exactly the scripts and valkey-conf volumes, both from the cluster ConfigMap.
    #[test]
    fn test_volume_invariants(cluster in any_cluster()) {
        let deployment = generate_deployment(&cluster, &SynthesisDefaults::default());
        let volumes = deployment.spec.unwrap().template.spec.unwrap().volumes.unwrap();
        let name = cluster.metadata.name.clone().unwrap();

        prop_assert_eq!(volumes.len(), 2);
        prop_assert_eq!(volumes[0].name.as_str(), "scripts");
        prop_assert_eq!(volumes[1].name.as_str(), "valkey-conf");

        let scripts = volumes[0].config_map.as_ref().unwrap();
        let conf = volumes[1].config_map.as_ref().unwrap();
        prop_assert_eq!(&scripts.name, &name);
        prop_assert_eq!(&conf.name, &name);
        prop_assert_eq!(scripts.default_mode, Some(0o755));
        prop_assert_eq!(conf.default_mode, None);
    }

    /// Property: The workload always runs one replica under a generated name.
    #[test]
    fn test_replicas_and_identity(cluster in any_cluster()) {
        let deployment = generate_deployment(&cluster, &SynthesisDefaults::default());
        let name = cluster.metadata.name.clone().unwrap();

        prop_assert_eq!(deployment.spec.as_ref().unwrap().replicas, Some(1));
        prop_assert_eq!(deployment.metadata.generate_name, Some(format!("{name}-")));
        prop_assert_eq!(deployment.metadata.name, None);
        prop_assert_eq!(deployment.metadata.namespace, cluster.metadata.namespace.clone());
    }
}
