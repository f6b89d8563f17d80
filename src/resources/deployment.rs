//! Deployment generation for Valkey clusters.
//!
//! Builds the single-replica Deployment a ValkeyCluster converges toward:
//! - `valkey-server` container started from the mounted `valkey.conf`
//! - Exec liveness/readiness probes backed by scripts from the ConfigMap
//! - Optional `metrics-exporter` sidecar with HTTP probes
//! - `scripts` and `valkey-conf` volumes sourced from the cluster ConfigMap
//!
//! Generation is pure: nothing here talks to the API server or logs.

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, ContainerPort, ExecAction, HTTPGetAction, PodSpec,
    PodTemplateSpec, Probe, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;
use std::collections::BTreeMap;

use crate::config::{
    DEFAULT_CLUSTER_BUS_PORT, DEFAULT_EXPORTER_PORT, DEFAULT_PORT, SynthesisDefaults,
};
use crate::crd::{ExporterSpec, ValkeyCluster};
use crate::resources::common::{config_map_name, generate_name_prefix, standard_labels};

/// Name of the Valkey server container
pub const VALKEY_CONTAINER: &str = "valkey-server";
/// Name of the metrics exporter sidecar
pub const EXPORTER_CONTAINER: &str = "metrics-exporter";
/// Volume carrying the probe and operational scripts
pub const SCRIPTS_VOLUME: &str = "scripts";
/// Volume carrying `valkey.conf`
pub const CONFIG_VOLUME: &str = "valkey-conf";

/// Mount point of the scripts volume
const SCRIPTS_MOUNT_PATH: &str = "/scripts";
/// Mount point of the config volume
const CONFIG_MOUNT_PATH: &str = "/config";
/// Scripts must be executable by the probe shell
const SCRIPTS_DEFAULT_MODE: i32 = 0o755;
/// This workload kind always runs exactly one pod
const REPLICAS: i32 = 1;

/// Generate a Deployment for a ValkeyCluster.
///
/// The label set is derived once and reused for object labels, selector
/// and pod template, so the three can never drift apart.
pub fn generate_deployment(resource: &ValkeyCluster, defaults: &SynthesisDefaults) -> Deployment {
    let labels = standard_labels(resource);

    Deployment {
        metadata: ObjectMeta {
            generate_name: Some(generate_name_prefix(resource)),
            namespace: resource.namespace(),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(REPLICAS),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: generate_pod_template(resource, defaults, labels),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Generate the pod template: server container first, exporter second.
pub fn generate_pod_template(
    resource: &ValkeyCluster,
    defaults: &SynthesisDefaults,
    labels: BTreeMap<String, String>,
) -> PodTemplateSpec {
    let mut containers = vec![generate_valkey_container(resource, defaults)];
    if let Some(exporter) = generate_exporter_container(&resource.spec.exporter, defaults) {
        containers.push(exporter);
    }

    PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some(labels),
            ..Default::default()
        }),
        spec: Some(PodSpec {
            containers,
            volumes: Some(generate_volumes(resource)),
            ..Default::default()
        }),
    }
}

/// Generate the main Valkey container.
pub fn generate_valkey_container(
    resource: &ValkeyCluster,
    defaults: &SynthesisDefaults,
) -> Container {
    Container {
        name: VALKEY_CONTAINER.to_string(),
        image: Some(defaults.resolve_image(&resource.spec.image).to_string()),
        command: Some(vec![
            "valkey-server".to_string(),
            format!("{CONFIG_MOUNT_PATH}/valkey.conf"),
        ]),
        ports: Some(vec![
            ContainerPort {
                container_port: DEFAULT_PORT,
                name: Some("client".to_string()),
                ..Default::default()
            },
            ContainerPort {
                container_port: DEFAULT_CLUSTER_BUS_PORT,
                name: Some("cluster-bus".to_string()),
                ..Default::default()
            },
        ]),
        liveness_probe: Some(generate_liveness_probe()),
        readiness_probe: Some(generate_readiness_probe()),
        volume_mounts: Some(generate_volume_mounts()),
        ..Default::default()
    }
}

/// Probe running one of the scripts from the scripts volume.
fn script_probe(script: &str) -> Option<ExecAction> {
    Some(ExecAction {
        command: Some(vec![
            "/bin/bash".to_string(),
            "-c".to_string(),
            format!("{SCRIPTS_MOUNT_PATH}/{script}"),
        ]),
    })
}

/// Generate liveness probe.
///
/// Gates restarts, so it gets a longer timeout than readiness.
fn generate_liveness_probe() -> Probe {
    Probe {
        exec: script_probe("liveness-check.sh"),
        initial_delay_seconds: Some(5),
        period_seconds: Some(5),
        failure_threshold: Some(5),
        timeout_seconds: Some(5),
        success_threshold: Some(1),
        ..Default::default()
    }
}

/// Generate readiness probe.
fn generate_readiness_probe() -> Probe {
    Probe {
        exec: script_probe("readiness-check.sh"),
        initial_delay_seconds: Some(5),
        period_seconds: Some(5),
        failure_threshold: Some(5),
        timeout_seconds: Some(2),
        success_threshold: Some(1),
        ..Default::default()
    }
}

/// Generate volume mounts for the Valkey container.
fn generate_volume_mounts() -> Vec<VolumeMount> {
    vec![
        VolumeMount {
            name: SCRIPTS_VOLUME.to_string(),
            mount_path: SCRIPTS_MOUNT_PATH.to_string(),
            ..Default::default()
        },
        VolumeMount {
            name: CONFIG_VOLUME.to_string(),
            mount_path: CONFIG_MOUNT_PATH.to_string(),
            read_only: Some(true),
            ..Default::default()
        },
    ]
}

/// Generate the metrics exporter sidecar, or `None` when it is disabled.
///
/// The exporter scrapes the server over loopback. Its resources are copied
/// without defaulting.
pub fn generate_exporter_container(
    exporter: &ExporterSpec,
    defaults: &SynthesisDefaults,
) -> Option<Container> {
    if !exporter.enabled {
        return None;
    }

    Some(Container {
        name: EXPORTER_CONTAINER.to_string(),
        image: Some(defaults.resolve_exporter_image(&exporter.image).to_string()),
        args: Some(vec![format!("--redis.addr=localhost:{DEFAULT_PORT}")]),
        ports: Some(vec![ContainerPort {
            container_port: DEFAULT_EXPORTER_PORT,
            name: Some("metrics".to_string()),
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]),
        liveness_probe: Some(Probe {
            http_get: exporter_http_get("/health"),
            initial_delay_seconds: Some(10),
            period_seconds: Some(10),
            timeout_seconds: Some(3),
            ..Default::default()
        }),
        readiness_probe: Some(Probe {
            http_get: exporter_http_get("/ready"),
            initial_delay_seconds: Some(5),
            period_seconds: Some(10),
            timeout_seconds: Some(3),
            ..Default::default()
        }),
        resources: exporter.resources.clone(),
        ..Default::default()
    })
}

fn exporter_http_get(path: &str) -> Option<HTTPGetAction> {
    Some(HTTPGetAction {
        path: Some(path.to_string()),
        port: IntOrString::Int(DEFAULT_EXPORTER_PORT),
        ..Default::default()
    })
}

/// Generate volumes for the pod.
///
/// Both volumes project the cluster's ConfigMap; only the scripts volume
/// gets executable file modes.
pub fn generate_volumes(resource: &ValkeyCluster) -> Vec<Volume> {
    let config_map = config_map_name(resource);

    vec![
        Volume {
            name: SCRIPTS_VOLUME.to_string(),
            config_map: Some(ConfigMapVolumeSource {
                name: config_map.clone(),
                default_mode: Some(SCRIPTS_DEFAULT_MODE),
                ..Default::default()
            }),
            ..Default::default()
        },
        Volume {
            name: CONFIG_VOLUME.to_string(),
            config_map: Some(ConfigMapVolumeSource {
                name: config_map,
                ..Default::default()
            }),
            ..Default::default()
        },
    ]
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::get_unwrap
)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_EXPORTER_IMAGE, DEFAULT_IMAGE};
    use crate::crd::ValkeyClusterSpec;
    use k8s_openapi::api::core::v1::ResourceRequirements;
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

    fn test_resource(name: &str, namespace: &str, spec: ValkeyClusterSpec) -> ValkeyCluster {
        ValkeyCluster {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                uid: Some("test-uid".to_string()),
                ..Default::default()
            },
            spec,
        }
    }

    fn exporter_resources() -> ResourceRequirements {
        ResourceRequirements {
            limits: Some(BTreeMap::from([(
                "memory".to_string(),
                Quantity("128Mi".to_string()),
            )])),
            requests: Some(BTreeMap::from([(
                "cpu".to_string(),
                Quantity("50m".to_string()),
            )])),
            ..Default::default()
        }
    }

    fn containers(deployment: &Deployment) -> Vec<Container> {
        deployment
            .spec
            .as_ref()
            .unwrap()
            .template
            .spec
            .as_ref()
            .unwrap()
            .containers
            .clone()
    }

    #[test]
    fn test_generate_deployment_defaults() {
        let resource = test_resource("cache1", "default", ValkeyClusterSpec::default());
        let deployment = generate_deployment(&resource, &SynthesisDefaults::default());

        assert_eq!(deployment.metadata.generate_name, Some("cache1-".to_string()));
        assert_eq!(deployment.metadata.name, None);
        assert_eq!(deployment.metadata.namespace, Some("default".to_string()));

        let spec = deployment.spec.as_ref().unwrap();
        assert_eq!(spec.replicas, Some(1));

        let containers = containers(&deployment);
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].name, "valkey-server");
        assert_eq!(containers[0].image, Some(DEFAULT_IMAGE.to_string()));

        let volumes = spec.template.spec.as_ref().unwrap().volumes.clone().unwrap();
        assert_eq!(volumes.len(), 2);
    }

    #[test]
    fn test_generate_deployment_with_exporter() {
        let spec = ValkeyClusterSpec {
            image: "custom:v2".to_string(),
            exporter: ExporterSpec {
                enabled: true,
                image: "exp:v1".to_string(),
                resources: Some(exporter_resources()),
            },
        };
        let resource = test_resource("cache1", "ns", spec);
        let deployment = generate_deployment(&resource, &SynthesisDefaults::default());

        let containers = containers(&deployment);
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0].image, Some("custom:v2".to_string()));
        assert_eq!(containers[1].name, "metrics-exporter");
        assert_eq!(containers[1].image, Some("exp:v1".to_string()));
        assert_eq!(containers[1].resources, Some(exporter_resources()));

        let ports = containers[1].ports.clone().unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].container_port, 9121);
        assert_eq!(ports[0].name, Some("metrics".to_string()));
        assert_eq!(ports[0].protocol, Some("TCP".to_string()));
    }

    #[test]
    fn test_labels_match_selector_and_template() {
        let resource = test_resource("cache1", "default", ValkeyClusterSpec::default());
        let deployment = generate_deployment(&resource, &SynthesisDefaults::default());

        let labels = deployment.metadata.labels.clone().unwrap();
        let spec = deployment.spec.unwrap();
        assert_eq!(spec.selector.match_labels, Some(labels.clone()));
        assert_eq!(spec.template.metadata.unwrap().labels, Some(labels));
    }

    #[test]
    fn test_valkey_container() {
        let resource = test_resource("cache1", "default", ValkeyClusterSpec::default());
        let container = generate_valkey_container(&resource, &SynthesisDefaults::default());

        assert_eq!(
            container.command,
            Some(vec![
                "valkey-server".to_string(),
                "/config/valkey.conf".to_string()
            ])
        );

        let ports = container.ports.unwrap();
        assert_eq!(ports[0].name, Some("client".to_string()));
        assert_eq!(ports[0].container_port, 6379);
        assert_eq!(ports[1].name, Some("cluster-bus".to_string()));
        assert_eq!(ports[1].container_port, 16379);

        let mounts = container.volume_mounts.unwrap();
        assert_eq!(mounts[0].name, "scripts");
        assert_eq!(mounts[0].mount_path, "/scripts");
        assert_eq!(mounts[0].read_only, None);
        assert_eq!(mounts[1].name, "valkey-conf");
        assert_eq!(mounts[1].mount_path, "/config");
        assert_eq!(mounts[1].read_only, Some(true));
    }

    fn exec_script(script: &str) -> Option<ExecAction> {
        Some(ExecAction {
            command: Some(vec![
                "/bin/bash".to_string(),
                "-c".to_string(),
                script.to_string(),
            ]),
        })
    }

    #[test]
    fn test_valkey_health_checks() {
        assert_eq!(
            generate_liveness_probe(),
            Probe {
                exec: exec_script("/scripts/liveness-check.sh"),
                initial_delay_seconds: Some(5),
                period_seconds: Some(5),
                failure_threshold: Some(5),
                timeout_seconds: Some(5),
                success_threshold: Some(1),
                ..Default::default()
            }
        );
        assert_eq!(
            generate_readiness_probe(),
            Probe {
                exec: exec_script("/scripts/readiness-check.sh"),
                initial_delay_seconds: Some(5),
                period_seconds: Some(5),
                failure_threshold: Some(5),
                timeout_seconds: Some(2),
                success_threshold: Some(1),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_valkey_container_wires_health_checks() {
        let resource = test_resource("cache1", "default", ValkeyClusterSpec::default());
        let container = generate_valkey_container(&resource, &SynthesisDefaults::default());

        assert_eq!(container.liveness_probe, Some(generate_liveness_probe()));
        assert_eq!(container.readiness_probe, Some(generate_readiness_probe()));
        // Liveness tolerates slower responses than readiness
        assert!(
            container.liveness_probe.unwrap().timeout_seconds
                > container.readiness_probe.unwrap().timeout_seconds
        );
    }

    #[test]
    fn test_exporter_disabled() {
        let exporter = ExporterSpec {
            enabled: false,
            image: "exp:v1".to_string(),
            resources: Some(exporter_resources()),
        };
        assert!(generate_exporter_container(&exporter, &SynthesisDefaults::default()).is_none());
    }

    #[test]
    fn test_exporter_defaults() {
        let exporter = ExporterSpec {
            enabled: true,
            ..Default::default()
        };
        let container = generate_exporter_container(&exporter, &SynthesisDefaults::default())
            .expect("exporter enabled");

        assert_eq!(container.image, Some(DEFAULT_EXPORTER_IMAGE.to_string()));
        assert_eq!(
            container.args,
            Some(vec!["--redis.addr=localhost:6379".to_string()])
        );
        // Absent resources stay absent rather than becoming an empty struct
        assert_eq!(container.resources, None);
    }

    #[test]
    fn test_exporter_health_checks() {
        let exporter = ExporterSpec {
            enabled: true,
            ..Default::default()
        };
        let container =
            generate_exporter_container(&exporter, &SynthesisDefaults::default()).unwrap();

        assert_eq!(
            container.liveness_probe,
            Some(Probe {
                http_get: Some(HTTPGetAction {
                    path: Some("/health".to_string()),
                    port: IntOrString::Int(9121),
                    ..Default::default()
                }),
                initial_delay_seconds: Some(10),
                period_seconds: Some(10),
                timeout_seconds: Some(3),
                ..Default::default()
            })
        );
        assert_eq!(
            container.readiness_probe,
            Some(Probe {
                http_get: Some(HTTPGetAction {
                    path: Some("/ready".to_string()),
                    port: IntOrString::Int(9121),
                    ..Default::default()
                }),
                initial_delay_seconds: Some(5),
                period_seconds: Some(10),
                timeout_seconds: Some(3),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_volumes() {
        let resource = test_resource("cache1", "default", ValkeyClusterSpec::default());
        let volumes = generate_volumes(&resource);

        assert_eq!(volumes.len(), 2);
        assert_eq!(volumes[0].name, "scripts");
        let scripts = volumes[0].config_map.as_ref().unwrap();
        assert_eq!(scripts.name, "cache1");
        assert_eq!(scripts.default_mode, Some(0o755));

        assert_eq!(volumes[1].name, "valkey-conf");
        let conf = volumes[1].config_map.as_ref().unwrap();
        assert_eq!(conf.name, "cache1");
        assert_eq!(conf.default_mode, None);
    }

    #[test]
    fn test_injected_defaults() {
        let defaults = SynthesisDefaults::default()
            .with_image("mirror.local/valkey:9")
            .with_exporter_image("mirror.local/exporter:1");
        let spec = ValkeyClusterSpec {
            exporter: ExporterSpec {
                enabled: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let resource = test_resource("cache1", "default", spec);
        let containers = containers(&generate_deployment(&resource, &defaults));

        assert_eq!(containers[0].image, Some("mirror.local/valkey:9".to_string()));
        assert_eq!(
            containers[1].image,
            Some("mirror.local/exporter:1".to_string())
        );
    }

    #[test]
    fn test_generation_is_deterministic() {
        let resource = test_resource("cache1", "default", ValkeyClusterSpec::default());
        let defaults = SynthesisDefaults::default();
        assert_eq!(
            generate_deployment(&resource, &defaults),
            generate_deployment(&resource, &defaults)
        );
    }
}
