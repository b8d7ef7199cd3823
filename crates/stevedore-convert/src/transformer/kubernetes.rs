//! Kubernetes transformer
//!
//! Generates, per compose service:
//! - the workload controllers requested by the options
//! - a `Service` when the service publishes ports
//! - one `PersistentVolumeClaim` per volume when volumes map to claims
//!
//! The building blocks are public so the OpenShift transformer can reuse
//! them.

use k8s_openapi::api::apps::v1::{
    DaemonSet, DaemonSetSpec, Deployment, DeploymentSpec, DeploymentStrategy,
};
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, ContainerPort, EmptyDirVolumeSource, EnvVar,
    HostPathVolumeSource, PersistentVolumeClaim, PersistentVolumeClaimSpec,
    PersistentVolumeClaimVolumeSource, PodSpec, PodTemplateSpec, ReplicationController,
    ReplicationControllerSpec, Service, ServicePort, ServiceSpec, Volume, VolumeMount,
    VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use phf::phf_set;
use std::collections::BTreeMap;
use stevedore_core::{
    ComposeObject, ControllerKind, ConvertError, ConvertOptions, Result, ServiceConfig,
};
use tracing::{debug, warn};

use super::{ResourceObject, Transformer};

/// Volume types accepted by `--volumes`
pub static VALID_VOLUME_TYPES: phf::Set<&'static str> = phf_set! {
    "emptyDir",
    "hostPath",
    "configMap",
    "persistentVolumeClaim",
};

/// Label tying every generated object to its compose service
pub const SERVICE_LABEL: &str = "io.stevedore.service";

/// Storage requested by generated claims
const DEFAULT_CLAIM_SIZE: &str = "100Mi";

/// Whether `volume_type` is accepted by `--volumes`
pub fn is_valid_volume_type(volume_type: &str) -> bool {
    VALID_VOLUME_TYPES.contains(volume_type)
}

/// Turn a compose service name into a valid Kubernetes object name
pub fn normalize_name(name: &str) -> String {
    let normalized: String = name
        .to_ascii_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect();
    normalized.trim_matches('-').to_string()
}

/// Name of the pod volume (and claim) backing a service's `index`th mount
pub fn volume_name(service: &str, index: usize) -> String {
    format!("{}-claim{}", service, index)
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}

/// The Kubernetes conversion strategy
#[derive(Debug, Clone, Default)]
pub struct Kubernetes;

impl Kubernetes {
    pub fn new() -> Self {
        Self
    }

    /// Labels selecting the pods of a service
    pub fn selector_labels(&self, name: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(SERVICE_LABEL.to_string(), name.to_string())])
    }

    /// Metadata shared by every object generated for a service
    ///
    /// Compose labels become annotations; the selector label is the only
    /// label.
    pub fn object_meta(&self, service: &ServiceConfig, name: &str) -> ObjectMeta {
        let annotations: BTreeMap<String, String> = service
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(self.selector_labels(&normalize_name(&service.name))),
            annotations: if annotations.is_empty() {
                None
            } else {
                Some(annotations)
            },
            ..Default::default()
        }
    }

    /// Replica count: the service's own `deploy.replicas`, else `--replicas`
    pub fn replicas(&self, service: &ServiceConfig, opt: &ConvertOptions) -> Result<i32> {
        match service.replicas {
            Some(replicas) => i32::try_from(replicas).map_err(|_| ConvertError::InvalidService {
                service: service.name.clone(),
                message: format!("replica count {} is out of range", replicas),
            }),
            None => Ok(opt.replicas),
        }
    }

    /// Pod template running the service's single container
    pub fn pod_template(
        &self,
        service: &ServiceConfig,
        opt: &ConvertOptions,
    ) -> Result<PodTemplateSpec> {
        let name = normalize_name(&service.name);

        if let Some(restart) = service.restart.as_deref()
            && matches!(restart, "no" | "on-failure")
        {
            warn!(
                "Service '{}' has restart policy '{}'; generated controllers always restart pods",
                service.name, restart
            );
        }

        let mut volumes = Vec::new();
        let mut mounts = Vec::new();
        for (index, mount) in service.volumes.iter().enumerate() {
            let volume = volume_name(&name, index);
            volumes.push(self.pod_volume(&volume, mount, &opt.volumes)?);
            mounts.push(VolumeMount {
                name: volume,
                mount_path: mount.target.clone(),
                read_only: mount.read_only.then_some(true),
                ..Default::default()
            });
        }

        let env = service
            .environment
            .iter()
            .map(|(key, value)| EnvVar {
                name: key.clone(),
                value: Some(value.clone()),
                ..Default::default()
            })
            .collect();

        let ports = service
            .ports
            .iter()
            .map(|port| ContainerPort {
                container_port: i32::from(port.container_port),
                protocol: Some(port.protocol.as_str().to_string()),
                ..Default::default()
            })
            .collect();

        let container = Container {
            name: name.clone(),
            image: Some(service.image_or_default()),
            command: non_empty(service.command.clone()),
            args: non_empty(service.args.clone()),
            env: non_empty(env),
            ports: non_empty(ports),
            volume_mounts: non_empty(mounts),
            ..Default::default()
        };

        Ok(PodTemplateSpec {
            metadata: Some(ObjectMeta {
                labels: Some(self.selector_labels(&name)),
                ..Default::default()
            }),
            spec: Some(PodSpec {
                containers: vec![container],
                volumes: non_empty(volumes),
                ..Default::default()
            }),
        })
    }

    fn pod_volume(
        &self,
        name: &str,
        mount: &stevedore_core::VolumeMount,
        volume_type: &str,
    ) -> Result<Volume> {
        let mut volume = Volume {
            name: name.to_string(),
            ..Default::default()
        };

        match volume_type {
            "emptyDir" => volume.empty_dir = Some(EmptyDirVolumeSource::default()),
            "hostPath" => {
                let path = match mount.source.as_deref() {
                    Some(source) if mount.is_host_path() => source.to_string(),
                    _ => mount.target.clone(),
                };
                volume.host_path = Some(HostPathVolumeSource {
                    path,
                    ..Default::default()
                });
            }
            "configMap" => {
                volume.config_map = Some(ConfigMapVolumeSource {
                    name: name.to_string(),
                    ..Default::default()
                });
            }
            "persistentVolumeClaim" => {
                if mount.is_host_path() {
                    warn!(
                        "Volume '{}' is a host path; it is mapped to claim '{}'",
                        mount.source.as_deref().unwrap_or_default(),
                        name
                    );
                }
                volume.persistent_volume_claim = Some(PersistentVolumeClaimVolumeSource {
                    claim_name: name.to_string(),
                    read_only: mount.read_only.then_some(true),
                });
            }
            other => {
                return Err(ConvertError::InvalidVolumeType {
                    given: other.to_string(),
                    valid: VALID_VOLUME_TYPES.iter().map(|v| v.to_string()).collect(),
                });
            }
        }

        Ok(volume)
    }

    /// Claims backing the service's volumes, when volumes map to claims
    pub fn init_claims(
        &self,
        service: &ServiceConfig,
        opt: &ConvertOptions,
    ) -> Vec<PersistentVolumeClaim> {
        if opt.volumes != "persistentVolumeClaim" {
            return Vec::new();
        }

        let name = normalize_name(&service.name);
        service
            .volumes
            .iter()
            .enumerate()
            .map(|(index, mount)| {
                let access_mode = if mount.read_only {
                    "ReadOnlyMany"
                } else {
                    "ReadWriteOnce"
                };
                PersistentVolumeClaim {
                    metadata: self.object_meta(service, &volume_name(&name, index)),
                    spec: Some(PersistentVolumeClaimSpec {
                        access_modes: Some(vec![access_mode.to_string()]),
                        resources: Some(VolumeResourceRequirements {
                            requests: Some(BTreeMap::from([(
                                "storage".to_string(),
                                Quantity(DEFAULT_CLAIM_SIZE.to_string()),
                            )])),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }
            })
            .collect()
    }

    /// Service exposing the published ports, if any
    pub fn init_service(&self, service: &ServiceConfig) -> Option<Service> {
        if service.ports.is_empty() {
            return None;
        }

        let name = normalize_name(&service.name);
        let ports = service
            .ports
            .iter()
            .map(|port| ServicePort {
                name: Some(format!(
                    "{}-{}",
                    port.protocol.as_str().to_ascii_lowercase(),
                    port.service_port()
                )),
                port: i32::from(port.service_port()),
                target_port: Some(IntOrString::Int(i32::from(port.container_port))),
                protocol: Some(port.protocol.as_str().to_string()),
                ..Default::default()
            })
            .collect();

        Some(Service {
            metadata: self.object_meta(service, &name),
            spec: Some(ServiceSpec {
                selector: Some(self.selector_labels(&name)),
                ports: Some(ports),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    /// Service and claims, the objects every provider generates
    pub fn service_objects(
        &self,
        service: &ServiceConfig,
        opt: &ConvertOptions,
    ) -> Vec<ResourceObject> {
        let mut objects = Vec::new();
        if let Some(svc) = self.init_service(service) {
            objects.push(ResourceObject::Service(Box::new(svc)));
        }
        objects.extend(
            self.init_claims(service, opt)
                .into_iter()
                .map(|claim| ResourceObject::PersistentVolumeClaim(Box::new(claim))),
        );
        objects
    }

    /// Kubernetes workload controllers requested by the options
    pub fn init_controllers(
        &self,
        service: &ServiceConfig,
        opt: &ConvertOptions,
        template: &PodTemplateSpec,
    ) -> Result<Vec<ResourceObject>> {
        let name = normalize_name(&service.name);
        let meta = self.object_meta(service, &name);
        let selector = LabelSelector {
            match_labels: Some(self.selector_labels(&name)),
            ..Default::default()
        };
        let replicas = self.replicas(service, opt)?;
        let mut objects = Vec::new();

        if opt.wants_controller(ControllerKind::Deployment) {
            // Claims are ReadWriteOnce: old and new pods can't share them
            let strategy = self.uses_claims(service, opt).then(|| DeploymentStrategy {
                type_: Some("Recreate".to_string()),
                ..Default::default()
            });
            objects.push(ResourceObject::Deployment(Box::new(Deployment {
                metadata: meta.clone(),
                spec: Some(DeploymentSpec {
                    replicas: Some(replicas),
                    selector: selector.clone(),
                    strategy,
                    template: template.clone(),
                    ..Default::default()
                }),
                ..Default::default()
            })));
        }

        if opt.wants_controller(ControllerKind::DaemonSet) {
            objects.push(ResourceObject::DaemonSet(Box::new(DaemonSet {
                metadata: meta.clone(),
                spec: Some(DaemonSetSpec {
                    selector: selector.clone(),
                    template: template.clone(),
                    ..Default::default()
                }),
                ..Default::default()
            })));
        }

        if opt.wants_controller(ControllerKind::ReplicationController) {
            objects.push(ResourceObject::ReplicationController(Box::new(
                ReplicationController {
                    metadata: meta,
                    spec: Some(ReplicationControllerSpec {
                        replicas: Some(replicas),
                        selector: Some(self.selector_labels(&name)),
                        template: Some(template.clone()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )));
        }

        Ok(objects)
    }

    /// Whether the service's pods mount persistent volume claims
    pub fn uses_claims(&self, service: &ServiceConfig, opt: &ConvertOptions) -> bool {
        !service.volumes.is_empty() && opt.volumes == "persistentVolumeClaim"
    }
}

impl Transformer for Kubernetes {
    fn transform(
        &self,
        object: &ComposeObject,
        opt: &ConvertOptions,
    ) -> Result<Vec<ResourceObject>> {
        let mut objects = Vec::new();

        for service in object.services.values() {
            debug!(service = %service.name, "Transforming service for Kubernetes");
            let template = self.pod_template(service, opt)?;
            objects.extend(self.init_controllers(service, opt, &template)?);
            objects.extend(self.service_objects(service, opt));
        }

        debug!(count = objects.len(), "Kubernetes transformation complete");
        Ok(objects)
    }
}
