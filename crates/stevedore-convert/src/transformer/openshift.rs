//! OpenShift transformer
//!
//! OpenShift accepts every Kubernetes object, so this strategy owns a
//! [`Kubernetes`] transformer and delegates services, claims and pod
//! templates to it. On top it generates `DeploymentConfig`, `ImageStream`
//! and, for services built from source, `BuildConfig` objects.
//!
//! `k8s-openapi` has no OpenShift types; the few needed here are plain
//! serde structs reusing the Kubernetes metadata types.

use k8s_openapi::api::core::v1::{ObjectReference, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Serialize;
use std::collections::BTreeMap;
use stevedore_core::{ComposeObject, ControllerKind, ConvertOptions, Result, ServiceConfig};
use tracing::{debug, warn};

use super::kubernetes::{Kubernetes, normalize_name};
use super::{ResourceObject, Transformer};

/// Branch used by generated builds when `--build-branch` is not given
pub const DEFAULT_BUILD_BRANCH: &str = "master";

/// `apps.openshift.io/v1` DeploymentConfig
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: DeploymentConfigSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfigSpec {
    pub replicas: i32,
    pub selector: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<DeploymentConfigStrategy>,
    pub template: PodTemplateSpec,
    pub triggers: Vec<DeploymentTrigger>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentConfigStrategy {
    #[serde(rename = "type")]
    pub type_: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTrigger {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_change_params: Option<ImageChangeParams>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageChangeParams {
    pub automatic: bool,
    pub container_names: Vec<String>,
    pub from: ObjectReference,
}

/// `image.openshift.io/v1` ImageStream
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStream {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ImageStreamSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageStreamSpec {
    pub tags: Vec<TagReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagReference {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<ObjectReference>,
}

/// `build.openshift.io/v1` BuildConfig
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: BuildConfigSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfigSpec {
    pub run_policy: String,
    pub triggers: Vec<BuildTrigger>,
    pub source: BuildSource,
    pub strategy: BuildStrategy,
    pub output: BuildOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildTrigger {
    #[serde(rename = "type")]
    pub type_: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSource {
    #[serde(rename = "type")]
    pub type_: String,
    pub git: GitBuildSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GitBuildSource {
    pub uri: String,
    #[serde(rename = "ref")]
    pub ref_: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStrategy {
    #[serde(rename = "type")]
    pub type_: String,
    pub docker_strategy: DockerBuildStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerBuildStrategy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dockerfile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildOutput {
    pub to: ObjectReference,
}

/// Tag part of an image reference, `latest` when absent
pub fn image_tag(image: &str) -> &str {
    if image.contains('@') {
        return "latest";
    }
    let last_segment = image.rsplit('/').next().unwrap_or(image);
    match last_segment.split_once(':') {
        Some((_, tag)) if !tag.is_empty() => tag,
        _ => "latest",
    }
}

fn image_stream_tag(name: &str, tag: &str) -> ObjectReference {
    ObjectReference {
        kind: Some("ImageStreamTag".to_string()),
        name: Some(format!("{}:{}", name, tag)),
        ..Default::default()
    }
}

/// The OpenShift conversion strategy
#[derive(Debug, Clone, Default)]
pub struct OpenShift {
    kubernetes: Kubernetes,
}

impl OpenShift {
    pub fn new(kubernetes: Kubernetes) -> Self {
        Self { kubernetes }
    }

    /// The Kubernetes strategy shared objects are delegated to
    pub fn kubernetes(&self) -> &Kubernetes {
        &self.kubernetes
    }

    fn tag_for(&self, service: &ServiceConfig) -> String {
        match service.image.as_deref() {
            Some(image) => image_tag(image).to_string(),
            None => "latest".to_string(),
        }
    }

    pub fn init_deployment_config(
        &self,
        service: &ServiceConfig,
        opt: &ConvertOptions,
        template: PodTemplateSpec,
    ) -> Result<DeploymentConfig> {
        let name = normalize_name(&service.name);
        let tag = self.tag_for(service);
        let strategy = self
            .kubernetes
            .uses_claims(service, opt)
            .then(|| DeploymentConfigStrategy {
                type_: "Recreate".to_string(),
            });

        Ok(DeploymentConfig {
            api_version: "apps.openshift.io/v1".to_string(),
            kind: "DeploymentConfig".to_string(),
            metadata: self.kubernetes.object_meta(service, &name),
            spec: DeploymentConfigSpec {
                replicas: self.kubernetes.replicas(service, opt)?,
                selector: self.kubernetes.selector_labels(&name),
                strategy,
                template,
                triggers: vec![
                    DeploymentTrigger {
                        type_: "ConfigChange".to_string(),
                        image_change_params: None,
                    },
                    DeploymentTrigger {
                        type_: "ImageChange".to_string(),
                        image_change_params: Some(ImageChangeParams {
                            automatic: true,
                            container_names: vec![name.clone()],
                            from: image_stream_tag(&name, &tag),
                        }),
                    },
                ],
            },
        })
    }

    pub fn init_image_stream(&self, service: &ServiceConfig) -> ImageStream {
        let name = normalize_name(&service.name);
        let tag = self.tag_for(service);

        // Images built in-cluster are pushed to the stream, not imported
        let from = match (&service.image, &service.build) {
            (Some(image), None) => Some(ObjectReference {
                kind: Some("DockerImage".to_string()),
                name: Some(image.clone()),
                ..Default::default()
            }),
            _ => None,
        };

        ImageStream {
            api_version: "image.openshift.io/v1".to_string(),
            kind: "ImageStream".to_string(),
            metadata: self.kubernetes.object_meta(service, &name),
            spec: ImageStreamSpec {
                tags: vec![TagReference { name: tag, from }],
            },
        }
    }

    /// BuildConfig for services built from source, when a repository is known
    pub fn init_build_config(
        &self,
        service: &ServiceConfig,
        opt: &ConvertOptions,
    ) -> Option<BuildConfig> {
        let build = service.build.as_ref()?;
        let Some(repo) = opt.build_repo.as_deref() else {
            warn!(
                "Service '{}' has a build context but no --build-repo was given; skipping BuildConfig",
                service.name
            );
            return None;
        };

        let name = normalize_name(&service.name);
        let context = build.context.to_string_lossy();
        let context_dir = match context.trim_start_matches("./") {
            "" | "." => None,
            dir => Some(dir.to_string()),
        };

        Some(BuildConfig {
            api_version: "build.openshift.io/v1".to_string(),
            kind: "BuildConfig".to_string(),
            metadata: self.kubernetes.object_meta(service, &name),
            spec: BuildConfigSpec {
                run_policy: "Serial".to_string(),
                triggers: vec![BuildTrigger {
                    type_: "ConfigChange".to_string(),
                }],
                source: BuildSource {
                    type_: "Git".to_string(),
                    git: GitBuildSource {
                        uri: repo.to_string(),
                        ref_: opt
                            .build_branch
                            .clone()
                            .unwrap_or_else(|| DEFAULT_BUILD_BRANCH.to_string()),
                    },
                    context_dir,
                },
                strategy: BuildStrategy {
                    type_: "Docker".to_string(),
                    docker_strategy: DockerBuildStrategy {
                        dockerfile_path: build.dockerfile.clone(),
                    },
                },
                output: BuildOutput {
                    to: image_stream_tag(&name, &self.tag_for(service)),
                },
            },
        })
    }
}

impl Transformer for OpenShift {
    fn transform(
        &self,
        object: &ComposeObject,
        opt: &ConvertOptions,
    ) -> Result<Vec<ResourceObject>> {
        let mut objects = Vec::new();

        for service in object.services.values() {
            debug!(service = %service.name, "Transforming service for OpenShift");
            let template = self.kubernetes.pod_template(service, opt)?;
            objects.extend(self.kubernetes.init_controllers(service, opt, &template)?);

            if opt.wants_controller(ControllerKind::DeploymentConfig) {
                let dc = self.init_deployment_config(service, opt, template)?;
                objects.push(ResourceObject::DeploymentConfig(Box::new(dc)));
            }
            objects.push(ResourceObject::ImageStream(Box::new(
                self.init_image_stream(service),
            )));
            if let Some(bc) = self.init_build_config(service, opt) {
                objects.push(ResourceObject::BuildConfig(Box::new(bc)));
            }

            objects.extend(self.kubernetes.service_objects(service, opt));
        }

        debug!(count = objects.len(), "OpenShift transformation complete");
        Ok(objects)
    }
}
