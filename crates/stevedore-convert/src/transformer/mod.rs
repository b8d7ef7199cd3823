//! Transformers map a compose object model onto platform resources
//!
//! Two strategies exist. [`Kubernetes`] generates the core workload,
//! service and storage objects. [`OpenShift`] owns a `Kubernetes` strategy,
//! delegates the shared objects to it and adds the OpenShift-only kinds on
//! top.

pub mod kubernetes;
pub mod openshift;

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, ReplicationController, Service};
use serde::Serialize;
use stevedore_core::{ComposeObject, ConvertOptions, Provider, Result};

pub use kubernetes::{Kubernetes, VALID_VOLUME_TYPES, is_valid_volume_type};
pub use openshift::{BuildConfig, DeploymentConfig, ImageStream, OpenShift};

/// Maps a compose project onto platform resources
pub trait Transformer {
    fn transform(&self, object: &ComposeObject, opt: &ConvertOptions)
    -> Result<Vec<ResourceObject>>;
}

/// A generated platform object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResourceObject {
    Deployment(Box<Deployment>),
    DaemonSet(Box<DaemonSet>),
    ReplicationController(Box<ReplicationController>),
    Service(Box<Service>),
    PersistentVolumeClaim(Box<PersistentVolumeClaim>),
    DeploymentConfig(Box<DeploymentConfig>),
    ImageStream(Box<ImageStream>),
    BuildConfig(Box<BuildConfig>),
}

impl ResourceObject {
    /// Resource kind as written in manifests
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Deployment(_) => "Deployment",
            Self::DaemonSet(_) => "DaemonSet",
            Self::ReplicationController(_) => "ReplicationController",
            Self::Service(_) => "Service",
            Self::PersistentVolumeClaim(_) => "PersistentVolumeClaim",
            Self::DeploymentConfig(_) => "DeploymentConfig",
            Self::ImageStream(_) => "ImageStream",
            Self::BuildConfig(_) => "BuildConfig",
        }
    }

    /// Object name from its metadata
    pub fn name(&self) -> &str {
        let name = match self {
            Self::Deployment(o) => o.metadata.name.as_deref(),
            Self::DaemonSet(o) => o.metadata.name.as_deref(),
            Self::ReplicationController(o) => o.metadata.name.as_deref(),
            Self::Service(o) => o.metadata.name.as_deref(),
            Self::PersistentVolumeClaim(o) => o.metadata.name.as_deref(),
            Self::DeploymentConfig(o) => o.metadata.name.as_deref(),
            Self::ImageStream(o) => o.metadata.name.as_deref(),
            Self::BuildConfig(o) => o.metadata.name.as_deref(),
        };
        name.unwrap_or_default()
    }
}

/// Pick the transformer for the configured provider
pub fn get_transformer(opt: &ConvertOptions) -> Box<dyn Transformer> {
    match opt.provider {
        Provider::Kubernetes => Box::new(Kubernetes::new()),
        Provider::Openshift => Box::new(OpenShift::new(Kubernetes::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stevedore_core::ServiceConfig;

    fn project() -> ComposeObject {
        let mut object = ComposeObject::new();
        let mut web = ServiceConfig::new("web");
        web.image = Some("nginx:1.25".to_string());
        object.insert(web);
        object
    }

    #[test]
    fn test_get_transformer_kubernetes() {
        let opt = ConvertOptions {
            create_deployment: true,
            ..Default::default()
        };
        let objects = get_transformer(&opt).transform(&project(), &opt).unwrap();
        let kinds: Vec<_> = objects.iter().map(ResourceObject::kind).collect();
        assert_eq!(kinds, vec!["Deployment"]);
    }

    #[test]
    fn test_get_transformer_openshift() {
        let opt = ConvertOptions {
            provider: Provider::Openshift,
            create_deployment_config: true,
            ..Default::default()
        };
        let objects = get_transformer(&opt).transform(&project(), &opt).unwrap();
        let kinds: Vec<_> = objects.iter().map(ResourceObject::kind).collect();
        assert_eq!(kinds, vec!["DeploymentConfig", "ImageStream"]);
    }

    #[test]
    fn test_resource_name() {
        let opt = ConvertOptions {
            create_deployment: true,
            ..Default::default()
        };
        let objects = Kubernetes::new().transform(&project(), &opt).unwrap();
        assert_eq!(objects[0].name(), "web");
    }
}
