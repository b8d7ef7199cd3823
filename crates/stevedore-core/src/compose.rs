//! In-memory object model of a compose project
//!
//! The loader turns one or more descriptor files into a [`ComposeObject`];
//! transformers turn it into platform resources. Nothing here knows about
//! YAML or about Kubernetes.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// All services of a compose project, keyed by service name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComposeObject {
    pub services: BTreeMap<String, ServiceConfig>,
    /// Files the model was loaded from, in merge order
    pub source_files: Vec<PathBuf>,
}

impl ComposeObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a service
    pub fn insert(&mut self, service: ServiceConfig) {
        self.services.insert(service.name.clone(), service);
    }

    pub fn get(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }
}

/// A single compose service
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceConfig {
    pub name: String,
    pub image: Option<String>,
    pub build: Option<BuildContext>,
    /// Container entrypoint (compose `entrypoint`)
    pub command: Vec<String>,
    /// Container arguments (compose `command`)
    pub args: Vec<String>,
    pub environment: IndexMap<String, String>,
    pub ports: Vec<PortMapping>,
    pub volumes: Vec<VolumeMount>,
    pub labels: IndexMap<String, String>,
    pub restart: Option<String>,
    /// Replica count from `deploy.replicas`
    pub replicas: Option<u32>,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Image reference used by generated containers
    ///
    /// Services that only declare a build context get an image named after
    /// the service.
    pub fn image_or_default(&self) -> String {
        self.image.clone().unwrap_or_else(|| self.name.clone())
    }

    /// Overlay the fields `other` sets on top of `self`
    pub fn merge(&mut self, other: ServiceConfig) {
        if other.image.is_some() {
            self.image = other.image;
        }
        if other.build.is_some() {
            self.build = other.build;
        }
        if !other.command.is_empty() {
            self.command = other.command;
        }
        if !other.args.is_empty() {
            self.args = other.args;
        }
        self.environment.extend(other.environment);
        if !other.ports.is_empty() {
            self.ports = other.ports;
        }
        if !other.volumes.is_empty() {
            self.volumes = other.volumes;
        }
        self.labels.extend(other.labels);
        if other.restart.is_some() {
            self.restart = other.restart;
        }
        if other.replicas.is_some() {
            self.replicas = other.replicas;
        }
    }
}

/// Build section of a service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildContext {
    pub context: PathBuf,
    pub dockerfile: Option<String>,
}

/// Transport protocol of a published port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl Protocol {
    /// Protocol name as used in Kubernetes manifests
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A port published by a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortMapping {
    pub host_port: Option<u16>,
    pub container_port: u16,
    pub protocol: Protocol,
}

impl PortMapping {
    /// Port exposed by the generated Service
    pub fn service_port(&self) -> u16 {
        self.host_port.unwrap_or(self.container_port)
    }
}

/// A volume mounted into a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeMount {
    /// Named volume or host path; `None` for anonymous volumes
    pub source: Option<String>,
    /// Mount path inside the container
    pub target: String,
    pub read_only: bool,
}

impl VolumeMount {
    /// Whether the source refers to a path on the host
    pub fn is_host_path(&self) -> bool {
        self.source
            .as_deref()
            .is_some_and(|s| s.starts_with('/') || s.starts_with('.') || s.starts_with('~'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overlays_set_fields() {
        let mut base = ServiceConfig::new("web");
        base.image = Some("nginx:1.25".to_string());
        base.environment.insert("A".into(), "1".into());
        base.ports.push(PortMapping {
            host_port: Some(80),
            container_port: 80,
            protocol: Protocol::Tcp,
        });

        let mut overlay = ServiceConfig::new("web");
        overlay.environment.insert("B".into(), "2".into());
        overlay.replicas = Some(3);

        base.merge(overlay);

        assert_eq!(base.image.as_deref(), Some("nginx:1.25"));
        assert_eq!(base.environment.len(), 2);
        assert_eq!(base.ports.len(), 1);
        assert_eq!(base.replicas, Some(3));
    }

    #[test]
    fn test_image_or_default() {
        let svc = ServiceConfig::new("worker");
        assert_eq!(svc.image_or_default(), "worker");
    }

    #[test]
    fn test_host_path_detection() {
        let mount = |source: Option<&str>| VolumeMount {
            source: source.map(String::from),
            target: "/data".to_string(),
            read_only: false,
        };
        assert!(mount(Some("./data")).is_host_path());
        assert!(mount(Some("/srv/data")).is_host_path());
        assert!(!mount(Some("dbdata")).is_host_path());
        assert!(!mount(None).is_host_path());
    }

    #[test]
    fn test_service_port() {
        let port = PortMapping {
            host_port: None,
            container_port: 8080,
            protocol: Protocol::Udp,
        };
        assert_eq!(port.service_port(), 8080);
        assert_eq!(port.protocol.as_str(), "UDP");
    }
}
