//! Compose file loader
//!
//! Accepts the common shapes of the compose format: short and long port and
//! volume syntax, `environment` and `labels` as maps or `KEY=VALUE` lists,
//! `build` as a path or a `{context, dockerfile}` mapping. Unknown keys are
//! ignored.

use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use stevedore_core::{
    BuildContext, ComposeObject, ConvertError, PortMapping, Protocol, Result, ServiceConfig,
    VolumeMount,
};
use tracing::debug;

use super::Loader;

#[derive(Debug, Deserialize)]
struct RawProject {
    #[serde(default)]
    services: IndexMap<String, Option<RawService>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawService {
    image: Option<String>,
    build: Option<RawBuild>,
    entrypoint: Option<StringOrList>,
    command: Option<StringOrList>,
    environment: Option<MapOrList>,
    ports: Vec<RawPort>,
    volumes: Vec<RawVolume>,
    labels: Option<MapOrList>,
    restart: Option<String>,
    deploy: Option<RawDeploy>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBuild {
    Context(String),
    Detailed {
        context: Option<String>,
        dockerfile: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringOrList {
    String(String),
    List(Vec<String>),
}

impl StringOrList {
    /// Split the string form with shell quoting rules
    fn into_vec(self) -> std::result::Result<Vec<String>, String> {
        match self {
            Self::String(s) => {
                shlex::split(&s).ok_or_else(|| format!("unbalanced quotes in '{}'", s))
            }
            Self::List(list) => Ok(list),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MapOrList {
    Map(IndexMap<String, serde_yaml::Value>),
    List(Vec<String>),
}

impl MapOrList {
    fn into_map(self) -> IndexMap<String, String> {
        match self {
            Self::Map(map) => map
                .into_iter()
                .map(|(k, v)| (k, scalar_to_string(&v)))
                .collect(),
            Self::List(list) => list
                .into_iter()
                .map(|entry| match entry.split_once('=') {
                    Some((k, v)) => (k.to_string(), v.to_string()),
                    None => (entry, String::new()),
                })
                .collect(),
        }
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPort {
    Number(u16),
    Short(String),
    Long {
        target: u16,
        published: Option<serde_yaml::Value>,
        protocol: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawVolume {
    Short(String),
    Long {
        source: Option<String>,
        target: String,
        read_only: Option<bool>,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDeploy {
    replicas: Option<u32>,
}

/// Loader for compose files
#[derive(Debug, Clone, Default)]
pub struct ComposeLoader;

impl ComposeLoader {
    pub fn new() -> Self {
        Self
    }

    /// Parse one compose document into services, in file order
    pub fn parse_services(&self, path: &Path, content: &str) -> Result<Vec<ServiceConfig>> {
        let parse_error = |message: String| ConvertError::ComposeParse {
            path: path.to_path_buf(),
            message,
        };

        // An empty file is an empty project
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let project: RawProject =
            serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?;

        project
            .services
            .into_iter()
            .map(|(name, raw)| {
                convert_service(&name, raw.unwrap_or_default()).map_err(|message| {
                    parse_error(format!("service '{}': {}", name, message))
                })
            })
            .collect()
    }
}

impl Loader for ComposeLoader {
    fn load_file(&self, files: &[PathBuf]) -> Result<ComposeObject> {
        let mut object = ComposeObject::new();

        for file in files {
            debug!("Loading compose file '{}'", file.display());
            let content = fs::read_to_string(file).map_err(|e| ConvertError::ComposeParse {
                path: file.clone(),
                message: e.to_string(),
            })?;

            for service in self.parse_services(file, &content)? {
                match object.services.get_mut(&service.name) {
                    Some(existing) => existing.merge(service),
                    None => object.insert(service),
                }
            }
            object.source_files.push(file.clone());
        }

        if object.is_empty() {
            return Err(ConvertError::ComposeParse {
                path: files.first().cloned().unwrap_or_default(),
                message: "no services defined".to_string(),
            });
        }

        if let Some(service) = object
            .services
            .values()
            .find(|s| s.image.is_none() && s.build.is_none())
        {
            return Err(ConvertError::InvalidService {
                service: service.name.clone(),
                message: "either 'image' or 'build' must be set".to_string(),
            });
        }

        debug!("Loaded {} service(s)", object.len());
        Ok(object)
    }
}

fn convert_service(name: &str, raw: RawService) -> std::result::Result<ServiceConfig, String> {
    let mut service = ServiceConfig::new(name);
    service.image = raw.image;
    service.build = raw.build.map(|build| match build {
        RawBuild::Context(context) => BuildContext {
            context: PathBuf::from(context),
            dockerfile: None,
        },
        RawBuild::Detailed {
            context,
            dockerfile,
        } => BuildContext {
            context: PathBuf::from(context.unwrap_or_else(|| ".".to_string())),
            dockerfile,
        },
    });
    service.command = raw
        .entrypoint
        .map(StringOrList::into_vec)
        .transpose()?
        .unwrap_or_default();
    service.args = raw
        .command
        .map(StringOrList::into_vec)
        .transpose()?
        .unwrap_or_default();
    service.environment = raw.environment.map(MapOrList::into_map).unwrap_or_default();
    service.labels = raw.labels.map(MapOrList::into_map).unwrap_or_default();
    service.restart = raw.restart;
    service.replicas = raw.deploy.and_then(|d| d.replicas);

    for port in raw.ports {
        service.ports.extend(convert_port(port)?);
    }
    for volume in raw.volumes {
        service.volumes.push(convert_volume(volume)?);
    }

    Ok(service)
}

fn parse_protocol(protocol: &str) -> std::result::Result<Protocol, String> {
    match protocol.to_ascii_lowercase().as_str() {
        "tcp" => Ok(Protocol::Tcp),
        "udp" => Ok(Protocol::Udp),
        other => Err(format!("unsupported protocol '{}'", other)),
    }
}

fn parse_port(port: &str) -> std::result::Result<u16, String> {
    port.trim()
        .parse()
        .map_err(|_| format!("invalid port '{}'", port))
}

/// Parse `N` or `N-M` into an inclusive range
fn parse_range(range: &str) -> std::result::Result<(u16, u16), String> {
    match range.split_once('-') {
        Some((start, end)) => {
            let (start, end) = (parse_port(start)?, parse_port(end)?);
            if start > end {
                return Err(format!("invalid port range '{}'", range));
            }
            Ok((start, end))
        }
        None => {
            let port = parse_port(range)?;
            Ok((port, port))
        }
    }
}

/// Parse the short port syntax: `[[ip:]host:]container[/protocol]`
///
/// IPv6 addresses are bracketed: `[::1]:8080:80`.
fn parse_port_spec(spec: &str) -> std::result::Result<Vec<PortMapping>, String> {
    let (ports, protocol) = match spec.split_once('/') {
        Some((ports, protocol)) => (ports, parse_protocol(protocol)?),
        None => (spec, Protocol::Tcp),
    };

    let ports = match ports.strip_prefix('[') {
        Some(rest) => match rest.split_once("]:") {
            Some((_ip, rest)) => rest,
            None => return Err(format!("invalid port specification '{}'", spec)),
        },
        None => ports,
    };

    let parts: Vec<&str> = ports.split(':').collect();
    let (host, container) = match parts.as_slice() {
        [container] => (None, *container),
        [host, container] => (Some(*host).filter(|h| !h.is_empty()), *container),
        [_ip, host, container] => (Some(*host).filter(|h| !h.is_empty()), *container),
        _ => return Err(format!("invalid port specification '{}'", spec)),
    };

    let (container_start, container_end) = parse_range(container)?;
    let host_range = host.map(parse_range).transpose()?;

    if let Some((host_start, host_end)) = host_range
        && host_end - host_start != container_end - container_start
    {
        return Err(format!(
            "host and container port ranges differ in size in '{}'",
            spec
        ));
    }

    Ok((container_start..=container_end)
        .enumerate()
        .map(|(offset, container_port)| PortMapping {
            // offset is bounded by the range sizes checked above
            host_port: host_range.map(|(start, _)| start + offset as u16),
            container_port,
            protocol,
        })
        .collect())
}

fn convert_port(port: RawPort) -> std::result::Result<Vec<PortMapping>, String> {
    match port {
        RawPort::Number(container_port) => Ok(vec![PortMapping {
            host_port: None,
            container_port,
            protocol: Protocol::Tcp,
        }]),
        RawPort::Short(spec) => parse_port_spec(&spec),
        RawPort::Long {
            target,
            published,
            protocol,
        } => {
            let host_port = match published.as_ref().map(scalar_to_string) {
                Some(published) if !published.is_empty() => Some(parse_port(&published)?),
                _ => None,
            };
            let protocol = match protocol {
                Some(p) => parse_protocol(&p)?,
                None => Protocol::Tcp,
            };
            Ok(vec![PortMapping {
                host_port,
                container_port: target,
                protocol,
            }])
        }
    }
}

/// Convert `target`, `source:target` or `source:target:mode`
fn convert_volume(volume: RawVolume) -> std::result::Result<VolumeMount, String> {
    match volume {
        RawVolume::Short(spec) => {
            let parts: Vec<&str> = spec.split(':').collect();
            match parts.as_slice() {
                [target] => Ok(VolumeMount {
                    source: None,
                    target: target.to_string(),
                    read_only: false,
                }),
                [source, target] => Ok(VolumeMount {
                    source: Some(source.to_string()),
                    target: target.to_string(),
                    read_only: false,
                }),
                [source, target, mode] => Ok(VolumeMount {
                    source: Some(source.to_string()),
                    target: target.to_string(),
                    read_only: mode.split(',').any(|m| m == "ro"),
                }),
                _ => Err(format!("invalid volume specification '{}'", spec)),
            }
        }
        RawVolume::Long {
            source,
            target,
            read_only,
        } => Ok(VolumeMount {
            source,
            target,
            read_only: read_only.unwrap_or(false),
        }),
    }
}
