//! Conversion options and command-line flag state
//!
//! [`ConvertOptions`] is the single record that travels through the whole
//! conversion pipeline. It is built once by the CLI, normalized and completed
//! by the validation stages, and read-only afterwards.
//!
//! [`FlagState`] records which provider-specific flags the user typed on the
//! command line. Some rules depend on a flag being *present*, not on its
//! value: `--deployment=false` is still a Kubernetes-only flag.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ConvertError;

/// Input format used when none is configured
pub const DEFAULT_INPUT_FORMAT: &str = "compose";

/// Volume type used when `--volumes` is not given
pub const DEFAULT_VOLUME_TYPE: &str = "persistentVolumeClaim";

/// Replica count used when `--replicas` is not given
pub const DEFAULT_REPLICAS: i32 = 1;

/// Sentinel accepted by `--out` meaning "write to standard output"
pub const STDOUT_SENTINEL: &str = "-";

/// Target platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Kubernetes,
    Openshift,
}

impl Provider {
    /// Value accepted by `--provider`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kubernetes => "kubernetes",
            Self::Openshift => "openshift",
        }
    }

    /// Human-readable platform name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Kubernetes => "Kubernetes",
            Self::Openshift => "OpenShift",
        }
    }

    /// Platform name with its indefinite article, for error messages
    pub fn with_article(&self) -> &'static str {
        match self {
            Self::Kubernetes => "a Kubernetes",
            Self::Openshift => "an OpenShift",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kubernetes" => Ok(Self::Kubernetes),
            "openshift" => Ok(Self::Openshift),
            _ => Err(ConvertError::UnknownProvider(s.to_string())),
        }
    }
}

/// Workload controller kinds that can be generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    Deployment,
    DaemonSet,
    ReplicationController,
    DeploymentConfig,
}

impl ControllerKind {
    /// All kinds, in the order they are generated
    pub const ALL: [ControllerKind; 4] = [
        Self::Deployment,
        Self::DaemonSet,
        Self::ReplicationController,
        Self::DeploymentConfig,
    ];

    /// Value accepted by `--controller`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployment => "deployment",
            Self::DaemonSet => "daemonset",
            Self::ReplicationController => "replicationcontroller",
            Self::DeploymentConfig => "deploymentconfig",
        }
    }

    /// Provider this controller kind belongs to
    pub fn provider(&self) -> Provider {
        match self {
            Self::DeploymentConfig => Provider::Openshift,
            _ => Provider::Kubernetes,
        }
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControllerKind {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| ConvertError::UnknownController(s.to_string()))
    }
}

/// Serialization format of generated manifests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

/// A command-line flag value together with whether the user set it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flag<T> {
    pub value: T,
    pub changed: bool,
}

impl<T> Flag<T> {
    /// A flag left at its default value
    pub fn unset(value: T) -> Self {
        Self {
            value,
            changed: false,
        }
    }

    /// A flag explicitly given on the command line
    pub fn set(value: T) -> Self {
        Self {
            value,
            changed: true,
        }
    }
}

/// Presence state of the provider-dependent command-line flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagState {
    pub provider: Flag<Provider>,

    // Kubernetes only
    pub chart: Flag<bool>,
    pub daemon_set: Flag<bool>,
    pub replication_controller: Flag<bool>,
    pub deployment: Flag<bool>,

    // OpenShift only
    pub deployment_config: Flag<bool>,
    pub build_repo: Flag<Option<String>>,
    pub build_branch: Flag<Option<String>>,
}

impl FlagState {
    /// Kubernetes-only flags as `(display name, explicitly set)`
    pub fn kubernetes_only(&self) -> [(&'static str, bool); 4] {
        [
            ("--chart, -c", self.chart.changed),
            ("--daemon-set", self.daemon_set.changed),
            ("--replication-controller", self.replication_controller.changed),
            ("--deployment, -d", self.deployment.changed),
        ]
    }

    /// OpenShift-only flags as `(display name, explicitly set)`
    pub fn openshift_only(&self) -> [(&'static str, bool); 3] {
        [
            ("--deployment-config", self.deployment_config.changed),
            ("--build-repo", self.build_repo.changed),
            ("--build-branch", self.build_branch.changed),
        ]
    }
}

/// Resolved conversion configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Target platform
    pub provider: Provider,
    /// Controller kind chosen with `--controller`
    pub controller: Option<ControllerKind>,

    pub create_deployment: bool,
    pub create_daemon_set: bool,
    pub create_replication_controller: bool,
    pub create_deployment_config: bool,

    /// Generate a chart directory instead of plain manifests
    pub create_chart: bool,
    /// Output file or directory; `-` means standard output until normalized
    pub out_file: Option<PathBuf>,
    /// Write everything to standard output
    pub to_stdout: bool,

    pub generate_json: bool,
    pub generate_yaml: bool,

    /// Replica count for services that don't declare one
    pub replicas: i32,
    /// How compose volumes are mapped to pod volumes
    pub volumes: String,

    /// Descriptor files, in merge order
    pub input_files: Vec<PathBuf>,
    /// Descriptor format handed to the loader
    pub input_format: String,

    /// Git repository used by generated OpenShift builds
    pub build_repo: Option<String>,
    /// Git branch used by generated OpenShift builds
    pub build_branch: Option<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            controller: None,
            create_deployment: false,
            create_daemon_set: false,
            create_replication_controller: false,
            create_deployment_config: false,
            create_chart: false,
            out_file: None,
            to_stdout: false,
            generate_json: false,
            generate_yaml: false,
            replicas: DEFAULT_REPLICAS,
            volumes: DEFAULT_VOLUME_TYPE.to_string(),
            input_files: Vec::new(),
            input_format: DEFAULT_INPUT_FORMAT.to_string(),
            build_repo: None,
            build_branch: None,
        }
    }
}

impl ConvertOptions {
    /// Seed options from the values carried by the flag state
    pub fn from_flags(flags: &FlagState) -> Self {
        Self {
            provider: flags.provider.value,
            create_chart: flags.chart.value,
            create_daemon_set: flags.daemon_set.value,
            create_replication_controller: flags.replication_controller.value,
            create_deployment: flags.deployment.value,
            create_deployment_config: flags.deployment_config.value,
            build_repo: flags.build_repo.value.clone(),
            build_branch: flags.build_branch.value.clone(),
            ..Self::default()
        }
    }

    /// Whether `--out` names a real destination
    pub fn has_out_file(&self) -> bool {
        self.out_file
            .as_deref()
            .is_some_and(|path| !path.as_os_str().is_empty())
    }

    /// Whether `--out` still holds the stdout sentinel
    pub fn out_is_stdout_sentinel(&self) -> bool {
        self.out_file.as_deref() == Some(Path::new(STDOUT_SENTINEL))
    }

    /// Whether every generated object ends up in a single artifact
    pub fn single_output(&self) -> bool {
        self.has_out_file() || self.out_is_stdout_sentinel() || self.to_stdout
    }

    /// Serialization format selected by `--json` / `--yaml`
    pub fn output_format(&self) -> OutputFormat {
        if self.generate_json {
            OutputFormat::Json
        } else {
            OutputFormat::Yaml
        }
    }

    /// Whether a controller of `kind` should be generated
    pub fn wants_controller(&self, kind: ControllerKind) -> bool {
        let created = match kind {
            ControllerKind::Deployment => self.create_deployment,
            ControllerKind::DaemonSet => self.create_daemon_set,
            ControllerKind::ReplicationController => self.create_replication_controller,
            ControllerKind::DeploymentConfig => self.create_deployment_config,
        };
        created || self.controller == Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("kubernetes".parse::<Provider>().unwrap(), Provider::Kubernetes);
        assert_eq!("OpenShift".parse::<Provider>().unwrap(), Provider::Openshift);
        assert!("nomad".parse::<Provider>().is_err());
    }

    #[test]
    fn test_controller_from_str() {
        assert_eq!(
            "DaemonSet".parse::<ControllerKind>().unwrap(),
            ControllerKind::DaemonSet
        );
        assert_eq!(
            "deploymentconfig".parse::<ControllerKind>().unwrap(),
            ControllerKind::DeploymentConfig
        );
        assert!("statefulset".parse::<ControllerKind>().is_err());
    }

    #[test]
    fn test_controller_provider() {
        assert_eq!(ControllerKind::DeploymentConfig.provider(), Provider::Openshift);
        assert_eq!(ControllerKind::DaemonSet.provider(), Provider::Kubernetes);
    }

    #[test]
    fn test_single_output() {
        let mut opt = ConvertOptions::default();
        assert!(!opt.single_output());

        opt.out_file = Some(PathBuf::from("-"));
        assert!(opt.single_output());

        opt.out_file = Some(PathBuf::new());
        assert!(!opt.single_output());

        opt.out_file = Some(PathBuf::from("out.yaml"));
        assert!(opt.single_output());

        let opt = ConvertOptions {
            to_stdout: true,
            ..Default::default()
        };
        assert!(opt.single_output());
    }

    #[test]
    fn test_wants_controller() {
        let opt = ConvertOptions {
            controller: Some(ControllerKind::DaemonSet),
            create_replication_controller: true,
            ..Default::default()
        };
        assert!(opt.wants_controller(ControllerKind::DaemonSet));
        assert!(opt.wants_controller(ControllerKind::ReplicationController));
        assert!(!opt.wants_controller(ControllerKind::Deployment));
    }

    #[test]
    fn test_from_flags() {
        let flags = FlagState {
            provider: Flag::set(Provider::Openshift),
            deployment_config: Flag::set(true),
            build_repo: Flag::set(Some("https://example.com/app.git".to_string())),
            ..Default::default()
        };
        let opt = ConvertOptions::from_flags(&flags);

        assert_eq!(opt.provider, Provider::Openshift);
        assert!(opt.create_deployment_config);
        assert!(!opt.create_deployment);
        assert_eq!(opt.build_repo.as_deref(), Some("https://example.com/app.git"));
        assert_eq!(opt.replicas, DEFAULT_REPLICAS);
        assert_eq!(opt.volumes, DEFAULT_VOLUME_TYPE);
    }

    #[test]
    fn test_output_format() {
        let opt = ConvertOptions {
            generate_json: true,
            ..Default::default()
        };
        assert_eq!(opt.output_format(), OutputFormat::Json);
        assert_eq!(ConvertOptions::default().output_format().extension(), "yaml");
    }
}
