//! Convert command - turn compose files into Kubernetes or OpenShift manifests

use clap::parser::ValueSource;
use clap::{ArgAction, ArgMatches, Args};
use std::path::PathBuf;
use stevedore_convert::{convert, resolve_input_files, validate_flags};
use stevedore_core::{ControllerKind, ConvertOptions, Flag, FlagState, Provider};
use tracing::debug;

use crate::error::Result;

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Compose file(s) to convert, merged in order
    #[arg(
        short = 'f',
        long = "file",
        env = "COMPOSE_FILE",
        value_delimiter = ',',
        value_name = "FILE"
    )]
    pub files: Vec<PathBuf>,

    /// Target platform
    #[arg(
        long,
        env = "STEVEDORE_PROVIDER",
        default_value = "kubernetes",
        value_parser = ["kubernetes", "openshift"],
        ignore_case = true
    )]
    pub provider: String,

    /// Generate a chart directory (Kubernetes only)
    #[arg(
        short = 'c',
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        default_value_t = false,
        action = ArgAction::Set
    )]
    pub chart: bool,

    /// Generate a Deployment for each service (Kubernetes only)
    #[arg(
        short = 'd',
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        default_value_t = false,
        action = ArgAction::Set
    )]
    pub deployment: bool,

    /// Generate a DaemonSet for each service (Kubernetes only)
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        default_value_t = false,
        action = ArgAction::Set
    )]
    pub daemon_set: bool,

    /// Generate a ReplicationController for each service (Kubernetes only)
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        default_value_t = false,
        action = ArgAction::Set
    )]
    pub replication_controller: bool,

    /// Generate a DeploymentConfig for each service (OpenShift only)
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        default_value_t = false,
        action = ArgAction::Set
    )]
    pub deployment_config: bool,

    /// Controller kind to generate
    #[arg(
        long,
        value_parser = ["deployment", "daemonset", "replicationcontroller", "deploymentconfig"],
        ignore_case = true
    )]
    pub controller: Option<String>,

    /// Git repository for generated BuildConfigs (OpenShift only)
    #[arg(long, value_name = "URL")]
    pub build_repo: Option<String>,

    /// Git branch for generated BuildConfigs (OpenShift only)
    #[arg(long, value_name = "BRANCH")]
    pub build_branch: Option<String>,

    /// Output file or directory; `-` writes to standard output
    #[arg(short = 'o', long = "out", value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Print all generated objects to standard output
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        default_value_t = false,
        action = ArgAction::Set
    )]
    pub stdout: bool,

    /// Replica count for generated controllers
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub replicas: i32,

    /// Volume type for compose volumes
    #[arg(long, default_value = "persistentVolumeClaim")]
    pub volumes: String,

    /// Generate JSON
    #[arg(
        short = 'j',
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        default_value_t = false,
        action = ArgAction::Set
    )]
    pub json: bool,

    /// Generate YAML (the default)
    #[arg(
        short = 'y',
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        default_value_t = false,
        action = ArgAction::Set
    )]
    pub yaml: bool,

    #[arg(hide = true)]
    pub args: Vec<String>,
}

/// Whether `id` was typed on the command line
///
/// Values from the environment or from defaults do not count.
fn explicit(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

fn flag<T>(matches: &ArgMatches, id: &str, value: T) -> Flag<T> {
    if explicit(matches, id) {
        Flag::set(value)
    } else {
        Flag::unset(value)
    }
}

impl ConvertArgs {
    /// Record which provider-specific flags were given
    pub fn flag_state(&self, matches: &ArgMatches) -> Result<FlagState> {
        let provider: Provider = self.provider.parse()?;
        Ok(FlagState {
            provider: flag(matches, "provider", provider),
            chart: flag(matches, "chart", self.chart),
            daemon_set: flag(matches, "daemon_set", self.daemon_set),
            replication_controller: flag(
                matches,
                "replication_controller",
                self.replication_controller,
            ),
            deployment: flag(matches, "deployment", self.deployment),
            deployment_config: flag(matches, "deployment_config", self.deployment_config),
            build_repo: flag(matches, "build_repo", self.build_repo.clone()),
            build_branch: flag(matches, "build_branch", self.build_branch.clone()),
        })
    }

    /// Build the conversion options from the parsed arguments
    pub fn options(&self, flags: &FlagState) -> Result<ConvertOptions> {
        let controller = self
            .controller
            .as_deref()
            .map(str::parse::<ControllerKind>)
            .transpose()?;

        Ok(ConvertOptions {
            controller,
            out_file: self.out.clone(),
            to_stdout: self.stdout,
            generate_json: self.json,
            generate_yaml: self.yaml,
            replicas: self.replicas,
            volumes: self.volumes.clone(),
            input_files: self.files.clone(),
            ..ConvertOptions::from_flags(flags)
        })
    }
}

pub fn run(args: &ConvertArgs, matches: &ArgMatches) -> Result<()> {
    let flags = args.flag_state(matches)?;
    let mut opt = args.options(&flags)?;

    validate_flags(&args.args, &flags, &mut opt)?;
    resolve_input_files(&mut opt)?;
    debug!(files = ?opt.input_files, "Converting");

    convert(&mut opt)?;
    Ok(())
}
