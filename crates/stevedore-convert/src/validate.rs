//! Command-line flag validation
//!
//! Runs before anything touches the filesystem. Checks are independent and
//! ordered; the first failing one is reported.

use stevedore_core::{ControllerKind, ConvertError, ConvertOptions, FlagState, Provider, Result};
use tracing::debug;

use crate::transformer::{VALID_VOLUME_TYPES, is_valid_volume_type};

/// Validate the options against the flags the user actually typed
///
/// `args` are the positional arguments left over after flag parsing.
/// `--out=-` is normalized to `--stdout` before any check runs.
pub fn validate_flags(args: &[String], flags: &FlagState, opt: &mut ConvertOptions) -> Result<()> {
    if opt.out_is_stdout_sentinel() {
        opt.to_stdout = true;
        opt.out_file = None;
    }

    let provider = flags.provider.value;
    debug!("Checking validation of provider: {}", provider);
    debug!("Checking validation of controller: {:?}", opt.controller);

    check_provider_flags(provider, flags, opt.controller)?;

    if opt.has_out_file() && opt.to_stdout {
        return Err(ConvertError::OutputModeConflict(
            "--out and --stdout can't be set at the same time",
        ));
    }

    if opt.create_chart && opt.to_stdout {
        return Err(ConvertError::OutputModeConflict(
            "chart cannot be generated when --stdout is specified",
        ));
    }

    if opt.replicas < 0 {
        return Err(ConvertError::NegativeReplicas(opt.replicas));
    }

    if !args.is_empty() {
        return Err(ConvertError::UnknownArguments(args.to_vec()));
    }

    if opt.generate_json && opt.generate_yaml {
        return Err(ConvertError::FormatConflict);
    }

    if !is_valid_volume_type(&opt.volumes) {
        return Err(ConvertError::InvalidVolumeType {
            given: opt.volumes.clone(),
            valid: VALID_VOLUME_TYPES.iter().map(|v| v.to_string()).collect(),
        });
    }

    Ok(())
}

fn check_provider_flags(
    provider: Provider,
    flags: &FlagState,
    controller: Option<ControllerKind>,
) -> Result<()> {
    let (foreign, other) = match provider {
        Provider::Openshift => (flags.kubernetes_only().to_vec(), Provider::Kubernetes),
        Provider::Kubernetes => (flags.openshift_only().to_vec(), Provider::Openshift),
    };

    if let Some((flag, _)) = foreign.iter().find(|(_, changed)| *changed) {
        return Err(ConvertError::FlagProviderMismatch {
            flag: flag.to_string(),
            provider: other,
        });
    }

    if let Some(kind) = controller
        && kind.provider() != provider
    {
        return Err(ConvertError::FlagProviderMismatch {
            flag: format!("--controller={}", kind),
            provider: kind.provider(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use stevedore_core::Flag;

    fn kubernetes() -> FlagState {
        FlagState::default()
    }

    fn openshift() -> FlagState {
        FlagState {
            provider: Flag::set(Provider::Openshift),
            ..Default::default()
        }
    }

    fn openshift_opts() -> ConvertOptions {
        ConvertOptions {
            provider: Provider::Openshift,
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let mut opt = ConvertOptions::default();
        assert!(validate_flags(&[], &kubernetes(), &mut opt).is_ok());
    }

    #[test]
    fn test_kubernetes_flags_rejected_on_openshift() {
        let cases: Vec<(FlagState, &str)> = vec![
            (
                FlagState {
                    chart: Flag::set(true),
                    ..openshift()
                },
                "--chart, -c",
            ),
            (
                FlagState {
                    daemon_set: Flag::set(true),
                    ..openshift()
                },
                "--daemon-set",
            ),
            (
                FlagState {
                    replication_controller: Flag::set(true),
                    ..openshift()
                },
                "--replication-controller",
            ),
            (
                FlagState {
                    deployment: Flag::set(true),
                    ..openshift()
                },
                "--deployment, -d",
            ),
        ];

        for (flags, expected) in cases {
            let mut opt = openshift_opts();
            match validate_flags(&[], &flags, &mut opt) {
                Err(ConvertError::FlagProviderMismatch { flag, provider }) => {
                    assert_eq!(flag, expected);
                    assert_eq!(provider, Provider::Kubernetes);
                }
                other => panic!("expected provider mismatch for {}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_explicit_false_still_counts_as_set() {
        let flags = FlagState {
            deployment: Flag::set(false),
            ..openshift()
        };
        let mut opt = openshift_opts();
        let err = validate_flags(&[], &flags, &mut opt).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"--deployment, -d is a Kubernetes only flag");
    }

    #[test]
    fn test_openshift_flags_rejected_on_kubernetes() {
        let cases: Vec<(FlagState, &str)> = vec![
            (
                FlagState {
                    deployment_config: Flag::set(true),
                    ..kubernetes()
                },
                "--deployment-config",
            ),
            (
                FlagState {
                    build_repo: Flag::set(Some("https://example.com/r.git".into())),
                    ..kubernetes()
                },
                "--build-repo",
            ),
            (
                FlagState {
                    build_branch: Flag::set(Some("main".into())),
                    ..kubernetes()
                },
                "--build-branch",
            ),
        ];

        for (flags, expected) in cases {
            let mut opt = ConvertOptions::default();
            match validate_flags(&[], &flags, &mut opt) {
                Err(ConvertError::FlagProviderMismatch { flag, provider }) => {
                    assert_eq!(flag, expected);
                    assert_eq!(provider, Provider::Openshift);
                }
                other => panic!("expected provider mismatch for {}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_controller_must_match_provider() {
        for kind in [
            ControllerKind::Deployment,
            ControllerKind::DaemonSet,
            ControllerKind::ReplicationController,
        ] {
            let mut opt = ConvertOptions {
                controller: Some(kind),
                ..openshift_opts()
            };
            assert!(matches!(
                validate_flags(&[], &openshift(), &mut opt),
                Err(ConvertError::FlagProviderMismatch { .. })
            ));
        }

        let mut opt = ConvertOptions {
            controller: Some(ControllerKind::DeploymentConfig),
            ..Default::default()
        };
        let err = validate_flags(&[], &kubernetes(), &mut opt).unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"--controller=deploymentconfig is an OpenShift only flag"
        );

        let mut opt = ConvertOptions {
            controller: Some(ControllerKind::DeploymentConfig),
            ..openshift_opts()
        };
        assert!(validate_flags(&[], &openshift(), &mut opt).is_ok());
    }

    #[test]
    fn test_stdout_sentinel_normalized() {
        let mut opt = ConvertOptions {
            out_file: Some(PathBuf::from("-")),
            ..Default::default()
        };
        validate_flags(&[], &kubernetes(), &mut opt).unwrap();
        assert!(opt.to_stdout);
        assert_eq!(opt.out_file, None);
    }

    #[test]
    fn test_stdout_sentinel_normalized_before_failing_check() {
        let mut opt = ConvertOptions {
            out_file: Some(PathBuf::from("-")),
            replicas: -1,
            ..Default::default()
        };
        assert!(validate_flags(&[], &kubernetes(), &mut opt).is_err());
        assert!(opt.to_stdout);
        assert_eq!(opt.out_file, None);
    }

    #[test]
    fn test_out_and_stdout_conflict() {
        let mut opt = ConvertOptions {
            out_file: Some(PathBuf::from("/tmp/x")),
            to_stdout: true,
            ..Default::default()
        };
        let err = validate_flags(&[], &kubernetes(), &mut opt).unwrap_err();
        assert!(matches!(err, ConvertError::OutputModeConflict(_)));
        insta::assert_snapshot!(err.to_string(), @"--out and --stdout can't be set at the same time");
    }

    #[test]
    fn test_chart_and_stdout_conflict() {
        let mut opt = ConvertOptions {
            create_chart: true,
            to_stdout: true,
            ..Default::default()
        };
        let err = validate_flags(&[], &kubernetes(), &mut opt).unwrap_err();
        assert!(matches!(err, ConvertError::OutputModeConflict(_)));
    }

    #[test]
    fn test_replicas() {
        let mut opt = ConvertOptions {
            replicas: -1,
            ..Default::default()
        };
        assert!(matches!(
            validate_flags(&[], &kubernetes(), &mut opt),
            Err(ConvertError::NegativeReplicas(-1))
        ));

        let mut opt = ConvertOptions {
            replicas: 0,
            ..Default::default()
        };
        assert!(validate_flags(&[], &kubernetes(), &mut opt).is_ok());
    }

    #[test]
    fn test_unknown_arguments_listed_in_order() {
        let mut opt = ConvertOptions::default();
        let args = vec!["web".to_string(), "db".to_string(), "cache".to_string()];
        let err = validate_flags(&args, &kubernetes(), &mut opt).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Unknown Argument(s): web,db,cache");
    }

    #[test]
    fn test_json_and_yaml_conflict() {
        let mut opt = ConvertOptions {
            generate_json: true,
            generate_yaml: true,
            ..Default::default()
        };
        assert!(matches!(
            validate_flags(&[], &kubernetes(), &mut opt),
            Err(ConvertError::FormatConflict)
        ));
    }

    #[test]
    fn test_invalid_volume_type_lists_valid_types() {
        let mut opt = ConvertOptions {
            volumes: "bogus".to_string(),
            ..Default::default()
        };
        let err = validate_flags(&[], &kubernetes(), &mut opt).unwrap_err();
        let message = err.to_string();

        let ConvertError::InvalidVolumeType { given, valid } = err else {
            panic!("expected InvalidVolumeType");
        };
        assert_eq!(given, "bogus");

        let mut valid = valid;
        valid.sort();
        assert_eq!(
            valid,
            vec!["configMap", "emptyDir", "hostPath", "persistentVolumeClaim"]
        );
        for volume_type in &valid {
            assert!(message.contains(volume_type.as_str()));
        }
    }

    #[test]
    fn test_first_failure_wins() {
        let mut opt = ConvertOptions {
            out_file: Some(PathBuf::from("out.yaml")),
            to_stdout: true,
            replicas: -3,
            volumes: "bogus".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            validate_flags(&["extra".to_string()], &kubernetes(), &mut opt),
            Err(ConvertError::OutputModeConflict(_))
        ));
    }
}
