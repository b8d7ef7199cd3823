//! Controller defaults and single-output cardinality

use stevedore_core::{ConvertError, ConvertOptions, Provider, Result};
use tracing::debug;

/// Apply the provider's default controller and check cardinality
///
/// Writing everything into one file or stream only works for a single
/// controller kind per service.
pub fn select_controllers(opt: &mut ConvertOptions) -> Result<()> {
    let single_output = opt.single_output();

    match opt.provider {
        Provider::Kubernetes => {
            if !opt.create_deployment
                && !opt.create_daemon_set
                && !opt.create_replication_controller
                && opt.controller.is_none()
            {
                debug!("No controller requested, generating Deployments");
                opt.create_deployment = true;
            }
        }
        Provider::Openshift => {
            // DeploymentConfig is the only OpenShift controller for now
            if !opt.create_deployment_config {
                debug!("Generating DeploymentConfigs");
                opt.create_deployment_config = true;
            }
        }
    }

    if single_output && requested(&controller_flags(opt)) > 1 {
        return Err(ConvertError::ControllerCardinality {
            provider: opt.provider,
        });
    }

    Ok(())
}

/// Controller-creation flags of the active provider
fn controller_flags(opt: &ConvertOptions) -> Vec<bool> {
    match opt.provider {
        Provider::Kubernetes => vec![
            opt.create_deployment,
            opt.create_daemon_set,
            opt.create_replication_controller,
        ],
        Provider::Openshift => vec![opt.create_deployment_config],
    }
}

fn requested(flags: &[bool]) -> usize {
    flags.iter().filter(|&&f| f).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use stevedore_core::ControllerKind;

    #[test]
    fn test_kubernetes_defaults_to_deployment() {
        let mut opt = ConvertOptions::default();
        select_controllers(&mut opt).unwrap();

        assert!(opt.create_deployment);
        assert!(!opt.create_daemon_set);
        assert!(!opt.create_replication_controller);
        assert!(!opt.create_deployment_config);
    }

    #[test]
    fn test_explicit_controller_suppresses_default() {
        let mut opt = ConvertOptions {
            controller: Some(ControllerKind::DaemonSet),
            ..Default::default()
        };
        select_controllers(&mut opt).unwrap();
        assert!(!opt.create_deployment);

        let mut opt = ConvertOptions {
            create_replication_controller: true,
            ..Default::default()
        };
        select_controllers(&mut opt).unwrap();
        assert!(!opt.create_deployment);
    }

    #[test]
    fn test_single_output_rejects_two_kinds() {
        let mut opt = ConvertOptions {
            to_stdout: true,
            create_deployment: true,
            create_daemon_set: true,
            ..Default::default()
        };
        let err = select_controllers(&mut opt).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::ControllerCardinality {
                provider: Provider::Kubernetes
            }
        ));
    }

    #[test]
    fn test_single_output_via_out_file() {
        for out in ["manifests.yaml", "-"] {
            let mut opt = ConvertOptions {
                out_file: Some(PathBuf::from(out)),
                create_daemon_set: true,
                create_replication_controller: true,
                ..Default::default()
            };
            assert!(select_controllers(&mut opt).is_err(), "out = {}", out);
        }
    }

    #[test]
    fn test_multiple_kinds_allowed_without_single_output() {
        let mut opt = ConvertOptions {
            create_deployment: true,
            create_daemon_set: true,
            create_replication_controller: true,
            ..Default::default()
        };
        assert!(select_controllers(&mut opt).is_ok());
    }

    #[test]
    fn test_openshift_defaults_to_deployment_config() {
        let mut opt = ConvertOptions {
            provider: Provider::Openshift,
            to_stdout: true,
            ..Default::default()
        };
        select_controllers(&mut opt).unwrap();

        assert!(opt.create_deployment_config);
        assert!(!opt.create_deployment);
    }

    #[test]
    fn test_requested_counts_any_number_of_flags() {
        assert_eq!(requested(&[]), 0);
        assert_eq!(requested(&[true]), 1);
        assert_eq!(requested(&[true, false, true, true]), 3);
    }
}
