// ABOUTME: Integration tests for settings discovery and deployment parameter validation.
// ABOUTME: Tests YAML settings files, environment-variable input, and blue/green invariants.

use std::time::Duration;

use atlantis_deploy::config::*;
use atlantis_deploy::deploy::DeploymentStrategy;
use atlantis_deploy::error::Error;

const LAMBDA_VARS: [&str; 11] = [
    "CLUSTER_NAME",
    "SERVICE_NAME",
    "TASK_DEFINITION",
    "DEPLOYMENT_STRATEGY",
    "ENVIRONMENT",
    "BLUE_TG_ARN",
    "GREEN_TG_ARN",
    "LISTENER_ARN",
    "HEALTH_CHECK_URL",
    "TIMEOUT_MINUTES",
    "SLACK_WEBHOOK_URL",
];

/// Run `f` with exactly the given Lambda variables set and the rest cleared.
fn with_lambda_env<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
    let kvs: Vec<(&str, Option<&str>)> = LAMBDA_VARS
        .iter()
        .map(|key| {
            let value = vars.iter().find(|(k, _)| k == key).map(|(_, v)| *v);
            (*key, value)
        })
        .collect();
    temp_env::with_vars(kvs, f)
}

mod environment_input {
    use super::*;

    #[test]
    fn direct_deployment_from_environment() {
        let config = with_lambda_env(
            &[
                ("CLUSTER_NAME", "dev-cluster"),
                ("SERVICE_NAME", "atlantis"),
                ("TASK_DEFINITION", "atlantis:7"),
                ("ENVIRONMENT", "dev"),
            ],
            || DeploymentInput::from_env().unwrap().build(&Settings::default()),
        )
        .unwrap();

        assert_eq!(config.strategy_kind(), DeploymentStrategy::Direct);
        assert_eq!(config.cluster.as_str(), "dev-cluster");
        assert_eq!(config.task_definition.revision(), Some(7));
        assert_eq!(config.health_check_path, "/healthz");
        assert_eq!(config.timeouts.rollout, Duration::from_secs(600));
    }

    #[test]
    fn blue_green_from_environment() {
        let config = with_lambda_env(
            &[
                ("CLUSTER_NAME", "prod-cluster"),
                ("SERVICE_NAME", "atlantis"),
                ("TASK_DEFINITION", "atlantis:8"),
                ("DEPLOYMENT_STRATEGY", "blue_green"),
                ("ENVIRONMENT", "prod"),
                ("BLUE_TG_ARN", "arn:tg/blue"),
                ("GREEN_TG_ARN", "arn:tg/green"),
                ("LISTENER_ARN", "arn:listener/app"),
                ("TIMEOUT_MINUTES", "15"),
            ],
            || DeploymentInput::from_env().unwrap().build(&Settings::default()),
        )
        .unwrap();

        let targets = config.blue_green().unwrap();
        assert_eq!(targets.blue.as_str(), "arn:tg/blue");
        assert_eq!(targets.listener.as_str(), "arn:listener/app");
        assert_eq!(config.timeouts.rollout, Duration::from_secs(900));
    }

    #[test]
    fn missing_required_variable_is_named() {
        let err = with_lambda_env(&[("SERVICE_NAME", "atlantis")], DeploymentInput::from_env)
            .unwrap_err();

        assert!(matches!(&err, Error::MissingEnvVar(name) if name == "CLUSTER_NAME"));
        assert!(err.is_config());
    }

    #[test]
    fn blue_green_without_listener_is_a_config_error() {
        let err = with_lambda_env(
            &[
                ("CLUSTER_NAME", "prod-cluster"),
                ("SERVICE_NAME", "atlantis"),
                ("TASK_DEFINITION", "atlantis:8"),
                ("DEPLOYMENT_STRATEGY", "blue_green"),
                ("ENVIRONMENT", "prod"),
                ("BLUE_TG_ARN", "arn:tg/blue"),
                ("GREEN_TG_ARN", "arn:tg/green"),
            ],
            || DeploymentInput::from_env().unwrap().build(&Settings::default()),
        )
        .unwrap_err();

        assert!(matches!(err, Error::IncompleteBlueGreen("listener ARN")));
        assert!(err.is_config());
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let err = with_lambda_env(
            &[
                ("CLUSTER_NAME", "c"),
                ("SERVICE_NAME", "s"),
                ("ENVIRONMENT", "dev"),
                ("DEPLOYMENT_STRATEGY", "canary"),
            ],
            DeploymentInput::from_env,
        )
        .unwrap_err();

        assert!(err.to_string().contains("canary"));
    }
}

mod settings_file {
    use super::*;

    #[test]
    fn full_settings_file() {
        let yaml = r#"
project: platform-atlantis
production_environment: staging
container:
  name: atlantis-server
  port: 8080
timeouts:
  rollout: 20m
  settle_period: 30s
preflight:
  request_timeout: 5s
  retry_count: 5
  retry_delay: 1m
window:
  start_hour: 10
  end_hour: 17
  friday_cutoff_hour: 12
  utc_offset_hours: 0
"#;
        let settings = Settings::from_yaml(yaml).unwrap();

        assert_eq!(settings.container.name, "atlantis-server");
        assert_eq!(settings.timeouts.rollout, Duration::from_secs(1200));
        assert_eq!(settings.timeouts.health, Duration::from_secs(300));
        assert_eq!(settings.preflight.retry_delay, Duration::from_secs(60));
        assert_eq!(settings.window.end_hour, 17);

        let staging = settings.for_environment(Environment::Staging).unwrap();
        assert!(staging.production);
        assert_eq!(staging.target_group, "staging-platform-atlantis");
        assert!(!settings.for_environment(Environment::Prod).unwrap().production);
    }

    #[test]
    fn container_binding_flows_into_deployment_config() {
        let settings = Settings::from_yaml("container:\n  name: web\n  port: 9000\n").unwrap();
        let input = DeploymentInput {
            cluster: Some("c".to_string()),
            service: Some("s".to_string()),
            task_definition: Some("web:1".to_string()),
            environment: Some("dev".to_string()),
            ..Default::default()
        };

        let config = input.build(&settings).unwrap();
        assert_eq!(config.container.name, "web");
        assert_eq!(config.container.port, 9000);
    }

    #[test]
    fn discover_finds_each_candidate_name() {
        for name in [CONFIG_FILENAME, CONFIG_FILENAME_ALT, CONFIG_FILENAME_DIR] {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, "project: found\n").unwrap();

            let settings = Settings::discover(dir.path()).unwrap();
            assert_eq!(settings.project, "found", "{name}");
        }
    }

    #[test]
    fn missing_file_is_an_error_or_defaults() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            Settings::discover(dir.path()),
            Err(Error::ConfigNotFound(_))
        ));
        let settings = Settings::discover_or_default(dir.path()).unwrap();
        assert_eq!(settings.project, "connectly-atlantis");
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "timeouts: [").unwrap();

        let err = Settings::discover_or_default(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }
}
