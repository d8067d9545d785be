//! Integration tests for YAML parsing

mod common;

use baton::config::{find_config_file_from, parse_config, parse_config_file, validate_config};
use baton::error::{BatonError, ConfigError};
use baton::runner::{EntityKind, Parameter, Value};

#[test]
fn test_parse_complete_config() {
    let config = parse_config(common::RELEASE_PIPELINE, None).unwrap();
    validate_config(&config).unwrap();

    assert_eq!(config.name, Some("release".to_string()));
    assert_eq!(config.vars["registry"], "ghcr.io");
    assert_eq!(config.tasks.len(), 2);

    let deploy = config.task("deploy").unwrap();
    assert_eq!(deploy.display_name(), "Deploy");
    assert_eq!(deploy.actions.len(), 2);
    assert_eq!(
        deploy.actions[0].params["actual"],
        Parameter::action_output("tag", "stdout")
    );
}

#[test]
fn test_parameter_forms() {
    let yaml = r#"
tasks:
  - id: t
    actions:
      - id: a
        type: set
        params:
          plain: hello
          number: 3
          list: [1, 2]
          escaped: {value: {action: x, key: y}}
          ordinary_map: {host: db, port: 5432}
          from_action: {action: build, key: image}
          from_task: {task: build, key: success}
          from_entity: {entity: action, id: build, key: image}
"#;
    let config = parse_config(yaml, None).unwrap();
    let params = &config.tasks[0].actions[0].params;

    assert_eq!(params["plain"], Parameter::literal("hello"));
    assert_eq!(params["number"], Parameter::literal(3));
    assert!(params["list"].is_static());
    assert!(params["ordinary_map"].is_static());
    assert_eq!(
        params["escaped"],
        Parameter::literal(serde_yaml::from_str::<Value>("{action: x, key: y}").unwrap())
    );
    assert_eq!(params["from_action"], Parameter::action_output("build", "image"));
    assert_eq!(params["from_task"], Parameter::task_output("build", "success"));

    let (entity, id) = params["from_entity"].reference().unwrap().unwrap();
    assert_eq!(entity, EntityKind::Action);
    assert_eq!(id, "build");
}

#[test]
fn test_malformed_reference_is_a_parse_error() {
    let yaml = r#"
tasks:
  - id: t
    actions:
      - id: a
        type: set
        params:
          bad: {action: 12, key: image}
"#;
    assert!(matches!(parse_config(yaml, None), Err(BatonError::Yaml(_))));
}

#[test]
fn test_discovery_from_subdir() {
    let (_temp_dir, config_path, sub_dir) =
        common::create_test_config_in_subdir(common::RELEASE_PIPELINE);

    let found = find_config_file_from(sub_dir).unwrap();
    assert_eq!(found, config_path);

    let config = parse_config_file(&found).unwrap();
    assert_eq!(config.tasks.len(), 2);
}

#[test]
fn test_validation_rejects_forward_reference() {
    let yaml = r#"
tasks:
  - id: deploy
    actions:
      - id: push
        type: shell
        params:
          command: {action: tag, key: stdout}
  - id: build
    actions:
      - id: tag
        type: shell
        params:
          command: echo v1
"#;
    let config = parse_config(yaml, None).unwrap();
    let err = validate_config(&config).unwrap_err();
    assert!(matches!(err, ConfigError::ForwardReference { .. }));
    assert!(err.to_string().contains("before it has run"));
}
