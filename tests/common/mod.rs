//! Common test utilities

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory with a baton.yml file
pub fn create_test_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("baton.yml");
    fs::write(&config_path, content).unwrap();
    (temp_dir, config_path)
}

/// Create a test config with an empty subdirectory next to it
pub fn create_test_config_in_subdir(content: &str) -> (TempDir, PathBuf, PathBuf) {
    let (temp_dir, config_path) = create_test_config(content);
    let sub_dir = temp_dir.path().join("subdir");
    fs::create_dir(&sub_dir).unwrap();
    (temp_dir, config_path, sub_dir)
}

/// Two tasks handing an image tag from a shell step to an assertion
pub const RELEASE_PIPELINE: &str = r#"
name: release
vars:
  registry: ghcr.io
tasks:
  - id: build
    name: Build
    actions:
      - id: tag
        type: shell
        params:
          command: echo ${registry}/app:v1
  - id: deploy
    name: Deploy
    actions:
      - id: check-image
        type: assert
        params:
          actual: {action: tag, key: stdout}
          expected: ghcr.io/app:v1
      - id: services
        type: split
        params:
          items: web,api
"#;
