// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Configuration loading integration tests

use people_repository::config::{ConfigLoader, LoggingConfig};
use people_repository::{load_config, AppConfig, BackendKind};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.yaml");
    fs::write(&path, content).expect("Failed to write temp config");
    path
}

#[test]
fn test_load_default_config() {
    let config_path = PathBuf::from("config/default.yaml");
    let config = load_config(&config_path).expect("default config loads");

    assert_eq!(config.people.resource, "people");
    assert_eq!(config.groups.resource, "groups");
    assert_eq!(config.http.timeout_seconds, 30);
    assert_eq!(config.firebase.database, "(default)");
    assert_eq!(config.logging.level, "info");
    assert!(config.backend.parse::<BackendKind>().is_ok());
}

#[test]
fn test_config_with_env_vars() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
backend: ${CONFIG_IT_BACKEND:-json-server}
people:
  api_url: ${CONFIG_IT_URL:-http://localhost:3000}
  resource: people
groups:
  api_url: ${CONFIG_IT_GROUPS_URL:-http://localhost:3000}
  resource: teams
"#,
    );

    std::env::set_var("CONFIG_IT_URL", "http://people.internal:8080");
    let config = load_config(&path).unwrap();
    std::env::remove_var("CONFIG_IT_URL");

    assert_eq!(config.backend, "json-server");
    assert_eq!(config.people.api_url, "http://people.internal:8080");
    assert_eq!(config.groups.api_url, "http://localhost:3000");
    assert_eq!(config.groups.resource, "teams");
    // Unlisted sections fall back to defaults
    assert_eq!(config.http.timeout_seconds, 30);
    assert_eq!(config.logging.format, LoggingConfig::default().format);
}

#[test]
fn test_unknown_backend_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "backend: mongo\n");

    let err = load_config(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("mongo"));
}

#[test]
fn test_firebase_requires_project_unless_in_memory() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "backend: firebase\n");
    let err = load_config(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("project_id"));

    let path = write_config(&dir, "backend: firebase\nfirebase:\n  in_memory: true\n");
    let config = load_config(&path).unwrap();
    assert!(config.firebase.in_memory);
}

#[test]
fn test_parse_and_defaults() {
    let config = ConfigLoader::parse("backend: localstorage\nlocal_storage:\n  in_memory: true\n")
        .unwrap();
    assert_eq!(
        config.backend.parse::<BackendKind>().unwrap(),
        BackendKind::LocalStorage
    );
    assert!(config.local_storage.in_memory);

    let defaults = AppConfig::default();
    assert_eq!(defaults.people.resource, "people");
    assert_eq!(defaults.http.timeout_seconds, config.http.timeout_seconds);
}
