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

// Configuration loader with environment variable substitution

use super::types::*;
use crate::backend::BackendKind;
use anyhow::{bail, Context, Result};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::OnceLock;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file with environment variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from YAML text
    pub fn parse(content: &str) -> Result<AppConfig> {
        let content = Self::substitute_env_vars(content);

        let config: AppConfig =
            serde_yaml::from_str(&content).context("Failed to parse YAML configuration")?;

        Self::validate(&config)?;

        Ok(config)
    }

    /// Substitute ${VAR} and ${VAR:-default} patterns with environment variables
    ///
    /// Examples:
    /// - ${HOME} -> /home/user
    /// - ${PEOPLE_API_URL:-http://localhost:1337/api} -> default when unset
    fn substitute_env_vars(content: &str) -> String {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| {
            Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("static pattern is valid")
        });

        re.replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str());

            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => match default_value {
                    Some(default) => default.to_string(),
                    // Keep original if no default and var not found
                    None => format!("${{{}}}", var_name),
                },
            }
        })
        .to_string()
    }

    /// Validate configuration
    pub fn validate(config: &AppConfig) -> Result<()> {
        let backend: BackendKind = config
            .backend
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        for (label, entity) in [("people", &config.people), ("groups", &config.groups)] {
            if entity.resource.trim().is_empty() {
                bail!("{}.resource cannot be empty", label);
            }
            if backend.uses_api_url() && entity.api_url.trim().is_empty() {
                bail!("{}.api_url is required for the {} backend", label, backend);
            }
        }

        if config.http.timeout_seconds == 0 {
            bail!("http.timeout_seconds must be > 0");
        }

        match backend {
            BackendKind::Firebase => {
                if config.firebase.project_id.trim().is_empty() && !config.firebase.in_memory {
                    bail!("firebase.project_id is required for the firebase backend");
                }
                if config.firebase.poll_interval_ms == 0 {
                    bail!("firebase.poll_interval_ms must be > 0");
                }
            }
            BackendKind::LocalStorage => {
                if config.local_storage.path.trim().is_empty() && !config.local_storage.in_memory {
                    bail!("local_storage.path cannot be empty");
                }
            }
            BackendKind::Http | BackendKind::JsonServer | BackendKind::Strapi => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PEOPLE_REPO_TEST_VAR", "test_value");

        let input = "url: ${PEOPLE_REPO_TEST_VAR}";
        let output = ConfigLoader::substitute_env_vars(input);
        assert_eq!(output, "url: test_value");

        std::env::remove_var("PEOPLE_REPO_TEST_VAR");
    }

    #[test]
    fn test_env_var_with_default() {
        std::env::remove_var("PEOPLE_REPO_TEST_VAR2");

        let input = "backend: ${PEOPLE_REPO_TEST_VAR2:-json-server}";
        let output = ConfigLoader::substitute_env_vars(input);
        assert_eq!(output, "backend: json-server");
    }

    #[test]
    fn test_missing_var_without_default_is_kept() {
        std::env::remove_var("PEOPLE_REPO_TEST_VAR3");
        let output = ConfigLoader::substitute_env_vars("key: ${PEOPLE_REPO_TEST_VAR3}");
        assert_eq!(output, "key: ${PEOPLE_REPO_TEST_VAR3}");
    }

    #[test]
    fn test_validation_unknown_backend() {
        let config = AppConfig {
            backend: "couchdb".to_string(),
            ..Default::default()
        };

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unknown backend"));
    }

    #[test]
    fn test_validation_empty_resource() {
        let mut config = AppConfig::default();
        config.groups.resource = " ".to_string();

        let result = ConfigLoader::validate(&config);
        assert!(result.unwrap_err().to_string().contains("groups.resource"));
    }

    #[test]
    fn test_validation_firebase_requires_project() {
        let config = AppConfig {
            backend: "firebase".to_string(),
            ..Default::default()
        };
        let result = ConfigLoader::validate(&config);
        assert!(result.unwrap_err().to_string().contains("project_id"));

        let mut config = AppConfig {
            backend: "firebase".to_string(),
            ..Default::default()
        };
        config.firebase.in_memory = true;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut config = AppConfig::default();
        config.http.timeout_seconds = 0;
        assert!(ConfigLoader::validate(&config).is_err());
    }
}
