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

// Configuration module for people-repository
//
// Provides:
// - YAML configuration file loading
// - Environment variable substitution
// - Configuration validation
// - Default values

mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    ConfigLoader::load(path).context("Failed to load configuration")
}

/// Load configuration with environment variable overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let mut config = load_config(path)?;

    // Allow environment variables to override config values
    if let Ok(backend) = std::env::var("PEOPLE_BACKEND") {
        config.backend = backend;
    }

    if let Ok(api_url) = std::env::var("PEOPLE_API_URL") {
        config.people.api_url = api_url;
    }

    if let Ok(api_url) = std::env::var("GROUPS_API_URL") {
        config.groups.api_url = api_url;
    }

    if let Ok(project_id) = std::env::var("FIREBASE_PROJECT_ID") {
        config.firebase.project_id = project_id;
    }

    ConfigLoader::validate(&config)?;

    Ok(config)
}
