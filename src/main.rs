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

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use people_repository::{
    load_config_with_env, Backends, CollectionSubscription, Entity, Filters, Listing, Repository,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// People repository admin tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.yaml")]
    config: PathBuf,

    /// Backend identifier (overrides config file)
    #[arg(short, long)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage people
    People {
        #[command(subcommand)]
        action: Action,
    },
    /// Manage groups
    Groups {
        #[command(subcommand)]
        action: Action,
    },
    /// Print live changes of a collection until Ctrl+C
    Watch {
        #[arg(value_enum)]
        target: Target,
    },
}

#[derive(Subcommand, Debug)]
enum Action {
    /// List one page of records
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        page_size: u32,

        /// Equality filter as field=value, repeatable
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, serde_json::Value)>,
    },
    /// Show a single record
    Get { id: String },
    /// Delete a record and print it
    Delete { id: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Target {
    People,
    Groups,
}

/// `field=value`; the value is read as JSON when it parses, else as a string
fn parse_filter(raw: &str) -> std::result::Result<(String, serde_json::Value), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{}'", raw))?;
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((field.to_string(), value))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_action<T: Entity>(repository: Arc<dyn Repository<T>>, action: Action) -> Result<()> {
    match action {
        Action::List {
            page,
            page_size,
            filters,
        } => {
            let filters: Filters = filters.into_iter().collect();
            let listing: Listing<T> = repository.get_all(page, page_size, &filters).await?;
            print_json(&listing)
        }
        Action::Get { id } => match repository.get_by_id(&id).await? {
            Some(entity) => print_json(&entity),
            None => bail!("{} '{}' not found", T::RESOURCE, id),
        },
        Action::Delete { id } => {
            let deleted = repository.delete(&id).await?;
            print_json(&deleted)
        }
    }
}

async fn watch<T: Entity>(
    subscription: Arc<dyn CollectionSubscription<T>>,
    collection: &str,
) -> Result<()> {
    let mut stream = subscription.subscribe(collection).await?;
    info!("Watching '{}', press Ctrl+C to stop", collection);

    loop {
        tokio::select! {
            event = stream.recv() => match event {
                Some(Ok(change)) => print_json(&change)?,
                Some(Err(e)) => {
                    error!("{}", e);
                    break;
                }
                None => {
                    warn!("Change feed for '{}' completed", collection);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    subscription.unsubscribe(collection);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration from file
    let mut config = load_config_with_env(&args.config)?;

    // Apply CLI overrides
    if let Some(backend) = args.backend {
        config.backend = backend;
    }

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.to_lowercase()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logging.format == "compact" {
        builder.compact().init();
    } else {
        builder.init();
    }

    info!("Loaded configuration from: {:?}", args.config);
    info!("Backend: {}", config.backend);

    let backends = Backends::build(&config).context("Failed to initialize backend")?;

    match args.command {
        Command::People { action } => run_action(backends.people.clone(), action).await?,
        Command::Groups { action } => run_action(backends.groups.clone(), action).await?,
        Command::Watch { target } => match target {
            Target::People => {
                let changes = backends
                    .people_changes
                    .clone()
                    .context("Backend has no change feed")?;
                watch(changes, &config.people.resource).await?
            }
            Target::Groups => {
                let changes = backends
                    .groups_changes
                    .clone()
                    .context("Backend has no change feed")?;
                watch(changes, &config.groups.resource).await?
            }
        },
    }

    backends.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter("age=30").unwrap(),
            ("age".to_string(), serde_json::json!(30))
        );
        assert_eq!(
            parse_filter("gender=Masculino").unwrap(),
            ("gender".to_string(), serde_json::json!("Masculino"))
        );
        assert!(parse_filter("nonsense").is_err());
    }

    #[test]
    fn test_cli_shape() {
        let args = Args::try_parse_from([
            "people-repository",
            "--backend",
            "json-server",
            "people",
            "list",
            "--page",
            "2",
            "--filter",
            "gender=male",
        ])
        .unwrap();
        assert_eq!(args.backend.as_deref(), Some("json-server"));
        assert!(matches!(
            args.command,
            Command::People {
                action: Action::List { page: 2, .. }
            }
        ));
    }
}
