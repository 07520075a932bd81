//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Strata configuration file.

use crate::adapters::database::create_table_sink;
use crate::config::load_config;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also open a connection to the PostgreSQL destination
    #[arg(long)]
    pub check_connection: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates every section
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Source: {}", config.source.base_url);
        println!("  Max Pages: {}", config.source.max_pages);
        println!(
            "  Store: {} (domain '{}')",
            config.store.root, config.store.domain
        );
        match config.postgresql {
            Some(ref pg_config) => {
                println!(
                    "  PostgreSQL: {}",
                    pg_config.connection_string.expose_secret().redacted_dsn()
                );
                println!("  Max Connections: {}", pg_config.max_connections);
            }
            None => println!("  PostgreSQL: not configured (load stage unavailable)"),
        }

        println!();
        println!("Entities:");
        for entity in &config.entities {
            println!("  {} ({})", entity.name, entity.endpoint);
            for nested in &entity.nested {
                println!("    {} -> dimension {}", nested.field, nested.table_name());
            }
            for reference in &entity.references {
                println!(
                    "    {} -> junction {} ({}, {})",
                    reference.field,
                    reference.table_name(&entity.name),
                    entity.parent_column(),
                    reference.child_column_name()
                );
            }
        }
        println!();

        if self.check_connection {
            let sink = match create_table_sink(&config) {
                Ok(sink) => sink,
                Err(e) => {
                    println!("❌ {e}");
                    return Ok(2);
                }
            };

            match sink.test_connection().await {
                Ok(()) => println!("✅ Connected to {}", sink.describe()),
                Err(e) => {
                    println!("❌ Failed to connect to {}", sink.describe());
                    println!("   Error: {e}");
                    return Ok(5); // Fatal error exit code
                }
            }
            println!();
        }

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_valid_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("strata.toml");
        fs::write(
            &path,
            r#"
[source]
base_url = "https://rickandmortyapi.com/api"

[[entities]]
name = "Location"
endpoint = "location"

[[entities.references]]
field = "residents"
table = "LocationResident"
child_column = "resident_id"
"#,
        )
        .unwrap();

        let args = ValidateArgs {
            check_connection: false,
        };
        assert_eq!(args.execute(path.to_str().unwrap()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("strata.toml");
        fs::write(&path, "entities = []\n\n[source]\nbase_url = \"https://x\"\n").unwrap();

        let args = ValidateArgs {
            check_connection: false,
        };
        assert_eq!(args.execute(path.to_str().unwrap()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_check_connection_requires_destination() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("strata.toml");
        fs::write(
            &path,
            "[source]\nbase_url = \"https://x\"\n\n[[entities]]\nname = \"Episode\"\nendpoint = \"episode\"\n",
        )
        .unwrap();

        let args = ValidateArgs {
            check_connection: true,
        };
        assert_eq!(args.execute(path.to_str().unwrap()).await.unwrap(), 2);
    }
}
