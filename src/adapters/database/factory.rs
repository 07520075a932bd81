//! Destination factory
//!
//! This module builds the table sink from configuration.

use crate::adapters::database::traits::TableSink;
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::StrataConfig;
use crate::domain::{Result, StrataError};
use std::sync::Arc;

/// Create the table sink described by the `[postgresql]` section
///
/// # Errors
///
/// Returns a configuration error if the section is missing or the client
/// cannot be built.
pub fn create_table_sink(config: &StrataConfig) -> Result<Arc<dyn TableSink>> {
    let pg_config = config.postgresql.clone().ok_or_else(|| {
        StrataError::Configuration(
            "The load stage requires a [postgresql] section (or STRATA_POSTGRESQL_CONNECTION_STRING)"
                .to_string(),
        )
    })?;

    let client = PostgreSQLClient::new(pg_config)?;
    Ok(Arc::new(PostgreSQLAdapter::new(Arc::new(client))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    const BASE: &str = r#"
[source]
base_url = "https://rickandmortyapi.com/api"

[[entities]]
name = "Episode"
endpoint = "episode"
"#;

    #[test]
    fn test_requires_postgresql_section() {
        std::env::remove_var("STRATA_POSTGRESQL_CONNECTION_STRING");
        let config = parse_config(BASE).unwrap();
        assert!(matches!(
            create_table_sink(&config),
            Err(StrataError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_creates_postgresql_sink() {
        let toml = format!(
            "{BASE}\n[postgresql]\nconnection_string = \"postgresql://etl:pw@localhost:5432/warehouse\"\nssl_mode = \"disable\"\n"
        );
        let config = parse_config(&toml).unwrap();

        let sink = create_table_sink(&config).unwrap();
        assert_eq!(sink.describe(), "postgresql://***@localhost:5432/warehouse");
    }
}
