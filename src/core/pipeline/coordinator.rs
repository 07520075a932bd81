//! Pipeline coordinator - main orchestrator for a run
//!
//! A run is up to three stages, each fully materialized before the next:
//!
//! 1. **Extract**: fetch every entity type, snapshot it under an archive key and
//!    under the fixed key the transform stage reads
//! 2. **Transform**: read the raw snapshots back, normalize them together, write
//!    every output table
//! 3. **Load**: read each normalized table and replace it in the destination
//!
//! Extract failures are per entity type and load failures per table; the run
//! records them and moves on. Normalization is all-or-nothing. The shutdown
//! signal is checked between entity types and between tables. The run log is
//! written once, at the end.

use crate::adapters::api::{PaginatedFetcher, RestApiClient};
use crate::adapters::database::{create_table_sink, TableSink};
use crate::adapters::store::{read_table, write_table, BlobStore, LocalBlobStore, SnapshotKey};
use crate::config::{EntityConfig, StrataConfig};
use crate::core::normalize::{normalize, EntitySchema, NormalizedOutput};
use crate::core::pipeline::summary::{RunError, RunErrorStage, RunSummary};
use crate::core::runlog::{self, RunLogEntry, RunStage};
use crate::domain::{EntityCollections, Result, StrataError, Table, TableKind};
use crate::{log_error_with_context, log_stage_complete, log_stage_start};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use uuid::Uuid;

/// Which stages a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPlan {
    pub extract: bool,
    pub transform: bool,
    pub load: bool,
    /// Skip destination writes
    pub dry_run: bool,
}

impl RunPlan {
    /// Extract, transform and load
    pub fn full(dry_run: bool) -> Self {
        Self {
            extract: true,
            transform: true,
            load: true,
            dry_run,
        }
    }

    pub fn extract_only() -> Self {
        Self {
            extract: true,
            transform: false,
            load: false,
            dry_run: false,
        }
    }

    pub fn transform_only() -> Self {
        Self {
            extract: false,
            transform: true,
            load: false,
            dry_run: false,
        }
    }

    pub fn load_only(dry_run: bool) -> Self {
        Self {
            extract: false,
            transform: false,
            load: true,
            dry_run,
        }
    }
}

/// Identity shared by every log entry of one run
#[derive(Debug, Clone, Copy)]
struct RunContext {
    run_id: Uuid,
    started_at: DateTime<Utc>,
}

/// Pipeline coordinator
pub struct PipelineCoordinator {
    config: StrataConfig,
    schemas: Vec<EntitySchema>,
    fetcher: Arc<dyn PaginatedFetcher>,
    store: Arc<dyn BlobStore>,
    sink: Option<Arc<dyn TableSink>>,
    shutdown_signal: watch::Receiver<bool>,
}

impl PipelineCoordinator {
    /// Create a coordinator with the adapters described by the configuration
    ///
    /// The destination is only built when a `[postgresql]` section is present.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an adapter cannot be built.
    pub fn new(config: StrataConfig, shutdown_signal: watch::Receiver<bool>) -> Result<Self> {
        let fetcher: Arc<dyn PaginatedFetcher> = Arc::new(RestApiClient::new(&config.source)?);
        let store: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(&config.store.root));
        let sink = match config.postgresql {
            Some(_) => Some(create_table_sink(&config)?),
            None => None,
        };

        Ok(Self::with_adapters(config, fetcher, store, sink, shutdown_signal))
    }

    /// Create a coordinator over explicit adapters
    pub fn with_adapters(
        config: StrataConfig,
        fetcher: Arc<dyn PaginatedFetcher>,
        store: Arc<dyn BlobStore>,
        sink: Option<Arc<dyn TableSink>>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Self {
        let schemas = config.entities.iter().map(EntitySchema::from_config).collect();
        Self {
            config,
            schemas,
            fetcher,
            store,
            sink,
            shutdown_signal,
        }
    }

    /// The snapshot store
    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// Execute a run
    ///
    /// Stage failures are recorded in the returned summary.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the plan loads but no destination is
    /// configured.
    pub async fn execute(&self, plan: RunPlan) -> Result<RunSummary> {
        if plan.load && self.sink.is_none() {
            return Err(StrataError::Configuration(
                "The load stage requires a [postgresql] section".to_string(),
            ));
        }

        let start_time = Instant::now();
        let ctx = RunContext {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
        };
        let mut summary = RunSummary::new(ctx.run_id, plan.dry_run);
        let mut entries: Vec<RunLogEntry> = Vec::new();

        tracing::info!(run_id = %ctx.run_id, plan = ?plan, "Starting pipeline run");

        if plan.extract {
            entries.extend(self.extract(ctx, &mut summary).await);
        }

        if plan.transform && !summary.interrupted {
            if summary.has_errors_in(RunErrorStage::Extract) {
                summary.add_error(RunError::new(
                    RunErrorStage::Transform,
                    "Skipped: not every entity type was extracted in this run",
                ));
            } else {
                entries.extend(self.transform(ctx, &mut summary).await);
            }
        }

        if plan.load && !summary.interrupted {
            if summary.has_errors_in(RunErrorStage::Extract)
                || summary.has_errors_in(RunErrorStage::Transform)
            {
                summary.add_error(RunError::new(
                    RunErrorStage::Load,
                    "Skipped: an earlier stage of this run failed",
                ));
            } else {
                entries.extend(self.load(ctx, plan.dry_run, &mut summary).await);
            }
        }

        if !entries.is_empty() {
            if let Err(e) = append_run_log(self.store.as_ref(), &self.config.store.domain, &entries).await {
                log_error_with_context!(e, "run log");
                summary.add_error(RunError::new(RunErrorStage::RunLog, e.to_string()));
            }
        }
        summary.log_entries = entries;

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }

    fn is_shutdown_requested(&self) -> bool {
        *self.shutdown_signal.borrow()
    }

    fn interrupt(&self, summary: &mut RunSummary, stage: &str) {
        tracing::warn!(stage = stage, "Shutdown requested, stopping before the next unit");
        summary.interrupted = true;
    }

    async fn extract(&self, ctx: RunContext, summary: &mut RunSummary) -> Vec<RunLogEntry> {
        let started = Instant::now();
        log_stage_start!("extract", ctx.run_id, self.config.entities.len());

        let mut entries = Vec::new();
        for entity in &self.config.entities {
            if self.is_shutdown_requested() {
                self.interrupt(summary, "extract");
                break;
            }

            match self.extract_entity(entity, ctx).await {
                Ok(entry) => {
                    summary.entities_extracted += 1;
                    summary.records_extracted += entry.rows;
                    entries.push(entry);
                }
                Err(e) => {
                    log_error_with_context!(e, entity.name);
                    summary.add_error(
                        RunError::new(RunErrorStage::Extract, e.to_string()).with_context(&entity.name),
                    );
                }
            }
        }

        log_stage_complete!("extract", entries.len(), started.elapsed());
        entries
    }

    async fn extract_entity(&self, entity: &EntityConfig, ctx: RunContext) -> Result<RunLogEntry> {
        let records = self.fetcher.fetch(&entity.name, &entity.endpoint).await?;
        let table = Table::from_entities(&entity.name, &records);
        let domain = &self.config.store.domain;

        write_table(
            self.store.as_ref(),
            &SnapshotKey::archived(domain, &entity.name, ctx.started_at),
            &table,
        )
        .await?;
        write_table(
            self.store.as_ref(),
            &SnapshotKey::untransformed(domain, &entity.name),
            &table,
        )
        .await?;

        Ok(RunLogEntry::from_table(
            &table,
            RunStage::Ingestion,
            ctx.run_id,
            ctx.started_at,
        ))
    }

    async fn transform(&self, ctx: RunContext, summary: &mut RunSummary) -> Vec<RunLogEntry> {
        let started = Instant::now();
        log_stage_start!("transform", ctx.run_id, self.schemas.len());

        let output = match self.normalize_snapshots().await {
            Ok(output) => output,
            Err(e) => {
                log_error_with_context!(e, "normalization");
                summary.add_error(RunError::new(RunErrorStage::Transform, e.to_string()));
                return Vec::new();
            }
        };
        summary.collisions = output.collisions().to_vec();

        let mut entries = Vec::new();
        for table in output.tables() {
            if self.is_shutdown_requested() {
                self.interrupt(summary, "transform");
                break;
            }

            let key = SnapshotKey::transformed(&self.config.store.domain, table.name());
            match write_table(self.store.as_ref(), &key, table).await {
                Ok(()) => {
                    summary.tables_transformed += 1;
                    entries.push(RunLogEntry::from_table(
                        table,
                        RunStage::Transformation,
                        ctx.run_id,
                        ctx.started_at,
                    ));
                }
                Err(e) => {
                    log_error_with_context!(e, table.name());
                    summary.add_error(
                        RunError::new(RunErrorStage::Transform, e.to_string()).with_context(table.name()),
                    );
                }
            }
        }

        log_stage_complete!("transform", entries.len(), started.elapsed());
        entries
    }

    /// Reads every raw snapshot and normalizes them in one call
    async fn normalize_snapshots(&self) -> Result<NormalizedOutput> {
        let mut collections = EntityCollections::new();
        for schema in &self.schemas {
            let key = SnapshotKey::untransformed(&self.config.store.domain, &schema.entity);
            let raw = read_table(self.store.as_ref(), &key, TableKind::Raw).await?;
            collections.insert(&schema.entity, raw.to_entities()?);
        }

        normalize(&collections, &self.schemas)
    }

    async fn load(&self, ctx: RunContext, dry_run: bool, summary: &mut RunSummary) -> Vec<RunLogEntry> {
        let Some(sink) = self.sink.as_ref() else {
            return Vec::new();
        };

        let started = Instant::now();
        let tables = self.output_tables();
        log_stage_start!("load", ctx.run_id, tables.len());
        tracing::info!(destination = %sink.describe(), dry_run = dry_run, "Loading tables");

        let mut entries = Vec::new();
        for (name, kind) in tables {
            if self.is_shutdown_requested() {
                self.interrupt(summary, "load");
                break;
            }

            let key = SnapshotKey::transformed(&self.config.store.domain, &name);
            let loaded = match read_table(self.store.as_ref(), &key, kind).await {
                Ok(table) => sink.load(&table, dry_run).await.map(|report| (table, report)),
                Err(e) => Err(e),
            };

            match loaded {
                Ok((table, report)) => {
                    if !dry_run {
                        entries.push(RunLogEntry::from_table(
                            &table,
                            RunStage::Loading,
                            ctx.run_id,
                            ctx.started_at,
                        ));
                    }
                    summary.loads.push(report);
                }
                Err(e) => {
                    log_error_with_context!(e, name);
                    summary.add_error(RunError::new(RunErrorStage::Load, e.to_string()).with_context(name));
                }
            }
        }

        log_stage_complete!("load", summary.loads.len(), started.elapsed());
        entries
    }

    /// Every output table with its kind, in production order
    fn output_tables(&self) -> Vec<(String, TableKind)> {
        self.schemas
            .iter()
            .flat_map(|schema| {
                std::iter::once((schema.entity.clone(), TableKind::Entity))
                    .chain(schema.nested.iter().map(|n| (n.table.clone(), TableKind::Dimension)))
                    .chain(schema.references.iter().map(|r| (r.table.clone(), TableKind::Junction)))
            })
            .collect()
    }
}

/// Reads the run log, empty when no run has written one yet
///
/// # Errors
///
/// Returns an error if the log exists but cannot be read or parsed.
pub async fn read_run_log(store: &dyn BlobStore, domain: &str) -> Result<Vec<RunLogEntry>> {
    let key = SnapshotKey::run_log(domain);
    if !store.exists(&key.to_string()).await? {
        return Ok(Vec::new());
    }
    let table = read_table(store, &key, TableKind::RunLog).await?;
    runlog::from_table(&table)
}

/// Appends entries to the run log with a single write
///
/// # Errors
///
/// Returns an error if the existing log cannot be read or the new one cannot
/// be written.
pub async fn append_run_log(store: &dyn BlobStore, domain: &str, entries: &[RunLogEntry]) -> Result<()> {
    let mut log = read_run_log(store, domain).await?;
    log.extend_from_slice(entries);
    write_table(store, &SnapshotKey::run_log(domain), &runlog::to_table(&log)?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::LoadReport;
    use crate::config::parse_config;
    use crate::domain::{FetchError, RawEntity};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
[source]
base_url = "https://rickandmortyapi.com/api"

[store]
domain = "Test"

[[entities]]
name = "Character"
endpoint = "character"

[[entities.nested]]
field = "origin"

[[entities.references]]
field = "episode"
child_column = "episode_id"

[[entities]]
name = "Episode"
endpoint = "episode"

[[entities.references]]
field = "characters"
child_column = "character_id"
"#;

    struct StaticFetcher {
        fail: Option<&'static str>,
    }

    #[async_trait]
    impl PaginatedFetcher for StaticFetcher {
        async fn fetch(&self, entity_type: &str, endpoint: &str) -> Result<Vec<RawEntity>> {
            if self.fail == Some(endpoint) {
                return Err(FetchError::Transient {
                    url: endpoint.to_string(),
                    message: "connection reset".to_string(),
                }
                .into());
            }
            let records: Vec<Value> = match endpoint {
                "character" => vec![json!({
                    "id": 1,
                    "name": "Rick Sanchez",
                    "origin": {"name": "Earth (C-137)", "url": "https://x/api/location/1"},
                    "episode": ["https://x/api/episode/1", "https://x/api/episode/2"]
                })],
                _ => vec![
                    json!({"id": 1, "name": "Pilot", "characters": ["https://x/api/character/1"]}),
                    json!({"id": 2, "name": "Lawnmower Dog", "characters": ["https://x/api/character/1"]}),
                ],
            };
            records
                .into_iter()
                .map(|r| RawEntity::from_value(entity_type, r))
                .collect()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        loaded: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TableSink for RecordingSink {
        async fn test_connection(&self) -> Result<()> {
            Ok(())
        }

        async fn load(&self, table: &Table, dry_run: bool) -> Result<LoadReport> {
            self.loaded.lock().unwrap().push(table.name().to_string());
            Ok(LoadReport {
                table: table.name().to_string(),
                rows_inserted: table.len(),
                dry_run,
            })
        }

        fn describe(&self) -> String {
            "recording".to_string()
        }
    }

    fn coordinator(
        dir: &TempDir,
        fail: Option<&'static str>,
        sink: Arc<RecordingSink>,
    ) -> (PipelineCoordinator, watch::Sender<bool>) {
        let mut config = parse_config(CONFIG).unwrap();
        config.store.root = dir.path().to_string_lossy().to_string();
        let (tx, rx) = watch::channel(false);
        let coordinator = PipelineCoordinator::with_adapters(
            config,
            Arc::new(StaticFetcher { fail }),
            Arc::new(LocalBlobStore::new(dir.path())),
            Some(sink),
            rx,
        );
        (coordinator, tx)
    }

    #[tokio::test]
    async fn test_full_run() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let (coordinator, _tx) = coordinator(&dir, None, sink.clone());

        let summary = coordinator.execute(RunPlan::full(false)).await.unwrap();

        assert!(summary.is_successful(), "{:?}", summary.errors);
        assert_eq!(summary.entities_extracted, 2);
        assert_eq!(summary.records_extracted, 3);
        assert_eq!(summary.tables_transformed, 5);
        assert_eq!(
            *sink.loaded.lock().unwrap(),
            vec!["Character", "Origin", "CharacterEpisode", "Episode", "EpisodeCharacters"]
        );
        // 2 ingestion + 5 transformation + 5 loading
        assert_eq!(summary.log_entries.len(), 12);

        let log = read_run_log(coordinator.store().as_ref(), "Test").await.unwrap();
        assert_eq!(log.len(), 12);
        assert!(log.iter().all(|e| e.run_id == Some(summary.run_id)));
    }

    #[tokio::test]
    async fn test_extract_failure_skips_later_stages() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let (coordinator, _tx) = coordinator(&dir, Some("episode"), sink.clone());

        let summary = coordinator.execute(RunPlan::full(false)).await.unwrap();

        assert_eq!(summary.entities_extracted, 1);
        assert!(summary.has_errors_in(RunErrorStage::Extract));
        assert!(summary.has_errors_in(RunErrorStage::Transform));
        assert!(sink.loaded.lock().unwrap().is_empty());
        assert_eq!(summary.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_between_units() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let (coordinator, tx) = coordinator(&dir, None, sink);
        tx.send(true).unwrap();

        let summary = coordinator.execute(RunPlan::full(false)).await.unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.entities_extracted, 0);
        assert!(summary.log_entries.is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_load_adds_no_loading_entries() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let (coordinator, _tx) = coordinator(&dir, None, sink);

        let summary = coordinator.execute(RunPlan::full(true)).await.unwrap();

        assert!(summary.loads.iter().all(|l| l.dry_run));
        assert!(summary
            .log_entries
            .iter()
            .all(|e| e.stage != RunStage::Loading));
    }

    #[tokio::test]
    async fn test_run_log_appends_across_runs() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let (coordinator, _tx) = coordinator(&dir, None, sink);

        coordinator.execute(RunPlan::extract_only()).await.unwrap();
        coordinator.execute(RunPlan::extract_only()).await.unwrap();

        let log = read_run_log(coordinator.store().as_ref(), "Test").await.unwrap();
        assert_eq!(log.len(), 4);
        assert_ne!(log[0].run_id, log[2].run_id);
    }

    #[tokio::test]
    async fn test_load_requires_sink() {
        let dir = TempDir::new().unwrap();
        let config = parse_config(CONFIG).unwrap();
        let (_tx, rx) = watch::channel(false);
        let coordinator = PipelineCoordinator::with_adapters(
            config,
            Arc::new(StaticFetcher { fail: None }),
            Arc::new(LocalBlobStore::new(dir.path())),
            None,
            rx,
        );

        assert!(coordinator.execute(RunPlan::load_only(true)).await.is_err());
    }

    #[tokio::test]
    async fn test_run_log_missing_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path());

        assert!(read_run_log(&store, "Test").await.unwrap().is_empty());

        let key = SnapshotKey::run_log("Test").to_string();
        store.put(&key, b"table_name\nEpisode\n").await.unwrap();
        assert!(read_run_log(&store, "Test").await.is_err());
    }
}
