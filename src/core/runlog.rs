//! Pipeline run log
//!
//! Each stage returns one [`RunLogEntry`] per table it processed. The coordinator
//! concatenates them and persists the log once per run, appended to whatever
//! earlier runs left behind.

use crate::domain::{Result, StrataError, Table, TableKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Name of the run log table and blob
pub const RUN_LOG_TABLE: &str = "Logs";

const COLUMNS: [&str; 8] = [
    "Table_Name",
    "latest_idx",
    "latest_df_size",
    "rows",
    "pipeline_run_time",
    "stage",
    "cols_size",
    "run_id",
];

/// Pipeline stage that produced a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStage {
    /// Raw tables fetched and snapshotted
    Ingestion,
    /// Normalized tables written
    Transformation,
    /// Tables loaded into the destination
    Loading,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingestion => write!(f, "ingestion"),
            Self::Transformation => write!(f, "transformation"),
            Self::Loading => write!(f, "loading"),
        }
    }
}

impl FromStr for RunStage {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            // older logs spell it this way
            "ingestion" | "injestion" => Ok(Self::Ingestion),
            "transformation" => Ok(Self::Transformation),
            "loading" => Ok(Self::Loading),
            _ => Err(StrataError::Validation(format!("Unknown run stage: {s}"))),
        }
    }
}

/// Statistics for one table processed by one stage of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub table_name: String,
    /// Largest `id`, absent when the table has none
    pub latest_idx: Option<i64>,
    /// Approximate in-memory size in bytes
    pub latest_df_size: u64,
    pub rows: usize,
    pub cols_size: usize,
    pub pipeline_run_time: DateTime<Utc>,
    pub stage: RunStage,
    /// Shared by every entry of one run; absent in logs written before run ids existed
    pub run_id: Option<Uuid>,
}

impl RunLogEntry {
    /// Computes the entry for a table
    pub fn from_table(table: &Table, stage: RunStage, run_id: Uuid, timestamp: DateTime<Utc>) -> Self {
        Self {
            table_name: table.name().to_string(),
            latest_idx: table.max_id(),
            latest_df_size: table.approx_size_bytes(),
            rows: table.len(),
            cols_size: table.columns().len(),
            pipeline_run_time: timestamp,
            stage,
            run_id: Some(run_id),
        }
    }

    fn to_row(&self) -> Vec<Value> {
        vec![
            Value::from(self.table_name.clone()),
            self.latest_idx.map_or(Value::Null, Value::from),
            Value::from(self.latest_df_size),
            Value::from(self.rows as u64),
            Value::from(self.pipeline_run_time.to_rfc3339()),
            Value::from(self.stage.to_string()),
            Value::from(self.cols_size as u64),
            self.run_id.map_or(Value::Null, |id| Value::from(id.to_string())),
        ]
    }

    fn from_row(table: &Table, row: &[Value]) -> Result<Self> {
        let cell = |name: &str| -> Option<&Value> {
            table
                .column_index(name)
                .and_then(|i| row.get(i))
                .filter(|v| !v.is_null())
        };
        let text = |name: &str| -> Option<String> {
            cell(name).map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        };
        let number = |name: &str| -> Result<Option<i64>> {
            text(name)
                .map(|s| {
                    // pandas writes integer columns holding NaN as floats
                    let trimmed = s.strip_suffix(".0").unwrap_or(&s);
                    trimmed.parse::<i64>().map_err(|_| {
                        StrataError::Validation(format!("Run log column '{name}' is not an integer: {s}"))
                    })
                })
                .transpose()
        };
        let count = |name: &str| -> Result<u64> {
            Ok(number(name)?.map_or(0, |n| n.max(0) as u64))
        };

        let table_name = text("Table_Name")
            .ok_or_else(|| StrataError::Validation("Run log row has no Table_Name".to_string()))?;

        let pipeline_run_time = match text("pipeline_run_time") {
            Some(s) => parse_timestamp(&s)?,
            None => {
                return Err(StrataError::Validation(format!(
                    "Run log row for '{table_name}' has no pipeline_run_time"
                )))
            }
        };

        let stage = text("stage")
            .ok_or_else(|| StrataError::Validation(format!("Run log row for '{table_name}' has no stage")))?
            .parse()?;

        let run_id = text("run_id")
            .map(|s| {
                Uuid::parse_str(&s)
                    .map_err(|e| StrataError::Validation(format!("Invalid run_id '{s}': {e}")))
            })
            .transpose()?;

        Ok(Self {
            latest_idx: number("latest_idx")?,
            latest_df_size: count("latest_df_size")?,
            rows: count("rows")? as usize,
            cols_size: count("cols_size")? as usize,
            table_name,
            pipeline_run_time,
            stage,
            run_id,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    // naive "YYYY-MM-DD HH:MM:SS[.f]" as written by earlier pipeline versions
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| StrataError::Validation(format!("Invalid pipeline_run_time '{s}': {e}")))
}

/// Renders entries as the run log table
///
/// # Errors
///
/// Returns a validation error if an entry row does not match the log columns.
pub fn to_table(entries: &[RunLogEntry]) -> Result<Table> {
    let mut table = Table::new(
        RUN_LOG_TABLE,
        TableKind::RunLog,
        COLUMNS.iter().map(|c| c.to_string()).collect(),
    );
    for entry in entries {
        table.push_row(entry.to_row())?;
    }
    Ok(table)
}

/// Reads entries back from a run log table
///
/// # Errors
///
/// Returns a validation error for a row missing its table name, stage or run
/// time, or holding an unparseable number, timestamp or run id.
pub fn from_table(table: &Table) -> Result<Vec<RunLogEntry>> {
    table
        .rows()
        .iter()
        .map(|row| RunLogEntry::from_row(table, row))
        .collect()
}
