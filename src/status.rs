use anyhow::{Context, Result};

use crate::args::{Mode, StatusFormat};
use crate::catalog::Catalog;

pub const PRIMARY_STATUS_SQL: &str = "SELECT * FROM pg_stat_replication";
pub const STANDBY_STATUS_SQL: &str =
    "SELECT now() - pg_last_xact_replay_timestamp() AS replication_lag";

/// Read-only replication status query for one side of the pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusCheck {
    pub mode: Mode,
    pub format: StatusFormat,
}

impl StatusCheck {
    pub fn new(mode: Mode, format: StatusFormat) -> Self {
        StatusCheck { mode, format }
    }

    pub fn query(&self) -> &'static str {
        match self.mode {
            Mode::Primary => PRIMARY_STATUS_SQL,
            Mode::Standby => STANDBY_STATUS_SQL,
        }
    }

    /// Runs the query and returns its printable output.
    pub fn run<C: Catalog + ?Sized>(&self, catalog: &mut C) -> Result<String> {
        tracing::info!(mode = ?self.mode, "checking replication status");
        match self.format {
            StatusFormat::Text => catalog.render(self.query()),
            StatusFormat::Json => {
                let raw = catalog.scalar(&json_query(self.query()))?.unwrap_or_default();
                let value: serde_json::Value = serde_json::from_str(&raw)
                    .with_context(|| format!("status query returned invalid JSON: {raw}"))?;
                let mut out = serde_json::to_string_pretty(&value)?;
                out.push('\n');
                Ok(out)
            }
        }
    }
}

/// Wraps a query so the server returns all rows as one JSON array.
/// The jsonb round trip keeps the array on a single line.
pub fn json_query(sql: &str) -> String {
    format!("SELECT coalesce(json_agg(r), '[]'::json)::jsonb::text FROM ({sql}) r")
}
