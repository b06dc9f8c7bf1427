use std::io::Write;
use std::path::Path;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::task::{Snapshot, Task};

/// Downloadable copy of the collection. Key names are fixed by the format
/// existing exports were written in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportDocument {
    #[serde(rename = "tareasPorHacer")]
    pub pending: Vec<Task>,

    #[serde(rename = "tareasTerminadas")]
    pub completed: Vec<Task>,

    #[serde(rename = "fechaExportacion", with = "export_timestamp")]
    pub exported_at: DateTime<Utc>,
}

impl ExportDocument {
    pub fn new(snapshot: Snapshot, exported_at: DateTime<Utc>) -> Self {
        Self {
            pending: snapshot.pending,
            completed: snapshot.completed,
            exported_at,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("failed serializing export document")
    }

    #[tracing::instrument(skip(self, path), fields(path = %path.display()))]
    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        let body = self.to_json()?;
        debug!(bytes = body.len(), "writing export atomically");

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
        temp.write_all(body.as_bytes())?;
        writeln!(temp)?;
        temp.flush()?;

        temp.persist(path)
            .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

        info!(
            pending = self.pending.len(),
            completed = self.completed.len(),
            "export written"
        );
        Ok(())
    }
}

mod export_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
