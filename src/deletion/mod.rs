//! Staged deletion batches.
//!
//! The explorer never deletes anything itself: it writes a manifest listing
//! the origin ids of the selected messages into a pending directory, where a
//! separate executor picks it up.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeletionError {
    #[error("failed to write manifest {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read manifests: {0}")]
    Read(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

/// Context the batch was selected under
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub senders: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sender_domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Origin of the batch ("tui", "cli")
    pub created_by: String,
    pub description: String,
    pub filters: Filters,
    /// Origin message ids to delete
    pub source_ids: Vec<String>,
    pub status: Status,
}

impl Manifest {
    pub fn new(description: &str, source_ids: Vec<String>) -> Self {
        Self {
            version: 1,
            id: generate_id(description, Local::now()),
            created_at: Utc::now(),
            created_by: "cli".to_string(),
            description: description.to_string(),
            filters: Filters::default(),
            source_ids,
            status: Status::Pending,
        }
    }

    pub fn message_count(&self) -> usize {
        self.source_ids.len()
    }
}

fn generate_id(description: &str, now: DateTime<Local>) -> String {
    let mut sanitized: String = description
        .chars()
        .filter_map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => Some(c),
            ' ' | '.' => Some('-'),
            _ => None,
        })
        .collect();
    if sanitized.is_empty() {
        sanitized = "batch".to_string();
    }
    sanitized.truncate(20);
    format!("{}-{}", now.format("%Y%m%d-%H%M%S"), sanitized)
}

/// Stores manifests as JSON files, one directory per status
#[derive(Debug, Clone)]
pub struct Manager {
    base_dir: PathBuf,
}

impl Manager {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn pending_dir(&self) -> PathBuf {
        self.dir_for(Status::Pending)
    }

    fn dir_for(&self, status: Status) -> PathBuf {
        let name = match status {
            Status::Pending => "pending",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
            Status::Failed => "failed",
            Status::Cancelled => "cancelled",
        };
        self.base_dir.join(name)
    }

    /// Persist `manifest` under its status directory, returning the file path
    pub fn save_manifest(&self, manifest: &Manifest) -> Result<PathBuf, DeletionError> {
        let dir = self.dir_for(manifest.status);
        let path = dir.join(format!("{}.json", manifest.id));
        let write = |path: &Path| -> std::io::Result<()> {
            fs::create_dir_all(&dir)?;
            let content = serde_json::to_string_pretty(manifest)?;
            fs::write(path, content)
        };
        write(&path).map_err(|source| DeletionError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!(
            "Saved deletion manifest {} ({} messages)",
            manifest.id,
            manifest.message_count()
        );
        Ok(path)
    }

    /// Manifests waiting for execution, oldest first
    pub fn list_pending(&self) -> Result<Vec<Manifest>, DeletionError> {
        let dir = self.pending_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut manifests = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<Manifest>(&content) {
                Ok(manifest) => manifests.push(manifest),
                Err(e) => tracing::warn!("Skipping unreadable manifest {}: {}", path.display(), e),
            }
        }
        manifests.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(manifests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_id_sanitizes_description() {
        let now = Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(
            generate_id("Senders-alice@example.com", now),
            "20240506-070809-Senders-aliceexample"
        );
        assert_eq!(generate_id("@@", now), "20240506-070809-batch");
        assert_eq!(generate_id("a b.c", now), "20240506-070809-a-b-c");
    }

    #[test]
    fn test_save_and_list_pending() {
        let dir = tempfile::tempdir().unwrap();
        let manager = Manager::new(dir.path());

        let mut manifest = Manifest::new("Labels-spam", vec!["a".into(), "b".into()]);
        manifest.created_by = "tui".into();
        manifest.filters.labels.push("spam".into());

        let path = manager.save_manifest(&manifest).unwrap();
        assert!(path.starts_with(manager.pending_dir()));
        assert!(path.exists());

        let pending = manager.list_pending().unwrap();
        assert_eq!(pending, vec![manifest]);
    }

    #[test]
    fn test_list_pending_without_directory() {
        let dir = tempfile::tempdir().unwrap();
        let manager = Manager::new(dir.path().join("missing"));
        assert!(manager.list_pending().unwrap().is_empty());
    }

    #[test]
    fn test_serialized_field_names() {
        let manifest = Manifest::new("x", vec!["id1".into()]);
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["source_ids"][0], "id1");
        // Empty filter lists are omitted
        assert!(json["filters"].get("senders").is_none());
    }
}
