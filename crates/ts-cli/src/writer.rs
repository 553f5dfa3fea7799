//! Writer identity management.
//!
//! Each installation gets a persistent UUID stored in `writer.json`. Every
//! save is tagged with it so collaborators (and `watch`) can tell their own
//! writes from everyone else's.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Writer identity stored in `writer.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterIdentity {
    /// Persistent UUID for this writer.
    pub writer_id: String,
    /// Human-friendly label shown in the activity feed.
    pub label: String,
}

impl WriterIdentity {
    /// Tag stored alongside saves and activity entries.
    pub fn tag(&self) -> String {
        format!("{}@{}", self.label, short(&self.writer_id))
    }
}

fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Returns the path to writer.json in the XDG data directory.
pub fn writer_json_path() -> Result<PathBuf> {
    let data_dir = crate::config::dirs_data_path().context("could not determine data directory")?;
    Ok(data_dir.join("writer.json"))
}

/// Loads the writer identity, creating one on first use.
pub fn current_writer() -> Result<WriterIdentity> {
    init_writer(None)
}

/// Initializes writer identity.
///
/// If writer.json already exists, returns the existing identity
/// (updating the label if a new one is provided).
pub fn init_writer(label: Option<&str>) -> Result<WriterIdentity> {
    init_writer_at(&writer_json_path()?, label)
}

pub(crate) fn init_writer_at(path: &Path, label: Option<&str>) -> Result<WriterIdentity> {
    if let Some(mut existing) = load_from(path)? {
        if let Some(new_label) = label {
            existing.label = new_label.to_string();
            save_to(path, &existing)?;
        }
        return Ok(existing);
    }

    let default_label = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());
    let identity = WriterIdentity {
        writer_id: Uuid::new_v4().to_string(),
        label: label.unwrap_or(&default_label).to_string(),
    };
    save_to(path, &identity)?;
    tracing::debug!(writer_id = %identity.writer_id, "created writer identity");
    Ok(identity)
}

fn load_from(path: &Path) -> Result<Option<WriterIdentity>> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let identity: WriterIdentity =
                serde_json::from_str(&content).context("failed to parse writer.json")?;
            Ok(Some(identity))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).context("failed to read writer.json"),
    }
}

fn save_to(path: &Path, identity: &WriterIdentity) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("failed to create data directory")?;
    }
    let json = serde_json::to_string_pretty(identity).context("failed to serialize identity")?;
    std::fs::write(path, json).context("failed to write writer.json")?;
    Ok(())
}
