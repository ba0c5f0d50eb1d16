use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::decode;
use super::domain::{Event, Participant, Pool, View};
use super::eligibility::PoolRegistry;
use super::views::ViewCatalog;

/// Fully materialised registry collections as handed over by the data layer.
///
/// Records that do not decode are skipped with a warning; the rest of the
/// snapshot still loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    #[serde(default, deserialize_with = "decode::skip_malformed")]
    pub participants: Vec<Participant>,
    #[serde(default, deserialize_with = "decode::skip_malformed")]
    pub events: Vec<Event>,
    #[serde(default, deserialize_with = "decode::skip_malformed")]
    pub pools: Vec<Pool>,
    #[serde(default, deserialize_with = "decode::skip_malformed")]
    pub views: Vec<View>,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read registry snapshot {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid registry snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

impl RegistrySnapshot {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_reader(reader)?;
        info!(
            participants = snapshot.participants.len(),
            events = snapshot.events.len(),
            pools = snapshot.pools.len(),
            views = snapshot.views.len(),
            "registry snapshot loaded"
        );
        Ok(snapshot)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn pool_registry(&self) -> PoolRegistry {
        self.pools.iter().cloned().collect()
    }

    pub fn view_catalog(&self) -> ViewCatalog {
        self.views.iter().cloned().collect()
    }

    pub fn event_index(&self) -> BTreeMap<String, Event> {
        self.events
            .iter()
            .map(|event| (event.aid.clone(), event.clone()))
            .collect()
    }
}
