use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::domain::{Participant, ParticipantChange};

/// Error raised when a change notification cannot be merged.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("participant `{participant_id}` could not be encoded: {source}")]
    Encode {
        participant_id: String,
        source: serde_json::Error,
    },
    #[error("merged record for participant `{participant_id}` is invalid: {source}")]
    Decode {
        participant_id: String,
        source: serde_json::Error,
    },
}

/// In-memory participant snapshot kept warm by the change feed.
///
/// Records are shared as `Arc`s. A merge builds a new record and swaps it in
/// under the write lock, so a pass holding earlier `Arc`s never sees a
/// partially merged participant.
#[derive(Debug, Default)]
pub struct ParticipantCache {
    records: RwLock<BTreeMap<String, Arc<Participant>>>,
}

impl ParticipantCache {
    pub fn new<I>(participants: I) -> Self
    where
        I: IntoIterator<Item = Participant>,
    {
        let records = participants
            .into_iter()
            .map(|participant| (participant.id.clone(), Arc::new(participant)))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    /// Current records, in id order.
    pub fn snapshot(&self) -> Vec<Arc<Participant>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn get(&self, participant_id: &str) -> Option<Arc<Participant>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(participant_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deep-merges `change` into the cached record (creating it when the id
    /// is new) and returns the merged participant. The id is never taken
    /// from the changed fields. A merge that does not decode leaves the
    /// cached record untouched.
    pub fn apply(&self, change: &ParticipantChange) -> Result<Arc<Participant>, CacheError> {
        let participant_id = &change.participant_id;
        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let mut document = match records.get(participant_id) {
            Some(existing) => {
                serde_json::to_value(existing.as_ref()).map_err(|source| CacheError::Encode {
                    participant_id: participant_id.clone(),
                    source,
                })?
            }
            None => Value::Object(Map::new()),
        };

        deep_merge(&mut document, &change.changed_fields);
        if let Some(fields) = document.as_object_mut() {
            fields.insert("id".to_string(), Value::String(participant_id.clone()));
        }

        let merged: Participant = serde_json::from_value(document).map_err(|source| {
            warn!(participant = %participant_id, error = %source, "rejected participant change");
            CacheError::Decode {
                participant_id: participant_id.clone(),
                source,
            }
        })?;

        let merged = Arc::new(merged);
        records.insert(participant_id.clone(), Arc::clone(&merged));
        debug!(
            participant = %participant_id,
            fields = change.changed_fields.len(),
            "participant change merged"
        );
        Ok(merged)
    }
}

/// Recursively merges `changes` into `target`. Objects merge key by key;
/// any other value (arrays included) replaces what was there.
pub fn deep_merge(target: &mut Value, changes: &Map<String, Value>) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }

    if let Value::Object(existing) = target {
        for (key, incoming) in changes {
            if let (Some(current), Value::Object(nested)) = (existing.get_mut(key), incoming) {
                if current.is_object() {
                    deep_merge(current, nested);
                    continue;
                }
            }
            existing.insert(key.clone(), incoming.clone());
        }
    }
}
