use std::collections::BTreeMap;

use super::cache::{CacheError, ParticipantCache};
use super::domain::{Event, ParticipantChange};
use super::eligibility::{EligibilityEvaluator, PoolRegistry};
use super::offering::{compute_installments, InstallmentSummary};
use super::snapshot::RegistrySnapshot;
use super::views::{ViewCatalog, ViewEngine, ViewError, ViewOutput, ViewRequest};

/// Service composing the registry catalogs, the participant cache, and the
/// view engine.
pub struct RegistrationService {
    pools: PoolRegistry,
    events: BTreeMap<String, Event>,
    views: ViewCatalog,
    participants: ParticipantCache,
}

impl RegistrationService {
    pub fn new(snapshot: RegistrySnapshot) -> Self {
        let pools = snapshot.pool_registry();
        let events = snapshot.event_index();
        let views = snapshot.view_catalog();
        let participants = ParticipantCache::new(snapshot.participants);

        Self {
            pools,
            events,
            views,
            participants,
        }
    }

    pub fn pools(&self) -> &PoolRegistry {
        &self.pools
    }

    pub fn views(&self) -> &ViewCatalog {
        &self.views
    }

    pub fn participants(&self) -> &ParticipantCache {
        &self.participants
    }

    pub fn event(&self, aid: &str) -> Option<&Event> {
        self.events.get(aid)
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    /// Pool membership for a cached participant in the context of `aid`.
    pub fn is_eligible(
        &self,
        pool: &str,
        participant_id: &str,
        aid: &str,
    ) -> Result<bool, RegistrationServiceError> {
        let participant = self
            .participants
            .get(participant_id)
            .ok_or_else(|| {
                RegistrationServiceError::UnknownParticipant(participant_id.to_string())
            })?;
        Ok(EligibilityEvaluator::new(&self.pools, aid).is_eligible(pool, &participant))
    }

    /// Ids of every cached participant eligible for `pool`.
    pub fn pool_members(&self, pool: &str, aid: &str) -> Vec<String> {
        let evaluator = EligibilityEvaluator::new(&self.pools, aid);
        self.participants
            .snapshot()
            .iter()
            .filter(|participant| evaluator.is_eligible(pool, participant))
            .map(|participant| participant.id.clone())
            .collect()
    }

    /// Renders a view over the current participant snapshot.
    pub fn evaluate_view(
        &self,
        view_key: &str,
        request: &ViewRequest,
    ) -> Result<ViewOutput, RegistrationServiceError> {
        let snapshot = self.participants.snapshot();
        let engine = ViewEngine::new(&self.pools, &self.events, &self.views);
        let output = engine.evaluate(
            view_key,
            snapshot.iter().map(|participant| participant.as_ref()),
            request,
        )?;
        Ok(output)
    }

    /// Installment accounting for one participant. Without a sub-event the
    /// event's first sub-event is used.
    pub fn installments(
        &self,
        participant_id: &str,
        aid: &str,
        sub_event: Option<&str>,
    ) -> Result<InstallmentSummary, RegistrationServiceError> {
        let event = self
            .events
            .get(aid)
            .ok_or_else(|| RegistrationServiceError::UnknownEvent(aid.to_string()))?;
        let participant = self
            .participants
            .get(participant_id)
            .ok_or_else(|| {
                RegistrationServiceError::UnknownParticipant(participant_id.to_string())
            })?;
        let program = participant.program(aid).ok_or_else(|| {
            RegistrationServiceError::MissingProgram {
                participant_id: participant_id.to_string(),
                aid: aid.to_string(),
            }
        })?;

        let sub_event = event.resolve_sub_event(sub_event);
        Ok(compute_installments(program, sub_event.as_deref(), &event.config))
    }

    /// Merges a partial update from the change feed into the cache.
    pub fn apply_change(&self, change: &ParticipantChange) -> Result<(), RegistrationServiceError> {
        self.participants.apply(change)?;
        Ok(())
    }
}

/// Error raised by the registration service.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationServiceError {
    #[error("participant `{0}` not found")]
    UnknownParticipant(String),
    #[error("event `{0}` not found")]
    UnknownEvent(String),
    #[error("participant `{participant_id}` has no program for `{aid}`")]
    MissingProgram { participant_id: String, aid: String },
    #[error(transparent)]
    View(#[from] ViewError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}
