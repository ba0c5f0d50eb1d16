mod registry;
mod rules;

pub use registry::PoolRegistry;

use std::collections::HashSet;

use tracing::debug;

use super::domain::Participant;

/// Stateless evaluator resolving pool membership in the context of one event.
///
/// Unknown pools and missing program records evaluate to `false`. A pool that
/// is reached again while it is still being resolved is also `false`, which
/// keeps cyclic pool graphs terminating.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityEvaluator<'a> {
    registry: &'a PoolRegistry,
    current_aid: &'a str,
}

impl<'a> EligibilityEvaluator<'a> {
    pub fn new(registry: &'a PoolRegistry, current_aid: &'a str) -> Self {
        Self {
            registry,
            current_aid,
        }
    }

    pub fn current_aid(&self) -> &'a str {
        self.current_aid
    }

    pub fn is_eligible(&self, pool_name: &str, participant: &Participant) -> bool {
        let mut resolving = HashSet::new();
        self.resolve(pool_name, participant, &mut resolving)
    }

    pub(crate) fn resolve(
        &self,
        pool_name: &str,
        participant: &Participant,
        resolving: &mut HashSet<String>,
    ) -> bool {
        let Some(pool) = self.registry.get(pool_name) else {
            debug!(pool = pool_name, "unknown pool treated as ineligible");
            return false;
        };

        if !resolving.insert(pool_name.to_string()) {
            debug!(
                pool = pool_name,
                participant = %participant.id,
                "pool reference cycle treated as ineligible"
            );
            return false;
        }

        let eligible = pool
            .attributes
            .iter()
            .any(|attribute| rules::attribute_holds(self, attribute, participant, resolving));

        resolving.remove(pool_name);
        eligible
    }
}

/// Convenience wrapper for one-off membership checks.
pub fn is_eligible(
    pool_name: &str,
    participant: &Participant,
    current_aid: &str,
    registry: &PoolRegistry,
) -> bool {
    EligibilityEvaluator::new(registry, current_aid).is_eligible(pool_name, participant)
}
