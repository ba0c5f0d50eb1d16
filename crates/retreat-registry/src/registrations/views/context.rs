use super::super::domain::{Event, Participant, ProgramRecord};
use super::super::eligibility::{EligibilityEvaluator, PoolRegistry};
use super::super::offering::{
    compute_installments, offering_status, InstallmentSummary, OfferingStatus,
};

/// Everything a condition or column needs besides the participant: the
/// selected event, the effective sub-event, and the pool registry.
#[derive(Debug, Clone)]
pub struct ViewContext<'a> {
    pools: &'a PoolRegistry,
    event: &'a Event,
    sub_event: Option<String>,
}

impl<'a> ViewContext<'a> {
    pub fn new(pools: &'a PoolRegistry, event: &'a Event, sub_event: Option<&str>) -> Self {
        Self {
            pools,
            event,
            sub_event: event.resolve_sub_event(sub_event),
        }
    }

    pub fn event(&self) -> &'a Event {
        self.event
    }

    pub fn aid(&self) -> &'a str {
        &self.event.aid
    }

    pub fn sub_event(&self) -> Option<&str> {
        self.sub_event.as_deref()
    }

    pub fn evaluator(&self) -> EligibilityEvaluator<'a> {
        EligibilityEvaluator::new(self.pools, &self.event.aid)
    }

    pub fn program<'p>(&self, participant: &'p Participant) -> Option<&'p ProgramRecord> {
        participant.program(self.aid())
    }

    /// Offering status for an explicit sub-event, or the effective one.
    pub fn offering_status(
        &self,
        participant: &Participant,
        sub_event: Option<&str>,
    ) -> Option<OfferingStatus> {
        let program = self.program(participant)?;
        let key = sub_event.or(self.sub_event());
        offering_status(program, key, &self.event.config)
    }

    pub fn installments(&self, participant: &Participant) -> Option<InstallmentSummary> {
        let program = self.program(participant)?;
        Some(compute_installments(program, self.sub_event(), &self.event.config))
    }
}
