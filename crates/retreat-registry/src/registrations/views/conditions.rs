use super::super::domain::{Condition, Participant};
use super::context::ViewContext;

/// True when `participant` satisfies every condition. An empty list matches
/// everyone.
pub fn matches(
    participant: &Participant,
    conditions: &[Condition],
    context: &ViewContext<'_>,
) -> bool {
    conditions
        .iter()
        .all(|condition| condition_holds(condition, participant, context))
}

pub fn condition_holds(
    condition: &Condition,
    participant: &Participant,
    context: &ViewContext<'_>,
) -> bool {
    match condition {
        Condition::CurrentAidBool {
            bool_name,
            bool_value,
        } => {
            let actual = context
                .program(participant)
                .is_some_and(|program| program.flag(bool_name));
            actual == *bool_value
        }
        Condition::CurrentAidMapBool {
            map,
            bool_name,
            bool_value,
        } => {
            let actual = context
                .program(participant)
                .and_then(|program| program.map_flag(map, bool_name))
                .unwrap_or(false);
            actual == *bool_value
        }
        Condition::BaseBool {
            bool_name,
            bool_value,
        } => participant.flag(bool_name) == *bool_value,
        Condition::PracticeBool {
            bool_name,
            bool_value,
        } => participant.practice_flag(bool_name) == *bool_value,
        Condition::PoolMember { pool, bool_value } => {
            context.evaluator().is_eligible(pool, participant) == *bool_value
        }
        Condition::Offering {
            sub_event,
            bool_value,
        } => match context.offering_status(participant, sub_event.as_deref()) {
            Some(status) => status.complete == *bool_value,
            None => !*bool_value,
        },
        Condition::Deposit {
            sub_event,
            bool_value,
        } => match context.offering_status(participant, sub_event.as_deref()) {
            Some(status) => status.deposit_made == *bool_value,
            None => !*bool_value,
        },
        Condition::SpokenLanguage {
            string_value,
            bool_value,
        } => (participant.spoken_language() == string_value) == *bool_value,
        Condition::WrittenLanguage {
            string_value,
            bool_value,
        } => (participant.written_language() == string_value) == *bool_value,
        Condition::Unknown => true,
    }
}
