use std::collections::HashSet;

use super::super::domain::{Participant, PoolAttribute, ProgramRecord};
use super::EligibilityEvaluator;

pub(super) fn attribute_holds(
    evaluator: &EligibilityEvaluator<'_>,
    attribute: &PoolAttribute,
    participant: &Participant,
    resolving: &mut HashSet<String>,
) -> bool {
    let current = participant.program(evaluator.current_aid());
    let mut member = |pool: &str| evaluator.resolve(pool, participant, resolving);

    match attribute {
        PoolAttribute::True => true,
        PoolAttribute::Pool { name } => member(name.as_str()),
        PoolAttribute::PoolDiff { inpool, outpool } => {
            member(inpool.as_str()) && !member(outpool.as_str())
        }
        PoolAttribute::PoolAnd { pool1, pool2 } => {
            member(pool1.as_str()) && member(pool2.as_str())
        }
        PoolAttribute::Practice { field } => participant.practice_flag(field),
        PoolAttribute::Offering { aid, subevent } => {
            offering_made(participant.program(aid), subevent)
        }
        PoolAttribute::CurrentEventOffering { subevent } => current.is_some_and(|program| {
            program.offering(subevent).is_some_and(|entry| entry.has_sku()) && !program.withdrawn
        }),
        PoolAttribute::CurrentEventTest => flag(current, |program| program.test),
        PoolAttribute::CurrentEventNotOffering { subevent } => !offering_made(current, subevent),
        PoolAttribute::OfferingAndPools {
            aid,
            subevent,
            pools,
        } => {
            offering_made(participant.program(aid), subevent)
                && pools.iter().any(|pool| member(pool.as_str()))
        }
        PoolAttribute::Oath { aid } => flag(participant.program(aid), |program| program.oath),
        PoolAttribute::Attended { aid } => {
            flag(participant.program(aid), |program| program.attended)
        }
        PoolAttribute::Join { aid } => flag(participant.program(aid), |program| program.join),
        PoolAttribute::CurrentEventJoin => flag(current, |program| program.join),
        PoolAttribute::CurrentEventManualInclude => {
            flag(current, |program| program.manual_include)
        }
        PoolAttribute::CurrentEventAccepted => {
            flag(current, |program| program.accepted && !program.withdrawn)
        }
        PoolAttribute::CurrentEventNotJoin => !flag(current, |program| program.join),
        PoolAttribute::JoinWhich { aid, retreat } => flag(participant.program(aid), |program| {
            program.is_active() && program.selected_retreat_with_prefix(retreat)
        }),
        PoolAttribute::OfferingWhich {
            aid,
            retreat,
            subevent,
        } => flag(participant.program(aid), |program| {
            program.is_active()
                && program.selected_retreat_with_prefix(retreat)
                && program.has_offering_with_prefix(subevent)
        }),
        PoolAttribute::Eligible => flag(current, |program| program.eligible),
        PoolAttribute::Unknown => false,
    }
}

fn flag(program: Option<&ProgramRecord>, test: impl FnOnce(&ProgramRecord) -> bool) -> bool {
    program.is_some_and(test)
}

fn offering_made(program: Option<&ProgramRecord>, sub_event: &str) -> bool {
    program.is_some_and(|program| program.has_offering(sub_event))
}
