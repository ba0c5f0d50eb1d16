use super::common::*;
use serde_json::{json, Map, Value};

use crate::registrations::cache::{deep_merge, CacheError, ParticipantCache};
use crate::registrations::domain::ParticipantChange;

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(fields) => fields,
        other => panic!("expected object, got {other}"),
    }
}

fn change(participant_id: &str, value: Value) -> ParticipantChange {
    ParticipantChange {
        participant_id: participant_id.to_string(),
        changed_fields: fields(value),
    }
}

#[test]
fn deep_merge_recurses_into_objects() {
    let mut target = json!({
        "first": "Ada",
        "programs": { "sw2025": { "join": true, "whichRetreats": { "r1": true } } }
    });

    deep_merge(
        &mut target,
        &fields(json!({ "programs": { "sw2025": { "withdrawn": true } } })),
    );

    assert_eq!(
        target,
        json!({
            "first": "Ada",
            "programs": {
                "sw2025": { "join": true, "withdrawn": true, "whichRetreats": { "r1": true } }
            }
        })
    );
}

#[test]
fn deep_merge_replaces_scalars_and_arrays() {
    let mut target = json!({ "tags": ["a", "b"], "email": "old@example.org", "nested": 4 });

    deep_merge(
        &mut target,
        &fields(json!({ "tags": ["c"], "email": "new@example.org", "nested": { "x": 1 } })),
    );

    assert_eq!(
        target,
        json!({ "tags": ["c"], "email": "new@example.org", "nested": { "x": 1 } })
    );
}

#[test]
fn apply_merges_partial_program_update() {
    let cache = ParticipantCache::new(participants());

    let merged = cache
        .apply(&change(
            "p-ada",
            json!({ "programs": { AID: { "withdrawn": true } } }),
        ))
        .expect("change merges");

    let program = merged.program(AID).expect("program kept");
    assert!(program.join);
    assert!(program.withdrawn);
    assert!(program.has_offering(SUB_EVENT));
    assert_eq!(
        program.which_retreats.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["r1", "r2"]
    );
    assert_eq!(merged.first, "Ada");
}

#[test]
fn apply_creates_unknown_participants() {
    let cache = ParticipantCache::new(participants());

    let created = cache
        .apply(&change(
            "p-new",
            json!({ "id": "spoofed", "first": "Barbara", "last": "Liskov" }),
        ))
        .expect("new participant");

    assert_eq!(created.id, "p-new");
    assert_eq!(cache.len(), 5);
    assert_eq!(
        cache.get("p-new").map(|participant| participant.full_name()),
        Some("Barbara Liskov".to_string())
    );
    assert!(cache.get("spoofed").is_none());
}

#[test]
fn invalid_change_keeps_previous_record() {
    let cache = ParticipantCache::new(participants());
    let before = cache.get("p-ada").expect("cached");

    let error = cache
        .apply(&change("p-ada", json!({ "programs": "closed" })))
        .expect_err("programs must be a map");

    assert!(matches!(error, CacheError::Decode { ref participant_id, .. } if participant_id == "p-ada"));
    assert_eq!(cache.get("p-ada"), Some(before));
}

#[test]
fn null_and_loose_values_merge_by_truthiness() {
    let cache = ParticipantCache::new(participants());

    let merged = cache
        .apply(&change(
            "p-grace",
            json!({ "programs": { AID: { "withdrawn": null, "accepted": 1 } } }),
        ))
        .expect("change merges");

    let program = merged.program(AID).expect("program kept");
    assert!(!program.withdrawn);
    assert!(program.accepted);
    assert!(program.join);
}

#[test]
fn earlier_snapshots_are_not_mutated() {
    let cache = ParticipantCache::new(participants());
    let snapshot = cache.snapshot();

    cache
        .apply(&change("p-grace", json!({ "email": "grace@navy.mil" })))
        .expect("change merges");

    let stale = snapshot
        .iter()
        .find(|participant| participant.id == "p-grace")
        .expect("grace in snapshot");
    assert_eq!(stale.email, "grace@example.org");
    assert_eq!(
        cache.get("p-grace").map(|participant| participant.email.clone()),
        Some("grace@navy.mil".to_string())
    );
}

#[test]
fn unknown_fields_survive_merges() {
    let cache = ParticipantCache::new(participants());

    cache
        .apply(&change("p-ken", json!({ "city": "Berkeley" })))
        .expect("change merges");
    let merged = cache
        .apply(&change("p-ken", json!({ "unsubscribe": true })))
        .expect("change merges");

    assert!(merged.unsubscribe);
    assert_eq!(merged.text("city").as_deref(), Some("Berkeley"));
}

#[test]
fn merges_keep_retreat_selection_order() {
    let selective = with_program(
        participant("p-sel", "Sel", "Ective"),
        AID,
        json!({ "limitFee": true, "whichRetreats": { "r3": true, "r1": true, "r2": true } }),
    );
    let cache = ParticipantCache::new([selective]);

    let merged = cache
        .apply(&change("p-sel", json!({ "programs": { AID: { "join": true } } })))
        .expect("change merges");

    let program = merged.program(AID).expect("program kept");
    assert_eq!(
        program.which_retreats.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["r3", "r1", "r2"]
    );
}
