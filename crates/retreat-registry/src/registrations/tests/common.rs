use std::collections::BTreeMap;
use std::sync::Arc;

use axum::response::Response;
use serde_json::{json, Value};

use crate::registrations::domain::{Event, Participant, Pool, ProgramRecord, View};
use crate::registrations::eligibility::PoolRegistry;
use crate::registrations::snapshot::RegistrySnapshot;
use crate::registrations::views::{ViewCatalog, ViewContext};
use crate::registrations::{registration_router, RegistrationService};

pub(super) const AID: &str = "sw2025";
pub(super) const SUB_EVENT: &str = "retreat";

pub(super) fn participant(id: &str, first: &str, last: &str) -> Participant {
    Participant {
        id: id.to_string(),
        first: first.to_string(),
        last: last.to_string(),
        email: format!("{}@example.org", first.to_lowercase()),
        ..Participant::default()
    }
}

pub(super) fn program(value: Value) -> ProgramRecord {
    serde_json::from_value(value).expect("valid program record")
}

pub(super) fn with_program(mut participant: Participant, aid: &str, value: Value) -> Participant {
    participant.programs.insert(aid.to_string(), program(value));
    participant
}

pub(super) fn event() -> Event {
    serde_json::from_value(json!({
        "aid": AID,
        "name": "Summer Retreat 2025",
        "config": {
            "pool": "sw2025-eligible",
            "whichRetreatsConfig": {
                "r1": { "offeringTotal": 100 },
                "r2": { "offeringTotal": 150 },
                "r3": { "offeringTotal": 200 }
            },
            "offeringPresentation": "installments",
            "dashboardViews": { "registrations": "sw2025-registrations" }
        },
        "subEvents": {
            "retreat": { "date": "2025-07-01" }
        }
    }))
    .expect("valid event")
}

pub(super) fn pools() -> Vec<Pool> {
    serde_json::from_value(json!([
        { "name": "everyone", "attributes": [{ "type": "true" }] },
        { "name": "joined-sw2025", "attributes": [{ "type": "currenteventjoin" }] },
        {
            "name": "sw2025-eligible",
            "description": "joined or manually included",
            "attributes": [
                { "type": "pool", "name": "joined-sw2025" },
                { "type": "currenteventmanualinclude" }
            ]
        },
        { "name": "staff", "attributes": [{ "type": "practice", "field": "staff" }] },
        {
            "name": "joined-not-staff",
            "attributes": [{ "type": "pooldiff", "inpool": "joined-sw2025", "outpool": "staff" }]
        },
        {
            "name": "joined-staff",
            "attributes": [{ "type": "pooland", "pool1": "joined-sw2025", "pool2": "staff" }]
        },
        { "name": "cycle-a", "attributes": [{ "type": "pool", "name": "cycle-b" }] },
        { "name": "cycle-b", "attributes": [{ "type": "pool", "name": "cycle-a" }] },
        {
            "name": "dangling",
            "attributes": [{ "type": "pooldiff", "inpool": "missing", "outpool": "staff" }]
        }
    ]))
    .expect("valid pools")
}

pub(super) fn registry() -> PoolRegistry {
    pools().into_iter().collect()
}

pub(super) fn registry_with(extra: Value) -> PoolRegistry {
    let extra: Vec<Pool> = serde_json::from_value(extra).expect("valid pools");
    pools().into_iter().chain(extra).collect()
}

pub(super) fn registrations_view() -> View {
    serde_json::from_value(json!({
        "name": "sw2025-registrations",
        "columnDefs": [
            { "name": "name" },
            { "name": "email" },
            { "name": "installmentsTotal" },
            { "name": "installmentsReceived" },
            { "name": "installmentsDue" },
            { "name": "deposit" },
            { "name": "staff-poolMember", "headerName": "Staff", "pool": "staff" },
            { "name": "retreats-currentAIDMapList", "map": "whichRetreats" }
        ],
        "viewConditions": [
            { "name": "currentAIDBool", "boolName": "withdrawn", "boolValue": false }
        ]
    }))
    .expect("valid view")
}

pub(super) fn views() -> ViewCatalog {
    [registrations_view()].into_iter().collect()
}

pub(super) fn events() -> BTreeMap<String, Event> {
    let event = event();
    BTreeMap::from([(event.aid.clone(), event)])
}

/// Ada joined with a deposit, Grace joined and withdrew, Linus never joined
/// but is manually included, Ken has no program at all.
pub(super) fn participants() -> Vec<Participant> {
    let mut ada = with_program(
        participant("p-ada", "Ada", "Lovelace"),
        AID,
        json!({
            "join": true,
            "accepted": true,
            "whichRetreats": { "r1": true, "r2": true },
            "offeringHistory": {
                "retreat": {
                    "offeringSKU": "sw2025-retreat",
                    "installments": {
                        "deposit": { "offeringAmount": 100, "offeringTime": "2025-03-01T10:00:00Z" }
                    }
                }
            }
        }),
    );
    ada.practice.insert("staff".to_string(), json!(true));

    let grace = with_program(
        participant("p-grace", "Grace", "Hopper"),
        AID,
        json!({ "join": true, "withdrawn": true, "whichRetreats": { "r1": true } }),
    );

    let linus = with_program(
        participant("p-linus", "Linus", "Torvalds"),
        AID,
        json!({ "manualInclude": true, "whichRetreats": { "r3": true } }),
    );

    let ken = participant("p-ken", "Ken", "Thompson");

    vec![ada, grace, linus, ken]
}

pub(super) fn snapshot() -> RegistrySnapshot {
    RegistrySnapshot {
        participants: participants(),
        events: vec![event()],
        pools: pools(),
        views: vec![registrations_view()],
    }
}

pub(super) fn service() -> Arc<RegistrationService> {
    Arc::new(RegistrationService::new(snapshot()))
}

pub(super) fn router() -> axum::Router {
    registration_router(service())
}

pub(super) fn context<'a>(registry: &'a PoolRegistry, event: &'a Event) -> ViewContext<'a> {
    ViewContext::new(registry, event, None)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
