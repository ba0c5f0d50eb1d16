use metrics_exporter_prometheus::PrometheusHandle;
use retreat_registry::config::AppConfig;
use retreat_registry::error::AppError;
use retreat_registry::registrations::{RegistrySnapshot, SnapshotError};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the registry snapshot at `path`, or the built-in demo registry when
/// no path is configured.
pub(crate) fn load_snapshot(path: Option<&Path>) -> Result<RegistrySnapshot, AppError> {
    match path {
        Some(path) => Ok(RegistrySnapshot::from_path(path)?),
        None => {
            info!("no registry snapshot configured, serving the demo registry");
            Ok(demo_snapshot()?)
        }
    }
}

/// Snapshot path for one-shot CLI commands: the explicit flag wins over
/// `APP_SNAPSHOT_PATH`.
pub(crate) fn snapshot_path(explicit: Option<PathBuf>) -> Result<Option<PathBuf>, AppError> {
    match explicit {
        Some(path) => Ok(Some(path)),
        None => Ok(AppConfig::load()?.data.snapshot_path),
    }
}

pub(crate) const DEMO_AID: &str = "sw2025";

/// Small registry with one summer retreat, a handful of pools and two
/// dashboard views.
pub(crate) fn demo_snapshot() -> Result<RegistrySnapshot, SnapshotError> {
    let snapshot = serde_json::from_value(json!({
        "events": [
            {
                "aid": DEMO_AID,
                "name": "Summer Retreat 2025",
                "config": {
                    "pool": "sw2025-eligible",
                    "whichRetreatsConfig": {
                        "week1": { "offeringTotal": 400 },
                        "week2": { "offeringTotal": 400 },
                        "weekend": { "offeringTotal": 150 }
                    },
                    "offeringPresentation": "installments",
                    "dashboardViews": {
                        "registrations": "sw2025-registrations",
                        "finance": "sw2025-finance"
                    }
                },
                "subEvents": { "retreat": { "date": "2025-07-05" } }
            },
            {
                "aid": "sw2024",
                "name": "Summer Retreat 2024",
                "config": { "pool": "everyone" },
                "subEvents": { "retreat": { "date": "2024-07-06" } }
            }
        ],
        "pools": [
            { "name": "everyone", "attributes": [{ "type": "true" }] },
            {
                "name": "sw2024-alumni",
                "description": "attended the 2024 summer retreat",
                "attributes": [{ "type": "attended", "aid": "sw2024" }]
            },
            {
                "name": "sw2025-eligible",
                "description": "alumni, manual inclusions, and anyone who joined",
                "attributes": [
                    { "type": "pool", "name": "sw2024-alumni" },
                    { "type": "currenteventmanualinclude" },
                    { "type": "currenteventjoin" }
                ]
            },
            {
                "name": "sw2025-paid",
                "attributes": [{ "type": "currenteventoffering", "subevent": "retreat" }]
            },
            { "name": "volunteers", "attributes": [{ "type": "practice", "field": "volunteer" }] },
            {
                "name": "sw2025-newcomers",
                "attributes": [{ "type": "pooldiff", "inpool": "sw2025-eligible", "outpool": "sw2024-alumni" }]
            }
        ],
        "views": [
            {
                "name": "sw2025-registrations",
                "columnDefs": [
                    { "name": "name" },
                    { "name": "email" },
                    { "name": "spokenLanguage" },
                    { "name": "retreats-currentAIDMapList", "headerName": "Retreats", "map": "whichRetreats" },
                    { "name": "volunteer-poolMember", "headerName": "Volunteer", "pool": "volunteers" },
                    { "name": "deposit" }
                ],
                "viewConditions": [
                    { "name": "currentAIDBool", "boolName": "join" },
                    { "name": "currentAIDBool", "boolName": "withdrawn", "boolValue": false }
                ]
            },
            {
                "name": "sw2025-finance",
                "columnDefs": [
                    { "name": "name" },
                    { "name": "installmentsTotal" },
                    { "name": "installmentsReceived" },
                    { "name": "installmentsDue" },
                    { "name": "installmentsRefunded" },
                    { "name": "lastPayment" }
                ],
                "viewConditions": [{ "name": "deposit" }]
            }
        ],
        "participants": [
            {
                "id": "p-001",
                "first": "Tenzin",
                "last": "Dolma",
                "email": "tenzin@example.org",
                "spokenLangPref": "Tibetan",
                "practice": { "volunteer": true },
                "programs": {
                    "sw2024": { "join": true, "attended": true, "oath": true },
                    DEMO_AID: {
                        "join": true,
                        "limitFee": true,
                        "whichRetreats": { "weekend": true, "week2": true, "week1": true },
                        "offeringHistory": {
                            "retreat": {
                                "offeringSKU": "sw2025-retreat",
                                "installments": {
                                    "deposit": { "offeringAmount": 200, "offeringTime": "2025-02-10T18:00:00Z" },
                                    "second": { "offeringAmount": 200, "offeringTime": "2025-04-10T18:00:00Z" },
                                    "refunded": { "offeringAmount": 50, "offeringTime": "2025-05-01T09:00:00Z" }
                                }
                            }
                        }
                    }
                }
            },
            {
                "id": "p-002",
                "first": "Maria",
                "last": "Lopez",
                "email": "maria.lopez@example.org",
                "spokenLangPref": "Spanish",
                "writtenLangPref": "Spanish",
                "spokenTranslate": true,
                "programs": {
                    DEMO_AID: {
                        "join": true,
                        "whichRetreats": { "week1": true },
                        "offeringHistory": {
                            "retreat": {
                                "offeringSKU": "sw2025-retreat",
                                "installments": {
                                    "full": { "offeringAmount": 400, "offeringTime": "2025-03-03" }
                                }
                            }
                        }
                    }
                }
            },
            {
                "id": "p-003",
                "first": "Sam",
                "last": "Okafor",
                "email": "sam@example.org",
                "programs": {
                    DEMO_AID: { "join": true, "withdrawn": true, "whichRetreats": { "week1": true } }
                }
            },
            {
                "id": "p-004",
                "first": "Lee",
                "last": "Park",
                "email": "lee@example.org",
                "programs": { "sw2024": { "attended": true } }
            }
        ]
    }))?;
    Ok(snapshot)
}
