use super::common::*;
use serde_json::json;

use crate::registrations::domain::EventConfig;
use crate::registrations::offering::{compute_installments, offering_status, OfferingStatus};

fn config() -> EventConfig {
    event().config
}

#[test]
fn fee_limit_caps_charged_retreats_at_two() {
    let program = program(json!({
        "limitFee": true,
        "whichRetreats": { "r1": true, "r2": true, "r3": true },
        "offeringHistory": {
            "retreat": {
                "offeringSKU": "sw2025-retreat",
                "installments": { "deposit": { "offeringAmount": 100 } }
            }
        }
    }));

    let summary = compute_installments(&program, Some(SUB_EVENT), &config());

    assert_eq!(summary.total, 250.0);
    assert_eq!(summary.received, 100.0);
    assert_eq!(summary.due, 150.0);
    assert!(summary.deposit_made);
    assert!(!summary.offering_complete);
}

#[test]
fn retreats_are_charged_in_selection_order() {
    let program = program(json!({
        "limitFee": true,
        "whichRetreats": { "r3": true, "r1": true, "r2": true }
    }));

    let summary = compute_installments(&program, Some(SUB_EVENT), &config());

    assert_eq!(summary.total, 300.0);
}

#[test]
fn unlimited_fee_charges_every_selected_retreat() {
    let program = program(json!({
        "whichRetreats": { "r1": true, "r2": false, "r3": true, "unpriced": true }
    }));

    let summary = compute_installments(&program, Some(SUB_EVENT), &config());

    assert_eq!(summary.total, 300.0);
    assert_eq!(summary.received, 0.0);
    assert_eq!(summary.due, 300.0);
    assert!(!summary.deposit_made);
    assert!(!summary.offering_complete);
    assert_eq!(summary.last_payment_date, None);
}

#[test]
fn unpriced_retreats_do_not_use_up_the_fee_limit() {
    let program = program(json!({
        "limitFee": true,
        "whichRetreats": { "unpriced": true, "r1": true, "r2": true }
    }));

    let summary = compute_installments(&program, Some(SUB_EVENT), &config());

    assert_eq!(summary.total, 250.0);
}

#[test]
fn refunds_are_reported_apart_from_received() {
    let program = program(json!({
        "whichRetreats": { "r1": true },
        "offeringHistory": {
            "retreat": {
                "offeringSKU": "sku",
                "installments": {
                    "deposit": { "offeringAmount": 60, "offeringTime": "2025-02-01T09:00:00Z" },
                    "refunded": { "offeringAmount": 20, "offeringTime": "2025-06-01T09:00:00Z" },
                    "second": { "offeringAmount": 40, "offeringTime": "2025-04-15" }
                }
            }
        }
    }));

    let summary = compute_installments(&program, Some(SUB_EVENT), &config());

    assert_eq!(summary.received, 100.0);
    assert_eq!(summary.refunded, 20.0);
    assert_eq!(summary.due, 0.0);
    assert!(summary.offering_complete);
    assert_eq!(summary.last_payment_date.as_deref(), Some("2025-04-15"));
}

#[test]
fn last_payment_follows_stored_order() {
    let program = program(json!({
        "whichRetreats": { "r2": true },
        "offeringHistory": {
            "retreat": {
                "installments": {
                    "late": { "offeringAmount": 50, "offeringTime": "2025-05-20T12:00:00+02:00" },
                    "early": { "offeringAmount": 50, "offeringTime": "2025-01-03T08:30:00" },
                    "untimed": { "offeringAmount": 10 },
                    "refunded": { "offeringAmount": 5, "offeringTime": "2025-06-01" }
                }
            }
        }
    }));

    let summary = compute_installments(&program, Some(SUB_EVENT), &config());

    assert_eq!(summary.received, 110.0);
    assert_eq!(summary.refunded, 5.0);
    assert_eq!(summary.due, 40.0);
    assert_eq!(
        summary.last_payment_date.as_deref(),
        Some("2025-01-03T08:30:00")
    );
}

#[test]
fn overpayment_leaves_negative_balance() {
    let program = program(json!({
        "whichRetreats": { "r1": true },
        "offeringHistory": {
            "retreat": { "installments": { "full": { "offeringAmount": 130 } } }
        }
    }));

    let summary = compute_installments(&program, Some(SUB_EVENT), &config());

    assert_eq!(summary.due, -30.0);
    assert!(summary.offering_complete);
}

#[test]
fn other_sub_event_installments_are_ignored() {
    let program = program(json!({
        "whichRetreats": { "r1": true },
        "offeringHistory": {
            "weekend": { "installments": { "deposit": { "offeringAmount": 100 } } }
        }
    }));

    let summary = compute_installments(&program, Some(SUB_EVENT), &config());
    assert_eq!(summary.received, 0.0);

    let without_sub_event = compute_installments(&program, None, &config());
    assert_eq!(without_sub_event.received, 0.0);
    assert_eq!(without_sub_event.total, 100.0);
}

#[test]
fn computation_is_idempotent() {
    let people = participants();
    let program = people[0].program(AID).expect("ada has a program");
    let config = config();

    let first = compute_installments(program, Some(SUB_EVENT), &config);
    let second = compute_installments(program, Some(SUB_EVENT), &config);

    assert_eq!(first, second);
    assert_eq!(first.total, 250.0);
    assert_eq!(first.received, 100.0);
    assert_eq!(
        first.last_payment_date.as_deref(),
        Some("2025-03-01T10:00:00Z")
    );
}

#[test]
fn status_without_history_is_absent() {
    let program = program(json!({ "join": true, "whichRetreats": { "r1": true } }));

    assert_eq!(offering_status(&program, Some(SUB_EVENT), &config()), None);
    assert_eq!(offering_status(&program, None, &config()), None);
}

#[test]
fn status_in_installment_mode_follows_the_accounting() {
    let people = participants();
    let program = people[0].program(AID).expect("ada has a program");

    assert_eq!(
        offering_status(program, Some(SUB_EVENT), &config()),
        Some(OfferingStatus {
            deposit_made: true,
            complete: false,
        })
    );
}

#[test]
fn status_outside_installment_mode_counts_any_entry_as_paid() {
    let mut config = config();
    config.offering_presentation = None;
    let program = program(json!({
        "whichRetreats": { "r1": true },
        "offeringHistory": { "retreat": { "offeringSKU": "sku" } }
    }));

    assert_eq!(
        offering_status(&program, Some(SUB_EVENT), &config),
        Some(OfferingStatus {
            deposit_made: true,
            complete: true,
        })
    );
}
