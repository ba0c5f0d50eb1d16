use serde::Serialize;

use super::domain::{EventConfig, ProgramRecord, REFUNDED_INSTALLMENT};

/// `offeringPresentation` value that enables installment accounting.
pub const INSTALLMENTS_PRESENTATION: &str = "installments";

const LIMITED_FEE_RETREATS: usize = 2;
const UNLIMITED_FEE_RETREATS: usize = 100;

/// Amounts owed and paid by one participant for one sub-event.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentSummary {
    pub total: f64,
    pub received: f64,
    pub due: f64,
    pub refunded: f64,
    pub deposit_made: bool,
    pub offering_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_payment_date: Option<String>,
}

/// Offering state used by the `offering`/`deposit` conditions and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferingStatus {
    pub deposit_made: bool,
    pub complete: bool,
}

/// Charges every selected retreat (up to the fee limit, in selection order)
/// and totals the installments recorded for `sub_event`.
///
/// Installments named `refunded` are reported separately and never count as
/// received. The last payment date is the `offeringTime` of the last received
/// installment in stored order.
pub fn compute_installments(
    program: &ProgramRecord,
    sub_event: Option<&str>,
    config: &EventConfig,
) -> InstallmentSummary {
    let limit = if program.limit_fee {
        LIMITED_FEE_RETREATS
    } else {
        UNLIMITED_FEE_RETREATS
    };

    let mut total = 0.0;
    let mut charged = 0;
    for (retreat, selected) in program.which_retreats.iter() {
        if charged >= limit {
            break;
        }
        if !*selected {
            continue;
        }
        if let Some(retreat_config) = config.which_retreats_config.get(retreat) {
            total += retreat_config.offering_total;
            charged += 1;
        }
    }

    let mut received = 0.0;
    let mut refunded = 0.0;
    let mut last_payment_date = None;
    if let Some(entry) = sub_event.and_then(|key| program.offering(key)) {
        for (name, installment) in entry.installments.iter() {
            if name == REFUNDED_INSTALLMENT {
                refunded += installment.offering_amount;
                continue;
            }
            received += installment.offering_amount;
            if let Some(time) = &installment.offering_time {
                last_payment_date = Some(time.clone());
            }
        }
    }

    let deposit_made = received > 0.0;
    InstallmentSummary {
        total,
        received,
        due: total - received,
        refunded,
        deposit_made,
        offering_complete: deposit_made && received >= total,
        last_payment_date,
    }
}

/// Whether the participant has paid for `sub_event`. `None` means there is
/// no offering history for it at all.
///
/// Outside installment mode any history entry counts as a complete offering.
pub fn offering_status(
    program: &ProgramRecord,
    sub_event: Option<&str>,
    config: &EventConfig,
) -> Option<OfferingStatus> {
    let key = sub_event?;
    program.offering(key)?;

    if !uses_installments(config) {
        return Some(OfferingStatus {
            deposit_made: true,
            complete: true,
        });
    }

    let summary = compute_installments(program, Some(key), config);
    Some(OfferingStatus {
        deposit_made: summary.deposit_made,
        complete: summary.offering_complete,
    })
}

pub fn uses_installments(config: &EventConfig) -> bool {
    config.offering_presentation.as_deref() == Some(INSTALLMENTS_PRESENTATION)
}
