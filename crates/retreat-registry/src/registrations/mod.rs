//! Retreat registration core: pool eligibility, offering accounting, and
//! data-driven participant views.
//!
//! Pools, events, and views arrive as fully materialised data. Evaluation is
//! synchronous and side-effect free; the participant cache is the only
//! mutable state and is updated through whole-record swaps.

pub mod cache;
mod decode;
pub mod domain;
pub mod eligibility;
pub mod offering;
pub mod router;
pub mod service;
pub mod snapshot;
pub mod views;

#[cfg(test)]
mod tests;

pub use cache::{deep_merge, CacheError, ParticipantCache};
pub use domain::{
    ColumnDef, Condition, CurrentEvent, Event, EventConfig, Installment, OfferingEntry,
    Participant, ParticipantChange, Pool, PoolAttribute, ProgramRecord, RetreatConfig,
    SubEvent, View,
};
pub use eligibility::{is_eligible, EligibilityEvaluator, PoolRegistry};
pub use offering::{compute_installments, offering_status, InstallmentSummary, OfferingStatus};
pub use router::registration_router;
pub use service::{RegistrationService, RegistrationServiceError};
pub use snapshot::{RegistrySnapshot, SnapshotError};
pub use views::{
    CellValue, ColumnKind, ColumnPlan, CompiledColumn, PredefinedColumn, ViewCatalog,
    ViewContext, ViewEngine, ViewError, ViewOutput, ViewRequest, ViewRow,
};
