use std::fmt;

use serde::Serialize;
use tracing::warn;

use super::super::domain::{ColumnDef, Participant, ProgramRecord, ANY_SUB_EVENT};
use super::super::offering::InstallmentSummary;
use super::context::ViewContext;

/// Kind markers, in the priority order they are checked against a column
/// name. The first marker contained in the name wins.
const MARKERS: [(&str, Marker); 14] = [
    ("poolMember", Marker::PoolMember),
    ("currentAIDBool", Marker::CurrentAidBool),
    ("specifiedAIDBool", Marker::SpecifiedAidBool),
    ("currentAIDMapBool", Marker::CurrentAidMapBool),
    ("currentAIDMapList", Marker::CurrentAidMapList),
    ("specifiedAIDMapBool", Marker::SpecifiedAidMapBool),
    ("currentAIDString", Marker::CurrentAidString),
    ("specifiedAIDString", Marker::SpecifiedAidString),
    ("currentAIDNumber", Marker::CurrentAidNumber),
    ("specifiedAIDNumber", Marker::SpecifiedAidNumber),
    ("baseBool", Marker::BaseBool),
    ("baseString", Marker::BaseString),
    ("practiceBool", Marker::PracticeBool),
    ("offeringCount", Marker::OfferingCount),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    PoolMember,
    CurrentAidBool,
    SpecifiedAidBool,
    CurrentAidMapBool,
    CurrentAidMapList,
    SpecifiedAidMapBool,
    CurrentAidString,
    SpecifiedAidString,
    CurrentAidNumber,
    SpecifiedAidNumber,
    BaseBool,
    BaseString,
    PracticeBool,
    OfferingCount,
}

/// Columns addressable by plain name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PredefinedColumn {
    Id,
    Name,
    First,
    Last,
    Email,
    Accepted,
    Withdrawn,
    Join,
    Attended,
    Allow,
    Oath,
    Eligible,
    ManualInclude,
    Test,
    LimitFee,
    Offering,
    Deposit,
    InstallmentsTotal,
    InstallmentsReceived,
    InstallmentsDue,
    InstallmentsRefunded,
    LastPayment,
    SpokenLanguage,
    WrittenLanguage,
    Owyaa,
    History,
}

impl PredefinedColumn {
    pub const ALL: [Self; 26] = [
        Self::Id,
        Self::Name,
        Self::First,
        Self::Last,
        Self::Email,
        Self::Accepted,
        Self::Withdrawn,
        Self::Join,
        Self::Attended,
        Self::Allow,
        Self::Oath,
        Self::Eligible,
        Self::ManualInclude,
        Self::Test,
        Self::LimitFee,
        Self::Offering,
        Self::Deposit,
        Self::InstallmentsTotal,
        Self::InstallmentsReceived,
        Self::InstallmentsDue,
        Self::InstallmentsRefunded,
        Self::LastPayment,
        Self::SpokenLanguage,
        Self::WrittenLanguage,
        Self::Owyaa,
        Self::History,
    ];

    pub const fn field(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::First => "first",
            Self::Last => "last",
            Self::Email => "email",
            Self::Accepted => "accepted",
            Self::Withdrawn => "withdrawn",
            Self::Join => "join",
            Self::Attended => "attended",
            Self::Allow => "allow",
            Self::Oath => "oath",
            Self::Eligible => "eligible",
            Self::ManualInclude => "manualInclude",
            Self::Test => "test",
            Self::LimitFee => "limitFee",
            Self::Offering => "offering",
            Self::Deposit => "deposit",
            Self::InstallmentsTotal => "installmentsTotal",
            Self::InstallmentsReceived => "installmentsReceived",
            Self::InstallmentsDue => "installmentsDue",
            Self::InstallmentsRefunded => "installmentsRefunded",
            Self::LastPayment => "lastPayment",
            Self::SpokenLanguage => "spokenLanguage",
            Self::WrittenLanguage => "writtenLanguage",
            Self::Owyaa => "owyaa",
            Self::History => "history",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Name => "Name",
            Self::First => "First",
            Self::Last => "Last",
            Self::Email => "Email",
            Self::Accepted => "Accepted",
            Self::Withdrawn => "Withdrawn",
            Self::Join => "Joined",
            Self::Attended => "Attended",
            Self::Allow => "Allowed",
            Self::Oath => "Oath",
            Self::Eligible => "Eligible",
            Self::ManualInclude => "Manual Include",
            Self::Test => "Test",
            Self::LimitFee => "Limit Fee",
            Self::Offering => "Offering",
            Self::Deposit => "Deposit",
            Self::InstallmentsTotal => "Total",
            Self::InstallmentsReceived => "Received",
            Self::InstallmentsDue => "Balance Due",
            Self::InstallmentsRefunded => "Refunded",
            Self::LastPayment => "Last Payment",
            Self::SpokenLanguage => "Spoken Language",
            Self::WrittenLanguage => "Written Language",
            Self::Owyaa => "OWYAA",
            Self::History => "History",
        }
    }

    pub fn from_field(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.field() == name)
    }
}

/// Typed column plan entry; each kind carries only the parameters it reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ColumnKind {
    PoolMember { pool: String },
    CurrentAidBool { bool_name: String },
    SpecifiedAidBool { aid: String, bool_name: String },
    CurrentAidMapBool { map: String, bool_name: String },
    CurrentAidMapList { map: String },
    SpecifiedAidMapBool { aid: String, map: String, bool_name: String },
    CurrentAidString { string_name: String },
    SpecifiedAidString { aid: String, string_name: String },
    CurrentAidNumber { number_name: String },
    SpecifiedAidNumber { aid: String, number_name: String },
    BaseBool { bool_name: String },
    BaseString { string_name: String },
    PracticeBool { bool_name: String },
    OfferingCount,
    Predefined { column: PredefinedColumn },
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledColumn {
    pub field: String,
    pub header: String,
    pub hidden: bool,
    pub kind: ColumnKind,
}

impl CompiledColumn {
    fn predefined(column: PredefinedColumn, hidden: bool) -> Self {
        Self {
            field: column.field().to_string(),
            header: column.label().to_string(),
            hidden,
            kind: ColumnKind::Predefined { column },
        }
    }
}

/// Compiled columns of a view, in display order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ColumnPlan {
    columns: Vec<CompiledColumn>,
}

impl ColumnPlan {
    /// Compiling never fails: names that resolve to nothing become
    /// `unknown: <name>` placeholder columns. Duplicate fields keep their
    /// first definition, and hidden `id`/`history` columns are appended
    /// unless the view already shows them.
    pub fn compile(defs: &[ColumnDef]) -> Self {
        let mut columns: Vec<CompiledColumn> = Vec::with_capacity(defs.len() + 2);
        for def in defs {
            if columns.iter().any(|column| column.field == def.name) {
                continue;
            }
            columns.push(compile_column(def));
        }

        for hidden in [PredefinedColumn::Id, PredefinedColumn::History] {
            if !columns.iter().any(|column| column.field == hidden.field()) {
                columns.push(CompiledColumn::predefined(hidden, true));
            }
        }

        Self { columns }
    }

    pub fn columns(&self) -> &[CompiledColumn] {
        &self.columns
    }

    pub fn visible(&self) -> impl Iterator<Item = &CompiledColumn> {
        self.columns.iter().filter(|column| !column.hidden)
    }

    /// Parameters recorded for a column, looked up by field name.
    pub fn metadata(&self, field: &str) -> Option<&ColumnKind> {
        self.columns
            .iter()
            .find(|column| column.field == field)
            .map(|column| &column.kind)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn project(&self, participant: &Participant, context: &ViewContext<'_>) -> Vec<CellValue> {
        project(participant, self, context)
    }
}

pub fn compile_column(def: &ColumnDef) -> CompiledColumn {
    let kind = parse_kind(def);
    let header = match &kind {
        ColumnKind::Unknown => {
            warn!(column = %def.name, "unresolvable column rendered as placeholder");
            format!("unknown: {}", def.name)
        }
        ColumnKind::Predefined { column } => def
            .header_name
            .clone()
            .unwrap_or_else(|| column.label().to_string()),
        _ => def.header_name.clone().unwrap_or_else(|| def.name.clone()),
    };

    CompiledColumn {
        field: def.name.clone(),
        header,
        hidden: def.hidden,
        kind,
    }
}

fn parse_kind(def: &ColumnDef) -> ColumnKind {
    let marker = MARKERS
        .iter()
        .find(|(marker, _)| def.name.contains(marker))
        .map(|(_, marker)| *marker);

    match marker {
        Some(marker) => marker_kind(marker, def).unwrap_or(ColumnKind::Unknown),
        None => PredefinedColumn::from_field(&def.name)
            .map(|column| ColumnKind::Predefined { column })
            .unwrap_or(ColumnKind::Unknown),
    }
}

fn marker_kind(marker: Marker, def: &ColumnDef) -> Option<ColumnKind> {
    let aid = || param(&def.aid);
    let map = || param(&def.map);
    let bool_name = || param(&def.bool_name).or_else(|| param(&def.field));
    let string_name = || param(&def.string_name).or_else(|| param(&def.field));
    let number_name = || param(&def.number_name).or_else(|| param(&def.field));

    let kind = match marker {
        Marker::PoolMember => ColumnKind::PoolMember {
            pool: param(&def.pool)?,
        },
        Marker::CurrentAidBool => ColumnKind::CurrentAidBool {
            bool_name: bool_name()?,
        },
        Marker::SpecifiedAidBool => ColumnKind::SpecifiedAidBool {
            aid: aid()?,
            bool_name: bool_name()?,
        },
        Marker::CurrentAidMapBool => ColumnKind::CurrentAidMapBool {
            map: map()?,
            bool_name: bool_name()?,
        },
        Marker::CurrentAidMapList => ColumnKind::CurrentAidMapList { map: map()? },
        Marker::SpecifiedAidMapBool => ColumnKind::SpecifiedAidMapBool {
            aid: aid()?,
            map: map()?,
            bool_name: bool_name()?,
        },
        Marker::CurrentAidString => ColumnKind::CurrentAidString {
            string_name: string_name()?,
        },
        Marker::SpecifiedAidString => ColumnKind::SpecifiedAidString {
            aid: aid()?,
            string_name: string_name()?,
        },
        Marker::CurrentAidNumber => ColumnKind::CurrentAidNumber {
            number_name: number_name()?,
        },
        Marker::SpecifiedAidNumber => ColumnKind::SpecifiedAidNumber {
            aid: aid()?,
            number_name: number_name()?,
        },
        Marker::BaseBool => ColumnKind::BaseBool {
            bool_name: bool_name()?,
        },
        Marker::BaseString => ColumnKind::BaseString {
            string_name: string_name()?,
        },
        Marker::PracticeBool => ColumnKind::PracticeBool {
            bool_name: bool_name()?,
        },
        Marker::OfferingCount => ColumnKind::OfferingCount,
    };
    Some(kind)
}

fn param(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Rendered cell. Lookups that find nothing fall back to `false`, an empty
/// string, or `"unknown"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn unknown() -> Self {
        Self::Text("unknown".to_string())
    }

    pub fn empty() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Bool(flag) => write!(f, "{flag}"),
            CellValue::Number(number) if number.fract() == 0.0 => write!(f, "{number:.0}"),
            CellValue::Number(number) => write!(f, "{number:.2}"),
            CellValue::Text(text) => f.write_str(text),
        }
    }
}

/// Extracts one value per compiled column. Every column is resolved
/// independently, so a missing program or map only affects its own cell.
pub fn project(
    participant: &Participant,
    plan: &ColumnPlan,
    context: &ViewContext<'_>,
) -> Vec<CellValue> {
    plan.columns()
        .iter()
        .map(|column| extract(&column.kind, participant, context))
        .collect()
}

fn extract(kind: &ColumnKind, participant: &Participant, context: &ViewContext<'_>) -> CellValue {
    let current = context.program(participant);
    match kind {
        ColumnKind::PoolMember { pool } => {
            CellValue::Bool(context.evaluator().is_eligible(pool, participant))
        }
        ColumnKind::CurrentAidBool { bool_name } => program_flag(current, bool_name),
        ColumnKind::SpecifiedAidBool { aid, bool_name } => {
            program_flag(participant.program(aid), bool_name)
        }
        ColumnKind::CurrentAidMapBool { map, bool_name } => program_map_flag(current, map, bool_name),
        ColumnKind::CurrentAidMapList { map } => CellValue::Text(
            current
                .map(|program| program.map_keys(map).join(", "))
                .unwrap_or_default(),
        ),
        ColumnKind::SpecifiedAidMapBool {
            aid,
            map,
            bool_name,
        } => program_map_flag(participant.program(aid), map, bool_name),
        ColumnKind::CurrentAidString { string_name } => program_text(current, string_name),
        ColumnKind::SpecifiedAidString { aid, string_name } => {
            program_text(participant.program(aid), string_name)
        }
        ColumnKind::CurrentAidNumber { number_name } => program_number(current, number_name),
        ColumnKind::SpecifiedAidNumber { aid, number_name } => {
            program_number(participant.program(aid), number_name)
        }
        ColumnKind::BaseBool { bool_name } => CellValue::Bool(participant.flag(bool_name)),
        ColumnKind::BaseString { string_name } => {
            CellValue::Text(participant.text(string_name).unwrap_or_default())
        }
        ColumnKind::PracticeBool { bool_name } => {
            CellValue::Bool(participant.practice_flag(bool_name))
        }
        ColumnKind::OfferingCount => {
            let count = participant
                .programs
                .values()
                .filter(|program| program.has_offering(ANY_SUB_EVENT))
                .count();
            CellValue::Number(count as f64)
        }
        ColumnKind::Predefined { column } => predefined(*column, participant, context),
        ColumnKind::Unknown => CellValue::unknown(),
    }
}

fn predefined(
    column: PredefinedColumn,
    participant: &Participant,
    context: &ViewContext<'_>,
) -> CellValue {
    match column {
        PredefinedColumn::Id => CellValue::Text(participant.id.clone()),
        PredefinedColumn::Name => CellValue::Text(participant.full_name()),
        PredefinedColumn::First => CellValue::Text(participant.first.clone()),
        PredefinedColumn::Last => CellValue::Text(participant.last.clone()),
        PredefinedColumn::Email => CellValue::Text(participant.email.clone()),
        PredefinedColumn::Accepted
        | PredefinedColumn::Withdrawn
        | PredefinedColumn::Join
        | PredefinedColumn::Attended
        | PredefinedColumn::Allow
        | PredefinedColumn::Oath
        | PredefinedColumn::Eligible
        | PredefinedColumn::ManualInclude
        | PredefinedColumn::Test
        | PredefinedColumn::LimitFee
        | PredefinedColumn::Owyaa => program_flag(context.program(participant), column.field()),
        PredefinedColumn::Offering => CellValue::Bool(
            context
                .offering_status(participant, None)
                .is_some_and(|status| status.complete),
        ),
        PredefinedColumn::Deposit => CellValue::Bool(
            context
                .offering_status(participant, None)
                .is_some_and(|status| status.deposit_made),
        ),
        PredefinedColumn::InstallmentsTotal => amount(participant, context, |summary| summary.total),
        PredefinedColumn::InstallmentsReceived => {
            amount(participant, context, |summary| summary.received)
        }
        PredefinedColumn::InstallmentsDue => amount(participant, context, |summary| summary.due),
        PredefinedColumn::InstallmentsRefunded => {
            amount(participant, context, |summary| summary.refunded)
        }
        PredefinedColumn::LastPayment => CellValue::Text(
            context
                .installments(participant)
                .and_then(|summary| summary.last_payment_date)
                .unwrap_or_default(),
        ),
        PredefinedColumn::SpokenLanguage => {
            CellValue::Text(participant.spoken_language().to_string())
        }
        PredefinedColumn::WrittenLanguage => {
            CellValue::Text(participant.written_language().to_string())
        }
        PredefinedColumn::History => CellValue::Text(attended_history(participant)),
    }
}

fn program_flag(program: Option<&ProgramRecord>, name: &str) -> CellValue {
    CellValue::Bool(program.is_some_and(|program| program.flag(name)))
}

fn program_map_flag(program: Option<&ProgramRecord>, map: &str, key: &str) -> CellValue {
    CellValue::Bool(
        program
            .and_then(|program| program.map_flag(map, key))
            .unwrap_or(false),
    )
}

fn program_text(program: Option<&ProgramRecord>, name: &str) -> CellValue {
    CellValue::Text(
        program
            .and_then(|program| program.text(name))
            .unwrap_or_default(),
    )
}

fn program_number(program: Option<&ProgramRecord>, name: &str) -> CellValue {
    program
        .and_then(|program| program.number(name))
        .map(CellValue::Number)
        .unwrap_or_else(CellValue::empty)
}

fn amount(
    participant: &Participant,
    context: &ViewContext<'_>,
    pick: fn(&InstallmentSummary) -> f64,
) -> CellValue {
    context
        .installments(participant)
        .map(|summary| CellValue::Number(pick(&summary)))
        .unwrap_or_else(CellValue::unknown)
}

fn attended_history(participant: &Participant) -> String {
    participant
        .programs
        .iter()
        .filter(|(_, program)| program.attended)
        .map(|(aid, _)| aid.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
