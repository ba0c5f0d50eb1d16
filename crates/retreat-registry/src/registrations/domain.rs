use std::collections::BTreeMap;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::decode;

/// Language assumed for participants who never stated a preference.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Program map addressed by the typed `whichRetreats` field.
pub const WHICH_RETREATS: &str = "whichRetreats";

/// Installment name that records money returned to the participant.
pub const REFUNDED_INSTALLMENT: &str = "refunded";

/// Sub-event wildcard accepted by offering rules.
pub const ANY_SUB_EVENT: &str = "any";

/// JSON truthiness: `null`, `false`, zero, and empty strings/collections are falsy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(entries) => !entries.is_empty(),
    }
}

pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub(crate) fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// A registered person together with their per-event program records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(deserialize_with = "decode::text")]
    pub id: String,
    #[serde(default, deserialize_with = "decode::text")]
    pub first: String,
    #[serde(default, deserialize_with = "decode::text")]
    pub last: String,
    #[serde(default, deserialize_with = "decode::text")]
    pub email: String,
    #[serde(default, deserialize_with = "decode::nullable")]
    pub programs: BTreeMap<String, ProgramRecord>,
    #[serde(default, deserialize_with = "decode::nullable")]
    pub practice: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "decode::text_map")]
    pub emails: BTreeMap<String, String>,
    #[serde(
        default,
        deserialize_with = "decode::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub spoken_lang_pref: Option<String>,
    #[serde(
        default,
        deserialize_with = "decode::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub written_lang_pref: Option<String>,
    #[serde(default, deserialize_with = "decode::flag")]
    pub spoken_translate: bool,
    #[serde(default, deserialize_with = "decode::flag")]
    pub unsubscribe: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Participant {
    pub fn program(&self, aid: &str) -> Option<&ProgramRecord> {
        self.programs.get(aid)
    }

    pub fn full_name(&self) -> String {
        match (self.first.trim(), self.last.trim()) {
            ("", last) => last.to_string(),
            (first, "") => first.to_string(),
            (first, last) => format!("{first} {last}"),
        }
    }

    /// Top-level field lookup by its stored (camelCase) name.
    pub fn value(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.clone())),
            "first" => Some(Value::String(self.first.clone())),
            "last" => Some(Value::String(self.last.clone())),
            "email" => Some(Value::String(self.email.clone())),
            "spokenLangPref" => self.spoken_lang_pref.clone().map(Value::String),
            "writtenLangPref" => self.written_lang_pref.clone().map(Value::String),
            "spokenTranslate" => Some(Value::Bool(self.spoken_translate)),
            "unsubscribe" => Some(Value::Bool(self.unsubscribe)),
            _ => self.extra.get(name).cloned(),
        }
    }

    pub fn flag(&self, name: &str) -> bool {
        self.value(name).as_ref().is_some_and(truthy)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.value(name).as_ref().and_then(value_text)
    }

    pub fn practice_flag(&self, name: &str) -> bool {
        self.practice.get(name).is_some_and(truthy)
    }

    pub fn spoken_language(&self) -> &str {
        match self.spoken_lang_pref.as_deref() {
            Some(language) if !language.is_empty() => language,
            _ => DEFAULT_LANGUAGE,
        }
    }

    /// Written material is only translated for participants who asked for
    /// translation; everyone else reads English.
    pub fn written_language(&self) -> &str {
        if !self.spoken_translate {
            return DEFAULT_LANGUAGE;
        }
        match self.written_lang_pref.as_deref() {
            Some(language) if !language.is_empty() && language != DEFAULT_LANGUAGE => language,
            _ => DEFAULT_LANGUAGE,
        }
    }
}

/// A participant's registration state for a single event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramRecord {
    #[serde(default, deserialize_with = "decode::flag")]
    pub join: bool,
    #[serde(default, deserialize_with = "decode::flag")]
    pub accepted: bool,
    #[serde(default, deserialize_with = "decode::flag")]
    pub withdrawn: bool,
    #[serde(default, deserialize_with = "decode::flag")]
    pub allow: bool,
    #[serde(default, deserialize_with = "decode::flag")]
    pub attended: bool,
    #[serde(default, deserialize_with = "decode::flag")]
    pub oath: bool,
    #[serde(default, deserialize_with = "decode::flag")]
    pub eligible: bool,
    #[serde(default, deserialize_with = "decode::flag")]
    pub manual_include: bool,
    #[serde(default, deserialize_with = "decode::flag")]
    pub test: bool,
    #[serde(default, deserialize_with = "decode::flag")]
    pub limit_fee: bool,
    #[serde(default, deserialize_with = "decode::flag")]
    pub owyaa: bool,
    #[serde(default, deserialize_with = "decode::flag_map")]
    pub which_retreats: IndexMap<String, bool>,
    #[serde(default, deserialize_with = "decode::nullable")]
    pub offering_history: BTreeMap<String, OfferingEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProgramRecord {
    /// Field lookup by stored name. Map-valued fields other than the extra
    /// bag are addressed through [`ProgramRecord::map_flag`].
    pub fn value(&self, name: &str) -> Option<Value> {
        let flag = match name {
            "join" => self.join,
            "accepted" => self.accepted,
            "withdrawn" => self.withdrawn,
            "allow" => self.allow,
            "attended" => self.attended,
            "oath" => self.oath,
            "eligible" => self.eligible,
            "manualInclude" => self.manual_include,
            "test" => self.test,
            "limitFee" => self.limit_fee,
            "owyaa" => self.owyaa,
            _ => return self.extra.get(name).cloned(),
        };
        Some(Value::Bool(flag))
    }

    pub fn flag(&self, name: &str) -> bool {
        self.value(name).as_ref().is_some_and(truthy)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.value(name).as_ref().and_then(value_text)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.value(name).as_ref().and_then(value_number)
    }

    pub fn map_flag(&self, map: &str, key: &str) -> Option<bool> {
        if map == WHICH_RETREATS {
            return self.which_retreats.get(key).copied();
        }
        self.extra
            .get(map)
            .and_then(Value::as_object)
            .and_then(|entries| entries.get(key))
            .map(truthy)
    }

    /// Keys of a flag map whose value is truthy, in stored order.
    pub fn map_keys(&self, map: &str) -> Vec<String> {
        if map == WHICH_RETREATS {
            return self
                .which_retreats
                .iter()
                .filter(|(_, selected)| **selected)
                .map(|(key, _)| key.to_string())
                .collect();
        }
        self.extra
            .get(map)
            .and_then(Value::as_object)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(_, value)| truthy(value))
                    .map(|(key, _)| key.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        self.join && !self.withdrawn
    }

    pub fn selected_retreat_with_prefix(&self, prefix: &str) -> bool {
        self.which_retreats
            .iter()
            .any(|(key, selected)| *selected && key.starts_with(prefix))
    }

    pub fn offering(&self, sub_event: &str) -> Option<&OfferingEntry> {
        self.offering_history.get(sub_event)
    }

    /// Whether an offering was made for `sub_event`, or for any sub-event
    /// when given [`ANY_SUB_EVENT`].
    pub fn has_offering(&self, sub_event: &str) -> bool {
        if sub_event == ANY_SUB_EVENT {
            return self.offering_history.values().any(OfferingEntry::has_sku);
        }
        self.offering(sub_event).is_some_and(OfferingEntry::has_sku)
    }

    pub fn has_offering_with_prefix(&self, prefix: &str) -> bool {
        self.offering_history
            .iter()
            .any(|(key, entry)| key.starts_with(prefix) && entry.has_sku())
    }
}

/// Offering record for one sub-event of a program.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferingEntry {
    #[serde(
        default,
        rename = "offeringSKU",
        deserialize_with = "decode::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub offering_sku: Option<String>,
    #[serde(
        default,
        deserialize_with = "decode::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub offering_time: Option<String>,
    #[serde(default, deserialize_with = "decode::nullable")]
    pub installments: IndexMap<String, Installment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OfferingEntry {
    pub fn has_sku(&self) -> bool {
        self.offering_sku
            .as_deref()
            .is_some_and(|sku| !sku.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    #[serde(default, deserialize_with = "decode::amount")]
    pub offering_amount: f64,
    #[serde(
        default,
        deserialize_with = "decode::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub offering_time: Option<String>,
}

/// A retreat or program the organization runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(deserialize_with = "decode::text")]
    pub aid: String,
    #[serde(default, deserialize_with = "decode::text")]
    pub name: String,
    #[serde(default, deserialize_with = "decode::nullable")]
    pub config: EventConfig,
    #[serde(default, deserialize_with = "decode::nullable")]
    pub sub_events: BTreeMap<String, SubEvent>,
}

impl Event {
    /// Requested sub-event, or the first configured one when none was chosen.
    pub fn resolve_sub_event(&self, requested: Option<&str>) -> Option<String> {
        match requested {
            Some(key) if !key.is_empty() => Some(key.to_string()),
            _ => self.sub_events.keys().next().cloned(),
        }
    }

    /// Translates a dashboard view key through `dashboardViews`, falling
    /// back to the key itself.
    pub fn view_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.config
            .dashboard_views
            .get(key)
            .map(String::as_str)
            .unwrap_or(key)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventConfig {
    #[serde(
        default,
        deserialize_with = "decode::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub pool: Option<String>,
    #[serde(default, deserialize_with = "decode::nullable")]
    pub which_retreats_config: BTreeMap<String, RetreatConfig>,
    #[serde(
        default,
        deserialize_with = "decode::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub offering_presentation: Option<String>,
    #[serde(default, deserialize_with = "decode::text_map")]
    pub dashboard_views: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetreatConfig {
    #[serde(default, deserialize_with = "decode::amount")]
    pub offering_total: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubEvent {
    #[serde(
        default,
        deserialize_with = "decode::optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Named eligibility rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    #[serde(deserialize_with = "decode::text")]
    pub name: String,
    #[serde(default, deserialize_with = "decode::text")]
    pub description: String,
    #[serde(default, deserialize_with = "decode::each_or_default")]
    pub attributes: Vec<PoolAttribute>,
}

/// One criterion of a pool. A participant belongs to the pool when any
/// criterion holds. Criteria missing their parameters decode as `Unknown`,
/// which never holds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PoolAttribute {
    True,
    Pool {
        name: String,
    },
    PoolDiff {
        inpool: String,
        outpool: String,
    },
    PoolAnd {
        pool1: String,
        pool2: String,
    },
    Practice {
        field: String,
    },
    Offering {
        aid: String,
        subevent: String,
    },
    CurrentEventOffering {
        subevent: String,
    },
    CurrentEventTest,
    CurrentEventNotOffering {
        subevent: String,
    },
    OfferingAndPools {
        aid: String,
        subevent: String,
        #[serde(default)]
        pools: Vec<String>,
    },
    Oath {
        aid: String,
    },
    Attended {
        aid: String,
    },
    Join {
        aid: String,
    },
    CurrentEventJoin,
    CurrentEventManualInclude,
    CurrentEventAccepted,
    CurrentEventNotJoin,
    JoinWhich {
        aid: String,
        retreat: String,
    },
    OfferingWhich {
        aid: String,
        retreat: String,
        subevent: String,
    },
    Eligible,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Declarative participant listing: which participants to show and which
/// computed columns to show for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    #[serde(deserialize_with = "decode::text")]
    pub name: String,
    #[serde(default, deserialize_with = "decode::skip_malformed")]
    pub column_defs: Vec<ColumnDef>,
    #[serde(default, deserialize_with = "decode::each_or_default")]
    pub view_conditions: Vec<Condition>,
}

/// Column definition as authored. `name` carries the kind marker; the
/// remaining fields are the parameters that kind needs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    #[serde(deserialize_with = "decode::text")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "decode::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub header_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "decode::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub pool: Option<String>,
    #[serde(
        default,
        deserialize_with = "decode::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub aid: Option<String>,
    #[serde(
        default,
        deserialize_with = "decode::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub map: Option<String>,
    #[serde(
        default,
        deserialize_with = "decode::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub bool_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "decode::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub string_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "decode::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub number_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "decode::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub field: Option<String>,
    #[serde(default, deserialize_with = "decode::flag")]
    pub hidden: bool,
}

impl ColumnDef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

fn default_true() -> bool {
    true
}

/// A single view filter. Views AND their conditions together. Filters
/// missing their parameters decode as `Unknown` and are ignored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum Condition {
    #[serde(rename = "currentAIDBool", rename_all = "camelCase")]
    CurrentAidBool {
        bool_name: String,
        #[serde(default = "default_true", deserialize_with = "decode::flag")]
        bool_value: bool,
    },
    #[serde(rename = "currentAIDMapBool", rename_all = "camelCase")]
    CurrentAidMapBool {
        map: String,
        bool_name: String,
        #[serde(default = "default_true", deserialize_with = "decode::flag")]
        bool_value: bool,
    },
    #[serde(rename = "baseBool", rename_all = "camelCase")]
    BaseBool {
        bool_name: String,
        #[serde(default = "default_true", deserialize_with = "decode::flag")]
        bool_value: bool,
    },
    #[serde(rename = "practiceBool", rename_all = "camelCase")]
    PracticeBool {
        bool_name: String,
        #[serde(default = "default_true", deserialize_with = "decode::flag")]
        bool_value: bool,
    },
    #[serde(rename = "poolMember", rename_all = "camelCase")]
    PoolMember {
        pool: String,
        #[serde(default = "default_true", deserialize_with = "decode::flag")]
        bool_value: bool,
    },
    #[serde(rename = "offering", rename_all = "camelCase")]
    Offering {
        #[serde(
            default,
            deserialize_with = "decode::optional_text",
            skip_serializing_if = "Option::is_none"
        )]
        sub_event: Option<String>,
        #[serde(default = "default_true", deserialize_with = "decode::flag")]
        bool_value: bool,
    },
    #[serde(rename = "deposit", rename_all = "camelCase")]
    Deposit {
        #[serde(
            default,
            deserialize_with = "decode::optional_text",
            skip_serializing_if = "Option::is_none"
        )]
        sub_event: Option<String>,
        #[serde(default = "default_true", deserialize_with = "decode::flag")]
        bool_value: bool,
    },
    #[serde(rename = "spokenLanguage", rename_all = "camelCase")]
    SpokenLanguage {
        string_value: String,
        #[serde(default = "default_true", deserialize_with = "decode::flag")]
        bool_value: bool,
    },
    #[serde(rename = "writtenLanguage", rename_all = "camelCase")]
    WrittenLanguage {
        string_value: String,
        #[serde(default = "default_true", deserialize_with = "decode::flag")]
        bool_value: bool,
    },
    #[default]
    #[serde(other)]
    Unknown,
}

/// Event (and optionally sub-event) selected by the surrounding session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentEvent {
    pub aid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_event: Option<String>,
}

impl CurrentEvent {
    pub fn new(aid: impl Into<String>) -> Self {
        Self {
            aid: aid.into(),
            sub_event: None,
        }
    }

    pub fn with_sub_event(mut self, sub_event: impl Into<String>) -> Self {
        self.sub_event = Some(sub_event.into());
        self
    }
}

/// Partial participant update delivered by the change feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantChange {
    pub participant_id: String,
    pub changed_fields: Map<String, Value>,
}
