mod columns;
mod conditions;
mod context;

pub use columns::{
    compile_column, project, CellValue, ColumnKind, ColumnPlan, CompiledColumn, PredefinedColumn,
};
pub use conditions::{condition_holds, matches};
pub use context::ViewContext;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{Condition, CurrentEvent, Event, Participant, View};
use super::eligibility::PoolRegistry;

/// Every view keyed by its concrete name.
#[derive(Debug, Clone, Default)]
pub struct ViewCatalog {
    views: BTreeMap<String, View>,
}

impl ViewCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, view: View) -> Option<View> {
        self.views.insert(view.name.clone(), view)
    }

    pub fn get(&self, name: &str) -> Option<&View> {
        self.views.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl FromIterator<View> for ViewCatalog {
    fn from_iter<I: IntoIterator<Item = View>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for view in iter {
            catalog.insert(view);
        }
        catalog
    }
}

/// Screen-level parameters for rendering a view.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRequest {
    pub aid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ViewRequest {
    pub fn for_event(aid: impl Into<String>) -> Self {
        Self {
            aid: aid.into(),
            ..Self::default()
        }
    }

    pub fn with_sub_event(mut self, sub_event: impl Into<String>) -> Self {
        self.sub_event = Some(sub_event.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

impl From<CurrentEvent> for ViewRequest {
    fn from(current: CurrentEvent) -> Self {
        Self {
            aid: current.aid,
            sub_event: current.sub_event,
            search: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRow {
    pub participant_id: String,
    pub values: Vec<CellValue>,
}

/// Rendered view: the compiled columns and one row per visible participant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewOutput {
    pub view: String,
    pub aid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_event: Option<String>,
    pub columns: ColumnPlan,
    pub rows: Vec<ViewRow>,
}

impl ViewOutput {
    pub fn column_index(&self, field: &str) -> Option<usize> {
        self.columns
            .columns()
            .iter()
            .position(|column| column.field == field)
    }

    /// Value of `field` in the row for `participant_id`.
    pub fn cell(&self, participant_id: &str, field: &str) -> Option<&CellValue> {
        let index = self.column_index(field)?;
        self.rows
            .iter()
            .find(|row| row.participant_id == participant_id)
            .and_then(|row| row.values.get(index))
    }

    pub fn participant_ids(&self) -> Vec<&str> {
        self.rows
            .iter()
            .map(|row| row.participant_id.as_str())
            .collect()
    }
}

/// Error raised when a screen asks for a view that cannot be resolved.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("event `{0}` not found")]
    UnknownEvent(String),
    #[error("view `{requested}` not found (resolved to `{resolved}`)")]
    UnknownView { requested: String, resolved: String },
}

/// Runs the view pipeline: event pool gate, view conditions, free-text
/// search, then column projection.
#[derive(Debug, Clone, Copy)]
pub struct ViewEngine<'a> {
    pools: &'a PoolRegistry,
    events: &'a BTreeMap<String, Event>,
    views: &'a ViewCatalog,
}

impl<'a> ViewEngine<'a> {
    pub fn new(
        pools: &'a PoolRegistry,
        events: &'a BTreeMap<String, Event>,
        views: &'a ViewCatalog,
    ) -> Self {
        Self {
            pools,
            events,
            views,
        }
    }

    /// `view_key` is first translated through the event's dashboard views,
    /// then used as a concrete view name.
    pub fn evaluate<'p, I>(
        &self,
        view_key: &str,
        participants: I,
        request: &ViewRequest,
    ) -> Result<ViewOutput, ViewError>
    where
        I: IntoIterator<Item = &'p Participant>,
    {
        let event = self
            .events
            .get(&request.aid)
            .ok_or_else(|| ViewError::UnknownEvent(request.aid.clone()))?;

        let view_name = event.view_name(view_key);
        let view = self
            .views
            .get(view_name)
            .ok_or_else(|| ViewError::UnknownView {
                requested: view_key.to_string(),
                resolved: view_name.to_string(),
            })?;

        let ignored = view
            .view_conditions
            .iter()
            .filter(|condition| matches!(condition, Condition::Unknown))
            .count();
        if ignored > 0 {
            warn!(view = %view.name, ignored, "unknown view conditions ignored");
        }

        let context = ViewContext::new(self.pools, event, request.sub_event.as_deref());
        let evaluator = context.evaluator();
        let plan = ColumnPlan::compile(&view.column_defs);
        let search = request
            .search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_lowercase);

        let rows: Vec<ViewRow> = participants
            .into_iter()
            .filter(|participant| match event.config.pool.as_deref() {
                Some(pool) => evaluator.is_eligible(pool, participant),
                None => true,
            })
            .filter(|participant| matches(participant, &view.view_conditions, &context))
            .filter(|participant| {
                search
                    .as_deref()
                    .map_or(true, |needle| matches_search(participant, needle))
            })
            .map(|participant| ViewRow {
                participant_id: participant.id.clone(),
                values: plan.project(participant, &context),
            })
            .collect();

        debug!(
            view = %view.name,
            aid = %event.aid,
            rows = rows.len(),
            columns = plan.len(),
            "view evaluated"
        );

        Ok(ViewOutput {
            view: view.name.clone(),
            aid: event.aid.clone(),
            sub_event: context.sub_event().map(str::to_string),
            columns: plan,
            rows,
        })
    }
}

/// Case-insensitive substring match on full name or email. `needle` must
/// already be lowercase.
pub fn matches_search(participant: &Participant, needle: &str) -> bool {
    participant.full_name().to_lowercase().contains(needle)
        || participant.email.to_lowercase().contains(needle)
}
