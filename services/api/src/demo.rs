use crate::infra::{demo_snapshot, load_snapshot, snapshot_path, DEMO_AID};
use clap::Args;
use retreat_registry::error::AppError;
use retreat_registry::registrations::{
    ParticipantChange, RegistrationService, ViewOutput, ViewRequest,
};
use serde_json::json;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct EligibilityArgs {
    /// Pool to evaluate
    #[arg(long)]
    pub(crate) pool: String,
    /// Participant id
    #[arg(long)]
    pub(crate) participant: String,
    /// Event code the pool is evaluated for
    #[arg(long)]
    pub(crate) aid: String,
    /// Registry snapshot (JSON). Defaults to APP_SNAPSHOT_PATH or the demo registry.
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ViewArgs {
    /// Dashboard key or concrete view name
    #[arg(long)]
    pub(crate) view: String,
    /// Event code
    #[arg(long)]
    pub(crate) aid: String,
    /// Sub-event for offering columns (defaults to the event's first sub-event)
    #[arg(long)]
    pub(crate) sub_event: Option<String>,
    /// Case-insensitive name or email filter
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Print the rendered view as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
    /// Registry snapshot (JSON). Defaults to APP_SNAPSHOT_PATH or the demo registry.
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Include hidden columns in the rendered tables.
    #[arg(long)]
    pub(crate) show_hidden: bool,
}

fn service_from(snapshot: Option<PathBuf>) -> Result<RegistrationService, AppError> {
    let path = snapshot_path(snapshot)?;
    let snapshot = load_snapshot(path.as_deref())?;
    Ok(RegistrationService::new(snapshot))
}

pub(crate) fn run_eligibility(args: EligibilityArgs) -> Result<(), AppError> {
    let EligibilityArgs {
        pool,
        participant,
        aid,
        snapshot,
    } = args;

    let service = service_from(snapshot)?;
    let eligible = service.is_eligible(&pool, &participant, &aid)?;
    println!("{participant} in {pool} for {aid}: {eligible}");
    Ok(())
}

pub(crate) fn run_view(args: ViewArgs) -> Result<(), AppError> {
    let ViewArgs {
        view,
        aid,
        sub_event,
        search,
        json,
        snapshot,
    } = args;

    let service = service_from(snapshot)?;
    let mut request = ViewRequest::for_event(aid);
    request.sub_event = sub_event;
    request.search = search;

    let output = service.evaluate_view(&view, &request)?;
    if json {
        match serde_json::to_string_pretty(&output) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => println!("View payload unavailable: {err}"),
        }
    } else {
        print!("{}", render_view_table(&output, false));
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = RegistrationService::new(demo_snapshot()?);
    let request = ViewRequest::for_event(DEMO_AID);

    println!("Retreat registry demo ({DEMO_AID})");

    println!("\nPools");
    for pool in service.pools().names() {
        let members = service.pool_members(pool, DEMO_AID);
        println!("- {pool}: {} member(s) [{}]", members.len(), members.join(", "));
    }

    println!("\nRegistrations view");
    let registrations = service.evaluate_view("registrations", &request)?;
    print!("{}", render_view_table(&registrations, args.show_hidden));

    println!("\nFinance view");
    let finance = service.evaluate_view("finance", &request)?;
    print!("{}", render_view_table(&finance, args.show_hidden));

    let summary = service.installments("p-001", DEMO_AID, None)?;
    println!(
        "\nInstallments for p-001: total {:.2} | received {:.2} | due {:.2} | refunded {:.2}",
        summary.total, summary.received, summary.due, summary.refunded
    );

    println!("\nChange feed: p-003 rejoins after withdrawing");
    let mut changed_fields = serde_json::Map::new();
    changed_fields.insert(
        "programs".to_string(),
        json!({ DEMO_AID: { "withdrawn": false } }),
    );
    let change = ParticipantChange {
        participant_id: "p-003".to_string(),
        changed_fields,
    };
    service.apply_change(&change)?;
    let registrations = service.evaluate_view("registrations", &request)?;
    print!("{}", render_view_table(&registrations, args.show_hidden));

    Ok(())
}

/// Aligned plain-text rendering of a view, one line per row.
pub(crate) fn render_view_table(output: &ViewOutput, show_hidden: bool) -> String {
    let shown: Vec<usize> = output
        .columns
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, column)| show_hidden || !column.hidden)
        .map(|(index, _)| index)
        .collect();

    let headers: Vec<String> = shown
        .iter()
        .map(|&index| output.columns.columns()[index].header.clone())
        .collect();
    let rows: Vec<Vec<String>> = output
        .rows
        .iter()
        .map(|row| {
            shown
                .iter()
                .map(|&index| {
                    row.values
                        .get(index)
                        .map(ToString::to_string)
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(position, header)| {
            rows.iter()
                .map(|row| row[position].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut rendered = String::new();
    rendered.push_str(&format_line(&headers, &widths));
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    rendered.push_str(&format_line(&rule, &widths));
    for row in &rows {
        rendered.push_str(&format_line(row, &widths));
    }
    rendered.push_str(&format!("({} row(s))\n", output.rows.len()));
    rendered
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    format!("{}\n", line.trim_end())
}
