use crate::commands::incidents::incident_line;
use crate::commands::snapshot::{load_snapshot, Snapshot};
use crate::commands::{print_json, Context};
use crate::error::invalid_input;
use crate::util::{format_timestamp_time, or_dash, parse_status};
use anyhow::Result;
use calltree_config::{AppConfig, MAX_REFRESH_INTERVAL_SECS};
use calltree_core::dashboard::{
    parse_filter, sort_contacts, DashboardFilter, DashboardView, DemographicGroup, SortKey,
    StatusCount, StatusPreset,
};
use calltree_core::domain::format_phone_display;
use calltree_core::dto::IncidentDto;
use calltree_core::rules::ProjectedContact;
use clap::Args;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Args, Default)]
pub struct FilterArgs {
    /// Department to show (repeatable)
    #[arg(long = "dept", value_name = "DEPARTMENT")]
    pub departments: Vec<String>,
    /// Location to show (repeatable)
    #[arg(long = "loc", value_name = "LOCATION")]
    pub locations: Vec<String>,
    /// Level (or position when the roster has no levels) to show
    #[arg(long = "level")]
    pub levels: Vec<String>,
    /// Status to show (repeatable)
    #[arg(long = "status", value_name = "STATUS")]
    pub statuses: Vec<String>,
    /// Status preset: all|responded|safe|affected|pending
    #[arg(long = "is", value_name = "PRESET", conflicts_with = "statuses")]
    pub preset: Option<String>,
    /// Filter expression, e.g. `dept:IT loc:"Quezon City" is:affected`
    #[arg(long)]
    pub filter: Option<String>,
    /// Skip the configured default selection
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Args, Default)]
pub struct TableArgs {
    /// Narrow the responded and pending tables
    #[arg(long)]
    pub search: Option<String>,
    /// name|status|department|position|location|time
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long)]
    pub desc: bool,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    #[arg(long)]
    pub incident: Option<i64>,
    #[command(flatten)]
    pub filter: FilterArgs,
    #[command(flatten)]
    pub table: TableArgs,
    /// Keep refreshing until interrupted
    #[arg(long)]
    pub watch: bool,
    /// Seconds between refreshes; defaults to refresh_interval_secs
    #[arg(long, requires = "watch")]
    pub interval: Option<u64>,
    #[arg(long, hide = true, requires = "watch")]
    pub max_refreshes: Option<u64>,
}

/// The first load runs in the foreground; later loads happen quietly and a
/// failed one leaves the last good output in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    Foreground,
    Background,
}

#[derive(Debug, Serialize)]
pub struct Percentages {
    pub response_rate: u32,
    pub safe_of_responders: u32,
    pub severe_of_responders: u32,
    pub pending: u32,
}

#[derive(Debug, Serialize)]
pub struct DashboardReport {
    pub incident: IncidentDto,
    pub loaded_at: i64,
    pub percentages: Percentages,
    #[serde(flatten)]
    pub view: DashboardView,
}

impl DashboardReport {
    fn new(snapshot: &Snapshot, view: DashboardView) -> Self {
        let stats = &view.stats;
        Self {
            incident: IncidentDto::from_incident(&snapshot.incident, snapshot.loaded_at),
            loaded_at: snapshot.loaded_at,
            percentages: Percentages {
                response_rate: stats.response_rate_pct(),
                safe_of_responders: stats.safe_pct_of_responders(),
                severe_of_responders: stats.severe_pct_of_responders(),
                pending: stats.pending_pct(),
            },
            view,
        }
    }
}

/// Flags first, then configured defaults for the fields left open: the
/// departments that already have replies, and the default status preset.
/// `--all` skips the defaults.
pub fn resolve_filter(
    args: &FilterArgs,
    config: &AppConfig,
    contacts: &[ProjectedContact],
) -> Result<DashboardFilter> {
    let mut filter = match args.filter.as_deref() {
        Some(expr) => parse_filter(expr)?,
        None => DashboardFilter::default(),
    };
    push_unique(&mut filter.departments, &args.departments);
    push_unique(&mut filter.locations, &args.locations);
    push_unique(&mut filter.levels, &args.levels);
    for raw in &args.statuses {
        let status = parse_status(raw)?;
        if !filter.statuses.contains(&status) {
            filter.statuses.push(status);
        }
    }
    if let Some(preset) = args.preset.as_deref() {
        filter = filter.with_preset(StatusPreset::parse(preset)?);
    }

    if args.all {
        return Ok(filter);
    }
    if filter.departments.is_empty() && config.dashboard.default_department_filter {
        filter.departments = DashboardFilter::responded_departments(contacts).departments;
    }
    if filter.statuses.is_empty() {
        filter.statuses = config.dashboard.default_preset.statuses();
    }
    Ok(filter)
}

fn push_unique(target: &mut Vec<String>, values: &[String]) {
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !target.iter().any(|existing| existing == value) {
            target.push(value.to_string());
        }
    }
}

impl TableArgs {
    fn sort_key(&self) -> Result<Option<SortKey>> {
        self.sort
            .as_deref()
            .map(|raw| {
                SortKey::parse(raw)
                    .ok_or_else(|| invalid_input(format!("invalid sort key: {raw}")))
            })
            .transpose()
    }

    /// Responded rows default to newest reply first. Pending rows keep roster
    /// order unless a column other than time was picked.
    pub fn apply(&self, view: &mut DashboardView) -> Result<()> {
        match self.sort_key()? {
            None => sort_rows(&mut view.responded, SortKey::Time, true),
            Some(key) => {
                sort_rows(&mut view.responded, key, self.desc);
                if key != SortKey::Time {
                    sort_rows(&mut view.pending, key, self.desc);
                }
            }
        }
        Ok(())
    }
}

fn sort_rows(rows: &mut Vec<ProjectedContact>, key: SortKey, descending: bool) {
    let mut refs: Vec<&ProjectedContact> = rows.iter().collect();
    sort_contacts(&mut refs, key, descending);
    let sorted: Vec<ProjectedContact> = refs.into_iter().cloned().collect();
    *rows = sorted;
}

/// Loads, matches and projects one snapshot.
pub fn build_view(
    ctx: &Context<'_>,
    incident: Option<i64>,
    filter: &FilterArgs,
    table: &TableArgs,
) -> Result<(Snapshot, DashboardView)> {
    let snapshot = load_snapshot(ctx, incident)?;
    let filter = resolve_filter(filter, ctx.config, &snapshot.outcome.contacts)?;
    let mut view = DashboardView::build(&snapshot.outcome, &filter, table.search.as_deref());
    table.apply(&mut view)?;
    Ok((snapshot, view))
}

pub fn resolve_interval(interval: Option<u64>, config: &AppConfig) -> Result<u64> {
    let secs = interval.unwrap_or(config.refresh_interval_secs);
    if secs == 0 || secs > MAX_REFRESH_INTERVAL_SECS {
        return Err(invalid_input(format!(
            "invalid interval {secs}: expected 1..={MAX_REFRESH_INTERVAL_SECS} seconds"
        )));
    }
    Ok(secs)
}

pub fn dashboard(ctx: &Context<'_>, args: DashboardArgs) -> Result<()> {
    if !args.watch {
        return refresh(ctx, &args, RefreshMode::Foreground);
    }

    let interval = resolve_interval(args.interval, ctx.config)?;
    watch_loop(
        Duration::from_secs(interval),
        args.max_refreshes,
        |mode| refresh(ctx, &args, mode),
    )
}

/// Runs the first refresh in the foreground, then refreshes in the background
/// every `interval`. Only a foreground failure ends the loop; background
/// failures leave the last output in place.
fn watch_loop<F>(interval: Duration, max_refreshes: Option<u64>, mut refresh: F) -> Result<()>
where
    F: FnMut(RefreshMode) -> Result<()>,
{
    let mut mode = RefreshMode::Foreground;
    let mut refreshes = 0u64;
    loop {
        match refresh(mode) {
            Ok(()) => {}
            Err(err) if mode == RefreshMode::Background => {
                warn!(error = %format!("{err:#}"), "refresh failed, keeping previous dashboard");
            }
            Err(err) => return Err(err),
        }
        refreshes += 1;
        if max_refreshes.is_some_and(|max| refreshes >= max) {
            return Ok(());
        }
        mode = RefreshMode::Background;
        debug!(seconds = interval.as_secs(), "waiting for next refresh");
        thread::sleep(interval);
    }
}

fn refresh(ctx: &Context<'_>, args: &DashboardArgs, mode: RefreshMode) -> Result<()> {
    if mode == RefreshMode::Foreground && !ctx.json && io::stderr().is_terminal() {
        eprintln!("loading responses...");
    }
    let (snapshot, view) = build_view(ctx, args.incident, &args.filter, &args.table)?;
    let report = DashboardReport::new(&snapshot, view);
    debug!(
        incident = %report.incident.id,
        responded = report.view.stats.responded,
        pending = report.view.stats.pending,
        "dashboard refreshed"
    );

    if ctx.json {
        return print_json(&report);
    }
    if mode == RefreshMode::Background && io::stdout().is_terminal() {
        print!("\x1b[2J\x1b[H");
    }
    render_text(&report);
    io::stdout().flush()?;
    Ok(())
}

fn render_text(report: &DashboardReport) {
    let view = &report.view;
    let stats = &view.stats;
    let pct = &report.percentages;

    println!("{}", incident_line(&report.incident));
    println!("updated {}", format_timestamp_time(report.loaded_at));
    if !view.filter.is_empty() {
        println!("filter: {}", describe_filter(&view.filter));
    }
    println!();
    println!(
        "total {}  responded {} ({}%)  safe {} ({}%)  affected {}  severe {} ({}%)  pending {} ({}%)",
        stats.total,
        stats.responded,
        pct.response_rate,
        stats.safe,
        pct.safe_of_responders,
        stats.affected,
        stats.severe,
        pct.severe_of_responders,
        stats.pending,
        pct.pending,
    );

    println!();
    println!("Status");
    for entry in &view.status_breakdown {
        println!("  {:<12} {}", entry.status.as_str(), entry.count);
    }
    print_groups("Departments", &view.departments);
    print_groups("Locations", &view.locations);

    if let (Some(first), Some(last)) = (view.timeline.first(), view.timeline.last()) {
        println!();
        println!(
            "Timeline: {} replies from {} to {}",
            last.cumulative,
            format_timestamp_time(first.at),
            format_timestamp_time(last.at)
        );
    }

    println!();
    println!("Responded ({})", view.responded.len());
    for row in &view.responded {
        println!(
            "  {}  {}  {}  {}  {}  {}",
            row.response_at
                .map(format_timestamp_time)
                .unwrap_or_else(|| "-".to_string()),
            row.contact.name,
            row.status.as_str(),
            or_dash(&row.contact.department),
            or_dash(&row.contact.position),
            or_dash(&row.normalized_number),
        );
    }

    println!();
    println!("Pending ({})", view.pending.len());
    for row in &view.pending {
        println!(
            "  {}  {}  {}  {}",
            row.contact.name,
            or_dash(&row.contact.department),
            or_dash(&row.contact.position),
            format_phone_display(&row.contact.number),
        );
    }

    if !view.unknown.is_empty() {
        println!();
        println!("Unknown ({})", view.unknown.len());
        for response in &view.unknown {
            println!(
                "  {}  {}  {}",
                format_timestamp_time(response.received_at),
                response.sender,
                response.contents.replace('\n', " "),
            );
        }
    }
}

fn print_groups(title: &str, groups: &[DemographicGroup]) {
    if groups.is_empty() {
        return;
    }
    println!();
    println!("{title}");
    for group in groups {
        println!(
            "  {:<20} {:>4}  {}",
            group.name,
            group.total,
            describe_counts(&group.counts)
        );
    }
}

fn describe_counts(counts: &[StatusCount]) -> String {
    counts
        .iter()
        .map(|entry| format!("{} {}", entry.status.as_str(), entry.count))
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_filter(filter: &DashboardFilter) -> String {
    let mut parts = Vec::new();
    if !filter.departments.is_empty() {
        parts.push(format!("dept={}", filter.departments.join("|")));
    }
    if !filter.locations.is_empty() {
        parts.push(format!("loc={}", filter.locations.join("|")));
    }
    if !filter.levels.is_empty() {
        parts.push(format!("level={}", filter.levels.join("|")));
    }
    if !filter.statuses.is_empty() {
        let statuses: Vec<&str> = filter.statuses.iter().map(|s| s.as_str()).collect();
        parts.push(format!("status={}", statuses.join("|")));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use calltree_core::domain::{
        Contact, ContactId, RawResponse, ResponseId, ResponseOrigin, Status,
    };
    use calltree_core::rules::match_responses;

    fn contact(name: &str, number: &str, department: &str) -> Contact {
        Contact {
            id: ContactId::new(),
            name: name.to_string(),
            number: number.to_string(),
            department: department.to_string(),
            location: "Makati".to_string(),
            position: "Staff".to_string(),
            level: None,
        }
    }

    fn sms(sender: &str, contents: &str, received_at: i64) -> RawResponse {
        RawResponse {
            id: ResponseId::new(),
            uid: None,
            sender: sender.to_string(),
            contents: contents.to_string(),
            received_at,
            origin: ResponseOrigin::Sms,
        }
    }

    fn projected() -> Vec<ProjectedContact> {
        let roster = vec![
            contact("Ana Reyes", "09170000001", "HR"),
            contact("Ben Cruz", "09170000002", "IT"),
            contact("Cai Lim", "09170000003", "Ops"),
        ];
        let responses = vec![sms("09170000002", "4", 300), sms("09170000001", "1", 100)];
        match_responses(&roster, &responses).contacts
    }

    #[test]
    fn defaults_select_departments_with_replies() {
        let contacts = projected();
        let filter = resolve_filter(&FilterArgs::default(), &AppConfig::default(), &contacts)
            .expect("filter");
        assert_eq!(filter.departments, vec!["HR", "IT"]);
        assert!(filter.statuses.is_empty());
    }

    #[test]
    fn flags_and_all_override_defaults() {
        let contacts = projected();
        let args = FilterArgs {
            departments: vec!["Ops".to_string(), "Ops".to_string()],
            preset: Some("pending".to_string()),
            ..FilterArgs::default()
        };
        let filter = resolve_filter(&args, &AppConfig::default(), &contacts).expect("filter");
        assert_eq!(filter.departments, vec!["Ops"]);
        assert_eq!(filter.statuses, vec![Status::NoResponse]);

        let args = FilterArgs {
            all: true,
            ..FilterArgs::default()
        };
        let filter = resolve_filter(&args, &AppConfig::default(), &contacts).expect("filter");
        assert!(filter.is_empty());

        let mut config = AppConfig::default();
        config.dashboard.default_department_filter = false;
        config.dashboard.default_preset = StatusPreset::Affected;
        let filter = resolve_filter(&FilterArgs::default(), &config, &contacts).expect("filter");
        assert!(filter.departments.is_empty());
        assert_eq!(filter.statuses, Status::affected().to_vec());
    }

    #[test]
    fn expression_and_flags_combine() {
        let args = FilterArgs {
            filter: Some("dept:HR status:safe".to_string()),
            statuses: vec!["severe".to_string()],
            ..FilterArgs::default()
        };
        let filter = resolve_filter(&args, &AppConfig::default(), &[]).expect("filter");
        assert_eq!(filter.departments, vec!["HR"]);
        assert_eq!(filter.statuses, vec![Status::Safe, Status::Severe]);

        let args = FilterArgs {
            filter: Some("colour:red".to_string()),
            ..FilterArgs::default()
        };
        assert!(resolve_filter(&args, &AppConfig::default(), &[]).is_err());
    }

    #[test]
    fn responded_rows_default_to_newest_first() {
        let outcome = {
            let roster = vec![
                contact("Ana Reyes", "09170000001", "HR"),
                contact("Ben Cruz", "09170000002", "IT"),
            ];
            let responses = vec![sms("09170000002", "2", 300), sms("09170000001", "1", 100)];
            match_responses(&roster, &responses)
        };
        let mut view = DashboardView::build(&outcome, &DashboardFilter::default(), None);

        TableArgs::default().apply(&mut view).expect("sort");
        assert_eq!(view.responded[0].contact.name, "Ben Cruz");

        let by_name = TableArgs {
            sort: Some("name".to_string()),
            ..TableArgs::default()
        };
        by_name.apply(&mut view).expect("sort");
        assert_eq!(view.responded[0].contact.name, "Ana Reyes");

        let bad = TableArgs {
            sort: Some("shoe size".to_string()),
            ..TableArgs::default()
        };
        assert!(bad.apply(&mut view).is_err());
    }

    #[test]
    fn interval_is_bounded() {
        let config = AppConfig::default();
        assert_eq!(resolve_interval(None, &config).expect("default"), 60);
        assert_eq!(resolve_interval(Some(5), &config).expect("flag"), 5);
        assert!(resolve_interval(Some(0), &config).is_err());
        assert!(resolve_interval(Some(3601), &config).is_err());
    }

    #[test]
    fn background_failure_keeps_watching() {
        let mut modes = Vec::new();
        let result = watch_loop(Duration::ZERO, Some(4), |mode| {
            modes.push(mode);
            if modes.len() == 2 {
                anyhow::bail!("database is locked");
            }
            Ok(())
        });

        assert!(result.is_ok());
        assert_eq!(modes.len(), 4);
        assert_eq!(modes[0], RefreshMode::Foreground);
        assert!(modes[1..].iter().all(|mode| *mode == RefreshMode::Background));
    }

    #[test]
    fn foreground_failure_is_returned() {
        let mut calls = 0;
        let result = watch_loop(Duration::ZERO, Some(3), |_| {
            calls += 1;
            anyhow::bail!("no such table: responses")
        });

        let err = result.expect_err("first load fails");
        assert!(err.to_string().contains("no such table"));
        assert_eq!(calls, 1);
    }
}
