//! CLI command implementations for the sales dashboard.
//!
//! Provides subcommand handlers for:
//! - `salesdash tasks`: task queue, newest first
//! - `salesdash watch`: poll the queue and redraw it
//! - `salesdash create`: validate and submit a task, then follow its lifecycle
//! - `salesdash analytics --task ID`: summary cards, aggregates and charts
//! - `salesdash raw --task ID`: one page of the raw data table
//! - `salesdash aggregated --task ID`: the backend's own aggregates
//! - `salesdash health`: config and backend reachability
//! - `salesdash config show|init|set|reset`: configuration management

pub mod render;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use colored::Colorize;

use crate::analytics::{self, ActivityLog, AggregatedData, SalesSummary};
use crate::api::{BackendClient, TaskSummary};
use crate::config;
use crate::form::{DatePreset, TaskForm};
use crate::records::{FilterSpec, RawRecord};
use crate::table::{Page, SortField, SortOrder};
use crate::task::{Task, TaskBoard, TaskOutput, TaskPoller, TaskSimulator, TaskStore};
use crate::view::AnalyticsView;

use render::{bar_chart, cell, colorize_status, column_width, csv_field, format_money, format_number, truncate};

const CHART_WIDTH: usize = 40;

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Build a filter from repeated `--filter key=value` arguments.
pub fn parse_filters(assignments: &[String]) -> Result<FilterSpec> {
    let mut spec = FilterSpec::new();
    for raw in assignments {
        let (field, value) = FilterSpec::parse_assignment(raw)?;
        spec.set(field, value);
    }
    Ok(spec)
}

// ---------------------------------------------------------------------------
// salesdash tasks
// ---------------------------------------------------------------------------

/// Show the backend task queue.
pub fn run_tasks(completed_only: bool, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let board = TaskBoard::with_activity(ActivityLog::from_config(&cfg.logging));
    board.refresh(&BackendClient::from_config(&cfg.backend));

    if let Some(err) = board.last_error() {
        println!("{}", err.red());
        return Ok(());
    }

    let tasks = if completed_only {
        let mut done = board.completed();
        done.sort_by(|a, b| b.id.cmp(&a.id));
        done
    } else {
        board.queue()
    };

    if tasks.is_empty() {
        println!("{}", "No tasks yet. Create one with `salesdash create`.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tasks)?),
        OutputFormat::Csv => print_tasks_csv(&tasks),
        OutputFormat::Table => print_tasks_table(&tasks),
    }

    Ok(())
}

fn print_tasks_table(tasks: &[TaskSummary]) {
    println!("{}", "Task Queue".bold().cyan());
    println!("{}", "=".repeat(70));
    println!(
        "  {:>6}  {:<30} {:<20} Status",
        "ID", "Name", "Created"
    );
    println!("  {}", "-".repeat(68));

    for (i, task) in tasks.iter().enumerate() {
        let line = format!(
            "  {:>6}  {:<30} {:<20}",
            task.id,
            truncate(&task.display_name(), 30),
            truncate(&task.created_at, 20),
        );
        let line = if i % 2 == 0 {
            line.normal()
        } else {
            line.dimmed()
        };
        println!("{} {}", line, colorize_status(task.status));
    }
}

fn print_tasks_csv(tasks: &[TaskSummary]) {
    println!("id,name,created_at,status");
    for task in tasks {
        println!(
            "{},{},{},{}",
            task.id,
            csv_field(&task.display_name()),
            csv_field(&task.created_at),
            task.status,
        );
    }
}

// ---------------------------------------------------------------------------
// salesdash watch
// ---------------------------------------------------------------------------

/// Poll the task list and redraw it after every interval.
///
/// Runs until interrupted, or for `iterations` redraws when given.
pub fn run_watch(iterations: Option<u32>) -> Result<()> {
    let cfg = config::load();
    let interval = Duration::from_millis(cfg.polling.interval_ms.max(1));
    let board = TaskBoard::with_activity(ActivityLog::from_config(&cfg.logging));
    let source = Arc::new(BackendClient::from_config(&cfg.backend));
    let poller = TaskPoller::start(source, board.clone(), interval);

    let mut drawn = 0u32;
    loop {
        thread::sleep(interval);
        draw_board(&board);
        drawn += 1;
        if iterations.is_some_and(|n| drawn >= n) {
            break;
        }
    }

    poller.stop();
    Ok(())
}

fn draw_board(board: &TaskBoard) {
    print!("\x1B[2J\x1B[H");
    println!(
        "{} {}",
        "salesdash".bold().cyan(),
        Local::now().format("%H:%M:%S").to_string().dimmed()
    );
    let tasks = board.queue();
    if tasks.is_empty() {
        println!("{}", "No tasks yet.".yellow());
    } else {
        print_tasks_table(&tasks);
    }
    if let Some(err) = board.last_error() {
        println!();
        println!("{}", err.red());
    }
}

// ---------------------------------------------------------------------------
// salesdash create
// ---------------------------------------------------------------------------

/// Command-line form input for `salesdash create`.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub name: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub preset: Option<String>,
    pub prime_auto_sales: bool,
    pub metro_motors: bool,
    pub models: Vec<String>,
    pub all_models: bool,
    /// Skip the backend and track the task locally only.
    pub offline: bool,
}

/// Fill a form the way a user would: defaults, then preset, then explicit
/// dates, then dealerships and models.
pub fn build_form(opts: &CreateOptions, now: NaiveDateTime) -> Result<TaskForm> {
    let mut form = TaskForm::with_defaults(now);

    if let Some(name) = &opts.name {
        form.name = name.clone();
    }
    if let Some(preset) = &opts.preset {
        let preset: DatePreset = preset.parse()?;
        form.apply_preset(preset, now.date());
    }
    if let Some(from) = &opts.from {
        form.from_date = from.clone();
        form.active_preset = None;
    }
    if let Some(to) = &opts.to {
        form.to_date = to.clone();
        form.active_preset = None;
    }

    form.sources.prime_auto_sales = opts.prime_auto_sales;
    form.sources.metro_motors = opts.metro_motors;

    if opts.all_models {
        form.select_all_models();
    }
    for model in &opts.models {
        if !form.car_models.contains(model) {
            form.toggle_model(model);
        }
    }

    Ok(form)
}

/// Validate, submit, then follow the task through its lifecycle.
pub fn run_create(opts: &CreateOptions) -> Result<()> {
    let cfg = config::load();
    let form = build_form(opts, Local::now().naive_local())?;
    let validated = form.validate()?;
    let activity = ActivityLog::from_config(&cfg.logging);

    let task_id = if opts.offline {
        1
    } else {
        let client = BackendClient::from_config(&cfg.backend);
        let response = match client.create_task(&validated.payload) {
            Ok(response) => response,
            Err(e) => {
                if e.is_network() {
                    activity.fetch_failure(&e.to_string());
                }
                return Err(e).context("Error creating task");
            }
        };
        println!("{} {}", "✓".green().bold(), response.message);
        response.task_id
    };
    activity.submitted(task_id, validated.params.name.as_deref());

    let store = TaskStore::new();
    let simulator = TaskSimulator::new(store, &cfg.simulation, activity);
    let task = Task::pending(task_id, validated.params);
    println!(
        "{} {}",
        "Task:".bold(),
        task.display_name()
    );

    let done = simulator.run_with(task, &mut rand::thread_rng(), |t| {
        println!("  {} {}", "·".dimmed(), colorize_status(t.status));
    })?;

    if let Some(output) = &done.data {
        println!();
        print_task_output(output);
    }

    Ok(())
}

fn print_task_output(output: &TaskOutput) {
    println!("{}", "Rows per Year".bold().cyan());
    let rows: Vec<(String, f64)> = output
        .line_data
        .iter()
        .map(|p| (p.year.to_string(), f64::from(p.rows)))
        .collect();
    for line in bar_chart(&rows, CHART_WIDTH, |v| format_number(v as usize)) {
        println!("  {line}");
    }

    if !output.bar_data.is_empty() {
        println!();
        println!("{}", "Sales".bold().cyan());
        let bars: Vec<(String, f64)> = output
            .bar_data
            .iter()
            .map(|b| (b.company.clone(), f64::from(b.sales)))
            .collect();
        for line in bar_chart(&bars, CHART_WIDTH, |v| format_number(v as usize)) {
            println!("  {line}");
        }
    }
}

// ---------------------------------------------------------------------------
// salesdash analytics
// ---------------------------------------------------------------------------

/// Fetch a task's raw records, filter locally, and show the analytics page.
pub fn run_analytics(task_id: u64, filters: &[String], format: OutputFormat) -> Result<()> {
    let filters = parse_filters(filters)?;
    let cfg = config::load();
    let client = BackendClient::from_config(&cfg.backend);

    let mut view = AnalyticsView::new(cfg.table.page_size);
    view.select_task(Some(task_id));
    view.load(client.get_raw(task_id, &FilterSpec::new(), None));
    if let Some(notice) = view.notice() {
        ActivityLog::from_config(&cfg.logging).fetch_failure(notice);
        println!("{}", notice.red());
        return Ok(());
    }
    for (field, value) in filters.active() {
        view.set_filter(field, value);
    }

    let summary = view.summary();
    let aggregated = view.aggregated();

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "task_id": task_id,
                "summary": summary,
                "aggregated": aggregated,
                "options": view.options(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => print_aggregated_csv(aggregated.as_ref()),
        OutputFormat::Table => {
            println!(
                "{}",
                format!("Analytics for Task #{task_id}").bold().cyan()
            );
            println!("{}", "=".repeat(60));
            if !view.filters().is_empty() {
                let active: Vec<String> = view
                    .filters()
                    .active()
                    .map(|(f, v)| format!("{f}={v}"))
                    .collect();
                println!("  {} {}", "Filters:".bold(), active.join(", ").dimmed());
            }
            println!("  {}", "Available filter values:".bold());
            for line in describe_options(view.records()) {
                println!("    {}", line.dimmed());
            }
            println!();
            match (&summary, &aggregated) {
                (Some(summary), Some(aggregated)) => {
                    print_summary_cards(summary);
                    print_aggregated_charts(aggregated);
                }
                _ => println!("{}", "No aggregated data available.".yellow()),
            }
        }
    }

    Ok(())
}

fn print_summary_cards(summary: &SalesSummary) {
    println!("  {} {}", "Total sales:".bold(), format_money(summary.total_sales));
    println!("  {} {}", "Records:    ".bold(), format_number(summary.records));
    println!();
    println!("{}", "Cars Sold by Model".bold().cyan());
    for entry in &summary.cars_sold_by_model {
        println!("  {:<24} {:>6}", truncate(&entry.model, 24), entry.count);
    }
    println!();
}

fn print_aggregated_charts(aggregated: &AggregatedData) {
    println!("{}", "Sales Over Time".bold().cyan());
    let years: Vec<(String, f64)> = aggregated
        .time_series
        .iter()
        .map(|p| (p.year.to_string(), p.count as f64))
        .collect();
    for line in bar_chart(&years, CHART_WIDTH, |v| format_number(v as usize)) {
        println!("  {line}");
    }
    println!();

    println!("{}", "Sales by Car Model".bold().cyan());
    let models: Vec<(String, f64)> = aggregated
        .sales_by_car_model
        .iter()
        .map(|m| (m.car_model.clone(), m.total_sales))
        .collect();
    for line in bar_chart(&models, CHART_WIDTH, format_money) {
        println!("  {line}");
    }
}

fn print_aggregated_csv(aggregated: Option<&AggregatedData>) {
    println!("car_model,total_sales,count");
    if let Some(aggregated) = aggregated {
        for m in &aggregated.sales_by_car_model {
            println!("{},{},{}", csv_field(&m.car_model), m.total_sales, m.count);
        }
    }
}

// ---------------------------------------------------------------------------
// salesdash raw
// ---------------------------------------------------------------------------

/// Options for `salesdash raw`.
#[derive(Debug, Clone)]
pub struct RawOptions {
    pub task_id: u64,
    pub filters: Vec<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: usize,
    /// Let the backend filter and sort.
    pub remote: bool,
}

/// Show one page of the raw data table.
pub fn run_raw(opts: &RawOptions, format: OutputFormat) -> Result<()> {
    let filters = parse_filters(&opts.filters)?;
    let sort = match &opts.sort {
        Some(name) => Some(SortField::parse(name).with_context(|| {
            let valid: Vec<&str> = SortField::COLUMNS.iter().map(|c| c.as_str()).collect();
            format!("unknown sort column '{name}' (expected one of: {})", valid.join(", "))
        })?),
        None => None,
    };
    let order = opts.order.as_deref().map(SortOrder::parse);

    let cfg = config::load();
    let client = BackendClient::from_config(&cfg.backend);
    let mut view = AnalyticsView::new(cfg.table.page_size);
    view.select_task(Some(opts.task_id));

    if opts.remote {
        // Range bounds have no backend counterpart and stay local.
        let mut server = FilterSpec::new();
        let mut local = FilterSpec::new();
        for (field, value) in filters.active() {
            if field.is_server_side() {
                server.set(field, value);
            } else {
                local.set(field, value);
            }
        }
        let remote_sort = sort.map(|field| (field, order.unwrap_or_default()));
        view.load(client.get_raw(opts.task_id, &server, remote_sort));
        for (field, value) in local.active() {
            view.set_filter(field, value);
        }
    } else {
        view.load(client.get_raw(opts.task_id, &FilterSpec::new(), None));
        for (field, value) in filters.active() {
            view.set_filter(field, value);
        }
    }

    if let Some(notice) = view.notice() {
        ActivityLog::from_config(&cfg.logging).fetch_failure(notice);
        println!("{}", notice.red());
        return Ok(());
    }

    if let Some(field) = sort {
        view.set_sort(field, order.unwrap_or_default());
    } else if let Some(order) = order {
        let field = view.table().sort_field;
        view.set_sort(field, order);
    }
    view.set_page(opts.page);

    let page = view.page();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page.items)?),
        OutputFormat::Csv => print_records_csv(&page.items),
        OutputFormat::Table => print_records_table(&page, view.table().sort_field, view.table().sort_order),
    }

    Ok(())
}

fn print_records_table(page: &Page<'_>, sort_field: SortField, sort_order: SortOrder) {
    if page.items.is_empty() {
        println!("{}", "No records match the current filters.".yellow());
        return;
    }

    let header: Vec<String> = SortField::COLUMNS
        .iter()
        .map(|&field| {
            let mut label = field.label().to_string();
            if field == sort_field {
                label.push(if sort_order == SortOrder::Asc { '▲' } else { '▼' });
            }
            format!("{:<width$}", truncate(&label, column_width(field)), width = column_width(field))
        })
        .collect();
    println!("  {}", header.join(" ").bold());
    let total_width: usize = SortField::COLUMNS.iter().map(|&f| column_width(f) + 1).sum();
    println!("  {}", "-".repeat(total_width));

    for (i, record) in page.items.iter().enumerate() {
        let line: Vec<String> = SortField::COLUMNS
            .iter()
            .map(|&field| {
                let width = column_width(field);
                format!("{:<width$}", truncate(&cell(record, field), width))
            })
            .collect();
        let line = format!("  {}", line.join(" "));
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }

    println!();
    println!(
        "  {}",
        format!(
            "Page {} of {} ({} records)",
            page.number,
            page.total_pages.max(1),
            format_number(page.total_items)
        )
        .dimmed()
    );
}

fn print_records_csv(records: &[&RawRecord]) {
    let header: Vec<&str> = SortField::COLUMNS.iter().map(|c| c.as_str()).collect();
    println!("{}", header.join(","));
    for record in records {
        let row: Vec<String> = SortField::COLUMNS
            .iter()
            .map(|&field| csv_field(&cell(record, field)))
            .collect();
        println!("{}", row.join(","));
    }
}

// ---------------------------------------------------------------------------
// salesdash aggregated
// ---------------------------------------------------------------------------

/// Show the backend's aggregate endpoint for a task.
pub fn run_aggregated(task_id: u64, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let aggregated = match BackendClient::from_config(&cfg.backend).get_aggregated(task_id) {
        Ok(data) => data,
        Err(e) => {
            ActivityLog::from_config(&cfg.logging).fetch_failure(&e.to_string());
            println!("{}", e.to_string().red());
            return Ok(());
        }
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&aggregated)?),
        OutputFormat::Csv => print_aggregated_csv(Some(&aggregated)),
        OutputFormat::Table => {
            println!(
                "{}",
                format!("Backend Aggregates for Task #{task_id}").bold().cyan()
            );
            println!("{}", "=".repeat(60));
            println!();
            if aggregated.time_series.is_empty() && aggregated.sales_by_car_model.is_empty() {
                println!("{}", "No aggregated data available.".yellow());
            } else {
                print_aggregated_charts(&aggregated);
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// salesdash health
// ---------------------------------------------------------------------------

/// Check config files, backend reachability and the activity log.
pub fn run_health() -> Result<()> {
    println!("{}", "salesdash Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.salesdash/config.toml found"
        } else {
            "not found (run `salesdash config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".salesdash.toml found"
        } else {
            "none (optional)"
        },
    );

    let client = BackendClient::from_config(&cfg.backend);
    match client.get_tasks() {
        Ok(tasks) => print_health_item(
            "Backend",
            true,
            &format!("reachable at {} ({} tasks)", client.base_url(), tasks.len()),
        ),
        Err(e) => print_health_item("Backend", false, &e.to_string()),
    }

    let activity = ActivityLog::from_config(&cfg.logging);
    let log_exists = activity.path().is_some_and(|p| p.exists());
    print_health_item(
        "Activity log",
        cfg.logging.activity_log,
        &if !cfg.logging.activity_log {
            "disabled".to_string()
        } else if log_exists {
            format!("{} entries", format_number(activity.entries().len()))
        } else {
            "no log file yet".to_string()
        },
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<16} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// salesdash config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective salesdash Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.salesdash/config.toml", global_exists);
    print_source(".salesdash.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "SALESDASH_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(label: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), label.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{label} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.salesdash/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Distinct filter values for a loaded record set, one line per field.
pub fn describe_options(records: &[RawRecord]) -> Vec<String> {
    let options = analytics::filter_options(records);
    let years: Vec<String> = options.model_years.iter().map(i32::to_string).collect();
    vec![
        format!("dealer: {}", options.dealers.join(", ")),
        format!("car_model: {}", options.car_models.join(", ")),
        format!("model_year: {}", years.join(", ")),
        format!("color: {}", options.colors.join(", ")),
        format!("type: {}", options.types.join(", ")),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
