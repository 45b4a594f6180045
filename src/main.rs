use anyhow::Result;
use clap::{Parser, Subcommand};

use salesdash::cli;

#[derive(Debug, Parser)]
#[command(name = "salesdash")]
#[command(about = "Car sales analytics dashboard")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List backend tasks, newest first
    Tasks {
        /// Only tasks whose data can be browsed
        #[arg(long)]
        completed: bool,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Poll the task list and redraw it on every interval
    Watch {
        /// Stop after N redraws
        #[arg(long)]
        iterations: Option<u32>,
    },
    /// Submit a data-collection task and follow its progress
    Create {
        /// Task name (default: "Task <timestamp>")
        #[arg(long)]
        name: Option<String>,
        /// Start date, YYYY-MM-DD
        #[arg(long)]
        from: Option<String>,
        /// End date, YYYY-MM-DD
        #[arg(long)]
        to: Option<String>,
        /// Date range preset: last-1m, last-3m, last-6m, last-1y, last-3y
        #[arg(long)]
        preset: Option<String>,
        /// Collect from Prime Auto Sales
        #[arg(long)]
        prime_auto_sales: bool,
        /// Collect from Metro Motors
        #[arg(long)]
        metro_motors: bool,
        /// Restrict to a car model (repeatable)
        #[arg(long = "model")]
        models: Vec<String>,
        /// Select every known car model
        #[arg(long)]
        all_models: bool,
        /// Track the task locally without contacting the backend
        #[arg(long)]
        offline: bool,
    },
    /// Summary cards, aggregates and charts for a completed task
    Analytics {
        #[arg(long = "task")]
        task_id: u64,
        /// Filter as key=value (repeatable), e.g. sale_date_from=2022-01-01
        #[arg(long = "filter")]
        filters: Vec<String>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// One page of a task's raw records
    Raw {
        #[arg(long = "task")]
        task_id: u64,
        /// Filter as key=value (repeatable)
        #[arg(long = "filter")]
        filters: Vec<String>,
        /// Sort column, e.g. sales_amount
        #[arg(long)]
        sort: Option<String>,
        /// asc or desc
        #[arg(long)]
        order: Option<String>,
        #[arg(long, default_value = "1")]
        page: usize,
        /// Let the backend filter and sort
        #[arg(long)]
        remote: bool,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// The backend's own aggregates for a task
    Aggregated {
        #[arg(long = "task")]
        task_id: u64,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Check config and backend reachability
    Health,
    /// Show or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default ~/.salesdash/config.toml
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. backend.base_url
    Set { key: String, value: String },
    /// Overwrite the global config with defaults
    Reset,
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let app = App::parse();

    match app.command {
        Commands::Tasks { completed, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_tasks(completed, fmt)
        }
        Commands::Watch { iterations } => cli::run_watch(iterations),
        Commands::Create {
            name,
            from,
            to,
            preset,
            prime_auto_sales,
            metro_motors,
            models,
            all_models,
            offline,
        } => cli::run_create(&cli::CreateOptions {
            name,
            from,
            to,
            preset,
            prime_auto_sales,
            metro_motors,
            models,
            all_models,
            offline,
        }),
        Commands::Analytics {
            task_id,
            filters,
            format,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_analytics(task_id, &filters, fmt)
        }
        Commands::Raw {
            task_id,
            filters,
            sort,
            order,
            page,
            remote,
            format,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_raw(
                &cli::RawOptions {
                    task_id,
                    filters,
                    sort,
                    order,
                    page,
                    remote,
                },
                fmt,
            )
        }
        Commands::Aggregated { task_id, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_aggregated(task_id, fmt)
        }
        Commands::Health => cli::run_health(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
