use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ts_cli::commands::group::{GroupChanges, NewGroup};
use ts_cli::commands::trip::NewTrip;
use ts_cli::commands::util::TripContext;
use ts_cli::commands::watch::WatchOptions;
use ts_cli::commands::{
    activity, balances, currency, debt, group, history, person, report, trip, watch, writer,
};
use ts_cli::{Cli, Commands, Config, CurrencyAction, DebtAction, GroupAction, PersonAction};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(ts_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = ts_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

/// Trip selection plus this writer's tag.
fn trip_context(cli: &Cli, config: &Config) -> Result<TripContext> {
    let trip_id = cli.trip.as_deref().unwrap_or(&config.default_trip);
    let identity = ts_cli::writer::current_writer()?;
    Ok(TripContext::new(trip_id)
        .with_writer(identity.tag())
        .with_history_limit(config.history_limit))
}

#[expect(
    clippy::too_many_lines,
    reason = "CLI command dispatch is inherently verbose"
)]
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let (mut db, config) = open_database(cli.config.as_deref())?;
    let ctx = trip_context(&cli, &config)?;

    match command {
        Commands::Init {
            name,
            people,
            base,
            symbol,
        } => {
            let new_trip = NewTrip {
                name,
                people,
                base_code: base.as_deref().unwrap_or(&config.base_currency),
                base_symbol: symbol.as_deref().unwrap_or(&config.base_symbol),
            };
            trip::init(&mut out, &mut db, &ctx, &new_trip)?;
        }
        Commands::Trips => trip::list(&mut out, &db)?,
        Commands::Delete => trip::delete(&mut out, &mut db, &ctx)?,
        Commands::Demo => trip::demo(&mut out, &mut db, &ctx)?,
        Commands::Reset => trip::reset(&mut out, &mut db, &ctx)?,
        Commands::Person(action) => match action {
            PersonAction::Add { name } => person::add(&mut out, &mut db, &ctx, name)?,
            PersonAction::Rename { who, name } => {
                person::rename(&mut out, &mut db, &ctx, who, name)?;
            }
            PersonAction::Remove { who } => person::remove(&mut out, &mut db, &ctx, who)?,
            PersonAction::List => person::list(&mut out, &db, &ctx)?,
        },
        Commands::Currency(action) => match action {
            CurrencyAction::Add { code, rate, symbol } => {
                currency::add(&mut out, &mut db, &ctx, code, symbol, *rate)?;
            }
            CurrencyAction::Remove { code } => currency::remove(&mut out, &mut db, &ctx, code)?,
            CurrencyAction::SetBase { code } => {
                currency::set_base(&mut out, &mut db, &ctx, code)?;
            }
            CurrencyAction::SetRate { code, rate } => {
                currency::set_rate(&mut out, &mut db, &ctx, code, *rate)?;
            }
            CurrencyAction::List => currency::list(&mut out, &db, &ctx)?,
        },
        Commands::Group(action) => match action {
            GroupAction::Add {
                label,
                paid_by,
                total,
                currency,
                emoji,
                note,
                split,
            } => {
                let new_group = NewGroup {
                    label,
                    paid_by,
                    total: *total,
                    currency: currency.as_deref(),
                    emoji: emoji.as_deref(),
                    note: note.as_deref(),
                };
                group::add(&mut out, &mut db, &ctx, &new_group, split)?;
            }
            GroupAction::Edit {
                group: key,
                label,
                paid_by,
                total,
                currency,
                emoji,
                note,
                split,
            } => {
                let changes = GroupChanges {
                    label: label.as_deref(),
                    paid_by: paid_by.as_deref(),
                    total: *total,
                    currency: currency.as_deref(),
                    emoji: emoji.as_deref(),
                    note: note.as_deref(),
                };
                group::edit(&mut out, &mut db, &ctx, key, &changes, split)?;
            }
            GroupAction::Remove { group: key } => group::remove(&mut out, &mut db, &ctx, key)?,
            GroupAction::List => group::list(&mut out, &db, &ctx)?,
        },
        Commands::Debt(action) => match action {
            DebtAction::Add { from, to, amount } => {
                debt::add(&mut out, &mut db, &ctx, from, to, *amount)?;
            }
            DebtAction::Remove { id } => debt::remove(&mut out, &mut db, &ctx, id)?,
            DebtAction::List => debt::list(&mut out, &db, &ctx)?,
        },
        Commands::Balances { json } => balances::balances(&mut out, &db, &ctx, *json)?,
        Commands::Settle { json } => balances::settle(&mut out, &db, &ctx, *json)?,
        Commands::Report { output } => report::run(&mut out, &db, &ctx, output.as_deref())?,
        Commands::Undo => history::undo(&mut out, &mut db, &ctx)?,
        Commands::Redo => history::redo(&mut out, &mut db, &ctx)?,
        Commands::Activity { limit } => activity::run(&mut out, &db, &ctx, *limit)?,
        Commands::Watch { ignore_own, polls } => {
            let options = WatchOptions {
                ignore_own: *ignore_own,
                polls: *polls,
                interval: Duration::from_millis(config.watch_interval_ms),
            };
            watch::run(&mut out, &db, &ctx, &options)?;
        }
        Commands::Writer { label } => writer::run(&mut out, label.as_deref())?,
    }

    out.flush()?;
    Ok(())
}
