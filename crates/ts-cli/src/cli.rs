//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Trip expense splitter.
///
/// Records who paid for what on a shared trip, normalizes every expense into
/// one base currency, and works out who should pay whom to settle up.
#[derive(Debug, Parser)]
#[command(name = "tripsplit", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Trip to operate on (defaults to `default_trip` from config).
    #[arg(short, long, global = true)]
    pub trip: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new trip.
    Init {
        /// Trip display name.
        #[arg(long)]
        name: String,

        /// Participant names (repeatable, at least two).
        #[arg(short, long = "person")]
        people: Vec<String>,

        /// Base currency code (defaults to config).
        #[arg(long)]
        base: Option<String>,

        /// Base currency symbol (defaults to config).
        #[arg(long)]
        symbol: Option<String>,
    },

    /// List stored trips.
    Trips,

    /// Delete the trip and its activity feed.
    Delete,

    /// Load the sample trip.
    Demo,

    /// Clear all expense groups and existing debts.
    Reset,

    /// Manage participants.
    #[command(subcommand)]
    Person(PersonAction),

    /// Manage currencies and exchange rates.
    #[command(subcommand)]
    Currency(CurrencyAction),

    /// Manage expense groups.
    #[command(subcommand)]
    Group(GroupAction),

    /// Manage debts carried in from outside the trip.
    #[command(subcommand)]
    Debt(DebtAction),

    /// Show paid, owed and net per participant.
    Balances {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the transfers that settle the trip.
    Settle {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Render a printable text report.
    Report {
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Revert the last change.
    Undo,

    /// Reapply the last undone change.
    Redo,

    /// Show recent changes, newest first.
    Activity {
        /// Maximum number of entries.
        #[arg(short = 'n', long, default_value_t = ts_db::DEFAULT_ACTIVITY_LIMIT)]
        limit: usize,
    },

    /// Follow a trip and reprint balances when someone changes it.
    Watch {
        /// Skip changes written by this writer.
        #[arg(long)]
        ignore_own: bool,

        /// Stop after this many polls.
        #[arg(long)]
        polls: Option<u64>,
    },

    /// Show or relabel this writer's identity.
    Writer {
        /// New label.
        #[arg(long)]
        label: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum PersonAction {
    /// Add a participant.
    Add { name: String },
    /// Rename a participant.
    Rename {
        /// Participant id or name.
        who: String,
        name: String,
    },
    /// Remove a participant and their existing debts.
    Remove {
        /// Participant id or name.
        who: String,
    },
    /// List participants.
    List,
}

#[derive(Debug, Subcommand)]
pub enum CurrencyAction {
    /// Add a currency with its rate to base.
    Add {
        code: String,
        /// Base units per one unit of this currency.
        #[arg(long)]
        rate: f64,
        #[arg(long, default_value = "")]
        symbol: String,
    },
    /// Remove a currency no group uses.
    Remove { code: String },
    /// Make a currency the base.
    SetBase { code: String },
    /// Change a currency's rate to base.
    SetRate { code: String, rate: f64 },
    /// List currencies.
    List,
}

#[derive(Debug, Subcommand)]
pub enum GroupAction {
    /// Add an expense group.
    Add {
        #[arg(long)]
        label: String,
        /// Participant id or name.
        #[arg(long)]
        paid_by: String,
        #[arg(long)]
        total: f64,
        /// Currency code (defaults to base).
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        emoji: Option<String>,
        #[arg(long)]
        note: Option<String>,
        #[command(flatten)]
        split: SplitArgs,
    },
    /// Edit an expense group.
    Edit {
        /// Group id or label.
        group: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        paid_by: Option<String>,
        #[arg(long)]
        total: Option<f64>,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        emoji: Option<String>,
        #[arg(long)]
        note: Option<String>,
        #[command(flatten)]
        split: SplitArgs,
    },
    /// Remove an expense group.
    Remove {
        /// Group id or label.
        group: String,
    },
    /// List expense groups.
    List,
}

#[derive(Debug, Subcommand)]
pub enum DebtAction {
    /// Record that one participant already owes another.
    Add {
        /// Debtor id or name.
        #[arg(long)]
        from: String,
        /// Creditor id or name.
        #[arg(long)]
        to: String,
        /// Amount in base currency.
        #[arg(long)]
        amount: f64,
    },
    /// Remove an existing debt.
    Remove { id: String },
    /// List existing debts.
    List,
}

/// How shares are derived when adding or editing a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SplitKind {
    Equal,
    Mixed,
    Custom,
}

#[derive(Debug, Clone, Args)]
pub struct SplitArgs {
    /// Split mode. `group add` defaults to equal.
    #[arg(long, value_enum)]
    pub split: Option<SplitKind>,

    /// Restrict an equal or mixed split to these participants (repeatable).
    #[arg(long)]
    pub among: Vec<String>,

    /// Mixed mode: amount divided equally.
    #[arg(long)]
    pub shared: Option<f64>,

    /// Mixed mode: per-participant top-up as NAME=AMOUNT (repeatable).
    #[arg(long, value_parser = parse_assignment)]
    pub personal: Vec<(String, f64)>,

    /// Custom mode: share as NAME=AMOUNT (repeatable).
    #[arg(long, value_parser = parse_assignment)]
    pub share: Vec<(String, f64)>,
}

/// Parses `NAME=AMOUNT`.
fn parse_assignment(raw: &str) -> Result<(String, f64), String> {
    let (who, amount) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=AMOUNT, got '{raw}'"))?;
    let who = who.trim();
    if who.is_empty() {
        return Err(format!("missing participant in '{raw}'"));
    }
    let amount = amount
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid amount in '{raw}': {e}"))?;
    Ok((who.to_string(), amount))
}
