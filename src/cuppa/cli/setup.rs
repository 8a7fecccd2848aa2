use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use cuppa::api::SortOrder;
use cuppa::config::BackendKind;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cuppa", bin_name = "cuppa", version)]
#[command(about = "Track what you spend on coffee", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Storage backend (overrides config and CUPPA_BACKEND)
    #[arg(long, global = true, value_enum, help_heading = "Options")]
    pub backend: Option<BackendArg>,

    /// Directory holding config.json and the CSV store
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Csv,
    Github,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Csv => BackendKind::Csv,
            BackendArg::Github => BackendKind::Github,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    /// Newest first
    Date,
    /// Oldest first
    DateAsc,
    /// As stored
    Stored,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Date => SortOrder::Date,
            SortArg::DateAsc => SortOrder::DateAsc,
            SortArg::Stored => SortOrder::Stored,
        }
    }
}

/// Accepts only ISO `yyyy-MM-dd` dates.
fn parse_date(s: &str) -> Result<String, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| format!("invalid date '{}', expected yyyy-MM-dd", s))
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List expenses
    #[command(alias = "ls", display_order = 1)]
    List {
        /// Only show expenses whose type, location or notes contain this text
        #[arg(short, long)]
        search: Option<String>,

        /// Sort order
        #[arg(long, value_enum, default_value_t = SortArg::Date)]
        sort: SortArg,
    },

    /// Record a coffee purchase
    #[command(alias = "a", display_order = 2)]
    Add {
        /// Coffee type (e.g. Latte)
        #[arg(short = 't', long = "type")]
        kind: String,

        /// Where it was bought
        #[arg(short, long)]
        location: String,

        /// Price as a decimal amount
        #[arg(short, long)]
        price: String,

        /// Purchase date (defaults to today)
        #[arg(short, long, value_parser = parse_date)]
        date: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Change fields of an expense
    #[command(alias = "e", display_order = 3)]
    Edit {
        /// Expense id or unique id prefix
        id: String,

        #[arg(short = 't', long = "type")]
        kind: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(short, long)]
        price: Option<String>,

        #[arg(short, long, value_parser = parse_date)]
        date: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Show one expense
    #[command(alias = "v", display_order = 4)]
    View {
        /// Expense id or unique id prefix
        id: String,
    },

    /// Delete one or more expenses
    #[command(alias = "rm", display_order = 5)]
    Delete {
        /// Expense ids or unique id prefixes
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },

    /// Import expenses from CSV files
    #[command(display_order = 10)]
    Import {
        #[arg(required = true, num_args = 1..)]
        paths: Vec<PathBuf>,
    },

    /// Export all expenses to CSV
    #[command(display_order = 11)]
    Export {
        /// Target file, or directory for coffee-expenses-<date>.csv (default: current directory)
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,

        /// Write the CSV to stdout
        #[arg(long, conflicts_with = "out")]
        stdout: bool,
    },

    /// Totals and averages
    #[command(display_order = 12)]
    Summary,

    /// Show or set configuration
    #[command(display_order = 20)]
    Config {
        key: Option<String>,
        value: Option<String>,
    },

    /// Create the data directory, config and store
    #[command(display_order = 21)]
    Init,
}
