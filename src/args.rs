//! These structs provide the CLI interface for the staffdesk CLI.

use crate::ledger::{MonthKey, YearKey};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// staffdesk: income, expense and profit totals for a staffing agency.
///
/// The agency's records (client payments, investments, petty cash, staff and worker payroll,
/// facility commissions and charges) are exported as JSON snapshot files, one per collection, into
/// the snapshots directory of $STAFFDESK_HOME. staffdesk normalizes them into transactions and
/// reports totals overall, per year and per month.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration file.
    ///
    /// This creates $STAFFDESK_HOME (by default ~/staffdesk), its snapshots and exports
    /// directories, and a config.json with default settings. Put one JSON file per collection in
    /// the snapshots directory, e.g. clients.json or petty-cash.json.
    Init,
    /// Print the Overall, Year and Month totals of the current snapshot files.
    Report(ReportArgs),
    /// Write the transactions of one month to a CSV file.
    Export(ExportArgs),
    /// Watch the snapshot files and print the totals every time one of them changes.
    Watch,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where staffdesk snapshots and configuration are held. Defaults to
    /// ~/staffdesk
    #[arg(long, env = "STAFFDESK_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// How `staffdesk report` prints its result.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// A human readable table.
    #[default]
    Text,
    /// The full summary as JSON on stdout.
    Json,
}

/// (Not shown): Args for the `staffdesk report` command.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// The year to show, or "unknown". Defaults to the most recent year.
    #[arg(long)]
    year: Option<YearKey>,

    /// The month to show, 1 through 12, or "unknown". Requires a year to be selected.
    #[arg(long)]
    month: Option<MonthArg>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl ReportArgs {
    pub fn new(year: Option<YearKey>, month: Option<MonthArg>, format: OutputFormat) -> Self {
        Self {
            year,
            month,
            format,
        }
    }

    pub fn year(&self) -> Option<YearKey> {
        self.year
    }

    pub fn month(&self) -> Option<MonthArg> {
        self.month
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// (Not shown): Args for the `staffdesk export` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    /// The year to export, or "unknown".
    #[arg(long)]
    year: YearKey,

    /// The month to export, 1 through 12, or "unknown".
    #[arg(long)]
    month: MonthArg,

    /// Where to write the CSV. Defaults to $STAFFDESK_HOME/exports/<year>-<month>.csv
    #[arg(long)]
    out: Option<PathBuf>,
}

impl ExportArgs {
    pub fn new(year: YearKey, month: MonthArg, out: Option<PathBuf>) -> Self {
        Self { year, month, out }
    }

    pub fn year(&self) -> YearKey {
        self.year
    }

    pub fn month(&self) -> MonthArg {
        self.month
    }

    pub fn out(&self) -> Option<&Path> {
        self.out.as_deref()
    }
}

/// A month as typed on the command line: one-based, 1 through 12, or `unknown`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct MonthArg(MonthKey);

impl MonthArg {
    pub fn key(&self) -> MonthKey {
        self.0
    }
}

impl From<MonthKey> for MonthArg {
    fn from(value: MonthKey) -> Self {
        MonthArg(value)
    }
}

impl FromStr for MonthArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unknown") {
            return Ok(MonthArg(MonthKey::Unknown));
        }
        let n: u32 = s
            .parse()
            .with_context(|| format!("'{s}' is not a month number"))?;
        if !(1..=12).contains(&n) {
            bail!("The month must be between 1 and 12, got {n}")
        }
        Ok(MonthArg(MonthKey::Month(n - 1)))
    }
}

/// Renders as the two-digit month number used in export file names, e.g. `03`.
impl Display for MonthArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            MonthKey::Month(ix) => write!(f, "{:02}", ix + 1),
            MonthKey::Unknown => f.write_str("Unknown"),
        }
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("staffdesk"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or STAFFDESK_HOME instead of relying on the default \
                staffdesk home directory.",
            );
            PathBuf::from("staffdesk")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
