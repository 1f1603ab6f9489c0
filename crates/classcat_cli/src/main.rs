//! `classcat` command-line entry point.
//!
//! # Responsibility
//! - Resolve settings from flags over the optional TOML config.
//! - Run or preview a reconciliation and print the result as JSON.
//! - Exit non-zero on any failure.

use clap::{Parser, Subcommand};
use classcat_core::{
    default_catalog, init_logging_with, open_db, preview, read_snapshot, reconcile,
    CanonicalSpec, ClasscatConfig, ConfigError, DbError, LogSettings, ReconcileError,
    ReconcileOptions, SpecError, SqliteCatalogRepository,
};
use log::info;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "classcat")]
#[command(version, about = "Reconcile fitness class types and exercises to a canonical catalog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Mirror warnings and errors to stderr
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Converge one owner's catalog to the canonical spec
    Reconcile {
        /// SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,

        /// Owner whose catalog is reconciled
        #[arg(long)]
        owner: Option<String>,

        /// Canonical spec JSON (built-in catalog when omitted)
        #[arg(long)]
        spec: Option<PathBuf>,

        /// Class type to retain; repeat for each. Others are removed.
        #[arg(long = "keep")]
        keep: Vec<String>,

        /// Print the plan without changing the database
        #[arg(long)]
        dry_run: bool,
    },

    /// Print one owner's current catalog
    Show {
        #[arg(long)]
        db: Option<PathBuf>,

        #[arg(long)]
        owner: Option<String>,
    },
}

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Spec(SpecError),
    Db(DbError),
    Reconcile(ReconcileError),
    Output(serde_json::Error),
    MissingSetting(&'static str),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Spec(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Reconcile(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "failed to encode output: {err}"),
            Self::MissingSetting(name) => write!(
                f,
                "missing `{name}`; pass it as a flag or set it in the config file"
            ),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Spec(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Reconcile(err) => Some(err),
            Self::Output(err) => Some(err),
            Self::MissingSetting(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<SpecError> for CliError {
    fn from(value: SpecError) -> Self {
        Self::Spec(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<ReconcileError> for CliError {
    fn from(value: ReconcileError) -> Self {
        Self::Reconcile(value)
    }
}

impl From<classcat_core::CatalogRepoError> for CliError {
    fn from(value: classcat_core::CatalogRepoError) -> Self {
        Self::Reconcile(value.into())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = ClasscatConfig::load_or_default(cli.config.as_deref())?;
    start_logging(&config, cli.verbose);

    match cli.command {
        Commands::Reconcile {
            db,
            owner,
            spec,
            keep,
            dry_run,
        } => {
            let db = db.or(config.database.path.clone());
            let owner = owner.or(config.reconcile.owner_id.clone());
            let spec_path = spec.or(config.reconcile.spec_path.clone());
            let keep_list = if keep.is_empty() {
                config.reconcile.keep_list.clone()
            } else {
                Some(keep)
            };
            cmd_reconcile(
                db.ok_or(CliError::MissingSetting("db"))?,
                owner.ok_or(CliError::MissingSetting("owner"))?,
                spec_path,
                ReconcileOptions { keep_list },
                dry_run,
            )
        }
        Commands::Show { db, owner } => {
            let db = db.or(config.database.path.clone());
            let owner = owner.or(config.reconcile.owner_id.clone());
            cmd_show(
                db.ok_or(CliError::MissingSetting("db"))?,
                owner.ok_or(CliError::MissingSetting("owner"))?,
            )
        }
    }
}

fn start_logging(config: &ClasscatConfig, verbose: bool) {
    let result = LogSettings::new(&config.logging.level, &config.logging.dir, verbose)
        .and_then(init_logging_with);
    if let Err(err) = result {
        // Logging is best-effort for the CLI; the run itself still proceeds.
        eprintln!("warning: logging disabled: {err}");
    }
}

fn cmd_reconcile(
    db: PathBuf,
    owner: String,
    spec_path: Option<PathBuf>,
    options: ReconcileOptions,
    dry_run: bool,
) -> Result<(), CliError> {
    let loaded;
    let spec: &CanonicalSpec = match spec_path {
        Some(path) => {
            loaded = CanonicalSpec::load(path)?;
            &loaded
        }
        None => default_catalog(),
    };

    let mut conn = open_db(&db)?;
    if dry_run {
        let plan = preview(&conn, &owner, spec, &options)?;
        if plan.is_noop() {
            info!("event=cli_dry_run module=cli status=ok noop=true owner={owner}");
        }
        return print_json(&DryRunOutput {
            projected: plan.projected_report(),
            plan,
        });
    }

    let report = reconcile(&mut conn, &owner, spec, &options)?;
    print_json(&report)
}

fn cmd_show(db: PathBuf, owner: String) -> Result<(), CliError> {
    let conn = open_db(&db)?;
    let repo = SqliteCatalogRepository::try_new(&conn)?;
    let snapshot = read_snapshot(&repo, &owner)?;
    print_json(&snapshot)
}

#[derive(Serialize)]
struct DryRunOutput {
    plan: classcat_core::ReconciliationPlan,
    projected: classcat_core::ReconciliationReport,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
