//! `labstyle` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments and map them onto `labstyle_core` use cases.
//! - Translate outcomes into exit codes.
//!
//! # Invariants
//! - Exit code `0` means clean, `1` means findings at or above the fail
//!   threshold, `2` means the run itself failed.
//! - Reports go to stdout, diagnostics to stderr.

use clap::{Args, Parser, Subcommand};
use labstyle_core::db::{open_db, DbError};
use labstyle_core::repo::run_repo::RunId;
use labstyle_core::{
    default_log_level, init_logging, parse_severity, render, render_rules, ConfigError,
    EngineError, LintConfig, LintService, Linter, LoggingError, RegistryError, RepoError,
    ReportError, ReportFormat, RuleRegistry, RunRepository, ServiceError, Severity,
    SqliteBaselineRepository, SqliteRunRepository,
};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const EXIT_FAILURE: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "labstyle", version, about = "Checks Rust workspaces against the lab conventions")]
struct Cli {
    /// Log level for the rolling log file (trace|debug|info|warn|error).
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Directory for rolling log files; logging is off without it.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check a workspace and print findings.
    Check(CheckArgs),
    /// List the built-in rules.
    Rules {
        #[arg(long, default_value = "text")]
        format: ReportFormat,
    },
    /// Manage the accepted-findings baseline.
    Baseline {
        #[command(subcommand)]
        action: BaselineAction,
    },
    /// Show recorded runs.
    History {
        #[arg(long)]
        db: PathBuf,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        /// Print the findings of one recorded run instead.
        #[arg(long)]
        run: Option<RunId>,
    },
}

#[derive(Debug, Args)]
struct CheckArgs {
    #[arg(default_value = ".")]
    path: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "text")]
    format: ReportFormat,
    #[arg(long, default_value = "error", value_parser = parse_fail_on)]
    fail_on: Severity,
    /// Baseline store; when set, baseline findings are hidden and the run is recorded.
    #[arg(long)]
    db: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum BaselineAction {
    /// Accept every current finding.
    Accept {
        #[arg(default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        db: PathBuf,
    },
    /// Forget the accepted findings.
    Clear {
        #[arg(default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        db: PathBuf,
    },
}

#[derive(Debug)]
enum CliError {
    Logging(LoggingError),
    Config(ConfigError),
    Engine(EngineError),
    Registry(RegistryError),
    Db(DbError),
    Repo(RepoError),
    Service(ServiceError),
    Report(ReportError),
    Io(std::io::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Engine(err) => write!(f, "{err}"),
            Self::Registry(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "baseline store: {err}"),
            Self::Repo(err) => write!(f, "baseline store: {err}"),
            Self::Service(err) => write!(f, "{err}"),
            Self::Report(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CliError {}

macro_rules! impl_from {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(impl From<$source> for CliError {
            fn from(value: $source) -> Self {
                Self::$variant(value)
            }
        })*
    };
}

impl_from!(
    LoggingError => Logging,
    ConfigError => Config,
    EngineError => Engine,
    RegistryError => Registry,
    DbError => Db,
    RepoError => Repo,
    ServiceError => Service,
    ReportError => Report,
    std::io::Error => Io,
);

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = start_logging(level, log_dir) {
            eprintln!("labstyle: error: {err}");
            return ExitCode::from(EXIT_FAILURE);
        }
    }

    match run(cli.command) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("labstyle: error: {err}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn start_logging(level: &str, log_dir: &Path) -> Result<(), CliError> {
    let log_dir = if log_dir.is_absolute() {
        log_dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(log_dir)
    };
    init_logging(level, &log_dir)?;
    Ok(())
}

fn run(command: Command) -> Result<u8, CliError> {
    match command {
        Command::Check(args) => check(&args),
        Command::Rules { format } => {
            let registry = RuleRegistry::with_builtin_rules()?;
            print!("{}", render_rules(&registry.descriptors(), format)?);
            Ok(0)
        }
        Command::Baseline { action } => baseline(action),
        Command::History { db, limit, run } => history(&db, limit, run),
    }
}

fn check(args: &CheckArgs) -> Result<u8, CliError> {
    let linter = build_linter(&args.path, args.config.as_deref())?;
    let report = match &args.db {
        Some(db) => {
            let conn = open_db(db)?;
            let service = LintService::new(
                linter,
                SqliteRunRepository::new(&conn),
                SqliteBaselineRepository::new(&conn),
            );
            let (report, run) = service.check(&args.path)?;
            info!("event=cli_check module=cli status=ok run_id={}", run.id);
            report
        }
        None => linter.check(&args.path)?,
    };

    print!("{}", render(&report, args.format)?);
    Ok(report.exit_code(args.fail_on))
}

fn baseline(action: BaselineAction) -> Result<u8, CliError> {
    match action {
        BaselineAction::Accept { path, config, db } => {
            let linter = build_linter(&path, config.as_deref())?;
            let conn = open_db(&db)?;
            let service = LintService::new(
                linter,
                SqliteRunRepository::new(&conn),
                SqliteBaselineRepository::new(&conn),
            );
            let accepted = service.accept_baseline(&path)?;
            println!("accepted {accepted} finding(s) into the baseline");
        }
        BaselineAction::Clear { path, db } => {
            let linter = Linter::with_builtin_rules(&LintConfig::default())?;
            let conn = open_db(&db)?;
            let service = LintService::new(
                linter,
                SqliteRunRepository::new(&conn),
                SqliteBaselineRepository::new(&conn),
            );
            let removed = service.clear_baseline(&path)?;
            println!("removed {removed} baseline entr{}", if removed == 1 { "y" } else { "ies" });
        }
    }
    Ok(0)
}

fn history(db: &Path, limit: u32, run: Option<RunId>) -> Result<u8, CliError> {
    let conn = open_db(db)?;
    let runs = SqliteRunRepository::new(&conn);

    if let Some(run_id) = run {
        for finding in runs.run_findings(run_id)? {
            println!(
                "{}: {}[{}]: {}",
                finding.location, finding.severity, finding.rule_id, finding.message
            );
        }
        return Ok(0);
    }

    let recorded = runs.list_runs(limit)?;
    if recorded.is_empty() {
        println!("no recorded runs");
    }
    for run in recorded {
        println!(
            "{}  {}  {}  {} error(s), {} warning(s), {} info, {} hidden by baseline",
            run.id,
            run.created_at,
            run.root,
            run.error_count,
            run.warning_count,
            run.info_count,
            run.baseline_suppressed
        );
    }
    Ok(0)
}

fn build_linter(root: &Path, config: Option<&Path>) -> Result<Linter, CliError> {
    let config = LintConfig::load_for_root(root, config)?;
    Ok(Linter::with_builtin_rules(&config)?)
}

fn parse_fail_on(value: &str) -> Result<Severity, String> {
    parse_severity(value).map_err(|err| err.to_string())
}
