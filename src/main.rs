use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::SystemTime;

use anyhow::Context;
use clap::Parser as ClapParser;
use tracing::{error, info};

use clink::config::Config;
use clink::db::SymbolDatabase;
use clink::logging::{self, Verbosity};
use clink::repl;

/// A source-code cross-reference indexer for C, C++, and assembly.
#[derive(Debug, ClapParser)]
#[command(name = "clink", version, about)]
struct Args {
    /// Directories to scan (default: current directory).
    scan_roots: Vec<PathBuf>,

    /// Database location (default: walk upward from cwd for `.clink.db`, else `./clink.db`).
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,

    /// Do not rescan; query the existing database only.
    #[arg(short = 'd')]
    no_rescan: bool,

    /// Run the line-oriented Cscope-compatible REPL instead of exiting after the build.
    #[arg(short = 'l', long = "line-oriented")]
    line_oriented: bool,

    /// Worker thread count (`0` = number of cores).
    #[arg(short = 'j', long = "jobs", alias = "threads", default_value_t = 0)]
    jobs: usize,

    /// Additional C/C++ include directories (repeatable).
    #[arg(short = 'I', action = clap::ArgAction::Append)]
    include_dirs: Vec<PathBuf>,

    #[arg(long = "color", overrides_with = "no_color")]
    color: bool,

    #[arg(long = "no-color", overrides_with = "color")]
    no_color: bool,

    /// Raise logging verbosity (repeatable).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all but error-level logging.
    #[arg(long = "quiet")]
    quiet: bool,
}

fn verbosity(args: &Args) -> Verbosity {
    if args.quiet {
        Verbosity::Quiet
    } else if args.verbose > 0 {
        Verbosity::Verbose(args.verbose)
    } else {
        Verbosity::Normal
    }
}

fn build_config(args: &Args) -> anyhow::Result<Config> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let db_path = Config::resolve_db_path(args.file.clone(), &cwd).context("resolving database path")?;
    let scan_roots =
        Config::scan_roots_or_cwd(args.scan_roots.clone(), &cwd).context("resolving scan roots")?;
    let include_dirs =
        Config::include_dirs(args.include_dirs.clone()).context("resolving include directories")?;
    Ok(Config {
        db_path,
        scan_roots,
        jobs: Config::resolve_jobs(Some(args.jobs)),
        include_dirs,
        color: !args.no_color,
        rescan: !args.no_rescan,
    })
}

/// Read commands from stdin line by line until EOF, writing one reply per line to stdout.
/// This is the "single non-interactive entry point" spec §6 calls for; the curses/readline
/// loop a real editor integration would drive is out of scope here.
fn run_repl(db: &SymbolDatabase) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        let reply = match repl::parse_line(&line) {
            Some((command, query)) => repl::run_one(db, command, query),
            None => "cscope: 0 lines\n".to_string(),
        };
        stdout.write_all(reply.as_bytes())?;
        stdout.flush()?;
    }
    Ok(())
}

fn run(args: Args) -> anyhow::Result<()> {
    logging::init(verbosity(&args));

    let config = build_config(&args)?;
    // era_start must be the database's own mtime from before this build touches it (or the
    // epoch, if this is the first build) — `now()` would postdate every source file on disk
    // and the work queue would skip all of them.
    let era_start = std::fs::metadata(&config.db_path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let mut db = SymbolDatabase::open(&config.db_path).context("opening clink database")?;

    if config.rescan {
        clink::driver::build(&mut db, &config, era_start).context("building index")?;
        info!("index up to date at {}", config.db_path.display());
    }

    if args.line_oriented {
        run_repl(&db).context("running line-oriented REPL")?;
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
