//! The build driver (spec §4.6), generalising the single-threaded reference `build.c` loop
//! into a `std::thread` worker pool over the shared [`WorkQueue`].

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::db::SymbolDatabase;
use crate::error::Result;
use crate::highlight::{Highlighter, HtmlHighlighter};
use crate::parsing::factory;
use crate::queue::{Task, WorkQueue};

/// A directory scan per configured root, tried in order. Highlight tasks pushed mid-build
/// land in whichever queue is first; which root they came from does not matter once a file
/// has been identified.
struct QueueSet {
    queues: Vec<WorkQueue>,
}

impl QueueSet {
    fn pop(&self) -> Option<Task> {
        for queue in &self.queues {
            if let Some(task) = queue.pop() {
                return Some(task);
            }
        }
        None
    }

    fn push(&self, path: PathBuf) {
        if let Some(queue) = self.queues.first() {
            queue.push(path);
        }
    }
}

fn record_stamp(path: &std::path::Path) -> (u64, i64) {
    let hash = crate::path::hash(path).unwrap_or(0);
    let timestamp = crate::path::mtime(path)
        .ok()
        .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    (hash, timestamp)
}

/// Run one build: scan `config.scan_roots`, parse and highlight everything newer than
/// `era_start`, and commit the results to `db` as one transaction.
///
/// SIGINT does not abort mid-write: the handler only flips an `AtomicBool` that worker
/// threads poll between tasks, so the transaction is always either fully committed or rolled
/// back, never left half-applied.
pub fn build(db: &mut SymbolDatabase, config: &Config, era_start: SystemTime) -> Result<()> {
    let queues = QueueSet {
        queues: config
            .scan_roots
            .iter()
            .map(|root| WorkQueue::new(root, era_start))
            .collect(),
    };

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let flag = interrupted.clone();
        // Best effort: in tests that run several builds in one process a second call
        // returns an error, which is harmless to ignore here.
        let _ = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst));
    }

    db.begin_transaction()?;
    let db_mutex = Mutex::new(db);

    let jobs = config.jobs.max(1);
    let worker_err: Mutex<Option<crate::error::ClinkError>> = Mutex::new(None);

    std::thread::scope(|scope| {
        for worker_id in 0..jobs {
            scope.spawn(|| {
                if let Err(e) = worker_loop(worker_id, &queues, &db_mutex, &interrupted, config) {
                    worker_err.lock().unwrap().get_or_insert(e);
                }
            });
        }
    });

    let db = db_mutex.into_inner().unwrap();
    if let Some(e) = worker_err.into_inner().unwrap() {
        warn!("build failed, rolling back: {e}");
        db.rollback_transaction()?;
        return Err(e);
    }

    db.commit_transaction()?;
    let started: chrono::DateTime<chrono::Utc> = era_start.into();
    info!(since = %started.to_rfc3339(), "build committed");

    if interrupted.load(Ordering::SeqCst) {
        return Err(crate::error::ClinkError::Interrupted);
    }
    Ok(())
}

fn worker_loop(
    worker_id: usize,
    queues: &QueueSet,
    db: &Mutex<&mut SymbolDatabase>,
    interrupted: &AtomicBool,
    config: &Config,
) -> Result<()> {
    loop {
        if interrupted.load(Ordering::SeqCst) {
            debug!(worker_id, "saw interrupt, exiting");
            return Ok(());
        }

        let Some(task) = queues.pop() else {
            return Ok(());
        };

        match task {
            Task::Parse(path) => {
                debug!(worker_id, path = %path.display(), "parsing");
                {
                    let db = db.lock().unwrap();
                    db.remove(&path)?;
                }

                let Some(parser) = factory::select(&path, config) else {
                    warn!(path = %path.display(), "no parser recognises this file, skipping");
                    continue;
                };

                match parser.parse(&path) {
                    Ok(symbols) => {
                        let (hash, timestamp) = record_stamp(&path);
                        let db = db.lock().unwrap();
                        db.add_record(&path, hash, timestamp)?;
                        for symbol in &symbols {
                            if symbol.path != path && db.find_record(&symbol.path).is_err() {
                                let (hash, timestamp) = record_stamp(&symbol.path);
                                db.add_record(&symbol.path, hash, timestamp)?;
                            }
                            db.add_symbol(symbol)?;
                        }
                        drop(db);

                        let mut to_highlight: HashSet<PathBuf> = HashSet::new();
                        to_highlight.insert(path.clone());
                        for symbol in &symbols {
                            to_highlight.insert(symbol.path.clone());
                        }
                        for referenced in to_highlight {
                            queues.push(referenced);
                        }
                    }
                    Err(e) => {
                        warn!(path = %path.display(), "parser failed, skipping file: {e}");
                    }
                }
            }
            Task::Highlight(path) => {
                debug!(worker_id, path = %path.display(), "highlighting");
                let highlighter = HtmlHighlighter;
                match highlighter.highlight(&path) {
                    Ok(lines) => {
                        let db = db.lock().unwrap();
                        for (lineno, body) in lines {
                            db.add_line(&path, lineno, &body)?;
                        }
                    }
                    Err(e) => {
                        warn!(path = %path.display(), "highlighter failed, skipping file: {e}");
                    }
                }
            }
        }
    }
}
