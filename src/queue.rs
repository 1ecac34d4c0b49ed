//! The work queue (spec §4.5), ported from `WorkQueue.cc`: a directory-handle stack plus a
//! highlight queue, serialised by one mutex. No lock is held across parser or highlighter
//! execution — callers `pop()`, drop the lock, do the work, then `push()` any follow-on file.

use std::collections::{HashSet, VecDeque};
use std::fs::ReadDir;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use tracing::{debug, trace};

/// Extensions the directory scan itself recognises as source files (spec §4.5). Files with
/// other extensions can still be parsed if named explicitly, but the scan does not discover
/// them.
const SCAN_EXTENSIONS: &[&str] = &["c", "cpp", "h", "hpp", "s", "S"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Parse(PathBuf),
    Highlight(PathBuf),
}

struct DirFrame {
    prefix: PathBuf,
    entries: ReadDir,
}

struct Inner {
    dir_stack: Vec<DirFrame>,
    files_to_highlight: VecDeque<PathBuf>,
    seen: HashSet<PathBuf>,
}

/// Shared by all worker threads. `pop`/`push` are each a single critical section; neither
/// blocks on I/O outside the mutex other than opening/reading directory handles.
pub struct WorkQueue {
    inner: Mutex<Inner>,
    era_start: SystemTime,
}

fn is_newer_than(path: &Path, era_start: SystemTime) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .is_ok_and(|mtime| mtime > era_start)
}

fn normalise(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

impl WorkQueue {
    /// Seed the queue with `root`. If `root` cannot be opened as a directory, the queue
    /// starts empty and `pop()` returns `None` immediately.
    pub fn new(root: &Path, era_start: SystemTime) -> Self {
        let mut dir_stack = Vec::new();
        if let Ok(entries) = std::fs::read_dir(root) {
            dir_stack.push(DirFrame { prefix: root.to_path_buf(), entries });
        } else {
            debug!(path = %root.display(), "work queue: root is not a readable directory");
        }

        WorkQueue {
            inner: Mutex::new(Inner {
                dir_stack,
                files_to_highlight: VecDeque::new(),
                seen: HashSet::new(),
            }),
            era_start,
        }
    }

    /// Pop the next unit of work. Highlight tasks are drained first: their files are
    /// typically still hot in the OS page cache from having just been parsed.
    pub fn pop(&self) -> Option<Task> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(path) = inner.files_to_highlight.pop_front() {
            return Some(Task::Highlight(path));
        }

        loop {
            let Some(frame) = inner.dir_stack.last_mut() else {
                return None;
            };

            match frame.entries.next() {
                None => {
                    inner.dir_stack.pop();
                    continue;
                }
                Some(Err(e)) => {
                    trace!("work queue: directory read error: {e}");
                    continue;
                }
                Some(Ok(entry)) => {
                    let Ok(file_type) = entry.file_type() else { continue };
                    let path = entry.path();

                    if file_type.is_dir() {
                        if let Ok(sub) = std::fs::read_dir(&path) {
                            inner.dir_stack.push(DirFrame { prefix: path, entries: sub });
                        }
                        continue;
                    }

                    if !file_type.is_file() {
                        continue;
                    }

                    let Some(ext) = path.extension().and_then(|e| e.to_str()) else { continue };
                    if !SCAN_EXTENSIONS.contains(&ext) {
                        continue;
                    }

                    if !is_newer_than(&path, self.era_start) {
                        continue;
                    }

                    return Some(Task::Parse(normalise(&path)));
                }
            }
        }
    }

    /// Enqueue `path` for highlighting, unless it has already been enqueued, has not
    /// changed since `era_start`, or is unreadable.
    pub fn push(&self, path: PathBuf) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.seen.insert(path.clone()) {
            return;
        }
        if !is_newer_than(&path, self.era_start) {
            return;
        }
        inner.files_to_highlight.push_back(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    #[test]
    fn discovers_recognised_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let era_start = SystemTime::now() - Duration::from_secs(60);
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.c"), "").unwrap();
        fs::write(dir.path().join("sub/b.s"), "").unwrap();
        fs::write(dir.path().join("readme.md"), "").unwrap();

        let queue = WorkQueue::new(dir.path(), era_start);
        let mut parsed = Vec::new();
        while let Some(Task::Parse(path)) = queue.pop() {
            parsed.push(path);
        }
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn push_dedups_and_respects_era() {
        let dir = tempfile::tempdir().unwrap();
        let era_start = SystemTime::now() - Duration::from_secs(60);
        let file = dir.path().join("x.c");
        fs::write(&file, "").unwrap();

        let queue = WorkQueue::new(dir.path(), era_start);
        // drain the directory scan first so only the highlight queue remains
        while queue.pop().is_some() {}

        queue.push(file.clone());
        queue.push(file.clone());
        assert_eq!(queue.pop(), Some(Task::Highlight(file)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn unreadable_root_yields_no_work() {
        let queue = WorkQueue::new(Path::new("/nonexistent/does/not/exist"), SystemTime::now());
        assert_eq!(queue.pop(), None);
    }
}
