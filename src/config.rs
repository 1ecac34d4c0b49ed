//! Ambient configuration (spec §6): where the database lives, how many workers to run, and
//! what the C/C++ parser's include path looks like. Resolved once in `main` and threaded
//! down to the driver and parser factory.

use std::path::{Path, PathBuf};

use crate::error::{ClinkError, Result};

const DB_FILENAME: &str = "clink.db";
const DB_DOTFILE: &str = ".clink.db";

/// Resolved settings for one build/query run.
pub struct Config {
    pub db_path: PathBuf,
    pub scan_roots: Vec<PathBuf>,
    pub jobs: usize,
    pub include_dirs: Vec<PathBuf>,
    pub color: bool,
    pub rescan: bool,
}

/// Expand a leading `~` the way a shell would, so `-f ~/.clink.db` and `-I ~/include` behave
/// as users expect instead of creating a literal `~` directory.
fn expand_tilde(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

impl Config {
    /// Resolve the database path: an explicit `--file`, or else walk upward from `cwd`
    /// looking for `.clink.db`, falling back to `./clink.db` if none is found.
    pub fn resolve_db_path(explicit: Option<PathBuf>, cwd: &Path) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return crate::path::abspath(&expand_tilde(&path));
        }

        let mut dir = cwd.to_path_buf();
        loop {
            let candidate = dir.join(DB_DOTFILE);
            if candidate.exists() {
                return Ok(candidate);
            }
            match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => break,
            }
        }

        crate::path::abspath(&cwd.join(DB_FILENAME))
    }

    /// Resolve the worker count: `0` or `"auto"` means "number of detected cores".
    pub fn resolve_jobs(requested: Option<usize>) -> usize {
        match requested {
            Some(0) | None => num_cpus::get(),
            Some(n) => n,
        }
    }

    pub fn scan_roots_or_cwd(roots: Vec<PathBuf>, cwd: &Path) -> Result<Vec<PathBuf>> {
        if roots.is_empty() {
            return Ok(vec![cwd.to_path_buf()]);
        }
        roots.iter().map(|r| crate::path::abspath(&expand_tilde(r))).collect()
    }

    pub fn include_dirs(dirs: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
        dirs.iter()
            .map(|d| crate::path::abspath(&expand_tilde(d)))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| ClinkError::invalid_argument(format!("bad include directory: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_db_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("custom.db");
        let resolved = Config::resolve_db_path(Some(explicit.clone()), dir.path()).unwrap();
        assert_eq!(resolved, explicit);
    }

    #[test]
    fn falls_back_to_default_filename() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = Config::resolve_db_path(None, dir.path()).unwrap();
        assert_eq!(resolved, dir.path().join(DB_FILENAME));
    }

    #[test]
    fn finds_dotfile_in_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(".clink.db"), "").unwrap();

        let resolved = Config::resolve_db_path(None, &nested).unwrap();
        assert_eq!(resolved, dir.path().join(DB_DOTFILE));
    }

    #[test]
    fn jobs_zero_or_none_means_auto() {
        assert_eq!(Config::resolve_jobs(Some(0)), num_cpus::get());
        assert_eq!(Config::resolve_jobs(None), num_cpus::get());
        assert_eq!(Config::resolve_jobs(Some(4)), 4);
    }
}
