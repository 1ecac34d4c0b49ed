//! Path normalisation, canonicalisation, and comparison (spec §4.1).
//!
//! Every function here is pure: none mutates a caller-owned buffer, and results are always
//! freshly allocated `PathBuf`/`String` values.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{ClinkError, Result};

/// Join `branch` and `stem`, collapsing any redundant `/`s at the seam.
///
/// Mirrors the original `join()`: strip trailing slashes off `branch`, strip leading slashes
/// off `stem`, then join with exactly one `/`. `join("/", "hello")` is `"/hello"`.
pub fn join(branch: &str, stem: &str) -> Result<PathBuf> {
    if branch.is_empty() {
        return Err(ClinkError::invalid_argument("join: empty branch"));
    }
    if stem.is_empty() {
        return Err(ClinkError::invalid_argument("join: empty stem"));
    }

    let prefix = branch.trim_end_matches('/');
    let suffix = stem.trim_start_matches('/');

    if prefix.is_empty() {
        // branch was all slashes, i.e. the root.
        return Ok(PathBuf::from(format!("/{suffix}")));
    }

    Ok(PathBuf::from(format!("{prefix}/{suffix}")))
}

/// Does `path` resolve to the filesystem root?
///
/// Resolution follows symlinks and collapses `.`/`..`, so `/foo/..`, `/.`, and `//` all
/// count as root while `/foo` does not.
pub fn is_root(path: &Path) -> bool {
    match path.canonicalize() {
        Ok(resolved) => resolved == Path::new("/"),
        Err(_) => false,
    }
}

/// The parent directory of `path`, ignoring trailing slashes and normalising the root case.
///
/// Accepts relative paths too (`dirname("hello/world") == "hello"`) — despite the
/// "assume absolute" framing in the upstream implementation this was ported from, its own
/// test suite exercises relative inputs, so that is the behaviour preserved here.
pub fn dirname(path: &str) -> Result<PathBuf> {
    if path.is_empty() {
        return Err(ClinkError::invalid_argument("dirname: empty path"));
    }

    if path.starts_with('/') && is_root(Path::new(path)) {
        return Ok(PathBuf::from("/"));
    }

    let bytes = path.as_bytes();
    let mut i = bytes.len() - 1;
    while i > 0 && bytes[i] == b'/' {
        i -= 1;
    }
    while i > 0 && bytes[i] != b'/' {
        i -= 1;
    }

    if i == 0 {
        Ok(PathBuf::from("/"))
    } else {
        Ok(PathBuf::from(&path[..i]))
    }
}

/// Render `path` the way a user would want to see it relative to the current directory:
/// `.` if it *is* the cwd, a relative suffix if the cwd is a prefix, otherwise the absolute
/// canonical path.
pub fn disppath(path: &Path) -> Result<PathBuf> {
    let resolved = path.canonicalize()?;
    let cwd = std::env::current_dir()?;

    if resolved == cwd {
        return Ok(PathBuf::from("."));
    }

    if let Ok(suffix) = resolved.strip_prefix(&cwd) {
        return Ok(suffix.to_path_buf());
    }

    Ok(resolved)
}

/// Make `path` absolute by joining it to the current directory if it is relative. Unlike
/// [`canonicalize`] this does not resolve symlinks or `.`/`..` components.
pub fn abspath(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(path))
}

/// Symlink-resolving realpath. Fails with the underlying I/O error if the path does not
/// exist.
pub fn canonicalize(path: &Path) -> Result<PathBuf> {
    Ok(path.canonicalize()?)
}

/// Last-modified time of `path`.
pub fn mtime(path: &Path) -> Result<SystemTime> {
    Ok(std::fs::metadata(path)?.modified()?)
}

/// Content hash of `path`, used to populate `FileRecord.hash` for change detection.
pub fn hash(path: &Path) -> Result<u64> {
    let bytes = std::fs::read(path)?;
    let digest = blake3::hash(&bytes);
    tracing::trace!(path = %path.display(), digest = %hex::encode(digest.as_bytes()), "hashed file");
    // Fold the 256-bit digest down to a u64 for the `records.hash` column; we only need
    // change detection, not cryptographic strength at rest.
    let raw = digest.as_bytes();
    Ok(u64::from_le_bytes(raw[0..8].try_into().unwrap()))
}

/// Require that `path` is absolute, per the "any DB-bound API fails with InvalidArgument if
/// given a relative path" contract in spec §4.1/§4.2.
pub fn require_absolute(path: &Path) -> Result<()> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(ClinkError::invalid_argument(format!(
            "path is not absolute: {}",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_simple() {
        assert_eq!(join("hello", "world").unwrap(), PathBuf::from("hello/world"));
        assert_eq!(join("/hello", "world").unwrap(), PathBuf::from("/hello/world"));
        assert_eq!(
            join("/hello", "world/foo/bar").unwrap(),
            PathBuf::from("/hello/world/foo/bar")
        );
    }

    #[test]
    fn join_collapses_redundant_slashes() {
        assert_eq!(join("hello/", "world").unwrap(), PathBuf::from("hello/world"));
        assert_eq!(join("hello//", "world").unwrap(), PathBuf::from("hello/world"));
        assert_eq!(join("hello", "/world").unwrap(), PathBuf::from("hello/world"));
        assert_eq!(join("hello/", "/world").unwrap(), PathBuf::from("hello/world"));
        assert_eq!(join("hello//", "//world").unwrap(), PathBuf::from("hello/world"));
    }

    #[test]
    fn join_root_directory() {
        assert_eq!(join("/", "hello").unwrap(), PathBuf::from("/hello"));
        assert_eq!(join("/", "hello/world").unwrap(), PathBuf::from("/hello/world"));
        assert_eq!(join("/", "/hello").unwrap(), PathBuf::from("/hello"));
    }

    #[test]
    fn join_rejects_empty() {
        assert!(join("", "world").is_err());
        assert!(join("hello", "").is_err());
    }

    #[test]
    fn is_root_holds_for_root_variants() {
        assert!(is_root(Path::new("/")));
        assert!(is_root(Path::new("//")));
        assert!(is_root(Path::new("/.")));
        assert!(is_root(Path::new("/../..")));
    }

    #[test]
    fn is_root_does_not_hold_for_non_root() {
        assert!(!is_root(Path::new("/nonexistent-dir-xyz")));
    }

    #[test]
    fn dirname_simple_cases() {
        assert_eq!(dirname("/hello/world").unwrap(), PathBuf::from("/hello"));
        assert_eq!(
            dirname("/hello/world/foo/bar").unwrap(),
            PathBuf::from("/hello/world/foo")
        );
    }

    #[test]
    fn dirname_ignores_trailing_slashes() {
        assert_eq!(dirname("/hello/world/").unwrap(), PathBuf::from("/hello"));
        assert_eq!(dirname("/hello/world//").unwrap(), PathBuf::from("/hello"));
        assert_eq!(
            dirname("/hello/world/foo/bar/").unwrap(),
            PathBuf::from("/hello/world/foo")
        );
    }

    #[test]
    fn dirname_normalises_root_result() {
        assert_eq!(dirname("/hello").unwrap(), PathBuf::from("/"));
        assert_eq!(dirname("/hello/").unwrap(), PathBuf::from("/"));
        assert_eq!(dirname("/").unwrap(), PathBuf::from("/"));
        assert_eq!(dirname("//").unwrap(), PathBuf::from("/"));
        assert_eq!(dirname("///").unwrap(), PathBuf::from("/"));
    }

    #[test]
    fn dirname_accepts_relative_input() {
        assert_eq!(dirname("hello/world").unwrap(), PathBuf::from("hello"));
        assert_eq!(
            dirname("hello/world/foo/bar").unwrap(),
            PathBuf::from("hello/world/foo")
        );
        assert_eq!(dirname("hello/world/").unwrap(), PathBuf::from("hello"));
    }
}
