//! Path-overlap merge of a chunk name onto a resolution base.

use url::Url;

use crate::error_handling::ReconcileError;

/// Merges a loader-produced file name onto `base`.
///
/// - `http://` / `https://` names are returned unchanged
/// - `//host/...` names take the base's scheme
/// - `/path` names join to the base origin
/// - otherwise the longest suffix of the base directory that equals a prefix
///   of the name is overlapped, and `directory + remainder` is resolved
///   against the origin
///
/// With base `https://cdn.example.com/static/js/app.abc123.js` and name
/// `js/chunk.def456.js` the result is
/// `https://cdn.example.com/static/js/chunk.def456.js`.
pub fn merge_chunk_url(base: &Url, name: &str) -> Result<Url, ReconcileError> {
    let join_err = |path: &str, source| ReconcileError::Join {
        path: path.to_string(),
        base: base.to_string(),
        source,
    };

    if name.starts_with("http://") || name.starts_with("https://") {
        return Url::parse(name).map_err(|e| join_err(name, e));
    }
    if name.starts_with("//") {
        let absolute = format!("{}:{}", base.scheme(), name);
        return Url::parse(&absolute).map_err(|e| join_err(&absolute, e));
    }
    if base.cannot_be_a_base() || base.host_str().is_none() {
        return Err(ReconcileError::OpaqueBase(base.to_string()));
    }
    if name.starts_with('/') {
        return base.join(name).map_err(|e| join_err(name, e));
    }

    let dir = base_directory(base);
    let name_segments: Vec<&str> = name
        .trim_start_matches("./")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let overlap = longest_overlap(&dir, &name_segments);
    let merged: Vec<&str> = dir
        .iter()
        .copied()
        .chain(name_segments[overlap..].iter().copied())
        .collect();
    let path = format!("/{}", merged.join("/"));

    base.join(&path).map_err(|e| join_err(&path, e))
}

/// Plain RFC 3986 relative resolution, used when the merge fails.
pub fn naive_join(base: &Url, name: &str) -> Option<Url> {
    base.join(name).ok()
}

/// Directory segments of the base path; a trailing file name is dropped.
fn base_directory(base: &Url) -> Vec<&str> {
    let path = base.path();
    let dir = match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    };
    dir.split('/').filter(|s| !s.is_empty()).collect()
}

/// Length of the longest suffix of `dir` equal to a prefix of `name`,
/// leaving at least the file name of `name` unmatched.
fn longest_overlap(dir: &[&str], name: &[&str]) -> usize {
    let max = dir.len().min(name.len().saturating_sub(1));
    (1..=max)
        .rev()
        .find(|&k| dir[dir.len() - k..] == name[..k])
        .unwrap_or(0)
}
