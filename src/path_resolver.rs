//! Executable and path-token resolution
//!
//! Both functions are best-effort: they never fail an invocation, they only
//! fall back to a less precise answer.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Resolve the executable that ran.
///
/// Order of attempts:
/// 1. canonicalize `invoked`, joined onto `cwd` when relative (symlinks and
///    `..` resolved)
/// 2. first directory of `search_path` containing an entry named `tool_name`
/// 3. `tool_name` verbatim
pub fn resolve_executable(
    invoked: &str,
    tool_name: &str,
    cwd: &Path,
    search_path: Option<&OsStr>,
) -> String {
    if !invoked.is_empty() {
        let path = Path::new(invoked);
        let candidate = if path.is_relative() {
            cwd.join(path)
        } else {
            path.to_path_buf()
        };
        if let Ok(canonical) = std::fs::canonicalize(&candidate) {
            return canonical.to_string_lossy().into_owned();
        }
    }

    if let Some(found) = search_path.and_then(|paths| find_in_path(tool_name, paths)) {
        tracing::debug!(
            invoked,
            found = %found.display(),
            "executable not canonicalizable, found on PATH"
        );
        return found.to_string_lossy().into_owned();
    }

    tracing::debug!(invoked, tool_name, "executable not found, logging bare name");
    tool_name.to_string()
}

/// First `dir/name` with an existing filesystem entry, in `PATH` order
fn find_in_path(name: &str, search_path: &OsStr) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.exists())
}

/// Make a path token absolute against `cwd` without touching the filesystem.
///
/// `.` segments are dropped and `..` segments fold into their parent
/// (never above the root). Symlinks are not resolved. Already-absolute,
/// normalized input comes back unchanged, so applying this twice is the same
/// as applying it once. Returns `None` only for an empty token.
pub fn make_absolute(token: &str, cwd: &Path) -> Option<String> {
    if token.is_empty() {
        return None;
    }

    let path = Path::new(token);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }

    Some(normalized.to_string_lossy().into_owned())
}
