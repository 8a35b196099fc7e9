//! Reading and parsing source files, and the per-thread cache of parsed files.

mod cache;
mod file;

pub use cache::SourceCache;
pub use file::SourceFile;
pub(crate) use file::MacroBody;

use std::env;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::utils::{LOG_TARGET_SOURCE, LogStyle};

/// Turns a frame path into something that can be opened.
///
/// rustc records workspace-relative paths (`crates/foo/src/lib.rs`) for local
/// crates, while tests run with the package directory as the working
/// directory. Relative paths are tried against the current directory and its
/// ancestors, then against `CARGO_MANIFEST_DIR` and its ancestors. The path is
/// returned unchanged when no candidate exists so the read error names it.
pub fn resolve_source_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let roots = env::current_dir()
        .ok()
        .into_iter()
        .chain(env::var_os("CARGO_MANIFEST_DIR").map(PathBuf::from));
    for root in roots {
        if let Some(found) = root
            .ancestors()
            .map(|dir| dir.join(path))
            .find(|candidate| candidate.is_file())
        {
            let shown = found.display().to_string();
            trace!(target: LOG_TARGET_SOURCE, "resolved {} -> {}", path.display(), shown.as_str().log_path());
            return found;
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_paths_are_kept() {
        let path = env::temp_dir().join("does_not_exist_call_locator.rs");
        assert_eq!(resolve_source_path(&path), path);
    }

    #[test]
    fn relative_paths_resolve_against_ancestors() {
        // The unit test binary runs from the package directory; this very file is
        // reachable both as `src/...` and, from the workspace root, as `crates/...`.
        let from_package = resolve_source_path(Path::new("src/source/mod.rs"));
        assert!(from_package.is_file());
        let from_workspace =
            resolve_source_path(Path::new("crates/call_locator/src/source/mod.rs"));
        assert!(from_workspace.is_file());
    }

    #[test]
    fn unknown_relative_paths_are_returned_unchanged() {
        let path = Path::new("no/such/dir/file.rs");
        assert_eq!(resolve_source_path(path), path);
    }
}
