use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::trace;

use super::file::SourceFile;
use crate::error::LocatorError;
use crate::utils::LOG_TARGET_SOURCE;

/// Parsed files keyed by canonical path.
///
/// One cache per thread: syn trees carry thread-local span data, so the cache
/// is neither `Send` nor `Sync`. Entries are never invalidated.
#[derive(Default)]
pub struct SourceCache {
    files: RefCell<HashMap<PathBuf, Rc<SourceFile>>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached file for `path`, reading and parsing it on first use.
    /// A failed load is not cached.
    pub fn load(&self, path: &Path) -> Result<Rc<SourceFile>, LocatorError> {
        let key = path.canonicalize().map_err(|e| LocatorError::source_read(path, &e))?;
        if let Some(file) = self.files.borrow().get(&key) {
            trace!(target: LOG_TARGET_SOURCE, "cache hit {}", key.display());
            return Ok(Rc::clone(file));
        }
        let file = Rc::new(SourceFile::load(&key)?);
        self.files.borrow_mut().insert(key, Rc::clone(&file));
        Ok(file)
    }

    pub fn contains(&self, path: &Path) -> bool {
        path.canonicalize()
            .is_ok_and(|key| self.files.borrow().contains_key(&key))
    }

    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn second_load_returns_the_same_entry() {
        let mut tmp = tempfile::Builder::new().suffix(".rs").tempfile().unwrap();
        writeln!(tmp, "fn main() {{ go(1); }}").unwrap();

        let cache = SourceCache::new();
        assert!(cache.is_empty());
        let first = cache.load(tmp.path()).unwrap();
        let second = cache.load(tmp.path()).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(tmp.path()));
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let mut tmp = tempfile::Builder::new().suffix(".rs").tempfile().unwrap();
        writeln!(tmp, "fn main() {{").unwrap();

        let cache = SourceCache::new();
        let err = cache.load(tmp.path()).err().expect("unbalanced brace");
        assert!(matches!(err, LocatorError::Parse { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_files_are_read_errors() {
        let cache = SourceCache::new();
        let err = cache
            .load(Path::new("definitely/not/here.rs"))
            .err()
            .expect("missing");
        assert!(matches!(
            err,
            LocatorError::SourceRead { kind: std::io::ErrorKind::NotFound, .. }
        ));
    }
}
