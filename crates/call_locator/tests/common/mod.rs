#![allow(dead_code)]

use std::path::PathBuf;

use call_locator::{Frame, NoStack, ResolutionError, Resolver};
use locator_test_utils::{line_of, read_fixture};

/// Runs the wrapped closure when dropped.
pub struct Deferred<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> Deferred<F> {
    pub fn new(f: F) -> Self {
        Self(Some(f))
    }
}

impl<F: FnOnce()> Drop for Deferred<F> {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

/// Runs its body when the enclosing scope ends.
macro_rules! defer {
    ($($body:tt)*) => {
        let _guard = $crate::common::Deferred::new(|| { $($body)* });
    };
}
pub(crate) use defer;

/// A fixture's path together with its text.
pub struct Fixture {
    pub path: PathBuf,
    pub source: String,
}

impl Fixture {
    pub fn load(name: &str) -> Self {
        let (path, source) = read_fixture(name);
        Self { path, source }
    }

    pub fn line(&self, marker: &str) -> usize {
        line_of(&self.source, &format!("marker: {marker}"))
    }

    /// Frame for the marked line, without a column.
    pub fn frame(&self, marker: &str) -> Frame {
        Frame::new(&self.path, self.line(marker), None)
    }

    /// Frame for the marked line with the column of the first `needle` on it.
    pub fn frame_at(&self, marker: &str, needle: &str) -> Frame {
        let line = self.line(marker);
        let text = self
            .source
            .lines()
            .nth(line - 1)
            .expect("marked line exists");
        let byte = text
            .find(needle)
            .unwrap_or_else(|| panic!("{needle:?} not on line {line}"));
        Frame::new(&self.path, line, Some(text[..byte].chars().count()))
    }
}

/// A resolver that only accepts explicit frames.
pub fn fixture_resolver() -> Resolver<NoStack> {
    Resolver::new(NoStack)
}

pub fn argument(fixture: &Fixture, marker: &str, index: usize) -> Result<String, ResolutionError> {
    fixture_resolver().formatted_argument_at(&fixture.frame(marker), index)
}

pub fn arguments(fixture: &Fixture, marker: &str) -> Result<Vec<String>, ResolutionError> {
    fixture_resolver().argument_texts_at(&fixture.frame(marker))
}
