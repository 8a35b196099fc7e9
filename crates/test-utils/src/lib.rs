use std::fs;
use std::path::PathBuf;

pub use locator_common::{fixture_path, fixtures_dir, malformed_fixtures_dir, workspace_root};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs a stderr subscriber for tests. `RUST_LOG` wins over `level` when set,
/// e.g. `RUST_LOG=locator_scan=trace`.
///
/// Returns `false` when another test already installed a global subscriber.
pub fn init_test_tracing(level: Level) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level}")));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .without_time()
        .with_test_writer()
        .try_init()
        .is_ok()
}

/// Reads a fixture from the workspace `tests/fixtures` directory.
pub fn read_fixture(fixture_name: &str) -> (PathBuf, String) {
    let path = fixture_path(fixture_name);
    let source = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {e}", path.display()));
    (path, source)
}

/// 1-based line number of the first line containing `marker`.
///
/// Fixtures tag the lines under test with `// marker: <name>` comments so tests
/// do not hard-code line numbers.
pub fn line_of(source: &str, marker: &str) -> usize {
    source
        .lines()
        .position(|line| line.contains(marker))
        .map(|idx| idx + 1)
        .unwrap_or_else(|| panic!("marker {marker:?} not found in fixture"))
}
