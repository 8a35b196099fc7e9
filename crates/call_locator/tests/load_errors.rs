use std::io::{ErrorKind, Write};
use std::path::Path;

use call_locator::{Frame, LocatorError, NoStack, Resolver, SourceCache, SourceFile};

#[test]
fn missing_source_file() {
    let frame = Frame::new("no/such/source_file.rs", 3, None);
    let err = Resolver::new(NoStack)
        .formatted_argument_at(&frame, 0)
        .unwrap_err();
    match err.kind() {
        LocatorError::SourceRead { path, kind, .. } => {
            assert_eq!(path, Path::new("no/such/source_file.rs"));
            assert_eq!(*kind, ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.frame(), Some((Path::new("no/such/source_file.rs"), 3)));
}

#[test]
fn non_utf8_source_is_a_read_error() {
    let mut tmp = tempfile::Builder::new().suffix(".rs").tempfile().unwrap();
    tmp.write_all(&[0x66, 0x6e, 0x20, 0xff, 0xfe]).unwrap();
    let err = SourceFile::load(tmp.path()).err().expect("invalid utf-8");
    assert!(matches!(
        err,
        LocatorError::SourceRead { kind: ErrorKind::InvalidData, .. }
    ));
}

#[test]
fn malformed_source_is_a_parse_error() {
    let path = locator_test_utils::malformed_fixtures_dir().join("unbalanced_call.rs");
    let err = Resolver::new(NoStack)
        .formatted_argument_at(&Frame::new(&path, 4, None), 0)
        .unwrap_err();
    match err.kind() {
        LocatorError::Parse { path: failed, message, .. } => {
            assert!(failed.ends_with("unbalanced_call.rs"));
            assert!(!message.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("failed to parse"));
}

#[test]
fn injected_caches_are_used() {
    let mut tmp = tempfile::Builder::new().suffix(".rs").tempfile().unwrap();
    writeln!(tmp, "fn t() {{\n    check(first, second);\n}}").unwrap();

    let cache = SourceCache::new();
    cache.load(tmp.path()).unwrap();
    let resolver = Resolver::new(NoStack).with_cache(cache);
    assert_eq!(resolver.cache().len(), 1);
    assert_eq!(
        resolver
            .formatted_argument_at(&Frame::new(tmp.path(), 2, None), 1)
            .unwrap(),
        "second"
    );
    assert_eq!(resolver.cache().len(), 1);
}
