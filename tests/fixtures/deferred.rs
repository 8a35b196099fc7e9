// Deferred calls for the call_locator fixture tests. Parsed, never compiled.

fn single_defer() {
    defer! { check("a", "b") } // marker: defer-single
    work();
} // marker: defer-single-end

fn defer_with_statements() {
    defer! {
        cleanup(path); // marker: defer-body
        report(done);
    }
}

fn two_defers() {
    defer! { first(1) }; defer! { second(2) }; // marker: defer-two
}

fn two_scoped_defers() {
    defer! { first(1) }
    defer! { second(2) }
} // marker: defer-two-end

fn guarded_defer() {
    if enabled() {
        scopeguard::defer! { finish(task) }
        run(task);
    } // marker: defer-in-if-end
}
