// Call sites for the call_locator fixture tests. Parsed, never compiled.
// Tests find lines through the `marker:` comments.

fn single_line() {
    check(a, b, "this text"); // marker: single
}

fn multi_line() {
    check( // marker: multi-start
        first,
        second.field, // marker: multi-middle
        "third",
    ); // marker: multi-end
}

fn conditional() {
    if let Some(user) = lookup(id, "admin") { // marker: if-let
        grant(user);
    } else if retry(id) { // marker: else-if
        deny();
    }
}

fn same_line() {
    let total = add(one(1), two(2)); // marker: same-line
}

fn methods() {
    let found = list.iter().contains(&needle); // marker: method
}

fn inside_macros() {
    assert!(is_valid(input.trim()), "bad input"); // marker: macro-arg
    assert_eq!(compute(left, right), 42); // marker: assert-eq
}

fn literals() {
    check(-1, 2.5, 'c', r"raw", b"bytes", true, value); // marker: literals
}

fn expressions() {
    check(&items[0], x as u64, |v| v + 1, Point { x: 1, y: 2 }, (a, b)); // marker: expressions
}

fn no_call() {
    let sum = 1 + 2; // marker: no-call
}

fn commented_out() {
    // check(a, b); marker: comment-only
    go(b);
    /* check(c);
       marker: block-comment */
}
