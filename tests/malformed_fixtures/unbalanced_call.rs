// Malformed on purpose: the call on line 5 is never closed.

fn broken() {
    let ok = check(a);
    check(a, b
}
