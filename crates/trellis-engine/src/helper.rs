use crate::context::TestingT;
use std::fmt::Display;
use std::sync::Arc;

/// Run `tester` as a subtest for each of `values`, in order.
///
/// Subtests are named by each value's `Display` form, so values should print
/// legibly.
pub fn each<V, F>(t: &mut dyn TestingT, values: impl IntoIterator<Item = V>, tester: F)
where
    V: Display + Send + Sync + 'static,
    F: Fn(&mut dyn TestingT, &V) + Send + Sync + 'static,
{
    let tester = Arc::new(tester);
    for value in values {
        let name = value.to_string();
        let tester = Arc::clone(&tester);
        t.subtest(&name, move |t| tester(t, &value));
    }
}
