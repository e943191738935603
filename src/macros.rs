//! Macros used throughout the crate.

/// Time the given expression and push the `(label, duration)` pair onto `$timers`. Evaluates to
/// the value of the expression.
///
/// ```rust,ignore
/// let mut timers = vec![];
/// let out = time!(timers, "v1", run_workload(...)?);
/// ```
#[macro_export]
macro_rules! time {
    ($timers:ident, $label:expr, $expr:expr) => {{
        let start = std::time::Instant::now();
        let result = $expr;
        let duration = std::time::Instant::now() - start;
        $timers.push(($label, duration));
        result
    }};
}
