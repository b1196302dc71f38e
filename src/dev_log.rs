//! Verbose-mode timing and stage-tracing helpers.
//!
//! The teacher gates its diagnostic logging behind Cargo features
//! (`detailed_timers`, `show_headers`, ...) because it's purely a compiler
//! developer tool. Here `-verbose` is a user-facing CLI flag (§6), so the
//! same no-op-unless-enabled idiom is expressed as a runtime check against
//! `Preferences.is_verbose` instead of a compile-time feature.

/// Prints `label: <elapsed>` when `$prefs.is_verbose` is set, else does nothing.
#[macro_export]
macro_rules! timer_log {
    ($prefs:expr, $start:expr, $label:expr) => {
        if $prefs.is_verbose {
            saying::say!($label, Green #$start.elapsed());
        }
    };
}

/// Prints a plain stage marker when `$prefs.is_verbose` is set.
#[macro_export]
macro_rules! stage_log {
    ($prefs:expr, $($arg:tt)*) => {
        if $prefs.is_verbose {
            saying::say!(Bright Black $($arg)*);
        }
    };
}
