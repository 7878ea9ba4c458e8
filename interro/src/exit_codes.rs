//! Stable exit codes for the `interro` CLI.

/// Flow completed, or `check` found no problems.
pub const OK: i32 = 0;
/// Invalid flow file, usage error or I/O failure.
pub const INVALID: i32 = 1;
/// `interro run`: input ended before the flow completed.
pub const INCOMPLETE: i32 = 2;
