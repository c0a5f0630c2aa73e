//! Per-table query functions.
//!
//! Reads take a `&PgPool`. Writes take any `PgExecutor` so they can run
//! either directly on the pool or inside a caller's transaction.

pub mod continuation;
pub mod profiles;
pub mod summaries;
pub mod weeks;
