//! Persistence layer for nutriplan: row models, connection pool, migrations
//! and per-table query functions.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
