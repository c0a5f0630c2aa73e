//! Plan engine for nutriplan: week parsing, month grouping, continuation
//! tracking, summaries, reports and the session that ties them to a plan
//! generator and a store.

pub mod continuation;
pub mod generator;
pub mod intake;
pub mod nutrition;
pub mod plan;
pub mod profile;
pub mod report;
pub mod session;
pub mod store;
pub mod summary;
pub mod tenure;
