//! End-to-end lifecycle scenarios.

mod bootstrap;
mod concurrency;
mod delete_all;
mod indexing;
mod schema_change;
mod status;
