//! Use-case orchestration: instance lifecycle, fleet operations, migration.

pub mod fleet;
pub mod lifecycle;
pub mod migrate;
