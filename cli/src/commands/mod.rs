//! Command implementations

pub mod discover;
pub mod list;
pub mod logs;
pub mod migrate;
pub mod restart;
pub mod restart_all;
pub mod start;
pub mod stop;
pub mod stop_all;
