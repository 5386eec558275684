//! Unit tests for portico CLI
//!
//! These tests use mocked dependencies and run fast without spawning real
//! server processes.

mod scenarios;
