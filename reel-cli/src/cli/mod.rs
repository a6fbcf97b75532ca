//! Subcommand plumbing that does not need the TUI.

pub mod args;
pub mod create;
pub mod probe;
