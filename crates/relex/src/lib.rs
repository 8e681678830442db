//! The `relex` command line tool.
//!
//! Commands open files in one of the sample languages, picked by file
//! extension, and work on their token hierarchies:
//!
//! - `dump`: print every token list, embedded lists nested under their host
//! - `replay`: apply an edit script and print each change event
//! - `check`: verify consistency and rebuild idempotence
//!
//! Logging goes to stderr and is configured with `RELEX_LOG`, using the
//! `tracing-subscriber` filter syntax (`RELEX_LOG=relex_engine=debug`).

pub mod commands;
pub mod script;
mod tracing_setup;

pub use tracing_setup::init_tracing;
