//! Git-aware file discovery.
//!
//! Uses the `ignore` crate to respect .gitignore and walk directories
//! in parallel.

mod files;

pub use files::{collect_inputs, find_go_files, is_generated};
