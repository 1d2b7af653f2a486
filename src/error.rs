//! Typed errors for the analysis library.
//!
//! Plumbing (I/O, config, facts loading) goes through `anyhow`; these are the
//! failures callers may want to match on.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    /// The grammar could not be loaded into the parser.
    #[error("failed to load the Go grammar: {0}")]
    Language(String),

    /// tree-sitter gave up without producing a tree.
    #[error("{path}: parser produced no syntax tree")]
    NoTree { path: PathBuf },

    /// The tree contains ERROR or MISSING nodes.
    #[error("{path}:{line}:{column}: syntax error")]
    Syntax {
        path: PathBuf,
        line: u32,
        column: u32,
    },
}

impl ParseError {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ParseError::Language(_) => None,
            ParseError::NoTree { path } | ParseError::Syntax { path, .. } => Some(path),
        }
    }
}
