//! callmap - symbol and call-edge extraction for Go code bases
//!
//! Produces the node and call-relationship records a documentation graph
//! builder consumes: one node per struct, interface, function and method,
//! one edge per call expression inside a declaration body.
//!
//! # Architecture
//!
//! ```text
//! File Discovery → Parsing → Symbol Collection → freeze → Call Resolution → JSON
//!       ↓             ↓              ↓                           ↓
//!    ignore      tree-sitter    path-derived ids        type facts, then
//!    crate        + .scm        SymbolTableBuilder       heuristics
//! ```
//!
//! Parsing and both passes run per file in parallel via rayon, with a full
//! barrier between collection and resolution.

pub mod callgraph;
pub mod config;
pub mod discovery;
pub mod error;
pub mod extraction;
pub mod types;

// Re-export core types
pub use types::{AnalysisResult, CallEdge, DeclaredSymbol, EdgeKind, Location, SymbolKind};

pub use callgraph::{
    identifier_for, CallResolver, CalleeRef, HeuristicStrategy, Pipeline, PipelineStats,
    ResolutionStats, ResolutionStrategy, SymbolCollector, SymbolTable, SymbolTableBuilder,
    TypeFacts, TypeFactsStrategy,
};
pub use config::Config;
pub use error::ParseError;
pub use extraction::ParsedFile;
