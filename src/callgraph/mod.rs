//! Symbol collection and call resolution.
//!
//! # Two-pass architecture
//!
//! ```text
//! files → [Collect] → SymbolTableBuilder → freeze → SymbolTable → [Resolve] → edges
//!                                                                     │
//!                                                   ┌─────────────────┴───────────────┐
//!                                                   │ TypeFactsStrategy (if facts)    │
//!                                                   │ HeuristicStrategy (always last) │
//!                                                   └─────────────────────────────────┘
//! ```
//!
//! Every id, at declaration time and at call-resolution time, comes from
//! [`identifier_for`]. A call is resolved iff the id it was classified as is
//! in the table, so resolving against a table that is missing files silently
//! under-resolves; the builder/table split makes that ordering a type error.
//!
//! # Quick Start
//!
//! ```ignore
//! let files = Pipeline::parse_files(&paths, &root)?;
//! let (result, stats) = Pipeline::new().with_facts(facts).run(&files);
//! ```

mod collector;
pub mod facts;
mod facts_strategy;
mod identifier;
mod pipeline;
mod resolver;
mod strategies;
mod table;

pub use collector::SymbolCollector;
pub use facts::{FileFacts, TypeFacts};
pub use facts_strategy::TypeFactsStrategy;
pub use identifier::{identifier_for, module_path};
pub use pipeline::{Pipeline, PipelineStats};
pub use resolver::{CallResolver, ResolutionStats};
pub use strategies::{is_builtin, CallContext, CalleeRef, HeuristicStrategy, ResolutionStrategy};
pub use table::{SymbolTable, SymbolTableBuilder};
