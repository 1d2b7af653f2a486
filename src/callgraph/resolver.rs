//! Call resolver: runs the strategy chain over one file's call sites.
//!
//! 1. Derives the caller id for each function body
//! 2. Asks each strategy in order; the first one that classifies the call wins
//! 3. Marks the edge resolved iff the callee id is in the frozen table
//! 4. Drops calls no strategy could classify

use std::collections::BTreeMap;
use std::fmt;

use crate::extraction::ast::{Decl, FuncDecl};
use crate::extraction::ParsedFile;
use crate::types::{CallEdge, EdgeKind};

use super::facts::FileFacts;
use super::facts_strategy::TypeFactsStrategy;
use super::identifier::identifier_for;
use super::strategies::{CallContext, HeuristicStrategy, ResolutionStrategy};
use super::table::SymbolTable;

/// Strategy chain bound to a frozen table.
///
/// Taking `&SymbolTable` (never the builder) is what keeps resolution from
/// starting before collection has finished.
pub struct CallResolver<'a> {
    table: &'a SymbolTable,
    strategies: Vec<Box<dyn ResolutionStrategy + 'a>>,
}

impl<'a> CallResolver<'a> {
    /// A resolver with no strategies; every call is dropped.
    pub fn new(table: &'a SymbolTable) -> Self {
        Self {
            table,
            strategies: Vec::new(),
        }
    }

    /// Add a resolution strategy (order is precedence).
    pub fn add_strategy(&mut self, strategy: Box<dyn ResolutionStrategy + 'a>) {
        self.strategies.push(strategy);
    }

    pub fn with_strategy(mut self, strategy: Box<dyn ResolutionStrategy + 'a>) -> Self {
        self.add_strategy(strategy);
        self
    }

    /// The standard chain for one file: type facts first when the file has
    /// them, then the heuristic.
    pub fn for_file(table: &'a SymbolTable, facts: Option<&'a FileFacts>) -> Self {
        let mut resolver = Self::new(table);
        if let Some(facts) = facts {
            resolver.add_strategy(Box::new(TypeFactsStrategy::new(facts)));
        }
        resolver.with_strategy(Box::new(HeuristicStrategy::new()))
    }

    /// Names of the chained strategies, in order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Edges for every call inside every function body of `file`, in
    /// declaration order then call pre-order.
    pub fn resolve_file(&self, file: &ParsedFile) -> (Vec<CallEdge>, ResolutionStats) {
        let mut edges = Vec::new();
        let mut stats = ResolutionStats::default();

        for decl in &file.ast.decls {
            if let Decl::Func(func) = decl {
                self.resolve_body(file, func, &mut edges, &mut stats);
            }
        }

        (edges, stats)
    }

    fn resolve_body(
        &self,
        file: &ParsedFile,
        func: &FuncDecl,
        edges: &mut Vec<CallEdge>,
        stats: &mut ResolutionStats,
    ) {
        let Some(body) = &func.body else {
            return;
        };

        // Same receiver unwrapping as the collector.
        let enclosing_type = func.recv.as_ref().map(|r| r.base_type()).unwrap_or_default();
        let caller_id = identifier_for(&file.rel_path, &func.name.name, &enclosing_type);
        let receiver_name = func
            .recv
            .as_ref()
            .and_then(|r| r.name.as_ref())
            .map(|n| n.name.as_str());

        let ctx = CallContext {
            rel_path: &file.rel_path,
            enclosing_type: &enclosing_type,
            receiver_name,
        };

        for call in &body.calls {
            let classified = self
                .strategies
                .iter()
                .find_map(|s| s.resolve(call, &ctx).map(|callee| (s.name(), callee)));

            let Some((strategy, callee)) = classified else {
                stats.dropped += 1;
                continue;
            };

            let resolved = callee.is_resolved(self.table);
            stats.record(strategy, resolved);
            edges.push(CallEdge {
                caller_id: caller_id.clone(),
                callee_ref: callee.into_string(),
                source_line: call.pos.line,
                resolved,
                kind: EdgeKind::Calls,
                strategy,
            });
        }
    }
}

/// Counts for one file or a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    /// Calls that produced an edge.
    pub total_calls: usize,
    /// Edges whose callee is a declared symbol.
    pub resolved: usize,
    /// Calls no strategy could classify.
    pub dropped: usize,
    /// Edges per strategy that classified them.
    pub by_strategy: BTreeMap<&'static str, usize>,
}

impl ResolutionStats {
    fn record(&mut self, strategy: &'static str, resolved: bool) {
        self.total_calls += 1;
        if resolved {
            self.resolved += 1;
        }
        *self.by_strategy.entry(strategy).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: &ResolutionStats) {
        self.total_calls += other.total_calls;
        self.resolved += other.resolved;
        self.dropped += other.dropped;
        for (name, count) in &other.by_strategy {
            *self.by_strategy.entry(*name).or_insert(0) += *count;
        }
    }

    pub fn resolution_rate(&self) -> f64 {
        if self.total_calls == 0 {
            return 1.0;
        }
        self.resolved as f64 / self.total_calls as f64
    }
}

impl fmt::Display for ResolutionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} calls, {} resolved ({:.1}%), {} dropped",
            self.total_calls,
            self.resolved,
            self.resolution_rate() * 100.0,
            self.dropped
        )?;
        for (name, count) in &self.by_strategy {
            write!(f, "\n  {name}: {count}")?;
        }
        Ok(())
    }
}
