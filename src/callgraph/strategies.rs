//! Pluggable resolution strategies.
//!
//! A strategy either classifies a call expression into a [`CalleeRef`] or
//! declines with `None`, letting the next strategy in the chain try. The
//! resolver runs strategies in order and the first answer wins:
//!
//! 1. TypeFactsStrategy - type-checker facts, only for files that have them
//! 2. HeuristicStrategy - syntactic guessing, always last

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;

use crate::extraction::ast::{CallExpr, Expr};

use super::identifier::identifier_for;
use super::table::SymbolTable;

/// Where a call sits.
pub struct CallContext<'a> {
    /// Root-relative path of the file being resolved.
    pub rel_path: &'a Path,
    /// Receiver base type of the enclosing method, empty for functions.
    pub enclosing_type: &'a str,
    /// Receiver variable of the enclosing method (`s` in `func (s *T)`).
    pub receiver_name: Option<&'a str>,
}

/// What a call was classified as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalleeRef {
    /// An id built with the identifier scheme.
    Local(String),
    /// `X.Sel` as written in source.
    Verbatim(String),
    /// `pkgName.Name` for a declaration outside the root.
    External(String),
    /// Builtin function, predeclared type or literal.
    Builtin(String),
}

impl CalleeRef {
    /// Membership in the frozen table. External and builtin callees are
    /// never resolved.
    pub fn is_resolved(&self, table: &SymbolTable) -> bool {
        match self {
            CalleeRef::Local(id) | CalleeRef::Verbatim(id) => table.contains(id),
            CalleeRef::External(_) | CalleeRef::Builtin(_) => false,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CalleeRef::Local(s)
            | CalleeRef::Verbatim(s)
            | CalleeRef::External(s)
            | CalleeRef::Builtin(s) => s,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            CalleeRef::Local(s)
            | CalleeRef::Verbatim(s)
            | CalleeRef::External(s)
            | CalleeRef::Builtin(s) => s,
        }
    }
}

/// Trait for pluggable resolution strategies.
pub trait ResolutionStrategy: Send + Sync {
    /// Strategy name for statistics.
    fn name(&self) -> &'static str;

    /// Classify one call, or decline with `None`.
    fn resolve(&self, call: &CallExpr, ctx: &CallContext) -> Option<CalleeRef>;
}

/// Builtin functions, predeclared types and reserved literals.
static BUILTINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // functions
        "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len", "max",
        "min", "make", "new", "panic", "print", "println", "real", "recover",
        // types
        "bool", "byte", "complex64", "complex128", "error", "float32", "float64", "int", "int8",
        "int16", "int32", "int64", "rune", "string", "uint", "uint8", "uint16", "uint32",
        "uint64", "uintptr", "any", "comparable",
        // literals
        "true", "false", "nil", "iota",
    ]
    .into_iter()
    .collect()
});

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(name)
}

/// Fallback used when no type facts are available, or they declined.
///
/// - `foo()` is assumed to be declared in the caller's own file.
/// - `recv.Method()` through the caller's receiver variable is a method on
///   the caller's type, also in the caller's file.
/// - any other `X.Sel()` is kept verbatim.
///
/// Anything else (calls on call results, indexed or parenthesized callees)
/// is declined, which drops the call.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicStrategy;

impl HeuristicStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl ResolutionStrategy for HeuristicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn resolve(&self, call: &CallExpr, ctx: &CallContext) -> Option<CalleeRef> {
        match &call.fun {
            Expr::Ident(ident) if is_builtin(&ident.name) => {
                Some(CalleeRef::Builtin(ident.name.clone()))
            }
            Expr::Ident(ident) => Some(CalleeRef::Local(identifier_for(
                ctx.rel_path,
                &ident.name,
                "",
            ))),
            Expr::Selector { x, sel } => {
                let Expr::Ident(x) = x.as_ref() else {
                    return None;
                };
                if ctx.receiver_name == Some(x.name.as_str()) {
                    Some(CalleeRef::Local(identifier_for(
                        ctx.rel_path,
                        &sel.name,
                        ctx.enclosing_type,
                    )))
                } else {
                    Some(CalleeRef::Verbatim(format!("{}.{}", x.name, sel.name)))
                }
            }
            _ => None,
        }
    }
}
