//! Core records produced by an analysis run.
//!
//! Both records are created once and never mutated afterwards. Their JSON
//! shape is the contract with the downstream documentation builder, so the
//! field names follow that consumer rather than the Rust names.

use std::path::PathBuf;

use serde::{Serialize, Serializer};

/// What a declared symbol is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Struct,
    Interface,
    Function,
    Method,
}

impl SymbolKind {
    /// Coarse category expected by the consumer. Types map to "class".
    pub fn component_type(&self) -> &'static str {
        match self {
            SymbolKind::Struct | SymbolKind::Interface => "class",
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
        }
    }

    /// Fine-grained node type.
    pub fn node_type(&self) -> &'static str {
        match self {
            SymbolKind::Struct => "struct",
            SymbolKind::Interface => "interface",
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
        }
    }
}

/// Where a symbol is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Path as supplied to the run (absolute for discovered files).
    pub path: PathBuf,
    /// Path relative to the analysis root.
    pub rel_path: PathBuf,
    /// 1-based, inclusive.
    pub start_line: u32,
    pub end_line: u32,
}

/// One analyzable unit: a struct, interface, function or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredSymbol {
    pub id: String,
    pub name: String,
    pub kind: SymbolKind,
    /// Receiver base type for methods, empty otherwise.
    pub enclosing_type: String,
    pub location: Location,
    /// Declaration text including its attached doc comment. Empty when the
    /// offsets fell outside the buffered source.
    pub source_span: String,
    pub documentation: Option<String>,
    pub parameters: Vec<String>,
    /// "method T.Foo", "func Bar", "struct S"
    pub display_label: String,
}

impl DeclaredSymbol {
    pub fn has_documentation(&self) -> bool {
        self.documentation.is_some()
    }
}

/// Node record as the consumer reads it.
#[derive(Serialize)]
struct NodeRecord<'a> {
    id: &'a str,
    name: &'a str,
    component_type: &'static str,
    file_path: String,
    relative_path: String,
    depends_on: &'static [&'static str],
    #[serde(skip_serializing_if = "is_blank")]
    source_code: &'a str,
    start_line: u32,
    end_line: u32,
    has_docstring: bool,
    docstring: &'a str,
    #[serde(skip_serializing_if = "no_items")]
    parameters: &'a [String],
    node_type: &'static str,
    #[serde(skip_serializing_if = "is_blank")]
    class_name: &'a str,
    display_name: &'a str,
    component_id: &'a str,
}

fn is_blank(s: &&str) -> bool {
    s.is_empty()
}

fn no_items(items: &&[String]) -> bool {
    items.is_empty()
}

impl Serialize for DeclaredSymbol {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        NodeRecord {
            id: &self.id,
            name: &self.name,
            component_type: self.kind.component_type(),
            file_path: self.location.path.to_string_lossy().into_owned(),
            relative_path: self.location.rel_path.to_string_lossy().into_owned(),
            depends_on: &[],
            source_code: &self.source_span,
            start_line: self.location.start_line,
            end_line: self.location.end_line,
            has_docstring: self.has_documentation(),
            docstring: self.documentation.as_deref().unwrap_or(""),
            parameters: &self.parameters,
            node_type: self.kind.node_type(),
            class_name: &self.enclosing_type,
            display_name: &self.display_label,
            component_id: &self.id,
        }
        .serialize(serializer)
    }
}

/// Edge kinds. Only calls today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EdgeKind {
    #[serde(rename = "calls")]
    Calls,
}

/// One call expression observed inside a declaration body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallEdge {
    #[serde(rename = "caller")]
    pub caller_id: String,
    /// A symbol id when resolvable, otherwise a best-effort qualified name.
    #[serde(rename = "callee")]
    pub callee_ref: String,
    #[serde(rename = "call_line")]
    pub source_line: u32,
    #[serde(rename = "is_resolved")]
    pub resolved: bool,
    #[serde(rename = "relationship_type")]
    pub kind: EdgeKind,
    /// Strategy that classified the call, for statistics only.
    #[serde(skip)]
    pub strategy: &'static str,
}

/// The two ordered collections handed to the consumer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisResult {
    #[serde(rename = "nodes")]
    pub symbols: Vec<DeclaredSymbol>,
    #[serde(rename = "call_relationships")]
    pub edges: Vec<CallEdge>,
}
