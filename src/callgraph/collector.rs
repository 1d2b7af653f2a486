//! First pass: one [`DeclaredSymbol`] per struct, interface, function and
//! method in a file.

use crate::extraction::ast::{CommentGroup, Decl, FuncDecl, Span, TypeShape, TypeSpec};
use crate::extraction::ParsedFile;
use crate::types::{DeclaredSymbol, Location, SymbolKind};

use super::identifier::identifier_for;

/// Walks a single file's declarations. Holds no state across files, so files
/// can be collected in any order and on any thread.
pub struct SymbolCollector<'a> {
    file: &'a ParsedFile,
}

impl<'a> SymbolCollector<'a> {
    pub fn new(file: &'a ParsedFile) -> Self {
        Self { file }
    }

    /// Symbols in declaration order.
    pub fn collect(&self) -> Vec<DeclaredSymbol> {
        let mut symbols = Vec::new();

        for decl in &self.file.ast.decls {
            match decl {
                Decl::Type(td) => {
                    for spec in &td.specs {
                        // The spec's own doc wins over the group's.
                        let doc = spec.doc.as_ref().or(td.doc.as_ref());
                        if let Some(sym) = self.type_symbol(spec, doc) {
                            symbols.push(sym);
                        }
                    }
                }
                Decl::Func(func) => symbols.push(self.func_symbol(func)),
            }
        }

        symbols
    }

    fn type_symbol(&self, spec: &TypeSpec, doc: Option<&CommentGroup>) -> Option<DeclaredSymbol> {
        let (kind, label) = match spec.shape {
            TypeShape::Struct => (SymbolKind::Struct, "struct"),
            TypeShape::Interface => (SymbolKind::Interface, "interface"),
            TypeShape::Other => return None,
        };
        let name = spec.name.name.clone();

        Some(DeclaredSymbol {
            id: identifier_for(&self.file.rel_path, &name, ""),
            display_label: format!("{label} {name}"),
            name,
            kind,
            enclosing_type: String::new(),
            location: self.location(spec.span),
            source_span: self.source_span(spec.span, doc),
            documentation: documentation(doc),
            parameters: Vec::new(),
        })
    }

    fn func_symbol(&self, func: &FuncDecl) -> DeclaredSymbol {
        let name = func.name.name.clone();
        let (kind, enclosing_type, display_label) = match &func.recv {
            Some(recv) => {
                let recv_type = recv.base_type();
                let label = format!("method {recv_type}.{name}");
                (SymbolKind::Method, recv_type, label)
            }
            None => (SymbolKind::Function, String::new(), format!("func {name}")),
        };

        DeclaredSymbol {
            id: identifier_for(&self.file.rel_path, &name, &enclosing_type),
            name,
            kind,
            enclosing_type,
            location: self.location(func.span),
            source_span: self.source_span(func.span, func.doc.as_ref()),
            documentation: documentation(func.doc.as_ref()),
            parameters: func.params.clone(),
            display_label,
        }
    }

    fn location(&self, span: Span) -> Location {
        Location {
            path: self.file.path.clone(),
            rel_path: self.file.rel_path.clone(),
            start_line: span.start.line,
            end_line: span.end.line,
        }
    }

    /// Declaration text, starting at the doc comment when there is one.
    /// Offsets that do not fit the buffered source give an empty span.
    fn source_span(&self, span: Span, doc: Option<&CommentGroup>) -> String {
        let start = doc
            .and_then(CommentGroup::start)
            .map_or(span.start.offset, |pos| pos.offset);
        self.file
            .source
            .get(start..span.end.offset)
            .unwrap_or_default()
            .to_string()
    }
}

fn documentation(doc: Option<&CommentGroup>) -> Option<String> {
    doc.map(|group| group.text().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callgraph::identifier_for;
    use crate::extraction::ast::Pos;

    fn collect(rel: &str, src: &str) -> Vec<DeclaredSymbol> {
        let file = ParsedFile::from_source(format!("/repo/{rel}"), rel, src).unwrap();
        SymbolCollector::new(&file).collect()
    }

    fn find<'s>(symbols: &'s [DeclaredSymbol], name: &str) -> &'s DeclaredSymbol {
        symbols.iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn test_doc_comment_attaches_to_type() {
        let src = "package main\n\n// MyStruct is a test struct\ntype MyStruct struct {\n\tField int\n}\n";
        let symbols = collect("main.go", src);
        let sym = find(&symbols, "MyStruct");

        assert_eq!(sym.kind, SymbolKind::Struct);
        assert!(sym.has_documentation());
        assert_eq!(sym.documentation.as_deref(), Some("MyStruct is a test struct"));
        assert!(sym.source_span.starts_with("// MyStruct is a test struct\ntype MyStruct"));
        assert!(sym.source_span.ends_with('}'));
        // Location lines follow the declaration, not the comment.
        assert_eq!(sym.location.start_line, 4);
        assert_eq!(sym.location.end_line, 6);
        assert_eq!(sym.display_label, "struct MyStruct");
    }

    #[test]
    fn test_undocumented_span_starts_at_name() {
        let src = "package main\n\ntype Reader interface {\n\tRead() error\n}\n";
        let symbols = collect("main.go", src);
        let sym = find(&symbols, "Reader");

        assert_eq!(sym.kind, SymbolKind::Interface);
        assert!(!sym.has_documentation());
        assert!(sym.source_span.starts_with("Reader interface"));
        assert_eq!(sym.display_label, "interface Reader");
    }

    #[test]
    fn test_group_doc_used_as_fallback() {
        let src = "package main\n\n// Shapes.\ntype (\n\t// Circle is round.\n\tCircle struct{}\n\tSquare struct{}\n\tID string\n)\n";
        let symbols = collect("main.go", src);
        assert_eq!(symbols.len(), 2, "named non-struct types are skipped");

        assert_eq!(find(&symbols, "Circle").documentation.as_deref(), Some("Circle is round."));
        let square = find(&symbols, "Square");
        assert_eq!(square.documentation.as_deref(), Some("Shapes."));
        assert!(square.source_span.starts_with("// Shapes."));
    }

    #[test]
    fn test_function_parameters_and_label() {
        let src = "package main\n\n// Add sums.\nfunc Add(a, b int, rest ...int) int { return a + b }\n\nfunc Print(v interface{}) {}\n";
        let symbols = collect("main.go", src);

        let add = find(&symbols, "Add");
        assert_eq!(add.kind, SymbolKind::Function);
        assert_eq!(add.parameters, vec!["a", "b", "rest"]);
        assert_eq!(add.display_label, "func Add");
        assert!(add.source_span.starts_with("// Add sums.\nfunc Add"));

        let print = find(&symbols, "Print");
        assert_eq!(print.parameters, vec!["v"]);
        assert_eq!(print.source_span, "func Print(v interface{}) {}");
    }

    #[test]
    fn test_method_receiver_is_unwrapped() {
        let src = "package pkg\n\ntype Server struct{}\n\nfunc (s *Server) Start() {}\n\nfunc (s Server) Stop() {}\n\ntype List[K comparable, V any] struct{}\n\nfunc (l *List[K, V]) Get(k K) V { var v V; return v }\n";
        let symbols = collect("pkg/server.go", src);

        let start = find(&symbols, "Start");
        let stop = find(&symbols, "Stop");
        assert_eq!(start.kind, SymbolKind::Method);
        assert_eq!(start.enclosing_type, "Server");
        assert_eq!(stop.enclosing_type, "Server");
        assert_eq!(start.id, "pkg.server.Server.Start");
        assert_eq!(start.display_label, "method Server.Start");

        let get = find(&symbols, "Get");
        assert_eq!(get.enclosing_type, "List[K, V]");
        assert_eq!(get.id, "pkg.server.List[K, V].Get");
    }

    #[test]
    fn test_ids_round_trip() {
        let src = "package pkg\n\ntype T struct{}\n\nfunc (t *T) M() {}\n\nfunc F() {}\n";
        for sym in collect("a/b/c.go", src) {
            assert_eq!(
                identifier_for(&sym.location.rel_path, &sym.name, &sym.enclosing_type),
                sym.id
            );
        }
    }

    #[test]
    fn test_out_of_bounds_span_is_empty() {
        let file = ParsedFile::from_source("/repo/a.go", "a.go", "package a\n\nfunc F() {}\n").unwrap();
        let collector = SymbolCollector::new(&file);
        let past_end = Pos {
            offset: file.source.len() + 10,
            line: 9,
            column: 1,
        };
        let span = Span {
            start: Pos::default(),
            end: past_end,
        };
        assert_eq!(collector.source_span(span, None), "");
    }
}
