//! tree-sitter-go parsing and lowering into [`crate::extraction::ast`].
//!
//! Declarations are lowered by walking the top level of the tree. Call sites
//! inside bodies are found with a `.scm` query compiled once per process and
//! sorted back into source pre-order (outer call before the calls nested in it).

use std::cell::RefCell;
use std::cmp::Reverse;
use std::path::Path;

use once_cell::sync::Lazy;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser as TsParser, Query, QueryCursor};

use super::ast::{
    Body, CallExpr, Comment, CommentGroup, Decl, Expr, FuncDecl, Ident, Pos, Receiver,
    SourceFile, Span, TypeDecl, TypeShape, TypeSpec,
};
use crate::error::ParseError;

/// Every call expression, wherever it sits in the body. A one-argument
/// generic call (`Map[int](xs)`) parses as a conversion to a generic type.
const CALLS_QUERY: &str = r#"
(call_expression) @call
(type_conversion_expression type: (generic_type)) @call
"#;

static GO: Lazy<Language> = Lazy::new(|| tree_sitter_go::LANGUAGE.into());

static CALLS: Lazy<Query> = Lazy::new(|| {
    Query::new(&GO, CALLS_QUERY).expect("call query compiles against the bundled Go grammar")
});

thread_local! {
    /// tree-sitter parsers are not `Sync`; one per rayon worker.
    static TS_PARSER: RefCell<TsParser> = RefCell::new(TsParser::new());
}

/// Parse Go source text and lower it.
///
/// Any ERROR or MISSING node in the tree fails the file: the passes have no
/// meaningful partial result for a file that does not parse.
pub fn parse_go(path: &Path, source: &str) -> Result<SourceFile, ParseError> {
    let tree = TS_PARSER.with(|p| {
        let mut parser = p.borrow_mut();
        parser
            .set_language(&GO)
            .map_err(|e| ParseError::Language(e.to_string()))?;
        parser.parse(source, None).ok_or_else(|| ParseError::NoTree {
            path: path.to_path_buf(),
        })
    })?;

    let root = tree.root_node();
    if root.has_error() {
        let at = first_error(root).unwrap_or(root);
        let pos = start_pos(at);
        return Err(ParseError::Syntax {
            path: path.to_path_buf(),
            line: pos.line,
            column: pos.column,
        });
    }

    Ok(lower_file(root, source))
}

fn lower_file(root: Node, src: &str) -> SourceFile {
    let mut file = SourceFile::default();
    let mut cursor = root.walk();

    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "type_declaration" => file.decls.push(Decl::Type(lower_type_decl(child, src))),
            "function_declaration" | "method_declaration" => {
                if let Some(func) = lower_func(child, src) {
                    file.decls.push(Decl::Func(func));
                }
            }
            _ => {}
        }
    }

    file
}

fn lower_type_decl(node: Node, src: &str) -> TypeDecl {
    let mut cursor = node.walk();
    let specs = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "type_spec")
        .filter_map(|c| lower_type_spec(c, src))
        .collect();

    TypeDecl {
        doc: doc_comment(node, src),
        specs,
    }
}

fn lower_type_spec(node: Node, src: &str) -> Option<TypeSpec> {
    let name = node.child_by_field_name("name")?;
    let shape = match node.child_by_field_name("type").map(|t| t.kind()) {
        Some("struct_type") => TypeShape::Struct,
        Some("interface_type") => TypeShape::Interface,
        _ => TypeShape::Other,
    };

    Some(TypeSpec {
        name: ident(name, src),
        shape,
        doc: doc_comment(node, src),
        span: span(node),
    })
}

fn lower_func(node: Node, src: &str) -> Option<FuncDecl> {
    let name = node.child_by_field_name("name")?;

    let recv = node
        .child_by_field_name("receiver")
        .and_then(|list| lower_receiver(list, src));

    let params = node
        .child_by_field_name("parameters")
        .map(|list| parameter_names(list, src))
        .unwrap_or_default();

    let body = node.child_by_field_name("body").map(|block| Body {
        calls: collect_calls(block, src),
    });

    Some(FuncDecl {
        name: ident(name, src),
        recv,
        params,
        doc: doc_comment(node, src),
        span: span(node),
        body,
    })
}

/// `(s *Server)`: Go allows exactly one receiver; the last declaration wins if
/// a malformed list carries more.
fn lower_receiver(list: Node, src: &str) -> Option<Receiver> {
    let mut cursor = list.walk();
    let decls: Vec<Node> = list
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "parameter_declaration")
        .collect();
    let decl = decls.last()?;

    let ty = decl.child_by_field_name("type")?;
    Some(Receiver {
        name: decl.child_by_field_name("name").map(|n| ident(n, src)),
        ty: lower_expr(ty, src),
    })
}

fn parameter_names(list: Node, src: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = list.walk();
    let decls: Vec<Node> = list.named_children(&mut cursor).collect();

    for decl in decls {
        if !matches!(
            decl.kind(),
            "parameter_declaration" | "variadic_parameter_declaration"
        ) {
            continue;
        }
        let mut field_cursor = decl.walk();
        names.extend(
            decl.children_by_field_name("name", &mut field_cursor)
                .map(|n| text(n, src).to_string()),
        );
    }

    names
}

fn collect_calls(block: Node, src: &str) -> Vec<CallExpr> {
    let mut cursor = QueryCursor::new();
    let mut nodes: Vec<Node> = Vec::new();

    let mut matches = cursor.matches(&CALLS, block, src.as_bytes());
    while let Some(m) = matches.next() {
        nodes.extend(m.captures.iter().map(|c| c.node));
    }

    // Pre-order: by start, and for a shared start (`a.b().c()`) outer first.
    nodes.sort_by_key(|n| (n.start_byte(), Reverse(n.end_byte())));
    nodes.dedup_by_key(|n| n.id());

    nodes.into_iter().filter_map(|n| lower_call(n, src)).collect()
}

fn lower_call(node: Node, src: &str) -> Option<CallExpr> {
    if node.kind() == "type_conversion_expression" {
        // `generic_type` lowers to the same `Index` shape as an instantiation.
        let ty = node.child_by_field_name("type")?;
        return Some(CallExpr {
            fun: lower_expr(ty, src),
            pos: start_pos(node),
        });
    }

    let function = node.child_by_field_name("function")?;
    let mut fun = lower_expr(function, src);

    // `Map[K, V](m)` is an instantiation in Go's AST, not a plain identifier.
    if let Some(args) = node.child_by_field_name("type_arguments") {
        fun = Expr::Index {
            x: Box::new(fun),
            indices: type_arguments(args, src),
        };
    }

    Some(CallExpr {
        fun,
        pos: start_pos(node),
    })
}

fn lower_expr(node: Node, src: &str) -> Expr {
    match node.kind() {
        "identifier" | "type_identifier" | "field_identifier" | "package_identifier" => {
            Expr::Ident(ident(node, src))
        }
        "selector_expression" => {
            let (Some(operand), Some(field)) = (
                node.child_by_field_name("operand"),
                node.child_by_field_name("field"),
            ) else {
                return other(node);
            };
            Expr::Selector {
                x: Box::new(lower_expr(operand, src)),
                sel: ident(field, src),
            }
        }
        "qualified_type" => {
            let (Some(package), Some(name)) = (
                node.child_by_field_name("package"),
                node.child_by_field_name("name"),
            ) else {
                return other(node);
            };
            Expr::Selector {
                x: Box::new(Expr::Ident(ident(package, src))),
                sel: ident(name, src),
            }
        }
        "pointer_type" => match node.named_child(0) {
            Some(inner) => Expr::Star(Box::new(lower_expr(inner, src))),
            None => other(node),
        },
        "generic_type" => {
            let Some(base) = node.child_by_field_name("type") else {
                return other(node);
            };
            let indices = node
                .child_by_field_name("type_arguments")
                .map(|args| type_arguments(args, src))
                .unwrap_or_default();
            Expr::Index {
                x: Box::new(lower_expr(base, src)),
                indices,
            }
        }
        "index_expression" => {
            let (Some(operand), Some(index)) = (
                node.child_by_field_name("operand"),
                node.child_by_field_name("index"),
            ) else {
                return other(node);
            };
            Expr::Index {
                x: Box::new(lower_expr(operand, src)),
                indices: vec![lower_expr(index, src)],
            }
        }
        "parenthesized_expression" | "parenthesized_type" => match node.named_child(0) {
            Some(inner) => Expr::Paren(Box::new(lower_expr(inner, src))),
            None => other(node),
        },
        // A lone type inside a type argument list; unions stay opaque.
        "type_elem" if node.named_child_count() == 1 => match node.named_child(0) {
            Some(inner) => lower_expr(inner, src),
            None => other(node),
        },
        _ => other(node),
    }
}

fn type_arguments(args: Node, src: &str) -> Vec<Expr> {
    let mut cursor = args.walk();
    let children: Vec<Node> = args.named_children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.kind() != "comment")
        .map(|c| lower_expr(c, src))
        .collect()
}

/// The doc comment group directly above `node` among its siblings.
///
/// Mirrors go/parser's lead-comment rule: the group must end on the line right
/// before the declaration, its comments must be on adjacent lines, and a
/// comment trailing code on the same line starts no group.
fn doc_comment(node: Node, src: &str) -> Option<CommentGroup> {
    let mut group: Vec<Node> = Vec::new();
    let mut boundary = node.start_position().row;
    let mut prev = prev_significant(node);

    while let Some(p) = prev {
        if p.kind() != "comment" {
            break;
        }
        let end_row = p.end_position().row;
        let adjacent = if group.is_empty() {
            end_row + 1 == boundary
        } else {
            end_row + 1 >= boundary
        };
        if !adjacent || trails_code(p) {
            break;
        }
        boundary = p.start_position().row;
        group.push(p);
        prev = prev_significant(p);
    }

    if group.is_empty() {
        return None;
    }
    group.reverse();

    Some(CommentGroup {
        comments: group
            .into_iter()
            .map(|c| Comment {
                text: text(c, src).to_string(),
                span: span(c),
            })
            .collect(),
    })
}

fn trails_code(comment: Node) -> bool {
    prev_significant(comment).is_some_and(|s| {
        s.kind() != "comment" && s.end_position().row == comment.start_position().row
    })
}

/// Previous sibling, skipping newline terminator tokens.
fn prev_significant(node: Node) -> Option<Node> {
    let mut prev = node.prev_sibling();
    while let Some(p) = prev {
        if p.is_named() || p.kind() != "\n" {
            return Some(p);
        }
        prev = p.prev_sibling();
    }
    None
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn ident(node: Node, src: &str) -> Ident {
    Ident::new(text(node, src), start_pos(node))
}

fn other(node: Node) -> Expr {
    Expr::Other {
        pos: start_pos(node),
    }
}

fn text<'s>(node: Node, src: &'s str) -> &'s str {
    node.utf8_text(src.as_bytes()).unwrap_or("")
}

fn start_pos(node: Node) -> Pos {
    let p = node.start_position();
    Pos {
        offset: node.start_byte(),
        line: p.row as u32 + 1,
        column: p.column as u32 + 1,
    }
}

fn end_pos(node: Node) -> Pos {
    let p = node.end_position();
    Pos {
        offset: node.end_byte(),
        line: p.row as u32 + 1,
        column: p.column as u32 + 1,
    }
}

fn span(node: Node) -> Span {
    Span {
        start: start_pos(node),
        end: end_pos(node),
    }
}
