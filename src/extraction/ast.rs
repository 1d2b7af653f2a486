//! Lowered Go syntax tree.
//!
//! tree-sitter hands us a concrete, untyped tree. The analysis passes only need
//! a handful of shapes out of it, so `treesitter.rs` lowers each file into the
//! types below and everything downstream matches on enums instead of poking at
//! node kind strings.
//!
//! Positions mirror `go/token`: lines are 1-based, columns are 1-based byte
//! columns, offsets are byte offsets into the file's source text.

/// A source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

/// Byte range of a node plus the lines it starts and ends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

/// An identifier occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub pos: Pos,
}

impl Ident {
    pub fn new(name: impl Into<String>, pos: Pos) -> Self {
        Self {
            name: name.into(),
            pos,
        }
    }
}

/// A single `//` or `/* */` comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub span: Span,
}

/// Adjacent comments with no blank line between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentGroup {
    pub comments: Vec<Comment>,
}

impl CommentGroup {
    /// Start of the first comment in the group.
    pub fn start(&self) -> Option<Pos> {
        self.comments.first().map(|c| c.span.start)
    }

    /// Comment text with markers stripped, following `go/ast.CommentGroup.Text`:
    /// `//` and `/* */` removed, one leading space dropped, tool directives
    /// (`//go:generate`, `//nolint:...`) skipped, trailing whitespace removed,
    /// leading and trailing blank lines dropped, runs of blank lines collapsed
    /// to one, lines joined with `\n`.
    pub fn text(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        for comment in &self.comments {
            let raw = comment.text.as_str();
            if let Some(body) = raw.strip_prefix("//") {
                if is_directive(body) {
                    continue;
                }
                let body = body.strip_prefix(' ').unwrap_or(body);
                lines.push(body.trim_end().to_string());
            } else if let Some(body) = raw.strip_prefix("/*") {
                let body = body.strip_suffix("*/").unwrap_or(body);
                lines.extend(body.lines().map(|l| l.trim_end().to_string()));
            }
        }

        while lines.first().is_some_and(|l| l.is_empty()) {
            lines.remove(0);
        }
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines.dedup_by(|a, b| a.is_empty() && b.is_empty());

        lines.join("\n")
    }
}

/// `//go:generate`, `//line`, `//export` style directives are not documentation.
fn is_directive(body: &str) -> bool {
    if body.starts_with("line ") || body.starts_with("export ") || body.starts_with("extern ") {
        return true;
    }
    // "//[a-z0-9]+:[a-z0-9]" with no space after the slashes
    let Some((head, tail)) = body.split_once(':') else {
        return false;
    };
    !head.is_empty()
        && head.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        && tail.bytes().next().is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

/// Expressions the passes care about: callee shapes and receiver types.
///
/// Everything else collapses into `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// `foo`, `T`
    Ident(Ident),
    /// `x.Sel`, `pkg.Type`
    Selector { x: Box<Expr>, sel: Ident },
    /// `*T`
    Star(Box<Expr>),
    /// `T[A]`, `T[A, B]`, `Fn[int]`
    Index { x: Box<Expr>, indices: Vec<Expr> },
    /// `(expr)`
    Paren(Box<Expr>),
    Other { pos: Pos },
}

impl Expr {
    pub fn pos(&self) -> Pos {
        match self {
            Expr::Ident(id) => id.pos,
            Expr::Selector { x, .. } | Expr::Star(x) | Expr::Index { x, .. } => x.pos(),
            Expr::Paren(inner) => inner.pos(),
            Expr::Other { pos } => *pos,
        }
    }

    /// Render a type expression the way Go's `typeToString` helpers do:
    /// `*T`, `pkg.T`, `T[A, B]`. Shapes that are not type names render empty.
    pub fn type_string(&self) -> String {
        match self {
            Expr::Ident(id) => id.name.clone(),
            Expr::Star(x) => format!("*{}", x.type_string()),
            Expr::Selector { x, sel } => format!("{}.{}", x.type_string(), sel.name),
            Expr::Index { x, indices } => {
                let args: Vec<String> = indices.iter().map(Expr::type_string).collect();
                format!("{}[{}]", x.type_string(), args.join(", "))
            }
            Expr::Paren(_) | Expr::Other { .. } => String::new(),
        }
    }
}

/// A call expression found inside a declaration body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    pub fun: Expr,
    /// Position of the call, i.e. the start of `fun`.
    pub pos: Pos,
}

/// Function body, reduced to its call sites.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Body {
    /// Every call in the body in source pre-order, including calls nested in
    /// arguments and function literals.
    pub calls: Vec<CallExpr>,
}

/// Method receiver: `(s *Server)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    pub name: Option<Ident>,
    pub ty: Expr,
}

impl Receiver {
    /// Base type name used as the grouping key for methods.
    ///
    /// Pointer wrappers are unwrapped, generic argument lists flattened:
    /// `*List[K, V]` becomes `List[K, V]`.
    pub fn base_type(&self) -> String {
        let rendered = self.ty.type_string();
        rendered.trim_start_matches('*').to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    pub name: Ident,
    pub recv: Option<Receiver>,
    /// Parameter names in order; unnamed parameters contribute nothing.
    pub params: Vec<String>,
    pub doc: Option<CommentGroup>,
    pub span: Span,
    /// `None` for declarations without a body (assembly stubs, `//go:linkname`).
    pub body: Option<Body>,
}

/// What a type spec declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeShape {
    Struct,
    Interface,
    /// Named primitives, func types, maps, aliases ...
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    pub name: Ident,
    pub shape: TypeShape,
    /// Doc comment inside a grouped `type ( ... )` declaration.
    pub doc: Option<CommentGroup>,
    /// Starts at the spec name, not at the `type` keyword.
    pub span: Span,
}

/// `type T struct{}` or `type ( A struct{}; B interface{} )`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub doc: Option<CommentGroup>,
    pub specs: Vec<TypeSpec>,
}

/// Top-level declarations. Imports, consts and vars are not modeled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    Type(TypeDecl),
    Func(FuncDecl),
}

/// One lowered Go file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceFile {
    pub decls: Vec<Decl>,
}
