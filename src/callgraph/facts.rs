//! Type-checker facts, keyed by use-site position.
//!
//! The facts are produced offline by a Go type-checker and loaded from JSON:
//!
//! ```json
//! {"files": {"pkg/server.go": {
//!     "uses": [{"line": 12, "column": 5, "object": {...}}],
//!     "selections": [{"line": 14, "column": 7, "kind": "method_val",
//!                     "recv": "*pkg.Server", "object": {...}}]
//! }}}
//! ```
//!
//! Positions are 1-based lines and 1-based byte columns of the identifier
//! (for selections, of the selected name). File keys and declaration files
//! may be absolute or root-relative; both are normalized against the analysis
//! root on load, so lookups are always by root-relative path.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::extraction::ast::Pos;

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    files: HashMap<PathBuf, RawFileFacts>,
}

#[derive(Debug, Deserialize)]
struct RawFileFacts {
    #[serde(default)]
    uses: Vec<RawUse>,
    #[serde(default)]
    selections: Vec<RawSelection>,
}

#[derive(Debug, Deserialize)]
struct RawUse {
    line: u32,
    column: u32,
    object: RawObject,
}

#[derive(Debug, Deserialize)]
struct RawSelection {
    line: u32,
    column: u32,
    kind: SelectionKind,
    object: RawObject,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    name: String,
    kind: ObjectKind,
    #[serde(default)]
    package: Option<PackageRef>,
    #[serde(default)]
    decl: Option<RawDeclSite>,
    #[serde(default)]
    receiver: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDeclSite {
    // line/column are present in the document but ids only need the file
    file: PathBuf,
}

/// What kind of object a use refers to (mirrors `go/types.Object`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Func,
    Builtin,
    Type,
    Var,
    Const,
    Nil,
}

/// Mirrors `go/types.SelectionKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    MethodVal,
    MethodExpr,
    FieldVal,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageRef {
    /// Import path, e.g. `net/http`.
    pub path: String,
    /// Package name, e.g. `http`.
    pub name: String,
}

/// Where an object is declared, relative to the analysis root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Declared in this root-relative file.
    InRoot(PathBuf),
    /// Declared in a dependency.
    External(PackageRef),
    /// Universe scope: builtins, predeclared types, `nil`.
    Universe,
}

/// The object a use-site or selection refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectFact {
    pub name: String,
    pub kind: ObjectKind,
    pub origin: Origin,
    /// Receiver base type for methods, pointer and package qualifier stripped.
    pub receiver: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionFact {
    pub kind: SelectionKind,
    pub object: ObjectFact,
}

/// Facts for a single file.
#[derive(Debug, Clone, Default)]
pub struct FileFacts {
    uses: HashMap<(u32, u32), ObjectFact>,
    selections: HashMap<(u32, u32), SelectionFact>,
}

impl FileFacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Object an identifier at `pos` refers to.
    pub fn use_at(&self, pos: Pos) -> Option<&ObjectFact> {
        self.uses.get(&(pos.line, pos.column))
    }

    /// Selection whose selected name sits at `pos`.
    pub fn selection_at(&self, pos: Pos) -> Option<&SelectionFact> {
        self.selections.get(&(pos.line, pos.column))
    }

    pub fn insert_use(&mut self, line: u32, column: u32, object: ObjectFact) {
        self.uses.insert((line, column), object);
    }

    pub fn insert_selection(&mut self, line: u32, column: u32, selection: SelectionFact) {
        self.selections.insert((line, column), selection);
    }

    pub fn len(&self) -> usize {
        self.uses.len() + self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uses.is_empty() && self.selections.is_empty()
    }
}

/// Facts for the whole run, keyed by root-relative file path.
///
/// Immutable once loaded; shared read-only by resolution workers.
#[derive(Debug, Clone, Default)]
pub struct TypeFacts {
    files: HashMap<PathBuf, FileFacts>,
}

impl TypeFacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a facts document from disk.
    pub fn load(path: &Path, root: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read type facts {}", path.display()))?;
        Self::from_json(&json, root)
            .with_context(|| format!("Invalid type facts in {}", path.display()))
    }

    /// Parse a facts document, normalizing paths against `root`.
    pub fn from_json(json: &str, root: &Path) -> Result<Self> {
        let raw: RawDocument = serde_json::from_str(json)?;
        let mut facts = Self::new();

        for (file, raw_file) in raw.files {
            let Some(rel) = within_root(root, &file) else {
                tracing::warn!(file = %file.display(), "type facts for a file outside the root ignored");
                continue;
            };

            let file_facts = facts.files.entry(rel).or_default();
            for u in raw_file.uses {
                file_facts.insert_use(u.line, u.column, lower_object(u.object, root));
            }
            for s in raw_file.selections {
                // `recv` is the type of the receiver expression, which differs
                // from the declaring type for promoted methods. Only the
                // object's own receiver names the method.
                let object = lower_object(s.object, root);
                file_facts.insert_selection(
                    s.line,
                    s.column,
                    SelectionFact {
                        kind: s.kind,
                        object,
                    },
                );
            }
        }

        Ok(facts)
    }

    pub fn insert(&mut self, rel_path: impl Into<PathBuf>, facts: FileFacts) {
        self.files.insert(rel_path.into(), facts);
    }

    /// Facts for a root-relative file. `None` selects heuristic resolution.
    pub fn for_file(&self, rel_path: &Path) -> Option<&FileFacts> {
        self.files.get(rel_path)
    }

    /// Number of files with facts.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn lower_object(raw: RawObject, root: &Path) -> ObjectFact {
    let origin = match (&raw.kind, raw.package, raw.decl) {
        (ObjectKind::Builtin, _, _) | (_, None, _) => Origin::Universe,
        (_, Some(package), Some(decl)) => match within_root(root, &decl.file) {
            Some(rel) => Origin::InRoot(rel),
            None => Origin::External(package),
        },
        (_, Some(package), None) => Origin::External(package),
    };

    ObjectFact {
        name: raw.name,
        kind: raw.kind,
        origin,
        receiver: raw.receiver.as_deref().map(receiver_base),
    }
}

/// Root-relative form of `path`, or `None` if it lies outside the root.
/// Relative paths are taken as already root-relative.
fn within_root(root: &Path, path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return path.strip_prefix(root).ok().map(Path::to_path_buf);
    }
    let escapes = path.components().any(|c| matches!(c, Component::ParentDir));
    if escapes {
        return None;
    }
    Some(
        path.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect(),
    )
}

/// `*example.com/pkg.List[K, V]` to `List[K, V]`.
pub fn receiver_base(recv: &str) -> String {
    let recv = recv.trim_start_matches('*');
    let (base, type_args) = recv.split_at(recv.find('[').unwrap_or(recv.len()));
    let base = base.rsplit_once('.').map_or(base, |(_, name)| name);
    format!("{base}{type_args}")
}
