//! Go source parsing.
//!
//! This module handles:
//! - Loading the tree-sitter Go grammar and the call-site query
//! - Parsing source files into syntax trees
//! - Lowering trees into the typed AST the analysis passes match on
//!
//! A file either parses cleanly or fails the run; there is no partial result.

pub mod ast;
mod treesitter;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::ParseError;

pub use ast::SourceFile;
pub use treesitter::parse_go;

/// One file, parsed and ready for both passes.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Absolute path, reported as-is in symbol locations.
    pub path: PathBuf,
    /// Path relative to the analysis root; the identifier scheme is built on it.
    pub rel_path: PathBuf,
    /// Raw source text, needed for span extraction.
    pub source: String,
    pub ast: SourceFile,
}

impl ParsedFile {
    /// Parse already-loaded source text.
    pub fn from_source(
        path: impl Into<PathBuf>,
        rel_path: impl Into<PathBuf>,
        source: impl Into<String>,
    ) -> Result<Self, ParseError> {
        let path = path.into();
        let source = source.into();
        let ast = parse_go(&path, &source)?;
        Ok(Self {
            path,
            rel_path: rel_path.into(),
            source,
            ast,
        })
    }

    /// Read and parse a file below `root`.
    pub fn load(path: &Path, root: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let rel_path = relative_to(root, path);
        Ok(Self::from_source(path, rel_path, source)?)
    }
}

/// `path` relative to `root`; paths outside the root are returned unchanged.
pub fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_computes_relative_path() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let pkg = dir.path().join("pkg");
        std::fs::create_dir_all(&pkg)?;
        let file = pkg.join("server.go");
        std::fs::write(&file, "package pkg\n\nfunc Start() {}\n")?;

        let parsed = ParsedFile::load(&file, dir.path())?;
        assert_eq!(parsed.rel_path, Path::new("pkg/server.go"));
        assert_eq!(parsed.path, file);
        assert_eq!(parsed.ast.decls.len(), 1);
        Ok(())
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = ParsedFile::load(Path::new("/nonexistent/x.go"), Path::new("/nonexistent"));
        assert!(result.is_err());
    }

    #[test]
    fn test_relative_to_outside_root() {
        let rel = relative_to(Path::new("/repo"), Path::new("/elsewhere/a.go"));
        assert_eq!(rel, Path::new("/elsewhere/a.go"));
    }
}
