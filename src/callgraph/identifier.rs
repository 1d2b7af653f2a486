//! Canonical symbol identifiers.
//!
//! An id is derived from the declaring file's root-relative path, not from the
//! Go package: `pkg/server.go` + `Server` + `Start` gives
//! `pkg.server.Server.Start`. Declarations and call targets must both go
//! through [`identifier_for`] or cross-pass matching breaks.
//!
//! Two directories holding the same logical package get different prefixes,
//! and the scheme never consults package names. Downstream consumers key on
//! these strings, so the limitation is kept.

use std::path::{is_separator, Path};

/// Dotted module path for a root-relative file path.
///
/// The last extension is dropped (the suffix starting at the final `.` after
/// the final separator) and every separator becomes `.`.
pub fn module_path(rel_path: &Path) -> String {
    let rel = rel_path.to_string_lossy();
    let stem_len = match rel.rfind(|c: char| c == '.' || is_separator(c)) {
        Some(i) if rel[i..].starts_with('.') => i,
        _ => rel.len(),
    };

    rel[..stem_len]
        .chars()
        .map(|c| if is_separator(c) { '.' } else { c })
        .collect()
}

/// `modulePath.name`, or `modulePath.EnclosingType.name` for methods.
pub fn identifier_for(rel_path: &Path, name: &str, enclosing_type: &str) -> String {
    let module = module_path(rel_path);
    if enclosing_type.is_empty() {
        format!("{module}.{name}")
    } else {
        format!("{module}.{enclosing_type}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_path() {
        assert_eq!(module_path(Path::new("main.go")), "main");
        assert_eq!(module_path(Path::new("pkg/server/http.go")), "pkg.server.http");
        assert_eq!(module_path(Path::new("pkg/v1.2/api.go")), "pkg.v1.2.api");
        // Only the last extension goes.
        assert_eq!(module_path(Path::new("gen/types.pb.go")), "gen.types.pb");
        // A dot in a directory name is not an extension.
        assert_eq!(module_path(Path::new("v1.2/Makefile")), "v1.2.Makefile");
    }

    #[test]
    fn test_identifier_shapes() {
        let file = Path::new("pkg/server.go");
        assert_eq!(identifier_for(file, "Start", ""), "pkg.server.Start");
        assert_eq!(
            identifier_for(file, "Start", "Server"),
            "pkg.server.Server.Start"
        );
        assert_eq!(
            identifier_for(file, "Get", "List[K, V]"),
            "pkg.server.List[K, V].Get"
        );
    }

    #[test]
    fn test_identifier_is_deterministic() {
        let file = Path::new("internal/cache/lru.go");
        let first = identifier_for(file, "Evict", "LRU");
        let second = identifier_for(file, "Evict", "LRU");
        assert_eq!(first, second);
    }

    #[test]
    fn test_same_name_in_different_directories() {
        // Same package name, different directories: different ids.
        let a = identifier_for(Path::new("a/util/util.go"), "Do", "");
        let b = identifier_for(Path::new("b/util/util.go"), "Do", "");
        assert_ne!(a, b);
    }
}
