//! Two-pass pipeline: collect every file, freeze, then resolve every file.
//!
//! ```text
//! ParsedFile[] ──► [Collect]  per file, parallel ──► Vec<DeclaredSymbol>[]
//!                                                        │ single-writer merge
//!                                                        ▼
//!                                             SymbolTableBuilder ─freeze─► SymbolTable
//!                                                                              │
//! ParsedFile[] ──► [Resolve]  per file, parallel, reads table ◄────────────────┘
//!                      │
//!                      ▼
//!                  CallEdge[]
//! ```
//!
//! The freeze is a full barrier: nothing is resolved until every file has
//! been collected. Both passes keep input file order in their output.

use std::path::{Path, PathBuf};

use anyhow::Result;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::extraction::ParsedFile;
use crate::types::{AnalysisResult, CallEdge, DeclaredSymbol};

use super::collector::SymbolCollector;
use super::facts::TypeFacts;
use super::resolver::{CallResolver, ResolutionStats};
use super::table::{SymbolTable, SymbolTableBuilder};

/// Statistics for a whole run.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub files: usize,
    pub symbols: usize,
    /// Files resolved with type facts available.
    pub files_with_facts: usize,
    pub resolution: ResolutionStats,
}

/// The analysis driver. Owns the (optional) type facts for the run.
#[derive(Debug, Default)]
pub struct Pipeline {
    facts: TypeFacts,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_facts(mut self, facts: TypeFacts) -> Self {
        self.facts = facts;
        self
    }

    /// Read and parse files in parallel. The first failure fails the run.
    pub fn parse_files(paths: &[PathBuf], root: &Path) -> Result<Vec<ParsedFile>> {
        let files = paths
            .par_iter()
            .map(|path| ParsedFile::load(path, root))
            .collect::<Result<Vec<_>>>()?;
        info!(files = files.len(), "parsed");
        Ok(files)
    }

    /// Parse `paths` and run both passes.
    pub fn analyze_paths(
        &self,
        paths: &[PathBuf],
        root: &Path,
    ) -> Result<(AnalysisResult, PipelineStats)> {
        let files = Self::parse_files(paths, root)?;
        Ok(self.run(&files))
    }

    /// Both passes over already-parsed files.
    pub fn run(&self, files: &[ParsedFile]) -> (AnalysisResult, PipelineStats) {
        let (symbols, table) = self.collect(files);
        let (edges, resolution) = self.resolve(files, &table);

        let stats = PipelineStats {
            files: files.len(),
            symbols: symbols.len(),
            files_with_facts: files
                .iter()
                .filter(|f| self.facts.for_file(&f.rel_path).is_some())
                .count(),
            resolution,
        };
        (AnalysisResult { symbols, edges }, stats)
    }

    /// Pass 1: collect symbols and build the frozen table.
    pub fn collect(&self, files: &[ParsedFile]) -> (Vec<DeclaredSymbol>, SymbolTable) {
        let per_file: Vec<Vec<DeclaredSymbol>> = files
            .par_iter()
            .map(|file| {
                let symbols = SymbolCollector::new(file).collect();
                debug!(file = %file.rel_path.display(), symbols = symbols.len(), "collected");
                symbols
            })
            .collect();

        let mut builder = SymbolTableBuilder::new();
        for symbols in &per_file {
            builder.register_all(symbols);
        }
        let table = builder.freeze();

        let symbols: Vec<DeclaredSymbol> = per_file.into_iter().flatten().collect();
        info!(symbols = symbols.len(), ids = table.len(), "collection pass done");
        (symbols, table)
    }

    /// Pass 2: resolve every call against a frozen table.
    pub fn resolve(
        &self,
        files: &[ParsedFile],
        table: &SymbolTable,
    ) -> (Vec<CallEdge>, ResolutionStats) {
        let per_file: Vec<(Vec<CallEdge>, ResolutionStats)> = files
            .par_iter()
            .map(|file| {
                let facts = self.facts.for_file(&file.rel_path);
                let resolver = CallResolver::for_file(table, facts);
                let (edges, stats) = resolver.resolve_file(file);
                debug!(
                    file = %file.rel_path.display(),
                    edges = edges.len(),
                    facts = facts.is_some(),
                    "resolved"
                );
                (edges, stats)
            })
            .collect();

        let mut edges = Vec::new();
        let mut stats = ResolutionStats::default();
        for (file_edges, file_stats) in per_file {
            edges.extend(file_edges);
            stats.merge(&file_stats);
        }

        info!(
            edges = edges.len(),
            resolved = stats.resolved,
            dropped = stats.dropped,
            "resolution pass done"
        );
        (edges, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::callgraph::facts::{
        FileFacts, ObjectFact, ObjectKind, Origin, PackageRef, SelectionFact, SelectionKind,
    };

    fn parse(rel: &str, src: &str) -> ParsedFile {
        ParsedFile::from_source(format!("/repo/{rel}"), rel, src).unwrap()
    }

    fn edge<'r>(edges: &'r [CallEdge], callee: &str) -> &'r CallEdge {
        edges
            .iter()
            .find(|e| e.callee_ref == callee)
            .unwrap_or_else(|| panic!("no edge to {callee}"))
    }

    const SERVER: &str = "package pkg

type Server struct{}

func (s *Server) Start() {
	s.listen()
}

func (s *Server) listen() {}
";

    const MAIN: &str = "package main

func main() {
	srv := &pkg.Server{}
	srv.Start()
	fmt.Println(len(\"x\"))
}
";

    fn files() -> Vec<ParsedFile> {
        vec![parse("pkg/server.go", SERVER), parse("cmd/main.go", MAIN)]
    }

    fn main_facts() -> TypeFacts {
        let mut file = FileFacts::new();
        file.insert_selection(
            5,
            6,
            SelectionFact {
                kind: SelectionKind::MethodVal,
                object: ObjectFact {
                    name: "Start".into(),
                    kind: ObjectKind::Func,
                    origin: Origin::InRoot("pkg/server.go".into()),
                    receiver: Some("Server".into()),
                },
            },
        );
        file.insert_use(
            6,
            6,
            ObjectFact {
                name: "Println".into(),
                kind: ObjectKind::Func,
                origin: Origin::External(PackageRef {
                    path: "fmt".into(),
                    name: "fmt".into(),
                }),
                receiver: None,
            },
        );
        file.insert_use(
            6,
            14,
            ObjectFact {
                name: "len".into(),
                kind: ObjectKind::Builtin,
                origin: Origin::Universe,
                receiver: None,
            },
        );
        let mut facts = TypeFacts::new();
        facts.insert("cmd/main.go", file);
        facts
    }

    #[test]
    fn test_local_function_resolution() {
        let src = "package main\n\nfunc Caller() {\n\tCallee()\n}\n\nfunc Callee() {}\n";
        let (result, stats) = Pipeline::new().run(&[parse("main.go", src)]);

        assert_eq!(result.edges.len(), 1);
        let e = &result.edges[0];
        assert_eq!(e.caller_id, "main.Caller");
        assert_eq!(e.callee_ref, "main.Callee");
        assert!(e.resolved);
        assert_eq!(e.source_line, 4);
        assert_eq!(stats.resolution.resolved, 1);
        assert_eq!(stats.files_with_facts, 0);
    }

    #[test]
    fn test_callee_declared_later_in_file_resolves() {
        // Collection finishes before resolution, so declaration order is irrelevant.
        let src = "package main\n\nfunc A() { B() }\n\nfunc B() {}\n";
        let (result, _) = Pipeline::new().run(&[parse("main.go", src)]);
        assert!(result.edges[0].resolved);
    }

    #[test]
    fn test_same_type_method_resolution() {
        let (result, _) = Pipeline::new().run(&files());
        let e = edge(&result.edges, "pkg.server.Server.listen");
        assert_eq!(e.caller_id, "pkg.server.Server.Start");
        assert!(e.resolved);
    }

    #[test]
    fn test_cross_file_method_needs_facts() {
        let (without, _) = Pipeline::new().run(&files());
        let e = edge(&without.edges, "srv.Start");
        assert!(!e.resolved);

        let (with, stats) = Pipeline::new().with_facts(main_facts()).run(&files());
        let e = edge(&with.edges, "pkg.server.Server.Start");
        assert_eq!(e.caller_id, "cmd.main.main");
        assert!(e.resolved);
        assert_eq!(stats.files_with_facts, 1);
        assert_eq!(stats.resolution.by_strategy.get("type_facts"), Some(&3));
    }

    #[test]
    fn test_external_and_builtin_never_resolve() {
        // A local file whose id happens to equal the external qualified name.
        let shadow = parse("fmt.go", "package main\n\nfunc Println() {}\n");
        let mut all = files();
        all.push(shadow);

        let (with, _) = Pipeline::new().with_facts(main_facts()).run(&all);
        assert!(!edge(&with.edges, "fmt.Println").resolved);
        assert!(!edge(&with.edges, "len").resolved);

        let (without, _) = Pipeline::new().run(&files());
        assert!(!edge(&without.edges, "fmt.Println").resolved);
        assert!(!edge(&without.edges, "len").resolved);
    }

    #[test]
    fn test_partial_table_under_resolves() {
        let pipeline = Pipeline::new().with_facts(main_facts());
        let all = files();

        let (_, full) = pipeline.collect(&all);
        let (full_edges, full_stats) = pipeline.resolve(&all, &full);

        // Table built from cmd/main.go only: pkg/server.go was never collected.
        let (_, partial) = pipeline.collect(&all[1..]);
        let (partial_edges, partial_stats) = pipeline.resolve(&all, &partial);

        assert_eq!(full_edges.len(), partial_edges.len());
        assert!(partial_stats.resolved < full_stats.resolved);
        assert!(edge(&full_edges, "pkg.server.Server.Start").resolved);
        assert!(!edge(&partial_edges, "pkg.server.Server.Start").resolved);
        assert!(!edge(&partial_edges, "pkg.server.Server.listen").resolved);
    }

    fn use_fact(facts: &mut FileFacts, line: u32, column: u32, name: &str, decl: &str) {
        facts.insert_use(
            line,
            column,
            ObjectFact {
                name: name.into(),
                kind: ObjectKind::Func,
                origin: Origin::InRoot(decl.into()),
                receiver: None,
            },
        );
    }

    #[test]
    fn test_generic_calls_resolve_with_facts() {
        let util = parse("util.go", "package main\n\nfunc Map[T any](xs []T) []T { return xs }\n");
        let main = parse(
            "main.go",
            "package main\n\nfunc main() {\n\tMap[int](nil)\n\tMap[int, string](nil, nil)\n}\n",
        );
        let mut file = FileFacts::new();
        use_fact(&mut file, 4, 2, "Map", "util.go");
        use_fact(&mut file, 5, 2, "Map", "util.go");
        let mut facts = TypeFacts::new();
        facts.insert("main.go", file);

        let (result, stats) = Pipeline::new().with_facts(facts).run(&[util, main]);
        let lines: Vec<(u32, &str, bool)> = result
            .edges
            .iter()
            .map(|e| (e.source_line, e.callee_ref.as_str(), e.resolved))
            .collect();
        assert_eq!(lines, vec![(4, "util.Map", true), (5, "util.Map", true)]);
        assert_eq!(stats.resolution.dropped, 0);
    }

    #[test]
    fn test_promoted_method_uses_declaring_receiver() {
        let base = parse("base.go", "package main\n\ntype Base struct{}\n\nfunc (b Base) Inner() {}\n");
        let main = parse(
            "main.go",
            "package main\n\ntype Outer struct{ Base }\n\nfunc run(o Outer) {\n\to.Inner()\n}\n",
        );
        let json = r#"{"files": {"main.go": {"selections": [
            {"line": 6, "column": 4, "kind": "method_val", "recv": "*example.com/m.Outer",
             "object": {"name": "Inner", "kind": "func", "receiver": "example.com/m.Base",
               "package": {"path": "example.com/m", "name": "main"},
               "decl": {"file": "base.go", "line": 5, "column": 15}}}
        ]}}}"#;
        let facts = TypeFacts::from_json(json, Path::new("/repo")).unwrap();

        let (result, _) = Pipeline::new().with_facts(facts).run(&[base, main]);
        let e = edge(&result.edges, "base.Base.Inner");
        assert_eq!(e.caller_id, "main.run");
        assert!(e.resolved);
        assert!(result.edges.iter().all(|e| e.callee_ref != "base.Outer.Inner"));
    }

    #[test]
    fn test_runs_are_deterministic() {
        let pipeline = Pipeline::new().with_facts(main_facts());
        let (first, _) = pipeline.run(&files());
        let (second, _) = pipeline.run(&files());
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_output_keeps_file_order() {
        let (result, stats) = Pipeline::new().run(&files());
        let ids: Vec<_> = result.symbols.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "pkg.server.Server",
                "pkg.server.Server.Start",
                "pkg.server.Server.listen",
                "cmd.main.main"
            ]
        );
        assert_eq!(stats.symbols, 4);
        assert_eq!(stats.files, 2);
    }

    #[test]
    fn test_parse_failure_is_fatal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let good = dir.path().join("good.go");
        let bad = dir.path().join("bad.go");
        std::fs::write(&good, "package a\n\nfunc F() {}\n")?;
        std::fs::write(&bad, "package a\n\nfunc F( {\n")?;

        let err = Pipeline::parse_files(&[good.clone(), bad], dir.path()).unwrap_err();
        assert!(err.to_string().contains("bad.go"));

        let (result, _) = Pipeline::new().analyze_paths(&[good], dir.path())?;
        assert_eq!(result.symbols[0].id, "good.F");
        Ok(())
    }
}
