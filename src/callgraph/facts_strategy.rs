//! Resolution backed by type-checker facts.
//!
//! For `foo()` the fact for the `foo` identifier names the declaring object.
//! For `x.Method()` the selection fact recorded at `Method` names the method
//! and its receiver type; package-qualified calls (`pkg.Func()`) have no
//! selection and fall back to the use fact at `Func`.
//!
//! Objects declared inside the root become ids built from their declaring
//! file, so a method declared in one file resolves from any other file.

use super::facts::{FileFacts, ObjectFact, ObjectKind, Origin, SelectionKind};
use super::identifier::identifier_for;
use super::strategies::{CallContext, CalleeRef, ResolutionStrategy};
use crate::extraction::ast::{CallExpr, Expr};

pub struct TypeFactsStrategy<'f> {
    facts: &'f FileFacts,
}

impl<'f> TypeFactsStrategy<'f> {
    pub fn new(facts: &'f FileFacts) -> Self {
        Self { facts }
    }

    /// Object the callee expression refers to. Generic instantiations and
    /// parentheses are looked through.
    fn callee_object(&self, fun: &Expr) -> Option<&'f ObjectFact> {
        let facts: &'f FileFacts = self.facts;
        match fun {
            Expr::Ident(ident) => facts.use_at(ident.pos),
            Expr::Selector { sel, .. } => match facts.selection_at(sel.pos) {
                Some(selection) => match selection.kind {
                    SelectionKind::MethodVal | SelectionKind::MethodExpr => {
                        let object = &selection.object;
                        // A root method is only addressable through its declaring type.
                        let unnamed = object.receiver.is_none()
                            && matches!(object.origin, Origin::InRoot(_));
                        (!unnamed).then_some(object)
                    }
                    // Calling a func-valued field.
                    SelectionKind::FieldVal => None,
                },
                None => facts.use_at(sel.pos),
            },
            Expr::Index { x, .. } | Expr::Paren(x) => self.callee_object(x),
            Expr::Star(_) | Expr::Other { .. } => None,
        }
    }
}

impl ResolutionStrategy for TypeFactsStrategy<'_> {
    fn name(&self) -> &'static str {
        "type_facts"
    }

    fn resolve(&self, call: &CallExpr, _ctx: &CallContext) -> Option<CalleeRef> {
        let object = self.callee_object(&call.fun)?;

        // Calls through variables and constants are function values.
        if matches!(object.kind, ObjectKind::Var | ObjectKind::Const | ObjectKind::Nil) {
            return None;
        }

        let callee = match &object.origin {
            Origin::InRoot(decl_file) => CalleeRef::Local(identifier_for(
                decl_file,
                &object.name,
                object.receiver.as_deref().unwrap_or(""),
            )),
            Origin::External(package) => {
                CalleeRef::External(format!("{}.{}", package.name, object.name))
            }
            Origin::Universe => CalleeRef::Builtin(object.name.clone()),
        };
        Some(callee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callgraph::facts::{PackageRef, SelectionFact};
    use crate::extraction::ast::{Ident, Pos};
    use std::path::Path;

    fn pos(line: u32, column: u32) -> Pos {
        Pos {
            offset: 0,
            line,
            column,
        }
    }

    fn object(name: &str, kind: ObjectKind, origin: Origin, receiver: Option<&str>) -> ObjectFact {
        ObjectFact {
            name: name.into(),
            kind,
            origin,
            receiver: receiver.map(str::to_string),
        }
    }

    fn ctx() -> CallContext<'static> {
        CallContext {
            rel_path: Path::new("cmd/main.go"),
            enclosing_type: "",
            receiver_name: None,
        }
    }

    fn ident_call(name: &str, at: Pos) -> CallExpr {
        CallExpr {
            fun: Expr::Ident(Ident::new(name, at)),
            pos: at,
        }
    }

    fn selector_call(x: &str, sel: &str, at: Pos) -> CallExpr {
        let x_pos = pos(at.line, at.column - x.len() as u32 - 1);
        CallExpr {
            fun: Expr::Selector {
                x: Box::new(Expr::Ident(Ident::new(x, x_pos))),
                sel: Ident::new(sel, at),
            },
            pos: x_pos,
        }
    }

    #[test]
    fn test_method_in_other_file() {
        let mut facts = FileFacts::new();
        facts.insert_selection(
            4,
            6,
            SelectionFact {
                kind: SelectionKind::MethodVal,
                object: object(
                    "Start",
                    ObjectKind::Func,
                    Origin::InRoot("pkg/server.go".into()),
                    Some("Server"),
                ),
            },
        );
        let got = TypeFactsStrategy::new(&facts).resolve(&selector_call("srv", "Start", pos(4, 6)), &ctx());
        assert_eq!(got, Some(CalleeRef::Local("pkg.server.Server.Start".into())));
    }

    #[test]
    fn test_external_and_builtin() {
        let mut facts = FileFacts::new();
        let fmt = PackageRef {
            path: "fmt".into(),
            name: "fmt".into(),
        };
        facts.insert_use(3, 6, object("Println", ObjectKind::Func, Origin::External(fmt), None));
        facts.insert_use(5, 2, object("len", ObjectKind::Builtin, Origin::Universe, None));
        let strategy = TypeFactsStrategy::new(&facts);

        let println = strategy.resolve(&selector_call("fmt", "Println", pos(3, 6)), &ctx());
        assert_eq!(println, Some(CalleeRef::External("fmt.Println".into())));

        let len = strategy.resolve(&ident_call("len", pos(5, 2)), &ctx());
        assert_eq!(len, Some(CalleeRef::Builtin("len".into())));
    }

    #[test]
    fn test_declines_without_fact_or_for_values() {
        let mut facts = FileFacts::new();
        facts.insert_use(
            2,
            2,
            object("handler", ObjectKind::Var, Origin::InRoot("cmd/main.go".into()), None),
        );
        facts.insert_selection(
            3,
            4,
            SelectionFact {
                kind: SelectionKind::FieldVal,
                object: object("OnClose", ObjectKind::Var, Origin::InRoot("cmd/main.go".into()), None),
            },
        );
        let strategy = TypeFactsStrategy::new(&facts);

        assert_eq!(strategy.resolve(&ident_call("handler", pos(2, 2)), &ctx()), None);
        assert_eq!(strategy.resolve(&selector_call("c", "OnClose", pos(3, 4)), &ctx()), None);
        assert_eq!(strategy.resolve(&ident_call("missing", pos(9, 1)), &ctx()), None);
    }

    #[test]
    fn test_generic_instantiation_looks_through_index() {
        let mut facts = FileFacts::new();
        facts.insert_use(
            7,
            2,
            object("Map", ObjectKind::Func, Origin::InRoot("util/slices.go".into()), None),
        );
        let call = CallExpr {
            fun: Expr::Index {
                x: Box::new(Expr::Ident(Ident::new("Map", pos(7, 2)))),
                indices: vec![Expr::Ident(Ident::new("int", pos(7, 6)))],
            },
            pos: pos(7, 2),
        };
        let got = TypeFactsStrategy::new(&facts).resolve(&call, &ctx());
        assert_eq!(got, Some(CalleeRef::Local("util.slices.Map".into())));
    }

    #[test]
    fn test_root_method_without_declaring_receiver_declines() {
        // `o.Inner()` promoted from an embedded Base: without the declaring
        // receiver the id would be guessed from the wrong type.
        let mut facts = FileFacts::new();
        facts.insert_selection(
            6,
            4,
            SelectionFact {
                kind: SelectionKind::MethodVal,
                object: object("Inner", ObjectKind::Func, Origin::InRoot("base.go".into()), None),
            },
        );
        facts.insert_selection(
            7,
            4,
            SelectionFact {
                kind: SelectionKind::MethodVal,
                object: object("Inner", ObjectKind::Func, Origin::InRoot("base.go".into()), Some("Base")),
            },
        );
        let strategy = TypeFactsStrategy::new(&facts);

        assert_eq!(strategy.resolve(&selector_call("o", "Inner", pos(6, 4)), &ctx()), None);
        assert_eq!(
            strategy.resolve(&selector_call("o", "Inner", pos(7, 4)), &ctx()),
            Some(CalleeRef::Local("base.Base.Inner".into()))
        );
    }
}
