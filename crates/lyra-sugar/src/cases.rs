//! Elimination of binder and guard sugar from value declarations.
//!
//! Instance members (and let bindings generally) may be written as clauses
//! with argument binders and guards. Later stages expect each binding to be
//! a bare identifier with a single unguarded right-hand side, so this pass
//! lowers
//!
//! ```text
//! f (Just x) | p x = e1
//! f _        = e2
//! ```
//!
//! into `f = \$case0 -> case $case0 of …`. A single clause whose binders are
//! all plain variables needs no case expression and becomes nested lambdas.

use crate::errors::{DesugarError, DesugarResult};
use crate::supply::NameSupply;
use lyra_ast::{
    Binder, CaseAlternative, Declaration, GuardedExpr, Ident, Value, ValueDeclaration,
};
use lyra_span::Span;

/// Lower binder and guard sugar in the given declarations.
///
/// Adjacent clauses for the same identifier merge into one declaration at
/// the first clause's position; all other declarations pass through in
/// order.
pub fn desugar_cases(
    supply: &mut NameSupply,
    decls: Vec<Declaration>,
) -> DesugarResult<Vec<Declaration>> {
    let mut out = Vec::with_capacity(decls.len());
    let mut iter = decls.into_iter().map(strip_position).peekable();
    while let Some((span, decl)) = iter.next() {
        match decl {
            Declaration::Value(first) => {
                let mut clauses = vec![first];
                while let Some((_, Declaration::Value(next))) = iter.peek() {
                    if next.ident != clauses[0].ident {
                        break;
                    }
                    match iter.next() {
                        Some((_, Declaration::Value(next))) => clauses.push(next),
                        _ => unreachable!("peeked a value declaration"),
                    }
                }
                out.push(rewrap(span, Declaration::Value(merge_clauses(supply, clauses)?)));
            }
            other => out.push(rewrap(span, other)),
        }
    }
    Ok(out)
}

/// Split off an outer position wrapper so clause grouping can see through it.
fn strip_position(decl: Declaration) -> (Option<Span>, Declaration) {
    match decl {
        Declaration::Positioned(span, inner) => {
            let (_, stripped) = strip_position(*inner);
            (Some(span), stripped)
        }
        other => (None, other),
    }
}

fn rewrap(span: Option<Span>, decl: Declaration) -> Declaration {
    match span {
        Some(span) => Declaration::Positioned(span, Box::new(decl)),
        None => decl,
    }
}

fn merge_clauses(
    supply: &mut NameSupply,
    clauses: Vec<ValueDeclaration>,
) -> DesugarResult<ValueDeclaration> {
    let arity = clauses[0].binders.len();
    if clauses.iter().any(|clause| clause.binders.len() != arity) {
        return Err(DesugarError::Internal(format!(
            "clauses of {} differ in the number of binders",
            clauses[0].ident
        )));
    }

    // A lone unguarded clause over plain variables (including none) is just
    // a stack of lambdas; anything already in the target form passes through
    // here unchanged.
    if clauses.len() == 1 {
        let all_vars: Option<Vec<Ident>> = clauses[0].binders.iter().map(Binder::as_var).collect();
        let simple =
            clauses[0].expression.len() == 1 && clauses[0].expression[0].is_unguarded();
        if let (Some(params), true) = (all_vars, simple) {
            let clause = clauses.into_iter().next().expect("one clause");
            let value = clause
                .expression
                .into_iter()
                .next()
                .expect("single right-hand side")
                .value;
            return Ok(ValueDeclaration {
                span: clause.span,
                ident: clause.ident,
                name_kind: clause.name_kind,
                binders: Vec::new(),
                expression: vec![GuardedExpr::unguarded(Value::lambdas(params, value))],
            });
        }
    }

    // General shape: fresh arguments scrutinized by a case expression.
    let first = &clauses[0];
    let (span, ident, name_kind) = (first.span, first.ident, first.name_kind);
    let params: Vec<Ident> = (0..arity).map(|_| supply.fresh("case")).collect();
    let scrutinees: Vec<Value> = params
        .iter()
        .map(|p| Value::Var(lyra_ast::Qualified::local(*p)))
        .collect();
    let mut alternatives = Vec::new();
    for clause in clauses {
        for guarded in clause.expression {
            alternatives.push(CaseAlternative {
                binders: clause.binders.clone(),
                guard: guarded.guard,
                result: guarded.value,
            });
        }
    }
    let body = Value::lambdas(params, Value::Case(scrutinees, alternatives));
    Ok(ValueDeclaration {
        span,
        ident,
        name_kind,
        binders: Vec::new(),
        expression: vec![GuardedExpr::unguarded(body)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_ast::{Literal, NameKind, Numeric, Qualified};

    fn clause(ident: &str, binders: Vec<Binder>, guarded: Vec<GuardedExpr>) -> Declaration {
        Declaration::Value(ValueDeclaration {
            span: Span::from_raw(1, 2),
            ident: Ident::new(ident),
            name_kind: NameKind::Public,
            binders,
            expression: guarded,
        })
    }

    fn int(n: i64) -> Value {
        Value::Literal(Literal::Numeric(Numeric::Int(n)))
    }

    #[test]
    fn test_plain_binding_is_untouched() {
        let mut supply = NameSupply::new();
        let decls = vec![clause("x", vec![], vec![GuardedExpr::unguarded(int(1))])];
        let out = desugar_cases(&mut supply, decls.clone()).unwrap();
        assert_eq!(out, decls);
    }

    #[test]
    fn test_variable_binders_become_lambdas() {
        let mut supply = NameSupply::new();
        let decls = vec![clause(
            "f",
            vec![Binder::Var(Ident::new("s"))],
            vec![GuardedExpr::unguarded(Value::local_var("s"))],
        )];
        let out = desugar_cases(&mut supply, decls).unwrap();
        match &out[0] {
            Declaration::Value(v) => {
                assert!(v.binders.is_empty());
                let body = v.simple_expression().expect("single unguarded rhs");
                assert!(
                    matches!(body, Value::Abs(param, _) if param.as_str() == "s"),
                    "expected a lambda, got {body:?}"
                );
            }
            other => panic!("expected a value declaration, got {other:?}"),
        }
    }

    #[test]
    fn test_adjacent_clauses_merge_into_case() {
        let mut supply = NameSupply::new();
        let decls = vec![
            clause(
                "f",
                vec![Binder::Number(Numeric::Int(0))],
                vec![GuardedExpr::unguarded(int(1))],
            ),
            clause(
                "f",
                vec![Binder::Null],
                vec![GuardedExpr {
                    guard: Some(Value::Literal(Literal::Boolean(true))),
                    value: int(2),
                }],
            ),
        ];
        let out = desugar_cases(&mut supply, decls).unwrap();
        assert_eq!(out.len(), 1);
        match &out[0] {
            Declaration::Value(v) => {
                let body = v.simple_expression().expect("single unguarded rhs");
                match body {
                    Value::Abs(param, inner) => match inner.as_ref() {
                        Value::Case(scrutinees, alternatives) => {
                            assert_eq!(scrutinees.len(), 1);
                            assert!(matches!(
                                &scrutinees[0],
                                Value::Var(Qualified { module: None, value }) if value == param
                            ));
                            assert_eq!(alternatives.len(), 2);
                            assert!(alternatives[0].guard.is_none());
                            assert!(alternatives[1].guard.is_some());
                        }
                        other => panic!("expected a case body, got {other:?}"),
                    },
                    other => panic!("expected a lambda, got {other:?}"),
                }
            }
            other => panic!("expected a value declaration, got {other:?}"),
        }
    }

    #[test]
    fn test_position_wrappers_do_not_block_grouping() {
        let mut supply = NameSupply::new();
        let decls = vec![
            Declaration::Positioned(
                Span::from_raw(0, 8),
                Box::new(clause(
                    "f",
                    vec![Binder::Null],
                    vec![GuardedExpr::unguarded(int(1))],
                )),
            ),
            Declaration::Positioned(
                Span::from_raw(9, 17),
                Box::new(clause(
                    "f",
                    vec![Binder::Null],
                    vec![GuardedExpr::unguarded(int(2))],
                )),
            ),
        ];
        let out = desugar_cases(&mut supply, decls).unwrap();
        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0], Declaration::Positioned(span, _) if *span == Span::from_raw(0, 8)));
    }

    #[test]
    fn test_mismatched_arity_is_internal() {
        let mut supply = NameSupply::new();
        let decls = vec![
            clause(
                "f",
                vec![Binder::Null],
                vec![GuardedExpr::unguarded(int(1))],
            ),
            clause("f", vec![], vec![GuardedExpr::unguarded(int(2))]),
        ];
        let err = desugar_cases(&mut supply, decls).unwrap_err();
        assert!(matches!(err, DesugarError::Internal(_)));
    }
}
