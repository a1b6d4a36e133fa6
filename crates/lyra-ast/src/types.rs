//! Types, kinds, and constraints.
//!
//! Function types are not a primitive: `a -> b` is the application
//! `Prim.Function a b`, built with [`Type::function`]. Records are a type
//! constructor over a row, and rows are built from [`Type::RowCons`] cells
//! ending in [`Type::RowEmpty`]. The unit type is the empty record `{}`.

use crate::names::{ClassNameKind, ProperName, Qualified, TypeNameKind};
#[cfg(test)]
use crate::names::ModuleName;
use crate::prim;
use lyra_intern::Symbol;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// The kind of ordinary types.
    Star,
    /// The kind of rows of the given kind.
    Row(Box<Kind>),
    /// A kind arrow.
    Arrow(Box<Kind>, Box<Kind>),
    /// An unknown kind, named during kind inference.
    Var(Symbol),
}

/// Auxiliary data attached to a constraint by a solver.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintData {
    /// Partial-application evidence: binder rows seen so far, and whether the
    /// list was truncated.
    PartialRows {
        /// The rows of binder names.
        binders: Vec<Vec<Symbol>>,
        /// Whether rows were dropped.
        truncated: bool,
    },
}

/// A class constraint `C t1 … tn`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    /// The class being constrained over.
    pub class: Qualified<ProperName<ClassNameKind>>,
    /// The type arguments.
    pub args: Vec<Type>,
    /// Optional data the solver may use to discharge the constraint.
    pub data: Option<ConstraintData>,
}

impl Constraint {
    /// A constraint with no solver data.
    #[must_use]
    pub fn new(class: Qualified<ProperName<ClassNameKind>>, args: Vec<Type>) -> Self {
        Self {
            class,
            args,
            data: None,
        }
    }

    /// Apply a type-variable substitution to the constraint arguments.
    #[must_use]
    pub fn replace_type_vars(&self, substitution: &[(Symbol, Type)]) -> Self {
        Self {
            class: self.class.clone(),
            args: self
                .args
                .iter()
                .map(|t| replace_all_type_vars(substitution, t))
                .collect(),
            data: self.data.clone(),
        }
    }
}

/// A functional dependency between the parameters of a class, as positional
/// indices into the parameter list.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionalDependency {
    /// The parameters that determine.
    pub determiners: Vec<usize>,
    /// The parameters determined by them.
    pub determined: Vec<usize>,
}

/// A source-language type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// A type variable.
    Var(Symbol),
    /// A type constructor.
    Constructor(Qualified<ProperName<TypeNameKind>>),
    /// A type application.
    App(Box<Type>, Box<Type>),
    /// A constrained type `C t => ty`.
    Constrained(Constraint, Box<Type>),
    /// A row extension `(label :: ty | rest)`.
    RowCons(Symbol, Box<Type>, Box<Type>),
    /// The empty row.
    RowEmpty,
    /// A record over a row.
    Record(Box<Type>),
    /// Universal quantification over one variable.
    ForAll(Symbol, Box<Type>),
}

impl Type {
    /// A type constructor by qualified name.
    #[must_use]
    pub fn constructor(name: Qualified<ProperName<TypeNameKind>>) -> Self {
        Self::Constructor(name)
    }

    /// The function type `from -> to`.
    #[must_use]
    pub fn function(from: Type, to: Type) -> Self {
        Self::App(
            Box::new(Self::App(
                Box::new(Self::Constructor(prim::function_type())),
                Box::new(from),
            )),
            Box::new(to),
        )
    }

    /// Apply a head type to arguments, left-associated.
    #[must_use]
    pub fn apply_all(head: Type, args: impl IntoIterator<Item = Type>) -> Self {
        args.into_iter()
            .fold(head, |f, a| Self::App(Box::new(f), Box::new(a)))
    }

    /// A closed row from labelled entries.
    #[must_use]
    pub fn row(entries: impl IntoIterator<Item = (Symbol, Type)>) -> Self {
        let entries: Vec<_> = entries.into_iter().collect();
        entries.into_iter().rev().fold(Self::RowEmpty, |rest, (label, ty)| {
            Self::RowCons(label, Box::new(ty), Box::new(rest))
        })
    }

    /// The unit type, i.e. the empty record `{}`.
    #[must_use]
    pub fn unit() -> Self {
        Self::Record(Box::new(Self::RowEmpty))
    }

    /// Wrap a type in constraints, first constraint outermost.
    #[must_use]
    pub fn constrained(constraints: impl IntoIterator<Item = Constraint>, ty: Type) -> Self {
        let constraints: Vec<_> = constraints.into_iter().collect();
        constraints.into_iter().rev().fold(ty, |inner, constraint| {
            Self::Constrained(constraint, Box::new(inner))
        })
    }
}

/// Fold a summary over a type and all of its subtypes, including constraint
/// arguments. The per-node function is applied to every node, outermost
/// first; results combine left-to-right in source order.
pub fn everything_on_types<R>(
    combine: &impl Fn(R, R) -> R,
    f: &impl Fn(&Type) -> R,
    ty: &Type,
) -> R {
    let mut acc = f(ty);
    match ty {
        Type::Var(_) | Type::Constructor(_) | Type::RowEmpty => {}
        Type::App(a, b) => {
            acc = combine(acc, everything_on_types(combine, f, a));
            acc = combine(acc, everything_on_types(combine, f, b));
        }
        Type::Constrained(constraint, t) => {
            for arg in &constraint.args {
                acc = combine(acc, everything_on_types(combine, f, arg));
            }
            acc = combine(acc, everything_on_types(combine, f, t));
        }
        Type::RowCons(_, t, rest) => {
            acc = combine(acc, everything_on_types(combine, f, t));
            acc = combine(acc, everything_on_types(combine, f, rest));
        }
        Type::Record(row) => acc = combine(acc, everything_on_types(combine, f, row)),
        Type::ForAll(_, t) => acc = combine(acc, everything_on_types(combine, f, t)),
    }
    acc
}

/// Collect every type constructor mentioned in a type, in source order.
#[must_use]
pub fn type_constructors(ty: &Type) -> Vec<Qualified<ProperName<TypeNameKind>>> {
    everything_on_types(
        &|mut a: Vec<_>, b| {
            a.extend(b);
            a
        },
        &|t| match t {
            Type::Constructor(name) => vec![name.clone()],
            _ => Vec::new(),
        },
        ty,
    )
}

/// The free type variables of a type, in order of first occurrence.
#[must_use]
pub fn free_type_variables(ty: &Type) -> Vec<Symbol> {
    fn go(ty: &Type, bound: &mut Vec<Symbol>, free: &mut Vec<Symbol>) {
        match ty {
            Type::Var(v) => {
                if !bound.contains(v) && !free.contains(v) {
                    free.push(*v);
                }
            }
            Type::Constructor(_) | Type::RowEmpty => {}
            Type::App(a, b) => {
                go(a, bound, free);
                go(b, bound, free);
            }
            Type::Constrained(constraint, t) => {
                for arg in &constraint.args {
                    go(arg, bound, free);
                }
                go(t, bound, free);
            }
            Type::RowCons(_, t, rest) => {
                go(t, bound, free);
                go(rest, bound, free);
            }
            Type::Record(row) => go(row, bound, free),
            Type::ForAll(v, t) => {
                bound.push(*v);
                go(t, bound, free);
                bound.pop();
            }
        }
    }
    let mut free = Vec::new();
    go(ty, &mut Vec::new(), &mut free);
    free
}

/// Universally quantify the free variables of a type, outermost first.
#[must_use]
pub fn quantify(ty: Type) -> Type {
    let free = free_type_variables(&ty);
    free.into_iter()
        .rev()
        .fold(ty, |t, v| Type::ForAll(v, Box::new(t)))
}

/// Hoist quantifiers through constrained types to the front.
///
/// `forall a. C a => forall b. t` becomes `forall a b. C a => t`. Only the
/// spine of quantifiers and constraints is rearranged; nothing under an
/// application is touched.
#[must_use]
pub fn move_quantifiers_to_front(ty: Type) -> Type {
    fn strip(ty: Type, binders: &mut Vec<Symbol>) -> Type {
        match ty {
            Type::ForAll(v, body) => {
                binders.push(v);
                strip(*body, binders)
            }
            Type::Constrained(constraint, body) => {
                Type::Constrained(constraint, Box::new(strip(*body, binders)))
            }
            other => other,
        }
    }
    let mut binders = Vec::new();
    let core = strip(ty, &mut binders);
    binders
        .into_iter()
        .rev()
        .fold(core, |t, v| Type::ForAll(v, Box::new(t)))
}

/// Replace type variables throughout a type.
///
/// Mappings for a variable are shadowed under a `forall` that rebinds it.
#[must_use]
pub fn replace_all_type_vars(substitution: &[(Symbol, Type)], ty: &Type) -> Type {
    match ty {
        Type::Var(v) => substitution
            .iter()
            .find(|(name, _)| name == v)
            .map_or_else(|| ty.clone(), |(_, replacement)| replacement.clone()),
        Type::Constructor(_) | Type::RowEmpty => ty.clone(),
        Type::App(a, b) => Type::App(
            Box::new(replace_all_type_vars(substitution, a)),
            Box::new(replace_all_type_vars(substitution, b)),
        ),
        Type::Constrained(constraint, t) => Type::Constrained(
            constraint.replace_type_vars(substitution),
            Box::new(replace_all_type_vars(substitution, t)),
        ),
        Type::RowCons(label, t, rest) => Type::RowCons(
            *label,
            Box::new(replace_all_type_vars(substitution, t)),
            Box::new(replace_all_type_vars(substitution, rest)),
        ),
        Type::Record(row) => Type::Record(Box::new(replace_all_type_vars(substitution, row))),
        Type::ForAll(v, t) => {
            let shadowed: Vec<(Symbol, Type)> = substitution
                .iter()
                .filter(|(name, _)| name != v)
                .cloned()
                .collect();
            Type::ForAll(*v, Box::new(replace_all_type_vars(&shadowed, t)))
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.class.fmt(f)?;
        for arg in &self.args {
            write!(f, " {}", TypeAtom(arg))?;
        }
        Ok(())
    }
}

/// Renders a type with parentheses if it would not parse as an atom.
struct TypeAtom<'a>(&'a Type);

impl fmt::Display for TypeAtom<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Type::Var(_) | Type::Constructor(_) | Type::Record(_) | Type::RowEmpty => {
                self.0.fmt(f)
            }
            _ => write!(f, "({})", self.0),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Var(v) => f.write_str(v.as_str()),
            Type::Constructor(name) => name.fmt(f),
            Type::App(a, b) => {
                // Render `Prim.Function a b` with the arrow it stands for.
                if let Type::App(inner, from) = a.as_ref() {
                    if matches!(inner.as_ref(), Type::Constructor(c) if *c == prim::function_type())
                    {
                        return write!(f, "{} -> {b}", TypeAtom(from.as_ref()));
                    }
                }
                write!(f, "{a} {}", TypeAtom(b.as_ref()))
            }
            Type::Constrained(constraint, t) => write!(f, "{constraint} => {t}"),
            Type::RowCons(label, t, rest) => {
                write!(f, "{label} :: {t}")?;
                match rest.as_ref() {
                    Type::RowEmpty => Ok(()),
                    other => write!(f, ", {other}"),
                }
            }
            Type::RowEmpty => Ok(()),
            Type::Record(row) => match row.as_ref() {
                Type::RowEmpty => f.write_str("{}"),
                other => write!(f, "{{ {other} }}"),
            },
            Type::ForAll(v, t) => write!(f, "forall {v}. {t}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tycon(module: &str, name: &str) -> Type {
        Type::Constructor(Qualified::global(
            ModuleName::from_dotted(module),
            ProperName::new(name),
        ))
    }

    fn var(name: &str) -> Type {
        Type::Var(Symbol::intern(name))
    }

    #[test]
    fn test_function_display() {
        let ty = Type::function(var("a"), var("b"));
        assert_eq!(ty.to_string(), "a -> b");
    }

    #[test]
    fn test_row_builds_in_order() {
        let row = Type::row(vec![
            (Symbol::intern("x"), var("a")),
            (Symbol::intern("y"), var("b")),
        ]);
        match &row {
            Type::RowCons(label, _, rest) => {
                assert_eq!(label.as_str(), "x");
                assert!(matches!(rest.as_ref(), Type::RowCons(l, _, _) if l.as_str() == "y"));
            }
            other => panic!("expected row, got {other:?}"),
        }
        assert_eq!(Type::Record(Box::new(row)).to_string(), "{ x :: a, y :: b }");
    }

    #[test]
    fn test_free_type_variables_respect_binders() {
        let ty = Type::ForAll(
            Symbol::intern("a"),
            Box::new(Type::function(var("a"), var("b"))),
        );
        assert_eq!(free_type_variables(&ty), vec![Symbol::intern("b")]);
    }

    #[test]
    fn test_quantify_in_first_occurrence_order() {
        let ty = Type::function(var("b"), var("a"));
        let quantified = quantify(ty);
        match quantified {
            Type::ForAll(first, body) => {
                assert_eq!(first.as_str(), "b");
                assert!(matches!(*body, Type::ForAll(second, _) if second.as_str() == "a"));
            }
            other => panic!("expected forall, got {other:?}"),
        }
    }

    #[test]
    fn test_move_quantifiers_to_front() {
        let constraint = Constraint::new(
            Qualified::global(ModuleName::from_dotted("M"), ProperName::new("C")),
            vec![var("a")],
        );
        let ty = Type::ForAll(
            Symbol::intern("a"),
            Box::new(Type::Constrained(
                constraint,
                Box::new(Type::ForAll(Symbol::intern("b"), Box::new(var("b")))),
            )),
        );
        let moved = move_quantifiers_to_front(ty);
        assert_eq!(moved.to_string(), "forall a. forall b. M.C a => b");
    }

    #[test]
    fn test_replace_all_type_vars_shadowing() {
        let subst = vec![(Symbol::intern("a"), tycon("Prim", "Int"))];
        let ty = Type::App(
            Box::new(var("a")),
            Box::new(Type::ForAll(Symbol::intern("a"), Box::new(var("a")))),
        );
        let replaced = replace_all_type_vars(&subst, &ty);
        match replaced {
            Type::App(head, body) => {
                assert!(matches!(head.as_ref(), Type::Constructor(_)));
                assert!(
                    matches!(body.as_ref(), Type::ForAll(_, inner) if matches!(inner.as_ref(), Type::Var(_)))
                );
            }
            other => panic!("expected application, got {other:?}"),
        }
    }

    #[test]
    fn test_type_constructors_sees_constraints() {
        let constraint = Constraint::new(
            Qualified::global(ModuleName::from_dotted("M"), ProperName::new("C")),
            vec![tycon("Data.Maybe", "Maybe")],
        );
        let ty = Type::Constrained(constraint, Box::new(tycon("Prim", "Int")));
        let cons = type_constructors(&ty);
        assert_eq!(cons.len(), 2);
        assert_eq!(cons[0].value.as_str(), "Maybe");
        assert_eq!(cons[1].value.as_str(), "Int");
    }
}
