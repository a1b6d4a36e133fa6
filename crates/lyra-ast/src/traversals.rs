//! Generic traversals over the declaration/expression/binder family.
//!
//! Desugaring passes share three shapes of tree walk: a total bottom-up
//! rewrite ([`Rewrite`]), a fallible top-down rewrite
//! ([`TryRewriteTopDown`]), and a monoidal fold ([`AstFold`] with the
//! `fold_*` drivers). All three visit every node reachable from a
//! declaration — through binding groups, class members, instance bodies
//! (explicit members and newtype dictionary expressions alike), and position
//! wrappers — and never reorder siblings.

use crate::ast::{
    Binder, CaseAlternative, Declaration, DoNotationElement, GuardedExpr, Literal,
    TypeInstanceBody, Value,
};
use crate::types::Type;

/// Apply a fallible function to the first component of a pair.
pub fn try_map_fst<A, B, E>(pair: (A, B), f: impl FnOnce(A) -> Result<A, E>) -> Result<(A, B), E> {
    let (a, b) = pair;
    Ok((f(a)?, b))
}

/// Apply a fallible function to the second component of a pair.
pub fn try_map_snd<A, B, E>(pair: (A, B), f: impl FnOnce(B) -> Result<B, E>) -> Result<(A, B), E> {
    let (a, b) = pair;
    Ok((a, f(b)?))
}

/// Apply a fallible function under an `Option`.
pub fn try_map_option<T, E>(
    option: Option<T>,
    f: impl FnOnce(T) -> Result<T, E>,
) -> Result<Option<T>, E> {
    option.map(f).transpose()
}

// ============================================================
// Bottom-up rewriting
// ============================================================

/// A total bottom-up rewrite.
///
/// Children are rebuilt first; the per-node function then sees the rebuilt
/// node. With identity functions the rewrite is the identity.
pub struct Rewrite<F, G, H> {
    /// Applied to every rebuilt declaration.
    pub on_declaration: F,
    /// Applied to every rebuilt expression.
    pub on_value: G,
    /// Applied to every rebuilt binder.
    pub on_binder: H,
}

impl<F, G, H> Rewrite<F, G, H>
where
    F: FnMut(Declaration) -> Declaration,
    G: FnMut(Value) -> Value,
    H: FnMut(Binder) -> Binder,
{
    /// Create a rewrite from the three per-node functions.
    pub fn new(on_declaration: F, on_value: G, on_binder: H) -> Self {
        Self {
            on_declaration,
            on_value,
            on_binder,
        }
    }

    /// Rewrite a declaration and everything under it.
    pub fn declaration(&mut self, decl: Declaration) -> Declaration {
        let rebuilt = match decl {
            Declaration::DataBindingGroup(decls) => Declaration::DataBindingGroup(
                decls.into_iter().map(|d| self.declaration(d)).collect(),
            ),
            Declaration::Value(mut value) => {
                value.binders = value.binders.into_iter().map(|b| self.binder(b)).collect();
                value.expression = value
                    .expression
                    .into_iter()
                    .map(|g| self.guarded(g))
                    .collect();
                Declaration::Value(value)
            }
            Declaration::BindingGroup(bindings) => Declaration::BindingGroup(
                bindings
                    .into_iter()
                    .map(|(ident, kind, v)| (ident, kind, self.value(v)))
                    .collect(),
            ),
            Declaration::TypeClass(mut class) => {
                class.members = class
                    .members
                    .into_iter()
                    .map(|d| self.declaration(d))
                    .collect();
                Declaration::TypeClass(class)
            }
            Declaration::TypeInstance(mut instance) => {
                instance.body = match instance.body {
                    TypeInstanceBody::Explicit(members) => TypeInstanceBody::Explicit(
                        members.into_iter().map(|d| self.declaration(d)).collect(),
                    ),
                    TypeInstanceBody::NewtypeWithDictionary(dict) => {
                        TypeInstanceBody::NewtypeWithDictionary(self.value(dict))
                    }
                    derived @ TypeInstanceBody::Derived => derived,
                };
                Declaration::TypeInstance(instance)
            }
            Declaration::Positioned(span, inner) => {
                Declaration::Positioned(span, Box::new(self.declaration(*inner)))
            }
            leaf => leaf,
        };
        (self.on_declaration)(rebuilt)
    }

    /// Rewrite an expression and everything under it.
    pub fn value(&mut self, value: Value) -> Value {
        let rebuilt = match value {
            Value::Literal(lit) => Value::Literal(self.literal(lit)),
            Value::UnaryMinus(v) => Value::UnaryMinus(Box::new(self.value(*v))),
            Value::BinaryNoParens(op, lhs, rhs) => Value::BinaryNoParens(
                Box::new(self.value(*op)),
                Box::new(self.value(*lhs)),
                Box::new(self.value(*rhs)),
            ),
            Value::Parens(v) => Value::Parens(Box::new(self.value(*v))),
            Value::Accessor(label, v) => Value::Accessor(label, Box::new(self.value(*v))),
            Value::ObjectUpdate(obj, fields) => Value::ObjectUpdate(
                Box::new(self.value(*obj)),
                fields
                    .into_iter()
                    .map(|(label, v)| (label, self.value(v)))
                    .collect(),
            ),
            Value::Abs(param, body) => Value::Abs(param, Box::new(self.value(*body))),
            Value::App(f, a) => Value::App(Box::new(self.value(*f)), Box::new(self.value(*a))),
            Value::IfThenElse(c, t, e) => Value::IfThenElse(
                Box::new(self.value(*c)),
                Box::new(self.value(*t)),
                Box::new(self.value(*e)),
            ),
            Value::Case(scrutinees, alternatives) => Value::Case(
                scrutinees.into_iter().map(|v| self.value(v)).collect(),
                alternatives
                    .into_iter()
                    .map(|a| self.case_alternative(a))
                    .collect(),
            ),
            Value::TypedValue(check, v, ty) => {
                Value::TypedValue(check, Box::new(self.value(*v)), ty)
            }
            Value::Let(decls, body) => Value::Let(
                decls.into_iter().map(|d| self.declaration(d)).collect(),
                Box::new(self.value(*body)),
            ),
            Value::Do(elements) => {
                Value::Do(elements.into_iter().map(|e| self.do_element(e)).collect())
            }
            Value::TypeClassDictionaryConstructorApp(class, v) => {
                Value::TypeClassDictionaryConstructorApp(class, Box::new(self.value(*v)))
            }
            Value::Positioned(span, v) => Value::Positioned(span, Box::new(self.value(*v))),
            leaf @ (Value::Var(_)
            | Value::Constructor(_)
            | Value::TypeClassDictionary(_)
            | Value::SuperClassDictionary(..)
            | Value::TypeClassDictionaryAccessor(..)
            | Value::DeferredDictionary(..)) => leaf,
        };
        (self.on_value)(rebuilt)
    }

    /// Rewrite a binder and everything under it.
    pub fn binder(&mut self, binder: Binder) -> Binder {
        let rebuilt = match binder {
            Binder::Constructor(name, args) => Binder::Constructor(
                name,
                args.into_iter().map(|b| self.binder(b)).collect(),
            ),
            Binder::Object(fields) => Binder::Object(
                fields
                    .into_iter()
                    .map(|(label, b)| (label, self.binder(b)))
                    .collect(),
            ),
            Binder::Array(elements) => {
                Binder::Array(elements.into_iter().map(|b| self.binder(b)).collect())
            }
            Binder::Cons(head, tail) => {
                Binder::Cons(Box::new(self.binder(*head)), Box::new(self.binder(*tail)))
            }
            Binder::Named(name, inner) => Binder::Named(name, Box::new(self.binder(*inner))),
            Binder::Positioned(span, inner) => {
                Binder::Positioned(span, Box::new(self.binder(*inner)))
            }
            leaf => leaf,
        };
        (self.on_binder)(rebuilt)
    }

    fn literal(&mut self, literal: Literal<Value>) -> Literal<Value> {
        match literal {
            Literal::Array(elements) => {
                Literal::Array(elements.into_iter().map(|v| self.value(v)).collect())
            }
            Literal::Object(fields) => Literal::Object(
                fields
                    .into_iter()
                    .map(|(label, v)| (label, self.value(v)))
                    .collect(),
            ),
            scalar => scalar,
        }
    }

    fn case_alternative(&mut self, alternative: CaseAlternative) -> CaseAlternative {
        CaseAlternative {
            binders: alternative
                .binders
                .into_iter()
                .map(|b| self.binder(b))
                .collect(),
            guard: alternative.guard.map(|g| self.value(g)),
            result: self.value(alternative.result),
        }
    }

    fn do_element(&mut self, element: DoNotationElement) -> DoNotationElement {
        match element {
            DoNotationElement::Value(v) => DoNotationElement::Value(self.value(v)),
            DoNotationElement::Bind(binder, v) => {
                DoNotationElement::Bind(self.binder(binder), self.value(v))
            }
            DoNotationElement::Let(decls) => DoNotationElement::Let(
                decls.into_iter().map(|d| self.declaration(d)).collect(),
            ),
            DoNotationElement::Positioned(span, inner) => {
                DoNotationElement::Positioned(span, Box::new(self.do_element(*inner)))
            }
        }
    }

    fn guarded(&mut self, guarded: GuardedExpr) -> GuardedExpr {
        GuardedExpr {
            guard: guarded.guard.map(|g| self.value(g)),
            value: self.value(guarded.value),
        }
    }
}

// ============================================================
// Fallible top-down rewriting
// ============================================================

/// A fallible top-down rewrite.
///
/// The per-node function is applied first; the walk then descends into the
/// result. Visitation order is deterministic and left-to-right; the first
/// error aborts the walk.
pub struct TryRewriteTopDown<F, G, H> {
    /// Applied to every declaration before descending.
    pub on_declaration: F,
    /// Applied to every expression before descending.
    pub on_value: G,
    /// Applied to every binder before descending.
    pub on_binder: H,
}

impl<E, F, G, H> TryRewriteTopDown<F, G, H>
where
    F: FnMut(Declaration) -> Result<Declaration, E>,
    G: FnMut(Value) -> Result<Value, E>,
    H: FnMut(Binder) -> Result<Binder, E>,
{
    /// Create a rewrite from the three per-node functions.
    pub fn new(on_declaration: F, on_value: G, on_binder: H) -> Self {
        Self {
            on_declaration,
            on_value,
            on_binder,
        }
    }

    /// Rewrite a declaration and everything under it.
    pub fn declaration(&mut self, decl: Declaration) -> Result<Declaration, E> {
        match (self.on_declaration)(decl)? {
            Declaration::DataBindingGroup(decls) => Ok(Declaration::DataBindingGroup(
                decls
                    .into_iter()
                    .map(|d| self.declaration(d))
                    .collect::<Result<_, E>>()?,
            )),
            Declaration::Value(mut value) => {
                value.binders = value
                    .binders
                    .into_iter()
                    .map(|b| self.binder(b))
                    .collect::<Result<_, E>>()?;
                value.expression = value
                    .expression
                    .into_iter()
                    .map(|g| self.guarded(g))
                    .collect::<Result<_, E>>()?;
                Ok(Declaration::Value(value))
            }
            Declaration::BindingGroup(bindings) => Ok(Declaration::BindingGroup(
                bindings
                    .into_iter()
                    .map(|(ident, kind, v)| Ok((ident, kind, self.value(v)?)))
                    .collect::<Result<_, E>>()?,
            )),
            Declaration::TypeClass(mut class) => {
                class.members = class
                    .members
                    .into_iter()
                    .map(|d| self.declaration(d))
                    .collect::<Result<_, E>>()?;
                Ok(Declaration::TypeClass(class))
            }
            Declaration::TypeInstance(mut instance) => {
                instance.body = match instance.body {
                    TypeInstanceBody::Explicit(members) => TypeInstanceBody::Explicit(
                        members
                            .into_iter()
                            .map(|d| self.declaration(d))
                            .collect::<Result<_, E>>()?,
                    ),
                    TypeInstanceBody::NewtypeWithDictionary(dict) => {
                        TypeInstanceBody::NewtypeWithDictionary(self.value(dict)?)
                    }
                    derived @ TypeInstanceBody::Derived => derived,
                };
                Ok(Declaration::TypeInstance(instance))
            }
            Declaration::Positioned(span, inner) => Ok(Declaration::Positioned(
                span,
                Box::new(self.declaration(*inner)?),
            )),
            leaf => Ok(leaf),
        }
    }

    /// Rewrite an expression and everything under it.
    pub fn value(&mut self, value: Value) -> Result<Value, E> {
        match (self.on_value)(value)? {
            Value::Literal(Literal::Array(elements)) => Ok(Value::Literal(Literal::Array(
                elements
                    .into_iter()
                    .map(|v| self.value(v))
                    .collect::<Result<_, E>>()?,
            ))),
            Value::Literal(Literal::Object(fields)) => Ok(Value::Literal(Literal::Object(
                fields
                    .into_iter()
                    .map(|field| try_map_snd(field, |v| self.value(v)))
                    .collect::<Result<_, E>>()?,
            ))),
            Value::UnaryMinus(v) => Ok(Value::UnaryMinus(Box::new(self.value(*v)?))),
            Value::BinaryNoParens(op, lhs, rhs) => Ok(Value::BinaryNoParens(
                Box::new(self.value(*op)?),
                Box::new(self.value(*lhs)?),
                Box::new(self.value(*rhs)?),
            )),
            Value::Parens(v) => Ok(Value::Parens(Box::new(self.value(*v)?))),
            Value::Accessor(label, v) => Ok(Value::Accessor(label, Box::new(self.value(*v)?))),
            Value::ObjectUpdate(obj, fields) => Ok(Value::ObjectUpdate(
                Box::new(self.value(*obj)?),
                fields
                    .into_iter()
                    .map(|field| try_map_snd(field, |v| self.value(v)))
                    .collect::<Result<_, E>>()?,
            )),
            Value::Abs(param, body) => Ok(Value::Abs(param, Box::new(self.value(*body)?))),
            Value::App(f, a) => Ok(Value::App(
                Box::new(self.value(*f)?),
                Box::new(self.value(*a)?),
            )),
            Value::IfThenElse(c, t, e) => Ok(Value::IfThenElse(
                Box::new(self.value(*c)?),
                Box::new(self.value(*t)?),
                Box::new(self.value(*e)?),
            )),
            Value::Case(scrutinees, alternatives) => Ok(Value::Case(
                scrutinees
                    .into_iter()
                    .map(|v| self.value(v))
                    .collect::<Result<_, E>>()?,
                alternatives
                    .into_iter()
                    .map(|a| self.case_alternative(a))
                    .collect::<Result<_, E>>()?,
            )),
            Value::TypedValue(check, v, ty) => {
                Ok(Value::TypedValue(check, Box::new(self.value(*v)?), ty))
            }
            Value::Let(decls, body) => Ok(Value::Let(
                decls
                    .into_iter()
                    .map(|d| self.declaration(d))
                    .collect::<Result<_, E>>()?,
                Box::new(self.value(*body)?),
            )),
            Value::Do(elements) => Ok(Value::Do(
                elements
                    .into_iter()
                    .map(|e| self.do_element(e))
                    .collect::<Result<_, E>>()?,
            )),
            Value::TypeClassDictionaryConstructorApp(class, v) => Ok(
                Value::TypeClassDictionaryConstructorApp(class, Box::new(self.value(*v)?)),
            ),
            Value::Positioned(span, v) => Ok(Value::Positioned(span, Box::new(self.value(*v)?))),
            leaf => Ok(leaf),
        }
    }

    /// Rewrite a binder and everything under it.
    pub fn binder(&mut self, binder: Binder) -> Result<Binder, E> {
        match (self.on_binder)(binder)? {
            Binder::Constructor(name, args) => Ok(Binder::Constructor(
                name,
                args.into_iter()
                    .map(|b| self.binder(b))
                    .collect::<Result<_, E>>()?,
            )),
            Binder::Object(fields) => Ok(Binder::Object(
                fields
                    .into_iter()
                    .map(|field| try_map_snd(field, |b| self.binder(b)))
                    .collect::<Result<_, E>>()?,
            )),
            Binder::Array(elements) => Ok(Binder::Array(
                elements
                    .into_iter()
                    .map(|b| self.binder(b))
                    .collect::<Result<_, E>>()?,
            )),
            Binder::Cons(head, tail) => Ok(Binder::Cons(
                Box::new(self.binder(*head)?),
                Box::new(self.binder(*tail)?),
            )),
            Binder::Named(name, inner) => {
                Ok(Binder::Named(name, Box::new(self.binder(*inner)?)))
            }
            Binder::Positioned(span, inner) => {
                Ok(Binder::Positioned(span, Box::new(self.binder(*inner)?)))
            }
            leaf => Ok(leaf),
        }
    }

    fn case_alternative(&mut self, alternative: CaseAlternative) -> Result<CaseAlternative, E> {
        Ok(CaseAlternative {
            binders: alternative
                .binders
                .into_iter()
                .map(|b| self.binder(b))
                .collect::<Result<_, E>>()?,
            guard: try_map_option(alternative.guard, |g| self.value(g))?,
            result: self.value(alternative.result)?,
        })
    }

    fn do_element(&mut self, element: DoNotationElement) -> Result<DoNotationElement, E> {
        match element {
            DoNotationElement::Value(v) => Ok(DoNotationElement::Value(self.value(v)?)),
            DoNotationElement::Bind(binder, v) => Ok(DoNotationElement::Bind(
                self.binder(binder)?,
                self.value(v)?,
            )),
            DoNotationElement::Let(decls) => Ok(DoNotationElement::Let(
                decls
                    .into_iter()
                    .map(|d| self.declaration(d))
                    .collect::<Result<_, E>>()?,
            )),
            DoNotationElement::Positioned(span, inner) => Ok(DoNotationElement::Positioned(
                span,
                Box::new(self.do_element(*inner)?),
            )),
        }
    }

    fn guarded(&mut self, guarded: GuardedExpr) -> Result<GuardedExpr, E> {
        Ok(GuardedExpr {
            guard: try_map_option(guarded.guard, |g| self.value(g))?,
            value: self.value(guarded.value)?,
        })
    }
}

// ============================================================
// Monoidal folding
// ============================================================

/// A monoidal fold over the whole family.
///
/// Implementors override the node hooks they care about; the `fold_*`
/// drivers combine sub-results left-to-right in source order, starting from
/// the node's own summary.
pub trait AstFold {
    /// The summary type.
    type Output;

    /// The empty summary.
    fn empty(&self) -> Self::Output;

    /// Combine two summaries, left before right.
    fn combine(&self, a: Self::Output, b: Self::Output) -> Self::Output;

    /// Summarize a declaration node.
    fn on_declaration(&self, _decl: &Declaration) -> Self::Output {
        self.empty()
    }

    /// Summarize an expression node.
    fn on_value(&self, _value: &Value) -> Self::Output {
        self.empty()
    }

    /// Summarize a binder node.
    fn on_binder(&self, _binder: &Binder) -> Self::Output {
        self.empty()
    }

    /// Summarize a case alternative.
    fn on_case_alternative(&self, _alternative: &CaseAlternative) -> Self::Output {
        self.empty()
    }

    /// Summarize a do element.
    fn on_do_element(&self, _element: &DoNotationElement) -> Self::Output {
        self.empty()
    }
}

/// Fold a declaration and everything under it.
pub fn fold_declaration<F: AstFold>(fold: &F, decl: &Declaration) -> F::Output {
    let mut acc = fold.on_declaration(decl);
    match decl {
        Declaration::DataBindingGroup(decls) => {
            for d in decls {
                acc = fold.combine(acc, fold_declaration(fold, d));
            }
        }
        Declaration::Value(value) => {
            for b in &value.binders {
                acc = fold.combine(acc, fold_binder(fold, b));
            }
            for guarded in &value.expression {
                if let Some(g) = &guarded.guard {
                    acc = fold.combine(acc, fold_value(fold, g));
                }
                acc = fold.combine(acc, fold_value(fold, &guarded.value));
            }
        }
        Declaration::BindingGroup(bindings) => {
            for (_, _, v) in bindings {
                acc = fold.combine(acc, fold_value(fold, v));
            }
        }
        Declaration::TypeClass(class) => {
            for d in &class.members {
                acc = fold.combine(acc, fold_declaration(fold, d));
            }
        }
        Declaration::TypeInstance(instance) => match &instance.body {
            TypeInstanceBody::Explicit(members) => {
                for d in members {
                    acc = fold.combine(acc, fold_declaration(fold, d));
                }
            }
            TypeInstanceBody::NewtypeWithDictionary(dict) => {
                acc = fold.combine(acc, fold_value(fold, dict));
            }
            TypeInstanceBody::Derived => {}
        },
        Declaration::Positioned(_, inner) => {
            acc = fold.combine(acc, fold_declaration(fold, inner));
        }
        _ => {}
    }
    acc
}

/// Fold an expression and everything under it.
pub fn fold_value<F: AstFold>(fold: &F, value: &Value) -> F::Output {
    let mut acc = fold.on_value(value);
    match value {
        Value::Literal(Literal::Array(elements)) => {
            for v in elements {
                acc = fold.combine(acc, fold_value(fold, v));
            }
        }
        Value::Literal(Literal::Object(fields)) => {
            for (_, v) in fields {
                acc = fold.combine(acc, fold_value(fold, v));
            }
        }
        Value::Literal(_) => {}
        Value::UnaryMinus(v) | Value::Parens(v) | Value::Accessor(_, v) => {
            acc = fold.combine(acc, fold_value(fold, v));
        }
        Value::BinaryNoParens(op, lhs, rhs) => {
            acc = fold.combine(acc, fold_value(fold, op));
            acc = fold.combine(acc, fold_value(fold, lhs));
            acc = fold.combine(acc, fold_value(fold, rhs));
        }
        Value::ObjectUpdate(obj, fields) => {
            acc = fold.combine(acc, fold_value(fold, obj));
            for (_, v) in fields {
                acc = fold.combine(acc, fold_value(fold, v));
            }
        }
        Value::Abs(_, body) => acc = fold.combine(acc, fold_value(fold, body)),
        Value::App(f, a) => {
            acc = fold.combine(acc, fold_value(fold, f));
            acc = fold.combine(acc, fold_value(fold, a));
        }
        Value::IfThenElse(c, t, e) => {
            acc = fold.combine(acc, fold_value(fold, c));
            acc = fold.combine(acc, fold_value(fold, t));
            acc = fold.combine(acc, fold_value(fold, e));
        }
        Value::Case(scrutinees, alternatives) => {
            for v in scrutinees {
                acc = fold.combine(acc, fold_value(fold, v));
            }
            for a in alternatives {
                acc = fold.combine(acc, fold_case_alternative(fold, a));
            }
        }
        Value::TypedValue(_, v, _) => acc = fold.combine(acc, fold_value(fold, v)),
        Value::Let(decls, body) => {
            for d in decls {
                acc = fold.combine(acc, fold_declaration(fold, d));
            }
            acc = fold.combine(acc, fold_value(fold, body));
        }
        Value::Do(elements) => {
            for e in elements {
                acc = fold.combine(acc, fold_do_element(fold, e));
            }
        }
        Value::TypeClassDictionaryConstructorApp(_, v) | Value::Positioned(_, v) => {
            acc = fold.combine(acc, fold_value(fold, v));
        }
        Value::Var(_)
        | Value::Constructor(_)
        | Value::TypeClassDictionary(_)
        | Value::SuperClassDictionary(..)
        | Value::TypeClassDictionaryAccessor(..)
        | Value::DeferredDictionary(..) => {}
    }
    acc
}

/// Fold a binder and everything under it.
pub fn fold_binder<F: AstFold>(fold: &F, binder: &Binder) -> F::Output {
    let mut acc = fold.on_binder(binder);
    match binder {
        Binder::Constructor(_, args) => {
            for b in args {
                acc = fold.combine(acc, fold_binder(fold, b));
            }
        }
        Binder::Object(fields) => {
            for (_, b) in fields {
                acc = fold.combine(acc, fold_binder(fold, b));
            }
        }
        Binder::Array(elements) => {
            for b in elements {
                acc = fold.combine(acc, fold_binder(fold, b));
            }
        }
        Binder::Cons(head, tail) => {
            acc = fold.combine(acc, fold_binder(fold, head));
            acc = fold.combine(acc, fold_binder(fold, tail));
        }
        Binder::Named(_, inner) | Binder::Positioned(_, inner) => {
            acc = fold.combine(acc, fold_binder(fold, inner));
        }
        _ => {}
    }
    acc
}

/// Fold a case alternative and everything under it.
pub fn fold_case_alternative<F: AstFold>(fold: &F, alternative: &CaseAlternative) -> F::Output {
    let mut acc = fold.on_case_alternative(alternative);
    for b in &alternative.binders {
        acc = fold.combine(acc, fold_binder(fold, b));
    }
    if let Some(guard) = &alternative.guard {
        acc = fold.combine(acc, fold_value(fold, guard));
    }
    fold.combine(acc, fold_value(fold, &alternative.result))
}

/// Fold a do element and everything under it.
pub fn fold_do_element<F: AstFold>(fold: &F, element: &DoNotationElement) -> F::Output {
    let mut acc = fold.on_do_element(element);
    match element {
        DoNotationElement::Value(v) => acc = fold.combine(acc, fold_value(fold, v)),
        DoNotationElement::Bind(binder, v) => {
            acc = fold.combine(acc, fold_binder(fold, binder));
            acc = fold.combine(acc, fold_value(fold, v));
        }
        DoNotationElement::Let(decls) => {
            for d in decls {
                acc = fold.combine(acc, fold_declaration(fold, d));
            }
        }
        DoNotationElement::Positioned(_, inner) => {
            acc = fold.combine(acc, fold_do_element(fold, inner));
        }
    }
    acc
}

// ============================================================
// Type harvesting
// ============================================================

/// A fold that harvests every type mentioned in a declaration or expression:
/// signatures, synonym bodies, data constructor fields, foreign signatures,
/// constraints on classes and instances, typed values, and dictionary
/// placeholders.
pub struct TypeAccumulator<T, C, R> {
    /// Applied to each harvested type.
    pub on_type: T,
    /// Combines summaries, left before right.
    pub combine_with: C,
    /// The empty summary.
    pub empty: R,
}

impl<T, C, R> TypeAccumulator<T, C, R>
where
    T: Fn(&Type) -> R,
    C: Fn(R, R) -> R,
    R: Clone,
{
    fn harvest<'a>(&self, types: impl IntoIterator<Item = &'a Type>) -> R {
        types
            .into_iter()
            .fold(self.empty.clone(), |acc, ty| {
                (self.combine_with)(acc, (self.on_type)(ty))
            })
    }

    fn constraint_types<'a>(
        &self,
        constraints: impl IntoIterator<Item = &'a crate::types::Constraint>,
    ) -> R {
        constraints.into_iter().fold(self.empty.clone(), |acc, c| {
            (self.combine_with)(acc, self.harvest(&c.args))
        })
    }
}

impl<T, C, R> AstFold for TypeAccumulator<T, C, R>
where
    T: Fn(&Type) -> R,
    C: Fn(R, R) -> R,
    R: Clone,
{
    type Output = R;

    fn empty(&self) -> R {
        self.empty.clone()
    }

    fn combine(&self, a: R, b: R) -> R {
        (self.combine_with)(a, b)
    }

    fn on_declaration(&self, decl: &Declaration) -> R {
        match decl {
            Declaration::Data(data) => self.harvest(
                data.constructors
                    .iter()
                    .flat_map(|c| c.fields.iter()),
            ),
            Declaration::TypeSynonym(synonym) => self.harvest([&synonym.body]),
            Declaration::TypeSignature(sig) => self.harvest([&sig.ty]),
            Declaration::ForeignValue(foreign) => self.harvest([&foreign.ty]),
            Declaration::ForeignInstance(foreign) => self.combine(
                self.constraint_types(&foreign.constraints),
                self.harvest(&foreign.args),
            ),
            Declaration::TypeClass(class) => self.constraint_types(&class.constraints),
            Declaration::TypeInstance(instance) => self.combine(
                self.constraint_types(&instance.constraints),
                self.harvest(&instance.args),
            ),
            _ => self.empty.clone(),
        }
    }

    fn on_value(&self, value: &Value) -> R {
        match value {
            Value::TypedValue(_, _, ty) => self.harvest([ty]),
            Value::TypeClassDictionary(constraint) => self.harvest(&constraint.args),
            Value::SuperClassDictionary(_, tys) | Value::DeferredDictionary(_, tys) => {
                self.harvest(tys)
            }
            _ => self.empty.clone(),
        }
    }
}

/// Collect every type mentioned in a declaration into one summary.
pub fn accum_types<R: Clone>(
    empty: R,
    combine: impl Fn(R, R) -> R,
    on_type: impl Fn(&Type) -> R,
    decl: &Declaration,
) -> R {
    let accumulator = TypeAccumulator {
        on_type,
        combine_with: combine,
        empty,
    };
    fold_declaration(&accumulator, decl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NameKind, Numeric, TypeClassDeclaration, TypeSignatureDeclaration, ValueDeclaration};
    use crate::names::{Ident, ModuleName, ProperName, Qualified};
    use crate::types::Constraint;
    use lyra_intern::Symbol;
    use lyra_span::Span;

    fn sample_declaration() -> Declaration {
        // f a = case a of
        //         x | true -> let g = \y -> [x.l, 1] in g x
        let alternative = CaseAlternative {
            binders: vec![Binder::Var(Ident::new("x"))],
            guard: Some(Value::Literal(Literal::Boolean(true))),
            result: Value::Let(
                vec![Declaration::Value(ValueDeclaration {
                    span: Span::from_raw(10, 20),
                    ident: Ident::new("g"),
                    name_kind: NameKind::Public,
                    binders: vec![],
                    expression: vec![GuardedExpr::unguarded(Value::Abs(
                        Ident::new("y"),
                        Box::new(Value::Literal(Literal::Array(vec![
                            Value::Accessor(
                                Symbol::intern("l"),
                                Box::new(Value::local_var("x")),
                            ),
                            Value::Literal(Literal::Numeric(Numeric::Int(1))),
                        ]))),
                    ))],
                })],
                Box::new(Value::App(
                    Box::new(Value::local_var("g")),
                    Box::new(Value::local_var("x")),
                )),
            ),
        };
        Declaration::Positioned(
            Span::from_raw(0, 40),
            Box::new(Declaration::Value(ValueDeclaration {
                span: Span::from_raw(0, 40),
                ident: Ident::new("f"),
                name_kind: NameKind::Public,
                binders: vec![Binder::Var(Ident::new("a"))],
                expression: vec![GuardedExpr::unguarded(Value::Case(
                    vec![Value::local_var("a")],
                    vec![alternative],
                ))],
            })),
        )
    }

    #[test]
    fn test_pair_and_option_helpers() {
        let ok = |n: i32| Ok::<_, ()>(n + 1);
        assert_eq!(try_map_fst((1, "x"), ok), Ok((2, "x")));
        assert_eq!(try_map_snd(("x", 1), ok), Ok(("x", 2)));
        assert_eq!(try_map_option(Some(1), ok), Ok(Some(2)));
        assert_eq!(try_map_option(None, ok), Ok(None));
        let failed: Result<(i32, &str), i32> = try_map_fst((1, "x"), |_| Err(9));
        assert_eq!(failed, Err(9));
    }

    #[test]
    fn test_identity_rewrite_is_identity() {
        let decl = sample_declaration();
        let mut identity = Rewrite::new(|d| d, |v| v, |b| b);
        assert_eq!(identity.declaration(decl.clone()), decl);
    }

    #[test]
    fn test_bottom_up_sees_every_variable() {
        let decl = sample_declaration();
        let mut names = Vec::new();
        let mut rewrite = Rewrite::new(
            |d| d,
            |v| {
                if let Value::Var(q) = &v {
                    names.push(q.value.as_str());
                }
                v
            },
            |b| b,
        );
        rewrite.declaration(decl);
        assert_eq!(names, vec!["a", "x", "g", "x"]);
    }

    #[test]
    fn test_top_down_rewrite_preserves_order_and_propagates_errors() {
        let decl = sample_declaration();
        let mut names = Vec::new();
        let mut rewrite = TryRewriteTopDown::new(
            Ok::<_, String>,
            |v| {
                if let Value::Var(q) = &v {
                    names.push(q.value.as_str());
                }
                Ok(v)
            },
            Ok,
        );
        rewrite.declaration(decl.clone()).unwrap();
        // Top-down order: scrutinee before alternatives, let before body.
        assert_eq!(names, vec!["a", "x", "g", "x"]);

        let mut failing = TryRewriteTopDown::new(
            Ok,
            |v| match &v {
                Value::Var(q) if q.value.as_str() == "g" => Err("boom".to_string()),
                _ => Ok(v),
            },
            Ok,
        );
        assert_eq!(failing.declaration(decl), Err("boom".to_string()));
    }

    #[test]
    fn test_fold_counts_nodes_by_kind() {
        struct Counter;
        impl AstFold for Counter {
            type Output = (usize, usize);
            fn empty(&self) -> (usize, usize) {
                (0, 0)
            }
            fn combine(&self, a: (usize, usize), b: (usize, usize)) -> (usize, usize) {
                (a.0 + b.0, a.1 + b.1)
            }
            fn on_declaration(&self, _: &Declaration) -> (usize, usize) {
                (1, 0)
            }
            fn on_binder(&self, _: &Binder) -> (usize, usize) {
                (0, 1)
            }
        }
        let (decls, binders) = fold_declaration(&Counter, &sample_declaration());
        // Positioned wrapper + value decl + let-bound decl; binders `a`, `x`.
        assert_eq!(decls, 3);
        assert_eq!(binders, 2);
    }

    #[test]
    fn test_accum_types_reaches_typed_values_and_signatures() {
        let annotated = Declaration::Value(ValueDeclaration {
            span: Span::GENERATED,
            ident: Ident::new("typed"),
            name_kind: NameKind::Public,
            binders: vec![],
            expression: vec![GuardedExpr::unguarded(Value::TypedValue(
                true,
                Box::new(Value::local_var("typed")),
                Type::Constructor(Qualified::global(
                    ModuleName::from_dotted("Prim"),
                    ProperName::new("Int"),
                )),
            ))],
        });
        let count = accum_types(0usize, |a, b| a + b, |_| 1usize, &annotated);
        assert_eq!(count, 1);

        let class = Declaration::TypeClass(TypeClassDeclaration {
            span: Span::GENERATED,
            name: ProperName::new("Sub"),
            params: vec![(Symbol::intern("a"), None)],
            constraints: vec![Constraint::new(
                Qualified::global(ModuleName::from_dotted("M"), ProperName::new("Super")),
                vec![Type::Var(Symbol::intern("a"))],
            )],
            dependencies: vec![],
            members: vec![Declaration::TypeSignature(TypeSignatureDeclaration {
                span: Span::GENERATED,
                ident: Ident::new("sub"),
                ty: Type::Var(Symbol::intern("a")),
            })],
        });
        // One constraint argument, one member signature.
        let count = accum_types(0usize, |a, b| a + b, |_| 1usize, &class);
        assert_eq!(count, 2);
    }
}
