//! Lowering of type instance declarations.
//!
//! An instance becomes the original declaration (kept for downstream
//! stages) plus a value binding its name to a dictionary expression at the
//! instance's constrained type. Members may reference each other, so the
//! dictionary is built in dependency layers: an initial record holding the
//! members with no outstanding dependencies (plus superclass thunks and
//! `undefined` placeholders for the rest), then one record update per layer
//! as members become schedulable. A layer that makes no progress means the
//! members are mutually dependent, which is an error.
//!
//! Member references only count as dependencies when they occur outside any
//! lambda: code under a lambda runs after the dictionary exists and may
//! reference anything, including the member being defined.

use crate::cases::desugar_cases;
use crate::classes::{class_applied_to, superclass_slot_name};
use crate::errors::{in_instance, DesugarError, DesugarResult};
use crate::member_map::MemberMap;
use crate::supply::NameSupply;
use lyra_ast::types::{
    move_quantifiers_to_front, quantify, replace_all_type_vars, type_constructors,
};
use lyra_ast::{
    prim, ClassNameKind, Declaration, DeclarationRef, DoNotationElement, GuardedExpr, Ident,
    Literal, ModuleName, NameKind, ProperName, Qualified, Type, TypeInstanceBody,
    TypeInstanceDeclaration, Value, ValueDeclaration,
};
use lyra_intern::Symbol;
use lyra_span::Span;
use rustc_hash::FxHashSet;
use tracing::trace;

/// Desugar one instance declaration.
///
/// Returns the export reference to add for this instance (if its class and
/// head types are locally visible) and the replacement declarations.
pub fn desugar_instance(
    member_map: &MemberMap,
    supply: &mut NameSupply,
    module_name: &ModuleName,
    exports: &[DeclarationRef],
    instance: TypeInstanceDeclaration,
) -> DesugarResult<(Option<DeclarationRef>, Vec<Declaration>)> {
    let export = instance_export_ref(exports, module_name, &instance);
    let original = Declaration::TypeInstance(instance.clone());

    let dict_ty = move_quantifiers_to_front(quantify(Type::constrained(
        instance.constraints.clone(),
        class_applied_to(&instance.class, instance.args.iter().cloned()),
    )));

    match instance.body {
        TypeInstanceBody::Derived => Err(DesugarError::Internal(format!(
            "derived instance {} reached type class desugaring",
            instance.ident
        ))),
        TypeInstanceBody::NewtypeWithDictionary(dict) => {
            // The supplied expression is trusted; it is only coerced to the
            // instance type.
            let value = dictionary_value_declaration(instance.span, instance.ident, dict, dict_ty);
            Ok((export, vec![original, value]))
        }
        TypeInstanceBody::Explicit(members) => {
            let dict = instance_dictionary(
                member_map,
                supply,
                &instance.class,
                &instance.args,
                members,
            )
            .map_err(in_instance(instance.class.clone(), instance.args.clone()))?;
            let value = dictionary_value_declaration(instance.span, instance.ident, dict, dict_ty);
            Ok((export, vec![original, value]))
        }
    }
}

fn dictionary_value_declaration(
    span: Span,
    ident: Ident,
    dict: Value,
    dict_ty: Type,
) -> Declaration {
    Declaration::Value(ValueDeclaration {
        span,
        ident,
        name_kind: NameKind::Private,
        binders: Vec::new(),
        expression: vec![GuardedExpr::unguarded(Value::TypedValue(
            true,
            Box::new(dict),
            dict_ty,
        ))],
    })
}

/// Build the dictionary expression for an explicit instance.
fn instance_dictionary(
    member_map: &MemberMap,
    supply: &mut NameSupply,
    class: &Qualified<ProperName<ClassNameKind>>,
    tys: &[Type],
    members: Vec<Declaration>,
) -> DesugarResult<Value> {
    let members = desugar_cases(supply, members)?;

    let class_module = class.module.clone().ok_or_else(|| {
        DesugarError::Internal(format!("unqualified class name {} in instance head", class))
    })?;
    let data = member_map
        .get(&(class_module.clone(), class.value))
        .ok_or_else(|| DesugarError::UnknownName(class.clone()))?;

    let defined: Vec<Ident> = members
        .iter()
        .filter_map(|member| match member.unwrap_positioned() {
            Declaration::Value(v) => Some(v.ident),
            Declaration::TypeSignature(sig) => Some(sig.ident),
            _ => None,
        })
        .collect();

    let class_members: Vec<Ident> = data.member_idents().collect();
    if let Some(missing) = class_members.iter().find(|m| !defined.contains(m)) {
        return Err(DesugarError::MissingClassMember(*missing));
    }
    if let Some(extraneous) = defined.iter().find(|d| !class_members.contains(d)) {
        return Err(DesugarError::ExtraneousClassMember(*extraneous));
    }

    // Specialize the member signatures to this instance's head types.
    let substitution: Vec<(Symbol, Type)> = data
        .args
        .iter()
        .map(|(param, _)| *param)
        .zip(tys.iter().cloned())
        .collect();
    let member_types: Vec<(Ident, Type)> = data
        .members
        .iter()
        .map(|(ident, ty)| (*ident, replace_all_type_vars(&substitution, ty)))
        .collect();

    let entries = member_values(&member_types, members)?;

    let superclass_fields: Vec<(Symbol, Value)> = data
        .superclasses
        .iter()
        .enumerate()
        .map(|(index, superclass)| {
            let args = superclass
                .args
                .iter()
                .map(|ty| replace_all_type_vars(&substitution, ty))
                .collect();
            // A thunk, not a value: forcing the superclass dictionary is
            // deferred so mutually dependent instances terminate.
            (
                superclass_slot_name(&superclass.class, index),
                Value::Abs(
                    Ident::new(prim::UNUSED_PARAMETER),
                    Box::new(Value::DeferredDictionary(superclass.class.clone(), args)),
                ),
            )
        })
        .collect();

    let member_names: FxHashSet<Ident> = entries.iter().map(|(ident, _)| *ident).collect();
    let scheduled: Vec<MemberEntry> = entries
        .into_iter()
        .map(|(ident, value)| {
            let dependencies = immediate_member_references(&value, &class_module, &member_names);
            MemberEntry {
                ident,
                dependencies,
                value,
            }
        })
        .collect();

    build_dictionary(class, superclass_fields, scheduled)
}

/// Extract each member's implementation expression.
fn member_values(
    member_types: &[(Ident, Type)],
    members: Vec<Declaration>,
) -> DesugarResult<Vec<(Ident, Value)>> {
    let mut entries = Vec::with_capacity(members.len());
    for member in members {
        match unwrap_positioned(member) {
            Declaration::Value(v) => {
                if !member_types.iter().any(|(ident, _)| *ident == v.ident) {
                    return Err(DesugarError::Internal(format!(
                        "no specialized type for instance member {}",
                        v.ident
                    )));
                }
                let ident = v.ident;
                let simple = v.binders.is_empty()
                    && v.expression.len() == 1
                    && v.expression[0].is_unguarded();
                if !simple {
                    return Err(DesugarError::Internal(format!(
                        "instance member {ident} was not reduced to a simple binding"
                    )));
                }
                let value = v
                    .expression
                    .into_iter()
                    .next()
                    .expect("one right-hand side")
                    .value;
                entries.push((ident, value));
            }
            // Instance signatures carry no implementation.
            Declaration::TypeSignature(_) => {}
            other => {
                return Err(DesugarError::Internal(format!(
                    "unexpected declaration in instance body: {other:?}"
                )))
            }
        }
    }
    Ok(entries)
}

fn unwrap_positioned(decl: Declaration) -> Declaration {
    match decl {
        Declaration::Positioned(_, inner) => unwrap_positioned(*inner),
        other => other,
    }
}

struct MemberEntry {
    ident: Ident,
    dependencies: Vec<Ident>,
    value: Value,
}

/// Assemble the dictionary record in dependency layers.
fn build_dictionary(
    class: &Qualified<ProperName<ClassNameKind>>,
    superclass_fields: Vec<(Symbol, Value)>,
    members: Vec<MemberEntry>,
) -> DesugarResult<Value> {
    let mut provided: FxHashSet<Ident> = FxHashSet::default();
    let (ready, mut waiting) = split_ready(members, &provided);
    if ready.is_empty() && !waiting.is_empty() {
        return Err(overlapping(&waiting));
    }

    let mut fields: Vec<(Symbol, Value)> = Vec::new();
    for entry in ready {
        provided.insert(entry.ident);
        fields.push((entry.ident.symbol(), entry.value));
    }
    fields.extend(superclass_fields);
    for entry in &waiting {
        // Forward declaration: overwritten by a later update layer.
        fields.push((entry.ident.symbol(), Value::Var(prim::undefined_ident())));
    }

    let mut dict = Value::TypeClassDictionaryConstructorApp(
        class.clone(),
        Box::new(Value::Literal(Literal::Object(fields))),
    );

    while !waiting.is_empty() {
        let (ready, rest) = split_ready(waiting, &provided);
        if ready.is_empty() {
            return Err(overlapping(&rest));
        }
        trace!(class = %class, layer = ready.len(), "scheduling instance members");
        let mut layer = Vec::with_capacity(ready.len());
        for entry in ready {
            provided.insert(entry.ident);
            layer.push((entry.ident.symbol(), entry.value));
        }
        dict = Value::ObjectUpdate(Box::new(dict), layer);
        waiting = rest;
    }
    Ok(dict)
}

fn split_ready(
    members: Vec<MemberEntry>,
    provided: &FxHashSet<Ident>,
) -> (Vec<MemberEntry>, Vec<MemberEntry>) {
    members
        .into_iter()
        .partition(|entry| entry.dependencies.iter().all(|d| provided.contains(d)))
}

fn overlapping(stuck: &[MemberEntry]) -> DesugarError {
    DesugarError::OverlappingNamesInLet {
        names: stuck.iter().map(|entry| entry.ident).collect(),
    }
}

/// Collect the members this value references at the immediate dictionary
/// scope: anywhere except under a lambda introduced during the walk.
fn immediate_member_references(
    value: &Value,
    class_module: &ModuleName,
    members: &FxHashSet<Ident>,
) -> Vec<Ident> {
    let mut out = Vec::new();
    walk_value(value, true, class_module, members, &mut out);
    out
}

fn walk_value(
    value: &Value,
    in_scope: bool,
    class_module: &ModuleName,
    members: &FxHashSet<Ident>,
    out: &mut Vec<Ident>,
) {
    match value {
        Value::Var(name) => {
            if in_scope
                && name.module.as_ref() == Some(class_module)
                && members.contains(&name.value)
                && !out.contains(&name.value)
            {
                out.push(name.value);
            }
        }
        Value::Abs(_, body) => walk_value(body, false, class_module, members, out),
        Value::Literal(Literal::Array(elements)) => {
            for v in elements {
                walk_value(v, in_scope, class_module, members, out);
            }
        }
        Value::Literal(Literal::Object(fields)) => {
            for (_, v) in fields {
                walk_value(v, in_scope, class_module, members, out);
            }
        }
        Value::Literal(_) | Value::Constructor(_) => {}
        Value::UnaryMinus(v)
        | Value::Parens(v)
        | Value::Accessor(_, v)
        | Value::TypedValue(_, v, _)
        | Value::TypeClassDictionaryConstructorApp(_, v)
        | Value::Positioned(_, v) => walk_value(v, in_scope, class_module, members, out),
        Value::BinaryNoParens(op, lhs, rhs) => {
            walk_value(op, in_scope, class_module, members, out);
            walk_value(lhs, in_scope, class_module, members, out);
            walk_value(rhs, in_scope, class_module, members, out);
        }
        Value::ObjectUpdate(obj, fields) => {
            walk_value(obj, in_scope, class_module, members, out);
            for (_, v) in fields {
                walk_value(v, in_scope, class_module, members, out);
            }
        }
        Value::App(f, a) => {
            walk_value(f, in_scope, class_module, members, out);
            walk_value(a, in_scope, class_module, members, out);
        }
        Value::IfThenElse(c, t, e) => {
            walk_value(c, in_scope, class_module, members, out);
            walk_value(t, in_scope, class_module, members, out);
            walk_value(e, in_scope, class_module, members, out);
        }
        Value::Case(scrutinees, alternatives) => {
            for v in scrutinees {
                walk_value(v, in_scope, class_module, members, out);
            }
            for alternative in alternatives {
                if let Some(guard) = &alternative.guard {
                    walk_value(guard, in_scope, class_module, members, out);
                }
                walk_value(&alternative.result, in_scope, class_module, members, out);
            }
        }
        Value::Let(decls, body) => {
            for decl in decls {
                walk_declaration(decl, in_scope, class_module, members, out);
            }
            walk_value(body, in_scope, class_module, members, out);
        }
        Value::Do(elements) => {
            for element in elements {
                walk_do_element(element, in_scope, class_module, members, out);
            }
        }
        Value::TypeClassDictionary(_)
        | Value::SuperClassDictionary(..)
        | Value::TypeClassDictionaryAccessor(..)
        | Value::DeferredDictionary(..) => {}
    }
}

fn walk_declaration(
    decl: &Declaration,
    in_scope: bool,
    class_module: &ModuleName,
    members: &FxHashSet<Ident>,
    out: &mut Vec<Ident>,
) {
    match decl {
        Declaration::Value(v) => {
            for guarded in &v.expression {
                if let Some(guard) = &guarded.guard {
                    walk_value(guard, in_scope, class_module, members, out);
                }
                walk_value(&guarded.value, in_scope, class_module, members, out);
            }
        }
        Declaration::BindingGroup(bindings) => {
            for (_, _, v) in bindings {
                walk_value(v, in_scope, class_module, members, out);
            }
        }
        Declaration::Positioned(_, inner) => {
            walk_declaration(inner, in_scope, class_module, members, out);
        }
        _ => {}
    }
}

fn walk_do_element(
    element: &DoNotationElement,
    in_scope: bool,
    class_module: &ModuleName,
    members: &FxHashSet<Ident>,
    out: &mut Vec<Ident>,
) {
    match element {
        DoNotationElement::Value(v) | DoNotationElement::Bind(_, v) => {
            walk_value(v, in_scope, class_module, members, out);
        }
        DoNotationElement::Let(decls) => {
            for decl in decls {
                walk_declaration(decl, in_scope, class_module, members, out);
            }
        }
        DoNotationElement::Positioned(_, inner) => {
            walk_do_element(inner, in_scope, class_module, members, out);
        }
    }
}

/// The export reference to add for an instance, if any.
///
/// An instance is exported exactly when its class and every type constructor
/// in its head are locally visible: owned by another module, or listed in
/// this module's exports.
fn instance_export_ref(
    exports: &[DeclarationRef],
    module_name: &ModuleName,
    instance: &TypeInstanceDeclaration,
) -> Option<DeclarationRef> {
    let class_visible = match &instance.class.module {
        Some(owner) if owner != module_name => true,
        _ => exports.iter().any(|r| {
            matches!(r, DeclarationRef::TypeClass(name, _) if *name == instance.class.value)
        }),
    };
    let types_visible = instance
        .args
        .iter()
        .flat_map(type_constructors)
        .all(|constructor| match &constructor.module {
            Some(owner) if owner != module_name => true,
            _ => exports.iter().any(|r| {
                matches!(r, DeclarationRef::Type(name, _, _) if *name == constructor.value)
            }),
        });
    (class_visible && types_visible)
        .then(|| DeclarationRef::TypeInstance(instance.ident, Span::GENERATED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_ast::ProperName;

    fn module() -> ModuleName {
        ModuleName::from_dotted("Main")
    }

    fn member_var(name: &str) -> Value {
        Value::Var(Qualified::global(module(), Ident::new(name)))
    }

    fn member_set(names: &[&str]) -> FxHashSet<Ident> {
        names.iter().map(|n| Ident::new(n)).collect()
    }

    #[test]
    fn test_references_under_lambda_do_not_count() {
        let members = member_set(&["a", "b"]);
        let value = Value::Abs(Ident::new("x"), Box::new(member_var("a")));
        assert!(immediate_member_references(&value, &module(), &members).is_empty());
    }

    #[test]
    fn test_immediate_references_count_once() {
        let members = member_set(&["a", "b"]);
        let value = Value::App(
            Box::new(member_var("a")),
            Box::new(Value::App(Box::new(member_var("b")), Box::new(member_var("a")))),
        );
        let refs = immediate_member_references(&value, &module(), &members);
        assert_eq!(refs, vec![Ident::new("a"), Ident::new("b")]);
    }

    #[test]
    fn test_foreign_and_non_member_references_do_not_count() {
        let members = member_set(&["a"]);
        let elsewhere = Value::Var(Qualified::global(
            ModuleName::from_dotted("Data.Eq"),
            Ident::new("a"),
        ));
        let unqualified = Value::local_var("a");
        let non_member = member_var("c");
        for value in [elsewhere, unqualified, non_member] {
            assert!(immediate_member_references(&value, &module(), &members).is_empty());
        }
    }

    fn entry(name: &str, deps: &[&str]) -> MemberEntry {
        MemberEntry {
            ident: Ident::new(name),
            dependencies: deps.iter().map(|d| Ident::new(d)).collect(),
            value: Value::local_var(name),
        }
    }

    fn class_name() -> Qualified<ProperName<ClassNameKind>> {
        Qualified::global(module(), ProperName::new("Foo"))
    }

    #[test]
    fn test_dictionary_layers_follow_dependencies() {
        let members = vec![entry("c", &["b", "a"]), entry("a", &[]), entry("b", &["a"])];
        let dict = build_dictionary(&class_name(), Vec::new(), members).unwrap();

        // { a, b: undefined, c: undefined } then { b } then { c }.
        match dict {
            Value::ObjectUpdate(inner, layer) => {
                assert_eq!(layer[0].0.as_str(), "c");
                match *inner {
                    Value::ObjectUpdate(base, layer) => {
                        assert_eq!(layer[0].0.as_str(), "b");
                        match *base {
                            Value::TypeClassDictionaryConstructorApp(_, record) => {
                                match *record {
                                    Value::Literal(Literal::Object(fields)) => {
                                        let labels: Vec<_> =
                                            fields.iter().map(|(l, _)| l.as_str()).collect();
                                        assert_eq!(labels, vec!["a", "c", "b"]);
                                        assert!(matches!(
                                            &fields[1].1,
                                            Value::Var(q) if q.value.as_str() == "undefined"
                                        ));
                                    }
                                    other => panic!("expected a record literal, got {other:?}"),
                                }
                            }
                            other => panic!("expected a dictionary constructor, got {other:?}"),
                        }
                    }
                    other => panic!("expected an inner update layer, got {other:?}"),
                }
            }
            other => panic!("expected an update layer, got {other:?}"),
        }
    }

    #[test]
    fn test_mutual_dependencies_are_rejected() {
        let members = vec![entry("a", &["b"]), entry("b", &["a"])];
        let err = build_dictionary(&class_name(), Vec::new(), members).unwrap_err();
        match err {
            DesugarError::OverlappingNamesInLet { names } => {
                assert_eq!(names, vec![Ident::new("a"), Ident::new("b")]);
            }
            other => panic!("expected an overlap error, got {other:?}"),
        }
    }

    #[test]
    fn test_memberless_dictionary_is_just_superclasses() {
        let fields = vec![(
            Symbol::intern("Foo0"),
            Value::Abs(
                Ident::new(prim::UNUSED_PARAMETER),
                Box::new(Value::DeferredDictionary(class_name(), vec![])),
            ),
        )];
        let dict = build_dictionary(&class_name(), fields, Vec::new()).unwrap();
        assert!(matches!(dict, Value::TypeClassDictionaryConstructorApp(..)));
    }
}
