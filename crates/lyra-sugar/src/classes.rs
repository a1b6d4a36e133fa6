//! Lowering of type class declarations.
//!
//! A class becomes three things: the original declaration (kept for
//! downstream stages), a type synonym describing the dictionary record, and
//! one accessor function per member projecting that member out of a
//! dictionary.
//!
//! The dictionary row lists the members first, then one thunk-typed slot per
//! superclass. Superclass slots are named by [`superclass_slot_name`], which
//! later stages rely on to project superclass dictionaries.

use crate::errors::{DesugarError, DesugarResult};
use crate::member_map::{MemberMap, TypeClassData};
use lyra_ast::types::{move_quantifiers_to_front, quantify};
use lyra_ast::{
    ClassNameKind, Constraint, Declaration, GuardedExpr, Ident, ModuleName, NameKind, ProperName,
    Qualified, Type, TypeClassDeclaration, TypeSynonymDeclaration, Value, ValueDeclaration,
};
use lyra_intern::Symbol;

/// The dictionary field holding the superclass at the given position.
///
/// The name depends only on the superclass name and its index, so it is
/// stable across runs and across modules.
#[must_use]
pub fn superclass_slot_name(class: &Qualified<ProperName<ClassNameKind>>, index: usize) -> Symbol {
    Symbol::intern(&format!("{}{index}", class.value.as_str()))
}

/// Apply a class (used as a type constructor) to type arguments.
pub(crate) fn class_applied_to(
    class: &Qualified<ProperName<ClassNameKind>>,
    args: impl IntoIterator<Item = Type>,
) -> Type {
    let head = Type::Constructor(Qualified {
        module: class.module.clone(),
        value: class.value.coerce(),
    });
    Type::apply_all(head, args)
}

/// Desugar one class declaration.
///
/// Records the class's metadata in the member map and returns the
/// replacement declarations: the original class, the dictionary type
/// synonym, and the member accessors, in that order.
pub fn desugar_class(
    member_map: &mut MemberMap,
    module_name: &ModuleName,
    class: TypeClassDeclaration,
) -> DesugarResult<Vec<Declaration>> {
    let members = member_signatures(&class)?;

    member_map.insert(
        (module_name.clone(), class.name),
        TypeClassData {
            args: class.params.clone(),
            members: members.clone(),
            superclasses: class.constraints.clone(),
            dependencies: class.dependencies.clone(),
        },
    );

    let synonym = dictionary_synonym(&class, &members);
    let accessors: Vec<Declaration> = members
        .iter()
        .map(|(ident, ty)| member_accessor(module_name, &class, *ident, ty))
        .collect();

    let mut out = Vec::with_capacity(2 + accessors.len());
    out.push(Declaration::TypeClass(class));
    out.push(synonym);
    out.extend(accessors);
    Ok(out)
}

/// Project the class members to `(ident, type)` pairs.
fn member_signatures(class: &TypeClassDeclaration) -> DesugarResult<Vec<(Ident, Type)>> {
    class
        .members
        .iter()
        .map(|member| match member.unwrap_positioned() {
            Declaration::TypeSignature(sig) => Ok((sig.ident, sig.ty.clone())),
            other => Err(DesugarError::Internal(format!(
                "member of class {} is not a type signature: {other:?}",
                class.name
            ))),
        })
        .collect()
}

/// The record type synonym describing the class dictionary.
fn dictionary_synonym(
    class: &TypeClassDeclaration,
    members: &[(Ident, Type)],
) -> Declaration {
    let mut entries: Vec<(Symbol, Type)> = members
        .iter()
        .map(|(ident, ty)| (ident.symbol(), ty.clone()))
        .collect();
    for (index, superclass) in class.constraints.iter().enumerate() {
        // Superclass slots are thunks so that mutually dependent instances
        // terminate: forcing one is deferred until a member is used.
        let applied = class_applied_to(&superclass.class, superclass.args.iter().cloned());
        entries.push((
            superclass_slot_name(&superclass.class, index),
            Type::function(Type::unit(), applied),
        ));
    }
    Declaration::TypeSynonym(TypeSynonymDeclaration {
        span: class.span,
        name: class.name.coerce(),
        params: class.params.clone(),
        body: Type::Record(Box::new(Type::row(entries))),
    })
}

/// The accessor function projecting one member out of a dictionary.
fn member_accessor(
    module_name: &ModuleName,
    class: &TypeClassDeclaration,
    ident: Ident,
    ty: &Type,
) -> Declaration {
    let class_name = Qualified::global(module_name.clone(), class.name);
    let own_constraint = Constraint::new(
        class_name.clone(),
        class.params.iter().map(|(p, _)| Type::Var(*p)).collect(),
    );
    let accessor_ty = move_quantifiers_to_front(quantify(Type::Constrained(
        own_constraint,
        Box::new(ty.clone()),
    )));
    Declaration::Value(ValueDeclaration {
        span: class.span,
        ident,
        name_kind: NameKind::Private,
        binders: Vec::new(),
        // The accessor is marked as already checked so the type checker does
        // not wrap it in a fresh abstraction.
        expression: vec![GuardedExpr::unguarded(Value::TypedValue(
            false,
            Box::new(Value::TypeClassDictionaryAccessor(class_name, ident)),
            accessor_ty,
        ))],
    })
}
