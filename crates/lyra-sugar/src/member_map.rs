//! Class metadata for the type-class desugarer.
//!
//! The [`MemberMap`] is the pass's only piece of state: everything it needs
//! to know about a class in order to elaborate its instances. It is seeded
//! from the primitive classes and the externs of previously compiled
//! modules, then extended as class declarations of the current batch are
//! desugared.

use lyra_ast::{
    prim, ClassNameKind, Constraint, FunctionalDependency, Ident, Kind, ModuleName, ProperName,
    Type,
};
use lyra_externs::ExternsFile;
use lyra_intern::Symbol;
use rustc_hash::FxHashMap;

/// Everything the desugarer records about one class.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeClassData {
    /// The class parameters with optional kind annotations.
    pub args: Vec<(Symbol, Option<Kind>)>,
    /// Member signatures, in declaration order.
    pub members: Vec<(Ident, Type)>,
    /// Superclass constraints, in declaration order.
    pub superclasses: Vec<Constraint>,
    /// Functional dependencies between the parameters.
    pub dependencies: Vec<FunctionalDependency>,
}

impl TypeClassData {
    /// The identifiers of the class members.
    pub fn member_idents(&self) -> impl Iterator<Item = Ident> + '_ {
        self.members.iter().map(|(ident, _)| *ident)
    }
}

/// Class metadata keyed by defining module and class name.
pub type MemberMap = FxHashMap<(ModuleName, ProperName<ClassNameKind>), TypeClassData>;

/// The classes built into the compiler, seeded under the reserved `Prim`
/// module.
#[must_use]
pub fn primitive_classes() -> MemberMap {
    let mut map = MemberMap::default();
    map.insert(
        (prim::prim_module(), prim::partial_class()),
        TypeClassData {
            args: Vec::new(),
            members: Vec::new(),
            superclasses: Vec::new(),
            dependencies: Vec::new(),
        },
    );
    map
}

/// Build the initial member map from previously compiled modules.
///
/// Only class entries are consumed. Externs take precedence over the
/// primitive seed on key collisions; order among externs is irrelevant since
/// keys are unique per class.
#[must_use]
pub fn member_map_from_externs(externs: &[ExternsFile]) -> MemberMap {
    let mut map = primitive_classes();
    for file in externs {
        for class in file.classes() {
            map.insert(
                (file.module_name.clone(), *class.name),
                TypeClassData {
                    args: class.args.to_vec(),
                    members: class.members.to_vec(),
                    superclasses: class.superclasses.to_vec(),
                    dependencies: class.dependencies.to_vec(),
                },
            );
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_ast::Qualified;
    use lyra_externs::ExternsDeclaration;

    #[test]
    fn test_primitive_classes_are_seeded() {
        let map = primitive_classes();
        let key = (prim::prim_module(), prim::partial_class());
        let data = map.get(&key).expect("Prim.Partial is seeded");
        assert!(data.members.is_empty());
        assert!(data.superclasses.is_empty());
    }

    #[test]
    fn test_externs_override_primitives() {
        let eq = Ident::new("eq");
        let externs = vec![ExternsFile::new(
            prim::prim_module(),
            vec![ExternsDeclaration::Class {
                name: prim::partial_class(),
                args: vec![(Symbol::intern("a"), None)],
                members: vec![(eq, Type::Var(Symbol::intern("a")))],
                superclasses: vec![],
                dependencies: vec![],
            }],
        )];
        let map = member_map_from_externs(&externs);
        let data = &map[&(prim::prim_module(), prim::partial_class())];
        assert_eq!(data.members.len(), 1);
        assert_eq!(data.member_idents().next(), Some(eq));
    }

    #[test]
    fn test_non_class_externs_are_ignored() {
        let externs = vec![ExternsFile::new(
            ModuleName::from_dotted("Data.Ord"),
            vec![
                ExternsDeclaration::Value {
                    name: Ident::new("compare"),
                    ty: Type::Var(Symbol::intern("a")),
                },
                ExternsDeclaration::Instance {
                    name: Ident::new("ordInt"),
                    class: Qualified::global(
                        ModuleName::from_dotted("Data.Ord"),
                        ProperName::new("Ord"),
                    ),
                    args: vec![],
                },
            ],
        )];
        let map = member_map_from_externs(&externs);
        // Only the primitive seed remains.
        assert_eq!(map.len(), primitive_classes().len());
    }
}
