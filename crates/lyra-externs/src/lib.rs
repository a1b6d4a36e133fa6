//! Compiled-module summaries (externs) for the Lyra compiler.
//!
//! An [`ExternsFile`] is the persisted public surface of a previously
//! compiled module: enough for later compiler stages to reference the
//! module's values, types, classes, and instances without its source. The
//! model is serde-serializable so a driver can persist it in whatever format
//! it likes; this crate deliberately does no file I/O.
//!
//! The type-class desugarer consumes only the class entries; everything else
//! is carried for other stages.

#![warn(missing_docs)]

use lyra_ast::{
    ClassNameKind, Constraint, FunctionalDependency, Ident, Kind, ModuleName, ProperName,
    Qualified, Type, TypeNameKind,
};
use lyra_intern::Symbol;
use serde::{Deserialize, Serialize};

/// Current externs format version.
pub const EXTERNS_VERSION: u32 = 1;

/// One entry in an externs file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ExternsDeclaration {
    /// An exported value and its type.
    Value {
        /// The value name.
        name: Ident,
        /// Its declared type.
        ty: Type,
    },
    /// An exported type and its kind.
    Type {
        /// The type name.
        name: ProperName<TypeNameKind>,
        /// Its kind.
        kind: Kind,
    },
    /// An exported type class.
    Class {
        /// The class name.
        name: ProperName<ClassNameKind>,
        /// The class parameters with optional kind annotations.
        args: Vec<(Symbol, Option<Kind>)>,
        /// Member signatures.
        members: Vec<(Ident, Type)>,
        /// Superclass constraints.
        superclasses: Vec<Constraint>,
        /// Functional dependencies between the parameters.
        dependencies: Vec<FunctionalDependency>,
    },
    /// An exported class instance.
    Instance {
        /// The generated instance name.
        name: Ident,
        /// The class implemented.
        class: Qualified<ProperName<ClassNameKind>>,
        /// The instance head type arguments.
        args: Vec<Type>,
    },
}

/// The persisted summary of one compiled module.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExternsFile {
    /// The externs format version this record was written with.
    pub version: u32,
    /// The module summarized.
    pub module_name: ModuleName,
    /// The exported declarations.
    pub declarations: Vec<ExternsDeclaration>,
}

impl ExternsFile {
    /// A new summary for the given module with the current format version.
    #[must_use]
    pub fn new(module_name: ModuleName, declarations: Vec<ExternsDeclaration>) -> Self {
        Self {
            version: EXTERNS_VERSION,
            module_name,
            declarations,
        }
    }

    /// Iterate the class entries of this summary.
    pub fn classes(&self) -> impl Iterator<Item = ExternsClass<'_>> {
        self.declarations.iter().filter_map(|decl| match decl {
            ExternsDeclaration::Class {
                name,
                args,
                members,
                superclasses,
                dependencies,
            } => Some(ExternsClass {
                name,
                args,
                members,
                superclasses,
                dependencies,
            }),
            _ => None,
        })
    }
}

/// A borrowed view of one class entry in an externs file.
#[derive(Clone, Copy, Debug)]
pub struct ExternsClass<'a> {
    /// The class name.
    pub name: &'a ProperName<ClassNameKind>,
    /// The class parameters with optional kind annotations.
    pub args: &'a [(Symbol, Option<Kind>)],
    /// Member signatures.
    pub members: &'a [(Ident, Type)],
    /// Superclass constraints.
    pub superclasses: &'a [Constraint],
    /// Functional dependencies between the parameters.
    pub dependencies: &'a [FunctionalDependency],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExternsFile {
        ExternsFile::new(
            ModuleName::from_dotted("Data.Eq"),
            vec![
                ExternsDeclaration::Value {
                    name: Ident::new("refl"),
                    ty: Type::Var(Symbol::intern("a")),
                },
                ExternsDeclaration::Class {
                    name: ProperName::new("Eq"),
                    args: vec![(Symbol::intern("a"), None)],
                    members: vec![(
                        Ident::new("eq"),
                        Type::function(
                            Type::Var(Symbol::intern("a")),
                            Type::Var(Symbol::intern("a")),
                        ),
                    )],
                    superclasses: vec![],
                    dependencies: vec![],
                },
            ],
        )
    }

    #[test]
    fn test_classes_filters_non_class_entries() {
        let externs = sample();
        let classes: Vec<_> = externs.classes().collect();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].name.as_str(), "Eq");
        assert_eq!(classes[0].members.len(), 1);
    }

    #[test]
    fn test_round_trips_through_json() {
        let externs = sample();
        let json = serde_json::to_string(&externs).unwrap();
        let back: ExternsFile = serde_json::from_str(&json).unwrap();
        assert_eq!(externs, back);
    }
}
