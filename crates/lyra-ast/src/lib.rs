//! Abstract syntax tree definitions and generic traversals for the Lyra
//! compiler.
//!
//! This crate defines the tree produced by parsing and name resolution —
//! names, types, declarations, expressions, binders — together with the
//! reusable traversal machinery the desugaring passes are written against.

#![warn(missing_docs)]

pub mod ast;
pub mod names;
pub mod prim;
pub mod traversals;
pub mod types;

pub use ast::{
    Associativity, Binder, CaseAlternative, Comment, DataConstructor, DataDeclKind,
    DataDeclaration, Declaration, DeclarationRef, DoNotationElement, Fixity, FixityDeclaration,
    ForeignDataDeclaration, ForeignInstanceDeclaration, ForeignValueDeclaration, GuardedExpr,
    ImportDeclaration, ImportKind, Literal, Module, NameKind, Numeric, TypeClassDeclaration,
    TypeInstanceBody, TypeInstanceDeclaration, TypeSignatureDeclaration, TypeSynonymDeclaration,
    Value, ValueDeclaration,
};
pub use names::{
    ClassNameKind, ConstructorNameKind, Ident, ModuleName, ProperName, Qualified, TypeNameKind,
};
pub use types::{Constraint, ConstraintData, FunctionalDependency, Kind, Type};
