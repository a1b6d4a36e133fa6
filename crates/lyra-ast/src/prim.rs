//! Names reserved by the compiler.
//!
//! `Prim` is the module every program implicitly imports; it is owned by the
//! compiler and cannot be shadowed. The desugarer also reserves a couple of
//! lower-case identifiers for generated code.

use crate::names::{ClassNameKind, Ident, ModuleName, ProperName, Qualified, TypeNameKind};

/// The reserved identifier naming the ignored parameter of generated thunks.
pub const UNUSED_PARAMETER: &str = "__unused";

/// The identifier generated forward declarations resolve through.
pub const UNDEFINED: &str = "undefined";

/// The reserved `Prim` module name.
#[must_use]
pub fn prim_module() -> ModuleName {
    ModuleName::from_dotted("Prim")
}

/// The `Prim.Function` type constructor underlying `a -> b`.
#[must_use]
pub fn function_type() -> Qualified<ProperName<TypeNameKind>> {
    Qualified::global(prim_module(), ProperName::new("Function"))
}

/// The `Prim.Partial` class, solved structurally by the compiler.
#[must_use]
pub fn partial_class() -> ProperName<ClassNameKind> {
    ProperName::new("Partial")
}

/// The `undefined` placeholder identifier as an expression-position name.
#[must_use]
pub fn undefined_ident() -> Qualified<Ident> {
    Qualified::local(Ident::new(UNDEFINED))
}
