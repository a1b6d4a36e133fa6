//! Declarations, expressions, binders, and the module model.
//!
//! This is the tree produced by parsing and name resolution and consumed by
//! the desugaring passes. Values are immutable after construction; passes
//! rebuild the parts they change.

use crate::names::{
    ClassNameKind, ConstructorNameKind, Ident, ModuleName, ProperName, Qualified, TypeNameKind,
};
use crate::types::{Constraint, FunctionalDependency, Kind, Type};
use lyra_intern::Symbol;
use lyra_span::{FileId, Span, Spanned};

/// A source comment attached to a module.
#[derive(Clone, Debug, PartialEq)]
pub enum Comment {
    /// A line comment.
    Line(String),
    /// A block comment.
    Block(String),
}

/// How a bound name may be referenced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameKind {
    /// Bound in source and visible per the export list.
    Public,
    /// Generated by the compiler; not exportable as a plain value.
    Private,
    /// Bound by a foreign import.
    External,
}

/// A numeric literal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Numeric {
    /// An integer literal.
    Int(i64),
    /// A floating-point literal.
    Float(f64),
}

/// A literal, generic in the representation of nested values.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal<T> {
    /// A numeric literal.
    Numeric(Numeric),
    /// A string literal.
    String(Symbol),
    /// A boolean literal.
    Boolean(bool),
    /// An array literal.
    Array(Vec<T>),
    /// An object literal with labelled fields.
    Object(Vec<(Symbol, T)>),
}

/// An expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A literal.
    Literal(Literal<Value>),
    /// Numeric negation.
    UnaryMinus(Box<Value>),
    /// An operator section pending re-association: `(op, lhs, rhs)`.
    BinaryNoParens(Box<Value>, Box<Value>, Box<Value>),
    /// An explicitly parenthesized expression.
    Parens(Box<Value>),
    /// A record field access.
    Accessor(Symbol, Box<Value>),
    /// A record update `e { l = v, … }`.
    ObjectUpdate(Box<Value>, Vec<(Symbol, Value)>),
    /// A single-parameter lambda.
    Abs(Ident, Box<Value>),
    /// Function application.
    App(Box<Value>, Box<Value>),
    /// A variable reference.
    Var(Qualified<Ident>),
    /// A data constructor reference.
    Constructor(Qualified<ProperName<ConstructorNameKind>>),
    /// A conditional.
    IfThenElse(Box<Value>, Box<Value>, Box<Value>),
    /// A case expression over one or more scrutinees.
    Case(Vec<Value>, Vec<CaseAlternative>),
    /// A value with a type annotation. The flag records whether the checker
    /// still needs to verify the value against the type.
    TypedValue(bool, Box<Value>, Type),
    /// Local definitions in scope over a body.
    Let(Vec<Declaration>, Box<Value>),
    /// A do block.
    Do(Vec<DoNotationElement>),
    /// A placeholder for a dictionary the constraint solver must supply.
    TypeClassDictionary(Constraint),
    /// A placeholder for a superclass dictionary projection.
    SuperClassDictionary(Qualified<ProperName<ClassNameKind>>, Vec<Type>),
    /// Projection of one member out of a class dictionary.
    TypeClassDictionaryAccessor(Qualified<ProperName<ClassNameKind>>, Ident),
    /// Construction of a class dictionary from a record of members.
    TypeClassDictionaryConstructorApp(Qualified<ProperName<ClassNameKind>>, Box<Value>),
    /// A dictionary resolved later by name, breaking instance cycles.
    DeferredDictionary(Qualified<ProperName<ClassNameKind>>, Vec<Type>),
    /// A value wrapped with its source position.
    Positioned(Span, Box<Value>),
}

impl Value {
    /// An unqualified variable reference.
    #[must_use]
    pub fn local_var(name: &str) -> Self {
        Self::Var(Qualified::local(Ident::new(name)))
    }

    /// Left-associated application of a head to arguments.
    #[must_use]
    pub fn apply_all(head: Value, args: impl IntoIterator<Item = Value>) -> Self {
        args.into_iter()
            .fold(head, |f, a| Self::App(Box::new(f), Box::new(a)))
    }

    /// Nested single-parameter lambdas over the given parameters.
    #[must_use]
    pub fn lambdas(params: impl IntoIterator<Item = Ident>, body: Value) -> Self {
        let params: Vec<_> = params.into_iter().collect();
        params
            .into_iter()
            .rev()
            .fold(body, |b, p| Self::Abs(p, Box::new(b)))
    }

    /// Strip position wrappers.
    #[must_use]
    pub fn unwrap_positioned(&self) -> &Value {
        match self {
            Self::Positioned(_, inner) => inner.unwrap_positioned(),
            other => other,
        }
    }
}

/// A pattern.
#[derive(Clone, Debug, PartialEq)]
pub enum Binder {
    /// The wildcard pattern.
    Null,
    /// A boolean literal pattern.
    Boolean(bool),
    /// A string literal pattern.
    String(Symbol),
    /// A numeric literal pattern.
    Number(Numeric),
    /// A variable binding.
    Var(Ident),
    /// A constructor pattern with argument patterns.
    Constructor(Qualified<ProperName<ConstructorNameKind>>, Vec<Binder>),
    /// An object pattern matching labelled fields.
    Object(Vec<(Symbol, Binder)>),
    /// An array pattern.
    Array(Vec<Binder>),
    /// A head/tail pattern.
    Cons(Box<Binder>, Box<Binder>),
    /// An as-pattern `name@sub`.
    Named(Ident, Box<Binder>),
    /// A binder wrapped with its source position.
    Positioned(Span, Box<Binder>),
}

impl Binder {
    /// Whether this binder (under position wrappers) is a plain variable.
    #[must_use]
    pub fn as_var(&self) -> Option<Ident> {
        match self {
            Self::Var(ident) => Some(*ident),
            Self::Positioned(_, inner) => inner.as_var(),
            _ => None,
        }
    }
}

/// One alternative of a case expression.
#[derive(Clone, Debug, PartialEq)]
pub struct CaseAlternative {
    /// One binder per scrutinee.
    pub binders: Vec<Binder>,
    /// An optional boolean guard.
    pub guard: Option<Value>,
    /// The result when the binders match and the guard passes.
    pub result: Value,
}

/// One element of a do block.
#[derive(Clone, Debug, PartialEq)]
pub enum DoNotationElement {
    /// A bare effectful expression.
    Value(Value),
    /// A monadic bind `binder <- expr`.
    Bind(Binder, Value),
    /// Local let declarations.
    Let(Vec<Declaration>),
    /// An element wrapped with its source position.
    Positioned(Span, Box<DoNotationElement>),
}

/// One right-hand side of a value declaration, with its optional guard.
#[derive(Clone, Debug, PartialEq)]
pub struct GuardedExpr {
    /// A boolean guard that must pass for this right-hand side to apply.
    pub guard: Option<Value>,
    /// The expression produced.
    pub value: Value,
}

impl GuardedExpr {
    /// A right-hand side with no guard.
    #[must_use]
    pub fn unguarded(value: Value) -> Self {
        Self { guard: None, value }
    }

    /// Whether there is no guard.
    #[must_use]
    pub fn is_unguarded(&self) -> bool {
        self.guard.is_none()
    }
}

/// Whether a data declaration introduces a data type or a newtype.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataDeclKind {
    /// An ordinary data type.
    Data,
    /// A newtype with a single single-field constructor.
    Newtype,
}

/// A data constructor declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct DataConstructor {
    /// The constructor name.
    pub name: ProperName<ConstructorNameKind>,
    /// The argument types.
    pub fields: Vec<Type>,
}

/// A data or newtype declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct DataDeclaration {
    /// The source position.
    pub span: Span,
    /// Data or newtype.
    pub kind: DataDeclKind,
    /// The type name.
    pub name: ProperName<TypeNameKind>,
    /// The type parameters with optional kind annotations.
    pub params: Vec<(Symbol, Option<Kind>)>,
    /// The constructors.
    pub constructors: Vec<DataConstructor>,
}

/// A type synonym declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeSynonymDeclaration {
    /// The source position.
    pub span: Span,
    /// The synonym name.
    pub name: ProperName<TypeNameKind>,
    /// The type parameters with optional kind annotations.
    pub params: Vec<(Symbol, Option<Kind>)>,
    /// The aliased type.
    pub body: Type,
}

/// A type signature for a value.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeSignatureDeclaration {
    /// The source position.
    pub span: Span,
    /// The value being typed.
    pub ident: Ident,
    /// The declared type.
    pub ty: Type,
}

/// A value declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueDeclaration {
    /// The source position.
    pub span: Span,
    /// The name being bound.
    pub ident: Ident,
    /// The visibility of the binding.
    pub name_kind: NameKind,
    /// Argument binders, eliminated by case desugaring.
    pub binders: Vec<Binder>,
    /// The right-hand sides. After case desugaring this is a single
    /// unguarded expression.
    pub expression: Vec<GuardedExpr>,
}

impl ValueDeclaration {
    /// The single unguarded right-hand side, if this declaration has been
    /// fully case-desugared.
    #[must_use]
    pub fn simple_expression(&self) -> Option<&Value> {
        match self.expression.as_slice() {
            [single] if self.binders.is_empty() && single.is_unguarded() => Some(&single.value),
            _ => None,
        }
    }
}

/// A foreign value import.
#[derive(Clone, Debug, PartialEq)]
pub struct ForeignValueDeclaration {
    /// The source position.
    pub span: Span,
    /// The imported name.
    pub ident: Ident,
    /// The declared type.
    pub ty: Type,
}

/// A foreign data import.
#[derive(Clone, Debug, PartialEq)]
pub struct ForeignDataDeclaration {
    /// The source position.
    pub span: Span,
    /// The imported type name.
    pub name: ProperName<TypeNameKind>,
    /// Its kind.
    pub kind: Kind,
}

/// A foreign instance import.
#[derive(Clone, Debug, PartialEq)]
pub struct ForeignInstanceDeclaration {
    /// The source position.
    pub span: Span,
    /// The instance name.
    pub ident: Ident,
    /// Constraints on the instance.
    pub constraints: Vec<Constraint>,
    /// The class implemented.
    pub class: Qualified<ProperName<ClassNameKind>>,
    /// The instance head type arguments.
    pub args: Vec<Type>,
}

/// Operator associativity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Associativity {
    /// Left associative.
    Left,
    /// Right associative.
    Right,
    /// Non-associative.
    NonAssociative,
}

/// An operator fixity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fixity {
    /// The associativity.
    pub associativity: Associativity,
    /// The precedence level.
    pub precedence: u8,
}

/// A fixity declaration aliasing an operator to a value.
#[derive(Clone, Debug, PartialEq)]
pub struct FixityDeclaration {
    /// The source position.
    pub span: Span,
    /// The fixity.
    pub fixity: Fixity,
    /// The value the operator stands for.
    pub target: Qualified<Ident>,
    /// The operator symbol.
    pub operator: Symbol,
}

/// What an import declaration brings into scope.
#[derive(Clone, Debug, PartialEq)]
pub enum ImportKind {
    /// Everything the module exports.
    Implicit,
    /// Only the listed items.
    Explicit(Vec<DeclarationRef>),
    /// Everything except the listed items.
    Hiding(Vec<DeclarationRef>),
}

/// An import declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportDeclaration {
    /// The source position.
    pub span: Span,
    /// The module imported.
    pub module: ModuleName,
    /// What is imported.
    pub kind: ImportKind,
    /// A qualification alias, if any.
    pub alias: Option<ModuleName>,
}

/// A type class declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeClassDeclaration {
    /// The source position.
    pub span: Span,
    /// The class name.
    pub name: ProperName<ClassNameKind>,
    /// The class parameters with optional kind annotations.
    pub params: Vec<(Symbol, Option<Kind>)>,
    /// Superclass constraints.
    pub constraints: Vec<Constraint>,
    /// Functional dependencies between the parameters.
    pub dependencies: Vec<FunctionalDependency>,
    /// Member signatures, as type signature declarations.
    pub members: Vec<Declaration>,
}

/// How a type instance provides its members.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeInstanceBody {
    /// A derived instance. These are expanded before this stage of the
    /// pipeline; one surviving to the desugarer is a compiler bug.
    Derived,
    /// Member declarations given in source.
    Explicit(Vec<Declaration>),
    /// A newtype-derived instance with an explicitly supplied dictionary
    /// expression.
    NewtypeWithDictionary(Value),
}

/// A type instance declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeInstanceDeclaration {
    /// The source position.
    pub span: Span,
    /// The generated name binding the instance dictionary.
    pub ident: Ident,
    /// Constraints the instance itself requires.
    pub constraints: Vec<Constraint>,
    /// The class implemented.
    pub class: Qualified<ProperName<ClassNameKind>>,
    /// The instance head type arguments.
    pub args: Vec<Type>,
    /// The member implementations.
    pub body: TypeInstanceBody,
}

/// A top-level declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum Declaration {
    /// A data or newtype declaration.
    Data(DataDeclaration),
    /// Mutually recursive data declarations.
    DataBindingGroup(Vec<Declaration>),
    /// A type synonym.
    TypeSynonym(TypeSynonymDeclaration),
    /// A type signature for a value.
    TypeSignature(TypeSignatureDeclaration),
    /// A value binding.
    Value(ValueDeclaration),
    /// Mutually recursive value bindings.
    BindingGroup(Vec<(Ident, NameKind, Value)>),
    /// A foreign value import.
    ForeignValue(ForeignValueDeclaration),
    /// A foreign data import.
    ForeignData(ForeignDataDeclaration),
    /// A foreign instance import.
    ForeignInstance(ForeignInstanceDeclaration),
    /// A fixity declaration.
    Fixity(FixityDeclaration),
    /// An import.
    Import(ImportDeclaration),
    /// A type class declaration.
    TypeClass(TypeClassDeclaration),
    /// A type instance declaration.
    TypeInstance(TypeInstanceDeclaration),
    /// A declaration wrapped with its source position.
    Positioned(Span, Box<Declaration>),
}

impl Declaration {
    /// The source position of this declaration.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Data(d) => d.span,
            Self::TypeSynonym(d) => d.span,
            Self::TypeSignature(d) => d.span,
            Self::Value(d) => d.span,
            Self::ForeignValue(d) => d.span,
            Self::ForeignData(d) => d.span,
            Self::ForeignInstance(d) => d.span,
            Self::Fixity(d) => d.span,
            Self::Import(d) => d.span,
            Self::TypeClass(d) => d.span,
            Self::TypeInstance(d) => d.span,
            Self::Positioned(span, _) => *span,
            Self::DataBindingGroup(_) | Self::BindingGroup(_) => Span::GENERATED,
        }
    }

    /// Strip position wrappers.
    #[must_use]
    pub fn unwrap_positioned(&self) -> &Declaration {
        match self {
            Self::Positioned(_, inner) => inner.unwrap_positioned(),
            other => other,
        }
    }

    /// Whether this declares a type class (under position wrappers).
    #[must_use]
    pub fn is_type_class(&self) -> bool {
        matches!(self.unwrap_positioned(), Self::TypeClass(_))
    }
}

/// A reference in an export or import list.
#[derive(Clone, Debug, PartialEq)]
pub enum DeclarationRef {
    /// A value.
    Value(Ident, Span),
    /// A type, optionally with some of its constructors.
    Type(
        ProperName<TypeNameKind>,
        Option<Vec<ProperName<ConstructorNameKind>>>,
        Span,
    ),
    /// A type class.
    TypeClass(ProperName<ClassNameKind>, Span),
    /// A type class instance.
    TypeInstance(Ident, Span),
    /// A whole-module re-export.
    Module(ModuleName, Span),
}

impl DeclarationRef {
    /// The source position of this reference.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Value(_, s)
            | Self::Type(_, _, s)
            | Self::TypeClass(_, s)
            | Self::TypeInstance(_, s)
            | Self::Module(_, s) => *s,
        }
    }
}

/// A module: name, declarations, and an export list.
///
/// By the time the desugaring passes run, export elaboration has replaced an
/// omitted export list with an explicit one; `exports` of `None` here is a
/// compiler bug.
#[derive(Clone, Debug, PartialEq)]
pub struct Module {
    /// The file the module was parsed from, or [`FileId::UNKNOWN`] for
    /// modules assembled in memory.
    pub file: FileId,
    /// The source position of the module header.
    pub span: Span,
    /// Comments attached to the module header, each with its own position.
    pub comments: Vec<Spanned<Comment>>,
    /// The module name.
    pub name: ModuleName,
    /// The declarations, in source order.
    pub declarations: Vec<Declaration>,
    /// The elaborated export list.
    pub exports: Option<Vec<DeclarationRef>>,
}
