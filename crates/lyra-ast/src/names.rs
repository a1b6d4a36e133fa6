//! Names and qualification.
//!
//! The name resolver qualifies every name with its defining module before the
//! desugaring passes run, so most of the compiler works with [`Qualified`]
//! names. Proper names (classes, types, data constructors) carry a phantom
//! kind tag: a class name and a type name are different Rust types even
//! though both are interned strings, which keeps the categories from being
//! mixed up by accident. The tag can be deliberately reinterpreted with
//! [`ProperName::coerce`], e.g. when a class name becomes the name of its
//! dictionary type.

use lyra_intern::Symbol;
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// An identifier naming an ordinary value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ident(pub Symbol);

impl Ident {
    /// Intern an identifier.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Symbol::intern(name))
    }

    /// Get the identifier text.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.0.as_str()
    }

    /// Get the interned symbol.
    #[must_use]
    pub fn symbol(self) -> Symbol {
        self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dotted module name like `Data.Eq`, as a non-empty list of segments.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(Vec<Symbol>);

impl ModuleName {
    /// Build a module name from its segments. Must be non-empty.
    #[must_use]
    pub fn new(segments: Vec<Symbol>) -> Self {
        debug_assert!(!segments.is_empty(), "module names have at least one segment");
        Self(segments)
    }

    /// Parse a dotted name such as `"Data.Eq"`.
    #[must_use]
    pub fn from_dotted(name: &str) -> Self {
        Self::new(name.split('.').map(Symbol::intern).collect())
    }

    /// The name segments.
    #[must_use]
    pub fn segments(&self) -> &[Symbol] {
        &self.0
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment.as_str())?;
        }
        Ok(())
    }
}

/// Kind tag for class names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClassNameKind;

/// Kind tag for type (constructor/synonym) names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeNameKind;

/// Kind tag for data constructor names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConstructorNameKind;

/// An upper-case name, tagged at the type level with what it names.
pub struct ProperName<K> {
    symbol: Symbol,
    _kind: PhantomData<K>,
}

impl<K> ProperName<K> {
    /// Intern a proper name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self::from_symbol(Symbol::intern(name))
    }

    /// Wrap an already-interned symbol.
    #[must_use]
    pub fn from_symbol(symbol: Symbol) -> Self {
        Self {
            symbol,
            _kind: PhantomData,
        }
    }

    /// Get the name text.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.symbol.as_str()
    }

    /// Get the interned symbol.
    #[must_use]
    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    /// Reinterpret the name under a different kind tag.
    ///
    /// The desugarer uses this where one declaration legitimately gives rise
    /// to another of a different category, e.g. a class name naming its
    /// dictionary type synonym.
    #[must_use]
    pub fn coerce<K2>(&self) -> ProperName<K2> {
        ProperName::from_symbol(self.symbol)
    }
}

// The phantom tag must not impose trait bounds, so these are by hand.

impl<K> Clone for ProperName<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for ProperName<K> {}

impl<K> PartialEq for ProperName<K> {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl<K> Eq for ProperName<K> {}

impl<K> PartialOrd for ProperName<K> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for ProperName<K> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.symbol.cmp(&other.symbol)
    }
}

impl<K> Hash for ProperName<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}

impl<K> fmt::Debug for ProperName<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProperName({:?})", self.as_str())
    }
}

impl<K> fmt::Display for ProperName<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<K> Serialize for ProperName<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de, K> Deserialize<'de> for ProperName<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ProperNameVisitor<K>(PhantomData<K>);

        impl<K> Visitor<'_> for ProperNameVisitor<K> {
            type Value = ProperName<K>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a proper name")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<ProperName<K>, E> {
                Ok(ProperName::new(v))
            }
        }

        deserializer.deserialize_str(ProperNameVisitor(PhantomData))
    }
}

/// A name optionally qualified by its defining module.
///
/// After name resolution every reference in a fresh module is fully
/// qualified; an unqualified class or type reference reaching the desugarer
/// is a compiler bug.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Qualified<T> {
    /// The defining module, if known.
    pub module: Option<ModuleName>,
    /// The name itself.
    pub value: T,
}

impl<T> Qualified<T> {
    /// A name qualified by its defining module.
    #[must_use]
    pub fn global(module: ModuleName, value: T) -> Self {
        Self {
            module: Some(module),
            value,
        }
    }

    /// An unqualified (locally scoped) name.
    #[must_use]
    pub fn local(value: T) -> Self {
        Self {
            module: None,
            value,
        }
    }

    /// Whether the name is owned by the given module.
    #[must_use]
    pub fn is_owned_by(&self, module: &ModuleName) -> bool {
        self.module.as_ref() == Some(module)
    }
}

impl<T: fmt::Display> fmt::Display for Qualified<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(module) = &self.module {
            write!(f, "{module}.")?;
        }
        self.value.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_name_display() {
        let m = ModuleName::from_dotted("Data.Eq");
        assert_eq!(m.to_string(), "Data.Eq");
        assert_eq!(m.segments().len(), 2);
    }

    #[test]
    fn test_proper_name_coerce_preserves_text() {
        let class: ProperName<ClassNameKind> = ProperName::new("Monoid");
        let ty: ProperName<TypeNameKind> = class.coerce();
        assert_eq!(class.as_str(), ty.as_str());
        assert_eq!(class.symbol(), ty.symbol());
    }

    #[test]
    fn test_qualified_display() {
        let q = Qualified::global(ModuleName::from_dotted("Data.Eq"), Ident::new("eq"));
        assert_eq!(q.to_string(), "Data.Eq.eq");
        let u = Qualified::local(Ident::new("eq"));
        assert_eq!(u.to_string(), "eq");
    }

    #[test]
    fn test_qualified_ownership() {
        let here = ModuleName::from_dotted("Main");
        let there = ModuleName::from_dotted("Data.Eq");
        let q = Qualified::global(there.clone(), Ident::new("eq"));
        assert!(q.is_owned_by(&there));
        assert!(!q.is_owned_by(&here));
        assert!(!Qualified::local(Ident::new("eq")).is_owned_by(&here));
    }
}
