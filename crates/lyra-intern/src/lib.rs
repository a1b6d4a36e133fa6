//! String interning for the Lyra compiler.
//!
//! Names occur everywhere in a compiler and are compared far more often than
//! they are created. [`Symbol`] is a `Copy` handle into a process-wide pool:
//! equality and hashing are integer operations, and the original string is
//! recovered with [`Symbol::as_str`].
//!
//! Interned strings live for the lifetime of the process. This is the usual
//! trade for a batch compiler: the set of distinct names is bounded by the
//! input.

#![warn(missing_docs)]

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

static POOL: Lazy<RwLock<Pool>> = Lazy::new(|| RwLock::new(Pool::default()));

#[derive(Default)]
struct Pool {
    indices: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

impl Pool {
    fn intern(&mut self, string: &str) -> u32 {
        if let Some(&idx) = self.indices.get(string) {
            return idx;
        }
        let leaked: &'static str = Box::leak(string.to_owned().into_boxed_str());
        let idx = u32::try_from(self.strings.len()).expect("symbol pool overflow");
        self.strings.push(leaked);
        self.indices.insert(leaked, idx);
        idx
    }
}

/// An interned string.
///
/// Two symbols are equal exactly when the strings they intern are equal.
/// `Ord` compares the underlying strings, so sorted symbol collections are
/// deterministic across runs regardless of interning order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// Intern a string, returning its symbol.
    #[must_use]
    pub fn intern(string: &str) -> Self {
        // Fast path: already interned.
        if let Some(&idx) = POOL.read().indices.get(string) {
            return Self(idx);
        }
        Self(POOL.write().intern(string))
    }

    /// Get the interned string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        POOL.read().strings[self.0 as usize]
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(string: &str) -> Self {
        Self::intern(string)
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SymbolVisitor;

        impl Visitor<'_> for SymbolVisitor {
            type Value = Symbol;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an interned string")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Symbol, E> {
                Ok(Symbol::intern(v))
            }
        }

        deserializer.deserialize_str(SymbolVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_dedups() {
        let a = Symbol::intern("foo");
        let b = Symbol::intern("foo");
        let c = Symbol::intern("bar");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "foo");
        assert_eq!(c.as_str(), "bar");
    }

    #[test]
    fn test_ordering_is_by_string() {
        // Interning order deliberately disagrees with string order.
        let z = Symbol::intern("zeta");
        let a = Symbol::intern("alpha");
        assert!(a < z);
    }

    #[test]
    fn test_display() {
        let s = Symbol::intern("showable");
        assert_eq!(s.to_string(), "showable");
        assert_eq!(format!("{s:?}"), "Symbol(\"showable\")");
    }
}
