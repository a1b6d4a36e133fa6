//! Fresh-name generation.

use lyra_ast::Ident;

/// A source of identifiers that cannot collide with source names.
///
/// Generated names begin with `$`, which the lexer rejects in source code,
/// so freshness only requires a counter. One supply is threaded through a
/// whole desugaring run to keep its output deterministic.
#[derive(Debug, Default)]
pub struct NameSupply {
    next: u32,
}

impl NameSupply {
    /// A supply starting from zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce a fresh identifier with the given prefix.
    pub fn fresh(&mut self, prefix: &str) -> Ident {
        let n = self.next;
        self.next += 1;
        Ident::new(&format!("${prefix}{n}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_names_are_distinct() {
        let mut supply = NameSupply::new();
        let a = supply.fresh("case");
        let b = supply.fresh("case");
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "$case0");
        assert_eq!(b.as_str(), "$case1");
    }
}
