use serde::{Deserialize, Serialize};

/// A catalog entry for a swappable asset. Instances are immutable; selection
/// state references entries from the catalog, it never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    pub name: String,
    /// Base58 mint address of the asset.
    pub mint: String,
    /// Statically-known decimal precision, used when the token list lookup
    /// degrades.
    pub decimals: u8,
}

impl Token {
    pub fn new(symbol: &str, name: &str, mint: &str, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            mint: mint.to_string(),
            decimals,
        }
    }

    pub fn is_native(&self) -> bool {
        self.symbol == NATIVE_SYMBOL
    }
}

pub const NATIVE_SYMBOL: &str = "SOL";

pub const WAGUS_MINT: &str = "7BMxgTQhTthoBcQizzFoLyhmSDscM56uMramXGMhpump";
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// The default swap catalog. WAGUS uses 6 decimals, not the 9 most SPL
/// tokens assume.
pub fn default_catalog() -> Vec<Token> {
    vec![
        Token::new("WAGUS", "Wagus Token", WAGUS_MINT, 6),
        Token::new("SOL", "Solana", SOL_MINT, 9),
    ]
}

/// Picks the first catalog entry whose symbol differs from `symbol`. Used to
/// force the opposite side of the pair to a distinct token after a selection.
pub fn opposite_of<'a>(catalog: &'a [Token], symbol: &str) -> Option<&'a Token> {
    catalog.iter().find(|t| t.symbol != symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_has_distinct_mints() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 2);
        assert_ne!(catalog[0].mint, catalog[1].mint);
        assert_eq!(catalog[0].decimals, 6);
        assert_eq!(catalog[1].decimals, 9);
    }

    #[test]
    fn test_opposite_of_skips_same_symbol() {
        let catalog = default_catalog();
        let opposite = opposite_of(&catalog, "WAGUS").unwrap();
        assert_eq!(opposite.symbol, "SOL");
        let opposite = opposite_of(&catalog, "SOL").unwrap();
        assert_eq!(opposite.symbol, "WAGUS");
    }

    #[test]
    fn test_native_detection() {
        let catalog = default_catalog();
        assert!(!catalog[0].is_native());
        assert!(catalog[1].is_native());
    }
}
