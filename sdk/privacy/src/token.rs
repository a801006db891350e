//! Supported asset types
//!
//! Amounts always travel as `u64` base units. Decimals only matter for display.

use std::fmt;
use std::str::FromStr;

use crate::error::SdkError;

/// Closed set of tokens the shielded pool accounts for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// Native SOL, counted in lamports
    #[default]
    Lamports,
    Usdc,
    Usdt,
    MSol,
    Bonk,
    Samo,
}

impl TokenType {
    pub const ALL: [TokenType; 6] = [
        TokenType::Lamports,
        TokenType::Usdc,
        TokenType::Usdt,
        TokenType::MSol,
        TokenType::Bonk,
        TokenType::Samo,
    ];

    /// Identifier used by the SDK ("LAMPORTS", "USDC", ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Lamports => "LAMPORTS",
            TokenType::Usdc => "USDC",
            TokenType::Usdt => "USDT",
            TokenType::MSol => "mSOL",
            TokenType::Bonk => "BONK",
            TokenType::Samo => "SAMO",
        }
    }

    /// Ticker shown next to formatted amounts
    pub fn symbol(&self) -> &'static str {
        match self {
            TokenType::Lamports => "SOL",
            other => other.as_str(),
        }
    }

    pub fn decimals(&self) -> u8 {
        match self {
            TokenType::Lamports | TokenType::MSol | TokenType::Samo => 9,
            TokenType::Usdc | TokenType::Usdt => 6,
            TokenType::Bonk => 5,
        }
    }

    /// Wire tag inside pool instructions
    pub(crate) fn code(&self) -> u8 {
        match self {
            TokenType::Lamports => 0,
            TokenType::Usdc => 1,
            TokenType::Usdt => 2,
            TokenType::MSol => 3,
            TokenType::Bonk => 4,
            TokenType::Samo => 5,
        }
    }

    pub(crate) fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Formats base units as a decimal amount, e.g. `1500000000` → `1.5 SOL`.
    pub fn format_amount(&self, amount: u64) -> String {
        let decimals = self.decimals() as usize;
        let scale = 10u64.pow(decimals as u32);
        let whole = amount / scale;
        let frac = amount % scale;

        if frac == 0 {
            return format!("{whole} {}", self.symbol());
        }
        let frac = format!("{frac:0decimals$}");
        format!("{whole}.{} {}", frac.trim_end_matches('0'), self.symbol())
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenType {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s) || t.symbol().eq_ignore_ascii_case(s))
            .ok_or_else(|| SdkError::UnknownToken(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("LAMPORTS".parse::<TokenType>().unwrap(), TokenType::Lamports);
        assert_eq!("lamports".parse::<TokenType>().unwrap(), TokenType::Lamports);
        assert_eq!("sol".parse::<TokenType>().unwrap(), TokenType::Lamports);
        assert_eq!("msol".parse::<TokenType>().unwrap(), TokenType::MSol);
        assert!(matches!(
            "DOGE".parse::<TokenType>(),
            Err(SdkError::UnknownToken(_))
        ));
    }

    #[test]
    fn test_codes_roundtrip() {
        for token in TokenType::ALL {
            assert_eq!(TokenType::from_code(token.code()), Some(token));
        }
        assert_eq!(TokenType::from_code(42), None);
    }

    #[test]
    fn test_format_amount() {
        let sol = TokenType::Lamports;
        assert_eq!(sol.format_amount(0), "0 SOL");
        assert_eq!(sol.format_amount(1_000_000_000), "1 SOL");
        assert_eq!(sol.format_amount(500_000_000), "0.5 SOL");
        assert_eq!(sol.format_amount(1_000_000_001), "1.000000001 SOL");
        assert_eq!(TokenType::Usdc.format_amount(2_250_000), "2.25 USDC");
        assert_eq!(TokenType::Bonk.format_amount(100_000), "1 BONK");
    }
}
