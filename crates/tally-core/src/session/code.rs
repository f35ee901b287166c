//! Short shareable session codes.

use crate::error::{Result, TallyError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters a generated code is drawn from.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of characters in a generated code.
pub const CODE_LENGTH: usize = 6;

/// Identifier of a session, shared with participants by link or by hand.
///
/// Generated codes are not checked for collisions: with 36^6 possible codes
/// two sessions on the same substrates may, rarely, end up with the same code
/// and overwrite each other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCode(String);

impl SessionCode {
    /// Generates a fresh code with the thread-local RNG.
    pub fn random() -> Self {
        Self::generate(&mut rand::thread_rng())
    }

    /// Generates a code from the given RNG.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Parses a code typed or pasted by a user.
    ///
    /// Surrounding whitespace is dropped and letters are upper-cased. Any
    /// non-empty result is accepted, so codes coming from older links still
    /// resolve.
    pub fn parse(input: &str) -> Result<Self> {
        let normalized = input.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(TallyError::validation("code", "session code is required"));
        }
        Ok(Self(normalized))
    }

    /// Returns `true` if the code has the generated length and alphabet.
    pub fn is_canonical(&self) -> bool {
        self.0.len() == CODE_LENGTH && self.0.bytes().all(|b| CODE_ALPHABET.contains(&b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_generated_codes_are_canonical() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let code = SessionCode::generate(&mut rng);
            assert_eq!(code.as_str().len(), CODE_LENGTH);
            assert!(code.is_canonical(), "unexpected code {code}");
        }
    }

    #[test]
    fn test_same_seed_yields_same_code() {
        // Collisions are not prevented: identical RNG state gives identical codes.
        let a = SessionCode::generate(&mut StdRng::seed_from_u64(42));
        let b = SessionCode::generate(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_codes_mostly_distinct() {
        let codes: HashSet<_> = (0..200).map(|_| SessionCode::random()).collect();
        // Not guaranteed, but a collision among 200 draws from 36^6 is very unlikely.
        assert!(codes.len() >= 199);
    }

    #[test]
    fn test_parse_normalizes_input() {
        let code = SessionCode::parse("  ab12cd \n").unwrap();
        assert_eq!(code.as_str(), "AB12CD");
        assert!(code.is_canonical());
    }

    #[test]
    fn test_parse_rejects_blank() {
        let err = SessionCode::parse("   ").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_parse_accepts_non_canonical() {
        let code = SessionCode::parse("legacy-code").unwrap();
        assert_eq!(code.as_str(), "LEGACY-CODE");
        assert!(!code.is_canonical());
    }
}
