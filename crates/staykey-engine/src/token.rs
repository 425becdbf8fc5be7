//! Token and code generation.
//!
//! The check-in token is the only credential a guest ever holds, so it has
//! to be unguessable; the access code is constrained by what a lock keypad
//! accepts.

use rand::Rng;
use rand::distr::{Alphanumeric, SampleString};

/// Length of a check-in token.
pub const CHECKIN_TOKEN_LEN: usize = 32;

/// Generates a fresh check-in token: 32 alphanumeric characters.
pub fn new_checkin_token() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), CHECKIN_TOKEN_LEN)
}

/// Generates a fresh access code: six decimal digits, no leading zero.
pub fn new_access_code() -> String {
    rand::rng().random_range(100_000..1_000_000).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn checkin_tokens_are_long_and_alphanumeric() {
        let token = new_checkin_token();
        assert_eq!(token.len(), CHECKIN_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn checkin_tokens_do_not_repeat() {
        let tokens: HashSet<_> = (0..100).map(|_| new_checkin_token()).collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn access_codes_are_six_digits() {
        for _ in 0..100 {
            let code = new_access_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.as_bytes()[0], b'0');
        }
    }
}
