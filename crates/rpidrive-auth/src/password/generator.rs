//! Random credentials for bootstrap accounts.

use rand::distr::{Alphanumeric, SampleString};

/// Random alphanumeric password of `len` characters.
pub fn generate_password(len: usize) -> String {
    Alphanumeric.sample_string(&mut rand::rng(), len)
}

/// Random lowercase alphanumeric token, used for generated usernames.
pub fn generate_token(len: usize) -> String {
    Alphanumeric
        .sample_string(&mut rand::rng(), len)
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths_and_charset() {
        let password = generate_password(16);
        assert_eq!(password.len(), 16);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));

        let token = generate_token(6);
        assert_eq!(token.len(), 6);
        assert!(token.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_passwords_differ() {
        assert_ne!(generate_password(16), generate_password(16));
    }
}
