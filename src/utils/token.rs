use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const RESET_TOKEN_LENGTH: usize = 40;

/// JWT payload carried by the `token` cookie or a bearer header.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

pub fn generate_token(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

pub fn sha256_hex(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

/// Plain token for the recovery mail plus the digest that is stored. Only
/// the digest ever touches the database, so a leaked row cannot be replayed.
pub fn generate_reset_token() -> (String, String) {
    let token = generate_token(RESET_TOKEN_LENGTH);
    let digest = sha256_hex(&token);
    (token, digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_alphanumeric_with_requested_length() {
        let token = generate_token(32);
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn sha256_hex_matches_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn reset_pair_is_consistent() {
        let (token, digest) = generate_reset_token();
        assert_eq!(token.len(), RESET_TOKEN_LENGTH);
        assert_ne!(token, digest);
        assert_eq!(sha256_hex(&token), digest);
    }
}
