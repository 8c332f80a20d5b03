use rand::RngCore;
use rand::rngs::OsRng;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};

use crate::error::WalletError;

/// Derive a node identity from a seed phrase: SHA-256 of the phrase is the
/// secp256k1 secret key, the identity is the hex of the compressed public
/// key (33 bytes, 66 hex chars). Equal seeds always give equal identities.
pub fn identity_from_seed(seed_phrase: &str) -> Result<String, WalletError> {
    let secp = Secp256k1::signing_only();
    let digest = Sha256::digest(seed_phrase.as_bytes());
    let sk = SecretKey::from_slice(&digest)?;
    let pk = PublicKey::from_secret_key(&secp, &sk);
    Ok(hex::encode(pk.serialize()))
}

/// Fresh random seed phrase (hex of 16 bytes from the OS RNG).
pub fn generate_seed_phrase() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Identities are compressed public keys in lowercase hex.
pub fn is_identity(candidate: &str) -> bool {
    hex::decode(candidate)
        .ok()
        .and_then(|bytes| PublicKey::from_slice(&bytes).ok())
        .is_some_and(|pk| hex::encode(pk.serialize()) == candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_seed_gives_known_identity() {
        assert_eq!(
            identity_from_seed("ITAM").unwrap(),
            "03d5d196ef6dbf43704d9866eaf2c3bfa952e168417ca78748967928aa066d9fe3"
        );
        assert_eq!(
            identity_from_seed("FEWGW").unwrap(),
            "03c1958bbe5ae6bfbdafabaa792d1f315076312a54df20a1045cf2f6c17cc85acb"
        );
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = identity_from_seed("correct horse").unwrap();
        let b = identity_from_seed("correct horse").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 66);
        assert!(is_identity(&a));
        assert_ne!(a, identity_from_seed("battery staple").unwrap());
    }

    #[test]
    fn generated_seeds_differ() {
        let a = generate_seed_phrase();
        assert_eq!(a.len(), 32);
        assert_ne!(a, generate_seed_phrase());
        assert!(identity_from_seed(&a).is_ok());
    }

    #[test]
    fn garbage_is_not_an_identity() {
        assert!(!is_identity("server"));
        assert!(!is_identity(&"ab".repeat(33)));
    }
}
