use base64::Engine;
use hkdf::Hkdf;
use rand::Rng;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{GuardError, GuardResult};

const SCHEME: &str = "hkdf-sha256";
const INFO: &[u8] = b"quotify-credential-digest-v1";
pub const SALT_SIZE: usize = 16;
pub const DIGEST_SIZE: usize = 32;

/// One-way, salted digest of a login passphrase.
///
/// Stored in the persisted record as `hkdf-sha256$<salt>$<digest>` with
/// both parts base64-encoded. The passphrase itself is never stored.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct CredentialDigest {
    salt: [u8; SALT_SIZE],
    bytes: [u8; DIGEST_SIZE],
}

impl CredentialDigest {
    /// Digest a passphrase under a fresh random salt.
    pub fn new(passphrase: &str) -> GuardResult<Self> {
        let mut salt = [0u8; SALT_SIZE];
        rand::rng().fill_bytes(&mut salt);
        Self::with_salt(passphrase, salt)
    }

    fn with_salt(passphrase: &str, salt: [u8; SALT_SIZE]) -> GuardResult<Self> {
        let hk = Hkdf::<Sha256>::new(Some(&salt), passphrase.as_bytes());
        let mut bytes = [0u8; DIGEST_SIZE];
        hk.expand(INFO, &mut bytes)
            .map_err(|e| GuardError::Digest(e.to_string()))?;
        Ok(Self { salt, bytes })
    }

    /// Encode for storage.
    pub fn encode(&self) -> String {
        let engine = &base64::engine::general_purpose::STANDARD;
        format!(
            "{SCHEME}${}${}",
            engine.encode(self.salt),
            engine.encode(self.bytes)
        )
    }

    /// Parse a stored digest.
    pub fn decode(encoded: &str) -> GuardResult<Self> {
        let mut parts = encoded.split('$');
        let (Some(scheme), Some(salt_b64), Some(digest_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(GuardError::Digest("malformed digest".into()));
        };
        if scheme != SCHEME {
            return Err(GuardError::Digest(format!("unknown scheme: {scheme}")));
        }

        let engine = &base64::engine::general_purpose::STANDARD;
        let salt_vec = engine
            .decode(salt_b64)
            .map_err(|e| GuardError::Digest(e.to_string()))?;
        let digest_vec = engine
            .decode(digest_b64)
            .map_err(|e| GuardError::Digest(e.to_string()))?;

        let salt: [u8; SALT_SIZE] = salt_vec
            .as_slice()
            .try_into()
            .map_err(|_| GuardError::Digest("bad salt length".into()))?;
        let bytes: [u8; DIGEST_SIZE] = digest_vec
            .as_slice()
            .try_into()
            .map_err(|_| GuardError::Digest("bad digest length".into()))?;

        Ok(Self { salt, bytes })
    }

    /// Check a candidate passphrase against this digest in constant time.
    pub fn verify(&self, passphrase: &str) -> bool {
        match Self::with_salt(passphrase, self.salt) {
            Ok(candidate) => constant_time_eq(&candidate.bytes, &self.bytes),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for CredentialDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialDigest")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Verify a passphrase against an encoded digest; malformed input never matches.
pub fn verify_encoded(passphrase: &str, encoded: &str) -> bool {
    CredentialDigest::decode(encoded)
        .map(|d| d.verify(passphrase))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_enrolled_passphrase() {
        let digest = CredentialDigest::new("longenough").unwrap();
        assert!(digest.verify("longenough"));
        assert!(!digest.verify("longenougH"));
    }

    #[test]
    fn encoded_form_round_trips_and_hides_passphrase() {
        let encoded = CredentialDigest::new("correct horse").unwrap().encode();
        assert!(encoded.starts_with("hkdf-sha256$"));
        assert!(!encoded.contains("correct horse"));
        assert!(verify_encoded("correct horse", &encoded));
        assert!(!verify_encoded("wrongpw", &encoded));
    }

    #[test]
    fn same_passphrase_gets_different_salts() {
        let a = CredentialDigest::new("longenough").unwrap().encode();
        let b = CredentialDigest::new("longenough").unwrap().encode();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_digests_are_rejected() {
        assert!(CredentialDigest::decode("").is_err());
        assert!(CredentialDigest::decode("bG9uZ2Vub3VnaA==").is_err());
        assert!(CredentialDigest::decode("md5$AAAA$AAAA").is_err());
        assert!(CredentialDigest::decode("hkdf-sha256$AAAA$AAAA").is_err());
        assert!(!verify_encoded("anything", "hkdf-sha256$$$"));
    }

    #[test]
    fn debug_redacts_bytes() {
        let digest = CredentialDigest::new("longenough").unwrap();
        assert!(format!("{digest:?}").contains("REDACTED"));
    }
}
