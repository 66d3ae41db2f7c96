use std::str::FromStr;

use anyhow::{Error, bail};
use sha2::{Digest as _, Sha256};

/// Length of the digest every scheme signs.
pub const DIGEST_LEN: usize = 32;

/// The single identifier both ends of the link must agree on.
///
/// It pins the hash, the signature algorithm and the key type together. Nothing
/// on the wire names the scheme, so a sender and a collector configured with
/// different identifiers simply fail every verification.
///
/// | identifier            | hash    | signature                   | key     |
/// |-----------------------|---------|-----------------------------|---------|
/// | `rsa-pkcs1v15-sha256` | SHA-256 | RSASSA-PKCS1-v1_5           | RSA     |
/// | `rsa-pss-sha256`      | SHA-256 | RSASSA-PSS, MGF1-SHA-256    | RSA     |
/// | `ed25519-sha256`      | SHA-256 | Ed25519 over the digest     | Ed25519 |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SignatureScheme {
    #[default]
    RsaPkcs1v15Sha256,
    RsaPssSha256,
    Ed25519Sha256,
}

impl SignatureScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureScheme::RsaPkcs1v15Sha256 => "rsa-pkcs1v15-sha256",
            SignatureScheme::RsaPssSha256 => "rsa-pss-sha256",
            SignatureScheme::Ed25519Sha256 => "ed25519-sha256",
        }
    }

    pub fn key_type(&self) -> &'static str {
        match self {
            SignatureScheme::RsaPkcs1v15Sha256 | SignatureScheme::RsaPssSha256 => "RSA",
            SignatureScheme::Ed25519Sha256 => "Ed25519",
        }
    }

    /// Hashes an encoded record. The record fits in a single update.
    pub fn digest(&self, message: &[u8]) -> [u8; DIGEST_LEN] {
        match self {
            SignatureScheme::RsaPkcs1v15Sha256
            | SignatureScheme::RsaPssSha256
            | SignatureScheme::Ed25519Sha256 => Sha256::digest(message).into(),
        }
    }
}

impl FromStr for SignatureScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rsa-pkcs1v15-sha256" => Ok(SignatureScheme::RsaPkcs1v15Sha256),
            "rsa-pss-sha256" => Ok(SignatureScheme::RsaPssSha256),
            "ed25519-sha256" => Ok(SignatureScheme::Ed25519Sha256),
            _ => bail!("unknown signature scheme: {}", s),
        }
    }
}

impl std::fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
