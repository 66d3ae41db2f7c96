use std::{
    fs,
    path::{Path, PathBuf},
};

use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs1::DecodeRsaPrivateKey as _,
    pkcs1v15,
    pkcs8::DecodePrivateKey as _,
    pss,
    signature::{
        SignatureEncoding as _,
        hazmat::{PrehashSigner as _, RandomizedPrehashSigner as _},
    },
    traits::PublicKeyParts as _,
};
use sha2::Sha256;
use thiserror::Error;

use super::{PacketVerifier, SignatureScheme};

/// Fatal at startup: the private key could not be turned into a signer.
#[derive(Debug, Error)]
pub enum KeyLoadError {
    #[error("failed to read key file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {scheme} key: {reason}")]
    Parse {
        scheme: SignatureScheme,
        reason: String,
    },

    #[error("{scheme} requires an {} key", .scheme.key_type())]
    KeyTypeMismatch { scheme: SignatureScheme },
}

/// Recoverable: the primitive refused to sign this record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("signing with {scheme} failed: {reason}")]
pub struct SignError {
    pub scheme: SignatureScheme,
    pub reason: String,
}

/// Produces detached signatures over encoded records.
///
/// Implementations hash the record with the scheme's digest and sign the
/// digest. The transmitter only ever sees this trait, so tests can swap in a
/// signer that fails on demand.
pub trait RecordSigner {
    fn scheme(&self) -> SignatureScheme;

    /// Length of every signature this signer produces.
    fn signature_len(&self) -> usize;

    fn sign(&self, record: &[u8]) -> Result<Vec<u8>, SignError>;
}

enum SigningKey {
    RsaPkcs1v15 {
        key: pkcs1v15::SigningKey<Sha256>,
        public: RsaPublicKey,
    },
    RsaPss {
        key: pss::SigningKey<Sha256>,
        public: RsaPublicKey,
    },
    Ed25519(ed25519_dalek::SigningKey),
}

/// A private key loaded once and bound to one [`SignatureScheme`].
pub struct PacketSigner {
    scheme: SignatureScheme,
    key: SigningKey,
    signature_len: usize,
}

impl PacketSigner {
    pub fn load(scheme: SignatureScheme, path: &Path) -> Result<Self, KeyLoadError> {
        let pem = fs::read_to_string(path).map_err(|source| KeyLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_pem(scheme, &pem)
    }

    /// Parses a PEM private key. RSA keys may be PKCS#8 or PKCS#1, Ed25519 keys
    /// must be PKCS#8.
    pub fn from_pem(scheme: SignatureScheme, pem: &str) -> Result<Self, KeyLoadError> {
        let parse_error = |reason: String| KeyLoadError::Parse { scheme, reason };

        match scheme {
            SignatureScheme::RsaPkcs1v15Sha256 | SignatureScheme::RsaPssSha256 => {
                let key = if pem.contains("BEGIN RSA PRIVATE KEY") {
                    RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| parse_error(e.to_string()))?
                } else {
                    RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| parse_error(e.to_string()))?
                };
                Self::from_rsa_key(scheme, key)
            }
            SignatureScheme::Ed25519Sha256 => {
                let key = <ed25519_dalek::SigningKey as ed25519_dalek::pkcs8::DecodePrivateKey>::from_pkcs8_pem(pem)
                    .map_err(|e| parse_error(e.to_string()))?;
                Ok(Self::from_ed25519_key(key))
            }
        }
    }

    pub fn from_rsa_key(scheme: SignatureScheme, key: RsaPrivateKey) -> Result<Self, KeyLoadError> {
        let public = key.to_public_key();
        let signature_len = public.size();

        let key = match scheme {
            SignatureScheme::RsaPkcs1v15Sha256 => SigningKey::RsaPkcs1v15 {
                key: pkcs1v15::SigningKey::new(key),
                public,
            },
            SignatureScheme::RsaPssSha256 => SigningKey::RsaPss {
                key: pss::SigningKey::new(key),
                public,
            },
            SignatureScheme::Ed25519Sha256 => return Err(KeyLoadError::KeyTypeMismatch { scheme }),
        };

        Ok(Self {
            scheme,
            key,
            signature_len,
        })
    }

    pub fn from_ed25519_key(key: ed25519_dalek::SigningKey) -> Self {
        Self {
            scheme: SignatureScheme::Ed25519Sha256,
            key: SigningKey::Ed25519(key),
            signature_len: ed25519_dalek::SIGNATURE_LENGTH,
        }
    }

    /// The verifier a collector needs to accept this signer's packets.
    pub fn verifier(&self) -> PacketVerifier {
        match &self.key {
            SigningKey::RsaPkcs1v15 { public, .. } => PacketVerifier::rsa_pkcs1v15(public.clone()),
            SigningKey::RsaPss { public, .. } => PacketVerifier::rsa_pss(public.clone()),
            SigningKey::Ed25519(key) => PacketVerifier::from_ed25519_key(key.verifying_key()),
        }
    }
}

impl RecordSigner for PacketSigner {
    fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    fn signature_len(&self) -> usize {
        self.signature_len
    }

    fn sign(&self, record: &[u8]) -> Result<Vec<u8>, SignError> {
        let digest = self.scheme.digest(record);
        let sign_error = |reason: String| SignError {
            scheme: self.scheme,
            reason,
        };

        let signature = match &self.key {
            SigningKey::RsaPkcs1v15 { key, .. } => key
                .sign_prehash(&digest)
                .map_err(|e| sign_error(e.to_string()))?
                .to_vec(),
            SigningKey::RsaPss { key, .. } => key
                .sign_prehash_with_rng(&mut rand::thread_rng(), &digest)
                .map_err(|e| sign_error(e.to_string()))?
                .to_vec(),
            SigningKey::Ed25519(key) => {
                use ed25519_dalek::Signer as _;
                key.try_sign(&digest)
                    .map_err(|e| sign_error(e.to_string()))?
                    .to_bytes()
                    .to_vec()
            }
        };

        if signature.len() != self.signature_len {
            return Err(sign_error(format!(
                "expected {} signature bytes, got {}",
                self.signature_len,
                signature.len()
            )));
        }

        Ok(signature)
    }
}

impl std::fmt::Debug for PacketSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketSigner")
            .field("scheme", &self.scheme)
            .field("signature_len", &self.signature_len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use rsa::pkcs8::{EncodePrivateKey as _, LineEnding};

    use super::*;
    use crate::crypto::test_keys::{ed25519_key, rsa_key_a};
    use crate::packet::SensorRecord;

    fn record_bytes() -> [u8; 22] {
        SensorRecord {
            sensor_id: 101,
            timestamp: 1_700_000_000,
            temperature: 22.5,
            pressure: 1012.3,
            humidity: 55.0,
        }
        .encode()
    }

    #[test]
    fn signature_length_follows_key_size() {
        let signer =
            PacketSigner::from_rsa_key(SignatureScheme::RsaPkcs1v15Sha256, rsa_key_a().clone())
                .unwrap();

        assert_eq!(signer.signature_len(), 128);
        assert_eq!(signer.sign(&record_bytes()).unwrap().len(), 128);

        let signer = PacketSigner::from_ed25519_key(ed25519_key(1));
        assert_eq!(signer.sign(&record_bytes()).unwrap().len(), 64);
    }

    #[test]
    fn pkcs1v15_signatures_are_deterministic() {
        let signer =
            PacketSigner::from_rsa_key(SignatureScheme::RsaPkcs1v15Sha256, rsa_key_a().clone())
                .unwrap();

        assert_eq!(
            signer.sign(&record_bytes()).unwrap(),
            signer.sign(&record_bytes()).unwrap()
        );
    }

    #[test]
    fn pss_signatures_are_randomized() {
        let signer =
            PacketSigner::from_rsa_key(SignatureScheme::RsaPssSha256, rsa_key_a().clone()).unwrap();

        assert_ne!(
            signer.sign(&record_bytes()).unwrap(),
            signer.sign(&record_bytes()).unwrap()
        );
    }

    #[test]
    fn ed25519_scheme_rejects_rsa_key() {
        let err = PacketSigner::from_rsa_key(SignatureScheme::Ed25519Sha256, rsa_key_a().clone())
            .unwrap_err();

        assert!(matches!(err, KeyLoadError::KeyTypeMismatch { .. }));
    }

    #[test]
    fn loads_pkcs8_pem_from_disk() {
        let pem = rsa_key_a().to_pkcs8_pem(LineEnding::LF).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(pem.as_bytes()).unwrap();

        let signer = PacketSigner::load(SignatureScheme::RsaPkcs1v15Sha256, file.path()).unwrap();

        assert_eq!(signer.scheme(), SignatureScheme::RsaPkcs1v15Sha256);
        assert_eq!(signer.signature_len(), 128);
    }

    #[test]
    fn loads_pkcs1_pem() {
        use rsa::pkcs1::EncodeRsaPrivateKey as _;

        let pem = rsa_key_a().to_pkcs1_pem(LineEnding::LF).unwrap();
        let signer = PacketSigner::from_pem(SignatureScheme::RsaPssSha256, &pem).unwrap();

        assert_eq!(signer.signature_len(), 128);
    }

    #[test]
    fn loads_ed25519_pem() {
        let pem = <ed25519_dalek::SigningKey as ed25519_dalek::pkcs8::EncodePrivateKey>::to_pkcs8_pem(
            &ed25519_key(2),
            LineEnding::LF,
        )
        .unwrap();

        let signer = PacketSigner::from_pem(SignatureScheme::Ed25519Sha256, &pem).unwrap();
        assert_eq!(signer.signature_len(), 64);
    }

    #[test]
    fn missing_key_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("private.pem");

        let err = PacketSigner::load(SignatureScheme::default(), &path).unwrap_err();

        assert!(matches!(err, KeyLoadError::Io { .. }));
        assert!(err.to_string().contains("private.pem"));
    }

    #[test]
    fn garbage_pem_is_parse_error() {
        let err = PacketSigner::from_pem(SignatureScheme::default(), "not a key").unwrap_err();

        assert!(matches!(err, KeyLoadError::Parse { .. }));
    }

    #[test]
    fn debug_does_not_leak_private_key() {
        let signer = PacketSigner::from_ed25519_key(ed25519_key(42));
        let debug_str = format!("{signer:?}");

        assert!(debug_str.contains("PacketSigner"));
        assert!(debug_str.contains("Ed25519Sha256"));
        assert!(!debug_str.contains("2a2a2a"));
    }
}
