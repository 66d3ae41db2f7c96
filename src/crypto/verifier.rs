use std::{fs, path::Path};

use rsa::{
    RsaPublicKey,
    pkcs1::DecodeRsaPublicKey as _,
    pkcs1v15,
    pkcs8::DecodePublicKey as _,
    pss,
    signature::hazmat::PrehashVerifier as _,
    traits::PublicKeyParts as _,
};
use sha2::Sha256;
use thiserror::Error;

use super::{KeyLoadError, SignatureScheme};
use crate::packet::{FrameError, Framing, SensorRecord, SignedPacket};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpenError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("signature verification failed")]
    BadSignature,
}

enum VerifyingKey {
    RsaPkcs1v15(pkcs1v15::VerifyingKey<Sha256>),
    RsaPss(pss::VerifyingKey<Sha256>),
    Ed25519(ed25519_dalek::VerifyingKey),
}

/// The collector's half of the scheme: a public key plus the scheme it was
/// configured with.
pub struct PacketVerifier {
    scheme: SignatureScheme,
    key: VerifyingKey,
    signature_len: usize,
}

impl PacketVerifier {
    pub fn load(scheme: SignatureScheme, path: &Path) -> Result<Self, KeyLoadError> {
        let pem = fs::read_to_string(path).map_err(|source| KeyLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_pem(scheme, &pem)
    }

    /// Parses a PEM public key. RSA keys may be SPKI or PKCS#1, Ed25519 keys
    /// must be SPKI.
    pub fn from_pem(scheme: SignatureScheme, pem: &str) -> Result<Self, KeyLoadError> {
        let parse_error = |reason: String| KeyLoadError::Parse { scheme, reason };

        match scheme {
            SignatureScheme::RsaPkcs1v15Sha256 | SignatureScheme::RsaPssSha256 => {
                let key = if pem.contains("BEGIN RSA PUBLIC KEY") {
                    RsaPublicKey::from_pkcs1_pem(pem).map_err(|e| parse_error(e.to_string()))?
                } else {
                    RsaPublicKey::from_public_key_pem(pem)
                        .map_err(|e| parse_error(e.to_string()))?
                };
                Self::from_rsa_key(scheme, key)
            }
            SignatureScheme::Ed25519Sha256 => {
                let key = <ed25519_dalek::VerifyingKey as ed25519_dalek::pkcs8::DecodePublicKey>::from_public_key_pem(pem)
                    .map_err(|e| parse_error(e.to_string()))?;
                Ok(Self::from_ed25519_key(key))
            }
        }
    }

    pub fn from_rsa_key(scheme: SignatureScheme, key: RsaPublicKey) -> Result<Self, KeyLoadError> {
        match scheme {
            SignatureScheme::RsaPkcs1v15Sha256 => Ok(Self::rsa_pkcs1v15(key)),
            SignatureScheme::RsaPssSha256 => Ok(Self::rsa_pss(key)),
            SignatureScheme::Ed25519Sha256 => Err(KeyLoadError::KeyTypeMismatch { scheme }),
        }
    }

    pub fn from_ed25519_key(key: ed25519_dalek::VerifyingKey) -> Self {
        Self {
            scheme: SignatureScheme::Ed25519Sha256,
            key: VerifyingKey::Ed25519(key),
            signature_len: ed25519_dalek::SIGNATURE_LENGTH,
        }
    }

    pub(super) fn rsa_pkcs1v15(key: RsaPublicKey) -> Self {
        let signature_len = key.size();
        Self {
            scheme: SignatureScheme::RsaPkcs1v15Sha256,
            key: VerifyingKey::RsaPkcs1v15(pkcs1v15::VerifyingKey::new(key)),
            signature_len,
        }
    }

    pub(super) fn rsa_pss(key: RsaPublicKey) -> Self {
        let signature_len = key.size();
        Self {
            scheme: SignatureScheme::RsaPssSha256,
            key: VerifyingKey::RsaPss(pss::VerifyingKey::new(key)),
            signature_len,
        }
    }

    pub fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    /// Length the receiver expects after the 22 record bytes.
    pub fn signature_len(&self) -> usize {
        self.signature_len
    }

    pub fn verify(&self, record: &[u8], signature: &[u8]) -> bool {
        if signature.len() != self.signature_len {
            return false;
        }

        let digest = self.scheme.digest(record);

        match &self.key {
            VerifyingKey::RsaPkcs1v15(key) => pkcs1v15::Signature::try_from(signature)
                .is_ok_and(|sig| key.verify_prehash(&digest, &sig).is_ok()),
            VerifyingKey::RsaPss(key) => pss::Signature::try_from(signature)
                .is_ok_and(|sig| key.verify_prehash(&digest, &sig).is_ok()),
            VerifyingKey::Ed25519(key) => ed25519_dalek::Signature::from_slice(signature)
                .is_ok_and(|sig| key.verify_strict(&digest, &sig).is_ok()),
        }
    }

    /// Splits, verifies and decodes one inbound packet.
    ///
    /// Nothing is decoded unless the length is exact and the signature checks
    /// out.
    pub fn open(&self, bytes: &[u8], framing: Framing) -> Result<SensorRecord, OpenError> {
        let packet = SignedPacket::split(bytes, self.signature_len, framing)?;

        if !self.verify(packet.record_bytes(), packet.signature()) {
            return Err(OpenError::BadSignature);
        }

        Ok(SensorRecord::decode_array(packet.record_bytes()))
    }
}

impl std::fmt::Debug for PacketVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketVerifier")
            .field("scheme", &self.scheme)
            .field("signature_len", &self.signature_len)
            .finish_non_exhaustive()
    }
}
