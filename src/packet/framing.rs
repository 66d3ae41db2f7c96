use std::str::FromStr;

use anyhow::bail;
use thiserror::Error;

use super::RECORD_LEN;

/// Size of the signature length announced by [`Framing::LengthPrefixed`].
pub const LENGTH_PREFIX_LEN: usize = 2;

/// How a signed packet is laid out on the stream.
///
/// [`Framing::Implicit`] is the base protocol: `record ‖ signature` with no
/// length anywhere, so the receiver must know the signature length from its
/// copy of the public key. [`Framing::LengthPrefixed`] is an opt-in extension
/// that prepends the signature length as a little-endian `u16`. It is not wire
/// compatible with implicit receivers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Framing {
    #[default]
    Implicit,
    LengthPrefixed,
}

impl Framing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framing::Implicit => "implicit",
            Framing::LengthPrefixed => "length-prefixed",
        }
    }

    /// Total number of bytes a packet occupies for a given signature length.
    pub fn packet_len(&self, signature_len: usize) -> usize {
        match self {
            Framing::Implicit => RECORD_LEN + signature_len,
            Framing::LengthPrefixed => LENGTH_PREFIX_LEN + RECORD_LEN + signature_len,
        }
    }
}

impl FromStr for Framing {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "implicit" => Ok(Framing::Implicit),
            "length-prefixed" => Ok(Framing::LengthPrefixed),
            _ => bail!("unknown framing: {}", s),
        }
    }
}

impl std::fmt::Display for Framing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("malformed packet length: expected {expected} bytes, got {actual}")]
    MalformedLength { expected: usize, actual: usize },

    #[error("announced signature length {announced} does not match expected {expected}")]
    SignatureLengthMismatch { announced: usize, expected: usize },

    #[error("signature of {0} bytes does not fit a length prefix")]
    SignatureTooLong(usize),
}

/// A record together with its detached signature.
///
/// Built once per transmission cycle and dropped after the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPacket {
    record: [u8; RECORD_LEN],
    signature: Vec<u8>,
}

impl SignedPacket {
    pub fn new(record: [u8; RECORD_LEN], signature: Vec<u8>) -> Self {
        Self { record, signature }
    }

    pub fn record_bytes(&self) -> &[u8; RECORD_LEN] {
        &self.record
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Serializes the packet into a single buffer ready for one transport write.
    pub fn to_bytes(&self, framing: Framing) -> Result<Vec<u8>, FrameError> {
        let mut buf = Vec::with_capacity(framing.packet_len(self.signature.len()));

        if framing == Framing::LengthPrefixed {
            let len = u16::try_from(self.signature.len())
                .map_err(|_| FrameError::SignatureTooLong(self.signature.len()))?;
            buf.extend_from_slice(&len.to_le_bytes());
        }

        buf.extend_from_slice(&self.record);
        buf.extend_from_slice(&self.signature);

        Ok(buf)
    }

    /// Splits an inbound packet at the fixed record length.
    ///
    /// `signature_len` comes from the receiver's public key. Any total length
    /// other than the one implied by it is rejected before anything is decoded.
    pub fn split(bytes: &[u8], signature_len: usize, framing: Framing) -> Result<Self, FrameError> {
        let expected = framing.packet_len(signature_len);
        if bytes.len() != expected {
            return Err(FrameError::MalformedLength {
                expected,
                actual: bytes.len(),
            });
        }

        let body = match framing {
            Framing::Implicit => bytes,
            Framing::LengthPrefixed => {
                let announced = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
                if announced != signature_len {
                    return Err(FrameError::SignatureLengthMismatch {
                        announced,
                        expected: signature_len,
                    });
                }
                &bytes[LENGTH_PREFIX_LEN..]
            }
        };

        let (record, signature) = body.split_at(RECORD_LEN);
        let mut record_buf = [0u8; RECORD_LEN];
        record_buf.copy_from_slice(record);

        Ok(Self::new(record_buf, signature.to_vec()))
    }
}
