//! Content-hash functions, selected by the name stored in the option table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::Digest;

use crate::error::StoreError;

/// A content-hash function the store can run over decompressed payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HashFunction {
    /// BLAKE3, 32-byte digests. The default for new stores.
    #[default]
    Blake3,
    /// SHA-256, 32-byte digests.
    Sha256,
    /// SHA-512, 64-byte digests.
    Sha512,
}

impl HashFunction {
    /// Hash the given bytes, returning the digest.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashFunction::Blake3 => blake3::hash(data).as_bytes().to_vec(),
            HashFunction::Sha256 => sha2::Sha256::digest(data).to_vec(),
            HashFunction::Sha512 => sha2::Sha512::digest(data).to_vec(),
        }
    }

    /// Digest length in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            HashFunction::Blake3 | HashFunction::Sha256 => 32,
            HashFunction::Sha512 => 64,
        }
    }
}

impl fmt::Display for HashFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashFunction::Blake3 => "blake3",
            HashFunction::Sha256 => "sha256",
            HashFunction::Sha512 => "sha512",
        };
        write!(f, "{name}")
    }
}

impl FromStr for HashFunction {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blake3" => Ok(HashFunction::Blake3),
            "sha256" => Ok(HashFunction::Sha256),
            "sha512" => Ok(HashFunction::Sha512),
            other => Err(StoreError::UnknownHashFunction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_lengths() {
        for f in [
            HashFunction::Blake3,
            HashFunction::Sha256,
            HashFunction::Sha512,
        ] {
            assert_eq!(f.digest(b"abc").len(), f.digest_len());
        }
    }

    #[test]
    fn test_blake3_matches_reference() {
        assert_eq!(
            HashFunction::Blake3.digest(b"abc"),
            blake3::hash(b"abc").as_bytes().to_vec()
        );
    }

    #[test]
    fn test_functions_disagree_on_same_input() {
        let b = HashFunction::Blake3.digest(b"abc");
        let s = HashFunction::Sha256.digest(b"abc");
        assert_ne!(b, s);
    }

    #[test]
    fn test_name_roundtrip() {
        for f in [
            HashFunction::Blake3,
            HashFunction::Sha256,
            HashFunction::Sha512,
        ] {
            assert_eq!(f.to_string().parse::<HashFunction>().unwrap(), f);
        }
    }

    #[test]
    fn test_unknown_name_rejected() {
        assert!(matches!(
            "md5".parse::<HashFunction>(),
            Err(StoreError::UnknownHashFunction(_))
        ));
    }
}
