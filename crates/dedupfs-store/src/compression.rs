//! Block codecs and compression-method name resolution.
//!
//! The registry stores method *names*; this module maps a name to a codec.
//! Soft-renamed legacy methods carry a `_v<digits>` suffix (`zlib_v1`) and
//! resolve to the same codec as their base name, so blocks written under a
//! retired method stay readable.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Codec selection for a block payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CompressionCodec {
    /// No compression (passthrough).
    None,
    /// LZ4 frame format — hot path.
    #[default]
    Lz4,
    /// Zstandard — higher ratio, used for cold blocks.
    Zstd {
        /// Compression level (1=fastest, 19=best ratio, 3=balanced default).
        level: i32,
    },
    /// zlib/DEFLATE — retired; kept so legacy blocks stay readable.
    Zlib {
        /// Compression level 0-9.
        level: u32,
    },
}

/// Strip a trailing `_v<digits>` versioned-alias suffix from a method name.
fn base_method_name(name: &str) -> &str {
    if let Some(pos) = name.rfind("_v") {
        let suffix = &name[pos + 2..];
        if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
            return &name[..pos];
        }
    }
    name
}

impl CompressionCodec {
    /// Resolve a registry method name to a codec, honoring versioned
    /// legacy aliases. Returns None for names no codec can handle.
    pub fn for_method(name: &str) -> Option<Self> {
        match base_method_name(name) {
            "none" => Some(CompressionCodec::None),
            "lz4" => Some(CompressionCodec::Lz4),
            "zstd" => Some(CompressionCodec::Zstd { level: 3 }),
            "zlib" => Some(CompressionCodec::Zlib { level: 6 }),
            _ => None,
        }
    }
}

/// Compress data with the given codec.
pub fn compress(data: &[u8], codec: CompressionCodec) -> Result<Vec<u8>, StoreError> {
    match codec {
        CompressionCodec::None => Ok(data.to_vec()),
        CompressionCodec::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
        CompressionCodec::Zstd { level } => zstd::encode_all(data, level)
            .map_err(|e| StoreError::CompressionFailed(e.to_string())),
        CompressionCodec::Zlib { level } => {
            let mut encoder = flate2::read::ZlibEncoder::new(
                data,
                flate2::Compression::new(level),
            );
            let mut out = Vec::new();
            encoder
                .read_to_end(&mut out)
                .map_err(|e| StoreError::CompressionFailed(e.to_string()))?;
            Ok(out)
        }
    }
}

/// Decompress data using the codec it was compressed with.
pub fn decompress(data: &[u8], codec: CompressionCodec) -> Result<Vec<u8>, StoreError> {
    match codec {
        CompressionCodec::None => Ok(data.to_vec()),
        CompressionCodec::Lz4 => lz4_flex::decompress_size_prepended(data)
            .map_err(|e| StoreError::DecompressionFailed(e.to_string())),
        CompressionCodec::Zstd { .. } => {
            zstd::decode_all(data).map_err(|e| StoreError::DecompressionFailed(e.to_string()))
        }
        CompressionCodec::Zlib { .. } => {
            let mut decoder = flate2::read::ZlibDecoder::new(data);
            let mut out = Vec::new();
            decoder
                .read_to_end(&mut out)
                .map_err(|e| StoreError::DecompressionFailed(e.to_string()))?;
            Ok(out)
        }
    }
}

/// Decompress a payload stored under the given registry method name.
pub fn decompress_method(name: &str, data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let codec = CompressionCodec::for_method(name)
        .ok_or_else(|| StoreError::UnknownMethod(name.to_string()))?;
    decompress(data, codec)
}
