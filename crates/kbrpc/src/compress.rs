//! Per-call argument compression.
//!
//! Compression is a per-call policy flag chosen by the caller (generated
//! client stubs pass it for bulk-data methods); the codec applies it to the
//! encoded argument tuple of `CallCompressed` packets only.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::RpcError;

/// Compression applied to a `CallCompressed` argument payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// No compression; the payload is the raw encoded tuple.
    None,
    /// Gzip (DEFLATE with gzip wrapper).
    Gzip,
}

impl CompressionType {
    /// Returns the wire code for this compression type.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Gzip => 1,
        }
    }

    /// Looks up a compression type by wire code.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::UnknownCompression`] for unrecognized codes.
    pub fn from_code(code: i64) -> Result<Self, RpcError> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Gzip),
            other => Err(RpcError::UnknownCompression(other)),
        }
    }

    /// Compresses an encoded argument payload.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the encoder fails.
    pub fn compress(self, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Gzip => {
                let mut enc = GzEncoder::new(Vec::new(), Compression::default());
                enc.write_all(data)?;
                Ok(enc.finish()?)
            }
        }
    }

    /// Decompresses a received argument payload.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the payload is not valid for this
    /// compression type.
    pub fn decompress(self, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Gzip => {
                let mut dec = GzDecoder::new(data);
                let mut out = Vec::new();
                dec.read_to_end(&mut out)?;
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_round_trip() {
        let data = vec![0x5Au8; 4096];
        let packed = CompressionType::Gzip.compress(&data).unwrap();
        assert!(packed.len() < data.len());
        let unpacked = CompressionType::Gzip.decompress(&packed).unwrap();
        assert_eq!(unpacked, data);
    }

    #[test]
    fn none_is_identity() {
        let data = b"raw tuple bytes".to_vec();
        assert_eq!(CompressionType::None.compress(&data).unwrap(), data);
        assert_eq!(CompressionType::None.decompress(&data).unwrap(), data);
    }

    #[test]
    fn gzip_rejects_garbage() {
        assert!(CompressionType::Gzip.decompress(b"not gzip").is_err());
    }

    #[test]
    fn unknown_code_is_error() {
        assert!(matches!(
            CompressionType::from_code(9),
            Err(RpcError::UnknownCompression(9))
        ));
    }
}
