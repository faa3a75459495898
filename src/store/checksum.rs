//! CRC32 checksums over the persisted record set
//!
//! - The checksum covers the canonical (sorted, compact) JSON of the records
//! - A mismatch on open is corruption and the store refuses to load

use crc32fast::Hasher;

/// Computes a CRC32 (IEEE) checksum over `data`.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    compute_checksum(data) == expected
}
