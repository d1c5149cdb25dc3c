//! Answer-key obfuscation.
//!
//! Correct option indices are shipped encoded so they are not readable at a
//! glance in the question bank. This is NOT cryptographic protection: the
//! constants live in this file and anyone holding the bank can decode it.
//! Never treat it as access control.

use crate::error::CodecError;

const OFFSET: u32 = 0x1F2E;
const MASK: u32 = 0xABCD;

/// Encode a single option index.
pub fn obfuscate_index(index: usize) -> u32 {
    (index as u32).wrapping_add(OFFSET) ^ MASK
}

/// Decode a single encoded index.
pub fn deobfuscate_index(encoded: u32) -> Result<usize, CodecError> {
    (encoded ^ MASK)
        .checked_sub(OFFSET)
        .map(|i| i as usize)
        .ok_or(CodecError::InvalidEncoding(encoded))
}

/// Encode a list of option indices, preserving order.
pub fn obfuscate(indices: &[usize]) -> Vec<u32> {
    indices.iter().copied().map(obfuscate_index).collect()
}

/// Decode a list of encoded indices, preserving order.
pub fn deobfuscate(encoded: &[u32]) -> Result<Vec<usize>, CodecError> {
    encoded.iter().copied().map(deobfuscate_index).collect()
}
