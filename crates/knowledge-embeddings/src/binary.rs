//! Compact binary vector encoding.
//!
//! Vectors are serialized as a sequence of 32-bit floats in little-endian
//! byte order. Used for storing chunk vectors outside the vector index so
//! the index can be rebuilt without re-calling the provider.

use crate::error::EmbeddingError;

/// Encode a vector as little-endian f32 bytes.
pub fn to_binary(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 4);
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Decode a little-endian f32 byte sequence back into a vector.
pub fn from_binary(bytes: &[u8]) -> Result<Vec<f32>, EmbeddingError> {
    if bytes.len() % 4 != 0 {
        return Err(EmbeddingError::Binary(format!(
            "byte length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    let mut out = Vec::with_capacity(bytes.len() / 4);
    for window in bytes.chunks_exact(4) {
        let arr: [u8; 4] = [window[0], window[1], window[2], window[3]];
        out.push(f32::from_le_bytes(arr));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let values = vec![0.0f32, 1.5, -2.25, f32::MIN_POSITIVE, 1234.5678];
        let bytes = to_binary(&values);
        assert_eq!(bytes.len(), values.len() * 4);
        let decoded = from_binary(&bytes).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_empty_vector() {
        let decoded = from_binary(&to_binary(&[])).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_misaligned_input_rejected() {
        assert!(from_binary(&[0u8, 1, 2]).is_err());
    }

    #[test]
    fn test_byte_order_is_little_endian() {
        let bytes = to_binary(&[1.0f32]);
        assert_eq!(bytes, 1.0f32.to_le_bytes().to_vec());
    }
}
