// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding blob codec and cosine similarity.
//!
//! Blobs are raw little-endian `f32` components with no header, so the
//! dimensionality is implied by the blob length.

use recall_core::RecallError;

/// Serialize a vector for the `embedding` column. Empty vectors store as NULL.
pub fn encode(vector: &[f32]) -> Option<Vec<u8>> {
    if vector.is_empty() {
        return None;
    }
    Some(vector.iter().flat_map(|v| v.to_le_bytes()).collect())
}

/// Inverse of [`encode`]; bit-exact.
pub fn decode(bytes: &[u8]) -> Result<Vec<f32>, RecallError> {
    if bytes.len() % 4 != 0 {
        return Err(RecallError::InvalidEncoding(format!(
            "embedding blob length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Cosine similarity in f64.
///
/// Returns 0.0 for mismatched lengths, empty input, or an all-zero operand.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_vector_encodes_to_none() {
        assert_eq!(encode(&[]), None);
    }

    #[test]
    fn encode_is_little_endian() {
        let bytes = encode(&[1.0]).unwrap();
        assert_eq!(bytes, 1.0f32.to_le_bytes().to_vec());
    }

    #[test]
    fn decode_rejects_ragged_length() {
        let err = decode(&[0, 0, 128]).unwrap_err();
        assert!(matches!(err, RecallError::InvalidEncoding(_)));
    }

    #[test]
    fn decode_empty_is_empty() {
        assert!(decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-12);
        assert!((cosine_similarity(&[1.0, 1.0], &[-1.0, -1.0]) + 1.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn encode_decode_is_bit_exact(bits in proptest::collection::vec(any::<u32>(), 1..64)) {
            let v: Vec<f32> = bits.iter().map(|b| f32::from_bits(*b)).collect();
            let back = decode(&encode(&v).unwrap()).unwrap();
            let back_bits: Vec<u32> = back.iter().map(|f| f.to_bits()).collect();
            prop_assert_eq!(back_bits, bits);
        }

        #[test]
        fn decode_fails_off_multiple_of_four(len in 0usize..64) {
            prop_assume!(len % 4 != 0);
            prop_assert!(decode(&vec![0u8; len]).is_err());
        }

        #[test]
        fn cosine_is_symmetric(
            a in proptest::collection::vec(-100.0f32..100.0, 1..16),
            b in proptest::collection::vec(-100.0f32..100.0, 1..16),
        ) {
            prop_assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
        }

        #[test]
        fn self_similarity_is_one(v in proptest::collection::vec(-100.0f32..100.0, 1..16)) {
            prop_assume!(v.iter().any(|x| *x != 0.0));
            prop_assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
        }
    }
}
