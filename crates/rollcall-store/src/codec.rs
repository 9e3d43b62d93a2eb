//! Fixed-width binary signature codec.
//!
//! Signatures are stored as a little-endian f64 blob, 8 bytes per
//! dimension. Read-back must reconstruct the original vector to full
//! floating-point precision — distance computation runs on exactly the
//! values that were enrolled.

use crate::StoreError;
use rollcall_core::Signature;

pub fn encode_signature(signature: &Signature) -> Vec<u8> {
    let mut blob = Vec::with_capacity(signature.dim() * 8);
    for v in &signature.values {
        blob.extend_from_slice(&v.to_le_bytes());
    }
    blob
}

pub fn decode_signature(blob: &[u8]) -> Result<Signature, StoreError> {
    if blob.len() % 8 != 0 {
        return Err(StoreError::CorruptSignature { len: blob.len() });
    }
    let values = blob
        .chunks_exact(8)
        .map(|c| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(c);
            f64::from_le_bytes(bytes)
        })
        .collect();
    Ok(Signature::new(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_exact() {
        let original = Signature::new(vec![
            0.0,
            -1.0,
            1.0 / 3.0,
            f64::MIN_POSITIVE,
            123456.789012345,
            -0.6,
        ]);
        let decoded = decode_signature(&encode_signature(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn round_trip_128_dims() {
        let original = Signature::new((0..128).map(|i| (i as f64) * 0.017 - 1.0).collect());
        let blob = encode_signature(&original);
        assert_eq!(blob.len(), 128 * 8);
        assert_eq!(decode_signature(&blob).unwrap(), original);
    }

    #[test]
    fn truncated_blob_is_corrupt() {
        let blob = encode_signature(&Signature::new(vec![1.0, 2.0]));
        assert!(matches!(
            decode_signature(&blob[..blob.len() - 3]),
            Err(StoreError::CorruptSignature { len: 13 })
        ));
    }

    #[test]
    fn empty_blob_decodes_to_empty_signature() {
        assert_eq!(decode_signature(&[]).unwrap().dim(), 0);
    }
}
