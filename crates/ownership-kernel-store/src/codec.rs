//! CBOR encoding of stored records.
//!
//! Records are opaque to the database; only index columns are typed.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};

/// Encode a record to CBOR bytes.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

/// Decode a record from CBOR bytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ownership_kernel_core::{Identity, PackageId, PublishReceipt};
    use ownership_kernel_perms::Namespace;

    #[test]
    fn test_namespace_record() {
        let mut receipt = PublishReceipt::new(PackageId::from_bytes([3; 32]));
        let ns = Namespace::create_from_package(&mut receipt, Identity::from_bytes([1; 32])).unwrap();

        let bytes = encode(&ns).unwrap();
        let decoded: Namespace = decode(&bytes).unwrap();
        assert_eq!(decoded, ns);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            decode::<Namespace>(&[0xff, 0x00, 0x13]),
            Err(StoreError::Serialization(_))
        ));
    }
}
