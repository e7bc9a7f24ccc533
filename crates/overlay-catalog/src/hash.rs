#![deny(unsafe_code)]

use std::path::Path;

use sha2::Digest;

use crate::error::CatalogError;

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(sha2::Sha256::digest(bytes))
}

/// Check file bytes against an optional manifest pin.
pub fn verify_pin(path: &Path, bytes: &[u8], pin: Option<&str>) -> Result<(), CatalogError> {
    let Some(expected) = pin else {
        return Ok(());
    };
    let expected = expected.to_ascii_lowercase();
    let actual = sha256_hex(bytes);
    if actual != expected {
        return Err(CatalogError::Sha256Mismatch {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_known_input() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn pin_check_is_case_insensitive() {
        let path = Path::new("catalog.json");
        let pin = "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD";
        assert!(verify_pin(path, b"abc", Some(pin)).is_ok());
        assert!(verify_pin(path, b"abc", None).is_ok());
        assert!(matches!(
            verify_pin(path, b"abd", Some(pin)),
            Err(CatalogError::Sha256Mismatch { .. })
        ));
    }
}
