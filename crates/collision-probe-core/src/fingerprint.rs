//! Fingerprint reduction.
//!
//! Digests serialized feature bytes with MD5 and truncates the hex render to
//! a fixed-length fingerprint, the identity used for collision detection.
//! Truncating to 18 of 32 hex characters (72 bits) keeps the registry small
//! while leaving the birthday bound far beyond practical run lengths.

use md5::{Digest, Md5};

use crate::error::{ProbeError, ProbeResult};

/// Reduce a byte sequence to a fingerprint of `len` hex characters.
///
/// Deterministic: identical inputs always produce identical fingerprints.
/// Fails with [`ProbeError::IncompleteHash`] if the rendered digest is
/// shorter than `len`.
pub fn reduce(bytes: &[u8], len: usize) -> ProbeResult<String> {
    let rendered = format!("{:x}", Md5::digest(bytes));
    truncate_digest(rendered, len)
}

/// Truncate a rendered digest to `len` characters.
///
/// Split out from [`reduce`] so the defect path is testable without a
/// misbehaving digest function.
fn truncate_digest(mut rendered: String, len: usize) -> ProbeResult<String> {
    if rendered.len() < len {
        return Err(ProbeError::IncompleteHash {
            length: rendered.len(),
            digest: rendered,
        });
    }
    rendered.truncate(len);
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============ Reduction ============

    #[test]
    fn test_reduce_is_deterministic() {
        let bytes = b"collision-probe";
        let a = reduce(bytes, 18).unwrap();
        let b = reduce(bytes, 18).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reduce_known_vector() {
        // MD5("") = d41d8cd98f00b204e9800998ecf8427e
        let fp = reduce(b"", 18).unwrap();
        assert_eq!(fp, "d41d8cd98f00b204e9");
    }

    #[test]
    fn test_reduce_output_length_and_charset() {
        let fp = reduce(b"some feature bytes", 18).unwrap();
        assert_eq!(fp.len(), 18);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_distinct_inputs_distinct_fingerprints() {
        let a = reduce(b"feature a", 18).unwrap();
        let b = reduce(b"feature b", 18).unwrap();
        assert_ne!(a, b);
    }

    // ============ Truncation defect path ============

    #[test]
    fn test_truncate_rejects_short_render() {
        let err = truncate_digest("abcdef".to_string(), 18).unwrap_err();
        match err {
            ProbeError::IncompleteHash { digest, length } => {
                assert_eq!(digest, "abcdef");
                assert_eq!(length, 6);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_truncate_exact_boundary() {
        let eighteen = "a".repeat(18);
        assert_eq!(truncate_digest(eighteen.clone(), 18).unwrap(), eighteen);
    }
}
