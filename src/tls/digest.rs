//! SHA-256 digests in the canonical pin encoding.
//!
//! Pins are compared as strings, so the encoding here is the single source
//! of truth: standard base64 alphabet with `=` padding, no line wrapping.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Raw SHA-256 output.
pub type Sha256Hash = [u8; 32];

/// Length of a base64-encoded SHA-256 digest, padding included.
pub const DIGEST_BASE64_LEN: usize = 44;

/// SHA-256 over `bytes`.
pub fn sha256(bytes: &[u8]) -> Sha256Hash {
    boring::sha::sha256(bytes)
}

/// SHA-256 over `bytes`, encoded as standard padded base64.
pub fn digest(bytes: &[u8]) -> String {
    STANDARD.encode(sha256(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_known_vector() {
        // sha256("") = e3b0c442...b855
        assert_eq!(digest(b""), "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=");
    }

    #[test]
    fn test_abc_known_vector() {
        assert_eq!(digest(b"abc"), "ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0=");
    }

    #[test]
    fn test_length_and_padding() {
        for input in [&b""[..], b"a", b"hello world", &[0u8; 4096][..]] {
            let d = digest(input);
            assert_eq!(d.len(), DIGEST_BASE64_LEN);
            assert!(d.ends_with('='));
            assert!(!d.ends_with("=="));
        }
    }

    #[test]
    fn test_decodes_to_raw_hash() {
        let input = b"certificate bytes";
        let decoded = STANDARD.decode(digest(input)).unwrap();
        assert_eq!(decoded.as_slice(), &sha256(input)[..]);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(digest(b"same"), digest(b"same"));
        assert_ne!(digest(b"same"), digest(b"Same"));
    }
}
