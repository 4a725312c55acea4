//! Participant pseudonymization
//!
//! Derives stable, non-reversible integer pseudonyms from admin-provided
//! participant codes via HMAC-SHA256. Only the pseudonym reaches logs and
//! exports; the raw code stays in memory.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Default pseudonym width in bits. 63 bits fit safely in a signed BIGINT.
pub const DEFAULT_PSEUDONYM_BITS: u32 = 63;

/// Default namespace mixed into the HMAC message. Prevents collisions when
/// the same code/key pair is reused across applications.
pub const DEFAULT_NAMESPACE: &str = "tachylog:v1";

/// Derive a stable, non-reversible pseudonym from a participant code.
///
/// - Deterministic: same code + same key -> same pseudonym
/// - Non-reversible: the code cannot be recovered without the key
/// - Uniform over `0..2^bits` for a well-formed key
///
/// An empty code is permitted and simply hashes the namespace alone.
pub fn pseudonymize(code: &str, key: &[u8], bits: u32, namespace: &str) -> u64 {
    let bits = bits.clamp(1, 63);

    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(namespace.as_bytes());
    mac.update(b":");
    mac.update(code.as_bytes());
    let digest = mac.finalize().into_bytes();

    // Interpret the digest as a big-endian unsigned integer and keep the low
    // `bits` bits, i.e. the trailing bytes of the digest.
    let tail: [u8; 8] = digest[digest.len() - 8..]
        .try_into()
        .expect("SHA-256 digest is 32 bytes");
    u64::from_be_bytes(tail) & ((1u64 << bits) - 1)
}

/// [`pseudonymize`] with the default bit width and namespace.
pub fn pseudonymize_default(code: &str, key: &[u8]) -> u64 {
    pseudonymize(code, key, DEFAULT_PSEUDONYM_BITS, DEFAULT_NAMESPACE)
}
