/*
 * Provides digest helpers for signing certificates. Packages report their
 * certificates as base64-encoded DER blobs; the detail view shows the SHA-256
 * fingerprint of each, formatted the way `apksigner` and `keytool` print them.
 */
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

/*
 * Calculates the SHA-256 digest of `bytes` and returns it as lower-case hex.
 */
pub fn calculate_sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let hash_bytes = hasher.finalize();
    format!("{:x}", hash_bytes)
}

/*
 * Formats a hex digest as colon-separated upper-case byte pairs
 * ("AB:CD:..."). An odd trailing nibble is kept as its own group.
 */
pub fn format_fingerprint(hex_digest: &str) -> String {
    hex_digest
        .as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).to_uppercase())
        .collect::<Vec<_>>()
        .join(":")
}

/*
 * Decodes a base64 certificate and returns its raw DER bytes.
 * Surrounding whitespace and embedded line breaks are ignored.
 */
pub fn decode_certificate(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    log::trace!(
        "ChecksumUtils: Decoding certificate of {} base64 characters.",
        compact.len()
    );
    STANDARD.decode(compact.as_bytes())
}
