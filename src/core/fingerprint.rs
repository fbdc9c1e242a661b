//! Content fingerprinting for duplicate detection.
//!
//! A fingerprint is a SHA-256 digest over the tuple (text, voice label,
//! style, output format). Two conversion requests with the same fingerprint
//! are semantically identical, so an existing audio file can be reused
//! instead of calling the synthesis service again.
//!
//! The encoding is field-tagged and length-prefixed, which makes it
//! unambiguous: no combination of field values can collide with a different
//! combination that happens to concatenate to the same bytes. The encoding
//! is frozen; changing it would invalidate every fingerprint already stored
//! in history databases.

use sha2::{Digest, Sha256};

/// Hashes one field as `tag || len(value) || value`.
fn update_field(hasher: &mut Sha256, tag: &str, value: &str) {
    hasher.update(tag.as_bytes());
    hasher.update((value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}

/// Computes the fingerprint for a conversion request.
///
/// Returns a lowercase hex digest. Deterministic across runs and processes:
/// identical inputs always yield the identical digest, and changing any one
/// field changes it.
pub fn compute(text: &str, voice_label: &str, style: &str, output_format: &str) -> String {
    let mut hasher = Sha256::new();
    update_field(&mut hasher, "text", text);
    update_field(&mut hasher, "voice", voice_label);
    update_field(&mut hasher, "style", style);
    update_field(&mut hasher, "format", output_format);
    format!("{:x}", hasher.finalize())
}
