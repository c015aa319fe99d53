//! Authorship commitment.
//!
//! A contributor supplies a one-time secret (the "OTP") when publishing a
//! review. Only `sha256(review_id ‖ hex(sha256(SALT ‖ otp)))` is stored; the
//! OTP itself is dropped. Presenting the same OTP later reproduces the stored
//! signature, which proves authorship without the store ever learning who the
//! author is. A lost OTP cannot be recovered.

use sha2::{Digest, Sha256};

use crate::ContentId;

/// Process-wide salt mixed into every OTP before it touches a review id.
/// Never transmitted or logged.
const SYSTEM_SALT: &str = "SAFC_salt";

/// Compute the 64-hex-character author signature for `review_id`.
pub fn sign(review_id: &ContentId, otp: &str) -> String {
  let mut inner = Sha256::new();
  inner.update(SYSTEM_SALT.as_bytes());
  inner.update(otp.as_bytes());
  let inner = hex::encode(inner.finalize());

  let mut outer = Sha256::new();
  outer.update(review_id.as_str().as_bytes());
  outer.update(inner.as_bytes());
  hex::encode(outer.finalize())
}

/// Whether `otp` reproduces `signature` for `review_id`.
pub fn verify(review_id: &ContentId, otp: &str, signature: &str) -> bool {
  let expected = sign(review_id, otp);
  // Compare without short-circuiting on the first differing byte.
  expected.len() == signature.len()
    && expected
      .bytes()
      .zip(signature.bytes())
      .fold(0u8, |acc, (a, b)| acc | (a ^ b))
      == 0
}
