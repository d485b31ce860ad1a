//! Webhook signature verification.
//!
//! Callers sign the raw request body with HMAC-SHA256 using the shared
//! `ORDINALS_SECRET` and send the result in the `ordinals-sig` header as
//! `sha256=<hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "ordinals-sig";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Compute the `ordinals-sig` header value for a body.
pub fn compute_signature(raw_body: &[u8], secret: &[u8]) -> String {
    // HMAC accepts keys of any length, so this cannot fail.
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(raw_body);
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes()))
}

/// Verify an `ordinals-sig` header against the raw body.
///
/// # Arguments
///
/// * `signature` - The header value, if the request carried one
/// * `raw_body` - The exact bytes received, before any JSON parsing
/// * `secret` - The shared signing secret
///
/// # Returns
///
/// `true` only if the header is present and byte-for-byte equal to the
/// expected digest. Missing or malformed headers are `false`, never a panic.
pub fn verify_signature(signature: Option<&str>, raw_body: &[u8], secret: &[u8]) -> bool {
    let signature = match signature {
        Some(s) => s,
        None => {
            warn!("signature_missing");
            return false;
        }
    };

    let expected = compute_signature(raw_body, secret);
    let valid = constant_time_compare(expected.as_bytes(), signature.as_bytes());

    if !valid {
        warn!(
            expected_length = expected.len(),
            actual_length = signature.len(),
            "signature_mismatch"
        );
    }

    valid
}

/// Constant-time byte comparison to prevent timing attacks.
///
/// `subtle` keeps the optimizer from turning the comparison back into an
/// early-exit loop, so timing does not depend on the first differing byte.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}
