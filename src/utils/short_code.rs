//! Deterministic short code derivation.

use sha1::{Digest, Sha1};

/// Number of hex characters kept from the digest.
pub const SHORT_CODE_LENGTH: usize = 8;

/// Derives the short code for an original URL.
///
/// The code is the first [`SHORT_CODE_LENGTH`] hex characters of the SHA-1
/// digest of the URL exactly as submitted, so the same URL always maps to the
/// same code. Two different URLs may collide; the store's unique constraint on
/// `short_code` catches that.
///
/// # Examples
///
/// ```
/// use shorty::utils::short_code::short_code_for;
///
/// assert_eq!(short_code_for("https://example.com/a"), "c4ed1c21");
/// ```
pub fn short_code_for(original_url: &str) -> String {
    let digest = Sha1::digest(original_url.as_bytes());
    let mut code = hex::encode(digest);
    code.truncate(SHORT_CODE_LENGTH);
    code
}
