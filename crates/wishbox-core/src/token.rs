use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;

/// Random URL-safe token built from `nbytes` bytes of OS randomness.
///
/// Used for public reveal tokens and card share slugs, where the token is
/// the only credential.
pub fn generate_token(nbytes: usize) -> String {
    let mut bytes = vec![0u8; nbytes];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
