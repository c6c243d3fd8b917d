use rand::{Rng, rng};

const RUNES_ALPHA_NUMBER: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
// ICE credentials may also carry '+' and '/' (RFC 8839 ice-char)
const RUNES_ICE_CHAR: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+/";

/// math_rand_alpha_number generates a mathematical random alphabet and number sequence of the requested length.
pub fn math_rand_alpha_number(n: usize) -> String {
    generate_crypto_random_string(n, RUNES_ALPHA_NUMBER)
}

/// rand_ice_chars generates a random string usable as an ICE ufrag or password.
pub fn rand_ice_chars(n: usize) -> String {
    generate_crypto_random_string(n, RUNES_ICE_CHAR)
}

/// rand_session_id generates the numeric session id carried on the SDP origin line.
///
/// The top bit is cleared so the value also fits a signed 64-bit integer, which
/// some peers assume.
pub fn rand_session_id() -> u64 {
    rng().random::<u64>() & (u64::MAX >> 1)
}

pub fn generate_crypto_random_string(n: usize, runes: &[u8]) -> String {
    let mut rng = rng();

    let rand_string: String = (0..n)
        .map(|_| {
            let idx = rng.random_range(0..runes.len());
            runes[idx] as char
        })
        .collect();

    rand_string
}
