//! Hub join-code generation and validation.
//!
//! Join codes are 6-character human-shareable strings drawn from a 32-symbol
//! alphabet that excludes visually ambiguous characters (0/O, 1/I). Family
//! members type these by hand, often from a phone screen held across a room.

use rand::Rng;

/// The code alphabet: uppercase letters and digits minus 0, O, 1, I.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a hub join code.
pub const CODE_LENGTH: usize = 6;

lazy_static::lazy_static! {
    static ref CODE_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-HJ-NP-Z2-9]{6}$").unwrap();
}

/// Generates a random 6-character join code.
pub fn generate_join_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Returns true if the input is a well-formed join code.
pub fn is_valid_join_code(code: &str) -> bool {
    CODE_REGEX.is_match(code)
}

/// Normalizes user input into join-code form: uppercased, with whitespace
/// stripped. Does not validate; callers follow up with [`is_valid_join_code`].
pub fn normalize_join_code(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
