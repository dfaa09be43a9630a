use rand::Rng;

pub const JOIN_CODE_LEN: usize = 6;
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random class join code drawn from `A-Z0-9`.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..JOIN_CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Canonical form used for lookups. Codes are stored upper-case.
pub fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
