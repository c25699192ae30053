//! Random human-readable codes.
//!
//! Invite codes and 2FA backup codes are read aloud on the phone and typed
//! from paper, so they avoid look-alike characters (`0/O`, `1/I`).

use rand::Rng;

/// Upper-case letters and digits without `0`, `1`, `I`, `O`.
pub const UNAMBIGUOUS_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate a random code of `len` characters from [`UNAMBIGUOUS_ALPHABET`].
pub fn random_code(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| {
            let idx = rng.random_range(0..UNAMBIGUOUS_ALPHABET.len());
            UNAMBIGUOUS_ALPHABET[idx] as char
        })
        .collect()
}

/// Upper-case a user-entered code and drop separators and whitespace.
pub fn normalize_code(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Return `true` if every character is in [`UNAMBIGUOUS_ALPHABET`].
pub fn is_alphabet_code(code: &str, len: usize) -> bool {
    code.len() == len && code.bytes().all(|b| UNAMBIGUOUS_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_code_uses_alphabet() {
        let code = random_code(32);
        assert!(is_alphabet_code(&code, 32));
    }

    #[test]
    fn normalize_strips_separators() {
        assert_eq!(normalize_code(" ab cd-ef23 "), "ABCDEF23");
    }

    #[test]
    fn ambiguous_characters_rejected() {
        assert!(!is_alphabet_code("ABCD0EFG", 8));
        assert!(!is_alphabet_code("ABC", 8));
    }
}
