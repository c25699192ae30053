//! Single-use 2FA backup codes.
//!
//! Codes are shown once, in `XXXX-XXXX` form. Only the SHA-256 of the
//! normalized code is stored, so user input is normalized the same way
//! before hashing.

use crate::hashing::sha256_hex;
use crate::page_actions::DownloadFile;
use crate::tokens::{is_alphabet_code, normalize_code, random_code};

/// Codes issued per generation.
pub const BACKUP_CODE_COUNT: usize = 10;

const HALF_LENGTH: usize = 4;

/// Generate a fresh set of display-form codes.
pub fn generate_backup_codes() -> Vec<String> {
    (0..BACKUP_CODE_COUNT)
        .map(|_| {
            format!(
                "{}-{}",
                random_code(HALF_LENGTH),
                random_code(HALF_LENGTH)
            )
        })
        .collect()
}

/// Normalize user input: upper case, separators and whitespace removed.
pub fn normalize_backup_code(input: &str) -> String {
    normalize_code(input)
}

/// Hash stored for a code, taken over its normalized form.
pub fn hash_backup_code(code: &str) -> String {
    sha256_hex(normalize_backup_code(code).as_bytes())
}

/// Whether user input has the shape of a backup code rather than a TOTP code.
pub fn looks_like_backup_code(input: &str) -> bool {
    is_alphabet_code(&normalize_backup_code(input), HALF_LENGTH * 2)
}

/// The `2fa-backup-codes.txt` download for a freshly issued set.
pub fn backup_codes_file(codes: &[String]) -> DownloadFile {
    DownloadFile::backup_codes(codes)
}
