//! Time-based one-time passwords (RFC 6238) for two-factor login.
//!
//! Codes are six digits over a 30 second step, computed with HMAC-SHA256.
//! Verification accepts one step of clock skew in either direction.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::error::CoreError;

type HmacSha256 = Hmac<Sha256>;

/// Number of digits in a code.
pub const TOTP_DIGITS: u32 = 6;

/// Step length in seconds.
pub const TOTP_STEP_SECS: i64 = 30;

/// Accepted clock skew, in steps.
pub const TOTP_SKEW_STEPS: i64 = 1;

/// Length of a generated shared secret in bytes.
pub const SECRET_LENGTH: usize = 20;

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Generate a random shared secret.
pub fn generate_secret() -> Vec<u8> {
    let mut secret = vec![0u8; SECRET_LENGTH];
    rand::rng().fill_bytes(&mut secret);
    secret
}

/// Compute the code for the step containing `unix_secs`.
pub fn code_at(secret: &[u8], unix_secs: i64) -> String {
    code_for_counter(secret, unix_secs.div_euclid(TOTP_STEP_SECS))
}

fn code_for_counter(secret: &[u8], counter: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(&(counter as u64).to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = (u32::from(digest[offset] & 0x7f) << 24)
        | (u32::from(digest[offset + 1]) << 16)
        | (u32::from(digest[offset + 2]) << 8)
        | u32::from(digest[offset + 3]);

    let code = binary % 10u32.pow(TOTP_DIGITS);
    format!("{code:0width$}", width = TOTP_DIGITS as usize)
}

/// Check a user-entered code against the secret at `unix_secs`.
pub fn verify_code(secret: &[u8], code: &str, unix_secs: i64) -> bool {
    let code = code.trim();
    if code.len() != TOTP_DIGITS as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let counter = unix_secs.div_euclid(TOTP_STEP_SECS);
    (-TOTP_SKEW_STEPS..=TOTP_SKEW_STEPS).any(|delta| code_for_counter(secret, counter + delta) == code)
}

/// Build the `otpauth://` URI that authenticator apps import (usually via QR).
pub fn provisioning_uri(issuer: &str, account: &str, secret: &[u8]) -> String {
    format!(
        "otpauth://totp/{}:{}?secret={}&issuer={}&algorithm=SHA256&digits={TOTP_DIGITS}&period={TOTP_STEP_SECS}",
        percent_encode(issuer),
        percent_encode(account),
        encode_base32(secret),
        percent_encode(issuer),
    )
}

/// RFC 4648 base32 without padding.
pub fn encode_base32(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for &byte in bytes {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

/// Decode RFC 4648 base32; padding and case are ignored.
pub fn decode_base32(input: &str) -> Result<Vec<u8>, CoreError> {
    let mut out = Vec::with_capacity(input.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for ch in input.trim_end_matches('=').chars() {
        let upper = ch.to_ascii_uppercase() as u8;
        let value = BASE32_ALPHABET
            .iter()
            .position(|&c| c == upper)
            .ok_or_else(|| CoreError::Validation(format!("Invalid base32 character '{ch}'")))?;
        buffer = (buffer << 5) | value as u32;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xff) as u8);
        }
    }
    Ok(out)
}

fn percent_encode(input: &str) -> String {
    input
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                (b as char).to_string()
            }
            other => format!("%{other:02X}"),
        })
        .collect()
}
