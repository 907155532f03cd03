//! Opaque external identifiers for competition records.
//!
//! A token is the decimal id encoded twice with standard base64, with every
//! `=` removed from the outer layer. Tokens already handed out to clients use
//! this exact format, so [`obfuscate`] must stay bit-for-bit stable.
//!
//! Only the outer layer loses its padding (the inner padding is itself
//! encoded), and the length of an unpadded base64 string fully determines how
//! much padding it had. [`deobfuscate`] therefore decodes the outer layer with
//! the unpadded engine and recovers the original id exactly.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is empty")]
    Empty,

    #[error("token is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("token does not contain a numeric id")]
    NotNumeric,

    #[error("token id has leading zeros")]
    NonCanonical,

    #[error("record id {0} is negative")]
    NegativeId(i64),
}

/// Turns an internal record id into its external token.
pub fn obfuscate(id: u64) -> String {
    let inner = STANDARD.encode(id.to_string());
    let outer = STANDARD.encode(inner);
    outer.replace('=', "")
}

/// Token for a stored record. Stored ids are never negative; one that is
/// points at a corrupt row and has no token.
pub fn record_token(id: i64) -> Result<String, TokenError> {
    u64::try_from(id)
        .map(obfuscate)
        .map_err(|_| TokenError::NegativeId(id))
}

/// Recovers the internal record id from a token produced by [`obfuscate`].
pub fn deobfuscate(token: &str) -> Result<u64, TokenError> {
    let token = token.trim_end_matches('=');
    if token.is_empty() {
        return Err(TokenError::Empty);
    }

    let inner = STANDARD_NO_PAD.decode(token)?;
    let decimal = STANDARD.decode(inner)?;

    let digits = std::str::from_utf8(&decimal)
        .ok()
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .ok_or(TokenError::NotNumeric)?;

    // Only the form `obfuscate` emits is accepted, so each id has one token.
    if digits.len() > 1 && digits.starts_with('0') {
        return Err(TokenError::NonCanonical);
    }

    digits.parse().map_err(|_| TokenError::NotNumeric)
}
