//! Boolean flags are persisted as the literal strings `"0"` and `"1"` to stay
//! compatible with existing rows. The rest of the crate only sees `bool`.

use crate::error::StorageError;

pub const TRUE: &str = "1";
pub const FALSE: &str = "0";

pub fn encode(value: bool) -> &'static str {
    if value { TRUE } else { FALSE }
}

pub fn decode(column: &str, raw: &str) -> Result<bool, StorageError> {
    match raw.trim() {
        TRUE => Ok(true),
        FALSE => Ok(false),
        other => Err(StorageError::InvalidRecord(format!(
            "column {column} holds {other:?}, expected \"0\" or \"1\""
        ))),
    }
}

/// Lenient parse used for query parameters: anything other than "0"/"1" is
/// treated as absent.
pub fn parse_query(raw: Option<&str>) -> Option<bool> {
    match raw.map(str::trim) {
        Some(TRUE) => Some(true),
        Some(FALSE) => Some(false),
        _ => None,
    }
}
