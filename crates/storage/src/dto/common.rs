use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 9;

/// Offset-based window over a filtered result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageWindow {
    /// Builds a window from raw query values. Anything that is not a positive
    /// integer falls back to the default.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: parse_positive(page).unwrap_or(DEFAULT_PAGE),
            limit: parse_positive(limit).unwrap_or(DEFAULT_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        (u64::from(self.page) - 1) * u64::from(self.limit)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.limit)
    }

    /// Offset as bound to SQL `BIGINT`, saturating at `i64::MAX`. A window that
    /// far out is simply past the end of any result set.
    pub fn sql_offset(&self) -> i64 {
        i64::try_from(self.offset()).unwrap_or(i64::MAX)
    }

    pub fn sql_limit(&self) -> i64 {
        i64::try_from(self.limit()).unwrap_or(i64::MAX)
    }
}

/// Parses a strictly positive integer, `None` for anything else.
pub fn parse_positive<T>(raw: Option<&str>) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + From<u8>,
{
    raw.map(str::trim)
        .and_then(|s| s.parse::<T>().ok())
        .filter(|n| *n >= T::from(1))
}

/// Uniform response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct Envelope<T> {
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn new(status: u16, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status,
            message: message.into(),
            data,
        }
    }
}
