//! Cookie records for the token store.
//!
//! Tokens are kept the way the dashboard kept them in the browser: one cookie
//! per token, `name=value; path=/; expires=<HTTP date>`.

use chrono::{DateTime, Duration, Utc};

/// Cookie name for the access token (short-lived).
pub const ACCESS_COOKIE_NAME: &str = "accessToken";

/// Cookie name for the refresh token (long-lived).
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Default cookie lifetime in days when a token is written.
pub const DEFAULT_COOKIE_DAYS: i64 = 1;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// 9999-12-31T23:59:59Z
const LATEST_EXPIRY_SECS: i64 = 253_402_300_799;

fn latest_expiry() -> DateTime<Utc> {
    DateTime::from_timestamp(LATEST_EXPIRY_SECS, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// A single stored cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCookie {
    pub name: String,
    pub value: String,
    pub expires: DateTime<Utc>,
}

impl TokenCookie {
    /// Build a cookie expiring `days` after `now`. Non-positive `days` yields
    /// a cookie that is already expired. Expiry never goes past the last
    /// four-digit-year HTTP date.
    pub fn new(name: &str, value: &str, days: i64, now: DateTime<Utc>) -> Self {
        let latest = latest_expiry();
        let expires = match Duration::try_days(days).and_then(|lifetime| now.checked_add_signed(lifetime)) {
            Some(at) => at.min(latest),
            None if days < 0 => now,
            None => latest,
        };

        Self {
            name: name.to_string(),
            value: value.to_string(),
            expires,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }

    /// Render as a `Set-Cookie`-style line.
    pub fn to_line(&self) -> String {
        format!(
            "{}={}; path=/; expires={}",
            self.name,
            self.value,
            format_http_date(self.expires)
        )
    }

    /// Parse a line produced by [`TokenCookie::to_line`].
    /// Returns `None` for lines without a name or a readable `expires` attribute.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut parts = line.split(';');
        let (name, value) = parts.next()?.trim().split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut expires = None;
        for attr in parts {
            if let Some((key, raw)) = attr.trim().split_once('=') {
                if key.trim().eq_ignore_ascii_case("expires") {
                    expires = parse_http_date(raw.trim());
                }
            }
        }

        Some(Self {
            name: name.to_string(),
            value: value.trim().to_string(),
            expires: expires?,
        })
    }
}

/// Format a timestamp as an HTTP date (`Tue, 20 Oct 2026 08:00:00 GMT`).
pub fn format_http_date(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE_FORMAT).to_string()
}

fn parse_http_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}
