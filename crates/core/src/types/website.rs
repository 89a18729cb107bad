//! Merchant website URL type.

use core::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Errors that can occur when parsing a [`Website`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WebsiteError {
    /// The input string is empty.
    #[error("website cannot be empty")]
    Empty,
    /// The input is not an absolute URL.
    #[error("website is not a valid URL: {0}")]
    Invalid(String),
    /// The URL scheme is not http or https.
    #[error("website must use http or https (got {0})")]
    UnsupportedScheme(String),
    /// The URL has no host.
    #[error("website must include a host")]
    MissingHost,
}

/// An absolute `http`/`https` URL for a merchant's storefront.
///
/// Stored exactly as the merchant typed it (after trimming) so the admin table
/// shows what was submitted.
///
/// ```
/// use rock_skimmer_core::Website;
///
/// assert!(Website::parse("https://a.com").is_ok());
/// assert!(Website::parse("ftp://a.com").is_err());
/// assert!(Website::parse("a.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Website(String);

impl Website {
    /// Maximum stored length.
    pub const MAX_LENGTH: usize = 2048;

    /// Parse a `Website` from user input.
    ///
    /// # Errors
    ///
    /// Returns a [`WebsiteError`] if the input is empty, not a URL, not
    /// http/https, or has no host.
    pub fn parse(s: &str) -> Result<Self, WebsiteError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(WebsiteError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(WebsiteError::Invalid(format!(
                "longer than {} characters",
                Self::MAX_LENGTH
            )));
        }

        let url = Url::parse(s).map_err(|e| WebsiteError::Invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(WebsiteError::UnsupportedScheme(other.to_owned())),
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(WebsiteError::MissingHost);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Website {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Website {
    type Error = WebsiteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Website> for String {
    fn from(website: Website) -> Self {
        website.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Website {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Website {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Website {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
