//! Display name entry validation.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Shortest accepted display name, in characters.
pub const MIN_NAME_CHARS: usize = 2;

/// Longest accepted display name, in characters.
pub const MAX_NAME_CHARS: usize = 50;

/// Why a display name was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// Nothing but whitespace.
    #[error("please enter your full name")]
    Empty,

    /// Fewer than [`MIN_NAME_CHARS`] characters.
    #[error("name must be at least {MIN_NAME_CHARS} characters long")]
    TooShort,

    /// More than [`MAX_NAME_CHARS`] characters.
    #[error("name must be at most {MAX_NAME_CHARS} characters long")]
    TooLong,

    /// Contains something other than letters, spaces, hyphens, and
    /// apostrophes.
    #[error("name can only contain letters, spaces, hyphens, and apostrophes (found {0:?})")]
    InvalidCharacter(char),
}

/// A validated, trimmed display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate `raw` after trimming surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(NameError::Empty);
        }

        let length = name.chars().count();
        if length < MIN_NAME_CHARS {
            return Err(NameError::TooShort);
        }
        if length > MAX_NAME_CHARS {
            return Err(NameError::TooLong);
        }

        if let Some(bad) = name.chars().find(|&c| !is_name_char(c)) {
            return Err(NameError::InvalidCharacter(bad));
        }

        Ok(Self(name.to_owned()))
    }

    /// The name as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c.is_whitespace() || c == '-' || c == '\''
}

impl FromStr for DisplayName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
