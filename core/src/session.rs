//! Caller identity sent with authenticated requests.
//!
//! The server accepts `Authorization: Bearer <numeric user id>`. That is a
//! placeholder scheme, not a real credential, so the id is always supplied
//! by configuration and never defaulted in code.

use std::fmt;
use std::str::FromStr;

/// Numeric identity of the end user on whose behalf requests are made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallerId(i64);

impl CallerId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// The `(name, value)` header pair carrying this identity.
    pub fn authorization(self) -> (String, String) {
        ("authorization".to_string(), format!("Bearer {}", self.0))
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CallerId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}
