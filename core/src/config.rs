//! Client settings read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `LUMI_API_BASE_URL` | `http://127.0.0.1:8000` |
//! | `LUMI_CALLER_ID` | required |
//! | `LUMI_HTTP_TIMEOUT_SECS` | no timeout |

use std::time::Duration;

use crate::error::{ApiError, ConfigError};
use crate::session::CallerId;
use crate::transport::ReqwestTransport;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

const BASE_URL_VAR: &str = "LUMI_API_BASE_URL";
const CALLER_ID_VAR: &str = "LUMI_CALLER_ID";
const TIMEOUT_VAR: &str = "LUMI_HTTP_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub caller: CallerId,
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, caller: CallerId) -> Self {
        Self {
            base_url: base_url.into(),
            caller,
            timeout: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its
    /// value. Blank values count as unset.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let base_url = get(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: BASE_URL_VAR,
                value: base_url,
            });
        }

        let raw_caller = get(CALLER_ID_VAR).ok_or(ConfigError::Missing(CALLER_ID_VAR))?;
        let caller = raw_caller.parse().map_err(|_| ConfigError::Invalid {
            name: CALLER_ID_VAR,
            value: raw_caller.clone(),
        })?;

        let timeout = match get(TIMEOUT_VAR) {
            None => None,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: TIMEOUT_VAR,
                        value: raw,
                    })
                }
            },
        };

        Ok(Self {
            base_url,
            caller,
            timeout,
        })
    }

    /// The transport these settings describe.
    pub fn transport(&self) -> Result<ReqwestTransport, ApiError> {
        match self.timeout {
            Some(timeout) => ReqwestTransport::with_timeout(timeout),
            None => Ok(ReqwestTransport::new()),
        }
    }
}
