//! Fedora persistent identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// URI prefix for Fedora objects.
pub const FEDORA_URI_PREFIX: &str = "info:fedora/";

const MAX_PID_LEN: usize = 64;

/// Error returned when a string is not a valid pid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid pid '{pid}': {reason}")]
pub struct PidError {
    pub pid: String,
    pub reason: &'static str,
}

/// A Fedora persistent identifier of the form `namespace:id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pid(String);

impl Pid {
    /// Parse and validate a pid.
    pub fn parse(s: &str) -> Result<Self, PidError> {
        let invalid = |reason| PidError {
            pid: s.to_string(),
            reason,
        };

        if s.len() > MAX_PID_LEN {
            return Err(invalid("longer than 64 characters"));
        }
        let (namespace, id) = s.split_once(':').ok_or_else(|| invalid("missing ':'"))?;
        if namespace.is_empty() {
            return Err(invalid("empty namespace"));
        }
        if !namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        {
            return Err(invalid("namespace may only contain letters, digits, '-' and '.'"));
        }
        if id.is_empty() {
            return Err(invalid("empty object id"));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '~' | '_' | '%'))
        {
            return Err(invalid("object id contains an invalid character"));
        }
        Ok(Pid(s.to_string()))
    }

    /// Parse a pid from an `info:fedora/` URI (a bare pid is accepted too).
    pub fn from_uri(uri: &str) -> Result<Self, PidError> {
        Self::parse(uri.strip_prefix(FEDORA_URI_PREFIX).unwrap_or(uri))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace portion of the pid.
    pub fn namespace(&self) -> &str {
        self.0.split_once(':').map(|(ns, _)| ns).unwrap_or("")
    }

    /// The `info:fedora/` URI for this pid.
    pub fn uri(&self) -> String {
        format!("{}{}", FEDORA_URI_PREFIX, self.0)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Pid {
    type Err = PidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pid::parse(s)
    }
}

impl TryFrom<String> for Pid {
    type Error = PidError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Pid::parse(&s)
    }
}

impl From<Pid> for String {
    fn from(pid: Pid) -> Self {
        pid.0
    }
}

impl AsRef<str> for Pid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
