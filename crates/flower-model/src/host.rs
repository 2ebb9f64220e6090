use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Base URL of one upstream Flower instance (e.g. `http://flower:5555`).
///
/// Trailing slashes are stripped at construction, so [`Host::endpoint`] never produces `//api`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Host(String);

impl Host {
    pub fn new(url: impl Into<String>) -> Result<Self, ModelError> {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/');

        if trimmed.is_empty() {
            return Err(ModelError::EmptyHost);
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ModelError::InvalidScheme(url));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join an API path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.0, path)
        } else {
            format!("{}/{}", self.0, path)
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Host {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Host::new(s)
    }
}

impl TryFrom<String> for Host {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Host::new(value)
    }
}

impl From<Host> for String {
    fn from(host: Host) -> Self {
        host.0
    }
}

impl AsRef<str> for Host {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
