//! Endpoint URL derivation.
//!
//! The chat socket lives on the same host as the page that hosts the client,
//! and its scheme mirrors the page's transport security: `https` pages use
//! `wss`, everything else uses `ws`.

use std::fmt;

use crate::error::{ChatError, Result};

/// Well-known path of the chat socket.
pub const DEFAULT_ENDPOINT_PATH: &str = "/ws";

/// The origin of the hosting page: its security and `host[:port]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOrigin {
    secure: bool,
    host: String,
}

impl PageOrigin {
    /// Create an origin from already-validated parts.
    pub fn new(secure: bool, host: impl Into<String>) -> Self {
        Self {
            secure,
            host: host.into(),
        }
    }

    /// Parse an origin such as `https://chat.example.com` or
    /// `http://localhost:8000/index.html`. Anything after the host is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidOrigin`] for schemes other than `http` and
    /// `https`, or when the host is empty.
    pub fn parse(origin: &str) -> Result<Self> {
        let origin = origin.trim();
        let (secure, rest) = if let Some(rest) = origin.strip_prefix("https://") {
            (true, rest)
        } else if let Some(rest) = origin.strip_prefix("http://") {
            (false, rest)
        } else {
            return Err(ChatError::InvalidOrigin(origin.to_owned()));
        };

        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        if host.is_empty() {
            return Err(ChatError::InvalidOrigin(origin.to_owned()));
        }
        Ok(Self::new(secure, host))
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// The socket URL for `path` on this origin.
    pub fn endpoint_url(&self, path: &str) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        if path.starts_with('/') {
            format!("{scheme}://{}{path}", self.host)
        } else {
            format!("{scheme}://{}/{path}", self.host)
        }
    }
}

impl Default for PageOrigin {
    fn default() -> Self {
        Self::new(false, "localhost:8000")
    }
}

impl fmt::Display for PageOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.secure { "https" } else { "http" };
        write!(f, "{scheme}://{}", self.host)
    }
}
