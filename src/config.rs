//! Client configuration.

use std::time::Duration;

use crate::endpoint::{PageOrigin, DEFAULT_ENDPOINT_PATH};

/// Default capacity of the bounded transport event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Color used when the user leaves the color input blank.
pub const DEFAULT_COLOR: &str = "#4a90e2";

/// Configuration for a [`SessionController`](crate::controller::SessionController).
///
/// # Example
///
/// ```
/// use groupchat_client::config::ChatConfig;
/// use groupchat_client::endpoint::PageOrigin;
///
/// let config = ChatConfig::new(PageOrigin::new(true, "chat.example.com"));
/// assert_eq!(config.endpoint_url(), "wss://chat.example.com/ws");
/// ```
///
/// # Tuning
///
/// ```
/// use groupchat_client::config::ChatConfig;
/// use std::time::Duration;
///
/// let config = ChatConfig::default()
///     .with_event_channel_capacity(512)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// assert_eq!(config.event_channel_capacity, 512);
/// ```
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Origin of the hosting page; the socket is opened on the same host.
    pub origin: PageOrigin,
    /// Path of the chat socket. Defaults to `/ws`.
    pub endpoint_path: String,
    /// Color announced when the user leaves the color blank.
    pub default_color: String,
    /// Capacity of the bounded event channel between the session task and
    /// the controller.
    ///
    /// A full channel applies backpressure to the session task; events are
    /// never dropped or reordered.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    pub event_channel_capacity: usize,
    /// Timeout for the graceful shutdown.
    ///
    /// Defaults to **1 second**. A zero timeout aborts the session task
    /// immediately.
    pub shutdown_timeout: Duration,
}

impl ChatConfig {
    /// Create a configuration for `origin` with default values.
    pub fn new(origin: PageOrigin) -> Self {
        Self {
            origin,
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            default_color: DEFAULT_COLOR.to_string(),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Set the socket path.
    #[must_use]
    pub fn with_endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = path.into();
        self
    }

    /// Set the fallback color.
    #[must_use]
    pub fn with_default_color(mut self, color: impl Into<String>) -> Self {
        self.default_color = color.into();
        self
    }

    /// Set the capacity of the bounded event channel.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Set the timeout for the graceful shutdown.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// The socket URL derived from the origin and path.
    pub fn endpoint_url(&self) -> String {
        self.origin.endpoint_url(&self.endpoint_path)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new(PageOrigin::default())
    }
}
