//! Timeout configuration for AceQL client operations.
//!
//! Timeouts are read once, when the HTTP transport is built. A zero
//! duration means "wait forever".

use std::time::Duration;

/// Timeout configuration for AceQL client operations.
///
/// # Examples
///
/// ```rust
/// use aceql_link::AceQlTimeouts;
/// use std::time::Duration;
///
/// // No timeouts at all
/// let timeouts = AceQlTimeouts::default();
///
/// // Custom timeouts for high-latency environments
/// let timeouts = AceQlTimeouts::builder()
///     .connect_timeout(Duration::from_secs(60))
///     .read_timeout(Duration::from_secs(120))
///     .build();
///
/// // Aggressive timeouts for local development
/// let timeouts = AceQlTimeouts::fast();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AceQlTimeouts {
    /// Timeout for opening the communications link (TCP + TLS handshake).
    /// Default: 0 (infinite)
    pub connect_timeout: Duration,

    /// Timeout for reading the response once the request is sent.
    /// Default: 0 (infinite)
    pub read_timeout: Duration,
}

impl Default for AceQlTimeouts {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::ZERO,
            read_timeout: Duration::ZERO,
        }
    }
}

impl AceQlTimeouts {
    /// Create a new builder for custom timeout configuration.
    pub fn builder() -> AceQlTimeoutsBuilder {
        AceQlTimeoutsBuilder::new()
    }

    /// Shorter timeouts suitable for localhost servers.
    pub fn fast() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            read_timeout: Duration::from_secs(10),
        }
    }

    /// Longer timeouts suitable for remote servers and large result sets.
    pub fn relaxed() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(300),
        }
    }

    /// Build from millisecond values, 0 meaning infinite.
    pub fn from_millis(connect_timeout_ms: u64, read_timeout_ms: u64) -> Self {
        Self {
            connect_timeout: Duration::from_millis(connect_timeout_ms),
            read_timeout: Duration::from_millis(read_timeout_ms),
        }
    }

    /// Check if a duration represents "no timeout" (zero or very large).
    pub fn is_no_timeout(duration: Duration) -> bool {
        duration.is_zero() || duration > Duration::from_secs(86400 * 365) // > 1 year
    }

    /// The duration to hand to the HTTP layer, `None` when infinite.
    pub(crate) fn effective(duration: Duration) -> Option<Duration> {
        if Self::is_no_timeout(duration) {
            None
        } else {
            Some(duration)
        }
    }
}

/// Builder for creating custom [`AceQlTimeouts`] configurations.
#[derive(Debug, Clone)]
pub struct AceQlTimeoutsBuilder {
    timeouts: AceQlTimeouts,
}

impl AceQlTimeoutsBuilder {
    fn new() -> Self {
        Self {
            timeouts: AceQlTimeouts::default(),
        }
    }

    /// Set the connect timeout. Zero means infinite.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connect_timeout = timeout;
        self
    }

    /// Set the connect timeout in milliseconds.
    pub fn connect_timeout_ms(self, ms: u64) -> Self {
        self.connect_timeout(Duration::from_millis(ms))
    }

    /// Set the read timeout. Zero means infinite.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.read_timeout = timeout;
        self
    }

    /// Set the read timeout in milliseconds.
    pub fn read_timeout_ms(self, ms: u64) -> Self {
        self.read_timeout(Duration::from_millis(ms))
    }

    /// Build the timeout configuration.
    pub fn build(self) -> AceQlTimeouts {
        self.timeouts
    }
}
