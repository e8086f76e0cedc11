//! Main AceQL client with builder pattern.
//!
//! The client owns every piece of configuration (server URL, timeouts,
//! proxy, connection options, session cache). Nothing is process-global:
//! two clients in one process can use different proxies or timeouts.

use crate::{
    connection::Connection,
    error::{AceQlLinkError, Result},
    models::{ConnectionOptions, HttpVersion, ProxyConfig},
    session::SessionManager,
    session_store::{MemorySessionStore, SessionStore},
    timeouts::AceQlTimeouts,
    transport::{HttpTransport, Transport},
};
use std::sync::Arc;
use url::Url;

/// Main AceQL client.
///
/// Use [`AceQlClientBuilder`] to construct instances with custom configuration.
/// Cloning is cheap; clones share the transport and session cache.
///
/// # Examples
///
/// ```rust,no_run
/// use aceql_link::{AceQlClient, AceQlTimeouts, StatementParameters};
///
/// # fn example() -> aceql_link::Result<()> {
/// let client = AceQlClient::builder()
///     .server_url("http://localhost:9090/aceql")
///     .timeouts(AceQlTimeouts::relaxed())
///     .build()?;
///
/// let mut connection = client.connect("sampledb", "user1", "password1")?;
/// let mut cursor = connection.execute_query_cursor(
///     "select * from customer",
///     false,
///     false,
///     &StatementParameters::new(),
/// )?;
/// while cursor.next()? {
///     println!("{:?}", cursor.get_string("fname")?);
/// }
/// cursor.close();
/// connection.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AceQlClient {
    server_url: String,
    manager: SessionManager,
    timeouts: AceQlTimeouts,
    proxy: Option<ProxyConfig>,
    options: ConnectionOptions,
}

impl AceQlClient {
    /// Create a new builder for configuring the client
    pub fn builder() -> AceQlClientBuilder {
        AceQlClientBuilder::new()
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn timeouts(&self) -> &AceQlTimeouts {
        &self.timeouts
    }

    pub fn proxy(&self) -> Option<&ProxyConfig> {
        self.proxy.as_ref()
    }

    pub fn connection_options(&self) -> &ConnectionOptions {
        &self.options
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        self.manager.store()
    }

    /// Log in (or resume a cached session) and open a connection.
    pub fn connect(&self, database: &str, username: &str, password: &str) -> Result<Connection> {
        let session = self
            .manager
            .login(&self.server_url, database, username, password)?;
        Ok(Connection::new(
            self.manager.clone(),
            session,
            self.options.clone(),
        ))
    }

    /// Open a connection on a session id obtained elsewhere.
    ///
    /// The session cache is neither read nor written.
    pub fn connect_with_session_id(
        &self,
        database: &str,
        username: &str,
        session_id: &str,
    ) -> Result<Connection> {
        let session = self
            .manager
            .resume(&self.server_url, database, username, session_id)?;
        Ok(Connection::new(
            self.manager.clone(),
            session,
            self.options.clone(),
        ))
    }
}

impl std::fmt::Debug for AceQlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AceQlClient")
            .field("server_url", &self.server_url)
            .field("timeouts", &self.timeouts)
            .field("proxy", &self.proxy)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Builder for configuring [`AceQlClient`] instances.
pub struct AceQlClientBuilder {
    server_url: Option<String>,
    timeouts: AceQlTimeouts,
    proxy: Option<ProxyConfig>,
    connection_options: ConnectionOptions,
    session_store: Option<Arc<dyn SessionStore>>,
    transport: Option<Arc<dyn Transport>>,
}

impl AceQlClientBuilder {
    fn new() -> Self {
        Self {
            server_url: None,
            timeouts: AceQlTimeouts::default(),
            proxy: None,
            connection_options: ConnectionOptions::default(),
            session_store: None,
            transport: None,
        }
    }

    /// Set the AceQL servlet URL, e.g. `http://localhost:9090/aceql`
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Set connect and read timeouts
    ///
    /// # Example
    ///
    /// ```rust
    /// use aceql_link::{AceQlClient, AceQlTimeouts};
    ///
    /// # fn example() -> aceql_link::Result<()> {
    /// let client = AceQlClient::builder()
    ///     .server_url("http://localhost:9090/aceql")
    ///     .timeouts(AceQlTimeouts::fast())
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn timeouts(mut self, timeouts: AceQlTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Route every request through an HTTP proxy
    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn connection_options(mut self, options: ConnectionOptions) -> Self {
        self.connection_options = options;
        self
    }

    /// Shorthand for setting just the HTTP version
    pub fn http_version(mut self, version: HttpVersion) -> Self {
        self.connection_options.http_version = version;
        self
    }

    /// Ask the server to gzip query results (default: true)
    pub fn gzip_result(mut self, gzip_result: bool) -> Self {
        self.connection_options.gzip_result = gzip_result;
        self
    }

    /// Log request parameters and response bodies at trace level
    pub fn trace_on(mut self, trace_on: bool) -> Self {
        self.connection_options.trace_on = trace_on;
        self
    }

    /// Share a session cache between clients, or plug in another backend
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Replace the HTTP transport. Timeouts and proxy are then ignored.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<AceQlClient> {
        let server_url = self
            .server_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AceQlLinkError::configuration("server_url is required"))?;

        let parsed = Url::parse(&server_url).map_err(|e| {
            AceQlLinkError::configuration(format!("Invalid server_url '{}': {}", server_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AceQlLinkError::configuration(format!(
                "server_url must use http or https: {}",
                server_url
            )));
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(
                &self.timeouts,
                self.proxy.as_ref(),
                &self.connection_options,
            )?),
        };
        let store = self
            .session_store
            .unwrap_or_else(|| Arc::new(MemorySessionStore::new()));

        log::debug!(
            "[ACEQL_HTTP] Client built for {} (http={:?} gzip={})",
            server_url,
            self.connection_options.http_version,
            self.connection_options.gzip_result
        );

        Ok(AceQlClient {
            server_url,
            manager: SessionManager::new(transport, store),
            timeouts: self.timeouts,
            proxy: self.proxy,
            options: self.connection_options,
        })
    }
}
