//! Session data and the login/resume/logout protocol.
//!
//! A [`Session`] is born either from a password login or from resuming a
//! cached session id with `get_connection`. The session id stays stable
//! across reconnects; only the connection id changes.

use crate::{
    envelope::ResultEnvelope,
    error::{AceQlLinkError, Result},
    session_store::{SessionKey, SessionStore},
    transport::Transport,
    CLIENT_VERSION_TAG,
};
use log::{debug, warn};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Instant;
use url::Url;

/// An authenticated session bound to one server-side connection.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub server_url: String,
    pub database: String,
    pub username: String,
    pub session_id: String,
    pub connection_id: String,
}

impl Session {
    /// Cache key of this session.
    pub fn key(&self) -> SessionKey {
        SessionKey::new(&self.server_url, &self.username, &self.database)
    }

    /// URL of a per-connection action:
    /// `<server>/session/<sid>/connection/<cid>/<action>[/<param>]`.
    ///
    /// `action` may itself contain `/` separated segments
    /// (`metadata_query/get_table`). Every segment is percent-encoded.
    pub fn action_url(&self, action: &str, param: Option<&str>) -> Result<String> {
        let mut segments = vec![
            "session",
            self.session_id.as_str(),
            "connection",
            self.connection_id.as_str(),
        ];
        segments.extend(action.split('/').filter(|s| !s.is_empty()));
        if let Some(param) = param {
            segments.push(param);
        }
        build_url(&self.server_url, &segments)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("server_url", &self.server_url)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("session_id", &"***")
            .field("connection_id", &self.connection_id)
            .finish()
    }
}

/// Append percent-encoded path segments to `base`.
pub(crate) fn build_url(base: &str, segments: &[&str]) -> Result<String> {
    let mut url = Url::parse(base)?;
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            AceQlLinkError::configuration(format!("Server URL cannot be a base: {}", base))
        })?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url.into())
}

/// Performs login, resume and logout against one server.
///
/// Clones share the transport, the cache and the set of ended sessions.
#[derive(Clone)]
pub struct SessionManager {
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
    // (server_url, session_id) of sessions already logged out
    ended: Arc<RwLock<HashSet<(String, String)>>>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            transport,
            store,
            ended: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Open a session, reusing a cached session id when one exists.
    ///
    /// A cached session the server no longer accepts is dropped from the
    /// cache and replaced by a fresh password login. Nothing is cached when
    /// the login fails.
    pub fn login(
        &self,
        server_url: &str,
        database: &str,
        username: &str,
        password: &str,
    ) -> Result<Session> {
        require("server_url", server_url)?;
        require("database", database)?;
        require("username", username)?;

        let key = SessionKey::new(server_url, username, database);
        if let Some(session_id) = self.store.get(&key) {
            debug!("[ACEQL_LOGIN] Cached session found for {}", key);
            match self.resume(server_url, database, username, &session_id) {
                Ok(session) => return Ok(session),
                Err(e @ AceQlLinkError::ServerError { .. }) => {
                    warn!(
                        "[ACEQL_LOGIN] Cached session rejected for {}, logging in again: {}",
                        key, e
                    );
                    self.store.remove(&key);
                },
                Err(e) => return Err(e),
            }
        }

        let session = self.password_login(server_url, database, username, password)?;
        if let Ok(mut ended) = self.ended.write() {
            ended.remove(&(session.server_url.clone(), session.session_id.clone()));
        }
        self.store.set(key, session.session_id.clone());
        Ok(session)
    }

    fn password_login(
        &self,
        server_url: &str,
        database: &str,
        username: &str,
        password: &str,
    ) -> Result<Session> {
        let url = build_url(server_url, &["database", database, "username", username, "login"])?;
        let params = vec![
            ("password".to_string(), password.to_string()),
            ("client_version".to_string(), CLIENT_VERSION_TAG.to_string()),
        ];

        let start = Instant::now();
        debug!("[ACEQL_LOGIN] Authenticating user '{}' on database '{}'", username, database);
        let reply = self.transport.post_form(&url, &params)?;
        let envelope = ResultEnvelope::from_reply(&reply);

        if let Some(error) = envelope.error_detail() {
            debug!(
                "[ACEQL_LOGIN] Login rejected: status={} message=\"{}\"",
                reply.status_code, error.error_message
            );
            return Err(AceQlLinkError::AuthenticationError {
                message: error.error_message.clone(),
                error_type: error.error_type,
                stack_trace: error.stack_trace.clone(),
                http_status_code: reply.status_code,
            });
        }

        let session_id = required_field(&envelope, "session_id")?;
        let connection_id = required_field(&envelope, "connection_id")?;
        debug!(
            "[ACEQL_LOGIN] Authenticated user '{}' in {:?}",
            username,
            start.elapsed()
        );

        Ok(Session {
            server_url: server_url.to_string(),
            database: database.to_string(),
            username: username.to_string(),
            session_id,
            connection_id,
        })
    }

    /// Attach to an existing session id with a fresh connection id.
    ///
    /// The cache is not consulted or modified.
    pub fn resume(
        &self,
        server_url: &str,
        database: &str,
        username: &str,
        session_id: &str,
    ) -> Result<Session> {
        require("server_url", server_url)?;
        require("session_id", session_id)?;

        let url = build_url(server_url, &["session", session_id, "get_connection"])?;
        let reply = self.transport.get(&url)?;
        let envelope = ResultEnvelope::from_reply(&reply).into_result()?;
        let connection_id = required_field(&envelope, "connection_id")?;
        debug!("[ACEQL_LOGIN] Resumed session for user '{}'", username);

        Ok(Session {
            server_url: server_url.to_string(),
            database: database.to_string(),
            username: username.to_string(),
            session_id: session_id.to_string(),
            connection_id,
        })
    }

    /// Drop the cache entry, then end the session on the server.
    ///
    /// The local removal happens even when the server call fails. Only the
    /// first logout of a session reaches the server; later calls return `Ok`.
    pub fn logout(&self, session: &Session) -> Result<()> {
        let first = self
            .ended
            .write()
            .map(|mut ended| {
                ended.insert((session.server_url.clone(), session.session_id.clone()))
            })
            .unwrap_or(true);
        if !first {
            debug!("[ACEQL_LOGIN] Session of user '{}' already logged out", session.username);
            return Ok(());
        }

        self.store.remove(&session.key());
        let url = session.action_url("logout", None)?;
        let reply = self.transport.get(&url)?;
        ResultEnvelope::from_reply(&reply).into_result()?;
        debug!("[ACEQL_LOGIN] Logged out user '{}'", session.username);
        Ok(())
    }
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AceQlLinkError::configuration(format!("{} is required", name)));
    }
    Ok(())
}

fn required_field(envelope: &ResultEnvelope, field: &str) -> Result<String> {
    envelope
        .value(field)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AceQlLinkError::protocol(format!("AceQL Server response has no {}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            server_url: "http://localhost:9090/aceql".into(),
            database: "sampledb".into(),
            username: "alice".into(),
            session_id: "s1".into(),
            connection_id: "c1".into(),
        }
    }

    #[test]
    fn test_action_url() {
        let url = session().action_url("get_version", None).unwrap();
        assert_eq!(
            url,
            "http://localhost:9090/aceql/session/s1/connection/c1/get_version"
        );
    }

    #[test]
    fn test_action_url_with_param_and_nested_action() {
        let s = session();
        assert_eq!(
            s.action_url("set_auto_commit", Some("false")).unwrap(),
            "http://localhost:9090/aceql/session/s1/connection/c1/set_auto_commit/false"
        );
        assert_eq!(
            s.action_url("metadata_query/get_table", None).unwrap(),
            "http://localhost:9090/aceql/session/s1/connection/c1/metadata_query/get_table"
        );
    }

    #[test]
    fn test_build_url_encodes_segments_and_trailing_slash() {
        let url = build_url(
            "http://localhost:9090/aceql/",
            &["database", "my db", "username", "a/b", "login"],
        )
        .unwrap();
        assert_eq!(
            url,
            "http://localhost:9090/aceql/database/my%20db/username/a%2Fb/login"
        );
    }

    #[test]
    fn test_build_url_rejects_malformed_base() {
        let err = build_url("not a url", &["x"]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Transport);
    }

    #[test]
    fn test_debug_masks_session_id() {
        let rendered = format!("{:?}", session());
        assert!(!rendered.contains("\"s1\""));
        assert!(rendered.contains("c1"));
    }

    #[test]
    fn test_key() {
        let key = session().key();
        assert_eq!(key.username, "alice");
        assert_eq!(key.database, "sampledb");
    }
}
