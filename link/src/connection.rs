//! Per-connection command invoker.
//!
//! Every call builds `<server>/session/<sid>/connection/<cid>/<action>`,
//! sends it through the [`Transport`] and decodes the envelope. Property
//! actions are GETs with the argument as an extra path segment; anything
//! carrying SQL, bound values or blob ids is a form POST.

use crate::{
    blob::BlobTransfer,
    cursor::ResultCursor,
    envelope::ResultEnvelope,
    error::{AceQlLinkError, Result},
    metadata::RemoteMetadata,
    models::{ConnectionOptions, Holdability, OutParameterSlots, StatementParameters, TransactionIsolation},
    query::{build_statement_params, reconcile_out_parameters, update_action},
    session::{Session, SessionManager},
    transport::{HttpStream, Transport},
    CLIENT_VERSION_TAG,
};
use log::{debug, trace, warn};
use std::time::Instant;

/// GET `action[/param]` and decode. A FAIL envelope is a `ServerError`.
pub(crate) fn get_action(
    transport: &dyn Transport,
    session: &Session,
    action: &str,
    param: Option<&str>,
) -> Result<ResultEnvelope> {
    let url = session.action_url(action, param)?;
    let reply = transport.get(&url)?;
    ResultEnvelope::from_reply(&reply).into_result()
}

/// POST form `params` to `action` and decode. A FAIL envelope is a `ServerError`.
pub(crate) fn post_action(
    transport: &dyn Transport,
    session: &Session,
    action: &str,
    params: &[(String, String)],
) -> Result<ResultEnvelope> {
    let url = session.action_url(action, None)?;
    let reply = transport.post_form(&url, params)?;
    ResultEnvelope::from_reply(&reply).into_result()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Open,
    Closed,
    LoggedOut,
}

/// One server-side connection under an authenticated session.
///
/// Not synchronized: drive a connection from one thread at a time and use
/// [`clone_connection`](Self::clone_connection) for concurrent work.
pub struct Connection {
    manager: SessionManager,
    session: Session,
    options: ConnectionOptions,
    state: ConnectionState,
}

impl Connection {
    pub(crate) fn new(manager: SessionManager, session: Session, options: ConnectionOptions) -> Self {
        Self {
            manager,
            session,
            options,
            state: ConnectionState::Open,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// True once [`close`](Self::close) or [`logout`](Self::logout) ran.
    pub fn is_closed(&self) -> bool {
        self.state != ConnectionState::Open
    }

    fn transport(&self) -> &dyn Transport {
        self.manager.transport().as_ref()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(AceQlLinkError::ClosedResource("Connection".to_string()));
        }
        Ok(())
    }

    /// Call a property action that returns nothing.
    pub fn invoke_no_result(&self, action: &str, param: Option<&str>) -> Result<()> {
        self.ensure_open()?;
        get_action(self.transport(), &self.session, action, param)?;
        Ok(())
    }

    /// Call a property action and return its `result` field.
    pub fn invoke_with_result(&self, action: &str, param: Option<&str>) -> Result<String> {
        self.ensure_open()?;
        get_action(self.transport(), &self.session, action, param)?
            .result()
            .ok_or_else(|| {
                AceQlLinkError::protocol(format!("AceQL Server returned no result for {}", action))
            })
    }

    /// Version string of the remote AceQL server.
    pub fn server_version(&self) -> Result<String> {
        self.invoke_with_result("get_version", None)
    }

    /// Version tag this client sends at login.
    pub fn client_version(&self) -> &'static str {
        CLIENT_VERSION_TAG
    }

    pub fn commit(&self) -> Result<()> {
        self.invoke_no_result("commit", None)
    }

    pub fn rollback(&self) -> Result<()> {
        self.invoke_no_result("rollback", None)
    }

    pub fn set_auto_commit(&self, auto_commit: bool) -> Result<()> {
        self.invoke_no_result("set_auto_commit", Some(&auto_commit.to_string()))
    }

    pub fn auto_commit(&self) -> Result<bool> {
        parse_bool(&self.invoke_with_result("get_auto_commit", None)?)
    }

    pub fn set_read_only(&self, read_only: bool) -> Result<()> {
        self.invoke_no_result("set_read_only", Some(&read_only.to_string()))
    }

    pub fn is_read_only(&self) -> Result<bool> {
        parse_bool(&self.invoke_with_result("is_read_only", None)?)
    }

    pub fn set_holdability(&self, holdability: Holdability) -> Result<()> {
        self.invoke_no_result("set_holdability", Some(holdability.as_str()))
    }

    pub fn holdability(&self) -> Result<Holdability> {
        Holdability::parse(&self.invoke_with_result("get_holdability", None)?)
    }

    pub fn set_transaction_isolation(&self, level: TransactionIsolation) -> Result<()> {
        self.invoke_no_result("set_transaction_isolation_level", Some(level.as_str()))
    }

    pub fn transaction_isolation(&self) -> Result<TransactionIsolation> {
        TransactionIsolation::parse(
            &self.invoke_with_result("get_transaction_isolation_level", None)?,
        )
    }

    /// Open a sibling connection under the same session id.
    pub fn clone_connection(&self) -> Result<Connection> {
        self.ensure_open()?;
        let session = self.manager.resume(
            &self.session.server_url,
            &self.session.database,
            &self.session.username,
            &self.session.session_id,
        )?;
        Ok(Connection::new(
            self.manager.clone(),
            session,
            self.options.clone(),
        ))
    }

    /// Release the server-side connection. The session stays cached.
    ///
    /// Only the first call reaches the server.
    pub fn close(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.state = ConnectionState::Closed;
        get_action(self.transport(), &self.session, "close", None)?;
        debug!("[ACEQL_LOGIN] Connection {} closed", self.session.connection_id);
        Ok(())
    }

    /// End the session: drop the cache entry, then log out on the server.
    ///
    /// Only the first call reaches the server.
    pub fn logout(&mut self) -> Result<()> {
        if self.state == ConnectionState::LoggedOut {
            return Ok(());
        }
        self.state = ConnectionState::LoggedOut;
        self.manager.logout(&self.session)
    }

    /// Run an INSERT/UPDATE/DELETE/DDL statement or a stored procedure.
    ///
    /// For stored procedures, OUT values are copied into `out_parameters`.
    /// Returns the row count, 0 for statements without one.
    pub fn execute_update(
        &self,
        sql: &str,
        is_prepared: bool,
        is_stored_procedure: bool,
        parameters: &StatementParameters,
        out_parameters: Option<&mut OutParameterSlots>,
    ) -> Result<i64> {
        self.ensure_open()?;
        require_sql(sql)?;
        log_statement(sql, &self.options);

        let start = Instant::now();
        let form = build_statement_params(sql, is_prepared, is_stored_procedure, parameters, None);
        let envelope = post_action(
            self.transport(),
            &self.session,
            update_action(is_stored_procedure),
            &form,
        )?;

        if is_stored_procedure {
            if let Some(slots) = out_parameters {
                reconcile_out_parameters(&envelope.out_parameters_per_index(), slots)?;
            }
        }

        let row_count = envelope.int_value("row_count").unwrap_or(0);
        debug!(
            "[ACEQL_QUERY] Update done: rows={} duration_ms={}",
            row_count,
            start.elapsed().as_millis()
        );
        Ok(row_count)
    }

    /// Run a query and return the raw, possibly gzipped, payload stream.
    ///
    /// The stream is not decoded here; see [`ResultCursor::from_http_stream`].
    pub fn execute_query(
        &self,
        sql: &str,
        is_prepared: bool,
        is_stored_procedure: bool,
        parameters: &StatementParameters,
    ) -> Result<HttpStream> {
        self.ensure_open()?;
        require_sql(sql)?;
        log_statement(sql, &self.options);

        let form = build_statement_params(
            sql,
            is_prepared,
            is_stored_procedure,
            parameters,
            Some(self.options.gzip_result),
        );
        let url = self.session.action_url("execute_query", None)?;
        let stream = self.transport().post_form_stream(&url, &form)?;
        if !stream.is_success() {
            warn!("[ACEQL_QUERY] Query returned status={}", stream.status_code);
        }
        Ok(stream)
    }

    /// Run a query and open a cursor over its result.
    pub fn execute_query_cursor(
        &self,
        sql: &str,
        is_prepared: bool,
        is_stored_procedure: bool,
        parameters: &StatementParameters,
    ) -> Result<ResultCursor> {
        let start = Instant::now();
        let stream = self.execute_query(sql, is_prepared, is_stored_procedure, parameters)?;
        let cursor = ResultCursor::from_http_stream(stream)?;
        debug!(
            "[ACEQL_QUERY] Query done: rows={} total_ms={}",
            cursor.row_count(),
            start.elapsed().as_millis()
        );
        Ok(cursor)
    }

    /// Blob upload/download on this connection.
    pub fn blob(&self) -> Result<BlobTransfer<'_>> {
        self.ensure_open()?;
        Ok(BlobTransfer::new(self.transport(), &self.session))
    }

    /// Remote metadata queries on this connection.
    pub fn metadata(&self) -> Result<RemoteMetadata<'_>> {
        self.ensure_open()?;
        Ok(RemoteMetadata::new(self.transport(), &self.session))
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("session", &self.session)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

fn require_sql(sql: &str) -> Result<()> {
    if sql.trim().is_empty() {
        return Err(AceQlLinkError::configuration("sql is required"));
    }
    Ok(())
}

fn log_statement(sql: &str, options: &ConnectionOptions) {
    let preview: String = sql.chars().take(80).collect();
    debug!(
        "[ACEQL_QUERY] Starting statement: \"{}{}\" (len={})",
        preview.replace('\n', " "),
        if preview.len() < sql.len() { "..." } else { "" },
        sql.len()
    );
    if options.trace_on {
        trace!("[ACEQL_QUERY] sql: {}", sql);
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim() {
        v if v.eq_ignore_ascii_case("true") => Ok(true),
        v if v.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(AceQlLinkError::protocol(format!(
            "Expected a boolean, AceQL Server returned '{}'",
            other
        ))),
    }
}
