//! Remote database metadata.

use crate::{
    connection::{get_action, post_action},
    envelope::ResultEnvelope,
    error::{AceQlLinkError, Result},
    models::{TableName, TableNamesPayload},
    session::Session,
    transport::{drain_into, Transport},
};
use serde_json::{Map, Value as JsonValue};
use std::io::{Read, Write};

/// Formats accepted by `db_schema_download`.
pub const SCHEMA_FORMATS: [&str; 2] = ["html", "text"];

/// Metadata queries bound to one open connection.
pub struct RemoteMetadata<'a> {
    transport: &'a dyn Transport,
    session: &'a Session,
}

impl<'a> RemoteMetadata<'a> {
    pub(crate) fn new(transport: &'a dyn Transport, session: &'a Session) -> Self {
        Self { transport, session }
    }

    /// JDBC-style database metadata as returned by the server.
    pub fn db_metadata(&self) -> Result<Map<String, JsonValue>> {
        let envelope = get_action(
            self.transport,
            self.session,
            "metadata_query/get_db_metadata",
            None,
        )?;
        Ok(into_document(envelope))
    }

    /// Tables of the remote database, optionally filtered by type
    /// (`TABLE`, `VIEW`, ...).
    pub fn table_names(&self, table_type: Option<&str>) -> Result<Vec<TableName>> {
        let mut params = Vec::new();
        if let Some(table_type) = table_type {
            params.push(("table_type".to_string(), table_type.to_string()));
        }
        let envelope = post_action(
            self.transport,
            self.session,
            "metadata_query/get_table_names",
            &params,
        )?;
        let payload: TableNamesPayload =
            serde_json::from_value(JsonValue::Object(into_document(envelope)))?;
        Ok(payload.table_names)
    }

    /// Column, key and index description of one table.
    pub fn table(&self, table_name: &str) -> Result<Map<String, JsonValue>> {
        if table_name.is_empty() {
            return Err(AceQlLinkError::configuration("table_name is required"));
        }
        let params = vec![("table_name".to_string(), table_name.to_string())];
        let envelope = post_action(
            self.transport,
            self.session,
            "metadata_query/get_table",
            &params,
        )?;
        Ok(into_document(envelope))
    }

    /// Stream the schema description, `html` by default.
    pub fn db_schema_download(
        &self,
        format: Option<&str>,
        table_name: Option<&str>,
    ) -> Result<Box<dyn Read + Send>> {
        let format = format.unwrap_or("html");
        if !SCHEMA_FORMATS.contains(&format) {
            return Err(AceQlLinkError::configuration(format!(
                "Invalid format value. Must be \"html\" or \"text\". is: {}",
                format
            )));
        }

        let mut params = vec![("format".to_string(), format.to_string())];
        if let Some(table_name) = table_name {
            params.push(("table_name".to_string(), table_name.to_lowercase()));
        }

        let url = self
            .session
            .action_url("metadata_query/db_schema_download", None)?;
        let stream = self.transport.post_form_stream(&url, &params)?;
        if !stream.is_success() {
            let reply = stream.into_reply()?;
            return Err(ResultEnvelope::failure_of(&reply));
        }
        Ok(stream.reader)
    }

    /// Drain [`db_schema_download`](Self::db_schema_download) into `writer`.
    pub fn db_schema_download_to<W: Write + ?Sized>(
        &self,
        writer: &mut W,
        format: Option<&str>,
        table_name: Option<&str>,
    ) -> Result<u64> {
        let mut reader = self.db_schema_download(format, table_name)?;
        drain_into(&mut reader, writer)
    }
}

fn into_document(envelope: ResultEnvelope) -> Map<String, JsonValue> {
    let mut document = envelope.document().cloned().unwrap_or_default();
    document.remove("status");
    document
}
