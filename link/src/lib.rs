//! # aceql-link
//!
//! Blocking client for the AceQL HTTP protocol: SQL execution against a
//! remote database through an AceQL server, with session caching, a lazy
//! result cursor and streamed blob transfer.
//!
//! ## Features
//!
//! - **Sessions**: password login, cached session resume, idempotent logout
//! - **Statements**: updates, prepared statements, stored procedures with OUT parameters
//! - **Queries**: gzip-aware result spooling and a random-access [`ResultCursor`]
//! - **Blobs**: streamed upload/download with shared progress and cancellation
//! - **Metadata**: remote table names, table descriptions, schema download
//!
//! ## Example
//!
//! ```rust,no_run
//! use aceql_link::{AceQlClient, StatementParameters};
//!
//! # fn main() -> aceql_link::Result<()> {
//! let client = AceQlClient::builder()
//!     .server_url("http://localhost:9090/aceql")
//!     .build()?;
//!
//! let connection = client.connect("sampledb", "user1", "password1")?;
//!
//! let mut params = StatementParameters::new();
//! params.set(1, "VARCHAR", Some("Smith".to_string()));
//! let rows = connection.execute_update(
//!     "update customer set lname = ? where customer_id = 1",
//!     true,
//!     false,
//!     &params,
//!     None,
//! )?;
//! println!("{} row(s) updated", rows);
//! # Ok(())
//! # }
//! ```

pub mod blob;
pub mod client;
pub mod compression;
pub mod connection;
pub mod cursor;
pub mod envelope;
pub mod error;
pub mod metadata;
pub mod models;
pub mod query;
pub mod session;
pub mod session_store;
pub mod timeouts;
pub mod transport;

pub use blob::BlobTransfer;
pub use client::{AceQlClient, AceQlClientBuilder};
pub use connection::Connection;
pub use cursor::{ColumnRef, ResultCursor};
pub use envelope::ResultEnvelope;
pub use error::{AceQlLinkError, ErrorKind, Result};
pub use metadata::RemoteMetadata;
pub use models::{
    ConnectionOptions, ErrorDetail, Holdability, HttpVersion, OutParameterSlots,
    ParameterDirection, ProxyConfig, ResponseStatus, SqlParameter, StatementParameters,
    TableName, TransactionIsolation, TransferProgress, TransferSnapshot, NULL_MARKER,
};
pub use session::{Session, SessionManager};
pub use session_store::{MemorySessionStore, SessionKey, SessionStore};
pub use timeouts::{AceQlTimeouts, AceQlTimeoutsBuilder};
pub use transport::{HttpReply, HttpStream, HttpTransport, MultipartUpload, Transport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version tag sent to the server at login
pub const CLIENT_VERSION_TAG: &str = concat!("aceql-link v", env!("CARGO_PKG_VERSION"));
