//! Data models for the aceql-link client library.
//!
//! Configuration values, wire enums and the shared transfer state.

pub mod connection_options;
pub mod error_detail;
pub mod http_version;
pub mod proxy_config;
pub mod response_status;
pub mod sql_parameter;
pub mod table_name;
pub mod transaction;
pub mod transfer_progress;


pub use connection_options::ConnectionOptions;
pub use error_detail::ErrorDetail;
pub use http_version::HttpVersion;
pub use proxy_config::ProxyConfig;
pub use response_status::ResponseStatus;
pub use sql_parameter::{
    OutParameterSlots, ParameterDirection, SqlParameter, StatementParameters, NULL_MARKER,
};
pub use table_name::TableName;
pub(crate) use table_name::TableNamesPayload;
pub use transaction::{Holdability, TransactionIsolation};
pub use transfer_progress::{TransferProgress, TransferSnapshot};
