//! Statement execution, stored procedures and connection properties.

mod common;

use aceql_link::{
    AceQlLinkError, ErrorKind, Holdability, SqlParameter, StatementParameters,
    TransactionIsolation,
};
use common::*;

#[test]
fn test_execute_update_sends_statement_form() {
    let (transport, connection) = connected();
    transport.reply_ok(r#"{"status":"OK","row_count":3}"#);

    let mut params = StatementParameters::new();
    params
        .set(1, "VARCHAR", Some("Smith".to_string()))
        .set(2, "INTEGER", None);

    let rows = connection
        .execute_update(
            "update customer set lname = ? where customer_id = ?",
            true,
            false,
            &params,
            None,
        )
        .unwrap();
    assert_eq!(rows, 3);

    let request = transport.last_request();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.action(), "execute_update");
    assert_eq!(request.param("prepared_statement"), Some("true"));
    assert_eq!(request.param("stored_procedure"), Some("false"));
    assert_eq!(request.param("param_type_1"), Some("VARCHAR"));
    assert_eq!(request.param("param_value_1"), Some("Smith"));
    assert_eq!(request.param("param_value_2"), Some("NULL"));
    assert_eq!(request.param("param_direction_1"), None);
    assert_eq!(request.param("gzip_result"), None);
}

#[test]
fn test_execute_update_without_row_count_returns_zero() {
    let (transport, connection) = connected();
    transport.reply_ok(OK);

    let rows = connection
        .execute_update("create table t (id int)", false, false, &StatementParameters::new(), None)
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn test_execute_update_server_error_carries_details() {
    let (transport, connection) = connected();
    transport.reply(
        br#"{"status":"FAIL","error_type":1,"error_message":"Table not found","stack_trace":"java.sql.SQLException"}"#
            .to_vec(),
        400,
        "Bad Request",
    );

    let err = connection
        .execute_update("delete from nope", false, false, &StatementParameters::new(), None)
        .unwrap_err();
    match &err {
        AceQlLinkError::ServerError {
            message,
            error_type,
            http_status_code,
            ..
        } => {
            assert_eq!(message, "Table not found");
            assert_eq!(*error_type, 1);
            assert_eq!(*http_status_code, 400);
        },
        other => panic!("expected server error, got {:?}", other),
    }
    assert_eq!(err.stack_trace(), Some("java.sql.SQLException"));
}

#[test]
fn test_empty_sql_is_rejected_locally() {
    let (transport, connection) = connected();
    let err = connection
        .execute_update("   ", false, false, &StatementParameters::new(), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(transport.request_count(), 1);
}

#[test]
fn test_stored_procedure_fills_out_parameters() {
    let (transport, connection) = connected();
    transport.reply_ok(
        r#"{"status":"OK","parameters_out_per_index":{"2":"42","3":"NULL"},"parameters_out_per_name":{"total":"42"},"row_count":0}"#,
    );

    let mut params = StatementParameters::new();
    params
        .set(1, "INTEGER", Some("7".to_string()))
        .set_parameter(SqlParameter::out(2, "INTEGER"))
        .set_parameter(SqlParameter::out(3, "VARCHAR"));
    let mut slots = params.out_slots();

    connection
        .execute_update("{call sp_total(?, ?, ?)}", true, true, &params, Some(&mut slots))
        .unwrap();

    assert_eq!(slots[&2].value.as_deref(), Some("42"));
    assert_eq!(slots[&3].value, None);

    let request = transport.last_request();
    assert_eq!(request.action(), "execute");
    assert_eq!(request.param("stored_procedure"), Some("true"));
    assert_eq!(request.param("param_direction_1"), Some("in"));
    assert_eq!(request.param("param_direction_2"), Some("out"));
}

#[test]
fn test_stored_procedure_without_out_values_fails_with_type_4() {
    let (transport, connection) = connected();
    transport.reply_ok(r#"{"status":"OK","row_count":0}"#);

    let mut params = StatementParameters::new();
    params.set_parameter(SqlParameter::out(1, "INTEGER"));
    let mut slots = params.out_slots();

    let err = connection
        .execute_update("{call sp_count(?)}", true, true, &params, Some(&mut slots))
        .unwrap_err();
    match err {
        AceQlLinkError::ProtocolError {
            message,
            error_type,
        } => {
            assert_eq!(error_type, 4);
            assert_eq!(
                message,
                "No stored procedure out parameters returned by AceQL Server"
            );
        },
        other => panic!("expected protocol error, got {:?}", other),
    }
}

#[test]
fn test_stored_procedure_missing_one_slot_fails() {
    let (transport, connection) = connected();
    transport.reply_ok(r#"{"status":"OK","parameters_out_per_index":{"1":"5"}}"#);

    let mut params = StatementParameters::new();
    params
        .set_parameter(SqlParameter::out(1, "INTEGER"))
        .set_parameter(SqlParameter::out(2, "INTEGER"));
    let mut slots = params.out_slots();

    let err = connection
        .execute_update("{call sp_pair(?, ?)}", true, true, &params, Some(&mut slots))
        .unwrap_err();
    assert_eq!(err.error_type(), 4);
    assert_eq!(slots[&1].value, None);
}

#[test]
fn test_stored_procedure_without_slots_ignores_missing_values() {
    let (transport, connection) = connected();
    transport.reply_ok(r#"{"status":"OK","row_count":1}"#);

    let mut params = StatementParameters::new();
    params.set(1, "INTEGER", Some("1".to_string()));
    let rows = connection
        .execute_update("{call sp_touch(?)}", true, true, &params, None)
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn test_auto_commit_round_trip() {
    let (transport, connection) = connected();
    transport
        .reply_ok(OK)
        .reply_ok(r#"{"status":"OK","result":"false"}"#);

    connection.set_auto_commit(false).unwrap();
    let set = transport.last_request();
    assert_eq!(set.method, Method::Get);
    assert_eq!(
        set.url,
        format!("{}/session/s1/connection/c1/set_auto_commit/false", SERVER_URL)
    );

    assert!(!connection.auto_commit().unwrap());
    assert_eq!(transport.last_request().action(), "get_auto_commit");
}

#[test]
fn test_transaction_isolation_and_holdability() {
    let (transport, connection) = connected();
    transport
        .reply_ok(OK)
        .reply_ok(r#"{"status":"OK","result":"transaction_serializable"}"#)
        .reply_ok(r#"{"status":"OK","result":"hold_cursors_over_commit"}"#);

    connection
        .set_transaction_isolation(TransactionIsolation::Serializable)
        .unwrap();
    assert_eq!(
        transport.last_request().action(),
        format!(
            "set_transaction_isolation_level/{}",
            TransactionIsolation::Serializable.as_str()
        )
    );
    assert_eq!(
        connection.transaction_isolation().unwrap(),
        TransactionIsolation::Serializable
    );
    assert_eq!(
        connection.holdability().unwrap(),
        Holdability::HoldCursorsOverCommit
    );
}

#[test]
fn test_commit_rollback_and_read_only() {
    let (transport, connection) = connected();
    transport
        .reply_ok(OK)
        .reply_ok(OK)
        .reply_ok(OK)
        .reply_ok(r#"{"status":"OK","result":"true"}"#);

    connection.commit().unwrap();
    connection.rollback().unwrap();
    connection.set_read_only(true).unwrap();
    assert!(connection.is_read_only().unwrap());

    let actions: Vec<String> = transport
        .requests()
        .iter()
        .skip(1)
        .map(|r| r.action().to_string())
        .collect();
    assert_eq!(
        actions,
        vec!["commit", "rollback", "set_read_only/true", "is_read_only"]
    );
}

#[test]
fn test_server_version_requires_result() {
    let (transport, connection) = connected();
    transport
        .reply_ok(r#"{"status":"OK","result":"AceQL HTTP v12.0"}"#)
        .reply_ok(OK);

    assert_eq!(connection.server_version().unwrap(), "AceQL HTTP v12.0");
    let err = connection.server_version().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(connection.client_version().starts_with("aceql-link v"));
}

#[test]
fn test_http_failure_without_envelope() {
    let (transport, connection) = connected();
    transport.reply(b"<html>Bad Gateway</html>".to_vec(), 502, "Bad Gateway");

    let err = connection.commit().unwrap_err();
    match err {
        AceQlLinkError::ServerError {
            message,
            http_status_code,
            ..
        } => {
            assert!(message.starts_with("HTTP_FAILURE 502"));
            assert_eq!(http_status_code, 502);
        },
        other => panic!("expected server error, got {:?}", other),
    }
}
