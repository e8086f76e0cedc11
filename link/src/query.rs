//! Statement parameter construction and OUT parameter reconciliation.
//!
//! Both functions are pure: they never touch the network, so the command
//! layer can stay a thin request/decode loop.

use crate::{
    error::{AceQlLinkError, Result},
    models::{OutParameterSlots, StatementParameters, NULL_MARKER},
};
use std::collections::BTreeMap;

/// Error code the server uses for missing stored procedure OUT values.
pub const OUT_PARAMETERS_ERROR_TYPE: i32 = 4;

/// Action name for a non-query statement.
pub fn update_action(is_stored_procedure: bool) -> &'static str {
    if is_stored_procedure {
        "execute"
    } else {
        "execute_update"
    }
}

/// Build the form parameters of an `execute_update` / `execute` /
/// `execute_query` call.
///
/// `gzip_result` is only sent for queries. A `None` parameter value is sent
/// as the null marker.
pub fn build_statement_params(
    sql: &str,
    is_prepared: bool,
    is_stored_procedure: bool,
    parameters: &StatementParameters,
    gzip_result: Option<bool>,
) -> Vec<(String, String)> {
    let mut form = vec![
        ("sql".to_string(), sql.to_string()),
        ("prepared_statement".to_string(), is_prepared.to_string()),
        ("stored_procedure".to_string(), is_stored_procedure.to_string()),
    ];

    if let Some(gzip) = gzip_result {
        form.push(("gzip_result".to_string(), gzip.to_string()));
        form.push(("pretty_printing".to_string(), "true".to_string()));
    }

    for parameter in parameters.iter() {
        let index = parameter.index;
        form.push((format!("param_type_{}", index), parameter.parameter_type.clone()));
        form.push((
            format!("param_value_{}", index),
            parameter
                .value
                .clone()
                .unwrap_or_else(|| NULL_MARKER.to_string()),
        ));
        if is_stored_procedure {
            form.push((
                format!("param_direction_{}", index),
                parameter.direction.as_str().to_string(),
            ));
        }
    }

    form
}

/// Copy OUT values returned by the server into the caller's slots.
///
/// No-op when `slots` is empty. Fails with error type 4 when the server
/// returned no OUT values at all, or left out one of the requested slots.
pub fn reconcile_out_parameters(
    returned: &BTreeMap<u32, Option<String>>,
    slots: &mut OutParameterSlots,
) -> Result<()> {
    if slots.is_empty() {
        return Ok(());
    }

    if returned.is_empty() {
        return Err(AceQlLinkError::ProtocolError {
            message: "No stored procedure out parameters returned by AceQL Server".to_string(),
            error_type: OUT_PARAMETERS_ERROR_TYPE,
        });
    }

    if let Some(missing) = slots.keys().find(|index| !returned.contains_key(index)) {
        return Err(AceQlLinkError::ProtocolError {
            message: format!(
                "Stored procedure out parameter {} not returned by AceQL Server",
                missing
            ),
            error_type: OUT_PARAMETERS_ERROR_TYPE,
        });
    }

    for (index, slot) in slots.iter_mut() {
        if let Some(value) = returned.get(index) {
            slot.value = value.clone();
        }
    }
    Ok(())
}
