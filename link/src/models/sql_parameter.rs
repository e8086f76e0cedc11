use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Null marker used on the wire for bound values and column values.
pub const NULL_MARKER: &str = "NULL";

/// Direction of a bound statement parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterDirection {
    #[default]
    In,
    Out,
    InOut,
}

impl ParameterDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterDirection::In => "in",
            ParameterDirection::Out => "out",
            ParameterDirection::InOut => "inout",
        }
    }

    pub fn is_out(&self) -> bool {
        matches!(self, ParameterDirection::Out | ParameterDirection::InOut)
    }
}

/// A positional statement parameter.
///
/// `parameter_type` is the SQL type name the server binds with
/// (`VARCHAR`, `INTEGER`, `TIMESTAMP`, ...). A `None` value binds SQL NULL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlParameter {
    /// 1-based position in the statement
    pub index: u32,
    pub parameter_type: String,
    pub value: Option<String>,
    #[serde(default)]
    pub direction: ParameterDirection,
}

impl SqlParameter {
    pub fn new(index: u32, parameter_type: impl Into<String>, value: Option<String>) -> Self {
        Self {
            index,
            parameter_type: parameter_type.into(),
            value,
            direction: ParameterDirection::In,
        }
    }

    /// An OUT slot whose value is produced by the server.
    pub fn out(index: u32, parameter_type: impl Into<String>) -> Self {
        Self {
            index,
            parameter_type: parameter_type.into(),
            value: None,
            direction: ParameterDirection::Out,
        }
    }

    pub fn with_direction(mut self, direction: ParameterDirection) -> Self {
        self.direction = direction;
        self
    }
}

/// OUT parameter slots of a stored procedure call, keyed by 1-based index.
pub type OutParameterSlots = BTreeMap<u32, SqlParameter>;

/// Ordered bound parameters of a prepared statement or procedure call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementParameters {
    params: BTreeMap<u32, SqlParameter>,
}

impl StatementParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` at `index`, replacing any previous binding.
    pub fn set(
        &mut self,
        index: u32,
        parameter_type: impl Into<String>,
        value: Option<String>,
    ) -> &mut Self {
        self.params
            .insert(index, SqlParameter::new(index, parameter_type, value));
        self
    }

    pub fn set_parameter(&mut self, parameter: SqlParameter) -> &mut Self {
        self.params.insert(parameter.index, parameter);
        self
    }

    pub fn get(&self, index: u32) -> Option<&SqlParameter> {
        self.params.get(&index)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn clear(&mut self) {
        self.params.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &SqlParameter> {
        self.params.values()
    }

    /// Slots for every OUT / INOUT parameter, ready to be reconciled after execute.
    pub fn out_slots(&self) -> OutParameterSlots {
        self.params
            .iter()
            .filter(|(_, p)| p.direction.is_out())
            .map(|(i, p)| (*i, p.clone()))
            .collect()
    }
}
