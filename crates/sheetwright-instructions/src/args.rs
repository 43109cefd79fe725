use serde_json::Value;

use crate::{Assembled, AssembleError, InstructionKind};

#[derive(Debug, Clone, PartialEq)]
/// One cell mutation: set (row, col) to a value.
pub struct CellWrite {
    pub row: usize,
    pub col: usize,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
/// The 7 positional chart arguments from the Add Chart request
/// surface. Structured fields may arrive JSON-encoded as strings and
/// are decoded here, at the assembler boundary.
pub struct ChartArgs {
    pub title: String,
    pub chart_type: String,
    pub legend_position: String,
    pub axis: Value,
    pub domains: Value,
    pub series: Value,
    pub position: Value,
}

#[derive(Debug, Clone, PartialEq)]
/// Enumerates supported `InstructionArgs` values: the typed,
/// arity-validated arguments for one instruction.
pub enum InstructionArgs {
    Write(Vec<CellWrite>),
    Read {
        rows: Vec<usize>,
        columns: Vec<usize>,
    },
    Chart(ChartArgs),
    Question {
        answer: String,
    },
    Other {
        body: Value,
    },
}

impl InstructionArgs {
    /// Decodes assembled fields into the typed record for `kind`.
    /// `Inappropriate` never has arguments and is rejected here.
    pub fn decode(kind: InstructionKind, assembled: &Assembled) -> Result<Self, AssembleError> {
        match kind {
            InstructionKind::Write => decode_write(assembled),
            InstructionKind::Read => decode_read(assembled),
            InstructionKind::Chart => decode_chart(assembled),
            InstructionKind::Question => decode_question(assembled),
            InstructionKind::Other => decode_other(assembled),
            InstructionKind::Inappropriate => Err(AssembleError::Invalid(
                "inappropriate instructions carry no arguments".to_string(),
            )),
        }
    }
}

fn decode_write(assembled: &Assembled) -> Result<InstructionArgs, AssembleError> {
    let writes = assembled
        .instances()
        .iter()
        .map(|instance| {
            let [row, col, value] = instance.as_slice() else {
                return Err(AssembleError::Invalid(
                    "write instance did not have rows, columns, and values".to_string(),
                ));
            };
            Ok(CellWrite {
                row: decode_index(row, "rows")?,
                col: decode_index(col, "columns")?,
                value: decode_text(value),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(InstructionArgs::Write(writes))
}

fn decode_read(assembled: &Assembled) -> Result<InstructionArgs, AssembleError> {
    let [rows, columns] = assembled.fields.as_slice() else {
        return Err(AssembleError::Invalid(
            "read arguments did not have rows and columns".to_string(),
        ));
    };
    Ok(InstructionArgs::Read {
        rows: decode_index_array(rows, "rows")?,
        columns: decode_index_array(columns, "columns")?,
    })
}

fn decode_chart(assembled: &Assembled) -> Result<InstructionArgs, AssembleError> {
    let Some(Value::Array(arguments)) = assembled.fields.first() else {
        return Err(AssembleError::Invalid(
            "chart arguments were not an array".to_string(),
        ));
    };
    let [title, chart_type, legend_position, axis, domains, series, position] =
        arguments.as_slice()
    else {
        return Err(AssembleError::Invalid(format!(
            "chart requires exactly 7 positional arguments, got {}",
            arguments.len()
        )));
    };

    Ok(InstructionArgs::Chart(ChartArgs {
        title: decode_text(title),
        chart_type: decode_text(chart_type),
        legend_position: decode_text(legend_position),
        axis: decode_structured(axis, "axis")?,
        domains: decode_structured(domains, "domains")?,
        series: decode_structured(series, "series")?,
        position: decode_structured(position, "position")?,
    }))
}

fn decode_question(assembled: &Assembled) -> Result<InstructionArgs, AssembleError> {
    match assembled.fields.first() {
        Some(Value::String(answer)) => Ok(InstructionArgs::Question {
            answer: answer.clone(),
        }),
        _ => Err(AssembleError::Invalid(
            "question answer was not a string".to_string(),
        )),
    }
}

fn decode_other(assembled: &Assembled) -> Result<InstructionArgs, AssembleError> {
    match assembled.fields.first() {
        Some(Value::String(body)) => {
            let body = serde_json::from_str(body).map_err(|error| {
                AssembleError::Invalid(format!("batchUpdate body was not valid JSON: {error}"))
            })?;
            Ok(InstructionArgs::Other { body })
        }
        Some(body @ Value::Object(_)) => Ok(InstructionArgs::Other { body: body.clone() }),
        _ => Err(AssembleError::Invalid(
            "batchUpdate body was not a string or object".to_string(),
        )),
    }
}

fn decode_index(value: &Value, field: &str) -> Result<usize, AssembleError> {
    value
        .as_u64()
        .and_then(|index| usize::try_from(index).ok())
        .ok_or_else(|| {
            AssembleError::Invalid(format!("{field} entries must be non-negative integers"))
        })
}

fn decode_index_array(value: &Value, field: &str) -> Result<Vec<usize>, AssembleError> {
    let Value::Array(items) = value else {
        return Err(AssembleError::Invalid(format!("{field} was not an array")));
    };
    items
        .iter()
        .map(|item| decode_index(item, field))
        .collect()
}

fn decode_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Structured chart fields may be JSON-encoded strings or already
/// decoded structures; both are accepted.
fn decode_structured(value: &Value, field: &str) -> Result<Value, AssembleError> {
    match value {
        Value::String(raw) => serde_json::from_str(raw).map_err(|error| {
            AssembleError::Invalid(format!("chart {field} was not valid JSON: {error}"))
        }),
        other => Ok(other.clone()),
    }
}
