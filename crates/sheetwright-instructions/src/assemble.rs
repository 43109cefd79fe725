use jsonschema::validator_for;
use serde_json::Value;
use sheetwright_ai::ToolCall;
use thiserror::Error;

use crate::{Instruction, InstructionTool};

#[derive(Debug, Error)]
/// Enumerates supported `AssembleError` values. Every variant is an
/// attempt-local failure; the message plus the raw offending payload
/// become the repair hint for the next attempt.
pub enum AssembleError {
    #[error("response contained no tool calls")]
    NoToolCalls,
    #[error("Invalid instructions length")]
    LengthMismatch { raw_payload: String },
    #[error("arguments did not match the '{tool}' schema: {detail}")]
    Schema {
        tool: String,
        detail: String,
        raw_payload: String,
    },
    #[error("missing field '{field}' in arguments")]
    MissingField { field: String, raw_payload: String },
    #[error("field '{field}' changed type across tool calls")]
    TypeMismatch { field: String, raw_payload: String },
    #[error("{0}")]
    Invalid(String),
}

impl AssembleError {
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            Self::LengthMismatch { raw_payload }
            | Self::Schema { raw_payload, .. }
            | Self::MissingField { raw_payload, .. }
            | Self::TypeMismatch { raw_payload, .. } => Some(raw_payload),
            Self::NoToolCalls | Self::Invalid(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Field accumulators merged across tool-call fragments, ordered as
/// the registry's field names for the tool.
pub struct Assembled {
    pub fields: Vec<Value>,
}

impl Assembled {
    /// Splits the merged fields into per-instance tuples.
    ///
    /// A scalar first field means the tuple is a single instance. A
    /// list-typed first field means the fields are N parallel arrays
    /// and get transposed into N positionally-aligned instances.
    pub fn instances(&self) -> Vec<Vec<Value>> {
        match self.fields.first() {
            Some(Value::Array(first)) => transpose(&self.fields, first.len()),
            _ => vec![self.fields.clone()],
        }
    }
}

/// Transposes parallel field arrays into `count` per-instance rows.
/// Scalar fields are replicated into every row.
pub fn transpose(fields: &[Value], count: usize) -> Vec<Vec<Value>> {
    (0..count)
        .map(|i| {
            fields
                .iter()
                .map(|field| match field {
                    Value::Array(items) => items.get(i).cloned().unwrap_or(Value::Null),
                    scalar => scalar.clone(),
                })
                .collect()
        })
        .collect()
}

/// Merges one or more tool-call payloads for `tool` into positionally
/// aligned field accumulators.
///
/// String fields are space-joined across fragments; list fields are
/// appended element-wise. After each merged field, adjacent list-typed
/// fields must agree on length or the whole attempt fails.
pub fn assemble(tool_calls: &[ToolCall], tool: &InstructionTool) -> Result<Assembled, AssembleError> {
    if tool_calls.is_empty() {
        return Err(AssembleError::NoToolCalls);
    }

    let schema = tool.parameters();
    let validator = validator_for(&schema).map_err(|error| AssembleError::Schema {
        tool: tool.name.to_string(),
        detail: error.to_string(),
        raw_payload: String::new(),
    })?;

    let mut accumulators: Vec<Option<Value>> = vec![None; tool.field_names.len()];

    for call in tool_calls {
        let raw_payload = call.arguments.to_string();
        if let Err(error) = validator.validate(&call.arguments) {
            return Err(AssembleError::Schema {
                tool: tool.name.to_string(),
                detail: error.to_string(),
                raw_payload,
            });
        }

        for (index, field) in tool.field_names.iter().enumerate() {
            let value = call.arguments.get(field).ok_or_else(|| {
                AssembleError::MissingField {
                    field: field.to_string(),
                    raw_payload: raw_payload.clone(),
                }
            })?;

            merge_field(&mut accumulators[index], value, field, &raw_payload)?;

            if index > 0 {
                check_adjacent_arity(&accumulators, index, &raw_payload)?;
            }
        }
    }

    let fields = accumulators
        .into_iter()
        .map(|accumulator| accumulator.unwrap_or(Value::Null))
        .collect();

    Ok(Assembled { fields })
}

fn merge_field(
    accumulator: &mut Option<Value>,
    value: &Value,
    field: &str,
    raw_payload: &str,
) -> Result<(), AssembleError> {
    match accumulator {
        None => {
            *accumulator = Some(value.clone());
            Ok(())
        }
        Some(Value::String(existing)) => {
            let Value::String(incoming) = value else {
                return Err(AssembleError::TypeMismatch {
                    field: field.to_string(),
                    raw_payload: raw_payload.to_string(),
                });
            };
            existing.push(' ');
            existing.push_str(incoming);
            Ok(())
        }
        Some(Value::Array(existing)) => {
            let Value::Array(incoming) = value else {
                return Err(AssembleError::TypeMismatch {
                    field: field.to_string(),
                    raw_payload: raw_payload.to_string(),
                });
            };
            existing.extend(incoming.iter().cloned());
            Ok(())
        }
        Some(_) => Err(AssembleError::TypeMismatch {
            field: field.to_string(),
            raw_payload: raw_payload.to_string(),
        }),
    }
}

fn check_adjacent_arity(
    accumulators: &[Option<Value>],
    index: usize,
    raw_payload: &str,
) -> Result<(), AssembleError> {
    let (Some(Value::Array(current)), Some(Value::Array(previous))) =
        (&accumulators[index], &accumulators[index - 1])
    else {
        return Ok(());
    };
    if current.len() != previous.len() {
        return Err(AssembleError::LengthMismatch {
            raw_payload: raw_payload.to_string(),
        });
    }
    Ok(())
}

/// Decodes the planner's `get_instructions` result into an ordered
/// instruction list. A `types` / `instructions` length mismatch is a
/// planning failure and yields an error, never a truncated plan.
pub fn decode_plan(assembled: &Assembled) -> Result<Vec<Instruction>, AssembleError> {
    let [types, instructions] = assembled.fields.as_slice() else {
        return Err(AssembleError::Invalid(
            "get_instructions produced the wrong number of fields".to_string(),
        ));
    };
    let (Value::Array(types), Value::Array(instructions)) = (types, instructions) else {
        return Err(AssembleError::Invalid(
            "get_instructions fields were not arrays".to_string(),
        ));
    };
    if types.len() != instructions.len() {
        return Err(AssembleError::Invalid(
            "Invalid instructions: types and instructions differ in length".to_string(),
        ));
    }

    types
        .iter()
        .zip(instructions.iter())
        .map(|(kind_tag, text)| match (kind_tag, text) {
            (Value::String(kind_tag), Value::String(text)) => {
                Ok(Instruction::new(kind_tag.clone(), text.clone()))
            }
            _ => Err(AssembleError::Invalid(
                "get_instructions entries were not strings".to_string(),
            )),
        })
        .collect()
}
