use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
/// A single cell: text, a number, or the missing-value marker used to
/// pad expanded regions.
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    /// Decodes one raw cell from the store. The Sheets values API
    /// ships everything as JSON scalars.
    pub fn from_raw(raw: &Value) -> Self {
        match raw {
            Value::String(text) if text.is_empty() => Self::Empty,
            Value::String(text) => Self::Text(text.clone()),
            Value::Number(number) => number
                .as_f64()
                .map(Self::Number)
                .unwrap_or(Self::Empty),
            Value::Bool(flag) => Self::Text(flag.to_string()),
            Value::Null => Self::Empty,
            other => Self::Text(other.to_string()),
        }
    }

    /// Encodes the cell for the store. `Empty` writes an empty string,
    /// which clears the backing cell.
    pub fn to_raw(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Number(number) => serde_json::Number::from_f64(*number)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(number.to_string())),
            Self::Empty => Value::String(String::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        if text.is_empty() {
            Self::Empty
        } else {
            Self::Text(text.to_string())
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Number(number) => write!(f, "{number}"),
            Self::Empty => write!(f, "<NA>"),
        }
    }
}
