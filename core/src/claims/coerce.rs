//! Claim value coercion
//!
//! Converts loosely-typed JSON claim values into the small, fixed set of
//! destination shapes the session needs. Typed providers pass straight
//! through; atypical ones fall back to canonical JSON text.

use serde_json::Value;

/// Destination shape requested for a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimTarget {
    String,
    StringList,
    Bool,
}

/// Claim value after coercion into a [`ClaimTarget`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimValue {
    String(String),
    StringList(Vec<String>),
    Bool(bool),
}

impl ClaimValue {
    pub fn target(&self) -> ClaimTarget {
        match self {
            Self::String(_) => ClaimTarget::String,
            Self::StringList(_) => ClaimTarget::StringList,
            Self::Bool(_) => ClaimTarget::Bool,
        }
    }

    /// Unwrap a string value, reporting the mismatched shape otherwise
    pub fn into_string(self) -> std::result::Result<String, String> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(unknown_destination(ClaimTarget::String, other.target())),
        }
    }

    pub fn into_string_list(self) -> std::result::Result<Vec<String>, String> {
        match self {
            Self::StringList(list) => Ok(list),
            other => Err(unknown_destination(ClaimTarget::StringList, other.target())),
        }
    }

    pub fn into_bool(self) -> std::result::Result<bool, String> {
        match self {
            Self::Bool(b) => Ok(b),
            other => Err(unknown_destination(ClaimTarget::Bool, other.target())),
        }
    }
}

fn unknown_destination(wanted: ClaimTarget, got: ClaimTarget) -> String {
    format!("unknown type for destination: wanted {:?}, got {:?}", wanted, got)
}

/// Coerce a raw claim value into the requested destination shape
pub fn coerce(value: &Value, target: ClaimTarget) -> std::result::Result<ClaimValue, String> {
    match target {
        ClaimTarget::String => to_string(value)
            .map(ClaimValue::String)
            .map_err(|e| format!("could not convert value to string: {}", e)),
        ClaimTarget::StringList => to_string_list(value)
            .map(ClaimValue::StringList)
            .map_err(|e| format!("could not convert value to string slice: {}", e)),
        ClaimTarget::Bool => Ok(ClaimValue::Bool(to_bool(value))),
    }
}

/// Render a claim as a string, falling back to its JSON text
pub fn to_string(value: &Value) -> std::result::Result<String, serde_json::Error> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value),
    }
}

/// Render a claim as a list of strings; scalars become a one-element list
pub fn to_string_list(value: &Value) -> std::result::Result<Vec<String>, String> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    };

    items
        .into_iter()
        .map(|item| {
            to_string(item)
                .map_err(|e| format!("could not convert slice entry to string {}: {}", item, e))
        })
        .collect()
}

/// Permissive truthiness; unrecognised shapes are false
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.as_str(), "1" | "t" | "T" | "true" | "TRUE" | "True"),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i != 0
            } else if let Some(u) = n.as_u64() {
                u != 0
            } else {
                n.as_f64().map(|f| f != 0.0).unwrap_or(false)
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}
