//! JSON input for the `cast` command.
//!
//! `null` maps to NULL, integers to integer scalars, other numbers to
//! doubles, strings to character scalars and booleans to logicals. Arrays
//! become vectors typed by their widest element; `null` elements become NA.
//! Arrays holding arrays or mixed strings and numbers become lists.

use std::path::Path;

use anyhow::{bail, Context};
use argcast_types::{Logical, Value, VectorData, INT_NA};
use serde_json::Value as Json;

pub fn value_from_json(json: &Json) -> anyhow::Result<Value> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::logical(*b)),
        Json::Number(n) => Ok(number(n)),
        Json::String(s) => Ok(Value::string(s.as_str())),
        Json::Array(items) => array(items),
        Json::Object(_) => bail!("JSON objects are not supported as argument values"),
    }
}

fn number(n: &serde_json::Number) -> Value {
    match n.as_i64().and_then(|i| i32::try_from(i).ok()) {
        Some(i) if i != INT_NA => Value::Integer(i),
        _ => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Widest {
    Logical,
    Integer,
    Double,
    Character,
    List,
}

fn widest(items: &[Json]) -> Widest {
    let mut out = Widest::Logical;
    let mut strings = false;
    let mut numbers = false;
    for item in items {
        let kind = match item {
            Json::Null => continue,
            Json::Bool(_) => Widest::Logical,
            Json::Number(n) => {
                numbers = true;
                match number(n) {
                    Value::Integer(_) => Widest::Integer,
                    _ => Widest::Double,
                }
            }
            Json::String(_) => {
                strings = true;
                Widest::Character
            }
            Json::Array(_) | Json::Object(_) => Widest::List,
        };
        out = out.max(kind);
    }
    if strings && numbers {
        Widest::List
    } else {
        out
    }
}

fn array(items: &[Json]) -> anyhow::Result<Value> {
    let data = match widest(items) {
        Widest::Logical => VectorData::Logical(
            items
                .iter()
                .map(|j| j.as_bool().map_or(Logical::Na, Logical::from_bool))
                .collect(),
        ),
        Widest::Integer => VectorData::Integer(
            items
                .iter()
                .map(|j| match j {
                    Json::Bool(b) => i32::from(*b),
                    Json::Number(n) => match number(n) {
                        Value::Integer(i) => i,
                        _ => INT_NA,
                    },
                    _ => INT_NA,
                })
                .collect(),
        ),
        Widest::Double => VectorData::Double(
            items
                .iter()
                .map(|j| match j {
                    Json::Bool(b) => f64::from(u8::from(*b)),
                    Json::Number(n) => n.as_f64().unwrap_or(f64::NAN),
                    _ => argcast_types::double_na(),
                })
                .collect(),
        ),
        Widest::Character => VectorData::Character(
            items
                .iter()
                .map(|j| match j {
                    Json::String(s) => Some(s.clone()),
                    Json::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
                    _ => None,
                })
                .collect(),
        ),
        Widest::List => VectorData::List(
            items
                .iter()
                .map(value_from_json)
                .collect::<anyhow::Result<_>>()?,
        ),
    };
    Ok(Value::vector(data))
}

pub fn parse_value(text: &str) -> anyhow::Result<Value> {
    let json: Json =
        serde_json::from_str(text).with_context(|| format!("invalid JSON value: {text}"))?;
    value_from_json(&json)
}

/// Reads a JSON array and converts each element into one input value.
pub fn load_values(path: &Path) -> anyhow::Result<Vec<Value>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let json: Json = serde_json::from_str(&source)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let Json::Array(items) = json else {
        bail!("{} must contain a JSON array of values", path.display());
    };
    items.iter().map(value_from_json).collect()
}
