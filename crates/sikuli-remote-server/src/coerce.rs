//! Argument coercion
//!
//! Remote callers usually send every argument as a string. Each declared
//! parameter type knows how to turn such a value into the JSON shape its
//! keyword reads back through [`BoundArgs`].

use crate::errors::{CallError, KeywordError, KeywordResult};
use serde_json::Value;
use std::collections::HashMap;

/// Declared type of a keyword parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Str,
    Int,
    Float,
    Bool,
    /// Sequence whose elements are coerced to the inner type
    List(Scalar),
    /// Passed through untouched
    Any,
}

/// Element type of a list parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Str,
    Int,
    Float,
}

impl From<Scalar> for ParamType {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Str => ParamType::Str,
            Scalar::Int => ParamType::Int,
            Scalar::Float => ParamType::Float,
        }
    }
}

impl ParamType {
    pub fn describe(&self) -> &'static str {
        match self {
            ParamType::Str => "a string",
            ParamType::Int => "an integer",
            ParamType::Float => "a number",
            ParamType::Bool => "a boolean",
            ParamType::List(_) => "a list",
            ParamType::Any => "any value",
        }
    }

    /// Coerce `value` to this type, `None` when it cannot be represented
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match self {
            ParamType::Str => to_str(value).map(Value::String),
            ParamType::Int => to_int(value).map(Value::from),
            ParamType::Float => to_float(value).map(Value::from),
            ParamType::Bool => to_bool(value).map(Value::Bool),
            ParamType::List(elem) => {
                let inner = ParamType::from(*elem);
                to_list(value)?
                    .iter()
                    .map(|item| inner.coerce(item))
                    .collect::<Option<Vec<_>>>()
                    .map(Value::Array)
            }
            ParamType::Any => Some(value.clone()),
        }
    }
}

fn to_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// A JSON array, or a string holding a bracketed list literal
fn to_list(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.clone()),
        Value::String(s) => {
            let s = s.trim();
            let inner = s.strip_prefix('[')?.strip_suffix(']')?;
            if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(s) {
                return Some(items);
            }
            // Python style literals such as ['a.png', 'b.png']
            if inner.trim().is_empty() {
                return Some(Vec::new());
            }
            Some(
                inner
                    .split(',')
                    .map(|item| {
                        let item = item.trim();
                        let unquoted = item
                            .strip_prefix('\'')
                            .and_then(|i| i.strip_suffix('\''))
                            .or_else(|| item.strip_prefix('"').and_then(|i| i.strip_suffix('"')))
                            .unwrap_or(item);
                        Value::String(unquoted.to_string())
                    })
                    .collect(),
            )
        }
        _ => None,
    }
}

/// Arguments of one call after binding and coercion
#[derive(Debug, Clone, Default)]
pub struct BoundArgs {
    keyword: String,
    values: HashMap<&'static str, Value>,
    varargs: Vec<Value>,
}

impl BoundArgs {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..Self::default()
        }
    }

    /// Name of the keyword these arguments were bound for
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn insert(&mut self, name: &'static str, value: Value) {
        self.values.insert(name, value);
    }

    pub fn push_vararg(&mut self, value: Value) {
        self.varargs.push(value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn required(&self, name: &str) -> KeywordResult<&Value> {
        self.values.get(name).ok_or_else(|| {
            KeywordError::Argument(CallError::MissingArgument {
                keyword: self.keyword.clone(),
                param: name.to_string(),
            })
        })
    }

    fn mismatch(&self, name: &str, expected: &'static str, value: &Value) -> KeywordError {
        KeywordError::Argument(CallError::Coercion {
            keyword: self.keyword.clone(),
            param: name.to_string(),
            expected,
            value: value.to_string(),
        })
    }

    pub fn str(&self, name: &str) -> KeywordResult<String> {
        let value = self.required(name)?;
        to_str(value).ok_or_else(|| self.mismatch(name, "a string", value))
    }

    pub fn int(&self, name: &str) -> KeywordResult<i64> {
        let value = self.required(name)?;
        to_int(value).ok_or_else(|| self.mismatch(name, "an integer", value))
    }

    /// Integer argument narrowed to screen coordinates
    pub fn coord(&self, name: &str) -> KeywordResult<i32> {
        let value = self.required(name)?;
        to_int(value)
            .and_then(|i| i32::try_from(i).ok())
            .ok_or_else(|| self.mismatch(name, "a coordinate", value))
    }

    pub fn float(&self, name: &str) -> KeywordResult<f64> {
        let value = self.required(name)?;
        to_float(value).ok_or_else(|| self.mismatch(name, "a number", value))
    }

    pub fn bool(&self, name: &str) -> KeywordResult<bool> {
        let value = self.required(name)?;
        to_bool(value).ok_or_else(|| self.mismatch(name, "a boolean", value))
    }

    pub fn str_list(&self, name: &str) -> KeywordResult<Vec<String>> {
        let value = self.required(name)?;
        to_list(value)
            .and_then(|items| items.iter().map(to_str).collect::<Option<Vec<_>>>())
            .ok_or_else(|| self.mismatch(name, "a list of strings", value))
    }

    pub fn coord_list(&self, name: &str) -> KeywordResult<Vec<i32>> {
        let value = self.required(name)?;
        to_list(value)
            .and_then(|items| {
                items
                    .iter()
                    .map(|item| to_int(item).and_then(|i| i32::try_from(i).ok()))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| self.mismatch(name, "a list of coordinates", value))
    }

    pub fn opt_str(&self, name: &str) -> KeywordResult<Option<String>> {
        self.optional(name, |n| self.str(n))
    }

    pub fn opt_int(&self, name: &str) -> KeywordResult<Option<i64>> {
        self.optional(name, |n| self.int(n))
    }

    pub fn opt_coord(&self, name: &str) -> KeywordResult<Option<i32>> {
        self.optional(name, |n| self.coord(n))
    }

    pub fn opt_float(&self, name: &str) -> KeywordResult<Option<f64>> {
        self.optional(name, |n| self.float(n))
    }

    fn optional<T>(
        &self,
        name: &str,
        get: impl FnOnce(&str) -> KeywordResult<T>,
    ) -> KeywordResult<Option<T>> {
        match self.values.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => get(name).map(Some),
        }
    }

    /// Trailing variadic arguments as strings
    pub fn varargs(&self) -> KeywordResult<Vec<String>> {
        self.varargs
            .iter()
            .map(|value| to_str(value).ok_or_else(|| self.mismatch("*args", "a string", value)))
            .collect()
    }
}
