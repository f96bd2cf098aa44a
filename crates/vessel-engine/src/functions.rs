//! Template function tables
//!
//! A `FunctionTable` maps global function names to callables. The renderer
//! registers every entry on a fresh MiniJinja environment, so each render
//! sees exactly the table it was handed. The discovery and resolution passes
//! build different tables over the same names.

use base64::Engine as _;
use indexmap::IndexMap;
use minijinja::{Error, ErrorKind, Value};
use rand::Rng;
use std::fmt;
use std::sync::Arc;

/// A callable registered as a template global
pub type TemplateFunction = Arc<dyn Fn(&[Value]) -> Result<Value, Error> + Send + Sync>;

/// Characters used by `RandomString` when no charset is given
const RANDOM_CHARSET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Longest string `RandomString` will generate
pub const MAX_RANDOM_LENGTH: usize = 4096;

/// Named set of template functions
#[derive(Clone, Default)]
pub struct FunctionTable {
    functions: IndexMap<String, TemplateFunction>,
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.functions.keys()).finish()
    }
}

impl FunctionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table holding the dependency-free functions
    pub fn with_static_functions() -> Self {
        let mut table = Self::new();
        table.insert("Base64Encode", base64_encode);
        table.insert("Base64Decode", base64_decode);
        table.insert("ToLower", to_lower);
        table.insert("ToUpper", to_upper);
        table.insert("TrimSpace", trim_space);
        table.insert("Trim", trim);
        table.insert("Now", now);
        table.insert("NowFmt", now_fmt);
        table.insert("RandomString", random_string);
        table
    }

    /// Register a function, replacing any previous entry with the same name
    pub fn insert<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
    }

    pub fn get(&self, name: &str) -> Option<&TemplateFunction> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Invoke a function directly, outside of a template
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, Error> {
        let function = self.get(name).ok_or_else(|| {
            Error::new(ErrorKind::UnknownFunction, format!("{} is unknown", name))
        })?;
        function(args)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TemplateFunction)> {
        self.functions.iter().map(|(name, f)| (name.as_str(), f))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Read argument `index` as a string
///
/// Non-string values are converted with their template display form.
pub fn string_arg(function: &str, args: &[Value], index: usize) -> Result<String, Error> {
    let value = args.get(index).ok_or_else(|| {
        Error::new(
            ErrorKind::MissingArgument,
            format!("{} expects at least {} argument(s)", function, index + 1),
        )
    })?;

    Ok(match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    })
}

/// Read an optional trailing string argument
pub fn optional_string_arg(args: &[Value], index: usize) -> Option<String> {
    args.get(index).map(|value| match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    })
}

/// Usage: {{ Base64Encode("secret") }}
fn base64_encode(args: &[Value]) -> Result<Value, Error> {
    let input = string_arg("Base64Encode", args, 0)?;
    Ok(Value::from(
        base64::engine::general_purpose::STANDARD.encode(input.as_bytes()),
    ))
}

/// Usage: {{ Base64Decode("c2VjcmV0") }}
fn base64_decode(args: &[Value]) -> Result<Value, Error> {
    let input = string_arg("Base64Decode", args, 0)?;
    decode_base64(&input).map(Value::from)
}

pub(crate) fn decode_base64(input: &str) -> Result<String, Error> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("invalid base64: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("invalid UTF-8: {}", e)))
}

fn to_lower(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::from(string_arg("ToLower", args, 0)?.to_lowercase()))
}

fn to_upper(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::from(string_arg("ToUpper", args, 0)?.to_uppercase()))
}

fn trim_space(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::from(string_arg("TrimSpace", args, 0)?.trim()))
}

/// Usage: {{ Trim("--name--", "-") }}
///
/// Without a cutset, strips whitespace.
fn trim(args: &[Value]) -> Result<Value, Error> {
    let input = string_arg("Trim", args, 0)?;
    match optional_string_arg(args, 1) {
        Some(cutset) => Ok(Value::from(input.trim_matches(|c: char| cutset.contains(c)))),
        None => Ok(Value::from(input.trim())),
    }
}

/// Usage: {{ Now() }}
fn now(_args: &[Value]) -> Result<Value, Error> {
    Ok(Value::from(
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    ))
}

/// Usage: {{ NowFmt("%Y-%m-%d") }}
fn now_fmt(args: &[Value]) -> Result<Value, Error> {
    use std::fmt::Write;

    let format = string_arg("NowFmt", args, 0)?;
    let mut out = String::new();
    write!(out, "{}", chrono::Utc::now().format(&format)).map_err(|_| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("invalid time format '{}'", format),
        )
    })?;
    Ok(Value::from(out))
}

/// Usage: {{ RandomString(16) }} or {{ RandomString(8, "abc123") }}
fn random_string(args: &[Value]) -> Result<Value, Error> {
    let length: usize = string_arg("RandomString", args, 0)?
        .parse()
        .map_err(|_| Error::new(ErrorKind::InvalidOperation, "RandomString length must be a number"))?;

    if length > MAX_RANDOM_LENGTH {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!(
                "RandomString length {} exceeds the maximum of {}",
                length, MAX_RANDOM_LENGTH
            ),
        ));
    }

    let charset: Vec<char> = optional_string_arg(args, 1)
        .unwrap_or_else(|| RANDOM_CHARSET.to_string())
        .chars()
        .collect();

    if charset.is_empty() {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            "RandomString charset must not be empty",
        ));
    }

    let mut rng = rand::rng();
    let result: String = (0..length)
        .map(|_| charset[rng.random_range(0..charset.len())])
        .collect();

    Ok(Value::from(result))
}
