use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const NAME_PARAM_SEP: char = '?';
const PARAM_SEP: char = '&';
const ASSIGNMENT: char = '=';
const DEFAULT_VALUE: &str = "0";

/// A whitelisted request parameter and the validator that normalizes its value.
struct ParamSpec {
    name: &'static str,
    validate: fn(&str) -> Option<String>,
}

/// Whitelist, in key order.
const ALLOWED_PARAMS: [ParamSpec; 3] = [
    ParamSpec {
        name: "width",
        validate: non_negative_integer,
    },
    ParamSpec {
        name: "height",
        validate: non_negative_integer,
    },
    ParamSpec {
        name: "dpi",
        validate: non_negative_integer,
    },
];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("malformed cache key '{key}': {reason}")]
    Malformed { key: String, reason: String },
}

impl KeyError {
    fn malformed(key: &str, reason: impl Into<String>) -> Self {
        KeyError::Malformed {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Canonical cache key. Only produced by [`generate`] or by parsing a
/// conforming string, so every instance follows the key grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse(&self) -> Result<ParsedKey, KeyError> {
        parse(&self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CacheKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)?;
        Ok(CacheKey(s.to_string()))
    }
}

/// The decoded parts of a cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    pub file_name: String,
    /// Whitelisted parameters in key order.
    pub params: Vec<(&'static str, String)>,
}

impl ParsedKey {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(param, _)| *param == name)
            .map(|(_, value)| value.as_str())
    }

    /// Numeric value of a parameter, `0` when absent. Values past `u32::MAX` saturate.
    pub fn dimension(&self, name: &str) -> u32 {
        self.param(name)
            .and_then(|value| value.parse::<u64>().ok())
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
            .unwrap_or(0)
    }
}

/// Base-10 integer in `0..=i64::MAX`, rewritten in canonical form.
fn non_negative_integer(value: &str) -> Option<String> {
    value
        .parse::<i64>()
        .ok()
        .filter(|n| *n >= 0)
        .map(|n| n.to_string())
}

fn value_by_name(params: &HashMap<String, Vec<String>>, allowed: &ParamSpec) -> String {
    params
        .get(allowed.name)
        .and_then(|values| values.first())
        .and_then(|first| (allowed.validate)(first))
        .unwrap_or_else(|| DEFAULT_VALUE.to_string())
}

fn is_reserved(c: char) -> bool {
    matches!(c, '/' | '?' | '#' | '&') || c.is_whitespace()
}

/// Whether `name` can be embedded in a key and parsed back unchanged.
pub fn is_valid_file_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(is_reserved)
}

/// Builds the cache key for `file_name`, keeping only whitelisted parameters.
///
/// Valid values are written in canonical decimal form rather than as sent: `007` and
/// `+7` both become `7`, so equivalent requests share one key. [`parse`] accepts only
/// the canonical form.
///
/// Example: `test.jpg?width=500&height=300&dpi=0`
pub fn generate(file_name: &str, params: &HashMap<String, Vec<String>>) -> CacheKey {
    let mut key = String::with_capacity(file_name.len() + 32);
    key.push_str(file_name);
    key.push(NAME_PARAM_SEP);

    for (i, allowed) in ALLOWED_PARAMS.iter().enumerate() {
        if i > 0 {
            key.push(PARAM_SEP);
        }
        key.push_str(allowed.name);
        key.push(ASSIGNMENT);
        key.push_str(&value_by_name(params, allowed));
    }

    CacheKey(key)
}

/// Parses a key produced by [`generate`] in a single left-to-right scan.
pub fn parse(key: &str) -> Result<ParsedKey, KeyError> {
    let (file_name, mut rest) = key
        .split_once(NAME_PARAM_SEP)
        .ok_or_else(|| KeyError::malformed(key, "missing '?' separator"))?;

    if !is_valid_file_name(file_name) {
        return Err(KeyError::malformed(key, "invalid file name"));
    }

    let mut params = Vec::with_capacity(ALLOWED_PARAMS.len());

    for (i, allowed) in ALLOWED_PARAMS.iter().enumerate() {
        if i > 0 {
            rest = rest
                .strip_prefix(PARAM_SEP)
                .ok_or_else(|| KeyError::malformed(key, "expected '&'"))?;
        }

        rest = rest
            .strip_prefix(allowed.name)
            .and_then(|after| after.strip_prefix(ASSIGNMENT))
            .ok_or_else(|| KeyError::malformed(key, format!("expected '{}='", allowed.name)))?;

        let end = rest.find(PARAM_SEP).unwrap_or(rest.len());
        let (value, tail) = rest.split_at(end);

        match (allowed.validate)(value) {
            Some(normalized) if normalized == value => params.push((allowed.name, normalized)),
            _ => {
                return Err(KeyError::malformed(
                    key,
                    format!("invalid value '{}' for {}", value, allowed.name),
                ));
            }
        }

        rest = tail;
    }

    if !rest.is_empty() {
        return Err(KeyError::malformed(key, "trailing characters"));
    }

    Ok(ParsedKey {
        file_name: file_name.to_string(),
        params,
    })
}
