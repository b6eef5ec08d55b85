//! Query parameters and the SODA query-string encoding rule.

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters the SODA encoding leaves literal: the URL separators
/// `= & ? /`, the `$` parameter prefix, and `> :` which occur inside
/// filter predicates and timestamps. The unreserved `- _ . ~` stay
/// literal as in standard URL encoding; everything else is
/// percent-encoded.
const SODA_QUERY_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'=')
    .remove(b'>')
    .remove(b':')
    .remove(b'?')
    .remove(b'$')
    .remove(b'&')
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encodes an assembled request URL with the SODA rule.
pub(crate) fn encode_query(raw: &str) -> String {
    utf8_percent_encode(raw, SODA_QUERY_SET).to_string()
}

/// A scalar query parameter value.
///
/// The SODA query string supports no nesting; values are rendered
/// verbatim into the raw URL and percent-encoded with the rest of it.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Numeric view of the value, used to pick up a caller-set `limit`
    /// in the pagination loop.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ParamValue::Integer(n) => u64::try_from(*n).ok(),
            ParamValue::Float(x) if *x >= 0.0 && x.fract() == 0.0 => Some(*x as u64),
            ParamValue::Float(_) => None,
            ParamValue::Text(s) => s.parse().ok(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Integer(n) => write!(f, "{}", n),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Integer(n)
    }
}
impl From<i32> for ParamValue {
    fn from(n: i32) -> Self {
        ParamValue::Integer(n.into())
    }
}
impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        ParamValue::Float(x)
    }
}
impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}
impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

/// Deterministically ordered query parameters.
///
/// Keys are kept sorted so the same mapping always derives the same URL
/// regardless of insertion order. A single merge operation backs every
/// mutating entry point on [`crate::Client`]: incoming keys win on
/// conflict.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: BTreeMap<String, ParamValue>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one parameter, replacing any existing value for the name.
    /// Arbitrary column names act as equality filters on that column.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    /// Maximum number of rows per response page (`$limit`).
    pub fn with_limit(self, limit: u64) -> Self {
        self.with("limit", limit as i64)
    }

    /// Row offset into the full result set (`$offset`).
    pub fn with_offset(self, offset: u64) -> Self {
        self.with("offset", offset as i64)
    }

    /// Filter predicate expression (`$where`).
    pub fn with_where(self, predicate: impl Into<String>) -> Self {
        self.with("where", predicate.into())
    }

    /// Sort expression (`$order`).
    pub fn with_order(self, order: impl Into<String>) -> Self {
        self.with("order", order.into())
    }

    /// Merges `other` into `self`. `other`'s keys win on conflict.
    pub fn merge(&mut self, other: QueryParams) {
        self.entries.extend(other.entries);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.get(name)
    }

    /// Key/value pairs in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
