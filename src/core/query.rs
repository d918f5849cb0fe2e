//! Purpose: Decode raw query strings into typed values and encode them back.
//! Exports: `DecodeConfig`, `QueryValue`, `DecodedQuery`, `decode_query`, `encode_query`.
//! Role: Top-level query coercion used by search-filter and map-viewport callers.
//! Invariants: Decoding never fails; malformed geographic values decode to `QueryValue::Null`.
//! Invariants: Coercion priority is latlng key, bounds key, `true`, `false`, numeral, text.
//! Invariants: A key configured as both latlng and bounds decodes as latlng.
//! Notes: Repeated keys resolve last-value-wins.
use std::collections::btree_map::{self, BTreeMap};
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use url::form_urlencoded;

use super::error::{Error, ErrorKind};
use super::geo::{LatLng, LatLngBounds, decode_lat_lng, decode_lat_lng_bounds};
use super::numeral::{canonical_numeral, parse_numeral};

// Integral numbers below this magnitude are emitted as JSON integers.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Which query keys carry geographic values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct DecodeConfig {
    pub latlng: BTreeSet<String>,
    pub latlng_bounds: BTreeSet<String>,
}

impl DecodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latlng(mut self, key: impl Into<String>) -> Self {
        self.latlng.insert(key.into());
        self
    }

    pub fn with_latlng_bounds(mut self, key: impl Into<String>) -> Self {
        self.latlng_bounds.insert(key.into());
        self
    }

    pub fn merge(&mut self, other: DecodeConfig) {
        self.latlng.extend(other.latlng);
        self.latlng_bounds.extend(other.latlng_bounds);
    }

    /// Keys listed as both point and bounds; these decode as points.
    pub fn overlapping_keys(&self) -> Vec<&str> {
        self.latlng
            .intersection(&self.latlng_bounds)
            .map(String::as_str)
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum QueryValue {
    Bool(bool),
    Number(f64),
    LatLng(LatLng),
    Bounds(LatLngBounds),
    Text(String),
    /// A geographic key whose value did not decode.
    Null,
}

impl QueryValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::LatLng(_) => "latlng",
            Self::Bounds(_) => "bounds",
            Self::Text(_) => "string",
            Self::Null => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text placed after `=` when the value is written back into a query.
    pub fn to_query_text(&self) -> String {
        match self {
            Self::Bool(value) => value.to_string(),
            Self::Number(value) => canonical_numeral(*value),
            Self::LatLng(point) => point.to_string(),
            Self::Bounds(bounds) => bounds.to_string(),
            Self::Text(text) => text.clone(),
            Self::Null => String::new(),
        }
    }

    fn from_json(key: &str, value: &Value) -> Result<Self, Error> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(flag) => Ok(Self::Bool(*flag)),
            Value::String(text) => Ok(Self::Text(text.clone())),
            Value::Number(number) => number
                .as_f64()
                .filter(|n| n.is_finite())
                .map(Self::Number)
                .ok_or_else(|| unsupported_json(key, "number is out of range")),
            Value::Object(map) if map.contains_key("northEast") || map.contains_key("southWest") => {
                serde_json::from_value::<LatLngBounds>(value.clone())
                    .map(Self::Bounds)
                    .map_err(|err| unsupported_json(key, "malformed bounds object").with_source(err))
            }
            Value::Object(map) if map.contains_key("lat") || map.contains_key("lng") => {
                serde_json::from_value::<LatLng>(value.clone())
                    .map(Self::LatLng)
                    .map_err(|err| unsupported_json(key, "malformed lat/lng object").with_source(err))
            }
            Value::Object(_) => Err(unsupported_json(key, "nested objects are not query values")),
            Value::Array(_) => Err(unsupported_json(key, "arrays are not query values")),
        }
    }
}

fn unsupported_json(key: &str, detail: &str) -> Error {
    Error::new(ErrorKind::Usage)
        .with_message(format!("cannot encode key `{key}`: {detail}"))
        .with_hint(
            "Values must be booleans, numbers, strings, null, {\"lat\",\"lng\"} or {\"northEast\",\"southWest\"}.",
        )
}

impl Serialize for QueryValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Number(value) if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*value as i64)
            }
            Self::Number(value) => serializer.serialize_f64(*value),
            Self::LatLng(point) => point.serialize(serializer),
            Self::Bounds(bounds) => bounds.serialize(serializer),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Null => serializer.serialize_unit(),
        }
    }
}

/// Typed key/value result of [`decode_query`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DecodedQuery(BTreeMap<String, QueryValue>);

impl DecodedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: QueryValue) -> Option<QueryValue> {
        self.0.insert(key.into(), value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, QueryValue> {
        self.0.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, QueryValue> {
        self.0
    }

    /// Builds a query from a JSON object, the inverse of serializing one.
    pub fn from_json(value: &Value) -> Result<Self, Error> {
        let Value::Object(map) = value else {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("expected a JSON object")
                .with_hint("Example: {\"page\": 2, \"origin\": {\"lat\": 1, \"lng\": 2}}"));
        };
        map.iter()
            .map(|(key, value)| QueryValue::from_json(key, value).map(|value| (key.clone(), value)))
            .collect()
    }
}

impl FromIterator<(String, QueryValue)> for DecodedQuery {
    fn from_iter<I: IntoIterator<Item = (String, QueryValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DecodedQuery {
    type Item = (&'a String, &'a QueryValue);
    type IntoIter = btree_map::Iter<'a, String, QueryValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Decodes `raw` (optionally prefixed by `?` or `#`) into typed values.
pub fn decode_query(raw: &str, config: &DecodeConfig) -> DecodedQuery {
    let body = raw
        .strip_prefix('?')
        .or_else(|| raw.strip_prefix('#'))
        .unwrap_or(raw);

    let mut decoded = DecodedQuery::new();
    // A bare key (`?flag`) yields an empty value and so `Text("")`, never `Null`;
    // `Null` stays reserved for geographic keys that failed to decode.
    for (key, value) in form_urlencoded::parse(body.as_bytes()) {
        let coerced = coerce_value(&key, &value, config);
        decoded.insert(key.into_owned(), coerced);
    }
    tracing::trace!(keys = decoded.len(), "decoded query");
    decoded
}

fn coerce_value(key: &str, raw: &str, config: &DecodeConfig) -> QueryValue {
    if config.latlng.contains(key) {
        return match decode_lat_lng(raw) {
            Some(point) => QueryValue::LatLng(point),
            None => {
                tracing::debug!(key, raw, "latlng value did not decode");
                QueryValue::Null
            }
        };
    }
    if config.latlng_bounds.contains(key) {
        return match decode_lat_lng_bounds(raw) {
            Some(bounds) => QueryValue::Bounds(bounds),
            None => {
                tracing::debug!(key, raw, "bounds value did not decode");
                QueryValue::Null
            }
        };
    }
    match raw {
        "true" => QueryValue::Bool(true),
        "false" => QueryValue::Bool(false),
        _ => parse_numeral(raw)
            .map(QueryValue::Number)
            .unwrap_or_else(|| QueryValue::Text(raw.to_string())),
    }
}

/// Writes `query` back as `key=value&...` in key order.
pub fn encode_query(query: &DecodedQuery) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        serializer.append_pair(key, &value.to_query_text());
    }
    serializer.finish()
}
