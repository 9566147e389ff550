//! Salt codec.
//!
//! A salted token is `<uuid-v4>:<type>:<text>`, for example
//! `3b2f...-4...:number:5`. The random prefix makes the leaf hash of a
//! low-entropy value (a boolean, a short enum) unguessable.
//!
//! Decoding is soft: a string without a valid UUID-v4 prefix is plain data and
//! comes back unchanged. This is what lets salted and unsalted trees share
//! one `Value` representation.

use uuid::Uuid;

use crate::config::LimitsConfig;
use crate::errors::{AttestError, AttestResult};
use crate::path;
use crate::value::Value;

/// Length of a hyphenated UUID.
const UUID_LEN: usize = 36;

/// Encode a primitive with a fresh salt.
///
/// Containers have no token form and are rejected.
pub fn encode(value: &Value) -> AttestResult<String> {
    encode_with_salt(&Uuid::new_v4(), value)
}

/// Encode a primitive with a caller-supplied salt.
pub fn encode_with_salt(salt: &Uuid, value: &Value) -> AttestResult<String> {
    let text = match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Map(_) => {
            return Err(AttestError::invalid_argument(
                "only primitive values can be salted",
            ))
        }
    };
    // type_tag is always Some for primitives.
    let tag = value.type_tag().unwrap_or("undefined");
    Ok(format!("{}:{tag}:{text}", salt.hyphenated()))
}

/// Split a token into its salt and the `type:text` remainder, if it has a
/// valid UUID-v4 prefix.
fn split_salt(token: &str) -> Option<(Uuid, &str)> {
    let prefix = token.get(..UUID_LEN)?;
    let rest = token.get(UUID_LEN..)?.strip_prefix(':')?;
    let salt = Uuid::parse_str(prefix).ok()?;
    if salt.get_version_num() != 4 || salt.get_variant() != uuid::Variant::RFC4122 {
        return None;
    }
    Some((salt, rest))
}

/// True when `s` starts with a UUID-v4 salt.
pub fn is_salted(s: &str) -> bool {
    split_salt(s).is_some()
}

/// Decode a token back to its typed primitive.
///
/// Strings without a salt prefix are returned as-is.
pub fn decode(token: &str) -> AttestResult<Value> {
    let Some((_, rest)) = split_salt(token) else {
        return Ok(Value::String(token.to_string()));
    };

    // Only the first separator after the salt splits; the value may contain ':'.
    let (tag, text) = rest.split_once(':').unwrap_or((rest, ""));

    match tag {
        "string" => Ok(Value::String(text.to_string())),
        "number" => decode_number(text),
        "boolean" => Ok(Value::Bool(text == "true")),
        "null" => Ok(Value::Null),
        "undefined" => Ok(Value::Undefined),
        other => Err(AttestError::UnknownTypeTag {
            tag: other.to_string(),
        }),
    }
}

fn decode_number(text: &str) -> AttestResult<Value> {
    if let Ok(n) = text.parse::<u64>() {
        return Ok(Value::from(n));
    }
    if let Ok(n) = text.parse::<i64>() {
        return Ok(Value::from(n));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| AttestError::malformed_token(format!("invalid number {text:?}")))
}

/// Decode a stored leaf of any type: strings go through `decode`, other
/// primitives are already plain.
pub fn decode_value(value: &Value) -> AttestResult<Value> {
    match value {
        Value::String(s) => decode(s),
        other => Ok(other.clone()),
    }
}

/// Salt every primitive of a document.
///
/// `Undefined` slots are dropped: a freshly salted document has no holes, so
/// every hole in stored data stands for a redacted leaf.
/// With `preserve_salted`, strings that already carry a salt are kept, which
/// lets an already-wrapped payload reproduce its original digest.
pub fn salt_document(value: &Value, preserve_salted: bool, limits: &LimitsConfig) -> AttestResult<Value> {
    path::try_map_leaves(value, limits, &mut |leaf: &Value| match leaf {
        Value::Undefined => Ok(Value::Undefined),
        Value::String(s) if preserve_salted && is_salted(s) => Ok(leaf.clone()),
        prim => encode(prim).map(Value::String),
    })
    .map(Value::without_holes)
}

/// Recover the plain claim view of a salted document.
///
/// Holes left by redaction are not claims and are left out of the view.
pub fn unsalt_document(value: &Value, limits: &LimitsConfig) -> AttestResult<Value> {
    path::try_map_leaves(value, limits, &mut decode_value).map(Value::without_holes)
}
