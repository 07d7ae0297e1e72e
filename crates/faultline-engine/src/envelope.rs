//! The `{ "type": ..., "<body>": { ... } }` shape shared by step and
//! processor settings.

use serde_json::{Map, Value};

pub(crate) struct Envelope {
    pub(crate) type_name: String,
    pub(crate) body: Value,
}

pub(crate) enum EnvelopeError {
    /// Not JSON, or not an object. The entry is skipped.
    Malformed(serde_json::Error),
    /// Well-formed but unusable. Fatal.
    Invalid(String),
}

impl From<serde_json::Error> for EnvelopeError {
    fn from(err: serde_json::Error) -> Self {
        EnvelopeError::Malformed(err)
    }
}

pub(crate) fn parse(raw: &str, body_key: &str) -> Result<Envelope, EnvelopeError> {
    let document: Value = serde_json::from_str(raw)?;
    let Value::Object(envelope) = document else {
        return Err(EnvelopeError::Malformed(
            <serde_json::Error as serde::de::Error>::custom("setting must be a JSON object"),
        ));
    };

    let type_name = match field(&envelope, "type") {
        Some(Value::String(name)) => name.trim().to_string(),
        _ => return Err(EnvelopeError::Invalid("missing string 'type'".into())),
    };
    let body = match field(&envelope, body_key) {
        Some(Value::Null) | None => {
            return Err(EnvelopeError::Invalid(format!("missing '{body_key}' object")))
        }
        Some(body) => body.clone(),
    };

    Ok(Envelope { type_name, body })
}

/// Looks a key up exactly, then case-insensitively.
pub(crate) fn field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    })
}

/// Compares a discriminator against `name`, case-insensitively and with an
/// optional trailing `suffix`.
pub(crate) fn names(discriminator: &str, name: &str, suffix: &str) -> bool {
    if discriminator.eq_ignore_ascii_case(name) {
        return true;
    }
    discriminator.len() == name.len() + suffix.len()
        && discriminator.is_char_boundary(name.len())
        && discriminator[..name.len()].eq_ignore_ascii_case(name)
        && discriminator[name.len()..].eq_ignore_ascii_case(suffix)
}
