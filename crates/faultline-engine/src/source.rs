//! Where configuration sections come from.

use crate::envelope::field;
use crate::EngineError;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// The four sections a registry is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Processors,
    Steps,
    Policies,
    Clients,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Processors => "Processors",
            Section::Steps => "Steps",
            Section::Policies => "Policies",
            Section::Clients => "Clients",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads named configuration sections.
pub trait ConfigurationSource {
    /// `(name, raw JSON)` entries of `section` in document order, or `None`
    /// when the section does not exist.
    fn section(&self, section: Section) -> Option<Vec<(String, String)>>;
}

/// A configuration document with one object per section:
///
/// ```json
/// {
///   "Steps":      { "wait": { "type": "Delay", "step": { "time": 0.5 } } },
///   "Processors": { "slow": { "type": "Request", "processor": { "steps": ["wait"] } } },
///   "Policies":   {},
///   "Clients":    {}
/// }
/// ```
///
/// Entry values may be objects or strings holding JSON.
#[derive(Debug, Clone)]
pub struct JsonConfigurationSource {
    root: serde_json::Map<String, Value>,
}

impl JsonConfigurationSource {
    pub fn parse(document: &str) -> Result<Self, EngineError> {
        Self::from_value(serde_json::from_str(document)?)
    }

    pub fn from_value(document: Value) -> Result<Self, EngineError> {
        match document {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(EngineError::InvalidDocument(
                <serde_json::Error as serde::de::Error>::custom(
                    "configuration root must be a JSON object",
                ),
            )),
        }
    }
}

impl ConfigurationSource for JsonConfigurationSource {
    fn section(&self, section: Section) -> Option<Vec<(String, String)>> {
        let Value::Object(entries) = field(&self.root, section.as_str())? else {
            return None;
        };
        Some(
            entries
                .iter()
                .map(|(name, value)| {
                    let raw = match value {
                        Value::String(raw) => raw.clone(),
                        other => other.to_string(),
                    };
                    (name.clone(), raw)
                })
                .collect(),
        )
    }
}

/// Sections keyed by [`Section::as_str`].
impl ConfigurationSource for HashMap<String, Vec<(String, String)>> {
    fn section(&self, section: Section) -> Option<Vec<(String, String)>> {
        self.get(section.as_str()).cloned()
    }
}
