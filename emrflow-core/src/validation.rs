//! Trigger payload validation
//!
//! Decides whether a queue message body is the launch trigger. Two modes
//! exist:
//! - `Literal` compares the body byte for byte with the payload's mapping
//!   literal, `{'group': 'Sample Group', ...}`. Reordered keys, other quoting,
//!   whitespace or extra fields are rejected. This is how upstream producers
//!   have always been matched, so it stays the default.
//! - `Structural` also accepts the mapping literal, and otherwise parses the
//!   body as JSON and checks the declared fields, ignoring key order and
//!   formatting.

use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

use crate::domain::message::PipelineMessage;

/// How message bodies are compared with the expected payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Literal,
    Structural,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "literal" => Ok(MatchMode::Literal),
            "structural" => Ok(MatchMode::Structural),
            other => Err(format!(
                "unknown match mode '{}' (expected 'literal' or 'structural')",
                other
            )),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Literal => write!(f, "literal"),
            MatchMode::Structural => write!(f, "structural"),
        }
    }
}

/// Result of checking a body against the trigger payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerMatch {
    Accepted,
    Rejected(Rejection),
}

impl TriggerMatch {
    pub fn is_accepted(&self) -> bool {
        matches!(self, TriggerMatch::Accepted)
    }
}

/// Why a body was not accepted as the trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Literal mode: the body differs from the mapping literal
    NotCanonical,
    /// The body is not valid JSON
    NotJson(String),
    /// The body is JSON but not an object
    NotAnObject,
    MissingField(&'static str),
    UnexpectedField(String),
    FieldMismatch {
        field: &'static str,
        expected: String,
        found: String,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotCanonical => {
                write!(f, "body does not equal the canonical trigger payload")
            }
            Rejection::NotJson(err) => write!(f, "body is not valid JSON: {}", err),
            Rejection::NotAnObject => write!(f, "body is not a JSON object"),
            Rejection::MissingField(field) => write!(f, "missing field '{}'", field),
            Rejection::UnexpectedField(field) => write!(f, "unexpected field '{}'", field),
            Rejection::FieldMismatch {
                field,
                expected,
                found,
            } => write!(
                f,
                "field '{}' is {} (expected \"{}\")",
                field, found, expected
            ),
        }
    }
}

/// Matches queue message bodies against the expected trigger payload
#[derive(Debug, Clone)]
pub struct TriggerValidator {
    expected: PipelineMessage,
    canonical: String,
    mode: MatchMode,
}

impl TriggerValidator {
    /// Creates a validator for the given payload
    pub fn new(expected: PipelineMessage, mode: MatchMode) -> Self {
        let canonical = expected.mapping_literal();
        Self {
            expected,
            canonical,
            mode,
        }
    }

    /// The exact body accepted in literal mode
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Checks a message body
    pub fn check(&self, body: &str) -> TriggerMatch {
        match self.mode {
            MatchMode::Literal => {
                if body == self.canonical {
                    TriggerMatch::Accepted
                } else {
                    TriggerMatch::Rejected(Rejection::NotCanonical)
                }
            }
            MatchMode::Structural => match self.check_structure(body) {
                Ok(()) => TriggerMatch::Accepted,
                Err(rejection) => TriggerMatch::Rejected(rejection),
            },
        }
    }

    fn check_structure(&self, body: &str) -> Result<(), Rejection> {
        if body == self.canonical {
            return Ok(());
        }

        let value: JsonValue =
            serde_json::from_str(body).map_err(|e| Rejection::NotJson(e.to_string()))?;
        let object = value.as_object().ok_or(Rejection::NotAnObject)?;

        for field in PipelineMessage::FIELDS {
            let expected = self.expected.field(field).unwrap_or_default();
            match object.get(field) {
                None => return Err(Rejection::MissingField(field)),
                Some(JsonValue::String(found)) if found == expected => {}
                Some(found) => {
                    return Err(Rejection::FieldMismatch {
                        field,
                        expected: expected.to_string(),
                        found: found.to_string(),
                    });
                }
            }
        }

        if let Some(extra) = object
            .keys()
            .find(|key| !PipelineMessage::FIELDS.contains(&key.as_str()))
        {
            return Err(Rejection::UnexpectedField(extra.clone()));
        }

        Ok(())
    }
}
