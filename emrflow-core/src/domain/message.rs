//! Pipeline control messages
//!
//! The same five-field mapping is used as the launch trigger payload and as
//! the downstream trigger published after a successful step. The two travel
//! in different text forms:
//! - the launch trigger arrives as a single-quoted mapping literal,
//!   `{'group': 'Sample Group', 'project': ...}`
//! - the downstream trigger is sent as JSON with `", "` and `": "` separators
//!   and non-ASCII characters escaped, `{"group": "techLeads", ...}`

use serde::ser::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use std::io;

/// A pipeline stage signal
///
/// Field order is significant: both text forms list the fields in declaration
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineMessage {
    pub group: String,
    pub project: String,
    pub version: String,
    pub environment: String,
    pub job: String,
}

impl PipelineMessage {
    /// Names of the fields, in canonical order
    pub const FIELDS: [&'static str; 5] = ["group", "project", "version", "environment", "job"];

    /// The payload that triggers the Spark job launch
    pub fn default_trigger() -> Self {
        Self {
            group: "Sample Group".to_string(),
            project: "Hadoop Project".to_string(),
            version: "1.0".to_string(),
            environment: "AWS Production".to_string(),
            job: "sampleSparkJob".to_string(),
        }
    }

    /// The payload sent downstream once the Spark step completes
    pub fn default_downstream() -> Self {
        Self {
            group: "techLeads".to_string(),
            project: "ETL".to_string(),
            version: "default".to_string(),
            environment: "Snowflake Prod".to_string(),
            job: "Spark_Post_Map".to_string(),
        }
    }

    /// Parses a message from a JSON object with exactly the five fields
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Renders the message as a single-quoted mapping literal
    ///
    /// This is the exact text trigger producers put on the launch queue.
    pub fn mapping_literal(&self) -> String {
        let pairs = Self::FIELDS
            .iter()
            .map(|name| {
                format!(
                    "{}: {}",
                    quote_literal(name),
                    quote_literal(self.field(name).unwrap_or_default())
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!("{{{}}}", pairs)
    }

    /// Serializes the message as the JSON body sent to downstream consumers
    pub fn json_body(&self) -> serde_json::Result<String> {
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(out).map_err(serde_json::Error::custom)
    }

    /// Returns the value of a field by name
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "group" => Some(&self.group),
            "project" => Some(&self.project),
            "version" => Some(&self.version),
            "environment" => Some(&self.environment),
            "job" => Some(&self.job),
            _ => None,
        }
    }
}

/// Quotes a string the way a mapping literal does: single quotes unless the
/// value contains a single quote and no double quote
fn quote_literal(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// JSON formatter with spaced separators and ASCII-only output
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_literal_of_default_trigger() {
        assert_eq!(
            PipelineMessage::default_trigger().mapping_literal(),
            "{'group': 'Sample Group', 'project': 'Hadoop Project', 'version': '1.0', \
             'environment': 'AWS Production', 'job': 'sampleSparkJob'}"
        );
    }

    #[test]
    fn test_mapping_literal_quoting() {
        assert_eq!(quote_literal("plain"), "'plain'");
        assert_eq!(quote_literal("it's"), "\"it's\"");
        assert_eq!(quote_literal("both ' and \""), "'both \\' and \"'");
        assert_eq!(quote_literal("a\\b\nc"), "'a\\\\b\\nc'");
    }

    #[test]
    fn test_json_body_of_default_downstream() {
        let body = PipelineMessage::default_downstream().json_body().unwrap();
        assert_eq!(
            body,
            r#"{"group": "techLeads", "project": "ETL", "version": "default", "environment": "Snowflake Prod", "job": "Spark_Post_Map"}"#
        );
        assert_eq!(
            PipelineMessage::from_json(&body).unwrap(),
            PipelineMessage::default_downstream()
        );
    }

    #[test]
    fn test_json_body_escapes_non_ascii() {
        let mut message = PipelineMessage::default_downstream();
        message.environment = "Zürich 🚀".to_string();

        let body = message.json_body().unwrap();
        assert!(body.contains(r#""environment": "Z\u00fcrich \ud83d\ude80""#));
        assert!(body.is_ascii());
    }

    #[test]
    fn test_from_json_rejects_extra_fields() {
        let raw = r#"{"group":"a","project":"b","version":"c","environment":"d","job":"e","extra":"f"}"#;
        assert!(PipelineMessage::from_json(raw).is_err());
    }

    #[test]
    fn test_from_json_accepts_any_order() {
        let raw = r#"{"job":"Spark_Post_Map","group":"techLeads","version":"default","project":"ETL","environment":"Snowflake Prod"}"#;
        let message = PipelineMessage::from_json(raw).unwrap();
        assert_eq!(message, PipelineMessage::default_downstream());
    }

    #[test]
    fn test_field_lookup() {
        let message = PipelineMessage::default_downstream();
        for name in PipelineMessage::FIELDS {
            assert!(message.field(name).is_some());
        }
        assert_eq!(message.field("job"), Some("Spark_Post_Map"));
        assert_eq!(message.field("owner"), None);
    }
}
