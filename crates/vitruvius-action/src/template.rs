//! `{field}` message templates for declared errors.

use serde_json::{Map, Value};
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A compiled message template.
///
/// `{name}` is replaced by the raised field `name`; `{{` and `}}` are
/// literal braces. Strings render without quotes, other JSON values in
/// their compact form, and absent or null fields render as an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    segments: Vec<Segment>,
}

impl MessageTemplate {
    /// Compiles a template.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem for an unterminated or empty
    /// placeholder, or a stray `}`.
    pub fn parse(template: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((at, c)) = chars.next() {
            match c {
                '{' if chars.peek().is_some_and(|&(_, next)| next == '{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().is_some_and(|&(_, next)| next == '}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(format!("unterminated placeholder at byte {at}"));
                    }
                    let name = name.trim();
                    if name.is_empty() || name.contains('{') {
                        return Err(format!("invalid placeholder at byte {at}"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(name.to_string()));
                }
                '}' => return Err(format!("unmatched '}}' at byte {at}")),
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// Returns the placeholder names in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Renders the template against raised fields.
    #[must_use]
    pub fn render(&self, fields: &Map<String, Value>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => match fields.get(name) {
                    None | Some(Value::Null) => {}
                    Some(Value::String(s)) => out.push_str(s),
                    Some(other) => {
                        let _ = write!(out, "{other}");
                    }
                },
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_render_fields() {
        let template = MessageTemplate::parse("user {id} ({ name }) not found").unwrap();
        let rendered = template.render(&fields(json!({"id": 7, "name": "ada"})));
        assert_eq!(rendered, "user 7 (ada) not found");
        assert_eq!(template.placeholders().collect::<Vec<_>>(), ["id", "name"]);
    }

    #[test]
    fn test_missing_field_renders_empty() {
        let template = MessageTemplate::parse("missing [{x}]").unwrap();
        assert_eq!(template.render(&Map::new()), "missing []");
    }

    #[test]
    fn test_escaped_braces() {
        let template = MessageTemplate::parse("{{literal}} {v}").unwrap();
        assert_eq!(template.render(&fields(json!({"v": [1, 2]}))), "{literal} [1,2]");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(MessageTemplate::parse("user {id").is_err());
        assert!(MessageTemplate::parse("user {} x").is_err());
        assert!(MessageTemplate::parse("a } b").is_err());
        assert!(MessageTemplate::parse("{a{b}").is_err());
    }

    #[test]
    fn test_plain_text() {
        let template = MessageTemplate::parse("nothing to see").unwrap();
        assert_eq!(template.placeholders().count(), 0);
        assert_eq!(template.render(&Map::new()), "nothing to see");
    }
}
