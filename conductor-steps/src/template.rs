//! Prompt templates with `{key}` placeholders.
//!
//! `{key}` is replaced by the rendered value of `key` from the step's
//! input snapshot: text verbatim, anything else as compact JSON. `{{` and
//! `}}` produce literal braces.

use flow0::context::ContextSnapshot;
use flow0::error::ContextError;
use std::mem;
use thiserror::Error;

/// Template syntax errors, reported with the byte offset of the problem.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A `{` was never closed.
    #[error("unclosed placeholder at byte {0}")]
    Unclosed(usize),
    /// A single `}` appeared outside a placeholder.
    #[error("unmatched '}}' at byte {0}")]
    UnmatchedClose(usize),
    /// `{}` with nothing inside.
    #[error("empty placeholder at byte {0}")]
    Empty(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Key(String),
}

/// A parsed prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse `source`, rejecting unbalanced braces.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((at, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut key = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        key.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::Unclosed(at));
                    }
                    let key = key.trim();
                    if key.is_empty() {
                        return Err(TemplateError::Empty(at));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(mem::take(&mut literal)));
                    }
                    segments.push(Segment::Key(key.to_owned()));
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(TemplateError::UnmatchedClose(at)),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_owned(),
            segments,
        })
    }

    /// The template text as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder keys in order of appearance (repeats included).
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Key(k) => Some(k.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every placeholder from `input`.
    pub fn render(&self, input: &ContextSnapshot) -> Result<String, ContextError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Key(key) => out.push_str(&input.get(key)?.render()),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow0::value::Value;
    use std::collections::BTreeMap;

    fn snapshot(pairs: &[(&str, Value)]) -> ContextSnapshot {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<BTreeMap<_, _>>()
            .into()
    }

    #[test]
    fn renders_text_verbatim_and_values_as_json() {
        let t = PromptTemplate::parse("Summarize {metrics} for {audience}.").unwrap();
        let input = snapshot(&[
            ("metrics", Value::map([("conversion_delta", Value::Float(0.14))])),
            ("audience", Value::text("the team")),
        ]);
        assert_eq!(
            t.render(&input).unwrap(),
            r#"Summarize {"conversion_delta":0.14} for the team."#
        );
    }

    #[test]
    fn double_braces_escape() {
        let t = PromptTemplate::parse("Answer as {{\"summary\": ...}} about { topic }").unwrap();
        assert_eq!(t.placeholders().collect::<Vec<_>>(), vec!["topic"]);
        let out = t.render(&snapshot(&[("topic", Value::text("sales"))])).unwrap();
        assert_eq!(out, "Answer as {\"summary\": ...} about sales");
    }

    #[test]
    fn rejects_unbalanced_braces() {
        assert_eq!(PromptTemplate::parse("oops {x"), Err(TemplateError::Unclosed(5)));
        assert_eq!(PromptTemplate::parse("a } b"), Err(TemplateError::UnmatchedClose(2)));
        assert_eq!(PromptTemplate::parse("{ }"), Err(TemplateError::Empty(0)));
    }

    #[test]
    fn missing_key_is_reported() {
        let t = PromptTemplate::parse("{absent}").unwrap();
        assert_eq!(
            t.render(&ContextSnapshot::default()),
            Err(ContextError::MissingKey {
                key: "absent".into()
            })
        );
    }

    #[test]
    fn template_without_placeholders_is_literal() {
        let t = PromptTemplate::parse("just text").unwrap();
        assert_eq!(t.placeholders().count(), 0);
        assert_eq!(t.render(&ContextSnapshot::default()).unwrap(), "just text");
        assert_eq!(t.source(), "just text");
    }
}
