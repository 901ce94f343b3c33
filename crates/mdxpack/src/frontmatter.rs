//! Front matter extraction.
//!
//! An MDX document may open with a fenced YAML block. Extraction splits the
//! block from the body, parses it into a typed record, and keeps the raw
//! pieces around so callers can see the whole split. A missing block yields
//! an empty record, never an error.

use bon::Builder;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::{Error, Result};

/// Front matter extraction settings.
#[derive(Debug, Clone, Builder)]
#[builder(on(String, into))]
pub struct MatterOptions {
    /// Fence delimiter for the block.
    #[builder(default = String::from("---"))]
    pub delimiter: String,
    /// Extract an excerpt from the body.
    #[builder(default)]
    pub excerpt: bool,
    /// Separator marking the end of the excerpt. Defaults to the fence
    /// delimiter when `excerpt` is set.
    pub excerpt_separator: Option<String>,
}

impl Default for MatterOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// One front matter value.
///
/// Scalars shaped like ISO dates are coerced: `published: 2021-02-13`
/// becomes [`MatterValue::Date`] for that calendar date.
#[derive(Debug, Clone, PartialEq)]
pub enum MatterValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    Sequence(Vec<MatterValue>),
    Mapping(BTreeMap<String, MatterValue>),
}

impl MatterValue {
    fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => MatterValue::Null,
            JsonValue::Bool(b) => MatterValue::Bool(b),
            JsonValue::Number(n) => MatterValue::Number(n),
            JsonValue::String(s) => coerce_scalar(s),
            JsonValue::Array(items) => {
                MatterValue::Sequence(items.into_iter().map(Self::from_json).collect())
            }
            JsonValue::Object(map) => MatterValue::Mapping(
                map.into_iter().map(|(k, v)| (k, Self::from_json(v))).collect(),
            ),
        }
    }

    /// JSON rendering; dates come back as ISO strings.
    pub fn to_json(&self) -> JsonValue {
        match self {
            MatterValue::Null => JsonValue::Null,
            MatterValue::Bool(b) => JsonValue::Bool(*b),
            MatterValue::Number(n) => JsonValue::Number(n.clone()),
            MatterValue::String(s) => JsonValue::String(s.clone()),
            MatterValue::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
            MatterValue::DateTime(dt) => JsonValue::String(dt.to_rfc3339()),
            MatterValue::Sequence(items) => {
                JsonValue::Array(items.iter().map(MatterValue::to_json).collect())
            }
            MatterValue::Mapping(map) => JsonValue::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MatterValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            MatterValue::Date(d) => Some(*d),
            MatterValue::DateTime(dt) => Some(dt.date_naive()),
            _ => None,
        }
    }
}

/// ISO date coercion for plain scalars. YAML leaves `2021-02-13` as a
/// string, so the coercion happens here.
fn coerce_scalar(s: String) -> MatterValue {
    if let Ok(date) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        return MatterValue::Date(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return MatterValue::DateTime(dt);
    }
    MatterValue::String(s)
}

/// The parsed front matter record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter(pub BTreeMap<String, MatterValue>);

impl Frontmatter {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&MatterValue> {
        self.0.get(key)
    }

    /// JSON rendering of the whole record.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// JavaScript object literal for splicing into compiled output.
    pub fn to_js_literal(&self) -> String {
        self.to_json().to_string()
    }
}

/// The full result of splitting a document.
#[derive(Debug, Clone)]
pub struct MatterFile {
    /// Parsed record; empty when no block is present.
    pub data: Frontmatter,
    /// Document body with the block removed.
    pub content: String,
    /// Raw text between the fences.
    pub raw: String,
    /// Body text above the excerpt separator, when requested and present.
    pub excerpt: Option<String>,
}

/// Split a document into front matter and body.
pub fn split(source: &str, options: &MatterOptions) -> Result<MatterFile> {
    let delimiter = options.delimiter.as_str();

    let Some(rest) = strip_open_fence(source, delimiter) else {
        return Ok(MatterFile {
            data: Frontmatter::default(),
            content: source.to_string(),
            raw: String::new(),
            excerpt: extract_excerpt(source, options),
        });
    };

    let close = format!("\n{delimiter}");
    let Some(end) = find_close_fence(rest, &close) else {
        // An unterminated fence is treated as body text.
        return Ok(MatterFile {
            data: Frontmatter::default(),
            content: source.to_string(),
            raw: String::new(),
            excerpt: extract_excerpt(source, options),
        });
    };

    let raw = rest[..end].to_string();
    let mut content = &rest[end + close.len()..];
    content = content
        .strip_prefix("\r\n")
        .or_else(|| content.strip_prefix('\n'))
        .unwrap_or(content);

    let data = parse_yaml(&raw)?;
    let excerpt = extract_excerpt(content, options);

    Ok(MatterFile {
        data,
        content: content.to_string(),
        raw,
        excerpt,
    })
}

fn strip_open_fence<'a>(source: &'a str, delimiter: &str) -> Option<&'a str> {
    let rest = source.strip_prefix(delimiter)?;
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}

/// Find a closing fence that sits alone on its line.
fn find_close_fence(rest: &str, close: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(pos) = rest[from..].find(close) {
        let at = from + pos;
        let after = &rest[at + close.len()..];
        if after.is_empty() || after.starts_with('\n') || after.starts_with("\r\n") {
            return Some(at);
        }
        from = at + close.len();
    }
    None
}

fn parse_yaml(raw: &str) -> Result<Frontmatter> {
    if raw.trim().is_empty() {
        return Ok(Frontmatter::default());
    }

    let value: JsonValue =
        serde_saphyr::from_str(raw).map_err(|e| Error::Frontmatter(e.to_string()))?;

    match value {
        JsonValue::Null => Ok(Frontmatter::default()),
        JsonValue::Object(map) => Ok(Frontmatter(
            map.into_iter()
                .map(|(k, v)| (k, MatterValue::from_json(v)))
                .collect(),
        )),
        other => Err(Error::Frontmatter(format!(
            "expected a mapping at the top level, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a sequence",
        JsonValue::Object(_) => "a mapping",
    }
}

fn extract_excerpt(content: &str, options: &MatterOptions) -> Option<String> {
    if !options.excerpt && options.excerpt_separator.is_none() {
        return None;
    }
    let separator = options
        .excerpt_separator
        .as_deref()
        .unwrap_or(options.delimiter.as_str());
    content
        .find(separator)
        .map(|at| content[..at].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_block_yields_empty_record() {
        let result = split("# Just a title\n", &MatterOptions::default()).unwrap();
        assert!(result.data.is_empty());
        assert_eq!(result.content, "# Just a title\n");
        assert!(result.raw.is_empty());
    }

    #[test]
    fn parses_scalars_and_dates() {
        let source = "---\ntitle: This is the title\npublished: 2021-02-13\ndraft: false\n---\n\n# Body\n";
        let result = split(source, &MatterOptions::default()).unwrap();

        assert_eq!(
            result.data.get("title").and_then(MatterValue::as_str),
            Some("This is the title")
        );
        assert_eq!(
            result.data.get("published").and_then(MatterValue::as_date),
            NaiveDate::from_ymd_opt(2021, 2, 13)
        );
        assert_eq!(result.data.get("draft"), Some(&MatterValue::Bool(false)));
        assert_eq!(result.content, "\n# Body\n");
        assert_eq!(result.raw, "title: This is the title\npublished: 2021-02-13\ndraft: false");
    }

    #[test]
    fn unterminated_fence_is_body_text() {
        let source = "---\ntitle: oops\n\n# Body\n";
        let result = split(source, &MatterOptions::default()).unwrap();
        assert!(result.data.is_empty());
        assert_eq!(result.content, source);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let source = "---\ntitle: [unclosed\n---\n\nbody\n";
        let err = split(source, &MatterOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Frontmatter(_)));
    }

    #[test]
    fn non_mapping_block_is_an_error() {
        let source = "---\n- a\n- b\n---\n\nbody\n";
        let err = split(source, &MatterOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Frontmatter(_)));
    }

    #[test]
    fn excerpt_above_separator() {
        let source = "---\ntitle: t\n---\nA short lede.\n---\nThe rest.\n";
        let options = MatterOptions::builder().excerpt(true).build();
        let result = split(source, &options).unwrap();
        assert_eq!(result.excerpt.as_deref(), Some("A short lede."));
    }

    #[test]
    fn js_literal_renders_dates_as_iso_strings() {
        let source = "---\npublished: 2021-02-13\n---\nbody\n";
        let result = split(source, &MatterOptions::default()).unwrap();
        assert_eq!(result.data.to_js_literal(), r#"{"published":"2021-02-13"}"#);
    }

    #[test]
    fn custom_delimiter() {
        let source = "+++\ntitle: t\n+++\nbody\n";
        let options = MatterOptions::builder().delimiter("+++").build();
        let result = split(source, &options).unwrap();
        assert_eq!(result.data.get("title").and_then(MatterValue::as_str), Some("t"));
    }
}
