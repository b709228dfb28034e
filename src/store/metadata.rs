//! Frontmatter handling: splitting the leading `---` block and turning its YAML
//! into a loose key/value map.

use serde_yaml_ng::Value as YamlValue;

use crate::error::{NotegraphError, Result};

/// A frontmatter value, reduced to the shapes link extraction cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Null,
    Scalar(String),
    List(Vec<MetaValue>),
}

impl MetaValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        MetaValue::Scalar(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MetaValue::List(values.into_iter().map(|v| MetaValue::Scalar(v.into())).collect())
    }
}

impl From<&YamlValue> for MetaValue {
    fn from(value: &YamlValue) -> Self {
        match value {
            YamlValue::Null => MetaValue::Null,
            YamlValue::Bool(b) => MetaValue::Scalar(b.to_string()),
            YamlValue::Number(n) => MetaValue::Scalar(n.to_string()),
            YamlValue::String(s) => MetaValue::Scalar(s.clone()),
            YamlValue::Sequence(seq) => MetaValue::List(seq.iter().map(MetaValue::from).collect()),
            // Nested maps never name a document
            YamlValue::Mapping(_) => MetaValue::Null,
            YamlValue::Tagged(tagged) => MetaValue::from(&tagged.value),
        }
    }
}

/// Structured metadata of one document, in frontmatter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, MetaValue)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML frontmatter block. Non-mapping documents yield empty metadata.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::new());
        }

        let value: YamlValue = serde_yaml_ng::from_str(yaml)
            .map_err(|e| NotegraphError::Parse(e.to_string()))?;

        let mut metadata = Self::new();
        if let YamlValue::Mapping(map) = value {
            for (key, value) in map {
                let key = match key {
                    YamlValue::String(s) => s,
                    YamlValue::Number(n) => n.to_string(),
                    YamlValue::Bool(b) => b.to_string(),
                    _ => continue,
                };
                metadata.insert(key, MetaValue::from(&value));
            }
        }
        Ok(metadata)
    }

    /// Parse the frontmatter of a full document; malformed YAML gives empty metadata.
    pub fn from_document(content: &str) -> Self {
        match split_frontmatter(content).0 {
            Some(yaml) => Self::from_yaml(yaml).unwrap_or_else(|e| {
                log::debug!("ignoring unparseable frontmatter: {}", e);
                Self::new()
            }),
            None => Self::new(),
        }
    }

    /// Insert or replace a key (case-insensitive match on replace).
    pub fn insert(&mut self, key: impl Into<String>, value: MetaValue) {
        let key = key.into();
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Case-insensitive lookup (`LeadsTo:` and `leadsto:` are the same key).
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split a document into its frontmatter YAML (if a leading `---` block is
/// present and terminated) and the remaining body.
pub fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let text = content.strip_prefix('\u{feff}').unwrap_or(content);
    let first_line_end = match text.find('\n') {
        Some(idx) => idx,
        None => return (None, content),
    };
    if text[..first_line_end].trim_end() != "---" {
        return (None, content);
    }

    let yaml_start = first_line_end + 1;
    let mut offset = yaml_start;
    for line in text[yaml_start..].split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &text[yaml_start..offset];
            let body = &text[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }

    // Unterminated block: everything is body
    (None, content)
}

/// Body text with any leading frontmatter block removed.
pub fn strip_frontmatter(content: &str) -> &str {
    split_frontmatter(content).1
}
