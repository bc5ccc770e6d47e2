//! In-memory model of a parsed ZTK document.

use std::fmt::{self, Write as _};

/// A named entry within a [`TagField`], holding its values in source order.
///
/// The name is empty for the implicit key that collects values appearing
/// before any key in a tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyField {
    name: String,
    values: Vec<String>,
}

impl KeyField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn push_value(&mut self, value: impl Into<String>) {
        self.values.push(value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A bracketed section of a document.
///
/// Keys sharing a name stay separate entries; they are never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagField {
    name: String,
    keys: Vec<KeyField>,
}

impl TagField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &[KeyField] {
        &self.keys
    }

    /// Appends a new, empty key field and returns it.
    pub fn add_key(&mut self, name: impl Into<String>) -> &mut KeyField {
        self.keys.push(KeyField::new(name));
        let last = self.keys.len() - 1;
        &mut self.keys[last]
    }

    pub(crate) fn key_mut(&mut self, index: usize) -> Option<&mut KeyField> {
        self.keys.get_mut(index)
    }

    /// Number of key fields named `name`.
    pub fn count_key(&self, name: &str) -> usize {
        self.keys.iter().filter(|k| k.name == name).count()
    }
}

/// An ordered collection of tag fields.
///
/// Fields are kept in the order they were parsed, across included files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    tags: Vec<TagField>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tags(&self) -> &[TagField] {
        &self.tags
    }

    pub fn tag(&self, index: usize) -> Option<&TagField> {
        self.tags.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Appends a new, empty tag field and returns it.
    pub fn add_tag(&mut self, name: impl Into<String>) -> &mut TagField {
        self.tags.push(TagField::new(name));
        let last = self.tags.len() - 1;
        &mut self.tags[last]
    }

    pub(crate) fn tag_mut(&mut self, index: usize) -> Option<&mut TagField> {
        self.tags.get_mut(index)
    }

    /// Number of tag fields named `name`.
    pub fn count_tag(&self, name: &str) -> usize {
        self.tags.iter().filter(|t| t.name == name).count()
    }
}

/// Writes a token, quoting it when the scanner would otherwise split or
/// reinterpret it.
pub(crate) fn write_token(f: &mut dyn fmt::Write, token: &str) -> fmt::Result {
    if !needs_quotes(token) {
        return f.write_str(token);
    }
    f.write_char('"')?;
    for c in token.chars() {
        if c == '"' || c == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}

fn needs_quotes(token: &str) -> bool {
    token.is_empty()
        || token == "include"
        || token.starts_with('[')
        || token
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ',' | ':' | '#' | '"' | '\\'))
}

impl fmt::Display for KeyField {
    /// Writes `name: v1, v2`. The unnamed key writes its values only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.name.is_empty() {
            write_token(f, &self.name)?;
            f.write_str(":")?;
        }
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if i > 0 || !self.name.is_empty() {
                f.write_str(" ")?;
            }
            write_token(f, value)?;
        }
        Ok(())
    }
}

impl fmt::Display for TagField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.name)?;
        for key in &self.keys {
            writeln!(f, "{key}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tags.is_empty() {
            return writeln!(f, "(empty)");
        }
        for tag in &self.tags {
            write!(f, "{tag}")?;
        }
        Ok(())
    }
}
