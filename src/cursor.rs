//! Tag/key/value traversal positions over a [`Document`].

use crate::document::{Document, KeyField, TagField};

/// Three nested positions into a document.
///
/// The key position is only meaningful within the current tag and the value
/// position only within the current key. Moving a level (rewind or next)
/// rewinds every level below it. Keys without values are stepped over, and so
/// are tags without such keys; they remain visible through the [`Document`]
/// and the counting helpers. Positions are indices, so a cursor holds no
/// borrow and stays valid while the document only grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    tag: Option<usize>,
    key: Option<usize>,
    val: Option<usize>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag_index(&self) -> Option<usize> {
        self.tag
    }

    pub fn key_index(&self) -> Option<usize> {
        self.key
    }

    pub fn val_index(&self) -> Option<usize> {
        self.val
    }

    pub fn tag_field<'d>(&self, doc: &'d Document) -> Option<&'d TagField> {
        doc.tag(self.tag?)
    }

    pub fn key_field<'d>(&self, doc: &'d Document) -> Option<&'d KeyField> {
        self.tag_field(doc)?.keys().get(self.key?)
    }

    pub fn value<'d>(&self, doc: &'d Document) -> Option<&'d str> {
        self.key_field(doc)?
            .values()
            .get(self.val?)
            .map(String::as_str)
    }

    /// Moves to the first tag holding at least one valued key.
    pub fn tag_rewind<'d>(&mut self, doc: &'d Document) -> Option<&'d TagField> {
        self.settle_tag(doc, 0)
    }

    /// Moves to the following tag holding at least one valued key; `None`
    /// once past the last one.
    pub fn tag_next<'d>(&mut self, doc: &'d Document) -> Option<&'d TagField> {
        match self.tag {
            Some(i) => self.settle_tag(doc, i + 1),
            None => self.settle_tag(doc, doc.len()),
        }
    }

    fn settle_tag<'d>(&mut self, doc: &'d Document, from: usize) -> Option<&'d TagField> {
        for i in from..doc.len() {
            self.tag = Some(i);
            if self.key_rewind(doc).is_some() {
                return self.tag_field(doc);
            }
        }
        *self = Self::default();
        None
    }

    /// Moves to the first key of the current tag that has values.
    pub fn key_rewind<'d>(&mut self, doc: &'d Document) -> Option<&'d KeyField> {
        self.settle_key(doc, 0)
    }

    /// Moves to the following key of the current tag that has values.
    pub fn key_next<'d>(&mut self, doc: &'d Document) -> Option<&'d KeyField> {
        match self.key {
            Some(i) => self.settle_key(doc, i + 1),
            None => self.settle_key(doc, usize::MAX),
        }
    }

    fn settle_key<'d>(&mut self, doc: &'d Document, from: usize) -> Option<&'d KeyField> {
        let len = self.tag_field(doc).map_or(0, |t| t.keys().len());
        for i in from..len {
            self.key = Some(i);
            if self.val_rewind(doc).is_some() {
                return self.key_field(doc);
            }
        }
        self.key = None;
        self.val = None;
        None
    }

    /// Moves to the first value of the current key. A key without values
    /// yields `None` right away.
    pub fn val_rewind<'d>(&mut self, doc: &'d Document) -> Option<&'d str> {
        self.val = self
            .key_field(doc)
            .and_then(|k| (!k.is_empty()).then_some(0));
        self.value(doc)
    }

    /// Moves to the following value of the current key.
    pub fn val_next<'d>(&mut self, doc: &'d Document) -> Option<&'d str> {
        let len = self.key_field(doc).map_or(0, |k| k.values().len());
        self.val = self.val.map(|i| i + 1).filter(|&i| i < len);
        self.value(doc)
    }

    /// Points the cursor at the last tag and its last key, as the parser
    /// leaves it after appending.
    pub(crate) fn seek(&mut self, tag: Option<usize>, key: Option<usize>) {
        self.tag = tag;
        self.key = key;
        self.val = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new();
        let a = doc.add_tag("a");
        let x = a.add_key("x");
        x.push_value("1");
        x.push_value("2");
        a.add_key("empty");
        a.add_key("y").push_value("3");
        doc.add_tag("bare");
        doc.add_tag("b").add_key("z").push_value("4");
        doc
    }

    #[test]
    fn test_walk_everything() {
        let doc = sample();
        let mut cursor = Cursor::new();
        let mut seen = Vec::new();

        let mut tag = cursor.tag_rewind(&doc);
        while let Some(t) = tag {
            let mut key = cursor.key_rewind(&doc);
            while let Some(k) = key {
                let mut val = cursor.val_rewind(&doc);
                let mut vals = Vec::new();
                while let Some(v) = val {
                    vals.push(v.to_string());
                    val = cursor.val_next(&doc);
                }
                seen.push(format!("{}/{}={}", t.name(), k.name(), vals.join(",")));
                key = cursor.key_next(&doc);
            }
            tag = cursor.tag_next(&doc);
        }

        assert_eq!(seen, vec!["a/x=1,2", "a/y=3", "b/z=4"]);
    }

    #[test]
    fn test_tag_without_keys_is_skipped() {
        let doc = sample();
        let mut cursor = Cursor::new();
        assert_eq!(cursor.tag_rewind(&doc).unwrap().name(), "a");
        assert_eq!(cursor.tag_next(&doc).unwrap().name(), "b");
        assert_eq!(cursor.tag_index(), Some(2));
    }

    #[test]
    fn test_empty_key_is_skipped() {
        let doc = sample();
        let mut cursor = Cursor::new();
        cursor.tag_rewind(&doc);
        assert_eq!(cursor.key_field(&doc).unwrap().name(), "x");
        assert_eq!(cursor.key_next(&doc).unwrap().name(), "y");
        assert_eq!(cursor.value(&doc), Some("3"));
        assert_eq!(doc.tag(0).unwrap().count_key("empty"), 1);
    }

    #[test]
    fn test_leading_empty_key_and_tag_skipped_on_rewind() {
        let mut doc = Document::new();
        doc.add_tag("marker");
        let t = doc.add_tag("t");
        t.add_key("empty");
        t.add_key("full").push_value("1");

        let mut cursor = Cursor::new();
        assert_eq!(cursor.tag_rewind(&doc).unwrap().name(), "t");
        assert_eq!(cursor.key_field(&doc).unwrap().name(), "full");
        assert_eq!(cursor.value(&doc), Some("1"));
    }

    #[test]
    fn test_tag_of_only_empty_keys_is_skipped() {
        let mut doc = Document::new();
        doc.add_tag("hollow").add_key("empty");

        let mut cursor = Cursor::new();
        assert!(cursor.tag_rewind(&doc).is_none());
        assert!(cursor.key_field(&doc).is_none());
        assert!(cursor.val_rewind(&doc).is_none());
    }

    #[test]
    fn test_rewind_resets_nested_levels() {
        let doc = sample();
        let mut cursor = Cursor::new();
        cursor.tag_rewind(&doc);
        cursor.key_next(&doc);
        assert_eq!(cursor.value(&doc), Some("3"));

        cursor.tag_rewind(&doc);
        assert_eq!(cursor.key_field(&doc).unwrap().name(), "x");
        assert_eq!(cursor.value(&doc), Some("1"));
    }

    #[test]
    fn test_next_past_end_stays_empty() {
        let doc = sample();
        let mut cursor = Cursor::new();
        cursor.tag_rewind(&doc);
        cursor.tag_next(&doc);
        assert!(cursor.tag_next(&doc).is_none());
        assert!(cursor.tag_next(&doc).is_none());
        assert!(cursor.key_rewind(&doc).is_none());
        assert!(cursor.key_next(&doc).is_none());
        assert!(cursor.val_rewind(&doc).is_none());
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::new();
        let mut cursor = Cursor::new();
        assert!(cursor.tag_rewind(&doc).is_none());
        assert!(cursor.key_rewind(&doc).is_none());
        assert!(cursor.val_rewind(&doc).is_none());
    }
}
