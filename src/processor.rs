//! The ZTK format processor.

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::Options;
use crate::cursor::Cursor;
use crate::document::{Document, KeyField, TagField};
use crate::scanner::Scanner;
use crate::stack::FileStack;
use crate::Error;

/// Bare token that pulls another file into the document.
pub const INCLUDE: &str = "include";

/// Parses ZTK text into a [`Document`] and walks it with a tag/key/value
/// cursor.
///
/// The cursor belongs to the processor, so one processor supports one
/// traversal at a time. While parsing, the cursor tracks the tag and key
/// that incoming values attach to; rewind it before reading.
///
/// ## Example
///
/// ```
/// use ztk::Processor;
///
/// let mut ztk = Processor::new();
/// ztk.parse_str("[a]\nx: 1, 2, 3\n[b]\ny: hello\n");
///
/// assert_eq!(ztk.count_tag("a"), 1);
/// ztk.tag_rewind();
/// assert!(ztk.key_is("x"));
/// assert_eq!(ztk.int(), 1);
/// assert_eq!(ztk.val(), Some("2"));
/// ```
#[derive(Debug, Default)]
pub struct Processor {
    options: Options,
    files: FileStack,
    doc: Document,
    cursor: Cursor,
}

impl Processor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Creates a processor holding the document parsed from `path` and its
    /// includes.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let mut ztk = Self::new();
        ztk.parse(path)?;
        Ok(ztk)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Releases the document and closes any file still open.
    pub fn destroy(&mut self) {
        self.files.destroy();
        self.doc = Document::new();
        self.cursor = Cursor::new();
    }

    /// Parses the file at `path`, following its includes, and appends the
    /// result to the document.
    ///
    /// Failing to open or read `path` itself is an error. Includes that
    /// cannot be opened, or that would re-enter a file already being read,
    /// are skipped with a warning.
    pub fn parse(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        self.parse_path(path.as_ref(), false)
    }

    /// Parses an already-open stream. Relative includes are looked up in the
    /// configured include directories and the working directory.
    pub fn parse_reader(&mut self, mut reader: impl Read) -> Result<(), Error> {
        let mut source = String::new();
        reader.read_to_string(&mut source).map_err(Error::Stream)?;
        self.parse_source(&source);
        Ok(())
    }

    /// Parses in-memory text.
    pub fn parse_str(&mut self, source: &str) {
        self.parse_source(source);
    }

    fn parse_path(&mut self, path: &Path, nested: bool) -> Result<(), Error> {
        let mut first_error = None;
        let mut opened = None;
        for candidate in self.candidates(path, nested) {
            match self.files.push(&candidate) {
                Ok(_) => {
                    opened = Some(candidate);
                    break;
                }
                Err(e @ Error::AlreadyOpen(_)) => return Err(e),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        let Some(path) = opened else {
            return Err(first_error.unwrap_or_else(|| Error::Open {
                path: path.to_path_buf(),
                source: std::io::ErrorKind::NotFound.into(),
            }));
        };

        let mut source = String::new();
        let read = match self.files.top_mut() {
            Some(entry) => entry.file().read_to_string(&mut source),
            None => Ok(0),
        };
        let result = match read {
            Ok(_) => {
                debug!(path = %path.display(), "parsing file");
                self.parse_source(&source);
                Ok(())
            }
            Err(source) => Err(Error::Read {
                path: path.clone(),
                source,
            }),
        };
        self.files.pop();
        result
    }

    /// Paths to try for `path`, in order.
    ///
    /// A top-level path is tried as given, then in the include directories.
    /// An include looks next to the including file first, then in the
    /// include directories, and the path as given comes last. Every
    /// extensionless candidate is followed by the same path with the default
    /// extension.
    fn candidates(&self, path: &Path, nested: bool) -> Vec<PathBuf> {
        let mut bases = Vec::new();
        if path.is_absolute() {
            bases.push(path.to_path_buf());
        } else if nested {
            let parent = self
                .files
                .top()
                .and_then(|entry| entry.path().parent())
                .filter(|dir| !dir.as_os_str().is_empty());
            if let Some(dir) = parent {
                bases.push(dir.join(path));
            }
            bases.extend(self.options.include_dirs.iter().map(|dir| dir.join(path)));
            bases.push(path.to_path_buf());
        } else {
            bases.push(path.to_path_buf());
            bases.extend(self.options.include_dirs.iter().map(|dir| dir.join(path)));
        }

        let mut candidates: Vec<PathBuf> = Vec::new();
        for base in bases {
            let with_extension = match (&self.options.extension, base.extension()) {
                (Some(ext), None) => Some(base.with_extension(ext)),
                _ => None,
            };
            for candidate in std::iter::once(base).chain(with_extension) {
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }
        candidates
    }

    fn parse_source(&mut self, source: &str) {
        let mut scanner = Scanner::new(source);
        while let Some(token) = scanner.next_token() {
            if token.is_tag() {
                self.open_tag(&token.text);
                continue;
            }
            let is_key = scanner.post_check_key();
            if !is_key && !token.quoted && token.text == INCLUDE {
                match scanner.next_token() {
                    Some(path) => self.include(&path.text, path.line),
                    None => warn!(line = token.line, "include without a path"),
                }
                continue;
            }
            if is_key {
                self.open_key(&token.text);
            } else {
                self.add_value(&token.text);
            }
        }
    }

    fn include(&mut self, path: &str, line: u32) {
        if let Err(error) = self.parse_path(Path::new(path), true) {
            let includer = self
                .files
                .top()
                .map(|entry| entry.path().display().to_string())
                .unwrap_or_default();
            warn!(path, includer = %includer, line, %error, "include skipped");
        }
    }

    fn open_tag(&mut self, name: &str) {
        self.doc.add_tag(name);
        self.cursor.seek(Some(self.doc.len() - 1), None);
    }

    fn open_key(&mut self, name: &str) {
        if self.cursor.tag_index().is_none() {
            self.open_tag("");
        }
        let Some(t) = self.cursor.tag_index() else {
            return;
        };
        if let Some(tag) = self.doc.tag_mut(t) {
            tag.add_key(name);
            let k = tag.keys().len() - 1;
            self.cursor.seek(Some(t), Some(k));
        }
    }

    fn add_value(&mut self, value: &str) {
        if self.cursor.key_index().is_none() {
            self.open_key("");
        }
        let (Some(t), Some(k)) = (self.cursor.tag_index(), self.cursor.key_index()) else {
            return;
        };
        if let Some(key) = self.doc.tag_mut(t).and_then(|tag| tag.key_mut(k)) {
            key.push_value(value);
        }
    }

    pub fn tag_rewind(&mut self) -> Option<&TagField> {
        self.cursor.tag_rewind(&self.doc)
    }

    pub fn tag_next(&mut self) -> Option<&TagField> {
        self.cursor.tag_next(&self.doc)
    }

    pub fn key_rewind(&mut self) -> Option<&KeyField> {
        self.cursor.key_rewind(&self.doc)
    }

    pub fn key_next(&mut self) -> Option<&KeyField> {
        self.cursor.key_next(&self.doc)
    }

    pub fn val_rewind(&mut self) -> Option<&str> {
        self.cursor.val_rewind(&self.doc)
    }

    pub fn val_next(&mut self) -> Option<&str> {
        self.cursor.val_next(&self.doc)
    }

    /// Name of the current tag.
    pub fn tag(&self) -> Option<&str> {
        self.cursor.tag_field(&self.doc).map(TagField::name)
    }

    /// Name of the current key.
    pub fn key(&self) -> Option<&str> {
        self.cursor.key_field(&self.doc).map(KeyField::name)
    }

    /// Current value as text. Does not move the cursor.
    pub fn val(&self) -> Option<&str> {
        self.cursor.value(&self.doc)
    }

    pub fn tag_is(&self, name: &str) -> bool {
        self.tag() == Some(name)
    }

    pub fn key_is(&self, name: &str) -> bool {
        self.key() == Some(name)
    }

    /// Number of tags named `name` in the whole document.
    pub fn count_tag(&self, name: &str) -> usize {
        self.doc.count_tag(name)
    }

    /// Number of keys named `name` in the current tag.
    pub fn count_key(&self, name: &str) -> usize {
        self.cursor
            .tag_field(&self.doc)
            .map_or(0, |tag| tag.count_key(name))
    }

    /// Reads the current value as an integer **and moves to the next value**.
    ///
    /// Returns 0 when there is no current value (without moving) or when the
    /// text is not an integer (moving on regardless). The whole token must be
    /// an integer: `3.5` and `12abc` read as 0, not as their leading digits.
    /// Use [`val`](Self::val) to inspect a value without consuming it.
    pub fn int(&mut self) -> i64 {
        let Some(text) = self.val() else {
            return 0;
        };
        let value = text.trim().parse().unwrap_or_else(|_| {
            warn!(value = text, key = self.key().unwrap_or(""), "not an integer");
            0
        });
        self.val_next();
        value
    }

    /// Reads the current value as a floating-point number **and moves to the
    /// next value**, with the same fallbacks as [`int`](Self::int).
    pub fn float(&mut self) -> f64 {
        let Some(text) = self.val() else {
            return 0.0;
        };
        let value = text.trim().parse().unwrap_or_else(|_| {
            warn!(value = text, key = self.key().unwrap_or(""), "not a number");
            0.0
        });
        self.val_next();
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn parsed(source: &str) -> Processor {
        let mut ztk = Processor::new();
        ztk.parse_str(source);
        ztk
    }

    /// Tag names, key names and values in traversal order.
    fn outline(ztk: &mut Processor) -> Vec<String> {
        let mut lines = Vec::new();
        let mut more = ztk.tag_rewind().is_some();
        while more {
            lines.push(format!("[{}]", ztk.tag().unwrap_or_default()));
            let mut key = ztk.key_rewind().is_some();
            while key {
                let mut vals = Vec::new();
                let mut val = ztk.val_rewind().map(str::to_string);
                while let Some(v) = val {
                    vals.push(v);
                    val = ztk.val_next().map(str::to_string);
                }
                lines.push(format!("{}={}", ztk.key().unwrap_or_default(), vals.join(",")));
                key = ztk.key_next().is_some();
            }
            more = ztk.tag_next().is_some();
        }
        lines
    }

    #[test]
    fn test_two_tags() {
        let mut ztk = parsed("[a]\nx: 1,2,3\n[b]\ny: hello\n");
        assert_eq!(outline(&mut ztk), vec!["[a]", "x=1,2,3", "[b]", "y=hello"]);

        ztk.tag_rewind();
        assert_eq!(ztk.tag(), Some("a"));
        assert_eq!(ztk.count_key("x"), 1);
        assert_eq!(ztk.int(), 1);
        assert_eq!(ztk.val(), Some("2"));
    }

    #[test]
    fn test_document_order_is_source_order() {
        let mut ztk = parsed("[first]\na: 1\nb: 2\n[second]\nc: 3\n[third]\nd: 4\ne: 5\n");
        assert_eq!(
            outline(&mut ztk),
            vec!["[first]", "a=1", "b=2", "[second]", "c=3", "[third]", "d=4", "e=5"]
        );
    }

    #[test]
    fn test_fields_without_values_are_not_traversed() {
        let mut ztk = parsed("[marker]
[t]
empty:
k: 1
[hollow]
nothing:
[u]
m: 2
");
        assert_eq!(outline(&mut ztk), vec!["[t]", "k=1", "[u]", "m=2"]);
        assert_eq!(ztk.count_tag("marker"), 1);
        assert_eq!(ztk.count_tag("hollow"), 1);
    }

    #[test]
    fn test_implicit_tag_and_key() {
        let mut ztk = parsed("loose values\nk: v\n[t]\nstray\n");
        assert_eq!(
            outline(&mut ztk),
            vec!["[]", "=loose,values", "k=v", "[t]", "=stray"]
        );
    }

    #[test]
    fn test_values_continue_across_lines() {
        let mut ztk = parsed("[t]\nk: 1, 2\n   3\n");
        assert_eq!(outline(&mut ztk), vec!["[t]", "k=1,2,3"]);
    }

    #[test]
    fn test_count_tag_matches_source() {
        let ztk = parsed("[link]\n[joint]\n[link]\n[link]\n# [link]\n");
        assert_eq!(ztk.count_tag("link"), 3);
        assert_eq!(ztk.count_tag("joint"), 1);
        assert_eq!(ztk.count_tag("chain"), 0);
    }

    #[test]
    fn test_empty_key_counted_but_without_values() {
        let mut ztk = parsed("[t]\nempty:\nfull: 1\nempty:\n");
        ztk.tag_rewind();
        assert_eq!(ztk.count_key("empty"), 2);
        assert!(ztk.key_is("full"));
        assert_eq!(ztk.int(), 1);
        assert!(ztk.val().is_none());
        assert!(ztk.key_next().is_none());
        assert_eq!(ztk.int(), 0);
    }

    #[test]
    fn test_count_key_without_tag() {
        let ztk = Processor::new();
        assert_eq!(ztk.count_key("x"), 0);
    }

    #[test]
    fn test_numeric_readers_consume() {
        let mut ztk = parsed("[t]\np: 1.5, -2, 3e2, oops, 7\n");
        ztk.tag_rewind();
        assert_eq!(ztk.float(), 1.5);
        assert_eq!(ztk.int(), -2);
        assert_eq!(ztk.float(), 300.0);
        assert_eq!(ztk.int(), 0);
        assert_eq!(ztk.val(), Some("7"));
        assert_eq!(ztk.int(), 7);
        assert!(ztk.val().is_none());
        assert_eq!(ztk.float(), 0.0);
    }

    #[test]
    fn test_int_rejects_partial_numbers() {
        let mut ztk = parsed("[t]\np: 3.5, 12abc, 3.5\n");
        ztk.tag_rewind();
        assert_eq!(ztk.int(), 0);
        assert_eq!(ztk.int(), 0);
        assert_eq!(ztk.float(), 3.5);
    }

    #[test]
    fn test_quoted_include_is_a_value() {
        let mut ztk = parsed("[t]\nk: \"include\" x\ninclude: y\n");
        assert_eq!(outline(&mut ztk), vec!["[t]", "k=include,x", "include=y"]);
    }

    #[test]
    fn test_parse_reader() {
        let mut ztk = Processor::new();
        ztk.parse_reader("[r]\nk: v\n".as_bytes()).unwrap();
        assert_eq!(outline(&mut ztk), vec!["[r]", "k=v"]);
    }

    #[test]
    fn test_include_nested_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("inner.ztk"), "[inner]\ni: 2\n").unwrap();
        let outer = dir.path().join("outer.ztk");
        fs::write(&outer, "[outer]\no: 1\ninclude inner.ztk\n[after]\na: 3\n").unwrap();

        let mut ztk = Processor::from_file(&outer).unwrap();
        assert_eq!(
            outline(&mut ztk),
            vec!["[outer]", "o=1", "[inner]", "i=2", "[after]", "a=3"]
        );
    }

    #[test]
    fn test_include_default_extension() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("part.ztk"), "[part]\n").unwrap();
        let main = dir.path().join("main.ztk");
        fs::write(&main, "include part\n").unwrap();

        let ztk = Processor::from_file(&main).unwrap();
        assert_eq!(ztk.count_tag("part"), 1);
    }

    #[test]
    fn test_include_search_dirs() {
        let shared = tempdir().unwrap();
        fs::write(shared.path().join("common.ztk"), "[common]\n").unwrap();
        let options = Options::builder().include_dir(shared.path()).build().unwrap();

        let mut ztk = Processor::with_options(options);
        ztk.parse_str("include common\n[local]\n");
        assert_eq!(ztk.count_tag("common"), 1);
        assert_eq!(ztk.count_tag("local"), 1);
    }

    #[test]
    fn test_top_level_relative_path_uses_search_dirs() {
        let shared = tempdir().unwrap();
        fs::write(shared.path().join("ztk-search-dir-test.ztk"), "[found]\n").unwrap();
        let options = Options::builder().include_dir(shared.path()).build().unwrap();

        let mut ztk = Processor::with_options(options);
        ztk.parse("ztk-search-dir-test").unwrap();
        assert_eq!(ztk.count_tag("found"), 1);
    }

    #[test]
    fn test_missing_include_is_skipped() {
        let dir = tempdir().unwrap();
        let main = dir.path().join("main.ztk");
        fs::write(&main, "[a]\nx: 1\ninclude nowhere.ztk\n2\n[b]\ny: 3\n").unwrap();

        let mut ztk = Processor::from_file(&main).unwrap();
        assert_eq!(outline(&mut ztk), vec!["[a]", "x=1,2", "[b]", "y=3"]);
    }

    #[test]
    fn test_cyclic_include_is_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.ztk"), "[a]\nk: 1\ninclude b.ztk\n").unwrap();
        fs::write(
            dir.path().join("b.ztk"),
            "[b]\nk: 2\ninclude a.ztk\ninclude b.ztk\n[b2]\nk: 3\n",
        )
        .unwrap();

        let mut ztk = Processor::from_file(dir.path().join("a.ztk")).unwrap();
        assert_eq!(
            outline(&mut ztk),
            vec!["[a]", "k=1", "[b]", "k=2", "[b2]", "k=3"]
        );
        assert!(ztk.files.is_empty());
    }

    #[test]
    fn test_same_file_included_twice_in_sequence() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("part.ztk"), "[part]\n").unwrap();
        let main = dir.path().join("main.ztk");
        fs::write(&main, "include part.ztk\ninclude part.ztk\n").unwrap();

        let ztk = Processor::from_file(&main).unwrap();
        assert_eq!(ztk.count_tag("part"), 2);
    }

    #[test]
    fn test_missing_top_level_file() {
        let dir = tempdir().unwrap();
        let result = Processor::from_file(dir.path().join("absent.ztk"));
        assert!(matches!(result, Err(Error::Open { .. })));
    }

    #[test]
    fn test_top_level_without_extension() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("robot.ztk"), "[robot]\n").unwrap();

        let ztk = Processor::from_file(dir.path().join("robot")).unwrap();
        assert_eq!(ztk.count_tag("robot"), 1);
    }

    #[test]
    fn test_destroy_clears_document() {
        let mut ztk = parsed("[a]\nx: 1\n");
        ztk.destroy();
        assert!(ztk.document().is_empty());
        assert!(ztk.tag_rewind().is_none());
    }
}
