//! Stack of files open during a parse.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::Error;

/// One open file, together with the path it was opened by.
///
/// The entry below it on the stack is the file that included it.
#[derive(Debug)]
pub struct StackEntry {
    path: PathBuf,
    file: File,
}

impl StackEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&mut self) -> &mut File {
        &mut self.file
    }
}

/// Files currently being read, innermost include on top.
///
/// A path may appear at most once, so an include cycle is cut at the first
/// repeated file. Paths are compared as given; two different spellings of
/// the same file (symlinks, `./a` versus `a`) are not detected.
#[derive(Debug, Default)]
pub struct FileStack {
    entries: Vec<StackEntry>,
}

impl FileStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `path` and makes it the new top of the stack.
    ///
    /// Fails with [`Error::AlreadyOpen`] without touching the file system
    /// when `path` is already on the stack.
    pub fn push(&mut self, path: impl AsRef<Path>) -> Result<&mut StackEntry, Error> {
        let path = path.as_ref();
        if self.contains(path) {
            return Err(Error::AlreadyOpen(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), depth = self.entries.len() + 1, "file pushed");
        self.entries.push(StackEntry {
            path: path.to_path_buf(),
            file,
        });
        let top = self.entries.len() - 1;
        Ok(&mut self.entries[top])
    }

    /// Closes the top file and returns the new top, if any.
    pub fn pop(&mut self) -> Option<&mut StackEntry> {
        if let Some(entry) = self.entries.pop() {
            tracing::debug!(path = %entry.path.display(), "file popped");
        }
        self.entries.last_mut()
    }

    /// Closes every file on the stack.
    pub fn destroy(&mut self) {
        while self.pop().is_some() {}
    }

    pub fn top(&self) -> Option<&StackEntry> {
        self.entries.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut StackEntry> {
        self.entries.last_mut()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
