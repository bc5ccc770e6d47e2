//! Processor for ZTK, a line-oriented tag-and-key configuration format.
//!
//! ```text
//! # a comment
//! [chain]
//! name: arm
//!
//! [link]
//! name: base
//! shape: box, 0.1, 0.2, 0.3
//! include common.ztk
//! ```
//!
//! A [`Processor`] parses text and its includes into a [`Document`], then
//! walks it with a tag/key/value cursor, either by hand or through a
//! [`Property`] table that binds field names to callbacks.

pub mod config;
mod cursor;
mod document;
mod error;
mod processor;
mod property;
pub mod scanner;
pub mod stack;

use std::path::Path;

pub use config::{ConfigError, Options};
pub use cursor::Cursor;
pub use document::{Document, KeyField, TagField};
pub use error::{Error, EvalError};
pub use processor::{Processor, INCLUDE};
pub use property::{
    print_key, print_tag, set_max, write_values, EvalFn, Evaluation, PrintFn, Property,
};

/// Parses the file at `path`, following its includes, with default options.
pub fn parse(path: impl AsRef<Path>) -> Result<Document, Error> {
    Processor::from_file(path).map(Processor::into_document)
}
