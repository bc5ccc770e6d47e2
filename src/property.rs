//! Table-driven evaluation and printing of objects.
//!
//! A property table lists the tags or keys an object understands. Each
//! [`Property`] pairs a name with an evaluate callback, which reads the field
//! at the processor's cursor into the object, and a print callback, which
//! writes the object's field back out in ZTK syntax.

use std::fmt;
use std::io::{self, Write};

use tracing::warn;

use crate::document::write_token;
use crate::error::EvalError;
use crate::{Error, Processor};

/// Reads the field under the cursor into `obj`.
///
/// Receives the object, how many fields of this name were evaluated before,
/// the caller's context, and the processor positioned at the field (values
/// rewound for a key, keys rewound for a tag).
pub type EvalFn<T, C> = fn(&mut T, usize, &mut C, &mut Processor) -> Result<(), EvalError>;

/// Writes occurrence `index` of a field of `obj`.
///
/// For keys the `name: ` prefix is already written and the callback writes the
/// values and the line end; for tags the `[name]` line is already written.
pub type PrintFn<T> = fn(&mut dyn Write, usize, &T) -> io::Result<()>;

/// One entry of a property table.
pub struct Property<T, C = ()> {
    pub name: &'static str,
    /// Most occurrences evaluated, and the number printed. 0 evaluates any
    /// number of occurrences.
    pub max: usize,
    pub eval: Option<EvalFn<T, C>>,
    pub print: Option<PrintFn<T>>,
}

impl<T, C> Property<T, C> {
    pub const fn new(
        name: &'static str,
        max: usize,
        eval: Option<EvalFn<T, C>>,
        print: Option<PrintFn<T>>,
    ) -> Self {
        Self {
            name,
            max,
            eval,
            print,
        }
    }
}

impl<T, C> Clone for Property<T, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, C> Copy for Property<T, C> {}

impl<T, C> fmt::Debug for Property<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("max", &self.max)
            .field("eval", &self.eval.is_some())
            .field("print", &self.print.is_some())
            .finish()
    }
}

/// Sets the `max` of the entry named `name`, typically to the number of
/// occurrences an object holds right before printing it.
///
/// Returns `false` if no entry has that name.
pub fn set_max<T, C>(table: &mut [Property<T, C>], name: &str, max: usize) -> bool {
    match table.iter_mut().find(|p| p.name == name) {
        Some(prp) => {
            prp.max = max;
            true
        }
        None => false,
    }
}

/// Outcome of a successful evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Callbacks invoked.
    pub evaluated: usize,
    /// Fields skipped because their property had reached its `max`.
    pub excess: usize,
}

impl Processor {
    /// Evaluates every key of the current tag into `obj`, in document order.
    ///
    /// Each key is matched against `table` by name. Keys beyond an entry's
    /// `max` are skipped with a warning; unknown keys are ignored. The first
    /// callback error aborts the walk and is returned, leaving `obj` partly
    /// filled. A tag with no valued key fails with [`Error::Empty`].
    pub fn eval_key<T, C>(
        &mut self,
        obj: &mut T,
        ctx: &mut C,
        table: &[Property<T, C>],
    ) -> Result<Evaluation, Error> {
        if self.key_rewind().is_none() {
            return Err(Error::Empty("keys"));
        }
        let mut summary = Evaluation::default();
        let mut counts = vec![0; table.len()];

        let mut more = true;
        while more {
            let found = table
                .iter()
                .position(|p| p.eval.is_some() && self.key_is(p.name));
            if let Some(i) = found {
                let prp = &table[i];
                if prp.max > 0 && counts[i] >= prp.max {
                    warn!(key = prp.name, max = prp.max, "too many keys, extra one ignored");
                    summary.excess += 1;
                } else if let Some(eval) = prp.eval {
                    eval(obj, counts[i], ctx, self).map_err(|source| Error::Evaluation {
                        field: format!("key '{}'", prp.name),
                        source,
                    })?;
                    counts[i] += 1;
                    summary.evaluated += 1;
                }
            }
            more = self.key_next().is_some();
        }
        Ok(summary)
    }

    /// Evaluates the tags of the whole document into `obj`.
    ///
    /// Entries are taken in table order; for each one the document is scanned
    /// from the first tag, so all tags of one name are evaluated before the
    /// next entry. Limits and errors behave as in [`eval_key`](Self::eval_key);
    /// a document with no valued tag fails with [`Error::Empty`].
    pub fn eval_tag<T, C>(
        &mut self,
        obj: &mut T,
        ctx: &mut C,
        table: &[Property<T, C>],
    ) -> Result<Evaluation, Error> {
        if self.tag_rewind().is_none() {
            return Err(Error::Empty("tags"));
        }
        let mut summary = Evaluation::default();

        for prp in table {
            let Some(eval) = prp.eval else {
                continue;
            };
            let mut count = 0;
            let mut more = self.tag_rewind().is_some();
            while more {
                if self.tag_is(prp.name) {
                    if prp.max > 0 && count >= prp.max {
                        warn!(tag = prp.name, max = prp.max, "too many tags, extra one ignored");
                        summary.excess += 1;
                    } else {
                        eval(obj, count, ctx, self).map_err(|source| Error::Evaluation {
                            field: format!("tag [{}]", prp.name),
                            source,
                        })?;
                        count += 1;
                        summary.evaluated += 1;
                    }
                }
                more = self.tag_next().is_some();
            }
        }
        Ok(summary)
    }
}

/// Writes the keys of `obj` in table order, `max` times per entry.
pub fn print_key<T, C>(w: &mut dyn Write, obj: &T, table: &[Property<T, C>]) -> io::Result<()> {
    for prp in table {
        let Some(print) = prp.print else {
            continue;
        };
        for i in 0..prp.max {
            write!(w, "{}: ", prp.name)?;
            print(w, i, obj)?;
        }
    }
    Ok(())
}

/// Writes the tags of `obj` in table order, `max` times per entry.
pub fn print_tag<T, C>(w: &mut dyn Write, obj: &T, table: &[Property<T, C>]) -> io::Result<()> {
    for prp in table {
        let Some(print) = prp.print else {
            continue;
        };
        for i in 0..prp.max {
            writeln!(w, "[{}]", prp.name)?;
            print(w, i, obj)?;
        }
    }
    Ok(())
}

/// Writes `values` comma-separated and ends the line, quoting values that
/// would not read back as a single token.
pub fn write_values<I, S>(w: &mut dyn Write, values: I) -> io::Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = String::new();
    for (i, value) in values.into_iter().enumerate() {
        if i > 0 {
            line.push_str(", ");
        }
        write_token(&mut line, value.as_ref()).map_err(io::Error::other)?;
    }
    writeln!(w, "{line}")
}
