//! Code generation by edit script.
//!
//! Each pass describes how it rewrites the parsed tree as a set of edits
//! anchored to node spans of its input text. [`Patch::apply`] serializes the
//! rewritten tree by splicing those edits into the input. Text between edits
//! is emitted unchanged, so line structure of the fragment survives every
//! pass.

use jsrepl_types::{TransformError, TransformResult};
use oxc_span::Span;

/// One replacement of the half-open byte range `start..end`.
///
/// Insertions are replacements of an empty range.
#[derive(Debug)]
struct Edit {
    start: u32,
    end: u32,
    text: String,
    /// Report the output offset of this edit's text.
    marked: bool,
}

impl Edit {
    fn is_insertion(&self) -> bool {
        self.start == self.end
    }
}

/// Pending edits over one input text.
#[derive(Debug)]
pub(crate) struct Patch<'s> {
    source: &'s str,
    edits: Vec<Edit>,
}

/// The output of [`Patch::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Patched {
    pub code: String,
    /// Output offsets where the text of marked edits begins, in output order.
    pub marks: Vec<u32>,
}

impl<'s> Patch<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            edits: Vec::new(),
        }
    }

    /// Input text of `span`.
    pub fn text(&self, span: Span) -> &'s str {
        &self.source[span.start as usize..span.end as usize]
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Replace the text of `span`.
    pub fn replace(&mut self, span: Span, text: impl Into<String>) {
        self.push(span.start, span.end, text.into(), false);
    }

    /// Replace the text of `span` and report where the replacement landed.
    pub fn replace_marked(&mut self, span: Span, text: impl Into<String>) {
        self.push(span.start, span.end, text.into(), true);
    }

    /// Insert text before the input offset `at`.
    pub fn insert(&mut self, at: u32, text: impl Into<String>) {
        self.push(at, at, text.into(), false);
    }

    /// Insert text before `at` and report where it landed.
    pub fn insert_marked(&mut self, at: u32, text: impl Into<String>) {
        self.push(at, at, text.into(), true);
    }

    fn push(&mut self, start: u32, end: u32, text: String, marked: bool) {
        self.edits.push(Edit {
            start,
            end,
            text,
            marked,
        });
    }

    /// Splice every edit into the input.
    ///
    /// Edits are applied in input order. At equal offsets insertions come
    /// before a replacement starting there, and insertions keep the order
    /// they were recorded in. Overlapping replacements are an invariant
    /// violation of the pass that recorded them.
    pub fn apply(self) -> TransformResult<Patched> {
        let Self { source, mut edits } = self;
        // Stable sort: recording order breaks the remaining ties.
        edits.sort_by_key(|edit| (edit.start, !edit.is_insertion()));

        let mut code = String::with_capacity(source.len() + edits.len() * 16);
        let mut marks = Vec::new();
        let mut cursor = 0u32;
        for edit in edits {
            if edit.start < cursor || edit.end < edit.start {
                return Err(TransformError::invariant(format!(
                    "overlapping edit at {}..{} (already emitted up to {cursor})",
                    edit.start, edit.end
                )));
            }
            let end = edit.end as usize;
            if end > source.len() {
                return Err(TransformError::invariant(format!(
                    "edit {}..{} is outside the {}-byte input",
                    edit.start,
                    edit.end,
                    source.len()
                )));
            }
            code.push_str(&source[cursor as usize..edit.start as usize]);
            if edit.marked {
                marks.push(code.len() as u32);
            }
            code.push_str(&edit.text);
            cursor = edit.end;
        }
        code.push_str(&source[cursor as usize..]);
        Ok(Patched { code, marks })
    }
}
