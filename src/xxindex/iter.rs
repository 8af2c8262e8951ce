//! Iterators over the elements recorded for one xpath.
//!
//! Two layers, from lightest to richest:
//!
//! 1. [`SnippetIterator`] - decoded element text, one range read per step
//! 2. [`ElementIterator`] - the same text paired with the element's line
//!
//! Both are lazy: nothing is read from the source until `next` is called.
//! Byte bounds are applied once, up front, when the iterator is created.
//!
//! # Example
//! ```no_run
//! # use xxindex::{AccessOptions, XpathAccess};
//! let access = XpathAccess::open("feed.xml", AccessOptions::default()).unwrap();
//! for snippet in access.snippet_iter("/feed/entry", None) {
//!     println!("{}", snippet.unwrap());
//! }
//! ```

use std::borrow::Cow;
use std::iter::FusedIterator;

use super::extractor::Extractor;
use super::source::ByteSource;
use super::types::error::Result;
use super::types::models::{ByteBounds, IndexElement, XmlElement};

/// Keeps the elements admitted by `bounds`; borrows the slice when nothing is filtered.
fn select(elements: &[IndexElement], bounds: Option<ByteBounds>) -> Cow<'_, [IndexElement]> {
    match bounds {
        Some(bounds) if !bounds.is_unbounded() => Cow::Owned(
            elements
                .iter()
                .filter(|element| bounds.admits(element))
                .copied()
                .collect(),
        ),
        _ => Cow::Borrowed(elements),
    }
}

/// Iterator over the decoded text of a list of elements.
///
/// Yields `Result<String>`; a failed read is reported for that element and
/// iteration may continue with the next one.
///
/// Created by [`XpathAccess::snippet_iter()`](crate::XpathAccess::snippet_iter).
pub struct SnippetIterator<'a, S: ByteSource> {
    extractor: &'a Extractor<S>,
    elements: Cow<'a, [IndexElement]>,
    next: usize,
}

impl<'a, S: ByteSource> SnippetIterator<'a, S> {
    pub fn new(extractor: &'a Extractor<S>, elements: &'a [IndexElement], bounds: Option<ByteBounds>) -> Self {
        Self {
            extractor,
            elements: select(elements, bounds),
            next: 0,
        }
    }

    /// Pairs every snippet with the line its element starts on.
    pub fn with_lines(self) -> ElementIterator<'a, S> {
        ElementIterator { snippets: self }
    }

    /// Elements not yet yielded.
    pub fn remaining(&self) -> &[IndexElement] {
        &self.elements[self.next..]
    }

    fn next_element(&mut self) -> Option<IndexElement> {
        let element = *self.elements.get(self.next)?;
        self.next += 1;
        Some(element)
    }
}

impl<'a, S: ByteSource> Iterator for SnippetIterator<'a, S> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.next_element()?;
        Some(self.extractor.read_element(&element))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.remaining().len();
        (left, Some(left))
    }
}

impl<S: ByteSource> ExactSizeIterator for SnippetIterator<'_, S> {}

impl<S: ByteSource> FusedIterator for SnippetIterator<'_, S> {}

/// Iterator over decoded elements together with their starting line.
///
/// Created by [`SnippetIterator::with_lines()`] or
/// [`XpathAccess::element_iter()`](crate::XpathAccess::element_iter).
pub struct ElementIterator<'a, S: ByteSource> {
    snippets: SnippetIterator<'a, S>,
}

impl<'a, S: ByteSource> ElementIterator<'a, S> {
    pub fn new(extractor: &'a Extractor<S>, elements: &'a [IndexElement], bounds: Option<ByteBounds>) -> Self {
        SnippetIterator::new(extractor, elements, bounds).with_lines()
    }

    pub fn remaining(&self) -> &[IndexElement] {
        self.snippets.remaining()
    }
}

impl<'a, S: ByteSource> Iterator for ElementIterator<'a, S> {
    type Item = Result<XmlElement>;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.snippets.next_element()?;
        let snippet = match self.snippets.extractor.read_element(&element) {
            Ok(snippet) => snippet,
            Err(e) => return Some(Err(e)),
        };
        Some(Ok(XmlElement {
            snippet,
            line: element.line,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.snippets.size_hint()
    }
}

impl<S: ByteSource> ExactSizeIterator for ElementIterator<'_, S> {}

impl<S: ByteSource> FusedIterator for ElementIterator<'_, S> {}
