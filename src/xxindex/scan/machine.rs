//! Byte-level state machine of the indexer.
//!
//! ```text
//!  Text ──'<'──▶ TagOpen ──'!' / '?'──▶ Special ──end──▶ Text
//!                   │ ──'/'──▶ ClosingTag ──'>'──▶ Text   (pop, record)
//!                   └─other──▶ StartTag   ──'>'──▶ Text   (push, or record if "/>")
//! ```
//!
//! Inside a tag a `"` toggles quoting; quoted `<` and `>` are plain bytes.
//! Zero bytes are filler: they advance the offset but are otherwise invisible.

use log::warn;

use super::special::SpecialSection;
use super::tag::{names_match, TagNameBuffer, TagStack};
use crate::xxindex::index::XpathIndex;
use crate::xxindex::types::error::{Result, XxIndexError};

#[derive(Debug, Clone, Copy)]
enum Mode {
    Text,
    TagOpen,
    StartTag,
    ClosingTag,
    Special(SpecialSection),
}

#[derive(Debug)]
pub(super) struct ScanState {
    mode: Mode,
    /// Raw offset of the next byte to be fed.
    position: u64,
    line: u64,
    /// Last non-filler byte.
    prev: u8,
    in_quote: bool,
    tag_start: u64,
    tag_line: u64,
    name: TagNameBuffer,
    stack: TagStack,
}

impl ScanState {
    pub(super) fn new(strip_namespace_prefix: bool) -> Self {
        Self {
            mode: Mode::Text,
            position: 0,
            line: 1,
            prev: 0,
            in_quote: false,
            tag_start: 0,
            tag_line: 1,
            name: TagNameBuffer::new(strip_namespace_prefix),
            stack: TagStack::default(),
        }
    }

    /// Number of raw bytes consumed so far.
    pub(super) fn position(&self) -> u64 {
        self.position
    }

    pub(super) fn line(&self) -> u64 {
        self.line
    }

    pub(super) fn feed(&mut self, chunk: &[u8], index: &mut XpathIndex) -> Result<()> {
        for &byte in chunk {
            let offset = self.position;
            self.position += 1;
            if byte == 0 {
                continue;
            }
            // LF always counts; a CR counts when the byte after it is not LF.
            if byte == b'\n' || self.prev == b'\r' {
                self.line += 1;
            }
            self.step(byte, offset, index)?;
            self.prev = byte;
        }
        Ok(())
    }

    fn step(&mut self, byte: u8, offset: u64, index: &mut XpathIndex) -> Result<()> {
        match self.mode {
            Mode::Text => {
                if byte == b'<' {
                    self.begin_tag(offset);
                }
            }
            Mode::TagOpen => match byte {
                b'!' => self.mode = Mode::Special(SpecialSection::after_bang()),
                b'?' => self.mode = Mode::Special(SpecialSection::after_question_mark()),
                b'/' => {
                    self.mode = Mode::ClosingTag;
                    self.name.push(byte);
                }
                b'>' => {
                    return Err(XxIndexError::EmptyTagName {
                        offset: self.tag_start,
                        line: self.tag_line,
                    })
                }
                b'<' => self.begin_tag(offset),
                _ => {
                    self.mode = Mode::StartTag;
                    self.tag_byte(byte);
                }
            },
            Mode::StartTag | Mode::ClosingTag => {
                if !self.in_quote && byte == b'>' {
                    self.end_tag(offset + 1, index)?;
                } else if !self.in_quote && byte == b'<' {
                    self.begin_tag(offset);
                } else {
                    self.tag_byte(byte);
                }
            }
            Mode::Special(mut section) => {
                self.mode = if section.feed(byte) {
                    Mode::Text
                } else {
                    Mode::Special(section)
                };
            }
        }
        Ok(())
    }

    fn begin_tag(&mut self, offset: u64) {
        self.mode = Mode::TagOpen;
        self.tag_start = offset;
        self.tag_line = self.line;
        self.in_quote = false;
        self.name.reset();
    }

    fn tag_byte(&mut self, byte: u8) {
        if byte == b'"' {
            self.in_quote = !self.in_quote;
        }
        self.name.push(byte);
    }

    /// Handles the `>` ending a start or closing tag; `stop` is the offset past it.
    fn end_tag(&mut self, stop: u64, index: &mut XpathIndex) -> Result<()> {
        let closing = matches!(self.mode, Mode::ClosingTag);
        let self_closing = !closing && self.prev == b'/';
        self.mode = Mode::Text;

        let name = self.name.take_name();
        if name.is_empty() {
            return Err(XxIndexError::EmptyTagName {
                offset: self.tag_start,
                line: self.tag_line,
            });
        }

        if closing {
            self.close_element(name, stop, index)
        } else {
            self.stack.push(name, self.tag_start, self.tag_line);
            if self_closing {
                index.put(self.stack.path(), self.tag_start, stop, Some(self.tag_line));
                self.stack.pop();
            }
            Ok(())
        }
    }

    fn close_element(&mut self, name: String, stop: u64, index: &mut XpathIndex) -> Result<()> {
        let Some(top) = self.stack.top() else {
            return Err(XxIndexError::UnexpectedClosingTag {
                found: name,
                offset: self.tag_start,
                line: self.tag_line,
            });
        };
        if !names_match(&top.name, &name) {
            return Err(XxIndexError::TagMismatch {
                found: name,
                expected: top.name.clone(),
                offset: self.tag_start,
                line: self.tag_line,
                open_stack: self.stack.describe(),
            });
        }
        index.put(self.stack.path(), top.start, stop, Some(top.line));
        self.stack.pop();
        Ok(())
    }

    /// Reports anything left unfinished at end of input.
    pub(super) fn finish(&self) {
        if !matches!(self.mode, Mode::Text) {
            warn!(
                "Input ended inside markup starting at byte {} (line {})",
                self.tag_start, self.tag_line
            );
        }
        if self.stack.depth() > 0 {
            warn!(
                "Input ended with {} unclosed element(s): {}",
                self.stack.depth(),
                self.stack.describe()
            );
        }
    }
}
