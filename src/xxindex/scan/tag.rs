//! Tag-name extraction and the stack of open elements.

/// Collects the name of the tag currently being recorded.
///
/// Only bytes up to the first whitespace are kept; attributes never enter the
/// buffer. With prefix stripping on, a `:` discards everything collected so far.
#[derive(Debug, Default)]
pub(super) struct TagNameBuffer {
    bytes: Vec<u8>,
    complete: bool,
    strip_prefix: bool,
}

impl TagNameBuffer {
    pub(super) fn new(strip_prefix: bool) -> Self {
        Self {
            bytes: Vec::with_capacity(64),
            complete: false,
            strip_prefix,
        }
    }

    pub(super) fn reset(&mut self) {
        self.bytes.clear();
        self.complete = false;
    }

    pub(super) fn push(&mut self, byte: u8) {
        if self.complete {
            return;
        }
        if matches!(byte, b' ' | b'\t' | b'\n' | b'\r') {
            self.complete = true;
            return;
        }
        if self.strip_prefix && byte == b':' {
            self.bytes.clear();
            return;
        }
        self.bytes.push(byte);
    }

    /// Returns the collected name and clears the buffer.
    ///
    /// One leading `/` (closing tag) and one trailing `/` (self-closing tag) are removed.
    pub(super) fn take_name(&mut self) -> String {
        let mut name = self.bytes.as_slice();
        if let Some(rest) = name.strip_prefix(b"/") {
            name = rest;
        }
        if let Some(rest) = name.strip_suffix(b"/") {
            name = rest;
        }
        let name = String::from_utf8_lossy(name).into_owned();
        self.reset();
        name
    }
}

/// Closing tags match their start tag regardless of case.
pub(super) fn names_match(open: &str, close: &str) -> bool {
    open.eq_ignore_ascii_case(close) || open.to_lowercase() == close.to_lowercase()
}

#[derive(Debug)]
pub(super) struct Frame {
    pub name: String,
    pub start: u64,
    pub line: u64,
    /// Length of the xpath before this frame's segment was appended.
    path_len: usize,
}

/// Open elements, innermost last, with the xpath they form kept alongside.
#[derive(Debug, Default)]
pub(super) struct TagStack {
    frames: Vec<Frame>,
    path: String,
}

impl TagStack {
    pub(super) fn push(&mut self, name: String, start: u64, line: u64) {
        let path_len = self.path.len();
        self.path.push('/');
        self.path.push_str(&name);
        self.frames.push(Frame {
            name,
            start,
            line,
            path_len,
        });
    }

    pub(super) fn pop(&mut self) -> Option<Frame> {
        let frame = self.frames.pop()?;
        self.path.truncate(frame.path_len);
        Some(frame)
    }

    pub(super) fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Xpath of the innermost open element (`""` when nothing is open).
    pub(super) fn path(&self) -> &str {
        &self.path
    }

    pub(super) fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Human-readable listing used in structural error reports.
    pub(super) fn describe(&self) -> String {
        self.frames
            .iter()
            .map(|frame| format!("[{} at line {}]", frame.name, frame.line))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
