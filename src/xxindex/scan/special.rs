//! Skipping of comments, CDATA sections, doctypes and processing instructions.

const COMMENT_OPEN: &[u8] = b"--";
const CDATA_OPEN: &[u8] = b"[CDATA[";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SectionKind {
    /// Still matching the bytes after `<!` against the comment/CDATA openers.
    Pending,
    /// `<!--` ... `-->`
    Comment,
    /// `<![CDATA[` ... `]]>`
    CData,
    /// Doctype or processing instruction, ends at the first unquoted `>`.
    Markup,
}

/// A section whose contents are opaque to the indexer.
#[derive(Debug, Clone, Copy)]
pub(super) struct SpecialSection {
    kind: SectionKind,
    lead: [u8; 7],
    lead_len: usize,
    tail: [u8; 2],
    in_quote: bool,
}

impl SpecialSection {
    fn with_kind(kind: SectionKind) -> Self {
        Self {
            kind,
            lead: [0; 7],
            lead_len: 0,
            tail: [0; 2],
            in_quote: false,
        }
    }

    /// Section entered after `<!`.
    pub(super) fn after_bang() -> Self {
        Self::with_kind(SectionKind::Pending)
    }

    /// Section entered after `<?`.
    pub(super) fn after_question_mark() -> Self {
        Self::with_kind(SectionKind::Markup)
    }

    #[cfg(test)]
    pub(super) fn kind(&self) -> SectionKind {
        self.kind
    }

    /// Consumes one byte. Returns `true` once the byte closed the section.
    pub(super) fn feed(&mut self, byte: u8) -> bool {
        match self.kind {
            SectionKind::Pending => {
                self.lead[self.lead_len] = byte;
                self.lead_len += 1;
                let lead = &self.lead[..self.lead_len];
                if lead == COMMENT_OPEN {
                    self.kind = SectionKind::Comment;
                    false
                } else if lead == CDATA_OPEN {
                    self.kind = SectionKind::CData;
                    false
                } else if COMMENT_OPEN.starts_with(lead) || CDATA_OPEN.starts_with(lead) {
                    false
                } else {
                    self.kind = SectionKind::Markup;
                    self.feed_markup(byte)
                }
            }
            SectionKind::Comment => self.feed_terminated(byte, b'-'),
            SectionKind::CData => self.feed_terminated(byte, b']'),
            SectionKind::Markup => self.feed_markup(byte),
        }
    }

    /// `-->` or `]]>`: two `marker` bytes immediately followed by `>`.
    fn feed_terminated(&mut self, byte: u8, marker: u8) -> bool {
        if byte == b'>' && self.tail == [marker, marker] {
            return true;
        }
        self.tail = [self.tail[1], byte];
        false
    }

    fn feed_markup(&mut self, byte: u8) -> bool {
        match byte {
            b'"' => {
                self.in_quote = !self.in_quote;
                false
            }
            b'>' => !self.in_quote,
            _ => false,
        }
    }
}
