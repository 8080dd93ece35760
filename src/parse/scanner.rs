//! @module "Scanner"
//! @summary "Anchored cursor over a single line of comment text"
//! @domain core
//! @layer parser
//!
//! Every primitive matches at the cursor only (prefix match, never a search),
//! so a line is consumed left to right in a single pass. Patterns are
//! `regex::Regex` values, which run on finite automata without backtracking.
//! Callers should anchor patterns with `\A`; unanchored patterns still work
//! but any match that does not start at the cursor is treated as no match.

use std::sync::LazyLock;

use regex::Regex;

static BLANK_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A\s+").unwrap());

/// @summary "Cursor over one line of text"
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    terminated: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            terminated: false,
        }
    }

    /// Byte offset of the cursor into the line
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Length of the match starting exactly at the cursor, if any
    fn match_len(&self, pattern: &Regex) -> Option<usize> {
        if self.terminated {
            return None;
        }
        pattern
            .find(self.peek())
            .filter(|m| m.start() == 0)
            .map(|m| m.end())
    }

    /// Consume the prefix matching `pattern`; no-op when nothing matches.
    pub fn skip(&mut self, pattern: &Regex) {
        if let Some(len) = self.match_len(pattern) {
            self.pos += len;
        }
    }

    /// Remaining unconsumed text; empty once terminated.
    pub fn peek(&self) -> &'a str {
        if self.terminated {
            ""
        } else {
            &self.input[self.pos..]
        }
    }

    /// Whether `pattern` matches at the cursor, without consuming.
    pub fn check(&self, pattern: &Regex) -> bool {
        self.match_len(pattern).is_some()
    }

    /// Consume and return the text matching `pattern` at the cursor.
    /// The cursor is left untouched when there is no match.
    pub fn scan(&mut self, pattern: &Regex) -> Option<&'a str> {
        let len = self.match_len(pattern)?;
        let start = self.pos;
        self.pos += len;
        Some(&self.input[start..self.pos])
    }

    /// Abandon the rest of the line
    pub fn terminate(&mut self) {
        self.terminated = true;
    }

    /// True once everything is consumed or the cursor was terminated
    pub fn has_terminated(&self) -> bool {
        self.terminated || self.pos >= self.input.len()
    }

    /// Consume and return all remaining text
    pub fn get_remainder(&mut self) -> &'a str {
        let rest = self.peek();
        self.pos = self.input.len();
        rest
    }

    // ------------------------------------------------------------------------
    // Annotation-level scans
    // ------------------------------------------------------------------------

    pub fn skip_blank_space(&mut self) {
        self.skip(&BLANK_SPACE);
    }

    /// Scan an annotation key and the blank space that follows it
    pub fn scan_key(&mut self, pattern: &Regex) -> Option<&'a str> {
        let key = self.scan(pattern)?;
        self.skip_blank_space();
        Some(key)
    }

    /// No value follows: end of line, or the next annotation starts right away
    pub fn scan_implicit_boolean(&self, identifier: &Regex) -> bool {
        self.peek().is_empty() || self.check(identifier)
    }

    /// Resolve an explicit type tag, falling back when none is present.
    ///
    /// `types_check` must only match a tag that is followed by a value;
    /// `types_pattern` then consumes the tag word itself.
    pub fn scan_type<'f>(
        &mut self,
        types_check: &Regex,
        types_pattern: &Regex,
        fallback: &'f str,
    ) -> &'f str
    where
        'a: 'f,
    {
        if !self.check(types_check) {
            return fallback;
        }
        match self.scan(types_pattern) {
            Some(tag) => {
                self.skip_blank_space();
                tag
            }
            None => fallback,
        }
    }
}
