//! Single-pass state-machine parser for property keys.
//!
//! The scanner walks the key one character at a time with a stack of
//! in-progress parts. Reading a `{` or `${` pushes a wrapper part plus the
//! whole part for its interior; a `.` closes the current literal and opens
//! the next; a `}` closes parts back out to the wrapper. Offsets in errors
//! are character indices into the original key.

use crate::error::{ParserError, SyntaxError};

use super::part::{ParsedKey, Part, PartKind};

/// Parses `key`, verifying its syntactic form and producing the part tree
/// used to normalize it.
pub(crate) fn parse(key: &str) -> Result<ParsedKey, ParserError> {
    Parser::new(key).run()
}

/// A grammar violation plus the offset it was detected at.
struct Violation {
    index: usize,
    cause: SyntaxError,
}

impl Violation {
    fn at(index: usize, cause: SyntaxError) -> Self {
        Self { index, cause }
    }
}

impl From<Violation> for ParserError {
    fn from(violation: Violation) -> Self {
        Self::Syntax {
            index: violation.index,
            cause: violation.cause,
        }
    }
}

/// An unfinished part: everything but its end offset.
struct OpenPart {
    kind: PartKind,
    start: usize,
    children: Vec<Part>,
}

/// Scanner state: the cursor, the stack of open parts, and the progress
/// snapshot used by the runaway guard.
struct Parser {
    chars: Vec<char>,
    cursor: usize,
    stack: Vec<OpenPart>,
    finished_root: Option<Part>,
    last_cursor: Option<usize>,
    last_depth: usize,
}

impl Parser {
    fn new(key: &str) -> Self {
        Self {
            chars: key.chars().collect(),
            cursor: 0,
            stack: Vec::new(),
            finished_root: None,
            last_cursor: None,
            last_depth: 0,
        }
    }

    fn run(mut self) -> Result<ParsedKey, ParserError> {
        self.open(PartKind::Root);
        self.open(PartKind::Whole);
        self.open(PartKind::Literal);

        // Keep scanning until the end of the key is reached and every open
        // part has been closed back out.
        while self.cursor < self.chars.len() || !self.stack.is_empty() {
            self.check_progress()?;

            match self.scan() {
                '$' => {
                    if self.peek_ahead() == '{' {
                        self.start_placeholder();
                    } else {
                        return Err(
                            Violation::at(self.cursor, SyntaxError::BarePlaceholder).into()
                        );
                    }
                }
                '{' => self.start_override(),
                '.' => {
                    self.end_current_part()?;
                    self.open(PartKind::Literal);
                }
                '}' | '\0' => self.end_current_part()?,
                _ => self.consume_character()?,
            }
        }

        let root = self
            .finished_root
            .take()
            .ok_or(ParserError::InfiniteLoop)?;
        Ok(ParsedKey::new(self.chars, root))
    }

    /// The character under the cursor, or NUL past the end of the key.
    fn scan(&self) -> char {
        self.chars.get(self.cursor).copied().unwrap_or('\0')
    }

    fn peek_ahead(&self) -> char {
        self.chars.get(self.cursor + 1).copied().unwrap_or('\0')
    }

    fn peek_behind(&self) -> char {
        match self.cursor.checked_sub(1) {
            Some(prev) => self.chars.get(prev).copied().unwrap_or('\0'),
            None => '\0',
        }
    }

    fn advance(&mut self) {
        self.cursor += 1;
    }

    /// Fails if neither the cursor nor the stack depth moved since the last
    /// iteration. Reaching this indicates a defect in the scanner itself.
    fn check_progress(&mut self) -> Result<(), ParserError> {
        let depth = self.stack.len();
        let stalled =
            self.last_cursor.is_some_and(|last| last >= self.cursor) && self.last_depth == depth;
        self.last_cursor = Some(self.cursor);
        self.last_depth = depth;
        if stalled {
            return Err(ParserError::InfiniteLoop);
        }
        Ok(())
    }

    fn current_kind(&self) -> PartKind {
        self.stack.last().map_or(PartKind::Root, |part| part.kind)
    }

    /// Opens a new part at the cursor, stacking it on the current one.
    fn open(&mut self, kind: PartKind) {
        self.stack.push(OpenPart {
            kind,
            start: self.cursor,
            children: Vec::new(),
        });
    }

    /// Closes the current part at the cursor, attaching it to its parent or,
    /// for the root, recording the finished tree.
    fn close(&mut self) {
        if let Some(open) = self.stack.pop() {
            let part = Part {
                kind: open.kind,
                start: open.start,
                end: self.cursor,
                children: open.children,
            };
            match self.stack.last_mut() {
                Some(parent) => parent.children.push(part),
                None => self.finished_root = Some(part),
            }
        }
    }

    /// On `${`: opens a placeholder and the whole part for its interior.
    fn start_placeholder(&mut self) {
        self.open(PartKind::Placeholder);
        self.advance();
        self.advance();
        self.open(PartKind::Whole);
    }

    /// On `{`: opens an override and the whole part for its interior.
    fn start_override(&mut self) {
        self.open(PartKind::Override);
        self.advance();
        self.open(PartKind::Whole);
    }

    /// Closes the current part, validating it against the character that
    /// ended it (`.`, `}`, or the end of the key).
    fn end_current_part(&mut self) -> Result<(), ParserError> {
        let kind = self.current_kind();
        let end = self.cursor;
        let start = self.stack.last().map_or(0, |part| part.start);

        match self.scan() {
            '.' => {
                if kind == PartKind::Literal {
                    if end == start {
                        return Err(Violation::at(end, SyntaxError::UnexpectedPartEnd).into());
                    }
                } else {
                    return Err(Violation::at(end, SyntaxError::UnexpectedPartStart).into());
                }
                self.advance();
                self.close();
            }
            '}' => {
                let blank_width = match kind {
                    PartKind::Placeholder => 2,
                    PartKind::Override => 1,
                    PartKind::Literal | PartKind::Whole => 0,
                    PartKind::Root => {
                        return Err(
                            Violation::at(end, SyntaxError::UnexpectedClosingBrace).into()
                        );
                    }
                };
                if matches!(kind, PartKind::Placeholder | PartKind::Override) {
                    self.advance();
                }
                if end - start <= blank_width {
                    return Err(Violation::at(end, SyntaxError::BlankPart).into());
                }
                self.close();
            }
            _ => {
                // End of the key.
                match kind {
                    PartKind::Literal | PartKind::Whole | PartKind::Root => {
                        if end == start {
                            return Err(Violation::at(
                                end.saturating_sub(1),
                                SyntaxError::BlankPart,
                            )
                            .into());
                        }
                    }
                    PartKind::Override | PartKind::Placeholder => {
                        return Err(Violation::at(
                            end.saturating_sub(1),
                            SyntaxError::MissingClosingBrace,
                        )
                        .into());
                    }
                }
                self.close();
            }
        }
        Ok(())
    }

    /// Consumes one literal character, starting a literal part if none is
    /// open. Hyphens and underscores must be flanked by alphanumerics.
    fn consume_character(&mut self) -> Result<(), ParserError> {
        let current = self.scan();

        if current == '-' || current == '_' {
            if !self.peek_ahead().is_ascii_alphanumeric()
                || !self.peek_behind().is_ascii_alphanumeric()
            {
                let cause = if current == '-' {
                    SyntaxError::IllegalHyphen(current)
                } else {
                    SyntaxError::IllegalUnderscore(current)
                };
                return Err(Violation::at(self.cursor, cause).into());
            }
            self.advance();
        } else if current.is_ascii_alphanumeric() {
            if self.current_kind() != PartKind::Literal {
                self.open(PartKind::Literal);
            }
            self.advance();
        } else {
            return Err(
                Violation::at(self.cursor, SyntaxError::UnsupportedCharacter(current)).into()
            );
        }
        Ok(())
    }
}
