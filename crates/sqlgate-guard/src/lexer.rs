//! Lexical scanner for SQL text.
//!
//! The validator never inspects raw substrings; it works on the token
//! stream produced here, so that string literals, quoted identifiers, and
//! comments can never be confused with actual SQL keywords.
//!
//! The scanner follows PostgreSQL lexical rules:
//!
//! - `--` line comments and `/* ... */` block comments (nested) are trivia
//! - `'...'` string literals with `''` doubling
//! - `E'...'` extended strings honoring backslash escapes
//! - `B'...'` / `X'...'` bit and hex strings
//! - `U&'...'` / `U&"..."` Unicode strings and identifiers
//! - `$tag$ ... $tag$` dollar-quoted strings (including `$$ ... $$`)
//! - `"..."` quoted identifiers with `""` doubling
//! - `$n` positional parameters
//!
//! Unterminated constructs run to the end of the input instead of failing:
//! the server lexes them the same way, so a malformed statement is
//! rejected there as a syntax error and no executable content can hide
//! inside an open literal.

/// Classification of a scanned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Unquoted identifier or keyword.
    Word,
    /// Numeric literal.
    Number,
    /// String literal of any form (standard, extended, bit/hex, dollar).
    StringLiteral,
    /// Double-quoted identifier.
    QuotedIdentifier,
    /// Positional parameter such as `$1`.
    Parameter,
    /// Statement separator `;`.
    Semicolon,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `,`
    Comma,
    /// Any other punctuation or operator character.
    Operator,
}

/// A single token: its classification and the raw slice it covers
/// (delimiters included for quoted forms).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token classification.
    pub kind: TokenKind,
    /// Raw text of the token.
    pub text: &'a str,
    /// Byte offset of the token start within the input.
    pub start: usize,
}

impl Token<'_> {
    /// Check whether this token is an unquoted word equal to `keyword`,
    /// ignoring ASCII case.
    #[must_use]
    pub fn word_eq(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }
}

/// Streaming lexer over a SQL string.
///
/// Implements [`Iterator`], yielding significant tokens only (whitespace
/// and comments are skipped).
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `input`.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn skip_trivia(&mut self) {
        let bytes = self.input.as_bytes();
        loop {
            match bytes.get(self.pos) {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'-') if bytes.get(self.pos + 1) == Some(&b'-') => {
                    self.pos += 2;
                    while let Some(&b) = bytes.get(self.pos) {
                        self.pos += 1;
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                Some(b'/') if bytes.get(self.pos + 1) == Some(&b'*') => {
                    self.pos += 2;
                    // Block comments nest, per PostgreSQL.
                    let mut depth = 1usize;
                    while depth > 0 {
                        match (bytes.get(self.pos), bytes.get(self.pos + 1)) {
                            (Some(b'/'), Some(b'*')) => {
                                depth += 1;
                                self.pos += 2;
                            }
                            (Some(b'*'), Some(b'/')) => {
                                depth -= 1;
                                self.pos += 2;
                            }
                            (Some(_), _) => self.pos += 1,
                            (None, _) => break,
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn make(&self, kind: TokenKind, start: usize) -> Token<'a> {
        Token {
            kind,
            text: &self.input[start..self.pos],
            start,
        }
    }

    /// Scan a quote-delimited region where the delimiter is escaped by
    /// doubling. `self.pos` must sit on the opening delimiter.
    fn scan_doubled(&mut self, delim: u8, kind: TokenKind, start: usize) -> Token<'a> {
        let bytes = self.input.as_bytes();
        self.pos += 1;
        while let Some(&b) = bytes.get(self.pos) {
            self.pos += 1;
            if b == delim {
                if bytes.get(self.pos) == Some(&delim) {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        self.make(kind, start)
    }

    /// Scan an `E'...'` body where both `\'` and `''` keep the string
    /// open. `self.pos` must sit on the opening quote.
    fn scan_escaped_string(&mut self, start: usize) -> Token<'a> {
        let bytes = self.input.as_bytes();
        self.pos += 1;
        while let Some(&b) = bytes.get(self.pos) {
            self.pos += 1;
            match b {
                b'\\' => {
                    if bytes.get(self.pos).is_some() {
                        self.pos += 1;
                    }
                }
                b'\'' => {
                    if bytes.get(self.pos) == Some(&b'\'') {
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                _ => {}
            }
        }
        self.make(TokenKind::StringLiteral, start)
    }

    /// Scan from a `$`: either a positional parameter (`$1`) or a
    /// dollar-quoted string (`$tag$...$tag$`). A bare `$` that opens
    /// neither is emitted as an operator.
    fn scan_dollar(&mut self, start: usize) -> Token<'a> {
        let bytes = self.input.as_bytes();
        if bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
            while bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
                self.pos += 1;
            }
            return self.make(TokenKind::Parameter, start);
        }

        let mut tag_end = self.pos + 1;
        while bytes
            .get(tag_end)
            .is_some_and(|&b| b == b'_' || b.is_ascii_alphanumeric() || b >= 0x80)
        {
            tag_end += 1;
        }
        if bytes.get(tag_end) == Some(&b'$') {
            // The closing delimiter is the identical "$tag$" sequence.
            let tag = &bytes[self.pos..=tag_end];
            let body_start = tag_end + 1;
            match find_subslice(&bytes[body_start..], tag) {
                Some(rel) => self.pos = body_start + rel + tag.len(),
                None => self.pos = self.input.len(),
            }
            return self.make(TokenKind::StringLiteral, start);
        }

        self.pos += 1;
        self.make(TokenKind::Operator, start)
    }

    fn scan_number(&mut self, start: usize) -> Token<'a> {
        let bytes = self.input.as_bytes();
        while bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        if bytes.get(self.pos) == Some(&b'.') {
            self.pos += 1;
            while bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
                self.pos += 1;
            }
        }
        if matches!(bytes.get(self.pos), Some(b'e' | b'E')) {
            let mut exp = self.pos + 1;
            if matches!(bytes.get(exp), Some(b'+' | b'-')) {
                exp += 1;
            }
            if bytes.get(exp).is_some_and(u8::is_ascii_digit) {
                self.pos = exp;
                while bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
                    self.pos += 1;
                }
            }
        }
        self.make(TokenKind::Number, start)
    }

    fn scan_word(&mut self, start: usize) -> Token<'a> {
        let bytes = self.input.as_bytes();
        // PostgreSQL allows `$` and non-ASCII characters in identifier
        // bodies, so `a$b` is one word, never a dollar-quote opener.
        while bytes
            .get(self.pos)
            .is_some_and(|&b| b == b'_' || b == b'$' || b.is_ascii_alphanumeric() || b >= 0x80)
        {
            self.pos += 1;
        }
        self.make(TokenKind::Word, start)
    }

    fn next_token(&mut self) -> Option<Token<'a>> {
        self.skip_trivia();
        let bytes = self.input.as_bytes();
        let start = self.pos;
        let b = *bytes.get(self.pos)?;
        let token = match b {
            b'\'' => self.scan_doubled(b'\'', TokenKind::StringLiteral, start),
            b'"' => self.scan_doubled(b'"', TokenKind::QuotedIdentifier, start),
            b'e' | b'E' if bytes.get(self.pos + 1) == Some(&b'\'') => {
                self.pos += 1;
                self.scan_escaped_string(start)
            }
            b'b' | b'B' | b'x' | b'X' if bytes.get(self.pos + 1) == Some(&b'\'') => {
                self.pos += 1;
                self.scan_doubled(b'\'', TokenKind::StringLiteral, start)
            }
            b'u' | b'U'
                if bytes.get(self.pos + 1) == Some(&b'&')
                    && bytes.get(self.pos + 2) == Some(&b'\'') =>
            {
                self.pos += 2;
                self.scan_doubled(b'\'', TokenKind::StringLiteral, start)
            }
            b'u' | b'U'
                if bytes.get(self.pos + 1) == Some(&b'&')
                    && bytes.get(self.pos + 2) == Some(&b'"') =>
            {
                self.pos += 2;
                self.scan_doubled(b'"', TokenKind::QuotedIdentifier, start)
            }
            b'$' => self.scan_dollar(start),
            b';' => {
                self.pos += 1;
                self.make(TokenKind::Semicolon, start)
            }
            b'(' => {
                self.pos += 1;
                self.make(TokenKind::LeftParen, start)
            }
            b')' => {
                self.pos += 1;
                self.make(TokenKind::RightParen, start)
            }
            b',' => {
                self.pos += 1;
                self.make(TokenKind::Comma, start)
            }
            b'.' if bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit) => {
                self.scan_number(start)
            }
            b if b.is_ascii_digit() => self.scan_number(start),
            b if b == b'_' || b.is_ascii_alphabetic() || b >= 0x80 => self.scan_word(start),
            _ => {
                self.pos += 1;
                self.make(TokenKind::Operator, start)
            }
        };
        Some(token)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
