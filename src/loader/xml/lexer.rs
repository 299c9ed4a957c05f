//! Streaming tokenizer for XML-shaped instruction-set documents.
//!
//! The lexer alternates between content mode (text, comments, tag openers) and markup mode
//! (attribute names, `=`, quoted values, and the closing `>` / `/>` of a start tag).

use std::path::PathBuf;

use crate::isa::diagnostic::{DiagnosticPhase, IsaDiagnostic, SourcePosition, SourceSpan};
use crate::isa::error::IsaError;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `<name`; the lexeme holds the element name.
    StartTag,
    /// `</name>`; the lexeme holds the element name.
    EndTag,
    Name,
    Equals,
    /// Quoted attribute value with entities decoded.
    Value,
    TagEnd,
    EmptyTagEnd,
    /// Character data with entities decoded, whitespace preserved.
    Text,
    EOF,
}

pub struct Lexer<'src> {
    src: &'src str,
    path: PathBuf,
    offset: usize,
    line: usize,
    column: usize,
    in_tag: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str, path: PathBuf) -> Self {
        // A leading byte-order mark is not document content.
        let src = src.strip_prefix('\u{feff}').unwrap_or(src);
        Self {
            src,
            path,
            offset: 0,
            line: 1,
            column: 0,
            in_tag: false,
        }
    }

    /// Produces the next token.
    pub fn next_token(&mut self) -> Result<Token, IsaError> {
        if self.in_tag {
            return self.next_markup_token();
        }
        loop {
            if self.is_eof() {
                let (line, column) = self.position();
                return Ok(self.make_token(TokenKind::EOF, "", line, column));
            }
            if self.starts_with("<!--") {
                self.skip_until("<!--", "-->", "lexer.comment.unterminated", "unterminated comment")?;
                continue;
            }
            if self.starts_with("<![CDATA[") {
                return self.consume_cdata();
            }
            if self.starts_with("<?") {
                self.skip_until(
                    "<?",
                    "?>",
                    "lexer.pi.unterminated",
                    "unterminated processing instruction",
                )?;
                continue;
            }
            if self.starts_with("<!") {
                self.skip_until("<!", ">", "lexer.decl.unterminated", "unterminated declaration")?;
                continue;
            }
            if self.starts_with("</") {
                return self.consume_end_tag();
            }
            if self.peek_char() == Some('<') {
                return self.consume_start_tag();
            }
            return self.consume_text();
        }
    }

    fn next_markup_token(&mut self) -> Result<Token, IsaError> {
        self.skip_whitespace();
        let Some(ch) = self.peek_char() else {
            return Err(self.lexer_error_here("lexer.tag.unterminated", "unterminated start tag"));
        };
        match ch {
            '>' => {
                self.in_tag = false;
                Ok(self.consume_single(TokenKind::TagEnd))
            }
            '/' => {
                let start = self.offset;
                let (line, column) = self.position();
                self.advance_char();
                if self.peek_char() != Some('>') {
                    return Err(self.emit_lexer_diagnostic(
                        "lexer.tag.slash",
                        "expected '>' after '/' in tag",
                        line,
                        column,
                    ));
                }
                self.advance_char();
                self.in_tag = false;
                Ok(self.make_token_from_span(TokenKind::EmptyTagEnd, start, self.offset, line, column))
            }
            '=' => Ok(self.consume_single(TokenKind::Equals)),
            '"' | '\'' => self.consume_value(ch),
            ch if is_name_start(ch) => Ok(self.consume_name(TokenKind::Name)),
            _ => {
                let message = format!("unexpected character '{ch}' in tag");
                let err = self.lexer_error_here("lexer.unexpected-char", message);
                self.advance_char();
                Err(err)
            }
        }
    }

    fn consume_start_tag(&mut self) -> Result<Token, IsaError> {
        let (line, column) = self.position();
        self.advance_char(); // '<'
        if !self.peek_char().map(is_name_start).unwrap_or(false) {
            return Err(self.emit_lexer_diagnostic(
                "lexer.tag.name",
                "expected element name after '<'",
                line,
                column,
            ));
        }
        let name = self.consume_name(TokenKind::StartTag);
        self.in_tag = true;
        Ok(Token {
            line,
            column,
            ..name
        })
    }

    fn consume_end_tag(&mut self) -> Result<Token, IsaError> {
        let (line, column) = self.position();
        self.advance_char(); // '<'
        self.advance_char(); // '/'
        if !self.peek_char().map(is_name_start).unwrap_or(false) {
            return Err(self.emit_lexer_diagnostic(
                "lexer.end-tag.name",
                "expected element name after '</'",
                line,
                column,
            ));
        }
        let name = self.consume_name(TokenKind::EndTag);
        self.skip_whitespace();
        if self.peek_char() != Some('>') {
            return Err(self.lexer_error_here("lexer.end-tag.unclosed", "end tag missing '>'"));
        }
        self.advance_char();
        Ok(Token {
            line,
            column,
            ..name
        })
    }

    fn consume_name(&mut self, kind: TokenKind) -> Token {
        let start = self.offset;
        let (line, column) = self.position();
        self.advance_char();
        while let Some(ch) = self.peek_char() {
            if is_name_part(ch) {
                self.advance_char();
            } else {
                break;
            }
        }
        self.make_token_from_span(kind, start, self.offset, line, column)
    }

    fn consume_value(&mut self, quote: char) -> Result<Token, IsaError> {
        let (line, column) = self.position();
        self.advance_char(); // opening quote
        let src = self.src;
        let start = self.offset;
        while let Some(ch) = self.peek_char() {
            if ch == quote {
                let raw = &src[start..self.offset];
                self.advance_char();
                let value = self.decode_entities(raw, line, column)?;
                return Ok(self.make_token(TokenKind::Value, &value, line, column));
            }
            if ch == '<' {
                return Err(self.lexer_error_here(
                    "lexer.value.lt",
                    "'<' is not allowed inside an attribute value",
                ));
            }
            self.advance_char();
        }
        Err(self.emit_lexer_diagnostic(
            "lexer.value.unterminated",
            "unterminated attribute value",
            line,
            column,
        ))
    }

    fn consume_text(&mut self) -> Result<Token, IsaError> {
        let start = self.offset;
        let (line, column) = self.position();
        while let Some(ch) = self.peek_char() {
            if ch == '<' {
                break;
            }
            self.advance_char();
        }
        let raw = &self.src[start..self.offset];
        let text = self.decode_entities(raw, line, column)?;
        Ok(self.make_token(TokenKind::Text, &text, line, column))
    }

    fn consume_cdata(&mut self) -> Result<Token, IsaError> {
        let (line, column) = self.position();
        self.advance_str("<![CDATA[");
        let start = self.offset;
        while !self.is_eof() {
            if self.starts_with("]]>") {
                let end = self.offset;
                self.advance_str("]]>");
                return Ok(self.make_token_from_span(TokenKind::Text, start, end, line, column));
            }
            self.advance_char();
        }
        Err(self.emit_lexer_diagnostic(
            "lexer.cdata.unterminated",
            "unterminated CDATA section",
            line,
            column,
        ))
    }

    fn skip_until(
        &mut self,
        opener: &str,
        terminator: &str,
        code: &'static str,
        message: &str,
    ) -> Result<(), IsaError> {
        let (line, column) = self.position();
        self.advance_str(opener);
        while !self.is_eof() {
            if self.starts_with(terminator) {
                self.advance_str(terminator);
                return Ok(());
            }
            self.advance_char();
        }
        Err(self.emit_lexer_diagnostic(code, message, line, column))
    }

    fn decode_entities(&self, raw: &str, line: usize, column: usize) -> Result<String, IsaError> {
        if !raw.contains('&') {
            return Ok(raw.to_string());
        }
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(amp) = rest.find('&') {
            out.push_str(&rest[..amp]);
            let tail = &rest[amp + 1..];
            let Some(semi) = tail.find(';') else {
                return Err(self.emit_lexer_diagnostic(
                    "lexer.entity.unterminated",
                    "entity reference missing ';'",
                    line,
                    column,
                ));
            };
            let entity = &tail[..semi];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => decode_char_reference(entity),
            };
            let Some(ch) = decoded else {
                return Err(self.emit_lexer_diagnostic(
                    "lexer.entity.unknown",
                    format!("unknown entity '&{entity};'"),
                    line,
                    column,
                ));
            };
            out.push(ch);
            rest = &tail[semi + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn consume_single(&mut self, kind: TokenKind) -> Token {
        let start = self.offset;
        let (line, column) = self.position();
        self.advance_char();
        self.make_token_from_span(kind, start, self.offset, line, column)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.src[self.offset..].starts_with(prefix)
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    fn advance_str(&mut self, text: &str) {
        for _ in text.chars() {
            self.advance_char();
        }
    }

    fn advance_char(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.offset += ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        } else {
            self.offset = self.src.len();
        }
    }

    fn is_eof(&self) -> bool {
        self.offset >= self.src.len()
    }

    fn position(&self) -> (usize, usize) {
        (self.line, self.column + 1)
    }

    fn make_token(&self, kind: TokenKind, lexeme: &str, line: usize, column: usize) -> Token {
        Token {
            kind,
            lexeme: lexeme.to_string(),
            line,
            column,
        }
    }

    fn make_token_from_span(
        &self,
        kind: TokenKind,
        start: usize,
        end: usize,
        line: usize,
        column: usize,
    ) -> Token {
        let slice = &self.src[start..end];
        self.make_token(kind, slice, line, column)
    }

    fn emit_lexer_diagnostic(
        &self,
        code: &'static str,
        message: impl Into<String>,
        line: usize,
        column: usize,
    ) -> IsaError {
        let span = SourceSpan::point(self.path.clone(), SourcePosition::new(line, column));
        IsaError::Diagnostics {
            phase: DiagnosticPhase::Lexer,
            diagnostics: vec![IsaDiagnostic::error(
                DiagnosticPhase::Lexer,
                code,
                message,
                Some(span),
            )],
        }
    }

    fn lexer_error_here(&self, code: &'static str, message: impl Into<String>) -> IsaError {
        let (line, column) = self.position();
        self.emit_lexer_diagnostic(code, message, line, column)
    }
}

fn decode_char_reference(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let value = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    char::from_u32(value)
}

fn is_name_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == ':'
}

fn is_name_part(ch: char) -> bool {
    is_name_start(ch) || ch.is_ascii_digit() || ch == '-' || ch == '.'
}
