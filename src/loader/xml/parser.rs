//! Recursive descent parser that turns lexer tokens into an [`IsaDocument`].

use std::path::{Path, PathBuf};

use crate::isa::ast::{Attribute, Element, IsaDocument};
use crate::isa::diagnostic::{DiagnosticPhase, IsaDiagnostic, SourcePosition, SourceSpan};
use crate::isa::error::IsaError;

use super::lexer::{Lexer, Token, TokenKind};

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    path: PathBuf,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, path: PathBuf) -> Self {
        Self {
            lexer: Lexer::new(source, path.clone()),
            path,
        }
    }

    pub fn parse_document(&mut self) -> Result<IsaDocument, IsaError> {
        let mut root = None;
        loop {
            let token = self.lexer.next_token()?;
            match token.kind {
                TokenKind::EOF => {
                    let Some(root) = root else {
                        return Err(self.error_at(
                            "parser.missing-root",
                            "document has no root element",
                            &token,
                        ));
                    };
                    return Ok(IsaDocument::new(self.path.clone(), root));
                }
                TokenKind::Text if token.lexeme.trim().is_empty() => {}
                TokenKind::Text => {
                    return Err(self.error_at(
                        "parser.text-outside-root",
                        "character data outside the root element",
                        &token,
                    ));
                }
                TokenKind::StartTag if root.is_none() => {
                    root = Some(self.parse_element(token)?);
                }
                TokenKind::StartTag => {
                    return Err(self.error_at(
                        "parser.multiple-roots",
                        format!("second root element <{}>", token.lexeme),
                        &token,
                    ));
                }
                _ => {
                    return Err(self.error_at(
                        "parser.unexpected-token",
                        format!("unexpected '{}' at top level", token.lexeme),
                        &token,
                    ));
                }
            }
        }
    }

    fn parse_element(&mut self, open: Token) -> Result<Element, IsaError> {
        let mut element = Element::new(open.lexeme.clone());
        let start = SourcePosition::new(open.line, open.column);
        element.span = Some(SourceSpan::point(self.path.clone(), start));

        loop {
            let token = self.lexer.next_token()?;
            match token.kind {
                TokenKind::Name => {
                    self.expect(TokenKind::Equals, "'=' after attribute name")?;
                    let value = self.expect(TokenKind::Value, "quoted attribute value")?;
                    if element.has_attr(&token.lexeme) {
                        return Err(self.error_at(
                            "parser.attribute.duplicate",
                            format!(
                                "attribute '{}' repeated on <{}>",
                                token.lexeme, element.tag
                            ),
                            &token,
                        ));
                    }
                    element.attributes.push(Attribute {
                        name: token.lexeme,
                        value: value.lexeme,
                    });
                }
                TokenKind::TagEnd => break,
                TokenKind::EmptyTagEnd => return Ok(element),
                _ => {
                    return Err(self.error_at(
                        "parser.tag.syntax",
                        format!("unexpected '{}' inside <{}>", token.lexeme, element.tag),
                        &token,
                    ));
                }
            }
        }

        let mut text = String::new();
        loop {
            let token = self.lexer.next_token()?;
            match token.kind {
                TokenKind::Text => text.push_str(&token.lexeme),
                TokenKind::StartTag => {
                    let child = self.parse_element(token)?;
                    element.children.push(child);
                }
                TokenKind::EndTag if token.lexeme == element.tag => {
                    let end = SourcePosition::new(token.line, token.column);
                    element.span = Some(SourceSpan::new(self.path.clone(), start, end));
                    break;
                }
                TokenKind::EndTag => {
                    return Err(self.error_at(
                        "parser.end-tag.mismatch",
                        format!(
                            "</{}> closes <{}> opened at {}:{}",
                            token.lexeme, element.tag, open.line, open.column
                        ),
                        &token,
                    ));
                }
                TokenKind::EOF => {
                    return Err(self.error_at(
                        "parser.element.unclosed",
                        format!("<{}> is never closed", element.tag),
                        &open,
                    ));
                }
                _ => {
                    return Err(self.error_at(
                        "parser.content.syntax",
                        format!("unexpected '{}' in content", token.lexeme),
                        &token,
                    ));
                }
            }
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            element.text = Some(trimmed.to_string());
        }
        Ok(element)
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> Result<Token, IsaError> {
        let token = self.lexer.next_token()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(self.error_at("parser.expected", format!("expected {context}"), &token))
        }
    }

    fn error_at(&self, code: &'static str, message: impl Into<String>, token: &Token) -> IsaError {
        IsaError::Diagnostics {
            phase: DiagnosticPhase::Parser,
            diagnostics: vec![IsaDiagnostic::error(
                DiagnosticPhase::Parser,
                code,
                message,
                Some(span_from_token(&self.path, token)),
            )],
        }
    }
}

fn span_from_token(path: &Path, token: &Token) -> SourceSpan {
    SourceSpan::point(
        path.to_path_buf(),
        SourcePosition::new(token.line, token.column),
    )
}

/// Convenience helper for callers that do not need to hold onto the parser.
pub fn parse_str(path: PathBuf, src: &str) -> Result<IsaDocument, IsaError> {
    Parser::new(src, path).parse_document()
}
