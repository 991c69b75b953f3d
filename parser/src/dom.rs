//! Element tree built from the token stream.

use crate::{Lexer, ParseError, ParseResult, Span, Token, TokenKind};

/// A node in the element tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
    pub span: Span,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Direct character data, trimmed.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let Node::Text(t) = node {
                out.push_str(t);
            }
        }
        out.trim().to_string()
    }

    /// An attribute, or else the text of a same-named child element.
    /// Empty values count as absent.
    pub fn field(&self, name: &str) -> Option<String> {
        if let Some(v) = self.attr(name) {
            let v = v.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
        self.child(name)
            .map(|c| c.text())
            .filter(|t| !t.is_empty())
    }

    /// Every descendant (depth-first, document order) with the given name.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in self.elements() {
            if child.name == name {
                found.push(child);
            }
            child.collect_named(name, found);
        }
    }
}

/// Parse a whole XML document and return its root element.
pub fn parse_document(input: &str) -> ParseResult<Element> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = DocumentParser::new(tokens);
    parser.parse_root()
}

struct DocumentParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl DocumentParser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    // ==================== HELPERS ====================

    fn peek(&self) -> &Token {
        // tokenize() always ends with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn skip_blank_text(&mut self) {
        while self.peek().kind.is_blank_text() {
            self.advance();
        }
    }

    // ==================== ELEMENTS ====================

    fn parse_root(&mut self) -> ParseResult<Element> {
        self.skip_blank_text();
        let token = self.advance();
        let root = match token.kind {
            TokenKind::StartTag {
                name,
                attrs,
                self_closing,
            } => self.parse_element(name, attrs, self_closing, token.span)?,
            TokenKind::Eof => return Err(ParseError::unexpected_eof(token.span, "root element")),
            other => {
                return Err(ParseError::unexpected_token(
                    token.span,
                    "root element",
                    &other.name(),
                ))
            }
        };
        self.skip_blank_text();
        let trailing = self.peek();
        if trailing.kind != TokenKind::Eof {
            return Err(ParseError::unexpected_token(
                trailing.span,
                "end of input",
                &trailing.kind.name(),
            ));
        }
        Ok(root)
    }

    fn parse_element(
        &mut self,
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
        span: Span,
    ) -> ParseResult<Element> {
        let mut element = Element {
            name,
            attrs,
            children: Vec::new(),
            span,
        };
        if self_closing {
            return Ok(element);
        }
        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::StartTag {
                    name,
                    attrs,
                    self_closing,
                } => {
                    let child = self.parse_element(name, attrs, self_closing, token.span)?;
                    element.children.push(Node::Element(child));
                }
                TokenKind::Text(text) => element.children.push(Node::Text(text)),
                TokenKind::EndTag(end) if end == element.name => return Ok(element),
                TokenKind::EndTag(end) => {
                    return Err(ParseError::unexpected_token(
                        token.span,
                        &format!("</{}>", element.name),
                        &format!("</{}>", end),
                    ))
                }
                TokenKind::Eof => {
                    return Err(ParseError::unexpected_eof(
                        token.span,
                        &format!("</{}>", element.name),
                    ))
                }
            }
        }
    }
}
