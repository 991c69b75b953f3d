//! Lexer (tokenizer) for XML documents.
//!
//! Produces start tags (with decoded attributes), end tags and text runs.
//! Comments, processing instructions and DOCTYPE declarations are skipped;
//! CDATA sections become verbatim text.

use crate::{ParseError, ParseResult};

/// Source location of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

/// Token types.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `<name a="1">` or `<name/>`
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    /// `</name>`
    EndTag(String),
    /// Character data with entities decoded.
    Text(String),
    Eof,
}

impl TokenKind {
    pub fn name(&self) -> String {
        match self {
            TokenKind::StartTag { name, .. } => format!("<{}>", name),
            TokenKind::EndTag(name) => format!("</{}>", name),
            TokenKind::Text(_) => "text".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }

    pub fn is_blank_text(&self) -> bool {
        matches!(self, TokenKind::Text(t) if t.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn eof(pos: usize, line: usize, column: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            span: Span::new(pos, pos, line, column),
        }
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        // A leading byte-order mark is not content.
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        Self {
            input,
            chars: input.char_indices().peekable(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize all input into a vector of tokens.
    pub fn tokenize(mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn current_span(&self) -> Span {
        Span::new(self.pos, self.pos, self.line, self.column)
    }

    fn span_from(&self, start: usize, start_line: usize, start_col: usize) -> Span {
        Span::new(start, self.pos, start_line, start_col)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn next_char(&mut self) -> Option<char> {
        if let Some((pos, c)) = self.chars.next() {
            self.pos = pos + c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(c)
        } else {
            None
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.next_char();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Consume everything up to and including `terminator`, returning the
    /// text before it.
    fn take_until(&mut self, terminator: &str, what: &str) -> ParseResult<&'a str> {
        let start = self.pos;
        match self.rest().find(terminator) {
            Some(offset) => {
                let body = &self.input[start..start + offset];
                self.advance_by(body.chars().count() + terminator.chars().count());
                Ok(body)
            }
            None => Err(ParseError::unexpected_eof(self.current_span(), what)),
        }
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        loop {
            let start = self.pos;
            let start_line = self.line;
            let start_col = self.column;

            let rest = self.rest();
            if rest.is_empty() {
                return Ok(Token::eof(self.pos, self.line, self.column));
            }

            if rest.starts_with("<!--") {
                self.advance_by(4);
                self.take_until("-->", "'-->'")?;
                continue;
            }
            if rest.starts_with("<?") {
                self.advance_by(2);
                self.take_until("?>", "'?>'")?;
                continue;
            }
            if rest.starts_with("<![CDATA[") {
                self.advance_by(9);
                let body = self.take_until("]]>", "']]>'")?;
                return Ok(Token::new(
                    TokenKind::Text(body.to_string()),
                    self.span_from(start, start_line, start_col),
                ));
            }
            if rest.starts_with("<!") {
                self.skip_declaration()?;
                continue;
            }
            if rest.starts_with("</") {
                self.advance_by(2);
                let name = self.scan_name()?;
                self.skip_whitespace();
                self.expect_char('>')?;
                return Ok(Token::new(
                    TokenKind::EndTag(name),
                    self.span_from(start, start_line, start_col),
                ));
            }
            if rest.starts_with('<') {
                self.next_char();
                return self.scan_start_tag(start, start_line, start_col);
            }

            let raw = match rest.find('<') {
                Some(offset) => &rest[..offset],
                None => rest,
            };
            self.advance_by(raw.chars().count());
            let span = self.span_from(start, start_line, start_col);
            return Ok(Token::new(TokenKind::Text(decode_entities(raw)), span));
        }
    }

    /// `<!DOCTYPE ...>` with an optional bracketed internal subset.
    fn skip_declaration(&mut self) -> ParseResult<()> {
        let mut depth = 0usize;
        while let Some(c) = self.next_char() {
            match c {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                '>' if depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(ParseError::unexpected_eof(self.current_span(), "'>'"))
    }

    fn scan_start_tag(
        &mut self,
        start: usize,
        start_line: usize,
        start_col: usize,
    ) -> ParseResult<Token> {
        let name = self.scan_name()?;
        let mut attrs = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek_char() {
                Some('/') => {
                    self.next_char();
                    self.expect_char('>')?;
                    return Ok(Token::new(
                        TokenKind::StartTag {
                            name,
                            attrs,
                            self_closing: true,
                        },
                        self.span_from(start, start_line, start_col),
                    ));
                }
                Some('>') => {
                    self.next_char();
                    return Ok(Token::new(
                        TokenKind::StartTag {
                            name,
                            attrs,
                            self_closing: false,
                        },
                        self.span_from(start, start_line, start_col),
                    ));
                }
                Some(_) => {
                    let attr_name = self.scan_name()?;
                    self.skip_whitespace();
                    self.expect_char('=')?;
                    self.skip_whitespace();
                    let value = self.scan_attr_value()?;
                    attrs.push((attr_name, value));
                }
                None => {
                    return Err(ParseError::unexpected_eof(self.current_span(), "'>'"));
                }
            }
        }
    }

    fn scan_name(&mut self) -> ParseResult<String> {
        let mut name = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':') {
                name.push(c);
                self.next_char();
            } else {
                break;
            }
        }
        if name.is_empty() {
            let found = self
                .peek_char()
                .map(|c| format!("'{}'", c))
                .unwrap_or_else(|| "end of input".to_string());
            return Err(ParseError::unexpected_token(self.current_span(), "name", &found));
        }
        Ok(name)
    }

    fn scan_attr_value(&mut self) -> ParseResult<String> {
        let quote = match self.peek_char() {
            Some(q @ ('"' | '\'')) => q,
            Some(c) => {
                return Err(ParseError::unexpected_token(
                    self.current_span(),
                    "quoted attribute value",
                    &format!("'{}'", c),
                ))
            }
            None => return Err(ParseError::unexpected_eof(self.current_span(), "attribute value")),
        };
        self.next_char();
        let raw = self.take_until(&quote.to_string(), "closing quote")?;
        Ok(decode_entities(raw))
    }

    fn expect_char(&mut self, expected: char) -> ParseResult<()> {
        match self.peek_char() {
            Some(c) if c == expected => {
                self.next_char();
                Ok(())
            }
            Some(c) => Err(ParseError::unexpected_token(
                self.current_span(),
                &format!("'{}'", expected),
                &format!("'{}'", c),
            )),
            None => Err(ParseError::unexpected_eof(
                self.current_span(),
                &format!("'{}'", expected),
            )),
        }
    }
}

/// Replace the predefined and numeric character references. Unknown
/// references are kept verbatim.
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn start(name: &str, attrs: &[(&str, &str)], self_closing: bool) -> TokenKind {
        TokenKind::StartTag {
            name: name.into(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            self_closing,
        }
    }

    #[test]
    fn test_tags_and_text() {
        let kinds = tokenize(r#"<a x="1"><b/>hi</a>"#);
        assert_eq!(
            kinds,
            vec![
                start("a", &[("x", "1")], false),
                start("b", &[], true),
                TokenKind::Text("hi".into()),
                TokenKind::EndTag("a".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_skips_prolog_and_comments() {
        let kinds = tokenize("<?xml version=\"1.0\"?><!DOCTYPE x [<!ENTITY a 'b'>]><!-- c --><x/>");
        assert_eq!(kinds, vec![start("x", &[], true), TokenKind::Eof]);
    }

    #[test]
    fn test_entities_and_cdata() {
        let kinds = tokenize(r#"<t v="&lt;5 &amp; &#62;1">a &gt; b<![CDATA[<raw>]]></t>"#);
        assert_eq!(kinds[0], start("t", &[("v", "<5 & >1")], false));
        assert_eq!(kinds[1], TokenKind::Text("a > b".into()));
        assert_eq!(kinds[2], TokenKind::Text("<raw>".into()));
    }

    #[test]
    fn test_unknown_entity_is_kept() {
        assert_eq!(decode_entities("a &nbsp; b & c"), "a &nbsp; b & c");
        assert_eq!(decode_entities("&#x41;&#66;"), "AB");
    }

    #[test]
    fn test_single_quoted_attr_and_namespaces() {
        let kinds = tokenize("<x:y a:b='q'/>");
        assert_eq!(kinds[0], start("x:y", &[("a:b", "q")], true));
    }

    #[test]
    fn test_span_tracking() {
        let tokens = Lexer::new("<a>\n  <b/>\n</a>").tokenize().unwrap();
        assert_eq!(tokens[2].span.line, 2);
        assert_eq!(tokens[2].span.column, 3);
    }

    #[test]
    fn test_unterminated_comment_errors() {
        let err = Lexer::new("<a><!-- oops").tokenize().unwrap_err();
        assert!(err.message.contains("unexpected end of input"));
    }

    #[test]
    fn test_unquoted_attribute_errors() {
        let err = Lexer::new("<a x=1/>").tokenize().unwrap_err();
        assert_eq!(err.found.as_deref(), Some("'1'"));
    }
}
