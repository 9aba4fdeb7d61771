//! Minimal SQL tokenizer shared by the keyword parsers.
//!
//! Only what table extraction needs: words, quoted identifiers, string
//! literals and single-character punctuation. Comments are dropped.

use super::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// Unquoted word: keyword, identifier or number
    Word(String),
    /// Backtick- or double-quote-quoted identifier
    Quoted(String),
    /// Single-quoted string literal
    Literal(String),
    Punct(char),
}

impl Token {
    pub(crate) fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(keyword))
    }

    pub(crate) fn is_punct(&self, c: char) -> bool {
        matches!(self, Token::Punct(p) if *p == c)
    }

    pub(crate) fn identifier(&self) -> Option<&str> {
        match self {
            Token::Word(w) | Token::Quoted(w) => Some(w),
            _ => None,
        }
    }
}

pub(crate) fn tokenize(sql: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = sql.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '/' && chars.get(i + 1) == Some(&'*') {
            let start = i;
            i += 2;
            loop {
                match (chars.get(i), chars.get(i + 1)) {
                    (Some('*'), Some('/')) => {
                        i += 2;
                        break;
                    }
                    (Some(_), _) => i += 1,
                    (None, _) => return Err(ParseError::UnterminatedComment { position: start }),
                }
            }
        } else if c == '#' || (c == '-' && chars.get(i + 1) == Some(&'-')) {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
        } else if c == '`' || c == '"' || c == '\'' {
            let (text, next) = read_quoted(&chars, i)?;
            tokens.push(if c == '\'' {
                Token::Literal(text)
            } else {
                Token::Quoted(text)
            });
            i = next;
        } else if is_word_char(c) {
            let start = i;
            while i < chars.len() && is_word_char(chars[i]) {
                i += 1;
            }
            tokens.push(Token::Word(chars[start..i].iter().collect()));
        } else {
            tokens.push(Token::Punct(c));
            i += 1;
        }
    }

    Ok(tokens)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Read a quoted run starting at `start`; a doubled quote is a literal quote.
/// Backslash escapes only apply inside string literals.
fn read_quoted(chars: &[char], start: usize) -> Result<(String, usize), ParseError> {
    let quote = chars[start];
    let mut text = String::new();
    let mut i = start + 1;

    loop {
        match chars.get(i) {
            None => return Err(ParseError::UnterminatedQuote { position: start }),
            Some('\\') if quote == '\'' => {
                if let Some(escaped) = chars.get(i + 1) {
                    text.push(*escaped);
                }
                i += 2;
            }
            Some(&c) if c == quote => {
                if chars.get(i + 1) == Some(&quote) {
                    text.push(quote);
                    i += 2;
                } else {
                    return Ok((text, i + 1));
                }
            }
            Some(&c) => {
                text.push(c);
                i += 1;
            }
        }
    }
}

/// Forward-only cursor over a token list
#[derive(Debug)]
pub(crate) struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn next_token(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn is_done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub(crate) fn peek_keyword(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(keyword))
    }

    pub(crate) fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume `keywords` only if they all appear next, in order
    pub(crate) fn eat_keywords(&mut self, keywords: &[&str]) -> bool {
        let matched = keywords
            .iter()
            .enumerate()
            .all(|(offset, kw)| self.tokens.get(self.pos + offset).is_some_and(|t| t.is_keyword(kw)));
        if matched {
            self.pos += keywords.len();
        }
        matched
    }

    /// Consume any run of the given modifier keywords
    pub(crate) fn skip_keywords(&mut self, keywords: &[&str]) {
        while keywords.iter().any(|kw| self.peek_keyword(kw)) {
            self.pos += 1;
        }
    }

    /// Advance past the next occurrence of `keyword`; false if there is none
    pub(crate) fn seek_keyword(&mut self, keyword: &str) -> bool {
        while let Some(token) = self.next_token() {
            if token.is_keyword(keyword) {
                return true;
            }
        }
        false
    }

    /// Read `name` or `qualifier.name`
    pub(crate) fn qualified_name(&mut self) -> Option<(Option<String>, String)> {
        let first = self.peek()?.identifier()?.to_string();
        self.pos += 1;

        let dotted = self.peek().is_some_and(|t| t.is_punct('.'));
        if dotted {
            if let Some(second) = self.tokens.get(self.pos + 1).and_then(Token::identifier) {
                let second = second.to_string();
                self.pos += 2;
                return Some((Some(first), second));
            }
        }
        Some((None, first))
    }
}
