//! Template lexer.
//!
//! Splits template source into [`Token`]s: literal text, variable references
//! (`{{ }}`), block tags (`{% %}`), and comments (`{# #}`). Each token records
//! the line it started on so the parser can report useful syntax errors.
//!
//! Like Django, a tag must open and close on the same line; anything that
//! does not form a complete tag is left as text.

use std::sync::OnceLock;

use regex::Regex;

/// The kind and content of a lexed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A literal text segment.
    Text(String),
    /// The trimmed expression inside `{{ ... }}`.
    Variable(String),
    /// The bits of a `{% ... %}` tag, tag name first.
    Block(Vec<String>),
    /// The trimmed text inside `{# ... #}`.
    Comment(String),
}

/// A token together with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lineno: usize,
}

impl Token {
    /// Returns the tag name for block tokens.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Block(bits) => bits.first().map(String::as_str),
            _ => None,
        }
    }
}

fn tag_re() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| {
        Regex::new(r"\{%.*?%\}|\{\{.*?\}\}|\{#.*?#\}").unwrap_or_else(|e| panic!("{e}"))
    })
}

/// Tokenizes template source.
///
/// ```
/// use djformtags_template::lexer::{tokenize, TokenKind};
///
/// let tokens = tokenize("Hi {{ name }}{% load formtags %}");
/// assert_eq!(tokens[1].kind, TokenKind::Variable("name".into()));
/// assert_eq!(tokens[2].kind, TokenKind::Block(vec!["load".into(), "formtags".into()]));
/// ```
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lineno = 1;
    let mut last = 0;

    for m in tag_re().find_iter(source) {
        if m.start() > last {
            let text = &source[last..m.start()];
            tokens.push(Token {
                kind: TokenKind::Text(text.to_string()),
                lineno,
            });
            lineno += text.matches('\n').count();
        }
        tokens.push(Token {
            kind: classify_tag(m.as_str()),
            lineno,
        });
        lineno += m.as_str().matches('\n').count();
        last = m.end();
    }

    if last < source.len() {
        tokens.push(Token {
            kind: TokenKind::Text(source[last..].to_string()),
            lineno,
        });
    }

    tokens
}

fn classify_tag(raw: &str) -> TokenKind {
    let inner = raw[2..raw.len() - 2].trim();
    match &raw[..2] {
        "{{" => TokenKind::Variable(inner.to_string()),
        "{%" => TokenKind::Block(split_contents(inner)),
        _ => TokenKind::Comment(inner.to_string()),
    }
}

/// Splits tag content on whitespace, keeping quoted runs together.
///
/// Quotes are kept in the output. Inside a quoted run the other quote
/// character is literal, and a backslash escapes the next character.
/// A bit may mix bare and quoted text, as in `label="My Label"`.
pub fn split_contents(content: &str) -> Vec<String> {
    let mut bits = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = content.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(_), '\\') => {
                current.push(ch);
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            (None, '"' | '\'') => {
                quote = Some(ch);
                current.push(ch);
            }
            (None, c) if c.is_whitespace() => {
                if !current.is_empty() {
                    bits.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        bits.push(current);
    }
    bits
}
