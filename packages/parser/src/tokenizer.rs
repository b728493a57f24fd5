//! Markup lexer built on logos.
//!
//! Only the coarse structure is lexed here: tags, comments, doctypes and
//! runs of text. Attribute scanning happens in [`crate::parser`] on the raw
//! tag slice.

use crate::{ParseError, ParseResult};
use logos::Logos;
use std::fmt;
use std::ops::Range;

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
pub enum Token<'src> {
    #[regex(r"<!--([^-]|-[^-])*-->", |lex| lex.slice())]
    Comment(&'src str),

    #[regex(r"<![a-zA-Z][^>]*>", |lex| lex.slice())]
    Doctype(&'src str),

    #[regex(r#"<[a-zA-Z][a-zA-Z0-9-]*([^>"']|"[^"]*"|'[^']*')*>"#, |lex| lex.slice())]
    OpenTag(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9-]*[ \t\r\n]*>", |lex| lex.slice())]
    CloseTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Comment(_) => write!(f, "comment"),
            Token::Doctype(d) => write!(f, "doctype {}", d),
            Token::OpenTag(t) => write!(f, "open tag {}", t),
            Token::CloseTag(t) => write!(f, "close tag {}", t),
            Token::Text(t) => write!(f, "text {:?}", t),
        }
    }
}

/// Token with its byte span in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedToken<'src> {
    pub token: Token<'src>,
    pub span: Range<usize>,
}

/// Lex `source` into tokens.
///
/// A `<` that does not start a tag, comment or doctype is plain text. A `<`
/// that starts a tag name but never reaches its `>` is an error.
pub fn tokenize(source: &str) -> ParseResult<Vec<SpannedToken<'_>>> {
    let mut tokens = Vec::new();

    for (result, span) in Token::lexer(source).spanned() {
        let token = match result {
            Ok(token) => token,
            Err(()) => {
                if starts_tag(&source[span.start..]) {
                    return Err(ParseError::unterminated_tag(span.start));
                }
                Token::Text(&source[span.clone()])
            }
        };
        tokens.push(SpannedToken { token, span });
    }

    Ok(tokens)
}

fn starts_tag(rest: &str) -> bool {
    let mut chars = rest.chars().skip(1);
    match chars.next() {
        Some('/') => chars.next().is_some_and(|c| c.is_ascii_alphabetic()),
        Some(c) => c.is_ascii_alphabetic(),
        None => false,
    }
}
