//! A module implementing token classification for a command line.
//!
//! The line is split on whitespace only; there is no quoting or escaping, so a
//! literal `<`, `>` or `|` can never be passed to a program as data.

use crate::expand::has_wildcard;

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A plain word: program name, argument or file name.
    Word(String),
    /// A word containing a wildcard metacharacter, to be expanded against the
    /// current directory.
    Pattern(String),
    /// Input redirection symbol, `<`.
    RedirectLeft,
    /// Output redirection symbol, `>`.
    RedirectRight,
    /// The pipe operator, `|`.
    PipeOp,
}

impl Token {
    /// The text this token was classified from.
    pub fn as_str(&self) -> &str {
        match self {
            Token::Word(s) | Token::Pattern(s) => s,
            Token::RedirectLeft => "<",
            Token::RedirectRight => ">",
            Token::PipeOp => "|",
        }
    }

    /// Operator spelling, or `None` for words.
    pub fn operator(&self) -> Option<&'static str> {
        match self {
            Token::RedirectLeft => Some("<"),
            Token::RedirectRight => Some(">"),
            Token::PipeOp => Some("|"),
            Token::Word(_) | Token::Pattern(_) => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Token::RedirectLeft | Token::RedirectRight)
    }

    /// Take the text out of a word or pattern token.
    pub fn into_word(self) -> Option<String> {
        match self {
            Token::Word(s) | Token::Pattern(s) => Some(s),
            _ => None,
        }
    }
}

/// Classify one whitespace-delimited token.
pub fn classify(raw: &str) -> Token {
    match raw {
        "<" => Token::RedirectLeft,
        ">" => Token::RedirectRight,
        "|" => Token::PipeOp,
        _ if has_wildcard(raw) => Token::Pattern(raw.to_string()),
        _ => Token::Word(raw.to_string()),
    }
}

/// Split a line on whitespace and classify every piece.
pub fn split_into_tokens(line: &str) -> Vec<Token> {
    line.split_whitespace().map(classify).collect()
}
