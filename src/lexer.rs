pub use logos::Span;
use logos::{Lexer, Logos};

fn read_number(lexer: &mut Lexer<Token>) -> Result<u32, ScanError> {
    lexer.slice().parse().map_err(|_| ScanError::NumberTooBig)
}

#[derive(thiserror::Error, Debug, PartialEq, Clone, Default)]
pub enum ScanError {
    #[default]
    #[error("unrecognized token")]
    Unrecognized,
    #[error("number literal too big")]
    NumberTooBig,
}

/// Tokens shared by the two line-oriented input formats: primitive
/// specifications (`name first [last]`) and symbolic constant definitions
/// (`NAME = NUMBER,`).
///
/// Intraline whitespace and comments (`#` or `//`, to end of line) carry no
/// meaning in either format and are skipped outright.
#[derive(Debug, Clone, PartialEq, Logos)]
#[logos(error = ScanError)]
#[logos(skip r"[ \t]+")]
#[logos(skip r"#[^\n]*")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    #[token("\n")]
    #[token("\r\n")]
    #[token("\r")]
    LineEnding,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |l| Box::from(l.slice()))]
    Identifier(Box<str>),
    #[regex(r"[0-9]+", read_number)]
    Number(u32),
    #[token("=")]
    Equals,
    #[token(",")]
    Comma,
}

impl Token {
    pub fn lexer(source: &str) -> Lexer<'_, Self> {
        <Self as Logos>::lexer(source)
    }
}

pub type SpannedToken = (Result<Token, ScanError>, Span);

/// Lexes `source` and splits the token stream into one group per input line.
/// Line endings are consumed by the split; blank (and comment-only) lines
/// come out as empty groups.
pub fn line_groups(source: &str) -> Vec<Vec<SpannedToken>> {
    let mut groups = vec![];
    let mut current = vec![];
    for (token, span) in Token::lexer(source).spanned() {
        match token {
            Ok(Token::LineEnding) => groups.push(std::mem::take(&mut current)),
            tok => current.push((tok, span)),
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}
