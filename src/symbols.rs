use std::collections::HashMap;

use crate::lexer::{self, Token};

/// Name → number mapping for symbolic primitive references, harvested from a
/// header-like definition source.
///
/// Definition sources are real C headers, so parsing is deliberately
/// lenient: anything that is not a `PREFIX_NAME = NUMBER,` line (stray
/// preprocessor output, braces, aliases to other constants) is skipped
/// rather than rejected. Names are stored with the recognized prefix
/// stripped, which is how primitive specifications refer to them.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    definitions: HashMap<Box<str>, u32>,
}

impl SymbolTable {
    /// Collects every recognized definition in `source`. A definition whose
    /// value is not a plain number is left out, so aliases and forward
    /// references stay unresolved instead of failing the parse.
    pub fn parse(source: &str, prefix: &str) -> Self {
        let mut definitions = HashMap::new();
        for group in lexer::line_groups(source) {
            match &group[..] {
                [(Ok(Token::Identifier(name)), _), (Ok(Token::Equals), _), (Ok(Token::Number(value)), _), rest @ ..]
                    if matches!(rest, [] | [(Ok(Token::Comma), _)]) =>
                {
                    if let Some(short) = name.strip_prefix(prefix) {
                        definitions.insert(Box::from(short), *value);
                    }
                }
                _ => {}
            }
        }
        Self { definitions }
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.definitions.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
