use arbitrary::Arbitrary;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::{
    lexer::{self, ScanError, Span, SpannedToken, Token},
    symbols::SymbolTable,
};

/// One declared instruction or primitive.
///
/// Range bounds are inclusive and ordered (`first <= last` for entries the
/// loaders produce). A range binds every number it covers to the same
/// handler, which receives the offset from `first` as an implicit parameter.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Entry {
    Single { name: Box<str>, opcode: u32 },
    Range { name: Box<str>, first: u32, last: u32 },
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Self::Single { name, .. } | Self::Range { name, .. } => name,
        }
    }

    /// The lowest number the entry claims, used to order entries for the
    /// switch-dispatch shape.
    pub fn first_opcode(&self) -> u32 {
        match self {
            Self::Single { opcode, .. } => *opcode,
            Self::Range { first, .. } => *first,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SpecError {
    #[error("malformed specification document: {0}")]
    Document(#[from] serde_json::Error),
    #[error("instruction {0:?} declares neither an opcode nor a range")]
    MissingShape(Box<str>),
    #[error("instruction {0:?} declares only one end of its range")]
    HalfOpenRange(Box<str>),
    #[error("instruction {0:?} declares an inverted range ({1} > {2})")]
    InvertedRange(Box<str>, u32, u32),
    #[error("expected `name first [last]`")]
    MalformedLine(Span),
    #[error("{source}")]
    Scan {
        span: Span,
        #[source]
        source: ScanError,
    },
    #[error("{name:?} is neither a number nor a defined symbol")]
    UnresolvedName { name: Box<str>, span: Span },
}

impl SpecError {
    /// Byte range of the offending input, for positional errors.
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::MalformedLine(span)
            | Self::Scan { span, .. }
            | Self::UnresolvedName { span, .. } => Some(span.clone()),
            _ => None,
        }
    }
}

/// Upper-cases the first character of a declared name, matching the
/// interpreter's `bytecode<Name>` handler naming convention.
pub fn capitalize(name: &str) -> Box<str> {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect::<String>().into(),
        None => Box::from(""),
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    opcode: Option<u32>,
    #[serde(rename = "range-first")]
    range_first: Option<u32>,
    #[serde(rename = "range-last")]
    range_last: Option<u32>,
}

/// Loads a bytecode set document: a JSON object keyed by instruction name,
/// each record declaring either `opcode` or a `range-first`/`range-last`
/// pair. Entries come back in document order with capitalized names.
pub fn parse_bytecode_spec(source: &str) -> Result<Vec<Entry>, SpecError> {
    let records: IndexMap<Box<str>, RawRecord> = serde_json::from_str(source)?;
    records
        .into_iter()
        .map(|(name, record)| {
            let name = capitalize(&name);
            match record {
                RawRecord {
                    range_first: Some(first),
                    range_last: Some(last),
                    ..
                } => {
                    if first > last {
                        Err(SpecError::InvertedRange(name, first, last))
                    } else {
                        Ok(Entry::Range { name, first, last })
                    }
                }
                RawRecord {
                    range_first: None,
                    range_last: None,
                    opcode: Some(opcode),
                } => Ok(Entry::Single { name, opcode }),
                RawRecord {
                    range_first: None,
                    range_last: None,
                    opcode: None,
                } => Err(SpecError::MissingShape(name)),
                _ => Err(SpecError::HalfOpenRange(name)),
            }
        })
        .collect()
}

/// Loads a primitive table specification: one `name first [last]` line per
/// primitive, with `#` comments and blank lines skipped. Bounds may be
/// number literals or symbolic names resolved through `symbols`. A declared
/// range covering a single number is the same as declaring that number.
pub fn parse_primitive_spec(
    source: &str,
    symbols: Option<&SymbolTable>,
) -> Result<Vec<Entry>, SpecError> {
    let mut entries = vec![];
    for group in lexer::line_groups(source) {
        for (token, span) in &group {
            if let Err(source) = token {
                return Err(SpecError::Scan {
                    span: span.clone(),
                    source: source.clone(),
                });
            }
        }
        match &group[..] {
            [] => {}
            [(Ok(Token::Identifier(name)), _), first] => {
                let opcode = resolve_bound(first, symbols)?;
                entries.push(Entry::Single {
                    name: name.clone(),
                    opcode,
                });
            }
            [(Ok(Token::Identifier(name)), _), first, last] => {
                let first = resolve_bound(first, symbols)?;
                let last = resolve_bound(last, symbols)?;
                if first > last {
                    return Err(SpecError::InvertedRange(name.clone(), first, last));
                }
                entries.push(if first == last {
                    Entry::Single {
                        name: name.clone(),
                        opcode: first,
                    }
                } else {
                    Entry::Range {
                        name: name.clone(),
                        first,
                        last,
                    }
                });
            }
            _ => return Err(SpecError::MalformedLine(line_span(&group))),
        }
    }
    Ok(entries)
}

fn resolve_bound(
    (token, span): &SpannedToken,
    symbols: Option<&SymbolTable>,
) -> Result<u32, SpecError> {
    match token {
        Ok(Token::Number(value)) => Ok(*value),
        Ok(Token::Identifier(name)) => {
            symbols
                .and_then(|table| table.get(name))
                .ok_or_else(|| SpecError::UnresolvedName {
                    name: name.clone(),
                    span: span.clone(),
                })
        }
        _ => Err(SpecError::MalformedLine(span.clone())),
    }
}

fn line_span(group: &[SpannedToken]) -> Span {
    match (group.first(), group.last()) {
        (Some((_, first)), Some((_, last))) => first.start..last.end,
        _ => 0..0,
    }
}

#[cfg(test)]
mod tests {
    use super::{capitalize, parse_bytecode_spec, parse_primitive_spec, Entry, SpecError};
    use crate::symbols::SymbolTable;
    use assert2::{assert, check, let_assert};

    #[test]
    fn capitalization() {
        check!(capitalize("push").as_ref() == "Push");
        check!(capitalize("pushLiteralVariable").as_ref() == "PushLiteralVariable");
        check!(capitalize("Return").as_ref() == "Return");
        check!(capitalize("j").as_ref() == "J");
        check!(capitalize("").as_ref() == "");
    }

    #[test]
    fn bytecode_records_keep_document_order() {
        let entries = parse_bytecode_spec(
            r#"{
                "longJump": {"range-first": 160, "range-last": 167},
                "pushReceiver": {"opcode": 112}
            }"#,
        );
        let_assert!(Ok(entries) = entries);
        assert!(entries.len() == 2);
        check!(
            entries[0]
                == Entry::Range {
                    name: Box::from("LongJump"),
                    first: 160,
                    last: 167,
                }
        );
        check!(
            entries[1]
                == Entry::Single {
                    name: Box::from("PushReceiver"),
                    opcode: 112,
                }
        );
    }

    #[test]
    fn unknown_record_fields_are_tolerated() {
        let entries = parse_bytecode_spec(r#"{"push": {"opcode": 3, "stack-delta": 1}}"#);
        let_assert!(Ok(entries) = entries);
        check!(entries[0].first_opcode() == 3);
    }

    #[test]
    fn record_with_no_shape_is_fatal() {
        let err = parse_bytecode_spec(r#"{"mystery": {}}"#);
        let_assert!(Err(SpecError::MissingShape(name)) = err);
        check!(name.as_ref() == "Mystery");
    }

    #[test]
    fn record_with_half_a_range_is_fatal() {
        let err = parse_bytecode_spec(r#"{"jump": {"range-first": 144}}"#);
        let_assert!(Err(SpecError::HalfOpenRange(_)) = err);
    }

    #[test]
    fn record_with_inverted_range_is_fatal() {
        let err = parse_bytecode_spec(r#"{"jump": {"range-first": 9, "range-last": 5}}"#);
        let_assert!(Err(SpecError::InvertedRange(_, 9, 5)) = err);
    }

    #[test]
    fn range_fields_win_over_a_stray_opcode() {
        let entries = parse_bytecode_spec(
            r#"{"pushTemp": {"opcode": 16, "range-first": 16, "range-last": 31}}"#,
        );
        let_assert!(Ok(entries) = entries);
        let_assert!(Entry::Range { first: 16, last: 31, .. } = &entries[0]);
    }

    #[test]
    fn primitive_lines_parse_to_entries() {
        let entries = parse_primitive_spec("primitiveAdd 1\nprimitiveLoadTemp 40 43\n", None);
        let_assert!(Ok(entries) = entries);
        assert!(entries.len() == 2);
        check!(
            entries[0]
                == Entry::Single {
                    name: Box::from("primitiveAdd"),
                    opcode: 1,
                }
        );
        check!(
            entries[1]
                == Entry::Range {
                    name: Box::from("primitiveLoadTemp"),
                    first: 40,
                    last: 43,
                }
        );
    }

    #[test]
    fn primitive_names_are_not_capitalized() {
        let entries = parse_primitive_spec("primitiveSize 62", None);
        let_assert!(Ok(entries) = entries);
        check!(entries[0].name() == "primitiveSize");
    }

    #[test]
    fn degenerate_range_collapses_to_a_single() {
        let entries = parse_primitive_spec("primitiveQuit 113 113", None);
        let_assert!(Ok(entries) = entries);
        check!(
            entries[0]
                == Entry::Single {
                    name: Box::from("primitiveQuit"),
                    opcode: 113,
                }
        );
    }

    #[test]
    fn symbolic_bounds_resolve_through_the_table() {
        let symbols = SymbolTable::parse(
            "THAUM_VM_SYSTEM_PRIMITIVE_NUMBER_ADD = 7,",
            "THAUM_VM_SYSTEM_PRIMITIVE_NUMBER_",
        );
        let entries = parse_primitive_spec("add ADD", Some(&symbols));
        let_assert!(Ok(entries) = entries);
        check!(
            entries[0]
                == Entry::Single {
                    name: Box::from("add"),
                    opcode: 7,
                }
        );
    }

    #[test]
    fn unresolved_symbol_is_fatal() {
        let err = parse_primitive_spec("add ADD", None);
        let_assert!(Err(SpecError::UnresolvedName { name, span }) = err);
        check!(name.as_ref() == "ADD");
        check!(span == (4..7));
    }

    #[test]
    fn wrong_token_count_is_fatal() {
        let_assert!(
            Err(SpecError::MalformedLine(_)) = parse_primitive_spec("primitiveAdd", None)
        );
        let_assert!(
            Err(SpecError::MalformedLine(_)) = parse_primitive_spec("primitiveAdd 1 2 3", None)
        );
    }

    #[test]
    fn inverted_primitive_range_is_fatal() {
        let err = parse_primitive_spec("primitiveAt 61 60", None);
        let_assert!(Err(SpecError::InvertedRange(name, 61, 60)) = err);
        check!(name.as_ref() == "primitiveAt");
    }

    #[test]
    fn scan_failures_carry_their_span() {
        let err = parse_primitive_spec("primitiveAdd 1$\n", None);
        let_assert!(Err(SpecError::Scan { span, .. }) = err);
        check!(span == (14..15));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let entries = parse_primitive_spec(
            "# arithmetic\n\nprimitiveAdd 1\nprimitiveSubtract 2 # inline remark\n",
            None,
        );
        let_assert!(Ok(entries) = entries);
        assert!(entries.len() == 2);
    }

    #[test]
    fn empty_specification_is_legal() {
        let_assert!(Ok(entries) = parse_primitive_spec("", None));
        check!(entries.is_empty());
    }
}
