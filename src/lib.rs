pub mod emit;
pub mod lexer;
pub mod spec;
pub mod symbols;
pub mod table;

pub use spec::{parse_bytecode_spec, parse_primitive_spec, Entry, SpecError};
pub use symbols::SymbolTable;
pub use table::{Binding, DenseTable, SlotOutOfRange, TableBuilder, BYTECODE_SPACE};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Table(#[from] SlotOutOfRange),
}

impl Error {
    /// Byte range of the offending input, for positional errors.
    pub fn span(&self) -> Option<lexer::Span> {
        match self {
            Self::Spec(err) => err.span(),
            Self::Table(_) => None,
        }
    }
}

/// Compiles a bytecode set document into the switch-dispatch fragment.
/// Entries are stably sorted by first opcode before expansion.
pub fn dispatch_table(source: &str) -> Result<String, Error> {
    let mut entries = parse_bytecode_spec(source)?;
    entries.sort_by_key(Entry::first_opcode);
    let mut builder = TableBuilder::with_size(BYTECODE_SPACE);
    builder.extend(&entries)?;
    Ok(emit::switch_dispatch(&builder.finish()))
}

/// Compiles a bytecode set document into the per-slot macro table covering
/// the whole bytecode space, in document order.
pub fn bytecode_table(source: &str) -> Result<String, Error> {
    let entries = parse_bytecode_spec(source)?;
    let mut builder = TableBuilder::with_size(BYTECODE_SPACE);
    builder.extend(&entries)?;
    Ok(emit::macro_table(&builder.finish()))
}

/// Compiles a primitive specification into the numbered-primitive table,
/// sized one past the highest number any entry claims. Symbolic bounds
/// resolve through `symbols` when one is supplied.
pub fn primitive_table(source: &str, symbols: Option<&SymbolTable>) -> Result<String, Error> {
    let entries = parse_primitive_spec(source, symbols)?;
    let mut builder = TableBuilder::new();
    builder.extend(&entries)?;
    Ok(emit::primitive_table(&builder.finish()))
}
