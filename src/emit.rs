//! Renders a [`DenseTable`] into the text fragments the interpreter build
//! includes. None of the shapes look back at the original specification.

use std::fmt::Write;

use crate::table::DenseTable;

/// Switch-dispatch shape: one `case` per bound slot, keyed off the
/// interpreter's base offset. Unbound slots emit nothing.
pub fn switch_dispatch(table: &DenseTable) -> String {
    let mut out = String::new();
    for (index, slot) in table.slots().enumerate() {
        let Some(binding) = slot else { continue };
        let name = table.name_of(binding);
        let invocation = match binding.implicit_param() {
            Some(param) => format!("BYTECODE_DISPATCH_NAME_ARGS({name}, {param})"),
            None => format!("BYTECODE_DISPATCH_NAME({name})"),
        };
        _ = writeln!(
            out,
            "case {index} + BYTECODE_TABLE_OFFSET: {invocation}; break;"
        );
    }
    out
}

/// Declarative-macro shape: exactly one line per slot, bound or not, so the
/// generated file's line count equals the table size.
pub fn macro_table(table: &DenseTable) -> String {
    let mut out = String::new();
    for (index, slot) in table.slots().enumerate() {
        match slot {
            None => _ = writeln!(out, "UNDEFINED_BYTECODE({index})"),
            Some(binding) => {
                let name = table.name_of(binding);
                match binding.implicit_param() {
                    Some(param) => {
                        _ = writeln!(out, "BYTECODE_WITH_IMPLICIT_PARAM({index}, {name}, {param})")
                    }
                    None => _ = writeln!(out, "BYTECODE({index}, {name})"),
                }
            }
        }
    }
    out
}

/// Initializer-list shape: the numbered primitive table as a complete C
/// translation unit, with a size constant and `NULL` filling the holes.
pub fn primitive_table(table: &DenseTable) -> String {
    let size = table.len();
    let mut out = format!(
        "/// Automatically generated code by thaumgen\n\
         #include \"numbered-primitives.h\"\n\
         \n\
         // The number of primitives in the numbered primitive table\n\
         const size_t thaumvm_numberedPrimitiveTableSize = {size};\n\
         \n\
         // The numbered primitive table\n\
         const thaumvm_primitive_function_t thaumvm_numberedPrimitiveTable[{size}] = {{\n"
    );
    for slot in table.slots() {
        match slot {
            Some(binding) => _ = writeln!(out, "    {},", table.name_of(binding)),
            None => out.push_str("    NULL,\n"),
        }
    }
    out.push_str("};\n");
    out
}
