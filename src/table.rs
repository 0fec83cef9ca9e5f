use lasso::{Rodeo, Spur};
use tracing::{debug, warn};

use crate::spec::Entry;

/// Number of opcodes in a bytecode set. Bytecode tables always cover the
/// whole space, declared or not.
pub const BYTECODE_SPACE: usize = 256;

/// A bound slot: the handler owning the slot, plus the implicit parameter
/// the handler receives when the slot came from a declared range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    name: Spur,
    implicit_param: Option<u32>,
}

impl Binding {
    pub fn implicit_param(&self) -> Option<u32> {
        self.implicit_param
    }
}

/// The fully expanded dispatch table: one slot per opcode or primitive
/// number, each either unbound or naming its handler.
#[derive(Debug)]
pub struct DenseTable {
    slots: Vec<Option<Binding>>,
    names: Rodeo,
}

impl DenseTable {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn binding(&self, index: usize) -> Option<Binding> {
        self.slots.get(index).copied().flatten()
    }

    /// Every slot in index order.
    pub fn slots(&self) -> impl Iterator<Item = Option<Binding>> + '_ {
        self.slots.iter().copied()
    }

    pub fn name_of(&self, binding: Binding) -> &str {
        self.names.resolve(&binding.name)
    }
}

/// Expands entries into a [`DenseTable`].
///
/// [`TableBuilder::new`] grows the table to fit the highest bound number,
/// while [`TableBuilder::with_size`] pins the size up front and rejects
/// entries falling outside it. When two entries claim the same slot the
/// later one wins and the earlier binding is dropped with a warning.
#[derive(Debug, Default)]
pub struct TableBuilder {
    slots: Vec<Option<Binding>>,
    names: Rodeo,
    fixed: bool,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(size: usize) -> Self {
        Self {
            slots: vec![None; size],
            fixed: true,
            ..Self::default()
        }
    }

    pub fn insert(&mut self, entry: &Entry) -> Result<(), SlotOutOfRange> {
        match entry {
            Entry::Single { name, opcode } => self.bind(name, *opcode, None),
            Entry::Range { name, first, last } => {
                for number in *first..=*last {
                    self.bind(name, number, Some(number - first))?;
                }
                Ok(())
            }
        }
    }

    pub fn extend<'a>(
        &mut self,
        entries: impl IntoIterator<Item = &'a Entry>,
    ) -> Result<(), SlotOutOfRange> {
        for entry in entries {
            self.insert(entry)?;
        }
        Ok(())
    }

    pub fn finish(self) -> DenseTable {
        debug!(
            slots = self.slots.len(),
            bound = self.slots.iter().flatten().count(),
            "dense table complete"
        );
        DenseTable {
            slots: self.slots,
            names: self.names,
        }
    }

    fn bind(
        &mut self,
        name: &str,
        number: u32,
        implicit_param: Option<u32>,
    ) -> Result<(), SlotOutOfRange> {
        let slot = number as usize;
        if slot >= self.slots.len() {
            if self.fixed {
                return Err(SlotOutOfRange {
                    name: Box::from(name),
                    number,
                    size: self.slots.len(),
                });
            }
            self.slots.resize(slot + 1, None);
        }
        let binding = Binding {
            name: self.names.get_or_intern(name),
            implicit_param,
        };
        if let Some(previous) = self.slots[slot].replace(binding) {
            warn!(
                slot,
                old = self.names.resolve(&previous.name),
                new = name,
                "slot bound twice, keeping the later entry"
            );
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("{name:?} claims number {number}, outside the fixed {size}-slot table")]
pub struct SlotOutOfRange {
    pub name: Box<str>,
    pub number: u32,
    pub size: usize,
}
