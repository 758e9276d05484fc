use std::collections::HashMap;

use flatbuffers::FlatBufferBuilder;

use crate::exporter::TableVector;
use crate::ir::OperatorKind;
use crate::schema::{builtin_op, vt};

/// Identity of an operator kind in the opcode table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OpCodeKey {
    Builtin(i32),
    Custom(String),
}

impl From<&OperatorKind> for OpCodeKey {
    fn from(kind: &OperatorKind) -> Self {
        match kind {
            OperatorKind::Builtin { code, .. } => OpCodeKey::Builtin(*code),
            OperatorKind::Custom { name, .. } => OpCodeKey::Custom(name.clone()),
        }
    }
}

/// Deduplicated opcode table, ordered by first use.
#[derive(Debug, Default)]
pub struct OpCodeTable {
    entries: Vec<OpCodeKey>,
    lookup: HashMap<OpCodeKey, u32>,
}

impl OpCodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the table index for `key`, appending it on first sight.
    pub fn resolve(&mut self, key: OpCodeKey) -> u32 {
        if let Some(&index) = self.lookup.get(&key) {
            return index;
        }
        let index = self.entries.len() as u32;
        self.entries.push(key.clone());
        self.lookup.insert(key, index);
        index
    }

    pub fn entries(&self) -> &[OpCodeKey] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes the table. Custom kinds are written as CUSTOM plus their name.
    pub fn write<'fbb>(&self, fbb: &mut FlatBufferBuilder<'fbb>) -> TableVector<'fbb> {
        let mut codes = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let (code, custom_code) = match entry {
                OpCodeKey::Builtin(code) => (*code, None),
                OpCodeKey::Custom(name) => (builtin_op::CUSTOM, Some(fbb.create_string(name))),
            };
            let deprecated_code = code.min(builtin_op::PLACEHOLDER_FOR_GREATER_OP_CODES) as i8;

            let start = fbb.start_table();
            fbb.push_slot::<i8>(vt::operator_code::DEPRECATED_BUILTIN_CODE, deprecated_code, 0);
            if let Some(custom_code) = custom_code {
                fbb.push_slot_always(vt::operator_code::CUSTOM_CODE, custom_code);
            }
            fbb.push_slot::<i32>(vt::operator_code::VERSION, 1, 1);
            fbb.push_slot::<i32>(vt::operator_code::BUILTIN_CODE, code, 0);
            codes.push(fbb.end_table(start));
        }
        fbb.create_vector(&codes)
    }
}
