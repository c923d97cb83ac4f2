//! Resolved bytecode instructions.
//!
//! The surrounding parser walks a method's bytecode and hands the
//! translator one instruction at a time through `BytecodeCursor`. The
//! `Instruction` record is a self-contained cursor for drivers that
//! already hold the decoded metadata.

use crate::basic_type::BasicType;
use crate::metadata::{FieldDescriptor, TypeRef};

/// The bytecodes lowered by the field-access and array-allocation translators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bytecode {
    GetField,
    PutField,
    GetStatic,
    PutStatic,
    /// Primitive-element array (`newarray`).
    NewArray,
    /// Reference-element array (`anewarray`).
    ANewArray,
    MultiANewArray,
}

impl Bytecode {
    /// Encoded instruction length in bytes.
    pub const fn length(self) -> u32 {
        match self {
            Bytecode::NewArray => 2,
            Bytecode::MultiANewArray => 4,
            _ => 3,
        }
    }

    pub const fn is_field_access(self) -> bool {
        matches!(
            self,
            Bytecode::GetField | Bytecode::PutField | Bytecode::GetStatic | Bytecode::PutStatic
        )
    }

    /// Reads (`getfield`/`getstatic`) as opposed to writes.
    pub const fn is_get(self) -> bool {
        matches!(self, Bytecode::GetField | Bytecode::GetStatic)
    }

    /// Instance-field form as opposed to static.
    pub const fn is_instance_field(self) -> bool {
        matches!(self, Bytecode::GetField | Bytecode::PutField)
    }
}

/// Read-only view of the instruction currently being translated.
pub trait BytecodeCursor {
    fn bytecode(&self) -> Bytecode;

    /// Bytecode index of the current instruction.
    fn cur_bci(&self) -> u32;

    /// Bytecode index of the following instruction.
    fn next_bci(&self) -> u32;

    /// Whether a prior analysis proved the instruction's symbolic
    /// reference resolvable. Trusted without re-validation.
    fn will_link(&self) -> bool;

    /// Resolved field of a field-access instruction.
    fn field(&self) -> Option<&FieldDescriptor>;

    /// Class operand: the element type for `anewarray`, the full array
    /// type for `multianewarray`.
    fn klass(&self) -> Option<TypeRef>;

    /// Element type of a `newarray`.
    fn element_type(&self) -> Option<BasicType>;

    /// Dimension count of a `multianewarray`.
    fn dimensions(&self) -> u8;

    /// Liveness of a local slot after this instruction.
    fn is_local_live(&self, _index: usize) -> bool {
        true
    }
}

/// A decoded instruction with all metadata attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub bytecode: Bytecode,
    pub bci: u32,
    pub will_link: bool,
    pub field: Option<FieldDescriptor>,
    pub klass: Option<TypeRef>,
    pub element_type: Option<BasicType>,
    pub dimensions: u8,
    /// Local slots that are dead after this instruction.
    pub dead_locals: Vec<usize>,
}

impl Instruction {
    fn bare(bytecode: Bytecode, bci: u32) -> Self {
        Instruction {
            bytecode,
            bci,
            will_link: true,
            field: None,
            klass: None,
            element_type: None,
            dimensions: 0,
            dead_locals: Vec::new(),
        }
    }

    /// A field access; the bytecode is chosen from the two flags.
    pub fn field_access(bci: u32, field: FieldDescriptor, is_get: bool, is_field: bool) -> Self {
        let bytecode = match (is_get, is_field) {
            (true, true) => Bytecode::GetField,
            (false, true) => Bytecode::PutField,
            (true, false) => Bytecode::GetStatic,
            (false, false) => Bytecode::PutStatic,
        };
        Instruction {
            field: Some(field),
            ..Self::bare(bytecode, bci)
        }
    }

    pub fn get_field(bci: u32, field: FieldDescriptor) -> Self {
        Self::field_access(bci, field, true, true)
    }

    pub fn put_field(bci: u32, field: FieldDescriptor) -> Self {
        Self::field_access(bci, field, false, true)
    }

    pub fn get_static(bci: u32, field: FieldDescriptor) -> Self {
        Self::field_access(bci, field, true, false)
    }

    pub fn put_static(bci: u32, field: FieldDescriptor) -> Self {
        Self::field_access(bci, field, false, false)
    }

    pub fn new_array(bci: u32, element: BasicType) -> Self {
        Instruction {
            element_type: Some(element),
            ..Self::bare(Bytecode::NewArray, bci)
        }
    }

    pub fn anew_array(bci: u32, element: TypeRef) -> Self {
        Instruction {
            klass: Some(element),
            ..Self::bare(Bytecode::ANewArray, bci)
        }
    }

    pub fn multi_anew_array(bci: u32, array_type: TypeRef, dimensions: u8) -> Self {
        Instruction {
            klass: Some(array_type),
            dimensions,
            ..Self::bare(Bytecode::MultiANewArray, bci)
        }
    }

    /// Mark local slots dead after this instruction.
    pub fn with_dead_locals(mut self, locals: &[usize]) -> Self {
        self.dead_locals.extend_from_slice(locals);
        self
    }

    /// Override the resolution flag.
    pub fn with_will_link(mut self, will_link: bool) -> Self {
        self.will_link = will_link;
        self
    }
}

impl BytecodeCursor for Instruction {
    fn bytecode(&self) -> Bytecode {
        self.bytecode
    }

    fn cur_bci(&self) -> u32 {
        self.bci
    }

    fn next_bci(&self) -> u32 {
        self.bci + self.bytecode.length()
    }

    fn will_link(&self) -> bool {
        self.will_link
    }

    fn field(&self) -> Option<&FieldDescriptor> {
        self.field.as_ref()
    }

    fn klass(&self) -> Option<TypeRef> {
        self.klass
    }

    fn element_type(&self) -> Option<BasicType> {
        self.element_type
    }

    fn dimensions(&self) -> u8 {
        self.dimensions
    }

    fn is_local_live(&self, index: usize) -> bool {
        !self.dead_locals.contains(&index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ClassId;

    #[test]
    fn test_field_access_bytecode_selection() {
        let f = FieldDescriptor::scalar("x", ClassId(1), 12, BasicType::Int);
        assert_eq!(
            Instruction::get_field(0, f.clone()).bytecode,
            Bytecode::GetField
        );
        assert_eq!(
            Instruction::put_static(0, f).bytecode,
            Bytecode::PutStatic
        );
    }

    #[test]
    fn test_next_bci_uses_instruction_length() {
        let insn = Instruction::multi_anew_array(10, TypeRef::primitive(BasicType::Int), 2);
        assert_eq!(insn.next_bci(), 14);
        let insn = Instruction::new_array(3, BasicType::Byte);
        assert_eq!(insn.next_bci(), 5);
    }

    #[test]
    fn test_dead_locals() {
        let insn = Instruction::new_array(0, BasicType::Int).with_dead_locals(&[2]);
        assert!(insn.is_local_live(0));
        assert!(!insn.is_local_live(2));
    }
}
