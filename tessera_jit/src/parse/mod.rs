//! Bytecode translation for field accesses and array allocation.
//!
//! A [`Translator`] lowers one instruction at a time into the graph held
//! by its [`GraphBuilder`], reading and updating the builder's operand
//! stack, control and memory in place. Each entry point reports whether
//! the path continues or has left compiled code through a trap.
//!
//! # Modules
//!
//! - **ordering**: Fences and access ordering of field reads and writes
//! - **refine**: Result types of loads and allocations
//! - **field**: `getfield` / `putfield` / `getstatic` / `putstatic`
//! - **array**: `newarray` / `anewarray` / `multianewarray`

use crate::config::TranslatorConfig;
use crate::error::TranslateResult;
use crate::ir::builder::{GraphBuilder, Status};
use tessera_core::{Bytecode, BytecodeCursor, MetadataProvider, MethodInfo};

pub mod array;
pub mod field;
pub mod ordering;
pub mod refine;

/// Translator for one method.
///
/// Owns the graph builder of the method; borrows the metadata provider
/// and the method being compiled.
pub struct Translator<'a, P: MetadataProvider + ?Sized> {
    /// Class, field and constant lookups.
    provider: &'a P,

    /// The method being compiled.
    method: &'a MethodInfo,

    config: TranslatorConfig,

    builder: GraphBuilder,
}

impl<'a, P: MetadataProvider + ?Sized> Translator<'a, P> {
    pub fn new(
        provider: &'a P,
        method: &'a MethodInfo,
        config: TranslatorConfig,
        builder: GraphBuilder,
    ) -> Self {
        Translator {
            provider,
            method,
            config,
            builder,
        }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn method(&self) -> &MethodInfo {
        self.method
    }

    pub fn builder(&self) -> &GraphBuilder {
        &self.builder
    }

    /// Mutable access to the parse state, for drivers that push operands.
    pub fn builder_mut(&mut self) -> &mut GraphBuilder {
        &mut self.builder
    }

    /// Consume the translator, returning the builder.
    pub fn finish(self) -> GraphBuilder {
        self.builder
    }

    /// Translate the instruction under `cursor`.
    pub fn translate(&mut self, cursor: &dyn BytecodeCursor) -> TranslateResult<Status> {
        if self.builder.is_stopped() {
            return Ok(Status::Stopped);
        }
        self.builder.set_bci(cursor.cur_bci());

        match cursor.bytecode() {
            Bytecode::GetField => self.translate_field_access(cursor, true, true),
            Bytecode::PutField => self.translate_field_access(cursor, false, true),
            Bytecode::GetStatic => self.translate_field_access(cursor, true, false),
            Bytecode::PutStatic => self.translate_field_access(cursor, false, false),
            Bytecode::NewArray => self.translate_new_primitive_array(cursor),
            Bytecode::ANewArray => self.translate_new_array(cursor),
            Bytecode::MultiANewArray => self.translate_multi_new_array(cursor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::operators::Operator;
    use tessera_core::{
        BasicType, ClassId, ClassInfo, ClassTable, FieldDescriptor, FieldFlags, Instruction,
        MethodKind,
    };

    #[test]
    fn test_dispatch_sets_bci() {
        let table = ClassTable::new();
        let method = MethodInfo::new(ClassId(1), "m", MethodKind::Static);
        let mut t = Translator::new(&table, &method, TranslatorConfig::default(), GraphBuilder::new(0));
        let len = t.builder_mut().graph_mut().const_int(3);
        t.builder_mut().push(len);

        let status = t.translate(&Instruction::new_array(14, BasicType::Byte)).unwrap();
        assert_eq!(status, Status::Continue);
        assert_eq!(t.builder().bci(), 14);

        let arr = t.builder().peek(0).unwrap();
        assert_eq!(t.builder().graph().node(arr).op, Operator::AllocateArray);
        assert_eq!(t.builder().graph().node(arr).bc_offset, 14);
    }

    #[test]
    fn test_stopped_path_emits_nothing() {
        let mut table = ClassTable::new();
        table.insert(ClassInfo::new(ClassId(1), "A"));
        let method = MethodInfo::new(ClassId(1), "m", MethodKind::Static);
        let mut t = Translator::new(&table, &method, TranslatorConfig::default(), GraphBuilder::new(0));

        // An instance access to a static field traps.
        let field = FieldDescriptor::scalar("s", ClassId(1), 12, BasicType::Int)
            .with_flags(FieldFlags::STATIC);
        let obj = t.builder_mut().graph_mut().const_null();
        t.builder_mut().push(obj);
        let status = t.translate(&Instruction::get_field(0, field.clone())).unwrap();
        assert_eq!(status, Status::Stopped);

        let before = t.builder().graph().len();
        let status = t.translate(&Instruction::get_static(3, field)).unwrap();
        assert_eq!(status, Status::Stopped);
        assert_eq!(t.builder().graph().len(), before);
        assert_eq!(t.builder().bci(), 0);
    }
}
