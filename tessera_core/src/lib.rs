//! Runtime metadata for the tessera JIT front end.
//!
//! The translator never inspects class files or heap objects directly.
//! Everything it needs about the program being compiled arrives through
//! the types in this crate:
//!
//! - **Basic types** (`basic_type.rs`): layout types and operand-stack widths
//! - **Metadata** (`metadata.rs`): classes, fields, methods, constants and
//!   the `MetadataProvider` trait
//! - **Bytecode** (`bytecode.rs`): the `BytecodeCursor` trait describing one
//!   resolved instruction at a time
//! - **Class table** (`class_table.rs`): an in-memory provider for drivers
//!   and tests

pub mod basic_type;
pub mod bytecode;
pub mod class_table;
pub mod metadata;

pub use basic_type::BasicType;
pub use bytecode::{Bytecode, BytecodeCursor, Instruction};
pub use class_table::ClassTable;
pub use metadata::{
    BaseType, ClassId, ClassInfo, ClassState, ConstantValue, FieldDescriptor, FieldFlags,
    MetadataProvider, MethodInfo, MethodKind, ObjectId, TypeRef,
};
