//! Shared fixture for translator integration tests.

#![allow(dead_code)]

use tessera_core::{
    BasicType, ClassId, ClassInfo, ClassState, ClassTable, FieldDescriptor, MethodInfo, TypeRef,
};
use tessera_jit::ir::builder::{DeoptAction, DeoptReason};
use tessera_jit::ir::{InputList, NodeId, Operator, RefType, ValueType};
use tessera_jit::{GraphBuilder, Translator, TranslatorConfig};

/// Fully initialized ordinary class.
pub const HOLDER: ClassId = ClassId(1);
/// Loaded, static initializer not yet run.
pub const PENDING: ClassId = ClassId(2);
/// Subclass of `PENDING`.
pub const CHILD: ClassId = ClassId(3);
/// Inline class with two `int` fields.
pub const POINT: ClassId = ClassId(4);

pub fn class_table() -> ClassTable {
    let mut table = ClassTable::new();
    table.insert(ClassInfo::new(HOLDER, "Holder"));

    let mut pending = ClassInfo::new(PENDING, "Pending");
    pending.state = ClassState::Loaded;
    table.insert(pending);

    let mut child = ClassInfo::new(CHILD, "Child");
    child.super_class = Some(PENDING);
    table.insert(child);

    let mut point = ClassInfo::new(POINT, "Point");
    point.is_inline = true;
    point.inline_fields = vec![
        FieldDescriptor::scalar("x", POINT, 12, BasicType::Int),
        FieldDescriptor::scalar("y", POINT, 16, BasicType::Int),
    ];
    table.insert(point);
    table
}

/// Translator whose local 0 holds a possibly-null `HOLDER` reference.
pub fn translator<'a>(
    table: &'a ClassTable,
    method: &'a MethodInfo,
    config: TranslatorConfig,
) -> Translator<'a, ClassTable> {
    let receiver = ValueType::Ref(RefType::of_class(TypeRef::class(HOLDER)));
    let builder = GraphBuilder::with_parameters(4, &[receiver]);
    Translator::new(table, method, config, builder)
}

pub fn push_receiver(t: &mut Translator<'_, ClassTable>) -> NodeId {
    let receiver = t.builder().local(0);
    t.builder_mut().push(receiver);
    receiver
}

pub fn push_int(t: &mut Translator<'_, ClassTable>, value: i32) -> NodeId {
    let c = t.builder_mut().graph_mut().const_int(value);
    t.builder_mut().push(c);
    c
}

/// Push an `int` whose value is unknown at compile time.
pub fn push_unknown_int(t: &mut Translator<'_, ClassTable>, index: u16) -> NodeId {
    let p = t.builder_mut().graph_mut().add_node_with_type(
        Operator::Parameter(index),
        InputList::empty(),
        ValueType::INT,
    );
    t.builder_mut().push(p);
    p
}

/// Reason and action of every trap emitted so far.
pub fn traps(t: &Translator<'_, ClassTable>) -> Vec<(DeoptReason, DeoptAction)> {
    let graph = t.builder().graph();
    t.builder()
        .traps()
        .iter()
        .filter_map(|&id| match graph.node(id).op {
            Operator::Deopt(info) => Some((info.reason, info.action)),
            _ => None,
        })
        .collect()
}

/// Memory-touching operators in creation order.
pub fn memory_ops(t: &Translator<'_, ClassTable>) -> Vec<Operator> {
    t.builder()
        .graph()
        .iter()
        .map(|(_, node)| node.op)
        .filter(|op| op.touches_memory())
        .collect()
}

pub fn int_array(dimensions: u8) -> TypeRef {
    (0..dimensions).fold(TypeRef::primitive(BasicType::Int), |ty, _| ty.array_of())
}
