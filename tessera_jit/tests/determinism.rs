//! Translating the same instructions from the same state twice yields
//! the same graph.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use tessera_core::{
    BasicType, ClassTable, FieldDescriptor, FieldFlags, Instruction, MethodInfo, MethodKind,
};
use tessera_jit::{Graph, TranslatorConfig};

fn build(table: &ClassTable, method: &MethodInfo) -> Graph {
    let mut t = translator(table, method, TranslatorConfig::default());
    let count = FieldDescriptor::scalar("count", HOLDER, 12, BasicType::Int)
        .with_flags(FieldFlags::VOLATILE);
    let total = FieldDescriptor::scalar("total", HOLDER, 16, BasicType::Long);

    push_receiver(&mut t);
    t.translate(&Instruction::get_field(0, count)).unwrap();
    push_int(&mut t, 3);
    t.translate(&Instruction::multi_anew_array(3, int_array(2), 2))
        .unwrap();
    t.builder_mut().pop().unwrap();

    push_receiver(&mut t);
    let v = t.builder_mut().graph_mut().const_long(10);
    t.builder_mut().push_pair(v);
    t.translate(&Instruction::put_field(7, total)).unwrap();

    push_unknown_int(&mut t, 1);
    t.translate(&Instruction::new_array(10, BasicType::Byte)).unwrap();
    t.finish().finish()
}

#[test]
fn test_identical_inputs_give_identical_graphs() {
    let table = class_table();
    let method = MethodInfo::new(HOLDER, "run", MethodKind::Instance);

    let first = build(&table, &method);
    let second = build(&table, &method);
    first.verify().unwrap();
    assert_eq!(first.len(), second.len());
    assert_eq!(format!("{:?}", first), format!("{:?}", second));
}
