//! Unit tests for the IR Graph Builder.
//!
//! Tests are organized by concern:
//! - Parse state: parameters, locals, operand stack
//! - Map updates: dead locals, value replacement, re-execute snapshots
//! - Frame states recorded on deoptimizing nodes

use super::*;
use crate::ir::types::RefType;
use pretty_assertions::assert_eq;
use tessera_core::{Instruction, TypeRef};

// =============================================================================
// Parse State
// =============================================================================

#[test]
fn test_builder_parameters_fill_locals() {
    let b = GraphBuilder::with_parameters(
        4,
        &[ValueType::Long(None), ValueType::Ref(RefType::bottom())],
    );

    let p0 = b.parameter(0).unwrap();
    let p1 = b.parameter(1).unwrap();
    assert_eq!(b.local(0), p0);
    assert!(!b.local(1).is_valid());
    assert_eq!(b.local(2), p1);
    assert_eq!(b.graph().ty(p0), ValueType::Long(None));
    assert_eq!(b.parameter(2), None);
}

#[test]
fn test_builder_starts_at_start_node() {
    let b = GraphBuilder::new(2);
    let start = b.graph().start;
    assert_eq!(b.control(), start);
    assert_eq!(b.memory(), start);
    assert!(!b.is_stopped());
    assert_eq!(b.flags(), ParseFlags::empty());
}

#[test]
fn test_set_bci_tags_new_nodes() {
    let mut b = GraphBuilder::new(0);
    b.set_bci(21);
    let c = b.graph_mut().const_int(77);
    assert_eq!(b.bci(), 21);
    assert_eq!(b.graph().node(c).bc_offset, 21);
}

// =============================================================================
// Operand Stack
// =============================================================================

#[test]
fn test_push_pop_single() {
    let mut b = GraphBuilder::new(0);
    let c = b.graph_mut().const_int(1);
    b.push(c);
    assert_eq!(b.stack_depth(), 1);
    assert_eq!(b.peek(0).unwrap(), c);
    assert_eq!(b.pop().unwrap(), c);
    assert_eq!(b.stack_depth(), 0);
}

#[test]
fn test_category2_values_take_two_slots() {
    let mut b = GraphBuilder::new(0);
    let l = b.graph_mut().const_long(9);
    let i = b.graph_mut().const_int(3);
    b.push_node(BasicType::Long, l);
    b.push_node(BasicType::Int, i);
    assert_eq!(b.stack_depth(), 3);
    assert_eq!(b.peek(2).unwrap(), l);

    assert_eq!(b.pop_node(BasicType::Int).unwrap(), i);
    assert_eq!(b.pop_node(BasicType::Long).unwrap(), l);
    assert_eq!(b.stack_depth(), 0);
}

#[test]
fn test_underflow_is_an_error() {
    let mut b = GraphBuilder::new(0);
    b.set_bci(4);
    assert_eq!(b.pop(), Err(TranslateError::StackUnderflow { bci: 4 }));
    assert_eq!(b.peek(0), Err(TranslateError::StackUnderflow { bci: 4 }));
}

// =============================================================================
// Map Updates
// =============================================================================

#[test]
fn test_replace_in_map_covers_stack_and_locals() {
    let mut b = GraphBuilder::new(2);
    let old = b.graph_mut().const_int(1);
    let new = b.graph_mut().const_int(2);
    b.set_local(1, old);
    b.push(old);
    b.push(old);
    b.replace_in_map(old, new);
    assert_eq!(b.stack(), &[new, new]);
    assert_eq!(b.local(1), new);
}

#[test]
fn test_kill_dead_locals() {
    let mut b = GraphBuilder::new(3);
    let c = b.graph_mut().const_int(1);
    for i in 0..3 {
        b.set_local(i, c);
    }
    let insn = Instruction::new_array(0, BasicType::Int).with_dead_locals(&[0, 2]);
    b.kill_dead_locals(&insn);
    assert!(!b.local(0).is_valid());
    assert_eq!(b.local(1), c);
    assert!(!b.local(2).is_valid());
}

#[test]
fn test_preserve_reexecute_restores_state() {
    let mut b = GraphBuilder::new(0);
    let a = b.graph_mut().const_int(1);
    let x = b.graph_mut().const_int(2);
    let y = b.graph_mut().const_int(3);
    b.push(a);

    let seen = b
        .preserve_reexecute(&[x, y], |b| {
            assert!(b.reexecute());
            let len = b.graph_mut().const_int(4);
            let arr = b.new_array(TypeRef::primitive(BasicType::Int).array_of(), len, 100);
            Ok(b.graph().frame_state(arr).cloned())
        })
        .unwrap()
        .unwrap();

    assert!(seen.reexecute);
    assert_eq!(seen.stack, vec![a, x, y]);
    assert!(!b.reexecute());
    assert_eq!(b.stack(), &[a]);
}

#[test]
fn test_preserve_reexecute_restores_on_error() {
    let mut b = GraphBuilder::new(0);
    let x = b.graph_mut().const_int(2);
    let result: TranslateResult<()> = b.preserve_reexecute(&[x], |b| {
        b.pop()?;
        b.pop()?;
        Ok(())
    });
    assert!(result.is_err());
    assert_eq!(b.stack_depth(), 0);
    assert!(!b.reexecute());
}

// =============================================================================
// Flags and Guards
// =============================================================================

#[test]
fn test_parse_flags_accumulate() {
    let mut b = GraphBuilder::new(0);
    b.set_flag(ParseFlags::WROTE_FIELDS);
    b.set_flag(ParseFlags::WROTE_FINAL);
    assert!(b.flags().contains(ParseFlags::WROTE_FIELDS | ParseFlags::WROTE_FINAL));
    assert!(!b.flags().contains(ParseFlags::WROTE_VOLATILE));
}

#[test]
fn test_null_check_guard_replaces_value() {
    let mut b = GraphBuilder::with_parameters(1, &[ValueType::Ref(RefType::bottom())]);
    let p = b.parameter(0).unwrap();
    b.push(p);
    let checked = b.null_check(p);

    assert_ne!(checked, p);
    assert!(b.graph().ty(checked).is_not_null());
    assert_eq!(b.stack(), &[checked]);
    assert_eq!(b.local(0), checked);
    assert_eq!(b.control(), checked);
    assert!(b.graph().frame_state(checked).is_some());
}

#[test]
fn test_null_assert_replaces_with_null_constant() {
    let mut b = GraphBuilder::with_parameters(0, &[]);
    let ld = b.graph_mut().add_node_with_type(
        Operator::Parameter(9),
        InputList::empty(),
        ValueType::Ref(RefType::bottom()),
    );
    b.push(ld);
    let null = b.null_assert(ld);
    assert!(b.graph().node(null).is_null_constant());
    assert_eq!(b.stack(), &[null]);
    assert!(!b.is_stopped());
}
