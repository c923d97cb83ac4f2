//! Field access translation through the public entry point.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use tessera_core::{
    BasicType, ConstantValue, FieldDescriptor, FieldFlags, Instruction, MethodInfo, MethodKind,
    TypeRef,
};
use tessera_jit::ir::builder::{DeoptAction, DeoptReason};
use tessera_jit::ir::{BarrierKind, MemAccess, MemOrder, Operator};
use tessera_jit::{Status, TranslatorConfig};

fn instance_method() -> MethodInfo {
    MethodInfo::new(HOLDER, "run", MethodKind::Instance)
}

fn non_mca() -> TranslatorConfig {
    TranslatorConfig {
        not_multiple_copy_atomic: true,
        ..TranslatorConfig::default()
    }
}

// =============================================================================
// Memory Ordering
// =============================================================================

#[test]
fn test_volatile_read_is_acquire_then_fenced() {
    let table = class_table();
    let method = instance_method();
    for config in [TranslatorConfig::default(), non_mca()] {
        let mut t = translator(&table, &method, config);
        push_receiver(&mut t);
        let f = FieldDescriptor::scalar("v", HOLDER, 12, BasicType::Long)
            .with_flags(FieldFlags::VOLATILE);
        assert_eq!(t.translate(&Instruction::get_field(0, f)).unwrap(), Status::Continue);

        let ops = memory_ops(&t);
        let load = ops.iter().position(|op| op.is_load()).unwrap();
        assert_eq!(
            ops[load],
            Operator::Load(MemAccess::new(BasicType::Long, MemOrder::Acquire, true))
        );
        assert_eq!(ops[load + 1], Operator::MemBar(BarrierKind::Acquire));
        assert_eq!(load == 1, config.not_multiple_copy_atomic);
    }
}

#[test]
fn test_volatile_write_is_release_after_fence() {
    let table = class_table();
    let method = instance_method();
    for config in [TranslatorConfig::default(), non_mca()] {
        let mut t = translator(&table, &method, config);
        push_receiver(&mut t);
        push_int(&mut t, 1);
        let f = FieldDescriptor::scalar("v", HOLDER, 12, BasicType::Int)
            .with_flags(FieldFlags::VOLATILE);
        assert_eq!(t.translate(&Instruction::put_field(0, f)).unwrap(), Status::Continue);

        let ops = memory_ops(&t);
        assert_eq!(ops[0], Operator::MemBar(BarrierKind::Release));
        assert_eq!(
            ops[1],
            Operator::Store(MemAccess::new(BasicType::Int, MemOrder::Release, true))
        );
        let trailing = ops.get(2).copied();
        if config.not_multiple_copy_atomic {
            assert_eq!(trailing, None);
        } else {
            assert_eq!(trailing, Some(Operator::MemBar(BarrierKind::Full)));
        }
    }
}

#[test]
fn test_plain_reference_write_is_released_without_fences() {
    let table = class_table();
    let method = instance_method();
    let mut t = translator(&table, &method, TranslatorConfig::default());
    push_receiver(&mut t);
    let null = t.builder_mut().graph_mut().const_null();
    t.builder_mut().push(null);

    let f = FieldDescriptor::new("next", HOLDER, 16, BasicType::Object, TypeRef::class(HOLDER));
    t.translate(&Instruction::put_field(0, f)).unwrap();
    assert_eq!(
        memory_ops(&t),
        vec![Operator::Store(MemAccess::new(
            BasicType::Object,
            MemOrder::Release,
            false
        ))]
    );
}

// =============================================================================
// Constant Folding
// =============================================================================

#[test]
fn test_constant_final_field_emits_no_load() {
    let mut table = class_table();
    let f = FieldDescriptor::scalar("LIMIT", HOLDER, 20, BasicType::Int)
        .with_flags(FieldFlags::STATIC | FieldFlags::FINAL);
    table.set_static_value(&f, ConstantValue::Int(64));
    let method = instance_method();
    let mut t = translator(&table, &method, TranslatorConfig::default());

    assert_eq!(t.translate(&Instruction::get_static(0, f)).unwrap(), Status::Continue);
    let top = t.builder().peek(0).unwrap();
    assert_eq!(t.builder().graph().find_int_con(top), Some(64));
    assert_eq!(t.builder().graph().count(|op| op.is_load()), 0);
}

#[test]
fn test_constant_final_double_takes_two_slots() {
    let mut table = class_table();
    let f = FieldDescriptor::scalar("SCALE", HOLDER, 24, BasicType::Double)
        .with_flags(FieldFlags::STATIC | FieldFlags::FINAL);
    table.set_static_value(&f, ConstantValue::double(0.5));
    let method = instance_method();
    let mut t = translator(&table, &method, TranslatorConfig::default());

    t.translate(&Instruction::get_static(0, f)).unwrap();
    assert_eq!(t.builder().stack_depth(), 2);
    assert_eq!(t.builder().graph().count(|op| op.is_load()), 0);
}

// =============================================================================
// Guards
// =============================================================================

#[test]
fn test_static_access_before_initialization_traps() {
    let table = class_table();
    let f = FieldDescriptor::scalar("count", PENDING, 12, BasicType::Int)
        .with_flags(FieldFlags::STATIC);

    let method = MethodInfo::new(HOLDER, "run", MethodKind::Static);
    let mut t = translator(&table, &method, TranslatorConfig::default());
    assert_eq!(t.translate(&Instruction::get_static(0, f.clone())).unwrap(), Status::Stopped);
    assert_eq!(traps(&t), vec![(DeoptReason::Uninitialized, DeoptAction::Reinterpret)]);
    assert_eq!(t.builder().graph().count(|op| op.is_load()), 0);

    let method = MethodInfo::new(PENDING, "<clinit>", MethodKind::StaticInitializer);
    let mut t = translator(&table, &method, TranslatorConfig::default());
    push_int(&mut t, 1);
    assert_eq!(t.translate(&Instruction::put_static(0, f)).unwrap(), Status::Continue);
    assert!(traps(&t).is_empty());
}

#[test]
fn test_subclass_constructor_may_touch_pending_statics() {
    let table = class_table();
    let f = FieldDescriptor::scalar("count", PENDING, 12, BasicType::Int)
        .with_flags(FieldFlags::STATIC);

    let ctor = MethodInfo::new(CHILD, "<init>", MethodKind::Constructor);
    let mut t = translator(&table, &ctor, TranslatorConfig::default());
    assert_eq!(t.translate(&Instruction::get_static(0, f.clone())).unwrap(), Status::Continue);

    let other = MethodInfo::new(CHILD, "run", MethodKind::Instance);
    let mut t = translator(&table, &other, TranslatorConfig::default());
    assert_eq!(t.translate(&Instruction::get_static(0, f)).unwrap(), Status::Stopped);
}

#[test]
fn test_call_site_target_write_always_traps() {
    let table = class_table();
    let method = instance_method();
    for extra in [FieldFlags::empty(), FieldFlags::VOLATILE, FieldFlags::FINAL] {
        let mut t = translator(&table, &method, TranslatorConfig::default());
        push_receiver(&mut t);
        let null = t.builder_mut().graph_mut().const_null();
        t.builder_mut().push(null);

        let f = FieldDescriptor::new("target", HOLDER, 16, BasicType::Object, TypeRef::class(HOLDER))
            .with_flags(FieldFlags::CALL_SITE_TARGET | extra);
        assert_eq!(t.translate(&Instruction::put_field(0, f)).unwrap(), Status::Stopped);
        assert_eq!(traps(&t), vec![(DeoptReason::Unhandled, DeoptAction::Reinterpret)]);
        assert!(memory_ops(&t).is_empty());
    }
}

#[test]
fn test_null_into_flattenable_field_traps_without_store() {
    let table = class_table();
    let method = instance_method();
    let mut t = translator(&table, &method, TranslatorConfig::default());
    push_receiver(&mut t);
    let null = t.builder_mut().graph_mut().const_null();
    t.builder_mut().push(null);

    let f = FieldDescriptor::new("origin", HOLDER, 20, BasicType::InlineType, TypeRef::class(POINT))
        .with_flags(FieldFlags::FLATTENABLE);
    assert_eq!(t.translate(&Instruction::put_field(0, f)).unwrap(), Status::Stopped);
    assert_eq!(
        traps(&t),
        vec![(DeoptReason::InvalidAggregateNull, DeoptAction::None)]
    );
    assert_eq!(t.builder().graph().count(|op| op.is_store()), 0);

    // The interpreter finds the receiver and the null value again.
    let stack = t.builder().stack();
    assert_eq!(stack.len(), 2);
    assert!(t.builder().graph().node(stack[1]).is_null_constant());
}

#[test]
fn test_null_receiver_traps() {
    let table = class_table();
    let method = instance_method();
    let mut t = translator(&table, &method, TranslatorConfig::default());
    let null = t.builder_mut().graph_mut().const_null();
    t.builder_mut().push(null);

    let f = FieldDescriptor::scalar("count", HOLDER, 12, BasicType::Int);
    assert_eq!(t.translate(&Instruction::get_field(0, f)).unwrap(), Status::Stopped);
    assert_eq!(traps(&t), vec![(DeoptReason::NullCheck, DeoptAction::Reinterpret)]);
}

#[test]
fn test_checked_receiver_is_reused() {
    let table = class_table();
    let method = instance_method();
    let mut t = translator(&table, &method, TranslatorConfig::default());
    let f = FieldDescriptor::scalar("count", HOLDER, 12, BasicType::Int);

    push_receiver(&mut t);
    t.translate(&Instruction::get_field(0, f.clone())).unwrap();
    push_receiver(&mut t);
    t.translate(&Instruction::get_field(3, f)).unwrap();

    let guards = t
        .builder()
        .graph()
        .count(|op| matches!(op, Operator::Guard(_)));
    assert_eq!(guards, 1);
}
