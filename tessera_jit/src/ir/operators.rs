//! IR operator definitions for the Sea-of-Nodes IR.
//!
//! Operators are organized by category:
//! - **Constants**: Literal scalars, null, known objects and class constants
//! - **Addressing**: Field and array-element address arithmetic
//! - **Memory**: Ordered loads and stores, memory barriers
//! - **Allocation**: Instance and array allocation, runtime helper calls
//! - **Guards**: Null checks, null assertions, deoptimization traps
//! - **Aggregates**: Composition of in-hand inline values
//!
//! Pure operators are hash-consed by the graph; everything that reads or
//! writes memory, or may leave compiled code, is not.

use super::builder::guards::{DeoptAction, DeoptReason};
use super::types::{IntRange, RefType, ValueType};
use std::fmt;
use tessera_core::{BasicType, ClassId, ObjectId, TypeRef};

// =============================================================================
// Memory Ordering
// =============================================================================

/// Ordering constraint of a single load or store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MemOrder {
    /// Plain access; may be reordered freely.
    Unordered = 0,
    /// No later access may move above this load.
    Acquire = 1,
    /// No earlier access may move below this store.
    Release = 2,
}

/// Kind of a standalone memory barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BarrierKind {
    /// LoadLoad | LoadStore after a volatile read.
    Acquire = 0,
    /// LoadStore | StoreStore before a volatile write.
    Release = 1,
    /// Full fence including StoreLoad.
    Full = 2,
}

impl BarrierKind {
    pub const fn name(self) -> &'static str {
        match self {
            BarrierKind::Acquire => "acquire",
            BarrierKind::Release => "release",
            BarrierKind::Full => "full",
        }
    }
}

/// Shape of a load or store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemAccess {
    /// Layout type of the accessed slot.
    pub bt: BasicType,
    pub order: MemOrder,
    /// Must not be split into narrower accesses (64-bit values on 32-bit targets).
    pub atomic: bool,
}

impl MemAccess {
    pub const fn new(bt: BasicType, order: MemOrder, atomic: bool) -> Self {
        MemAccess { bt, order, atomic }
    }

    pub const fn unordered(bt: BasicType) -> Self {
        MemAccess::new(bt, MemOrder::Unordered, false)
    }
}

// =============================================================================
// Control, Guards, Projections
// =============================================================================

/// Control flow operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ControlOp {
    /// Entry point; also the initial memory state.
    Start = 0,
}

/// Guard kind for runtime checks that deoptimize on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GuardKind {
    /// Deoptimize if the value is null.
    NotNull = 0,
    /// Deoptimize if the value is not null.
    Null = 1,
}

/// Output selected by a projection from a multi-output node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProjKind {
    /// The returned value.
    Result = 0,
    /// Exceptional control edge.
    Exception = 1,
}

/// Payload of a deoptimization trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrapInfo {
    pub reason: DeoptReason,
    pub action: DeoptAction,
    /// Class the interpreter should load or initialize, if any.
    pub klass: Option<TypeRef>,
}

// =============================================================================
// Runtime Helpers
// =============================================================================

/// Shared runtime routines callable from compiled code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RuntimeHelper {
    /// Allocate a 2-dimensional array from two lengths.
    MultiNewArray2 = 2,
    MultiNewArray3 = 3,
    MultiNewArray4 = 4,
    MultiNewArray5 = 5,
    /// Allocate an array of any rank from an `int[]` of lengths.
    MultiNewArrayN = 255,
}

impl RuntimeHelper {
    /// Highest rank served by a fixed-arity helper.
    pub const MAX_FIXED_DIMENSIONS: usize = 5;

    /// Helper for an array of the given rank (at least 2).
    pub const fn for_dimensions(dimensions: usize) -> Option<Self> {
        match dimensions {
            0 | 1 => None,
            2 => Some(RuntimeHelper::MultiNewArray2),
            3 => Some(RuntimeHelper::MultiNewArray3),
            4 => Some(RuntimeHelper::MultiNewArray4),
            5 => Some(RuntimeHelper::MultiNewArray5),
            _ => Some(RuntimeHelper::MultiNewArrayN),
        }
    }

    pub const fn is_variadic(self) -> bool {
        matches!(self, RuntimeHelper::MultiNewArrayN)
    }

    pub const fn name(self) -> &'static str {
        match self {
            RuntimeHelper::MultiNewArray2 => "multianewarray2",
            RuntimeHelper::MultiNewArray3 => "multianewarray3",
            RuntimeHelper::MultiNewArray4 => "multianewarray4",
            RuntimeHelper::MultiNewArray5 => "multianewarray5",
            RuntimeHelper::MultiNewArrayN => "multianewarrayN",
        }
    }
}

// =============================================================================
// Operator (Unified)
// =============================================================================

/// Unified operator representation.
///
/// Input conventions:
/// - `Load`: `[control, memory, address]`
/// - `Store`: `[control, memory, address, value]`
/// - `MemBar`: `[control, memory]` plus an optional precedent value
/// - `Allocate` / `AllocateArray`: `[control, memory, klass]` / `[control, memory, klass, length]`
/// - `CallRuntime`: `[control, memory, klass, args...]`
/// - `Guard`, `CheckCast`: `[control, value]`
/// - `Deopt`: `[control, memory]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Constants
    ConstInt(i32),
    ConstLong(i64),
    /// Stored as bits for Hash/Eq.
    ConstFloat(u32),
    ConstDouble(u64),
    ConstNull,
    ConstObject(ObjectId),
    /// Class metadata pointer (allocation operand).
    ConstKlass(TypeRef),
    /// Class mirror object holding the static fields of a class.
    ConstMirror(ClassId),
    /// Method parameter.
    Parameter(u16),

    // Addressing
    /// `base + offset`.
    Address(i64),
    /// Address of element `index` of an array of `BasicType` elements.
    ElementAddress(BasicType),

    // Memory
    Load(MemAccess),
    /// Produces the new memory state.
    Store(MemAccess),
    MemBar(BarrierKind),

    // Allocation
    Allocate,
    AllocateArray,
    CallRuntime(RuntimeHelper),

    // Control
    Control(ControlOp),
    Projection(ProjKind),
    Guard(GuardKind),
    Deopt(TrapInfo),

    // Value transforms
    /// Narrow a value's type under the current control.
    CheckCast,
    /// Round a double to storage precision.
    RoundDouble,
    /// In-hand inline aggregate built from its field values.
    InlineAggregate(ClassId),
}

impl Operator {
    /// Check if this operator is pure (no side effects) and can be hash-consed.
    pub const fn is_pure(&self) -> bool {
        matches!(
            self,
            Operator::ConstInt(_)
                | Operator::ConstLong(_)
                | Operator::ConstFloat(_)
                | Operator::ConstDouble(_)
                | Operator::ConstNull
                | Operator::ConstObject(_)
                | Operator::ConstKlass(_)
                | Operator::ConstMirror(_)
                | Operator::Parameter(_)
                | Operator::Address(_)
                | Operator::ElementAddress(_)
                | Operator::Projection(_)
                | Operator::CheckCast
                | Operator::RoundDouble
                | Operator::InlineAggregate(_)
        )
    }

    pub const fn is_constant(&self) -> bool {
        matches!(
            self,
            Operator::ConstInt(_)
                | Operator::ConstLong(_)
                | Operator::ConstFloat(_)
                | Operator::ConstDouble(_)
                | Operator::ConstNull
                | Operator::ConstObject(_)
                | Operator::ConstKlass(_)
                | Operator::ConstMirror(_)
        )
    }

    pub const fn is_allocation(&self) -> bool {
        matches!(self, Operator::Allocate | Operator::AllocateArray)
    }

    pub const fn is_load(&self) -> bool {
        matches!(self, Operator::Load(_))
    }

    pub const fn is_store(&self) -> bool {
        matches!(self, Operator::Store(_))
    }

    /// Nodes that read or write the memory state.
    pub const fn touches_memory(&self) -> bool {
        matches!(
            self,
            Operator::Load(_)
                | Operator::Store(_)
                | Operator::MemBar(_)
                | Operator::Allocate
                | Operator::AllocateArray
                | Operator::CallRuntime(_)
        )
    }

    /// Default result type given the input types.
    ///
    /// Nodes whose type depends on metadata (loads, allocations, casts,
    /// guards) are created with an explicit type instead.
    pub fn result_type(&self, inputs: &[ValueType]) -> ValueType {
        match *self {
            Operator::ConstInt(v) => ValueType::Int(IntRange::constant(v)),
            Operator::ConstLong(v) => ValueType::Long(Some(v)),
            Operator::ConstFloat(bits) => ValueType::Float(Some(bits)),
            Operator::ConstDouble(bits) => ValueType::Double(Some(bits)),
            Operator::ConstNull => ValueType::Ref(RefType::null()),
            Operator::ConstObject(_) => ValueType::Ref(RefType::bottom().cast_not_null()),
            Operator::ConstKlass(_) => ValueType::RawPtr,
            Operator::ConstMirror(id) => {
                ValueType::Ref(RefType::of_class(TypeRef::class(id)).cast_not_null())
            }
            Operator::Parameter(_) => ValueType::Top,
            Operator::Address(_) | Operator::ElementAddress(_) => ValueType::RawPtr,
            Operator::Load(access) => ValueType::for_basic_type(access.bt),
            Operator::Store(_) | Operator::MemBar(_) => ValueType::Memory,
            Operator::Allocate | Operator::AllocateArray => {
                ValueType::Ref(RefType::bottom().cast_not_null())
            }
            Operator::CallRuntime(_) => ValueType::Tuple,
            Operator::Control(_) | Operator::Deopt(_) => ValueType::Control,
            Operator::Projection(ProjKind::Exception) => ValueType::Control,
            Operator::Projection(ProjKind::Result) => ValueType::Ref(RefType::bottom()),
            Operator::Guard(GuardKind::NotNull) => inputs
                .get(1)
                .copied()
                .map(ValueType::join_not_null)
                .unwrap_or(ValueType::Top),
            Operator::Guard(GuardKind::Null) => ValueType::Ref(RefType::null()),
            Operator::CheckCast => inputs.get(1).copied().unwrap_or(ValueType::Top),
            Operator::RoundDouble => inputs.first().copied().unwrap_or(ValueType::Double(None)),
            Operator::InlineAggregate(id) => ValueType::Inline(id),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Load(a) => write!(f, "Load.{}.{:?}{}", a.bt, a.order, if a.atomic { ".atomic" } else { "" }),
            Operator::Store(a) => write!(f, "Store.{}.{:?}{}", a.bt, a.order, if a.atomic { ".atomic" } else { "" }),
            Operator::MemBar(kind) => write!(f, "MemBar.{}", kind.name()),
            Operator::CallRuntime(helper) => write!(f, "Call.{}", helper.name()),
            Operator::Deopt(trap) => write!(f, "Deopt.{}.{}", trap.reason.name(), trap.action.name()),
            other => write!(f, "{:?}", other),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_pure() {
        assert!(Operator::ConstInt(1).is_pure());
        assert!(Operator::Address(16).is_pure());
        assert!(Operator::InlineAggregate(ClassId(1)).is_pure());
        assert!(!Operator::Load(MemAccess::unordered(BasicType::Int)).is_pure());
        assert!(!Operator::AllocateArray.is_pure());
        assert!(!Operator::MemBar(BarrierKind::Full).is_pure());
    }

    #[test]
    fn test_runtime_helper_selection() {
        assert_eq!(RuntimeHelper::for_dimensions(1), None);
        assert_eq!(
            RuntimeHelper::for_dimensions(2),
            Some(RuntimeHelper::MultiNewArray2)
        );
        assert_eq!(
            RuntimeHelper::for_dimensions(5),
            Some(RuntimeHelper::MultiNewArray5)
        );
        assert_eq!(
            RuntimeHelper::for_dimensions(6),
            Some(RuntimeHelper::MultiNewArrayN)
        );
        assert!(RuntimeHelper::MultiNewArrayN.is_variadic());
    }

    #[test]
    fn test_constant_result_types() {
        assert_eq!(
            Operator::ConstInt(4).result_type(&[]).int_constant(),
            Some(4)
        );
        assert!(Operator::ConstNull.result_type(&[]).is_null());
        assert_eq!(
            Operator::Load(MemAccess::unordered(BasicType::Byte)).result_type(&[]),
            ValueType::Int(IntRange::BYTE)
        );
    }

    #[test]
    fn test_not_null_guard_type_narrows_input() {
        let input = ValueType::Ref(RefType::bottom());
        let ty = Operator::Guard(GuardKind::NotNull).result_type(&[ValueType::Control, input]);
        assert!(ty.is_not_null());
    }

    #[test]
    fn test_display() {
        let op = Operator::Load(MemAccess::new(BasicType::Long, MemOrder::Acquire, true));
        assert_eq!(op.to_string(), "Load.long.Acquire.atomic");
        assert_eq!(
            Operator::MemBar(BarrierKind::Release).to_string(),
            "MemBar.release"
        );
    }
}
