//! Guard node builder for deoptimization.
//!
//! Compiled code assumes things the interpreter checks on every
//! execution: a receiver is not null, a class is initialized, a field
//! of unloaded type is null. Where an assumption cannot be proven at
//! compile time it becomes a guard:
//!
//! ```text
//!     ┌──────────┐
//!     │ value    │
//!     └────┬─────┘
//!          │
//!     ╔════▼════╗
//!     ║  Guard  ║ NotNull / Null
//!     ╚════╤════╝
//!          │
//!     ┌────▼─────┐           ┌─────────────┐
//!     │ success  │           │ interpreter │
//!     └──────────┘           └─────────────┘
//! ```
//!
//! Where an assumption is known to fail, the path ends in an
//! unconditional trap and the builder is stopped.

use super::{GraphBuilder, Status};
use crate::ir::node::{InputList, NodeId};
use crate::ir::operators::{GuardKind, Operator, TrapInfo};
use crate::ir::types::{RefType, ValueType};
use tessera_core::TypeRef;
use tracing::debug;

// =============================================================================
// Deopt Reason and Action
// =============================================================================

/// Why compiled code gave up.
///
/// Recorded with each trap so recompilation can avoid the same
/// speculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeoptReason {
    /// A receiver turned out to be null.
    NullCheck = 0,
    /// A value asserted to be null was not.
    NullAssert = 1,
    /// The operation is not handled by compiled code.
    Unhandled = 2,
    /// A class was used before initialization finished.
    Uninitialized = 3,
    /// A class was not loaded.
    Unloaded = 4,
    /// Null was stored where an inline aggregate is required.
    InvalidAggregateNull = 5,
}

impl DeoptReason {
    pub const fn name(self) -> &'static str {
        match self {
            DeoptReason::NullCheck => "null_check",
            DeoptReason::NullAssert => "null_assert",
            DeoptReason::Unhandled => "unhandled",
            DeoptReason::Uninitialized => "uninitialized",
            DeoptReason::Unloaded => "unloaded",
            DeoptReason::InvalidAggregateNull => "invalid_aggregate_null",
        }
    }
}

/// What the runtime does with the compiled method after a trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeoptAction {
    /// Keep the compiled code.
    None = 0,
    /// Resume interpreted and recompile once the situation changed.
    Reinterpret = 1,
}

impl DeoptAction {
    pub const fn name(self) -> &'static str {
        match self {
            DeoptAction::None => "none",
            DeoptAction::Reinterpret => "reinterpret",
        }
    }
}

impl GuardKind {
    /// Reason reported when this guard fails.
    pub const fn deopt_reason(self) -> DeoptReason {
        match self {
            GuardKind::NotNull => DeoptReason::NullCheck,
            GuardKind::Null => DeoptReason::NullAssert,
        }
    }
}

// =============================================================================
// Guard Builder Trait
// =============================================================================

/// Extension trait for building guards and traps.
pub trait GuardBuilder {
    /// Leave compiled code unconditionally and stop the current path.
    fn uncommon_trap(
        &mut self,
        reason: DeoptReason,
        action: DeoptAction,
        klass: Option<TypeRef>,
    ) -> Status;

    /// Prove `value` non-null.
    ///
    /// Returns the value to use from here on. A value already known to be
    /// non-null is returned unchanged; a null constant traps and stops the
    /// path.
    fn null_check(&mut self, value: NodeId) -> NodeId;

    /// Assert `value` is null, trapping otherwise.
    ///
    /// Returns the null constant, which replaces `value` in the map.
    fn null_assert(&mut self, value: NodeId) -> NodeId;
}

impl GuardBuilder for GraphBuilder {
    fn uncommon_trap(
        &mut self,
        reason: DeoptReason,
        action: DeoptAction,
        klass: Option<TypeRef>,
    ) -> Status {
        let inputs = InputList::from([self.control(), self.memory()]);
        let trap = self.graph.add_node_with_type(
            Operator::Deopt(TrapInfo {
                reason,
                action,
                klass,
            }),
            inputs,
            ValueType::Control,
        );
        self.record_frame_state(trap);
        self.record_trap(trap);
        self.set_control(trap);
        self.stop();

        debug!(
            reason = reason.name(),
            action = action.name(),
            bci = self.bci(),
            "uncommon trap"
        );
        Status::Stopped
    }

    fn null_check(&mut self, value: NodeId) -> NodeId {
        let ty = self.graph.ty(value);
        if ty.is_not_null() {
            return value;
        }
        if ty.is_null() {
            self.uncommon_trap(DeoptReason::NullCheck, DeoptAction::Reinterpret, None);
            return value;
        }

        let inputs = InputList::from([self.control(), value]);
        let guard = self.graph.add_node_with_type(
            Operator::Guard(GuardKind::NotNull),
            inputs,
            ty.join_not_null(),
        );
        self.record_frame_state(guard);
        self.set_control(guard);
        self.replace_in_map(value, guard);
        guard
    }

    fn null_assert(&mut self, value: NodeId) -> NodeId {
        let inputs = InputList::from([self.control(), value]);
        let guard = self.graph.add_node_with_type(
            Operator::Guard(GuardKind::Null),
            inputs,
            ValueType::Ref(RefType::null()),
        );
        self.record_frame_state(guard);
        self.set_control(guard);

        let null = self.graph.const_null();
        self.replace_in_map(value, null);
        debug!(bci = self.bci(), "asserting nullness of field value");
        null
    }
}
