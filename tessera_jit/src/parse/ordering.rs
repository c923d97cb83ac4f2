//! Memory ordering of field accesses.
//!
//! Maps a field's attributes and the target's atomicity guarantees to the
//! ordering of the access itself and the fences around it:
//!
//! ```text
//!   volatile read                      volatile write
//!   ─────────────                      ──────────────
//!   [full]      if !multi-copy-atomic  release
//!   load.acquire                       store.release
//!   acquire (anchored to the load)     [full]  if multi-copy-atomic
//! ```
//!
//! Non-volatile reads are unordered. Non-volatile writes are unordered
//! unless they store a reference, which is released so that the fields
//! of a freshly built object are visible before the object is.

use crate::config::TranslatorConfig;
use crate::ir::operators::{BarrierKind, MemAccess, MemOrder};
use tessera_core::{BasicType, FieldDescriptor};

/// Ordering of one field access and the fences around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    /// Barrier emitted before the access.
    pub leading: Option<BarrierKind>,
    pub order: MemOrder,
    /// The access must not be split.
    pub atomic: bool,
    /// Barrier emitted after the access.
    pub trailing: Option<BarrierKind>,
}

impl AccessPolicy {
    /// The memory access for a slot of type `bt` under this policy.
    #[inline]
    pub fn access(&self, bt: BasicType) -> MemAccess {
        MemAccess::new(bt, self.order, self.atomic)
    }
}

/// Policy for reading `field`.
pub fn load_policy(field: &FieldDescriptor, config: &TranslatorConfig) -> AccessPolicy {
    let volatile = field.is_volatile();
    AccessPolicy {
        leading: (volatile && config.not_multiple_copy_atomic).then_some(BarrierKind::Full),
        order: if volatile {
            MemOrder::Acquire
        } else {
            MemOrder::Unordered
        },
        atomic: volatile || config.always_atomic_accesses,
        trailing: volatile.then_some(BarrierKind::Acquire),
    }
}

/// Policy for writing `field`.
pub fn store_policy(field: &FieldDescriptor, config: &TranslatorConfig) -> AccessPolicy {
    let volatile = field.is_volatile();
    let order = if volatile || field.basic_type.is_reference() {
        MemOrder::Release
    } else {
        MemOrder::Unordered
    };
    AccessPolicy {
        leading: volatile.then_some(BarrierKind::Release),
        order,
        atomic: volatile || config.always_atomic_accesses,
        trailing: (volatile && !config.not_multiple_copy_atomic).then_some(BarrierKind::Full),
    }
}
