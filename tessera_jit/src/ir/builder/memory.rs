//! Memory node builder.
//!
//! Loads read the current memory state; stores and barriers produce a new
//! one, which becomes the builder's current memory.

use super::GraphBuilder;
use crate::ir::node::{InputList, NodeId};
use crate::ir::operators::{BarrierKind, MemAccess, Operator};
use crate::ir::types::ValueType;
use tessera_core::BasicType;

/// Builder trait for memory operations.
pub trait MemoryBuilder {
    /// `base + offset`.
    fn field_address(&mut self, base: NodeId, offset: i64) -> NodeId;

    /// Address of element `index` of `array`.
    fn element_address(&mut self, array: NodeId, index: NodeId, bt: BasicType) -> NodeId;

    /// Load a value of type `ty` from `adr`.
    fn load(&mut self, adr: NodeId, ty: ValueType, access: MemAccess) -> NodeId;

    /// Store `value` to `adr`. Returns the store, the new memory state.
    fn store(&mut self, adr: NodeId, value: NodeId, access: MemAccess) -> NodeId;

    /// Insert a barrier, optionally anchored to a value that must be
    /// computed before it.
    fn membar(&mut self, kind: BarrierKind, precedent: Option<NodeId>) -> NodeId;

    /// Round a double to storage precision.
    fn round_double(&mut self, value: NodeId) -> NodeId;
}

impl MemoryBuilder for GraphBuilder {
    fn field_address(&mut self, base: NodeId, offset: i64) -> NodeId {
        self.graph
            .add_node(Operator::Address(offset), InputList::from([base]))
    }

    fn element_address(&mut self, array: NodeId, index: NodeId, bt: BasicType) -> NodeId {
        self.graph
            .add_node(Operator::ElementAddress(bt), InputList::from([array, index]))
    }

    fn load(&mut self, adr: NodeId, ty: ValueType, access: MemAccess) -> NodeId {
        let inputs = InputList::from([self.control(), self.memory(), adr]);
        self.graph
            .add_node_with_type(Operator::Load(access), inputs, ty)
    }

    fn store(&mut self, adr: NodeId, value: NodeId, access: MemAccess) -> NodeId {
        let inputs = InputList::from([self.control(), self.memory(), adr, value]);
        let store = self.graph.add_node(Operator::Store(access), inputs);
        self.set_memory(store);
        store
    }

    fn membar(&mut self, kind: BarrierKind, precedent: Option<NodeId>) -> NodeId {
        let mut inputs = InputList::from([self.control(), self.memory()]);
        if let Some(value) = precedent {
            inputs.push(value);
        }
        let bar = self.graph.add_node(Operator::MemBar(kind), inputs);
        self.set_memory(bar);
        bar
    }

    fn round_double(&mut self, value: NodeId) -> NodeId {
        self.graph
            .add_node(Operator::RoundDouble, InputList::from([value]))
    }
}
