//! IR Graph Builder module.
//!
//! `GraphBuilder` owns the graph under construction together with the
//! parse state of the current path: the symbolic operand stack, locals,
//! the current control and memory nodes, and the bytecode position.
//! Node construction lives in extension traits, one per concern:
//!
//! - [`GuardBuilder`]: deoptimization traps, null checks, null assertions
//! - [`MemoryBuilder`]: addresses, ordered loads and stores, barriers
//! - [`ObjectBuilder`]: allocation, runtime calls, inline aggregates

use crate::error::{TranslateError, TranslateResult};
use crate::ir::graph::{FrameState, Graph};
use crate::ir::node::{InputList, NodeId};
use crate::ir::operators::Operator;
use crate::ir::types::ValueType;
use tessera_core::{BasicType, BytecodeCursor};

pub mod guards;
pub mod memory;
pub mod objects;

#[cfg(test)]
mod tests;

pub use guards::{DeoptAction, DeoptReason, GuardBuilder};
pub use memory::MemoryBuilder;
pub use objects::ObjectBuilder;

// =============================================================================
// Status
// =============================================================================

/// Outcome of translating one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Translation may proceed with the next instruction.
    Continue,
    /// Control left compiled code; nothing more is emitted on this path.
    Stopped,
}

impl Status {
    #[inline]
    pub fn is_stopped(self) -> bool {
        self == Status::Stopped
    }
}

bitflags::bitflags! {
    /// Facts about the method recorded while parsing, used by exit fencing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ParseFlags: u8 {
        const WROTE_FIELDS = 1 << 0;
        const WROTE_VOLATILE = 1 << 1;
        const WROTE_FINAL = 1 << 2;
        const WROTE_STABLE = 1 << 3;
    }
}

// =============================================================================
// Interpreter State
// =============================================================================

/// Symbolic interpreter state of the current path.
#[derive(Clone, Debug)]
pub struct JvmState {
    /// Operand stack, bottom first. The second slot of a two-slot value
    /// holds `NodeId::INVALID`.
    stack: Vec<NodeId>,

    /// Local slots; `NodeId::INVALID` marks a dead or unset slot.
    locals: Vec<NodeId>,

    /// Current control dependency.
    control: NodeId,

    /// Current memory state.
    memory: NodeId,

    /// Bytecode index deoptimization reports.
    bci: u32,

    /// Deoptimization re-executes the instruction at `bci`.
    reexecute: bool,
}

impl JvmState {
    fn new(num_locals: usize, start: NodeId) -> Self {
        JvmState {
            stack: Vec::new(),
            locals: vec![NodeId::INVALID; num_locals],
            control: start,
            memory: start,
            bci: 0,
            reexecute: false,
        }
    }
}

// =============================================================================
// Graph Builder
// =============================================================================

/// Builder for constructing IR graphs from bytecode.
pub struct GraphBuilder {
    /// The graph being built.
    pub(crate) graph: Graph,

    /// Parse state of the current path.
    pub(crate) state: JvmState,

    /// Control has left compiled code.
    stopped: bool,

    flags: ParseFlags,

    /// Receiver of the last final-field write that traced back to an
    /// allocation.
    alloc_with_final: Option<NodeId>,

    /// Deopt nodes emitted, in order.
    traps: Vec<NodeId>,

    /// Exceptional control projections out of runtime calls.
    exception_edges: Vec<NodeId>,

    /// Parameter nodes.
    parameters: Vec<NodeId>,
}

impl GraphBuilder {
    /// Create a builder for a method with `num_locals` local slots and no
    /// parameters.
    pub fn new(num_locals: usize) -> Self {
        Self::with_parameters(num_locals, &[])
    }

    /// Create a builder whose first locals hold typed parameters.
    ///
    /// Two-slot parameter types take two local slots.
    pub fn with_parameters(num_locals: usize, params: &[ValueType]) -> Self {
        let mut graph = Graph::new();
        let start = graph.start;

        let needed: usize = params.iter().map(|ty| value_slots(*ty)).sum();
        let mut state = JvmState::new(num_locals.max(needed), start);

        let mut parameters = Vec::with_capacity(params.len());
        let mut slot = 0;
        for (i, ty) in params.iter().enumerate() {
            let param =
                graph.add_node_with_type(Operator::Parameter(i as u16), InputList::from([start]), *ty);
            parameters.push(param);
            state.locals[slot] = param;
            slot += value_slots(*ty);
        }

        GraphBuilder {
            graph,
            state,
            stopped: false,
            flags: ParseFlags::empty(),
            alloc_with_final: None,
            traps: Vec::new(),
            exception_edges: Vec::new(),
            parameters,
        }
    }

    /// Get the constructed graph.
    pub fn finish(self) -> Graph {
        self.graph
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    // =========================================================================
    // State Management
    // =========================================================================

    pub fn parameter(&self, index: usize) -> Option<NodeId> {
        self.parameters.get(index).copied()
    }

    pub fn control(&self) -> NodeId {
        self.state.control
    }

    pub fn set_control(&mut self, control: NodeId) {
        self.state.control = control;
    }

    pub fn memory(&self) -> NodeId {
        self.state.memory
    }

    pub fn set_memory(&mut self, memory: NodeId) {
        self.state.memory = memory;
    }

    pub fn bci(&self) -> u32 {
        self.state.bci
    }

    /// Move to a bytecode index. New nodes are attributed to it.
    pub fn set_bci(&mut self, bci: u32) {
        self.state.bci = bci;
        self.graph.set_bc_offset(bci);
    }

    pub fn reexecute(&self) -> bool {
        self.state.reexecute
    }

    pub fn set_reexecute(&mut self, reexecute: bool) {
        self.state.reexecute = reexecute;
    }

    /// Check if control has left compiled code on this path.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub(crate) fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn local(&self, index: usize) -> NodeId {
        self.state
            .locals
            .get(index)
            .copied()
            .unwrap_or(NodeId::INVALID)
    }

    pub fn set_local(&mut self, index: usize, value: NodeId) {
        if let Some(slot) = self.state.locals.get_mut(index) {
            *slot = value;
        }
    }

    pub fn flags(&self) -> ParseFlags {
        self.flags
    }

    pub fn set_flag(&mut self, flag: ParseFlags) {
        self.flags.insert(flag);
    }

    pub fn alloc_with_final(&self) -> Option<NodeId> {
        self.alloc_with_final
    }

    pub fn set_alloc_with_final(&mut self, obj: NodeId) {
        self.alloc_with_final = Some(obj);
    }

    /// Deopt nodes emitted so far.
    pub fn traps(&self) -> &[NodeId] {
        &self.traps
    }

    pub(crate) fn record_trap(&mut self, trap: NodeId) {
        self.traps.push(trap);
    }

    /// Exceptional edges out of runtime calls.
    pub fn exception_edges(&self) -> &[NodeId] {
        &self.exception_edges
    }

    pub(crate) fn record_exception_edge(&mut self, edge: NodeId) {
        self.exception_edges.push(edge);
    }

    // =========================================================================
    // Operand Stack
    // =========================================================================

    pub fn stack(&self) -> &[NodeId] {
        &self.state.stack
    }

    pub fn stack_depth(&self) -> usize {
        self.state.stack.len()
    }

    pub fn push(&mut self, value: NodeId) {
        self.state.stack.push(value);
    }

    /// Push a two-slot value.
    pub fn push_pair(&mut self, value: NodeId) {
        self.state.stack.push(value);
        self.state.stack.push(NodeId::INVALID);
    }

    /// Push a value taking as many slots as `bt` needs.
    pub fn push_node(&mut self, bt: BasicType, value: NodeId) {
        if bt.is_category2() {
            self.push_pair(value);
        } else {
            self.push(value);
        }
    }

    pub fn pop(&mut self) -> TranslateResult<NodeId> {
        self.state.stack.pop().ok_or(TranslateError::StackUnderflow {
            bci: self.state.bci,
        })
    }

    /// Pop a two-slot value.
    pub fn pop_pair(&mut self) -> TranslateResult<NodeId> {
        self.pop()?;
        self.pop()
    }

    pub fn pop_node(&mut self, bt: BasicType) -> TranslateResult<NodeId> {
        if bt.is_category2() {
            self.pop_pair()
        } else {
            self.pop()
        }
    }

    /// Read the slot `depth` entries below the top without popping.
    pub fn peek(&self, depth: usize) -> TranslateResult<NodeId> {
        let len = self.state.stack.len();
        if depth < len {
            Ok(self.state.stack[len - 1 - depth])
        } else {
            Err(TranslateError::StackUnderflow {
                bci: self.state.bci,
            })
        }
    }

    // =========================================================================
    // Map Updates
    // =========================================================================

    /// Clear locals the cursor reports dead after the current instruction.
    pub fn kill_dead_locals(&mut self, cursor: &dyn BytecodeCursor) {
        for (i, slot) in self.state.locals.iter_mut().enumerate() {
            if !cursor.is_local_live(i) {
                *slot = NodeId::INVALID;
            }
        }
    }

    /// Replace every occurrence of `old` in the stack and locals.
    pub fn replace_in_map(&mut self, old: NodeId, new: NodeId) {
        if old == new {
            return;
        }
        let slots = self
            .state
            .stack
            .iter_mut()
            .chain(self.state.locals.iter_mut());
        for slot in slots {
            if *slot == old {
                *slot = new;
            }
        }
    }

    /// Run `f` with the instruction's popped operands back on the stack and
    /// the re-execute bit set, so that deoptimization inside `f` restarts
    /// the whole instruction. Stack and bit are restored afterwards.
    pub fn preserve_reexecute<T>(
        &mut self,
        popped: &[NodeId],
        f: impl FnOnce(&mut Self) -> TranslateResult<T>,
    ) -> TranslateResult<T> {
        let saved_stack = self.state.stack.clone();
        let saved_reexecute = self.state.reexecute;

        self.state.stack.extend_from_slice(popped);
        self.state.reexecute = true;
        let result = f(self);

        self.state.stack = saved_stack;
        self.state.reexecute = saved_reexecute;
        result
    }

    // =========================================================================
    // Frame States
    // =========================================================================

    /// Snapshot of the interpreter state at the current position.
    pub fn frame_state(&self) -> FrameState {
        FrameState {
            bci: self.state.bci,
            reexecute: self.state.reexecute,
            stack: self.state.stack.clone(),
            locals: self.state.locals.clone(),
        }
    }

    /// Attach the current interpreter state to a deoptimizing node.
    pub(crate) fn record_frame_state(&mut self, node: NodeId) {
        let state = self.frame_state();
        self.graph.set_frame_state(node, state);
    }
}

fn value_slots(ty: ValueType) -> usize {
    match ty {
        ValueType::Long(_) | ValueType::Double(_) => 2,
        _ => 1,
    }
}
