//! The node graph of one compilation.
//!
//! Nodes are arena-allocated and never removed. Pure nodes are
//! hash-consed on operator, inputs and type, so asking twice for the same
//! address or constant yields one node. The graph also keeps reverse
//! (use) edges and a side table of frame states for nodes that can leave
//! compiled code.

use super::arena::{Arena, SecondaryMap};
use super::node::{InputList, Node, NodeId};
use super::operators::{ControlOp, Operator};
use super::types::ValueType;
use rustc_hash::FxHashMap;
use tessera_core::{ClassId, ConstantValue, ObjectId, TypeRef};

/// Interpreter state to rebuild if execution leaves compiled code at a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameState {
    /// Bytecode index to resume at.
    pub bci: u32,
    /// Resume by re-executing the instruction at `bci` instead of
    /// continuing after it.
    pub reexecute: bool,
    /// Operand stack, bottom first.
    pub stack: Vec<NodeId>,
    /// Local slots; `NodeId::INVALID` marks a dead slot.
    pub locals: Vec<NodeId>,
}

type GvnKey = (Operator, InputList, ValueType);

#[derive(Clone)]
pub struct Graph {
    nodes: Arena<Node>,
    /// Reverse edges, filled as nodes are added.
    uses: SecondaryMap<Node, Vec<NodeId>>,
    gvn: FxHashMap<GvnKey, NodeId>,
    frame_states: FxHashMap<NodeId, FrameState>,
    /// Entry control and initial memory.
    pub start: NodeId,
    /// Stamped on every node added from now on.
    current_bci: u32,
}

impl Graph {
    pub fn new() -> Self {
        let mut nodes = Arena::with_capacity(256);
        let start = nodes.alloc(Node::with_type(
            Operator::Control(ControlOp::Start),
            InputList::empty(),
            ValueType::Control,
        ));
        Graph {
            nodes,
            uses: SecondaryMap::new(),
            gvn: FxHashMap::default(),
            frame_states: FxHashMap::default(),
            start,
            current_bci: 0,
        }
    }

    /// Panics on an id from another graph.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    #[inline]
    pub fn ty(&self, id: NodeId) -> ValueType {
        self.nodes[id].ty
    }

    /// Node count, start included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True while only the start node exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    /// Add a node whose type follows from its operator and inputs.
    pub fn add_node(&mut self, op: Operator, inputs: InputList) -> NodeId {
        let ty = self.infer_type(&op, &inputs);
        self.add_node_with_type(op, inputs, ty)
    }

    /// Add a node with an explicit type.
    ///
    /// Pure nodes are hash-consed: if an identical node exists it is
    /// returned instead of creating a new one.
    pub fn add_node_with_type(&mut self, op: Operator, inputs: InputList, ty: ValueType) -> NodeId {
        if op.is_pure() {
            let key = (op, inputs.clone(), ty);
            if let Some(&existing) = self.gvn.get(&key) {
                return existing;
            }
            let id = self.alloc(op, inputs, ty);
            self.gvn.insert(key, id);
            id
        } else {
            self.alloc(op, inputs, ty)
        }
    }

    fn alloc(&mut self, op: Operator, inputs: InputList, ty: ValueType) -> NodeId {
        for input in inputs.iter() {
            self.uses[input].push(NodeId::new(self.nodes.len() as u32));
        }
        let mut node = Node::with_type(op, inputs, ty);
        node.bc_offset = self.current_bci;
        self.nodes.alloc(node)
    }

    pub fn set_bc_offset(&mut self, bci: u32) {
        self.current_bci = bci;
    }

    pub fn bc_offset(&self) -> u32 {
        self.current_bci
    }

    pub fn set_frame_state(&mut self, id: NodeId, state: FrameState) {
        self.frame_states.insert(id, state);
    }

    pub fn frame_state(&self, id: NodeId) -> Option<&FrameState> {
        self.frame_states.get(&id)
    }

    /// Nodes taking `id` as an input, oldest first.
    pub fn uses(&self, id: NodeId) -> &[NodeId] {
        self.uses.get(id).map_or(&[], Vec::as_slice)
    }

    pub fn use_count(&self, id: NodeId) -> usize {
        self.uses(id).len()
    }

    fn infer_type(&self, op: &Operator, inputs: &InputList) -> ValueType {
        let types: Vec<ValueType> = inputs
            .iter()
            .map(|id| self.get(id).map_or(ValueType::Top, |n| n.ty))
            .collect();
        op.result_type(&types)
    }

    pub fn const_int(&mut self, value: i32) -> NodeId {
        self.add_node(Operator::ConstInt(value), InputList::empty())
    }

    pub fn const_long(&mut self, value: i64) -> NodeId {
        self.add_node(Operator::ConstLong(value), InputList::empty())
    }

    pub fn const_float(&mut self, value: f32) -> NodeId {
        self.add_node(Operator::ConstFloat(value.to_bits()), InputList::empty())
    }

    pub fn const_double(&mut self, value: f64) -> NodeId {
        self.add_node(Operator::ConstDouble(value.to_bits()), InputList::empty())
    }

    pub fn const_null(&mut self) -> NodeId {
        self.add_node(Operator::ConstNull, InputList::empty())
    }

    /// Class metadata constant used as an allocation operand.
    pub fn const_klass(&mut self, ty: TypeRef) -> NodeId {
        self.add_node(Operator::ConstKlass(ty), InputList::empty())
    }

    /// Mirror object holding a class's static fields.
    pub fn const_mirror(&mut self, class: ClassId) -> NodeId {
        self.add_node(Operator::ConstMirror(class), InputList::empty())
    }

    /// Node for a compile-time constant, typed exactly.
    pub fn constant(&mut self, value: ConstantValue) -> NodeId {
        let op = match value {
            ConstantValue::Int(v) => Operator::ConstInt(v),
            ConstantValue::Long(v) => Operator::ConstLong(v),
            ConstantValue::Float(bits) => Operator::ConstFloat(bits),
            ConstantValue::Double(bits) => Operator::ConstDouble(bits),
            ConstantValue::Null => Operator::ConstNull,
            ConstantValue::Object { id, .. } => Operator::ConstObject(id),
        };
        self.add_node_with_type(op, InputList::empty(), ValueType::for_constant(value))
    }

    /// The known `int` value of a node, if constant.
    pub fn find_int_con(&self, id: NodeId) -> Option<i32> {
        self.get(id).and_then(|n| n.ty.int_constant())
    }

    /// The constant object a node refers to, if known.
    pub fn find_object_con(&self, id: NodeId) -> Option<ObjectId> {
        self.get(id)
            .and_then(|n| n.ty.as_ref_type())
            .and_then(|r| r.constant)
    }

    /// Trace through casts and guards to the allocation producing a value.
    pub fn ideal_allocation(&self, mut id: NodeId) -> Option<NodeId> {
        loop {
            let node = self.get(id)?;
            match node.op {
                op if op.is_allocation() => return Some(id),
                Operator::CheckCast | Operator::Guard(_) => id = node.input(1)?,
                _ => return None,
            }
        }
    }

    /// Nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Count nodes satisfying a predicate on their operator.
    pub fn count(&self, pred: impl Fn(&Operator) -> bool) -> usize {
        self.iter().filter(|(_, n)| pred(&n.op)).count()
    }

    /// Nodes satisfying a predicate, in creation order.
    pub fn find_all(&self, pred: impl Fn(&Operator) -> bool) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, n)| pred(&n.op))
            .map(|(id, _)| id)
            .collect()
    }

    /// Check that every edge points at an older node, which also rules
    /// out cycles and dangling ids.
    pub fn verify(&self) -> Result<(), String> {
        for (id, node) in self.iter() {
            if let Some(bad) = node.inputs.iter().find(|&input| input >= id) {
                return Err(format!("{:?} ({}) takes newer input {:?}", id, node.op, bad));
            }
        }
        Ok(())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "graph, {} nodes", self.len())?;
        for (id, node) in self.iter() {
            writeln!(f, "  {:?}: {:?}", id, node)?;
        }
        Ok(())
    }
}
