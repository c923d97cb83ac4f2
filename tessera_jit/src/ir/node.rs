//! Graph nodes.
//!
//! A node is an operator applied to input edges. Control, memory and data
//! dependencies are all plain inputs; the operator fixes which position
//! means what. Nodes never change after creation: refining a value adds a
//! cast or guard node that takes the old one as input.

use super::arena::Id;
use super::operators::Operator;
use super::types::ValueType;
use smallvec::SmallVec;
use std::fmt;

pub type NodeId = Id<Node>;

/// Stores take control, memory, address and value.
const INLINE_INPUTS: usize = 4;

/// Input edges of a node, inline up to four.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct InputList(SmallVec<[NodeId; INLINE_INPUTS]>);

impl InputList {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_slice(inputs: &[NodeId]) -> Self {
        InputList(inputs.iter().copied().collect())
    }

    pub fn push(&mut self, id: NodeId) {
        self.0.push(id);
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.0.get(index).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.0.contains(&id)
    }

    pub fn as_slice(&self) -> &[NodeId] {
        self.0.as_slice()
    }

    /// Inputs by value, in edge order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        self.0.iter().copied()
    }
}

impl From<&[NodeId]> for InputList {
    fn from(inputs: &[NodeId]) -> Self {
        Self::from_slice(inputs)
    }
}

impl<const N: usize> From<[NodeId; N]> for InputList {
    fn from(inputs: [NodeId; N]) -> Self {
        InputList(inputs.into_iter().collect())
    }
}

impl fmt::Debug for InputList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// An operator, its inputs, its result type and the bytecode it came from.
#[derive(Clone, PartialEq, Eq)]
pub struct Node {
    pub op: Operator,
    pub inputs: InputList,
    pub ty: ValueType,
    /// Bci of the instruction being translated when the node was made.
    pub bc_offset: u32,
}

impl Node {
    pub fn with_type(op: Operator, inputs: InputList, ty: ValueType) -> Self {
        Node {
            op,
            inputs,
            ty,
            bc_offset: 0,
        }
    }

    pub fn input(&self, index: usize) -> Option<NodeId> {
        self.inputs.get(index)
    }

    pub fn is_constant(&self) -> bool {
        self.op.is_constant()
    }

    pub fn is_pure(&self) -> bool {
        self.op.is_pure()
    }

    pub fn as_int(&self) -> Option<i32> {
        match self.op {
            Operator::ConstInt(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null_constant(&self) -> bool {
        self.op == Operator::ConstNull
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op)?;
        if !self.inputs.is_empty() {
            write!(f, " {:?}", self.inputs)?;
        }
        write!(f, " : {:?} @{}", self.ty, self.bc_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inputs_spill_past_four() {
        let ids: Vec<NodeId> = (0..6).map(NodeId::new).collect();
        let list = InputList::from_slice(&ids);
        assert_eq!(list.len(), 6);
        assert!(list.iter().enumerate().all(|(i, id)| id.as_usize() == i));
        assert_eq!(list.get(6), None);
        assert!(InputList::empty().is_empty());
    }

    #[test]
    fn test_input_list_push() {
        let mut list = InputList::from([NodeId::new(1)]);
        list.push(NodeId::new(2));
        assert_eq!(list.as_slice(), &[NodeId::new(1), NodeId::new(2)]);
        assert!(list.contains(NodeId::new(2)));
        assert_eq!(format!("{:?}", list), "[#1, #2]");
    }

    #[test]
    fn test_constant_node() {
        let op = Operator::ConstInt(42);
        let node = Node::with_type(op, InputList::empty(), op.result_type(&[]));
        assert!(node.is_constant() && node.is_pure());
        assert_eq!(node.as_int(), Some(42));
        assert_eq!(format!("{:?}", node), "ConstInt(42) : int:42 @0");
    }
}
