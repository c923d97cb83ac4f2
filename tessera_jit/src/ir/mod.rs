//! Sea-of-Nodes Intermediate Representation.
//!
//! # Core Components
//!
//! - **Types** (`types.rs`): Value type lattice with nullness, exactness
//!   and known constants
//! - **Operators** (`operators.rs`): Operator definitions and memory ordering
//! - **Arena** (`arena.rs`): Index-addressed node storage
//! - **Node** (`node.rs`): IR node definitions
//! - **Graph** (`graph.rs`): Graph structure, hash-consing, frame states
//! - **Builder** (`builder/`): Parse state and node construction
//!
//! # Design Principles
//!
//! - **Arena allocation**: Edges are indices, the whole graph is freed at once
//! - **Hash-consing**: Pure nodes with equal operator and inputs are shared
//! - **Unified control/data**: Control and memory are ordinary edges

pub mod arena;
pub mod builder;
pub mod graph;
pub mod node;
pub mod operators;
pub mod types;

// Re-export commonly used types
pub use arena::{Arena, Id, SecondaryMap};
pub use builder::{GraphBuilder, ParseFlags, Status};
pub use graph::{FrameState, Graph};
pub use node::{InputList, Node, NodeId};
pub use operators::{
    BarrierKind, ControlOp, GuardKind, MemAccess, MemOrder, Operator, ProjKind, RuntimeHelper,
    TrapInfo,
};
pub use types::{IntRange, Nullness, RefClass, RefType, ValueType};
