//! Array allocation translation.
//!
//! `newarray` and `anewarray` allocate one array. `multianewarray` picks
//! one of two strategies:
//!
//! - **Inline expansion**: when every length but the innermost is a small
//!   positive constant, the whole tree of arrays is allocated directly,
//!   each sub-array stored into its parent
//! - **Runtime helper**: otherwise a shared routine allocates the tree;
//!   ranks above the fixed-arity helpers pass their lengths in a scratch
//!   `int[]`
//!
//! Either way the lengths are back on the stack with the re-execute bit
//! set while allocations are built, so a deoptimization restarts the
//! instruction in the interpreter.

use super::refine::multi_array_type;
use super::Translator;
use crate::error::{TranslateError, TranslateResult};
use crate::ir::builder::objects::ARRAY_BASE_OFFSET;
use crate::ir::builder::{
    DeoptAction, DeoptReason, GraphBuilder, GuardBuilder, MemoryBuilder, ObjectBuilder, Status,
};
use crate::ir::graph::Graph;
use crate::ir::node::NodeId;
use crate::ir::operators::{MemAccess, RuntimeHelper};
use tessera_core::{BasicType, BytecodeCursor, MetadataProvider, TypeRef};
use tracing::debug;

impl<'a, P: MetadataProvider + ?Sized> Translator<'a, P> {
    /// `newarray`: allocate an array of a primitive element type.
    pub fn translate_new_primitive_array(
        &mut self,
        cursor: &dyn BytecodeCursor,
    ) -> TranslateResult<Status> {
        if self.builder.is_stopped() {
            return Ok(Status::Stopped);
        }
        let bt = cursor.element_type().ok_or(TranslateError::UnresolvedClass {
            bci: self.builder.bci(),
        })?;

        self.builder.kill_dead_locals(cursor);
        let length = self.builder.pop()?;
        let array_type = TypeRef::primitive(bt).array_of();
        let array = self
            .builder
            .new_array(array_type, length, self.config.max_array_length);
        self.builder.push(array);
        Ok(Status::Continue)
    }

    /// `anewarray`: allocate an array of references.
    pub fn translate_new_array(&mut self, cursor: &dyn BytecodeCursor) -> TranslateResult<Status> {
        if self.builder.is_stopped() {
            return Ok(Status::Stopped);
        }
        let element = cursor.klass().ok_or(TranslateError::UnresolvedClass {
            bci: self.builder.bci(),
        })?;
        let array_type = element.array_of();

        if !cursor.will_link() || !self.provider.is_loaded(element) {
            return Ok(self.builder.uncommon_trap(
                DeoptReason::Unloaded,
                DeoptAction::Reinterpret,
                Some(array_type),
            ));
        }

        if self.provider.is_inline(element) {
            let initialized = element
                .base_class()
                .and_then(|id| self.provider.class(id))
                .is_some_and(|c| c.is_initialized());
            if !initialized {
                return Ok(self.builder.uncommon_trap(
                    DeoptReason::Uninitialized,
                    DeoptAction::Reinterpret,
                    None,
                ));
            }
        }

        self.builder.kill_dead_locals(cursor);
        let length = self.builder.pop()?;
        let array = self
            .builder
            .new_array(array_type, length, self.config.max_array_length);
        self.builder.push(array);
        Ok(Status::Continue)
    }

    /// `multianewarray`: allocate a multi-dimensional array.
    ///
    /// Array classes are always initialized, so no guard precedes the
    /// allocation.
    pub fn translate_multi_new_array(
        &mut self,
        cursor: &dyn BytecodeCursor,
    ) -> TranslateResult<Status> {
        if self.builder.is_stopped() {
            return Ok(Status::Stopped);
        }
        let bci = self.builder.bci();
        let array_type = cursor.klass().ok_or(TranslateError::UnresolvedClass { bci })?;
        let dimensions = cursor.dimensions();
        let n = usize::from(dimensions);
        if n == 0 || n > usize::from(array_type.dimensions) {
            return Err(TranslateError::InvalidDimensions { bci, dimensions });
        }

        self.builder.kill_dead_locals(cursor);

        // The outermost length is deepest on the stack.
        let mut lengths = vec![NodeId::INVALID; n];
        for slot in lengths.iter_mut().rev() {
            *slot = self.builder.pop()?;
        }

        let max_length = self.config.max_array_length;
        let limit = i64::from(self.config.expand_limit());
        let count = expansion_count(self.builder.graph(), &lengths, limit);

        let helper = RuntimeHelper::for_dimensions(n).filter(|_| !(1..=limit).contains(&count));
        let Some(helper) = helper else {
            debug!(bci, dimensions, allocations = count, "expanding multianewarray inline");
            let array = self.builder.preserve_reexecute(&lengths, |b| {
                expand_multi_array(b, array_type, &lengths, max_length)
            })?;
            self.builder.push(array);
            return Ok(Status::Continue);
        };

        debug!(bci, dimensions, helper = helper.name(), "allocating multianewarray in runtime");
        let result = if helper.is_variadic() {
            let dims = self.builder.preserve_reexecute(&lengths, |b| {
                Ok(dimensions_array(b, &lengths, max_length))
            })?;
            self.builder.call_runtime(helper, array_type, &[dims])
        } else {
            self.builder.call_runtime(helper, array_type, &lengths)
        };

        // Only the outer array can be sharpened; its elements stay mutable.
        let outer = self.builder.graph().ty(lengths[0]).int_range();
        let ty = multi_array_type(array_type, outer, max_length);
        let array = self.builder.check_cast(result, ty);
        self.builder.push(array);
        Ok(Status::Continue)
    }
}

/// Number of allocations an inline expansion would emit, or 0 if the
/// lengths do not allow one within `limit`.
///
/// Every length except the innermost must be a constant in `[1, limit]`.
fn expansion_count(graph: &Graph, lengths: &[NodeId], limit: i64) -> i64 {
    let outer = &lengths[..lengths.len().saturating_sub(1)];
    let mut count: i64 = 1;
    let mut fanout: i64 = 1;
    for &length in outer {
        let dim = graph.find_int_con(length).map_or(-1, i64::from);
        fanout = fanout.saturating_mul(dim);
        count = count.saturating_add(fanout);
        if dim <= 0 || dim > limit || count > limit {
            return 0;
        }
    }
    count
}

/// Allocate `array_type` with the given lengths, outermost first.
fn expand_multi_array(
    b: &mut GraphBuilder,
    array_type: TypeRef,
    lengths: &[NodeId],
    max_length: i32,
) -> TranslateResult<NodeId> {
    let bci = b.bci();
    let (&length, inner) = lengths
        .split_first()
        .ok_or(TranslateError::InvalidDimensions { bci, dimensions: 0 })?;
    let array = b.new_array(array_type, length, max_length);
    if inner.is_empty() {
        return Ok(array);
    }

    let count = b
        .graph()
        .find_int_con(length)
        .filter(|&c| c >= 0)
        .ok_or(TranslateError::NonConstantExpansion { bci })?;
    let element_type = array_type
        .component()
        .ok_or(TranslateError::InvalidDimensions {
            bci,
            dimensions: array_type.dimensions,
        })?;
    let element_size = i64::from(BasicType::Object.element_size());

    for i in 0..i64::from(count) {
        let element = expand_multi_array(b, element_type, inner, max_length)?;
        let adr = b.field_address(array, ARRAY_BASE_OFFSET + i * element_size);
        b.store(adr, element, MemAccess::unordered(BasicType::Object));
    }
    Ok(array)
}

/// Scratch `int[]` holding the lengths for the variadic helper.
fn dimensions_array(b: &mut GraphBuilder, lengths: &[NodeId], max_length: i32) -> NodeId {
    let count = b.graph_mut().const_int(lengths.len() as i32);
    let dims = b.new_array(TypeRef::primitive(BasicType::Int).array_of(), count, max_length);
    for (j, &length) in lengths.iter().enumerate() {
        let index = b.graph_mut().const_int(j as i32);
        let adr = b.element_address(dims, index, BasicType::Int);
        b.store(adr, length, MemAccess::unordered(BasicType::Int));
    }
    dims
}
