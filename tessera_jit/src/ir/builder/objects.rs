//! Object node builder.
//!
//! Allocation, runtime-helper calls and inline aggregates. An inline
//! aggregate lives in one of three forms:
//!
//! - **In hand**: an `InlineAggregate` node whose inputs are the field
//!   values in layout order
//! - **Flattened**: its fields stored directly inside a container object
//! - **Buffered**: a heap instance of its own, reached through a reference

use super::memory::MemoryBuilder;
use super::GraphBuilder;
use crate::error::{TranslateError, TranslateResult};
use crate::ir::node::{InputList, NodeId};
use crate::ir::operators::{MemAccess, Operator, ProjKind, RuntimeHelper};
use crate::ir::types::{IntRange, RefType, ValueType};
use tessera_core::{ClassId, ClassInfo, FieldDescriptor, MetadataProvider, TypeRef};

/// Offset of element 0 in an array object.
pub const ARRAY_BASE_OFFSET: i64 = 16;

/// Builder trait for object operations.
pub trait ObjectBuilder {
    /// Mirror object holding the static fields of `class`.
    fn mirror(&mut self, class: ClassId) -> NodeId;

    /// Allocate an instance of `class`.
    fn new_instance(&mut self, class: ClassId) -> NodeId;

    /// Allocate an array of type `array_type`.
    ///
    /// The length in the result type is narrowed to `[0, max_length]`.
    fn new_array(&mut self, array_type: TypeRef, length: NodeId, max_length: i32) -> NodeId;

    /// Call a runtime helper that may throw.
    ///
    /// The exceptional projection is recorded as an exceptional edge.
    /// Returns the result projection.
    fn call_runtime(&mut self, helper: RuntimeHelper, klass: TypeRef, args: &[NodeId]) -> NodeId;

    /// Narrow the type of `value` under the current control.
    fn check_cast(&mut self, value: NodeId, ty: ValueType) -> NodeId;

    /// Compose an in-hand aggregate from its field values.
    fn make_aggregate(&mut self, class: ClassId, fields: &[NodeId]) -> NodeId;

    /// Read the fields of a flattened aggregate of class `class` stored
    /// at `base + offset` into an in-hand aggregate.
    fn load_flattened<P: MetadataProvider + ?Sized>(
        &mut self,
        provider: &P,
        base: NodeId,
        offset: i64,
        class: ClassId,
    ) -> TranslateResult<NodeId>;

    /// Write the fields of the in-hand `aggregate` to `base + offset`.
    fn store_flattened<P: MetadataProvider + ?Sized>(
        &mut self,
        provider: &P,
        base: NodeId,
        offset: i64,
        aggregate: NodeId,
    ) -> TranslateResult<()>;

    /// Copy an in-hand aggregate into a fresh heap instance.
    fn buffer_aggregate<P: MetadataProvider + ?Sized>(
        &mut self,
        provider: &P,
        aggregate: NodeId,
    ) -> TranslateResult<NodeId>;
}

impl GraphBuilder {
    /// Class of an in-hand aggregate node.
    pub fn aggregate_class(&self, value: NodeId) -> Option<ClassId> {
        match self.graph.get(value)?.op {
            Operator::InlineAggregate(class) => Some(class),
            _ => None,
        }
    }

    fn inline_class<'p, P: MetadataProvider + ?Sized>(
        &self,
        provider: &'p P,
        class: ClassId,
    ) -> TranslateResult<&'p ClassInfo> {
        provider
            .class(class)
            .ok_or(TranslateError::UnresolvedClass { bci: self.bci() })
    }
}

/// Type of a value loaded from a non-flattened field.
pub(crate) fn declared_value_type<P: MetadataProvider + ?Sized>(
    provider: &P,
    field: &FieldDescriptor,
) -> ValueType {
    if !field.basic_type.is_reference() {
        ValueType::for_basic_type(field.basic_type)
    } else if provider.is_loaded(field.declared_type) {
        ValueType::Ref(RefType::of_class(field.declared_type))
    } else {
        ValueType::Ref(RefType::bottom())
    }
}

/// Offset of a sub-field relative to where its aggregate is flattened.
fn sub_field_offset(offset: i64, class: &ClassInfo, sub: &FieldDescriptor) -> i64 {
    offset + (sub.offset as i64 - class.payload_offset as i64)
}

impl ObjectBuilder for GraphBuilder {
    fn mirror(&mut self, class: ClassId) -> NodeId {
        self.graph.const_mirror(class)
    }

    fn new_instance(&mut self, class: ClassId) -> NodeId {
        let ty = TypeRef::class(class);
        let klass = self.graph.const_klass(ty);
        let inputs = InputList::from([self.control(), self.memory(), klass]);
        let alloc = self.graph.add_node_with_type(
            Operator::Allocate,
            inputs,
            ValueType::Ref(RefType::of_class(ty).cast_not_null().cast_exact()),
        );
        self.record_frame_state(alloc);
        alloc
    }

    fn new_array(&mut self, array_type: TypeRef, length: NodeId, max_length: i32) -> NodeId {
        let klass = self.graph.const_klass(array_type);
        let inputs = InputList::from([self.control(), self.memory(), klass, length]);

        let mut ref_ty = RefType::of_class(array_type).cast_not_null().cast_exact();
        let requested = self.graph.ty(length).int_range().unwrap_or(IntRange::INT);
        if let Some(len) = IntRange::new(0, max_length).join(requested) {
            ref_ty = ref_ty.with_array_len(len);
        }

        let alloc =
            self.graph
                .add_node_with_type(Operator::AllocateArray, inputs, ValueType::Ref(ref_ty));
        self.record_frame_state(alloc);
        alloc
    }

    fn call_runtime(&mut self, helper: RuntimeHelper, klass: TypeRef, args: &[NodeId]) -> NodeId {
        let klass = self.graph.const_klass(klass);
        let mut inputs = InputList::from([self.control(), self.memory(), klass]);
        for &arg in args {
            inputs.push(arg);
        }

        let call = self.graph.add_node(Operator::CallRuntime(helper), inputs);
        self.record_frame_state(call);
        self.set_control(call);
        self.set_memory(call);

        let ex = self
            .graph
            .add_node(Operator::Projection(ProjKind::Exception), InputList::from([call]));
        self.record_exception_edge(ex);

        self.graph
            .add_node(Operator::Projection(ProjKind::Result), InputList::from([call]))
    }

    fn check_cast(&mut self, value: NodeId, ty: ValueType) -> NodeId {
        let inputs = InputList::from([self.control(), value]);
        self.graph.add_node_with_type(Operator::CheckCast, inputs, ty)
    }

    fn make_aggregate(&mut self, class: ClassId, fields: &[NodeId]) -> NodeId {
        self.graph
            .add_node(Operator::InlineAggregate(class), InputList::from_slice(fields))
    }

    fn load_flattened<P: MetadataProvider + ?Sized>(
        &mut self,
        provider: &P,
        base: NodeId,
        offset: i64,
        class: ClassId,
    ) -> TranslateResult<NodeId> {
        let info = self.inline_class(provider, class)?;

        let mut values = Vec::with_capacity(info.inline_fields.len());
        for sub in &info.inline_fields {
            let sub_offset = sub_field_offset(offset, info, sub);
            let value = match sub.declared_type.base_class() {
                Some(inner) if sub.is_flattened() => {
                    self.load_flattened(provider, base, sub_offset, inner)?
                }
                _ => {
                    let adr = self.field_address(base, sub_offset);
                    let ty = declared_value_type(provider, sub);
                    self.load(adr, ty, MemAccess::unordered(sub.basic_type))
                }
            };
            values.push(value);
        }
        Ok(self.make_aggregate(class, &values))
    }

    fn store_flattened<P: MetadataProvider + ?Sized>(
        &mut self,
        provider: &P,
        base: NodeId,
        offset: i64,
        aggregate: NodeId,
    ) -> TranslateResult<()> {
        let bci = self.bci();
        let class = self
            .aggregate_class(aggregate)
            .ok_or(TranslateError::NotAnAggregate { bci })?;
        let info = self.inline_class(provider, class)?;
        let values: Vec<NodeId> = self.graph.node(aggregate).inputs.iter().collect();
        if values.len() != info.inline_fields.len() {
            return Err(TranslateError::NotAnAggregate { bci });
        }

        for (sub, value) in info.inline_fields.iter().zip(values) {
            let sub_offset = sub_field_offset(offset, info, sub);
            if sub.is_flattened() {
                self.store_flattened(provider, base, sub_offset, value)?;
            } else {
                let adr = self.field_address(base, sub_offset);
                self.store(adr, value, MemAccess::unordered(sub.basic_type));
            }
        }
        Ok(())
    }

    fn buffer_aggregate<P: MetadataProvider + ?Sized>(
        &mut self,
        provider: &P,
        aggregate: NodeId,
    ) -> TranslateResult<NodeId> {
        let class = self
            .aggregate_class(aggregate)
            .ok_or(TranslateError::NotAnAggregate { bci: self.bci() })?;
        let payload = self.inline_class(provider, class)?.payload_offset as i64;

        let obj = self.new_instance(class);
        self.store_flattened(provider, obj, payload, aggregate)?;
        Ok(obj)
    }
}
