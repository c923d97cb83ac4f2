//! Field access translation.
//!
//! Lowers `getfield`, `putfield`, `getstatic` and `putstatic`. Before any
//! memory is touched the access is checked in this order:
//!
//! 1. Reads from an in-hand inline aggregate take the field value
//!    straight from the aggregate
//! 2. An instance/static mismatch with the field traps
//! 3. Statics of an uninitialized class trap, unless the method is the
//!    class's initializer or a constructor of it or a subclass
//! 4. Writes to a call-site target trap
//! 5. Instance receivers are null-checked
//!
//! The receiver stays on the stack until the load or store exists, so a
//! trap inside the access sees the operand stack the interpreter expects.

use super::ordering::{load_policy, store_policy};
use super::refine::{access_type, fold_constant, load_type};
use super::Translator;
use crate::error::{TranslateError, TranslateResult};
use crate::ir::builder::{
    DeoptAction, DeoptReason, GuardBuilder, MemoryBuilder, ObjectBuilder, ParseFlags, Status,
};
use crate::ir::node::NodeId;
use tessera_core::{BasicType, BytecodeCursor, FieldDescriptor, MetadataProvider, MethodKind};
use tracing::trace;

impl<'a, P: MetadataProvider + ?Sized> Translator<'a, P> {
    /// Translate a field access.
    ///
    /// `is_get` selects read or write; `is_field` selects instance or
    /// static access as encoded in the bytecode.
    pub fn translate_field_access(
        &mut self,
        cursor: &dyn BytecodeCursor,
        is_get: bool,
        is_field: bool,
    ) -> TranslateResult<Status> {
        if self.builder.is_stopped() {
            return Ok(Status::Stopped);
        }
        let bci = self.builder.bci();
        if !cursor.will_link() {
            return Err(TranslateError::UnresolvedField { bci });
        }
        let field = cursor
            .field()
            .ok_or(TranslateError::UnresolvedField { bci })?
            .clone();

        let holder = self.provider.class(field.holder);
        if is_field && holder.is_some_and(|c| c.is_inline) {
            let depth = if is_get { 0 } else { field.slots() };
            let receiver = self.builder.peek(depth)?;
            if self.builder.aggregate_class(receiver).is_some() {
                if !is_get {
                    return Err(TranslateError::UnsupportedAggregateWrite { bci });
                }
                return self.get_from_aggregate(&field);
            }
        }

        if is_field == field.is_static() {
            // The interpreter raises an incompatible class change error.
            return Ok(self
                .builder
                .uncommon_trap(DeoptReason::Unhandled, DeoptAction::None, None));
        }

        let initialized = holder.is_some_and(|c| c.is_initialized());
        if !is_field && !initialized && !self.static_field_ok_in_clinit(&field) {
            return Ok(self.builder.uncommon_trap(
                DeoptReason::Uninitialized,
                DeoptAction::Reinterpret,
                None,
            ));
        }

        if !is_get && field.is_call_site_target() {
            return Ok(self.builder.uncommon_trap(
                DeoptReason::Unhandled,
                DeoptAction::Reinterpret,
                None,
            ));
        }

        if is_field {
            let depth = if is_get { 0 } else { field.slots() };
            let receiver = self.builder.peek(depth)?;
            let obj = self.builder.null_check(receiver);
            if self.builder.is_stopped() {
                return Ok(Status::Stopped);
            }

            if is_get {
                self.builder.pop()?;
                self.do_get(cursor, obj, &field)
            } else {
                let status = self.do_put(obj, &field, true)?;
                if status.is_stopped() {
                    return Ok(status);
                }
                self.builder.pop()?;
                Ok(Status::Continue)
            }
        } else {
            let obj = self.builder.mirror(field.holder);
            if is_get {
                self.do_get(cursor, obj, &field)
            } else {
                self.do_put(obj, &field, false)
            }
        }
    }

    /// Static fields of a class being initialized may be touched by its
    /// initializer, and by constructors, which only run after `new` made
    /// the class initialize.
    fn static_field_ok_in_clinit(&self, field: &FieldDescriptor) -> bool {
        self.provider.is_subclass_of(self.method.holder, field.holder)
            && matches!(
                self.method.kind,
                MethodKind::StaticInitializer | MethodKind::Constructor
            )
    }

    /// Read a field of the in-hand aggregate on top of the stack.
    fn get_from_aggregate(&mut self, field: &FieldDescriptor) -> TranslateResult<Status> {
        let aggregate = self.builder.pop()?;
        let bci = self.builder.bci();
        let class = self
            .builder
            .aggregate_class(aggregate)
            .ok_or(TranslateError::NotAnAggregate { bci })?;
        let info = self
            .provider
            .class(class)
            .ok_or(TranslateError::UnresolvedClass { bci })?;
        let missing = TranslateError::MissingInlineField {
            class,
            offset: field.offset,
        };

        let (index, _) = info.inline_field_at(field.offset).ok_or(missing.clone())?;
        let value = self
            .builder
            .graph()
            .node(aggregate)
            .input(index)
            .ok_or(missing)?;
        self.builder.push_node(field.basic_type, value);
        Ok(Status::Continue)
    }

    fn do_get(
        &mut self,
        cursor: &dyn BytecodeCursor,
        obj: NodeId,
        field: &FieldDescriptor,
    ) -> TranslateResult<Status> {
        let bt = field.basic_type;

        if field.is_constant() {
            let receiver = if field.is_static() {
                None
            } else {
                self.builder.graph().find_object_con(obj)
            };
            if let Some(value) = fold_constant(self.provider, field, receiver) {
                trace!(field = %field.name, ?value, "folded constant field");
                let con = self.builder.graph_mut().constant(value);
                self.builder.push_node(bt, con);
                return Ok(Status::Continue);
            }
        }

        let policy = load_policy(field, &self.config);
        let offset = field.offset as i64;

        if let Some(kind) = policy.leading {
            self.builder.membar(kind, None);
        }

        let mut must_assert_null = false;
        let ld = if field.is_flattened() {
            let class = field
                .declared_type
                .base_class()
                .ok_or(TranslateError::UnresolvedClass {
                    bci: self.builder.bci(),
                })?;
            self.builder
                .load_flattened(self.provider, obj, offset, class)?
        } else {
            let lt = load_type(self.provider, field);
            must_assert_null = lt.must_assert_null;
            let adr = self.builder.field_address(obj, offset);
            self.builder
                .load(adr, lt.ty, policy.access(access_type(field)))
        };
        self.builder.push_node(bt, ld);

        if must_assert_null {
            // Report a failed assertion at the following instruction.
            let cur = self.builder.bci();
            self.builder.set_bci(cursor.next_bci());
            let top = self.builder.peek(0)?;
            self.builder.null_assert(top);
            self.builder.set_bci(cur);
        }

        if let Some(kind) = policy.trailing {
            self.builder.membar(kind, Some(ld));
        }
        Ok(Status::Continue)
    }

    fn do_put(
        &mut self,
        obj: NodeId,
        field: &FieldDescriptor,
        is_field: bool,
    ) -> TranslateResult<Status> {
        let policy = store_policy(field, &self.config);
        let offset = field.offset as i64;
        let bt = field.basic_type;

        if let Some(kind) = policy.leading {
            self.builder.membar(kind, None);
        }

        let mut val = self.builder.pop_node(bt)?;
        if bt == BasicType::Double {
            val = self.builder.round_double(val);
        }

        let is_aggregate = self.builder.aggregate_class(val).is_some();
        if bt.is_reference() && field.is_flattenable() && !is_aggregate {
            if !self.builder.graph().ty(val).is_null() {
                return Err(TranslateError::NonNullIntoFlattenable {
                    bci: self.builder.bci(),
                });
            }
            let null = self.builder.graph_mut().const_null();
            self.builder.push(null);
            return Ok(self.builder.uncommon_trap(
                DeoptReason::InvalidAggregateNull,
                DeoptAction::None,
                None,
            ));
        }

        if field.is_flattened() {
            self.builder
                .store_flattened(self.provider, obj, offset, val)?;
        } else {
            if is_aggregate {
                val = self.builder.buffer_aggregate(self.provider, val)?;
            }
            let adr = self.builder.field_address(obj, offset);
            self.builder
                .store(adr, val, policy.access(access_type(field)));
        }

        if let Some(kind) = policy.trailing {
            self.builder.membar(kind, None);
        }

        if is_field {
            self.builder.set_flag(ParseFlags::WROTE_FIELDS);
            if field.is_volatile() {
                self.builder.set_flag(ParseFlags::WROTE_VOLATILE);
            }
            if field.is_final() {
                self.builder.set_flag(ParseFlags::WROTE_FINAL);
                if self.builder.graph().ideal_allocation(obj).is_some() {
                    self.builder.set_alloc_with_final(obj);
                }
            }
            if field.is_stable() {
                self.builder.set_flag(ParseFlags::WROTE_STABLE);
            }
        }
        Ok(Status::Continue)
    }
}
