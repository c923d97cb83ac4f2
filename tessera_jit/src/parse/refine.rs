//! Type refinement for loaded and allocated values.
//!
//! Computes the most precise type the graph can carry for a value, given
//! field and array metadata and whatever values are known at compile time.

use crate::ir::builder::objects::declared_value_type;
use crate::ir::types::{IntRange, RefType, ValueType};
use tessera_core::{BasicType, ConstantValue, FieldDescriptor, MetadataProvider, ObjectId, TypeRef};

/// Type of a field load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadType {
    pub ty: ValueType,
    /// The declared class is not loaded, so the value can only be null.
    /// A null assertion must follow the load.
    pub must_assert_null: bool,
}

/// Value to fold a final or stable field read into, if any.
///
/// A reference field is folded only when its declared class is loaded.
/// A stable field holding its default value is not folded, since it may
/// still be written.
pub fn fold_constant<P: MetadataProvider + ?Sized>(
    provider: &P,
    field: &FieldDescriptor,
    receiver: Option<ObjectId>,
) -> Option<ConstantValue> {
    if !field.is_constant() {
        return None;
    }
    if field.basic_type.is_reference() && !provider.is_loaded(field.declared_type) {
        return None;
    }
    let value = provider.field_constant(field, receiver)?;
    if field.is_stable() && value.is_default() {
        return None;
    }
    Some(value)
}

/// Type of a value read from a non-flattened field.
pub fn load_type<P: MetadataProvider + ?Sized>(provider: &P, field: &FieldDescriptor) -> LoadType {
    let bt = field.basic_type;
    if !bt.is_reference() {
        return LoadType {
            ty: ValueType::for_basic_type(bt),
            must_assert_null: false,
        };
    }

    if !provider.is_loaded(field.declared_type) {
        return LoadType {
            ty: ValueType::Ref(RefType::bottom()),
            must_assert_null: true,
        };
    }

    let ty = if let Some(value) = static_constant(provider, field) {
        ValueType::for_constant(value)
    } else {
        let declared = declared_value_type(provider, field);
        if bt == BasicType::InlineType && field.is_static() && holds_non_null(provider, field) {
            declared.join_not_null()
        } else {
            declared
        }
    };
    LoadType {
        ty,
        must_assert_null: false,
    }
}

/// Value of a static final field known at compile time.
fn static_constant<P: MetadataProvider + ?Sized>(
    provider: &P,
    field: &FieldDescriptor,
) -> Option<ConstantValue> {
    if field.is_static() && field.is_final() {
        provider.field_constant(field, None)
    } else {
        None
    }
}

fn holds_non_null<P: MetadataProvider + ?Sized>(provider: &P, field: &FieldDescriptor) -> bool {
    provider
        .static_field_value(field)
        .is_some_and(|v| !v.is_null())
}

/// Layout type used to access a non-flattened field.
///
/// A non-flattenable inline field holds a plain, possibly null, reference.
pub fn access_type(field: &FieldDescriptor) -> BasicType {
    match field.basic_type {
        BasicType::InlineType if !field.is_flattenable() => BasicType::Object,
        bt => bt,
    }
}

/// Type of the array returned by a multi-dimensional allocation helper.
///
/// Not null and exact. The outer length is narrowed when its range is
/// known; inner arrays are left alone because the outer array stays
/// mutable.
pub fn multi_array_type(
    array_type: TypeRef,
    outer_length: Option<IntRange>,
    max_length: i32,
) -> ValueType {
    let mut ty = RefType::of_class(array_type).cast_not_null().cast_exact();
    let known = outer_length
        .filter(|r| !r.is_full())
        .and_then(|r| r.join(IntRange::new(0, max_length)));
    if let Some(len) = known {
        ty = ty.with_array_len(len);
    }
    ValueType::Ref(ty)
}
