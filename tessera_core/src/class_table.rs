//! In-memory metadata provider.
//!
//! Holds classes and the compile-time values of fields. Drivers that
//! already have the whole picture (and tests) use this instead of a
//! live runtime.

use crate::metadata::{
    ClassId, ClassInfo, ConstantValue, FieldDescriptor, MetadataProvider, ObjectId,
};
use rustc_hash::FxHashMap;

/// Key for a field value: holder, offset and (for instance fields) receiver.
type FieldKey = (ClassId, u32, Option<ObjectId>);

/// A table of classes and observed field values.
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    classes: FxHashMap<ClassId, ClassInfo>,
    field_values: FxHashMap<FieldKey, ConstantValue>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class, replacing any previous entry with the same id.
    pub fn insert(&mut self, class: ClassInfo) {
        self.classes.insert(class.id, class);
    }

    /// Mutable access for adjusting state after registration.
    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassInfo> {
        self.classes.get_mut(&id)
    }

    /// Record the value of a static field.
    pub fn set_static_value(&mut self, field: &FieldDescriptor, value: ConstantValue) {
        self.field_values
            .insert((field.holder, field.offset, None), value);
    }

    /// Record the value of an instance field of a known object.
    pub fn set_instance_value(
        &mut self,
        field: &FieldDescriptor,
        receiver: ObjectId,
        value: ConstantValue,
    ) {
        self.field_values
            .insert((field.holder, field.offset, Some(receiver)), value);
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl MetadataProvider for ClassTable {
    fn class(&self, id: ClassId) -> Option<&ClassInfo> {
        self.classes.get(&id)
    }

    fn field_constant(
        &self,
        field: &FieldDescriptor,
        receiver: Option<ObjectId>,
    ) -> Option<ConstantValue> {
        if !field.is_constant() {
            return None;
        }
        let key = if field.is_static() {
            (field.holder, field.offset, None)
        } else {
            (field.holder, field.offset, Some(receiver?))
        };
        self.field_values.get(&key).copied()
    }

    fn static_field_value(&self, field: &FieldDescriptor) -> Option<ConstantValue> {
        if !field.is_static() {
            return None;
        }
        self.field_values
            .get(&(field.holder, field.offset, None))
            .copied()
    }
}
