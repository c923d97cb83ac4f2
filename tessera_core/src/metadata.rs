//! Class, field and method metadata.
//!
//! These are the resolved, compile-time views of the program that the
//! translator consults. They are plain data; the `MetadataProvider`
//! trait answers the questions that need a class hierarchy or the heap.

use crate::basic_type::BasicType;
use std::fmt;

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier of a class known to the metadata provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

/// Identifier of a heap object observed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

// =============================================================================
// Type References
// =============================================================================

/// The non-array part of a type reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Primitive(BasicType),
    Class(ClassId),
}

/// A possibly-array type: a base type wrapped in `dimensions` array levels.
///
/// `dimensions == 0` is the base type itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub base: BaseType,
    pub dimensions: u8,
}

impl TypeRef {
    /// A primitive scalar type.
    pub const fn primitive(bt: BasicType) -> Self {
        TypeRef {
            base: BaseType::Primitive(bt),
            dimensions: 0,
        }
    }

    /// A class (instance) type.
    pub const fn class(id: ClassId) -> Self {
        TypeRef {
            base: BaseType::Class(id),
            dimensions: 0,
        }
    }

    /// The array type whose elements are `self`.
    pub const fn array_of(self) -> Self {
        TypeRef {
            base: self.base,
            dimensions: self.dimensions + 1,
        }
    }

    /// The element type of an array type.
    pub const fn component(self) -> Option<Self> {
        if self.dimensions == 0 {
            None
        } else {
            Some(TypeRef {
                base: self.base,
                dimensions: self.dimensions - 1,
            })
        }
    }

    #[inline]
    pub const fn is_array(self) -> bool {
        self.dimensions > 0
    }

    /// The class at the bottom of the type, if it is not primitive.
    pub const fn base_class(self) -> Option<ClassId> {
        match self.base {
            BaseType::Class(id) => Some(id),
            BaseType::Primitive(_) => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.base {
            BaseType::Primitive(bt) => write!(f, "{}", bt)?,
            BaseType::Class(id) => write!(f, "class#{}", id.0)?,
        }
        for _ in 0..self.dimensions {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

// =============================================================================
// Fields
// =============================================================================

bitflags::bitflags! {
    /// Field attributes relevant to code generation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct FieldFlags: u8 {
        const STATIC = 0b0000_0001;
        const VOLATILE = 0b0000_0010;
        const FINAL = 0b0000_0100;
        /// Treated as constant once it holds a non-default value.
        const STABLE = 0b0000_1000;
        /// Inline aggregate stored in place; never null.
        const FLATTENED = 0b0001_0000;
        /// Eligible for in-place storage; storage decided by context.
        const FLATTENABLE = 0b0010_0000;
        /// The target of a call site; writes invalidate dependent code.
        const CALL_SITE_TARGET = 0b0100_0000;
    }
}

/// A resolved field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    /// Class declaring the field.
    pub holder: ClassId,
    /// Byte offset from the start of the holder object (or mirror for statics).
    pub offset: u32,
    /// Layout type of the stored value.
    pub basic_type: BasicType,
    /// Declared type; for references it may name a class that is not loaded.
    pub declared_type: TypeRef,
    pub flags: FieldFlags,
}

impl FieldDescriptor {
    /// Create a field with no flags set.
    pub fn new(
        name: impl Into<String>,
        holder: ClassId,
        offset: u32,
        basic_type: BasicType,
        declared_type: TypeRef,
    ) -> Self {
        FieldDescriptor {
            name: name.into(),
            holder,
            offset,
            basic_type,
            declared_type,
            flags: FieldFlags::empty(),
        }
    }

    /// Create a scalar field whose declared type is its basic type.
    pub fn scalar(name: impl Into<String>, holder: ClassId, offset: u32, bt: BasicType) -> Self {
        Self::new(name, holder, offset, bt, TypeRef::primitive(bt))
    }

    /// Builder-style flag setter.
    pub fn with_flags(mut self, flags: FieldFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(FieldFlags::STATIC)
    }

    #[inline]
    pub fn is_volatile(&self) -> bool {
        self.flags.contains(FieldFlags::VOLATILE)
    }

    #[inline]
    pub fn is_final(&self) -> bool {
        self.flags.contains(FieldFlags::FINAL)
    }

    #[inline]
    pub fn is_stable(&self) -> bool {
        self.flags.contains(FieldFlags::STABLE)
    }

    #[inline]
    pub fn is_flattened(&self) -> bool {
        self.flags.contains(FieldFlags::FLATTENED)
    }

    /// Flattened fields are always flattenable.
    #[inline]
    pub fn is_flattenable(&self) -> bool {
        self.flags
            .intersects(FieldFlags::FLATTENABLE | FieldFlags::FLATTENED)
    }

    #[inline]
    pub fn is_call_site_target(&self) -> bool {
        self.flags.contains(FieldFlags::CALL_SITE_TARGET)
    }

    /// Final or stable: a candidate for constant folding.
    #[inline]
    pub fn is_constant(&self) -> bool {
        self.flags.intersects(FieldFlags::FINAL | FieldFlags::STABLE)
    }

    /// Operand-stack slots taken by the field's value.
    #[inline]
    pub fn slots(&self) -> usize {
        self.basic_type.slots()
    }
}

// =============================================================================
// Constants
// =============================================================================

/// A value known at compile time.
///
/// Floating-point values are stored as bits so the type is `Eq + Hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstantValue {
    Int(i32),
    Long(i64),
    Float(u32),
    Double(u64),
    Null,
    Object { id: ObjectId, class: ClassId },
}

impl ConstantValue {
    pub fn float(value: f32) -> Self {
        ConstantValue::Float(value.to_bits())
    }

    pub fn double(value: f64) -> Self {
        ConstantValue::Double(value.to_bits())
    }

    /// Check if this is the zero/null value a field holds before any write.
    pub fn is_default(&self) -> bool {
        match *self {
            ConstantValue::Int(v) => v == 0,
            ConstantValue::Long(v) => v == 0,
            ConstantValue::Float(bits) => bits == 0,
            ConstantValue::Double(bits) => bits == 0,
            ConstantValue::Null => true,
            ConstantValue::Object { .. } => false,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, ConstantValue::Null)
    }
}

// =============================================================================
// Classes
// =============================================================================

/// Loading/initialization progress of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassState {
    Unloaded,
    Loaded,
    Initialized,
}

/// A class as seen by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub id: ClassId,
    pub name: String,
    pub super_class: Option<ClassId>,
    pub state: ClassState,
    /// Inline (value) class whose instances may be stored flattened.
    pub is_inline: bool,
    /// Instance fields of an inline class, in layout order.
    pub inline_fields: Vec<FieldDescriptor>,
    /// Offset of the first instance field in a heap-allocated instance.
    pub payload_offset: u32,
}

impl ClassInfo {
    pub fn new(id: ClassId, name: impl Into<String>) -> Self {
        ClassInfo {
            id,
            name: name.into(),
            super_class: None,
            state: ClassState::Initialized,
            is_inline: false,
            inline_fields: Vec::new(),
            payload_offset: 12,
        }
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.state >= ClassState::Loaded
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.state == ClassState::Initialized
    }

    /// Find the inline sub-field stored at `offset`.
    pub fn inline_field_at(&self, offset: u32) -> Option<(usize, &FieldDescriptor)> {
        self.inline_fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.offset == offset)
    }
}

// =============================================================================
// Methods
// =============================================================================

/// Kind of the method being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// The class's static initializer.
    StaticInitializer,
    /// An instance constructor.
    Constructor,
    Static,
    Instance,
}

/// The method being compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub holder: ClassId,
    pub name: String,
    pub kind: MethodKind,
}

impl MethodInfo {
    pub fn new(holder: ClassId, name: impl Into<String>, kind: MethodKind) -> Self {
        MethodInfo {
            holder,
            name: name.into(),
            kind,
        }
    }
}

// =============================================================================
// Provider
// =============================================================================

/// Source of class-hierarchy and heap facts during compilation.
pub trait MetadataProvider {
    /// Look up a class.
    fn class(&self, id: ClassId) -> Option<&ClassInfo>;

    /// Compile-time value of a final or stable field, if one is known.
    ///
    /// `receiver` is the constant receiver object for instance fields.
    fn field_constant(
        &self,
        field: &FieldDescriptor,
        receiver: Option<ObjectId>,
    ) -> Option<ConstantValue>;

    /// Value currently held by a static field, as observed at compile time.
    fn static_field_value(&self, field: &FieldDescriptor) -> Option<ConstantValue>;

    /// Check if `sub` is `sup` or one of its subclasses.
    fn is_subclass_of(&self, sub: ClassId, sup: ClassId) -> bool {
        let mut current = Some(sub);
        while let Some(id) = current {
            if id == sup {
                return true;
            }
            current = self.class(id).and_then(|c| c.super_class);
        }
        false
    }

    /// Check if a type is loaded. Primitive types always are.
    fn is_loaded(&self, ty: TypeRef) -> bool {
        match ty.base {
            BaseType::Primitive(_) => true,
            BaseType::Class(id) => self.class(id).is_some_and(ClassInfo::is_loaded),
        }
    }

    /// Check if a type is an inline class (not an array of one).
    fn is_inline(&self, ty: TypeRef) -> bool {
        match (ty.base, ty.dimensions) {
            (BaseType::Class(id), 0) => self.class(id).is_some_and(|c| c.is_inline),
            _ => false,
        }
    }
}
