//! Value type lattice for the Sea-of-Nodes IR.
//!
//! Every node carries a `ValueType`. Besides the scalar kinds, reference
//! types track three independent refinements:
//!
//! - **Nullness**: known null, known not-null, or either
//! - **Exactness**: the runtime class is exactly the static class
//! - **Constants**: a known object identity, or a known array length range
//!
//! ```text
//!                      Top
//!        /     /      |      \        \
//!      Int   Long   Float   Double    Ref(MaybeNull)
//!       |                              /        \
//!    Int[lo,hi]                  Ref(NotNull)  Ref(Null)
//!        \     \      |      /        /
//!                     Bottom
//! ```

use std::fmt;
use tessera_core::{BasicType, ClassId, ConstantValue, ObjectId, TypeRef};

// =============================================================================
// Integer Ranges
// =============================================================================

/// Inclusive range of 32-bit integer values.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntRange {
    pub lo: i32,
    pub hi: i32,
}

impl IntRange {
    pub const INT: IntRange = IntRange::new(i32::MIN, i32::MAX);
    pub const BOOL: IntRange = IntRange::new(0, 1);
    pub const BYTE: IntRange = IntRange::new(i8::MIN as i32, i8::MAX as i32);
    pub const CHAR: IntRange = IntRange::new(0, u16::MAX as i32);
    pub const SHORT: IntRange = IntRange::new(i16::MIN as i32, i16::MAX as i32);
    /// Non-negative integers.
    pub const POS: IntRange = IntRange::new(0, i32::MAX);

    pub const fn new(lo: i32, hi: i32) -> Self {
        IntRange { lo, hi }
    }

    pub const fn constant(value: i32) -> Self {
        IntRange::new(value, value)
    }

    /// The single value of this range, if it has exactly one.
    #[inline]
    pub const fn as_constant(self) -> Option<i32> {
        if self.lo == self.hi {
            Some(self.lo)
        } else {
            None
        }
    }

    /// True for the unconstrained `int` range.
    #[inline]
    pub const fn is_full(self) -> bool {
        self.lo == i32::MIN && self.hi == i32::MAX
    }

    /// Intersection of two ranges; `None` when they are disjoint.
    pub fn join(self, other: IntRange) -> Option<IntRange> {
        let lo = self.lo.max(other.lo);
        let hi = self.hi.min(other.hi);
        (lo <= hi).then_some(IntRange::new(lo, hi))
    }
}

impl fmt::Debug for IntRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_constant() {
            Some(v) => write!(f, "{}", v),
            None if self.is_full() => f.write_str("int"),
            None => write!(f, "{}..{}", self.lo, self.hi),
        }
    }
}

// =============================================================================
// Reference Types
// =============================================================================

/// What is known about a reference being null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nullness {
    Null,
    NotNull,
    MaybeNull,
}

/// Static class of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefClass {
    /// Any object; used when the declared class is not loaded.
    Any,
    Class(TypeRef),
}

/// Type of a heap reference.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefType {
    pub class: RefClass,
    pub nullness: Nullness,
    pub exact: bool,
    /// Length range, for array references.
    pub array_len: Option<IntRange>,
    /// Known object identity.
    pub constant: Option<ObjectId>,
}

impl RefType {
    /// The most general object type.
    pub const fn bottom() -> Self {
        RefType {
            class: RefClass::Any,
            nullness: Nullness::MaybeNull,
            exact: false,
            array_len: None,
            constant: None,
        }
    }

    /// The type of the null constant.
    pub const fn null() -> Self {
        RefType {
            nullness: Nullness::Null,
            ..Self::bottom()
        }
    }

    /// A possibly-null reference of a declared class.
    pub const fn of_class(ty: TypeRef) -> Self {
        RefType {
            class: RefClass::Class(ty),
            ..Self::bottom()
        }
    }

    /// A constant object of a known class.
    pub const fn constant(id: ObjectId, class: ClassId) -> Self {
        RefType {
            class: RefClass::Class(TypeRef::class(class)),
            nullness: Nullness::NotNull,
            exact: true,
            array_len: None,
            constant: Some(id),
        }
    }

    pub const fn cast_not_null(self) -> Self {
        RefType {
            nullness: Nullness::NotNull,
            ..self
        }
    }

    pub const fn cast_exact(self) -> Self {
        RefType { exact: true, ..self }
    }

    pub const fn with_array_len(self, len: IntRange) -> Self {
        RefType {
            array_len: Some(len),
            ..self
        }
    }
}

impl fmt::Debug for RefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            RefClass::Any => f.write_str("object")?,
            RefClass::Class(ty) => write!(f, "{}", ty)?,
        }
        match self.nullness {
            Nullness::Null => f.write_str(":null")?,
            Nullness::NotNull => f.write_str(":notnull")?,
            Nullness::MaybeNull => {}
        }
        if self.exact {
            f.write_str(":exact")?;
        }
        if let Some(len) = self.array_len {
            write!(f, "[{:?}]", len)?;
        }
        if let Some(id) = self.constant {
            write!(f, "=obj#{}", id.0)?;
        }
        Ok(())
    }
}

// =============================================================================
// Value Type
// =============================================================================

/// Type of an IR node's output.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// No information (top of lattice).
    Top,
    /// 32-bit integer range; sub-word types use their canonical ranges.
    Int(IntRange),
    /// 64-bit integer, with its value when constant.
    Long(Option<i64>),
    /// 32-bit float bits, when constant.
    Float(Option<u32>),
    /// 64-bit float bits, when constant.
    Double(Option<u64>),
    /// Heap reference.
    Ref(RefType),
    /// In-hand inline aggregate of the given class.
    Inline(ClassId),
    /// Untyped address into the heap.
    RawPtr,
    /// Multi-output node (calls); consumed through projections.
    Tuple,
    /// Control token.
    Control,
    /// Memory state token.
    Memory,
    /// Unreachable (bottom of lattice).
    Bottom,
}

impl ValueType {
    /// Unconstrained `int`.
    pub const INT: ValueType = ValueType::Int(IntRange::INT);

    /// Canonical type of a value with the given basic type.
    pub const fn for_basic_type(bt: BasicType) -> Self {
        match bt {
            BasicType::Boolean => ValueType::Int(IntRange::BOOL),
            BasicType::Byte => ValueType::Int(IntRange::BYTE),
            BasicType::Char => ValueType::Int(IntRange::CHAR),
            BasicType::Short => ValueType::Int(IntRange::SHORT),
            BasicType::Int => ValueType::Int(IntRange::INT),
            BasicType::Long => ValueType::Long(None),
            BasicType::Float => ValueType::Float(None),
            BasicType::Double => ValueType::Double(None),
            BasicType::Object | BasicType::Array | BasicType::InlineType => {
                ValueType::Ref(RefType::bottom())
            }
            BasicType::Void => ValueType::Top,
        }
    }

    /// Exact type of a compile-time constant.
    pub const fn for_constant(value: ConstantValue) -> Self {
        match value {
            ConstantValue::Int(v) => ValueType::Int(IntRange::constant(v)),
            ConstantValue::Long(v) => ValueType::Long(Some(v)),
            ConstantValue::Float(bits) => ValueType::Float(Some(bits)),
            ConstantValue::Double(bits) => ValueType::Double(Some(bits)),
            ConstantValue::Null => ValueType::Ref(RefType::null()),
            ConstantValue::Object { id, class } => ValueType::Ref(RefType::constant(id, class)),
        }
    }

    #[inline]
    pub const fn as_ref_type(self) -> Option<RefType> {
        match self {
            ValueType::Ref(r) => Some(r),
            _ => None,
        }
    }

    #[inline]
    pub const fn int_range(self) -> Option<IntRange> {
        match self {
            ValueType::Int(r) => Some(r),
            _ => None,
        }
    }

    /// The constant value of an `int` type.
    #[inline]
    pub const fn int_constant(self) -> Option<i32> {
        match self {
            ValueType::Int(r) => r.as_constant(),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        matches!(
            self,
            ValueType::Ref(RefType {
                nullness: Nullness::Null,
                ..
            })
        )
    }

    /// Known non-null; in-hand aggregates are never null.
    #[inline]
    pub const fn is_not_null(self) -> bool {
        matches!(
            self,
            ValueType::Ref(RefType {
                nullness: Nullness::NotNull,
                ..
            }) | ValueType::Inline(_)
        )
    }

    #[inline]
    pub const fn is_reference(self) -> bool {
        matches!(self, ValueType::Ref(_))
    }

    /// Join with not-null. Non-references are returned unchanged.
    pub const fn join_not_null(self) -> Self {
        match self {
            ValueType::Ref(r) if !matches!(r.nullness, Nullness::Null) => {
                ValueType::Ref(r.cast_not_null())
            }
            other => other,
        }
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Top => f.write_str("top"),
            ValueType::Int(r) => write!(f, "int:{:?}", r),
            ValueType::Long(Some(v)) => write!(f, "long:{}", v),
            ValueType::Long(None) => f.write_str("long"),
            ValueType::Float(Some(bits)) => write!(f, "float:{}", f32::from_bits(*bits)),
            ValueType::Float(None) => f.write_str("float"),
            ValueType::Double(Some(bits)) => write!(f, "double:{}", f64::from_bits(*bits)),
            ValueType::Double(None) => f.write_str("double"),
            ValueType::Ref(r) => write!(f, "{:?}", r),
            ValueType::Inline(id) => write!(f, "inline#{}", id.0),
            ValueType::RawPtr => f.write_str("rawptr"),
            ValueType::Tuple => f.write_str("tuple"),
            ValueType::Control => f.write_str("ctrl"),
            ValueType::Memory => f.write_str("mem"),
            ValueType::Bottom => f.write_str("bottom"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_basic_types() {
        assert_eq!(
            ValueType::for_basic_type(BasicType::Boolean),
            ValueType::Int(IntRange::BOOL)
        );
        assert_eq!(
            ValueType::for_basic_type(BasicType::Char),
            ValueType::Int(IntRange::new(0, 65535))
        );
        assert_eq!(ValueType::for_basic_type(BasicType::Int), ValueType::INT);
        assert_eq!(
            ValueType::for_basic_type(BasicType::Object),
            ValueType::Ref(RefType::bottom())
        );
    }

    #[test]
    fn test_constant_types() {
        assert_eq!(
            ValueType::for_constant(ConstantValue::Int(3)).int_constant(),
            Some(3)
        );
        assert!(ValueType::for_constant(ConstantValue::Null).is_null());
        let obj = ValueType::for_constant(ConstantValue::Object {
            id: ObjectId(4),
            class: ClassId(2),
        });
        assert!(obj.is_not_null());
        assert_eq!(obj.as_ref_type().and_then(|r| r.constant), Some(ObjectId(4)));
    }

    #[test]
    fn test_int_range_join() {
        let len = IntRange::new(-5, 10);
        assert_eq!(len.join(IntRange::POS), Some(IntRange::new(0, 10)));
        assert_eq!(IntRange::constant(-1).join(IntRange::POS), None);
        assert!(IntRange::INT.is_full());
        assert_eq!(IntRange::constant(7).as_constant(), Some(7));
    }

    #[test]
    fn test_join_not_null_keeps_null_constant() {
        let null = ValueType::Ref(RefType::null());
        assert_eq!(null.join_not_null(), null);
        let any = ValueType::Ref(RefType::bottom());
        assert!(any.join_not_null().is_not_null());
        assert_eq!(ValueType::INT.join_not_null(), ValueType::INT);
    }

    #[test]
    fn test_inline_values_are_not_null() {
        assert!(ValueType::Inline(ClassId(1)).is_not_null());
        assert!(!ValueType::Ref(RefType::bottom()).is_not_null());
    }
}
