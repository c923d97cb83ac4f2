//! Basic (layout) types.
//!
//! The discriminants follow the `newarray` type codes for the primitive
//! types so that an array-type operand converts with a single lookup.

use std::fmt;

/// Layout type of a field, array element or operand-stack value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BasicType {
    Boolean = 4,
    Char = 5,
    Float = 6,
    Double = 7,
    Byte = 8,
    Short = 9,
    Int = 10,
    Long = 11,
    /// Reference to an instance.
    Object = 12,
    /// Reference to an array.
    Array = 13,
    /// Inline aggregate (value class) stored or passed by value.
    InlineType = 14,
    Void = 15,
}

impl BasicType {
    /// Number of operand-stack slots a value of this type occupies.
    #[inline]
    pub const fn slots(self) -> usize {
        match self {
            BasicType::Long | BasicType::Double => 2,
            BasicType::Void => 0,
            _ => 1,
        }
    }

    /// Check if this is a double-width (category-2) type.
    #[inline]
    pub const fn is_category2(self) -> bool {
        self.slots() == 2
    }

    /// Check if values of this type are heap references.
    #[inline]
    pub const fn is_reference(self) -> bool {
        matches!(
            self,
            BasicType::Object | BasicType::Array | BasicType::InlineType
        )
    }

    /// Check if this type is carried as an `int` on the operand stack.
    #[inline]
    pub const fn is_int_like(self) -> bool {
        matches!(
            self,
            BasicType::Boolean
                | BasicType::Char
                | BasicType::Byte
                | BasicType::Short
                | BasicType::Int
        )
    }

    /// Check if this is a primitive (non-reference, non-void) type.
    #[inline]
    pub const fn is_primitive(self) -> bool {
        !self.is_reference() && !matches!(self, BasicType::Void)
    }

    /// Size in bytes of an array element of this type.
    pub const fn element_size(self) -> u32 {
        match self {
            BasicType::Boolean | BasicType::Byte => 1,
            BasicType::Char | BasicType::Short => 2,
            BasicType::Int | BasicType::Float => 4,
            BasicType::Long | BasicType::Double => 8,
            BasicType::Object | BasicType::Array | BasicType::InlineType => 4,
            BasicType::Void => 0,
        }
    }

    /// Decode the operand of a `newarray` instruction.
    pub const fn from_array_type_code(code: u8) -> Option<Self> {
        Some(match code {
            4 => BasicType::Boolean,
            5 => BasicType::Char,
            6 => BasicType::Float,
            7 => BasicType::Double,
            8 => BasicType::Byte,
            9 => BasicType::Short,
            10 => BasicType::Int,
            11 => BasicType::Long,
            _ => return None,
        })
    }

    /// Short lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            BasicType::Boolean => "boolean",
            BasicType::Char => "char",
            BasicType::Float => "float",
            BasicType::Double => "double",
            BasicType::Byte => "byte",
            BasicType::Short => "short",
            BasicType::Int => "int",
            BasicType::Long => "long",
            BasicType::Object => "object",
            BasicType::Array => "array",
            BasicType::InlineType => "inline",
            BasicType::Void => "void",
        }
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots() {
        assert_eq!(BasicType::Int.slots(), 1);
        assert_eq!(BasicType::Object.slots(), 1);
        assert_eq!(BasicType::Long.slots(), 2);
        assert_eq!(BasicType::Double.slots(), 2);
        assert_eq!(BasicType::Void.slots(), 0);
        assert!(BasicType::Double.is_category2());
        assert!(!BasicType::Float.is_category2());
    }

    #[test]
    fn test_array_type_codes() {
        assert_eq!(BasicType::from_array_type_code(10), Some(BasicType::Int));
        assert_eq!(BasicType::from_array_type_code(4), Some(BasicType::Boolean));
        assert_eq!(BasicType::from_array_type_code(12), None);
        assert_eq!(BasicType::from_array_type_code(3), None);
    }

    #[test]
    fn test_reference_classification() {
        assert!(BasicType::InlineType.is_reference());
        assert!(BasicType::Array.is_reference());
        assert!(!BasicType::Long.is_reference());
        assert!(BasicType::Char.is_int_like());
        assert!(!BasicType::Long.is_int_like());
    }
}
