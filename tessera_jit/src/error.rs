//! Translation errors.
//!
//! A deoptimization trap is not an error: it is an ordinary outcome
//! reported as [`Status::Stopped`](crate::ir::builder::Status). The
//! variants here are invariant violations that abort compilation of the
//! whole method; the driver then keeps running it interpreted.

use tessera_core::ClassId;
use thiserror::Error;

/// A violated translator invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("field at bci {bci} is unresolved although marked linkable")]
    UnresolvedField { bci: u32 },

    #[error("class operand at bci {bci} is unresolved although marked linkable")]
    UnresolvedClass { bci: u32 },

    #[error("operand stack underflow at bci {bci}")]
    StackUnderflow { bci: u32 },

    #[error("value at bci {bci} is not an in-hand inline aggregate")]
    NotAnAggregate { bci: u32 },

    #[error("write to a field of an in-hand inline aggregate at bci {bci}")]
    UnsupportedAggregateWrite { bci: u32 },

    #[error("inline class #{} has no field at offset {offset}", class.0)]
    MissingInlineField { class: ClassId, offset: u32 },

    #[error("non-constant outer length reached inline array expansion at bci {bci}")]
    NonConstantExpansion { bci: u32 },

    #[error("multianewarray at bci {bci} has {dimensions} dimensions for its array type")]
    InvalidDimensions { bci: u32, dimensions: u8 },

    #[error("non-null value that is not an aggregate stored to flattenable field at bci {bci}")]
    NonNullIntoFlattenable { bci: u32 },
}

pub type TranslateResult<T> = Result<T, TranslateError>;
