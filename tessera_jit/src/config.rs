//! Translator configuration.
//!
//! Fixed for the lifetime of a translator. Nothing here is read from
//! global state, so translators for different methods can run side by
//! side with different settings.

/// Hard ceiling on the number of allocations an inline
/// `multianewarray` expansion may emit, whatever the configuration says.
pub const MAX_MULTI_ARRAY_EXPAND_LIMIT: u32 = 100;

/// Configuration for bytecode translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslatorConfig {
    /// The target does not guarantee that stores become visible to all
    /// other processors at once. Moves the full fence of a volatile
    /// access from after the write to before the read.
    pub not_multiple_copy_atomic: bool,
    /// Make every field access atomic, not only volatile ones.
    pub always_atomic_accesses: bool,
    /// Most allocations an inline `multianewarray` expansion may emit.
    pub multi_array_expand_limit: u32,
    /// Largest length an allocated array can have.
    pub max_array_length: i32,
}

impl TranslatorConfig {
    /// The effective expansion limit.
    #[inline]
    pub fn expand_limit(&self) -> u32 {
        self.multi_array_expand_limit
            .min(MAX_MULTI_ARRAY_EXPAND_LIMIT)
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            not_multiple_copy_atomic: false,
            always_atomic_accesses: false,
            multi_array_expand_limit: 6,
            max_array_length: i32::MAX - 8,
        }
    }
}
