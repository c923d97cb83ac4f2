//! Sea-of-nodes front end for the tessera JIT.
//!
//! Lowers field accesses (`getfield`, `putfield`, `getstatic`,
//! `putstatic`) and array allocations (`newarray`, `anewarray`,
//! `multianewarray`) into an IR graph:
//! - Memory ordering and fences for volatile and reference accesses
//! - Type refinement from field metadata and compile-time constants
//! - Deoptimization traps in place of unsupported or unsafe paths
//! - Inline expansion of small multi-dimensional allocations
pub mod config;
pub mod error;
pub mod ir;
pub mod parse;

pub use config::{TranslatorConfig, MAX_MULTI_ARRAY_EXPAND_LIMIT};
pub use error::{TranslateError, TranslateResult};
pub use ir::{Graph, GraphBuilder, Status};
pub use parse::Translator;
