//! Error types for the shadec IR.

/// Errors that can occur when inspecting or constructing IR.
#[derive(Debug, thiserror::Error)]
pub enum IrError {
    /// A handle index is out of bounds for its arena.
    #[error("handle index {index} out of bounds (arena size: {size})")]
    BadHandle { index: usize, size: usize },

    /// An expression was used as a store destination but does not
    /// resolve to a pointer.
    #[error("expression [{index}] does not resolve to a pointer")]
    NotAPointer { index: usize },

    /// A function argument was expected to be pointer-typed.
    #[error("argument {index} is not pointer-typed")]
    ArgumentNotAPointer { index: u32 },
}
