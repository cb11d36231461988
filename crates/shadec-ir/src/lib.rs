//! shadec intermediate representation.
//!
//! An arena-based SSA IR for representing shader programs across pipeline
//! stages, designed to be rewritten in place by transform passes.

pub mod arena;
mod display;
mod error;
mod expr;
mod func;
mod global;
mod stmt;
mod types;

pub use arena::{Arena, Handle, Range, UniqueArena};
pub use display::{dump_module, format_type, format_type_inner};
pub use error::IrError;
pub use expr::{
    AtomicFunction, BinaryOp, DerivativeAxis, Expression, Literal, MathFunction, SwizzleComponent,
    UnaryOp, expression_operands,
};
pub use func::{
    EntryPoint, Function, FunctionArgument, FunctionResult, LocalVariable, ShaderStage,
};
pub use global::{AddressSpace, Binding, BuiltIn, GlobalVariable, ResourceBinding, StorageAccess};
pub use stmt::{Barrier, Block, Statement};
pub use types::{
    ArraySize, Bytes, ImageClass, ImageDimension, Scalar, ScalarKind, StorageFormat, StructMember,
    Type, TypeInner, VectorSize,
};

/// A shader IR module.
#[derive(Clone, Debug, Default)]
pub struct Module {
    /// Deduplicated type arena.
    pub types: UniqueArena<Type>,
    /// Module-scope variables.
    pub global_variables: Arena<GlobalVariable>,
    /// Module-scope constant expressions.
    pub global_expressions: Arena<Expression>,
    /// Helper (non-entry-point) functions.
    pub functions: Arena<Function>,
    /// Pipeline entry points.
    pub entry_points: Vec<EntryPoint>,
}

impl Module {
    /// Resolves the address space a pointer-typed expression writes
    /// through, walking access chains down to their root variable or
    /// pointer-typed argument.
    pub fn pointer_space(
        &self,
        function: &Function,
        pointer: Handle<Expression>,
    ) -> Result<AddressSpace, IrError> {
        pointer_space(
            &function.arguments,
            &function.expressions,
            &self.global_variables,
            &self.types,
            pointer,
        )
    }
}

/// Resolves the address space behind a pointer expression.
///
/// Split-borrow variant of [`Module::pointer_space`] for callers that
/// hold the module's pieces separately while mutating a function.
pub fn pointer_space(
    arguments: &[FunctionArgument],
    expressions: &Arena<Expression>,
    global_variables: &Arena<GlobalVariable>,
    types: &UniqueArena<Type>,
    pointer: Handle<Expression>,
) -> Result<AddressSpace, IrError> {
    let expr = expressions.try_get(pointer).ok_or(IrError::BadHandle {
        index: pointer.index(),
        size: expressions.len(),
    })?;
    match *expr {
        Expression::GlobalVariable(var) => {
            let var = global_variables.try_get(var).ok_or(IrError::BadHandle {
                index: var.index(),
                size: global_variables.len(),
            })?;
            Ok(var.space)
        }
        Expression::LocalVariable(_) => Ok(AddressSpace::Function),
        Expression::FunctionArgument(index) => {
            let arg = arguments
                .get(index as usize)
                .ok_or(IrError::ArgumentNotAPointer { index })?;
            let ty = types.try_get(arg.ty).ok_or(IrError::BadHandle {
                index: arg.ty.index(),
                size: types.len(),
            })?;
            match ty.inner {
                TypeInner::Pointer { space, .. } => Ok(space),
                _ => Err(IrError::ArgumentNotAPointer { index }),
            }
        }
        Expression::Access { base, .. } | Expression::AccessIndex { base, .. } => {
            pointer_space(arguments, expressions, global_variables, types, base)
        }
        _ => Err(IrError::NotAPointer {
            index: pointer.index(),
        }),
    }
}
