//! Display implementations and text dump for debugging.

use std::fmt;

use crate::Module;
use crate::arena::{Handle, UniqueArena};
use crate::expr::{
    AtomicFunction, BinaryOp, DerivativeAxis, Expression, Literal, MathFunction, SwizzleComponent,
    UnaryOp,
};
use crate::func::ShaderStage;
use crate::global::{AddressSpace, Binding, BuiltIn, ResourceBinding, StorageAccess};
use crate::stmt::{Barrier, Statement};
use crate::types::{
    ArraySize, ImageClass, ImageDimension, Scalar, ScalarKind, StorageFormat, Type, TypeInner,
    VectorSize,
};

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Sint => write!(f, "sint"),
            Self::Uint => write!(f, "uint"),
            Self::Float => write!(f, "float"),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ScalarKind::Bool => write!(f, "bool"),
            ScalarKind::Sint => write!(f, "i{}", self.width * 8),
            ScalarKind::Uint => write!(f, "u{}", self.width * 8),
            ScalarKind::Float => write!(f, "f{}", self.width * 8),
        }
    }
}

impl fmt::Display for VectorSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u32)
    }
}

impl fmt::Display for StorageAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let has_load = self.contains(StorageAccess::LOAD);
        let has_store = self.contains(StorageAccess::STORE);
        match (has_load, has_store) {
            (true, true) => write!(f, "read_write"),
            (true, false) => write!(f, "read"),
            (false, true) => write!(f, "write"),
            (false, false) => write!(f, "none"),
        }
    }
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function => write!(f, "function"),
            Self::Private => write!(f, "private"),
            Self::Workgroup => write!(f, "workgroup"),
            Self::Uniform => write!(f, "uniform"),
            Self::Storage { access } => write!(f, "storage, {access}"),
            Self::Handle => write!(f, "handle"),
        }
    }
}

impl fmt::Display for BuiltIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position => write!(f, "position"),
            Self::FrontFacing => write!(f, "front_facing"),
            Self::FragDepth => write!(f, "frag_depth"),
            Self::SampleIndex => write!(f, "sample_index"),
            Self::SampleMask => write!(f, "sample_mask"),
            Self::GlobalInvocationId => write!(f, "global_invocation_id"),
            Self::LocalInvocationId => write!(f, "local_invocation_id"),
            Self::LocalInvocationIndex => write!(f, "local_invocation_index"),
            Self::WorkgroupId => write!(f, "workgroup_id"),
            Self::NumWorkgroups => write!(f, "num_workgroups"),
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuiltIn(b) => write!(f, "@builtin({b})"),
            Self::Location { location } => write!(f, "@location({location})"),
        }
    }
}

impl fmt::Display for ResourceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@group({}) @binding({})", self.group, self.binding)
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
            Self::Compute => write!(f, "compute"),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}i"),
            Self::U32(v) => write!(f, "{v}u"),
            Self::F32(v) => write!(f, "{v}f"),
            Self::F64(v) => write!(f, "{v}lf"),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negate => write!(f, "-"),
            Self::LogicalNot => write!(f, "!"),
            Self::BitwiseNot => write!(f, "~"),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "+"),
            Self::Subtract => write!(f, "-"),
            Self::Multiply => write!(f, "*"),
            Self::Divide => write!(f, "/"),
            Self::Modulo => write!(f, "%"),
            Self::Equal => write!(f, "=="),
            Self::NotEqual => write!(f, "!="),
            Self::Less => write!(f, "<"),
            Self::LessEqual => write!(f, "<="),
            Self::Greater => write!(f, ">"),
            Self::GreaterEqual => write!(f, ">="),
            Self::LogicalAnd => write!(f, "&&"),
            Self::LogicalOr => write!(f, "||"),
            Self::BitwiseAnd => write!(f, "&"),
            Self::BitwiseOr => write!(f, "|"),
            Self::BitwiseXor => write!(f, "^"),
            Self::ShiftLeft => write!(f, "<<"),
            Self::ShiftRight => write!(f, ">>"),
        }
    }
}

impl fmt::Display for MathFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Abs => "abs",
            Self::Min => "min",
            Self::Max => "max",
            Self::Clamp => "clamp",
            Self::Saturate => "saturate",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Round => "round",
            Self::Fract => "fract",
            Self::Trunc => "trunc",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Atan2 => "atan2",
            Self::Sqrt => "sqrt",
            Self::InverseSqrt => "inverseSqrt",
            Self::Log => "log",
            Self::Log2 => "log2",
            Self::Exp => "exp",
            Self::Exp2 => "exp2",
            Self::Pow => "pow",
            Self::Dot => "dot",
            Self::Cross => "cross",
            Self::Normalize => "normalize",
            Self::Length => "length",
            Self::Distance => "distance",
            Self::Mix => "mix",
            Self::Step => "step",
            Self::SmoothStep => "smoothStep",
            Self::Fma => "fma",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for DerivativeAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "dpdx"),
            Self::Y => write!(f, "dpdy"),
            Self::Width => write!(f, "fwidth"),
        }
    }
}

impl fmt::Display for Barrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = self.contains(Barrier::STORAGE);
        let workgroup = self.contains(Barrier::WORKGROUP);
        match (storage, workgroup) {
            (true, true) => write!(f, "storageBarrier | workgroupBarrier"),
            (true, false) => write!(f, "storageBarrier"),
            (false, true) => write!(f, "workgroupBarrier"),
            (false, false) => write!(f, "<no barrier>"),
        }
    }
}

impl fmt::Display for SwizzleComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "x"),
            Self::Y => write!(f, "y"),
            Self::Z => write!(f, "z"),
            Self::W => write!(f, "w"),
        }
    }
}

impl fmt::Display for AtomicFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "atomicAdd"),
            Self::Subtract => write!(f, "atomicSub"),
            Self::And => write!(f, "atomicAnd"),
            Self::ExclusiveOr => write!(f, "atomicXor"),
            Self::InclusiveOr => write!(f, "atomicOr"),
            Self::Min => write!(f, "atomicMin"),
            Self::Max => write!(f, "atomicMax"),
            Self::Exchange { compare: None } => write!(f, "atomicExchange"),
            Self::Exchange { compare: Some(c) } => write!(f, "atomicCompareExchange({c:?})"),
        }
    }
}

fn format_image_dim(dim: ImageDimension) -> &'static str {
    match dim {
        ImageDimension::D1 => "1d",
        ImageDimension::D2 => "2d",
        ImageDimension::D3 => "3d",
        ImageDimension::Cube => "cube",
    }
}

fn format_storage_format(format: StorageFormat) -> &'static str {
    match format {
        StorageFormat::R32Uint => "r32uint",
        StorageFormat::R32Sint => "r32sint",
        StorageFormat::R32Float => "r32float",
        StorageFormat::Rg32Float => "rg32float",
        StorageFormat::Rgba8Unorm => "rgba8unorm",
        StorageFormat::Rgba16Float => "rgba16float",
        StorageFormat::Rgba32Float => "rgba32float",
    }
}

/// Formats a type using the type arena for resolving inner references.
pub fn format_type(ty: &Type, types: &UniqueArena<Type>) -> String {
    if let Some(ref name) = ty.name {
        return name.clone();
    }
    format_type_inner(&ty.inner, types)
}

/// Formats a [`TypeInner`] using the type arena for resolving references.
pub fn format_type_inner(inner: &TypeInner, types: &UniqueArena<Type>) -> String {
    match inner {
        TypeInner::Scalar(s) => format!("{s}"),
        TypeInner::Vector { size, scalar } => format!("vec{size}<{scalar}>"),
        TypeInner::Matrix {
            columns,
            rows,
            scalar,
        } => format!("mat{columns}x{rows}<{scalar}>"),
        TypeInner::Atomic(s) => format!("atomic<{s}>"),
        TypeInner::Pointer { base, space } => {
            let base_str = format_type(&types[*base], types);
            format!("ptr<{space}, {base_str}>")
        }
        TypeInner::Array { base, size, stride } => {
            let base_str = format_type(&types[*base], types);
            match size {
                ArraySize::Constant(n) => format!("array<{base_str}, {n}> /*stride {stride}*/"),
                ArraySize::Dynamic => format!("array<{base_str}> /*stride {stride}*/"),
            }
        }
        TypeInner::Struct { members, span } => {
            format!("struct({} members, span {span})", members.len())
        }
        TypeInner::Image {
            dim,
            arrayed,
            class,
        } => {
            let arrayed_str = if *arrayed { "_array" } else { "" };
            let dim_str = format_image_dim(*dim);
            match class {
                ImageClass::Sampled { kind, multi } => {
                    let multi_str = if *multi { "multisampled_" } else { "" };
                    format!("texture_{multi_str}{dim_str}{arrayed_str}<{kind}>")
                }
                ImageClass::Depth => format!("texture_depth_{dim_str}{arrayed_str}"),
                ImageClass::Storage { format, access } => {
                    format!(
                        "texture_storage_{dim_str}{arrayed_str}<{}, {access}>",
                        format_storage_format(*format)
                    )
                }
            }
        }
        TypeInner::Sampler { comparison } => {
            if *comparison {
                "sampler_comparison".into()
            } else {
                "sampler".into()
            }
        }
    }
}

fn format_expr(handle: Handle<Expression>, exprs: &crate::Arena<Expression>) -> String {
    match &exprs[handle] {
        Expression::Literal(lit) => format!("{lit}"),
        Expression::Compose { ty, components } => {
            let args: Vec<_> = components.iter().map(|h| format!("{h:?}")).collect();
            format!("Compose({ty:?}, [{}])", args.join(", "))
        }
        Expression::FunctionArgument(i) => format!("FunctionArgument({i})"),
        Expression::GlobalVariable(h) => format!("GlobalVariable({h:?})"),
        Expression::LocalVariable(h) => format!("LocalVariable({h:?})"),
        Expression::Load { pointer } => format!("Load({pointer:?})"),
        Expression::Access { base, index } => format!("Access({base:?}, {index:?})"),
        Expression::AccessIndex { base, index } => format!("AccessIndex({base:?}, {index})"),
        Expression::Swizzle {
            size,
            vector,
            pattern,
        } => {
            let n = *size as usize;
            let comps: Vec<_> = pattern[..n].iter().map(|c| format!("{c}")).collect();
            format!("Swizzle({vector:?}).{}", comps.join(""))
        }
        Expression::Splat { size, value } => format!("Splat({value:?}, vec{size})"),
        Expression::Unary { op, expr } => format!("{op}{expr:?}"),
        Expression::Binary { op, left, right } => format!("{left:?} {op} {right:?}"),
        Expression::Select {
            condition,
            accept,
            reject,
        } => format!("Select({condition:?}, {accept:?}, {reject:?})"),
        Expression::Math {
            fun,
            arg,
            arg1,
            arg2,
        } => {
            let mut args = format!("{arg:?}");
            if let Some(a1) = arg1 {
                args += &format!(", {a1:?}");
            }
            if let Some(a2) = arg2 {
                args += &format!(", {a2:?}");
            }
            format!("{fun}({args})")
        }
        Expression::ImageSample {
            image,
            sampler,
            coordinate,
        } => format!("textureSample({image:?}, {sampler:?}, {coordinate:?})"),
        Expression::ImageLoad { image, coordinate } => {
            format!("textureLoad({image:?}, {coordinate:?})")
        }
        Expression::Derivative { axis, expr } => format!("{axis}({expr:?})"),
        Expression::As {
            expr,
            kind,
            convert,
        } => match convert {
            Some(w) => format!("As({expr:?} -> {kind}/{w})"),
            None => format!("Bitcast({expr:?} -> {kind})"),
        },
        Expression::ArrayLength(expr) => format!("ArrayLength({expr:?})"),
        Expression::CallResult(f) => format!("CallResult({f:?})"),
        Expression::AtomicResult { ty, comparison } => {
            format!("AtomicResult({ty:?}, cmp={comparison})")
        }
        Expression::ZeroValue(ty) => format!("ZeroValue({ty:?})"),
    }
}

fn write_stmt(out: &mut String, stmt: &Statement, indent: usize) {
    let pad = " ".repeat(indent);
    match stmt {
        Statement::Emit(range) => {
            out.push_str(&format!("{pad}Emit({range:?})\n"));
        }
        Statement::Store { pointer, value } => {
            out.push_str(&format!("{pad}Store {pointer:?} = {value:?}\n"));
        }
        Statement::ImageStore {
            image,
            coordinate,
            value,
        } => {
            out.push_str(&format!(
                "{pad}ImageStore {image:?}[{coordinate:?}] = {value:?}\n"
            ));
        }
        Statement::If {
            condition,
            accept,
            reject,
        } => {
            out.push_str(&format!("{pad}If ({condition:?}) {{\n"));
            for s in accept {
                write_stmt(out, s, indent + 4);
            }
            if !reject.is_empty() {
                out.push_str(&format!("{pad}}} else {{\n"));
                for s in reject {
                    write_stmt(out, s, indent + 4);
                }
            }
            out.push_str(&format!("{pad}}}\n"));
        }
        Statement::Loop {
            body,
            continuing,
            break_if,
        } => {
            out.push_str(&format!("{pad}Loop {{\n"));
            for s in body {
                write_stmt(out, s, indent + 4);
            }
            if !continuing.is_empty() {
                out.push_str(&format!("{pad}  Continuing {{\n"));
                for s in continuing {
                    write_stmt(out, s, indent + 8);
                }
                if let Some(brk) = break_if {
                    out.push_str(&format!("{pad}    BreakIf({brk:?})\n"));
                }
                out.push_str(&format!("{pad}  }}\n"));
            }
            out.push_str(&format!("{pad}}}\n"));
        }
        Statement::Call {
            function,
            arguments,
            result,
        } => {
            let args: Vec<_> = arguments.iter().map(|h| format!("{h:?}")).collect();
            let res = match result {
                Some(r) => format!(" -> {r:?}"),
                None => String::new(),
            };
            out.push_str(&format!(
                "{pad}Call {function:?}({}){res}\n",
                args.join(", ")
            ));
        }
        Statement::Atomic {
            pointer,
            fun,
            value,
            result,
        } => {
            let res = match result {
                Some(r) => format!(" -> {r:?}"),
                None => String::new(),
            };
            out.push_str(&format!("{pad}{fun}({pointer:?}, {value:?}){res}\n"));
        }
        Statement::Break => {
            out.push_str(&format!("{pad}Break\n"));
        }
        Statement::Continue => {
            out.push_str(&format!("{pad}Continue\n"));
        }
        Statement::Return { value } => match value {
            Some(v) => out.push_str(&format!("{pad}Return {v:?}\n")),
            None => out.push_str(&format!("{pad}Return\n")),
        },
        Statement::Kill => {
            out.push_str(&format!("{pad}Kill\n"));
        }
        Statement::TerminateInvocation => {
            out.push_str(&format!("{pad}TerminateInvocation\n"));
        }
        Statement::Barrier(b) => {
            out.push_str(&format!("{pad}Barrier({b})\n"));
        }
    }
}

/// Produces a human-readable text dump of a [`Module`] for debugging.
pub fn dump_module(module: &Module) -> String {
    let mut out = String::new();

    // Types
    out.push_str("Types:\n");
    for (handle, ty) in module.types.iter() {
        let formatted = format_type(ty, &module.types);
        out.push_str(&format!("  {handle:?} {formatted}\n"));
    }

    // Global variables
    if !module.global_variables.is_empty() {
        out.push_str("\nGlobal Variables:\n");
        for (handle, var) in module.global_variables.iter() {
            let name = var.name.as_deref().unwrap_or("_");
            let ty_str = format_type(&module.types[var.ty], &module.types);
            let binding_str = match &var.binding {
                Some(b) => format!("{b} "),
                None => String::new(),
            };
            let init_str = match var.init {
                Some(h) => format!(" = {}", format_expr(h, &module.global_expressions)),
                None => String::new(),
            };
            out.push_str(&format!(
                "  {handle:?} {binding_str}var<{}>  {name}: {ty_str}{init_str}\n",
                var.space
            ));
        }
    }

    // Global expressions
    if !module.global_expressions.is_empty() {
        out.push_str("\nGlobal Expressions:\n");
        for (handle, _) in module.global_expressions.iter() {
            let formatted = format_expr(handle, &module.global_expressions);
            out.push_str(&format!("  {handle:?} {formatted}\n"));
        }
    }

    // Helper functions
    if !module.functions.is_empty() {
        out.push_str("\nFunctions:\n");
        for (handle, func) in module.functions.iter() {
            dump_function(&mut out, &format!("{handle:?}"), func, &module.types);
        }
    }

    // Entry points
    if !module.entry_points.is_empty() {
        out.push_str("\nEntry Points:\n");
        for ep in &module.entry_points {
            match ep.stage {
                ShaderStage::Compute => {
                    let [x, y, z] = ep.workgroup_size;
                    out.push_str(&format!("  @compute @workgroup_size({x}, {y}, {z})\n"));
                }
                stage => {
                    out.push_str(&format!("  @{stage}\n"));
                }
            }
            dump_function(&mut out, &ep.name, &ep.function, &module.types);
        }
    }

    out
}

fn dump_function(out: &mut String, label: &str, func: &crate::Function, types: &UniqueArena<Type>) {
    let name = func.name.as_deref().unwrap_or("_");

    // Signature
    let args: Vec<_> = func
        .arguments
        .iter()
        .map(|arg| {
            let arg_name = arg.name.as_deref().unwrap_or("_");
            let ty_str = format_type(&types[arg.ty], types);
            let binding = match &arg.binding {
                Some(b) => format!("{b} "),
                None => String::new(),
            };
            format!("{binding}{arg_name}: {ty_str}")
        })
        .collect();
    let ret = match &func.result {
        Some(r) => format!(" -> {}", format_type(&types[r.ty], types)),
        None => String::new(),
    };
    out.push_str(&format!(
        "  fn {name}({})  [{label}]{ret} {{\n",
        args.join(", ")
    ));

    // Local variables
    for (handle, var) in func.local_variables.iter() {
        let var_name = var.name.as_deref().unwrap_or("_");
        let ty_str = format_type(&types[var.ty], types);
        let init = match var.init {
            Some(h) => format!(" = {}", format_expr(h, &func.expressions)),
            None => String::new(),
        };
        out.push_str(&format!("    var {handle:?} {var_name}: {ty_str}{init}\n"));
    }

    // Expressions
    if !func.expressions.is_empty() {
        out.push_str("    Expressions:\n");
        for (handle, _) in func.expressions.iter() {
            let formatted = format_expr(handle, &func.expressions);
            out.push_str(&format!("      {handle:?} {formatted}\n"));
        }
    }

    // Body
    if !func.body.is_empty() {
        out.push_str("    Body:\n");
        for stmt in &func.body {
            write_stmt(out, stmt, 6);
        }
    }

    out.push_str("  }\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_scalar() {
        assert_eq!(format!("{}", Scalar::F32), "f32");
        assert_eq!(format!("{}", Scalar::I32), "i32");
        assert_eq!(format!("{}", Scalar::U32), "u32");
        assert_eq!(format!("{}", Scalar::BOOL), "bool");
    }

    #[test]
    fn display_address_space() {
        assert_eq!(format!("{}", AddressSpace::Private), "private");
        assert_eq!(format!("{}", AddressSpace::Handle), "handle");
        assert_eq!(
            format!(
                "{}",
                AddressSpace::Storage {
                    access: StorageAccess::LOAD | StorageAccess::STORE
                }
            ),
            "storage, read_write"
        );
    }

    #[test]
    fn display_stage() {
        assert_eq!(format!("{}", ShaderStage::Fragment), "fragment");
        assert_eq!(format!("{}", ShaderStage::Compute), "compute");
    }

    #[test]
    fn display_builtin() {
        let b = Binding::BuiltIn(BuiltIn::FrontFacing);
        assert_eq!(format!("{b}"), "@builtin(front_facing)");
    }

    #[test]
    fn display_image_types() {
        let types = UniqueArena::new();
        let sampled = TypeInner::Image {
            dim: ImageDimension::D2,
            arrayed: false,
            class: ImageClass::Sampled {
                kind: ScalarKind::Float,
                multi: false,
            },
        };
        assert_eq!(format_type_inner(&sampled, &types), "texture_2d<float>");

        let storage = TypeInner::Image {
            dim: ImageDimension::D2,
            arrayed: false,
            class: ImageClass::Storage {
                format: StorageFormat::Rgba8Unorm,
                access: StorageAccess::STORE,
            },
        };
        assert_eq!(
            format_type_inner(&storage, &types),
            "texture_storage_2d<rgba8unorm, write>"
        );

        assert_eq!(
            format_type_inner(&TypeInner::Sampler { comparison: false }, &types),
            "sampler"
        );
    }

    #[test]
    fn dump_kill_and_terminate() {
        let mut out = String::new();
        write_stmt(&mut out, &Statement::Kill, 0);
        write_stmt(&mut out, &Statement::TerminateInvocation, 0);
        assert_eq!(out, "Kill\nTerminateInvocation\n");
    }

    #[test]
    fn dump_empty_module() {
        let module = Module::default();
        let dump = dump_module(&module);
        assert!(dump.contains("Types:"));
    }
}
