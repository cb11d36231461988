//! Integration test: build a fragment-shader IR module programmatically
//! and verify the text dump output.

use shadec_ir::*;

/// Build an alpha-test fragment shader:
///
/// ```wgsl
/// @group(0) @binding(0) var tex: texture_2d<f32>;
/// @group(0) @binding(1) var samp: sampler;
/// @group(0) @binding(2) var<storage, read_write> counter: atomic<u32>;
///
/// @fragment
/// fn main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
///     let color = textureSample(tex, samp, uv);
///     if (color.w < 0.5) {
///         discard;
///     }
///     atomicAdd(&counter, 1u);
///     return color;
/// }
/// ```
#[test]
fn build_alpha_test_module() {
    let mut module = Module::default();

    // ---- Types ----
    let f32_ty = module.types.insert(Type {
        name: None,
        inner: TypeInner::Scalar(Scalar::F32),
    });
    let vec2f_ty = module.types.insert(Type {
        name: None,
        inner: TypeInner::Vector {
            size: VectorSize::Bi,
            scalar: Scalar::F32,
        },
    });
    let vec4f_ty = module.types.insert(Type {
        name: None,
        inner: TypeInner::Vector {
            size: VectorSize::Quad,
            scalar: Scalar::F32,
        },
    });
    let tex_ty = module.types.insert(Type {
        name: None,
        inner: TypeInner::Image {
            dim: ImageDimension::D2,
            arrayed: false,
            class: ImageClass::Sampled {
                kind: ScalarKind::Float,
                multi: false,
            },
        },
    });
    let sampler_ty = module.types.insert(Type {
        name: None,
        inner: TypeInner::Sampler { comparison: false },
    });
    let atomic_u32_ty = module.types.insert(Type {
        name: None,
        inner: TypeInner::Atomic(Scalar::U32),
    });

    // Verify type deduplication
    let f32_ty2 = module.types.insert(Type {
        name: None,
        inner: TypeInner::Scalar(Scalar::F32),
    });
    assert_eq!(f32_ty, f32_ty2, "f32 type should be deduplicated");

    // ---- Global Variables ----
    let gv_tex = module.global_variables.append(GlobalVariable {
        name: Some("tex".into()),
        space: AddressSpace::Handle,
        binding: Some(ResourceBinding {
            group: 0,
            binding: 0,
        }),
        ty: tex_ty,
        init: None,
    });
    let gv_samp = module.global_variables.append(GlobalVariable {
        name: Some("samp".into()),
        space: AddressSpace::Handle,
        binding: Some(ResourceBinding {
            group: 0,
            binding: 1,
        }),
        ty: sampler_ty,
        init: None,
    });
    let gv_counter = module.global_variables.append(GlobalVariable {
        name: Some("counter".into()),
        space: AddressSpace::Storage {
            access: StorageAccess::LOAD | StorageAccess::STORE,
        },
        binding: Some(ResourceBinding {
            group: 0,
            binding: 2,
        }),
        ty: atomic_u32_ty,
        init: None,
    });

    // ---- Entry Point Function ----
    let mut function = Function::new("main");
    function.arguments.push(FunctionArgument {
        name: Some("uv".into()),
        ty: vec2f_ty,
        binding: Some(Binding::Location { location: 0 }),
    });
    function.result = Some(FunctionResult {
        ty: vec4f_ty,
        binding: Some(Binding::Location { location: 0 }),
    });

    let emit_start = function.expressions.next_handle();

    let uv = function.expressions.append(Expression::FunctionArgument(0));
    let tex = function.expressions.append(Expression::GlobalVariable(gv_tex));
    let samp = function
        .expressions
        .append(Expression::GlobalVariable(gv_samp));
    let color = function.expressions.append(Expression::ImageSample {
        image: tex,
        sampler: samp,
        coordinate: uv,
    });
    let alpha = function.expressions.append(Expression::AccessIndex {
        base: color,
        index: 3,
    });
    let half = function
        .expressions
        .append(Expression::Literal(Literal::F32(0.5)));
    let is_transparent = function.expressions.append(Expression::Binary {
        op: BinaryOp::Less,
        left: alpha,
        right: half,
    });

    let emit_end = function.expressions.next_handle();

    let counter_ptr = function
        .expressions
        .append(Expression::GlobalVariable(gv_counter));
    let one = function
        .expressions
        .append(Expression::Literal(Literal::U32(1)));
    let add_result = function.expressions.append(Expression::AtomicResult {
        ty: module.types.insert(Type {
            name: None,
            inner: TypeInner::Scalar(Scalar::U32),
        }),
        comparison: false,
    });

    function.named_expressions.insert(color, "color".into());

    function
        .body
        .push(Statement::Emit(Range::new(emit_start, emit_end)));
    function.body.push(Statement::If {
        condition: is_transparent,
        accept: vec![Statement::Kill],
        reject: vec![],
    });
    function.body.push(Statement::Atomic {
        pointer: counter_ptr,
        fun: AtomicFunction::Add,
        value: one,
        result: Some(add_result),
    });
    function.body.push(Statement::Return { value: Some(color) });

    module
        .entry_points
        .push(EntryPoint::fragment("main", function));

    // ---- Verify ----
    assert_eq!(module.global_variables.len(), 3);
    assert_eq!(module.entry_points.len(), 1);
    assert_eq!(module.entry_points[0].stage, ShaderStage::Fragment);

    let dump = dump_module(&module);
    assert!(dump.contains("texture_2d<float>"), "dump: {dump}");
    assert!(dump.contains("sampler"), "dump: {dump}");
    assert!(dump.contains("atomic<u32>"), "dump: {dump}");
    assert!(dump.contains("@group(0) @binding(2)"), "dump: {dump}");
    assert!(dump.contains("@fragment"), "dump: {dump}");
    assert!(dump.contains("textureSample"), "dump: {dump}");
    assert!(dump.contains("Kill"), "dump: {dump}");
    assert!(dump.contains("atomicAdd"), "dump: {dump}");
    assert!(dump.contains("fn main"), "dump: {dump}");

    eprintln!("{dump}");
}

/// Pointer-space resolution sees through access chains, which is what the
/// demotion pass uses to tell storage writes from invocation-local ones.
#[test]
fn pointer_space_through_access_chain() {
    let mut module = Module::default();

    let f32_ty = module.types.insert(Type {
        name: None,
        inner: TypeInner::Scalar(Scalar::F32),
    });
    let array_ty = module.types.insert(Type {
        name: None,
        inner: TypeInner::Array {
            base: f32_ty,
            size: ArraySize::Dynamic,
            stride: 4,
        },
    });

    let gv = module.global_variables.append(GlobalVariable {
        name: Some("out".into()),
        space: AddressSpace::Storage {
            access: StorageAccess::STORE,
        },
        binding: Some(ResourceBinding {
            group: 0,
            binding: 0,
        }),
        ty: array_ty,
        init: None,
    });

    let mut func = Function::new("f");
    let base = func.expressions.append(Expression::GlobalVariable(gv));
    let index = func.expressions.append(Expression::Literal(Literal::U32(7)));
    let elem = func.expressions.append(Expression::Access { base, index });
    let nested = func.expressions.append(Expression::AccessIndex {
        base: elem,
        index: 0,
    });

    let space = module.pointer_space(&func, nested).unwrap();
    assert!(matches!(space, AddressSpace::Storage { .. }));

    let local = func.local_variables.append(LocalVariable {
        name: Some("tmp".into()),
        ty: f32_ty,
        init: None,
    });
    let local_ptr = func.expressions.append(Expression::LocalVariable(local));
    let space = module.pointer_space(&func, local_ptr).unwrap();
    assert!(matches!(space, AddressSpace::Function));
}

/// Verify Module::default() produces a valid empty module.
#[test]
fn empty_module() {
    let module = Module::default();
    assert!(module.types.is_empty());
    assert!(module.global_variables.is_empty());
    assert!(module.functions.is_empty());
    assert!(module.entry_points.is_empty());

    let dump = dump_module(&module);
    assert!(dump.contains("Types:"));
    assert!(!dump.contains("Entry Points:"));
}
