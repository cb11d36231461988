//! IR validation pass.
//!
//! Checks structural invariants of the IR module and logs warnings for
//! problems found. This pass never modifies the module.

use shadec_analysis::{CallGraph, DiscardAnalysis};
use shadec_ir::{Expression, Module, ShaderStage, Statement, expression_operands};

use crate::Pass;

/// Validates IR structural invariants. Returns `false` (never modifies
/// the module).
#[derive(Debug)]
pub struct IrValidation;

impl Pass for IrValidation {
    fn name(&self) -> &str {
        "ir-validation"
    }

    fn run(&self, module: &mut Module) -> bool {
        validate_module(module);
        false
    }
}

fn validate_module(module: &Module) {
    validate_expression_arena(&module.global_expressions, "global_expressions");

    // Global variable type handles.
    let type_count = module.types.len();
    for (handle, gv) in module.global_variables.iter() {
        if gv.ty.index() >= type_count {
            log::warn!(
                "global variable {:?} (handle {:?}) references out-of-bounds type handle {:?}",
                gv.name,
                handle,
                gv.ty
            );
        }
    }

    for (handle, func) in module.functions.iter() {
        let context = format!(
            "function '{}' ({:?})",
            func.name.as_deref().unwrap_or("<unnamed>"),
            handle
        );
        validate_expression_arena(&func.expressions, &context);
        validate_terminate_placement(&func.body, &context);
    }

    let analysis = DiscardAnalysis::of(module);
    for (index, ep) in module.entry_points.iter().enumerate() {
        let context = format!("entry point '{}'", ep.name);

        if ep.stage == ShaderStage::Compute {
            for (i, &size) in ep.workgroup_size.iter().enumerate() {
                if size == 0 {
                    log::warn!("{context} has workgroup_size[{i}] = 0");
                }
            }
        }

        // Discard only exists in the fragment stage.
        if ep.stage != ShaderStage::Fragment && analysis.entry_point_may_discard(index) {
            log::warn!("{context} is a {} shader but may discard", ep.stage);
        }

        validate_expression_arena(&ep.function.expressions, &context);
        validate_terminate_placement(&ep.function.body, &context);
    }

    // Recursion is forbidden by the shading model.
    if let Err(err) = CallGraph::build(module).topological_order() {
        log::warn!("module call graph is not well-formed: {err}");
    }
}

fn validate_expression_arena(arena: &shadec_ir::Arena<Expression>, context: &str) {
    let arena_len = arena.len();

    for (handle, expr) in arena.iter() {
        for operand in expression_operands(expr) {
            if operand.index() >= arena_len {
                log::warn!(
                    "{}: expression {:?} references out-of-bounds operand {:?} (arena size {})",
                    context,
                    handle,
                    operand,
                    arena_len,
                );
            }
        }
    }
}

/// `TerminateInvocation` ends its block; anything after it is dead and
/// indicates a broken transform.
fn validate_terminate_placement(block: &[Statement], context: &str) {
    for (i, stmt) in block.iter().enumerate() {
        match stmt {
            Statement::TerminateInvocation => {
                if i + 1 != block.len() {
                    log::warn!(
                        "{context}: TerminateInvocation is followed by {} unreachable statement(s)",
                        block.len() - i - 1
                    );
                }
            }
            Statement::If { accept, reject, .. } => {
                validate_terminate_placement(accept, context);
                validate_terminate_placement(reject, context);
            }
            Statement::Loop {
                body, continuing, ..
            } => {
                validate_terminate_placement(body, context);
                validate_terminate_placement(continuing, context);
            }
            _ => {}
        }
    }
}
